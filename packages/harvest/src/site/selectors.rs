//! CSS selectors and markers for the event site's markup.

// Login
pub const LOGIN_EMAIL: &str = "#user_email";
pub const LOGIN_PASSWORD: &str = "#user_password";
pub const LOGIN_SUBMIT: &str = "#signin";
pub const BUTTONS: &str = "button";

// Index listing
pub const INDEX_ROWS: &str = "#events > *";
pub const INDEX_INNER: &str = ":scope > div";
pub const INDEX_DATA_ROW: &str = ":scope > :nth-child(1)";
pub const INDEX_LINK_ROW: &str = ":scope > :nth-child(2)";
pub const INDEX_SHORT_DATE: &str = ":scope > :nth-child(1) > :nth-child(1)";
pub const INDEX_ISSUER: &str = ":scope > :nth-child(1) > :nth-child(2)";
pub const INDEX_TITLE: &str = ":scope > :nth-child(2) > :nth-child(1)";
pub const INDEX_HOST_CLUB: &str = ":scope > :nth-child(2) > :nth-child(2)";
pub const INDEX_LOCATION: &str = ":scope > :nth-child(2) > :nth-child(3) > :nth-child(1)";
pub const INDEX_FLAG: &str = ":scope > :nth-child(2) > :nth-child(3) > :nth-child(2)";
pub const INDEX_CANCELLED: &str = ":scope > :nth-child(1) > *";
pub const INDEX_LINKS: &str = ":scope > :nth-child(2) a";

// Collapsible rows
pub const CHEVRON_CANDIDATES: &str = ":scope [phx-click]";

// Tabular fragments inside a row or grid
pub const TABULAR_DESCENDANTS: &str =
    ":scope .text-gray-500.text-sm, :scope .font-bold.text-black, :scope .font-bold.col-span-2";
pub const SECTION_CLASS: &str = "col-span-2";
pub const FIELD_CLASS: &str = "text-gray-500";

// Participants phase
pub const PARTICIPANT_ROWS: &str = "#participants_list > *";

// Info phase
pub const INFO_GRIDS: &str = "main > div > div > div.grid.grid-cols-2";
pub const INFO_MESSAGES: &str = "div.rules > .rules > *";
pub const MESSAGE_HEADING_TAG: &str = "H1";

// Runs phase
pub const RUN_INDEX_ROWS: &str = "#runs_list > div";
pub const RUN_INDEX_LINKS: &str = ":scope a";
pub const COMBINED_RESULTS_MARKER: &str = "/combined_results";
pub const RUN_RESULT_ROWS: &str = "#results_comb_list > div";
pub const RUN_HEADER: &str = "#header_component > div > div";
pub const RUN_HEADER_TITLE: &str = ":scope > :nth-child(1) > :nth-child(1)";
pub const RUN_HEADER_TYPE: &str = ":scope > :nth-child(2)";
pub const RUN_HEADER_STATUS: &str = ":scope > :nth-child(3) span";

// Link classification on index rows
pub const INFO_LINK_MARKER: &str = "events/info";
pub const RUNS_LINK_MARKER: &str = "/runs";
pub const PARTICIPANTS_LINK_MARKER: &str = "/participants_list";
