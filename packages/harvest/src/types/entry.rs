//! Index and enriched entry types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One parsed tabular block: section → field → value.
///
/// Insertion order is preserved so serialized output follows page order.
pub type TabularRecord = IndexMap<String, IndexMap<String, String>>;

/// A participant row, parsed from its tabular fragments.
pub type Participant = TabularRecord;

/// One event as listed in the site index.
///
/// Created once while indexing and never modified afterwards. Field order
/// matches the on-disk index cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// DOM id of the index row
    pub id: String,

    pub short_date: String,

    /// Sanctioning body, when the index shows one
    pub issuer: Option<String>,

    pub title: String,

    pub host_club: String,

    pub location: String,

    pub flag: String,

    /// Trigger for the participants phase
    pub participants_url: Option<String>,

    /// Trigger for the runs phase
    pub runs_url: Option<String>,

    /// Trigger for the info phase
    pub info_url: Option<String>,

    pub is_cancelled: bool,

    /// Links on the index row that matched no known phase
    #[serde(default)]
    pub unknown_urls: Vec<String>,
}

/// Descriptive metadata gathered by the info phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInfo {
    /// Sections merged from every data grid on the info page
    pub data_table: TabularRecord,

    /// Message group name → text lines, in page order
    pub messages: IndexMap<String, Vec<String>>,
}

/// One run (round) of an event with its combined results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub title: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub status: String,

    /// One record per result row
    pub results: Vec<TabularRecord>,
}

/// An index entry enriched with the output of each extraction phase.
///
/// A phase field is `Some` if and only if its trigger URL was present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullEntry {
    #[serde(flatten)]
    pub entry: IndexEntry,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<EntryInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<Vec<Run>>,
}

impl FullEntry {
    /// Wrap an index entry with no phase output yet.
    pub fn new(entry: IndexEntry) -> Self {
        Self {
            entry,
            participants: None,
            info: None,
            runs: None,
        }
    }
}

impl From<IndexEntry> for FullEntry {
    fn from(entry: IndexEntry) -> Self {
        Self::new(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> IndexEntry {
        IndexEntry {
            id: "event-1".to_string(),
            short_date: "12 Mar".to_string(),
            issuer: None,
            title: "Spring Trial".to_string(),
            host_club: "Dog Club".to_string(),
            location: "Utrecht".to_string(),
            flag: "NL".to_string(),
            participants_url: None,
            runs_url: None,
            info_url: Some("https://example.com/events/info/1".to_string()),
            is_cancelled: false,
            unknown_urls: vec![],
        }
    }

    #[test]
    fn test_index_entry_uses_camel_case() {
        let json = serde_json::to_value(sample_entry()).unwrap();

        assert_eq!(json["shortDate"], "12 Mar");
        assert_eq!(json["hostClub"], "Dog Club");
        assert_eq!(json["isCancelled"], false);
        assert!(json["issuer"].is_null());
        assert!(json["participantsUrl"].is_null());
    }

    #[test]
    fn test_full_entry_is_flat_and_omits_unset_phases() {
        let mut full = FullEntry::new(sample_entry());
        full.info = Some(EntryInfo::default());

        let json = serde_json::to_value(&full).unwrap();

        assert_eq!(json["title"], "Spring Trial");
        assert!(json.get("info").is_some());
        assert!(json.get("participants").is_none());
        assert!(json.get("runs").is_none());
        assert!(json["info"]["dataTable"].is_object());
    }

    #[test]
    fn test_run_type_field_name() {
        let run = Run {
            kind: "Jumping".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["type"], "Jumping");
        assert_eq!(json["title"], "");
    }
}
