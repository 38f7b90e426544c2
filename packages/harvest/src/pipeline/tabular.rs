//! Section/field/value parsing of tabular page fragments.
//!
//! The site renders every key/value block (participant rows, info grids,
//! run results) as a flat run of styled elements. A section header opens a
//! group, a grey label names the next value, and anything else is a value:
//!
//! ```text
//! [section "Dog"] [label "Name"] [value "Rex"] [label "Breed"] [value "Collie"]
//!     => { "Dog": { "Name": "Rex", "Breed": "Collie" } }
//! ```
//!
//! The scan is single-pass with no lookahead. A value that arrives before its
//! section or label is an error, never silently dropped or misfiled.

use indexmap::IndexMap;

use crate::error::{HarvestResult, TabularError, TabularResult};
use crate::site::selectors::{FIELD_CLASS, SECTION_CLASS, TABULAR_DESCENDANTS};
use crate::traits::page::{required_text, ElementHandle, PageClient};
use crate::types::entry::TabularRecord;

/// Role of a fragment in the tabular grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentRole {
    Section,
    Field,
    Value,
}

impl FragmentRole {
    /// Classify a fragment by its `class` attribute.
    pub fn classify(class: &str) -> Self {
        if class.contains(SECTION_CLASS) {
            Self::Section
        } else if class.contains(FIELD_CLASS) {
            Self::Field
        } else {
            Self::Value
        }
    }
}

/// A classified piece of text read from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub role: FragmentRole,
    pub text: String,
}

impl Fragment {
    pub fn new(role: FragmentRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Build a fragment from raw markup data.
    pub fn from_markup(class: &str, text: &str) -> Self {
        Self::new(FragmentRole::classify(class), text.trim())
    }

    pub fn section(text: impl Into<String>) -> Self {
        Self::new(FragmentRole::Section, text)
    }

    pub fn field(text: impl Into<String>) -> Self {
        Self::new(FragmentRole::Field, text)
    }

    pub fn value(text: impl Into<String>) -> Self {
        Self::new(FragmentRole::Value, text)
    }
}

/// Parse an ordered fragment sequence into a section → field → value record.
pub fn parse_fragments<I>(fragments: I) -> TabularResult<TabularRecord>
where
    I: IntoIterator<Item = Fragment>,
{
    let mut record = TabularRecord::new();
    let mut section: Option<String> = None;
    let mut field: Option<String> = None;

    for (position, fragment) in fragments.into_iter().enumerate() {
        match fragment.role {
            FragmentRole::Section => {
                record.insert(fragment.text.clone(), IndexMap::new());
                section = Some(fragment.text);
                field = None;
            }
            FragmentRole::Field => field = Some(fragment.text),
            FragmentRole::Value => {
                let Some(current) = section.as_ref() else {
                    return Err(TabularError::ValueOutsideSection {
                        position,
                        value: fragment.text,
                    });
                };
                let Some(key) = field.as_ref() else {
                    return Err(TabularError::ValueWithoutField {
                        position,
                        section: current.clone(),
                        value: fragment.text,
                    });
                };
                record
                    .entry(current.clone())
                    .or_default()
                    .insert(key.clone(), fragment.text);
            }
        }
    }

    Ok(record)
}

/// Read the tabular descendants of `root` in document order.
pub async fn read_fragments<P: PageClient + ?Sized>(
    page: &P,
    root: ElementHandle,
) -> HarvestResult<Vec<Fragment>> {
    let elements = page.query_all(Some(root), TABULAR_DESCENDANTS).await?;
    let mut fragments = Vec::with_capacity(elements.len());

    for element in elements {
        let class = page.attribute(element, "class").await?.unwrap_or_default();
        let text = required_text(page, element, TABULAR_DESCENDANTS).await?;
        fragments.push(Fragment::from_markup(&class, &text));
    }

    Ok(fragments)
}

/// Read and parse the tabular block under `root`.
pub async fn read_record<P: PageClient + ?Sized>(
    page: &P,
    root: ElementHandle,
) -> HarvestResult<TabularRecord> {
    let fragments = read_fragments(page, root).await?;
    tracing::debug!(element = %root, fragments = fragments.len(), "parsing tabular block");
    Ok(parse_fragments(fragments)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_section() {
        let record = parse_fragments(vec![
            Fragment::section("S"),
            Fragment::field("F1"),
            Fragment::value("V1"),
            Fragment::field("F2"),
            Fragment::value("V2"),
        ])
        .unwrap();

        assert_eq!(record.len(), 1);
        assert_eq!(record["S"]["F1"], "V1");
        assert_eq!(record["S"]["F2"], "V2");
    }

    #[test]
    fn test_multiple_sections_keep_order() {
        let record = parse_fragments(vec![
            Fragment::section("Handler"),
            Fragment::field("Name"),
            Fragment::value("Ann"),
            Fragment::section("Dog"),
            Fragment::field("Name"),
            Fragment::value("Rex"),
        ])
        .unwrap();

        let sections: Vec<_> = record.keys().cloned().collect();
        assert_eq!(sections, vec!["Handler", "Dog"]);
        assert_eq!(record["Dog"]["Name"], "Rex");
    }

    #[test]
    fn test_empty_section_is_kept() {
        let record = parse_fragments(vec![Fragment::section("Empty")]).unwrap();
        assert!(record["Empty"].is_empty());
    }

    #[test]
    fn test_value_before_section_fails() {
        let err = parse_fragments(vec![
            Fragment::value("orphan"),
            Fragment::section("S"),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            TabularError::ValueOutsideSection {
                position: 0,
                value: "orphan".to_string()
            }
        );
    }

    #[test]
    fn test_label_before_section_still_needs_section() {
        let err = parse_fragments(vec![Fragment::field("F"), Fragment::value("V")]).unwrap_err();
        assert!(matches!(err, TabularError::ValueOutsideSection { position: 1, .. }));
    }

    #[test]
    fn test_stale_label_does_not_leak_into_next_section() {
        let err = parse_fragments(vec![
            Fragment::section("A"),
            Fragment::field("F"),
            Fragment::value("1"),
            Fragment::section("B"),
            Fragment::value("2"),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            TabularError::ValueWithoutField { ref section, .. } if section == "B"
        ));
    }

    #[test]
    fn test_repeated_label_overwrites() {
        let record = parse_fragments(vec![
            Fragment::section("S"),
            Fragment::field("F"),
            Fragment::value("old"),
            Fragment::value("new"),
        ])
        .unwrap();

        assert_eq!(record["S"]["F"], "new");
    }

    #[test]
    fn test_classify_by_class() {
        assert_eq!(
            FragmentRole::classify("font-bold col-span-2"),
            FragmentRole::Section
        );
        assert_eq!(
            FragmentRole::classify("text-gray-500 text-sm"),
            FragmentRole::Field
        );
        assert_eq!(
            FragmentRole::classify("font-bold text-black"),
            FragmentRole::Value
        );
    }

    #[test]
    fn test_from_markup_trims() {
        let fragment = Fragment::from_markup("font-bold text-black", "  42 pts \n");
        assert_eq!(fragment, Fragment::value("42 pts"));
    }
}
