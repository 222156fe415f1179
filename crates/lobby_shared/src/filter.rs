//! Session list filter.

use crate::{region::RegionFilter, session::SessionRecord};

/// User-specified filter over a session list.
///
/// The two fields are independent: a case-insensitive name substring (empty
/// means no name filtering) and a [`RegionFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionFilter {
    name_substring: String,
    folded: String,
    region: RegionFilter,
}

impl SessionFilter {
    /// Builds a filter. Surrounding whitespace of the name text is dropped.
    pub fn new(name_substring: impl AsRef<str>, region: RegionFilter) -> Self {
        let name_substring = name_substring.as_ref().trim().to_string();
        let folded = name_substring.to_lowercase();
        Self {
            name_substring,
            folded,
            region,
        }
    }

    /// Builds a filter straight from the two input widgets' text.
    pub fn from_inputs(name_text: &str, region_text: &str) -> Self {
        Self::new(name_text, RegionFilter::parse(region_text))
    }

    /// A filter that lets everything through.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn name_substring(&self) -> &str {
        &self.name_substring
    }

    pub fn region(&self) -> &RegionFilter {
        &self.region
    }

    /// Returns `true` if the record satisfies both predicates.
    pub fn matches(&self, record: &SessionRecord) -> bool {
        self.matches_name(&record.name) && self.region.matches(&record.region)
    }

    fn matches_name(&self, name: &str) -> bool {
        self.folded.is_empty() || name.to_lowercase().contains(&self.folded)
    }
}
