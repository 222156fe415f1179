//! Matchmaking regions.
//!
//! A region plays two roles: it tags every advertised session (and can be
//! used to narrow the session list), and it routes a join attempt to the
//! right matchmaking cluster. Both uses are modelled separately here:
//! [`RegionFilter`] for the list, [`RegionPreference`] for joins.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Sentinel filter value meaning "do not filter by region".
pub const ALL_REGIONS: &str = "All";

/// Region text that asks the matchmaker to pick the best region.
const AUTO_REGION: &str = "auto";

/// Known matchmaking regions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Asia,
    Au,
    Cae,
    Eu,
    Hk,
    In,
    Jp,
    Kr,
    Sa,
    Tr,
    Uae,
    Us,
    Usw,
    Za,
}

impl Region {
    /// Lowercase region tag as used on the wire.
    pub fn tag(&self) -> &str {
        self.as_ref()
    }
}

/// Region part of a session list filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionFilter {
    /// Sentinel `"All"`: every region passes.
    #[default]
    All,
    /// Only sessions whose region tag equals this region (case-insensitive).
    Only(Region),
    /// A region text outside the known set. Matches no session at all.
    Unrecognized(String),
}

impl RegionFilter {
    /// Parses dropdown text. Never fails: unknown text becomes
    /// [`RegionFilter::Unrecognized`].
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case(ALL_REGIONS) {
            return Self::All;
        }
        match text.parse::<Region>() {
            Ok(region) => Self::Only(region),
            Err(_) => Self::Unrecognized(text.to_string()),
        }
    }

    /// Returns `true` if a session tagged with `region` passes this filter.
    pub fn matches(&self, region: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => region.eq_ignore_ascii_case(expected.tag()),
            Self::Unrecognized(_) => false,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl FromStr for RegionFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<Region> for RegionFilter {
    fn from(region: Region) -> Self {
        Self::Only(region)
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_REGIONS),
            Self::Only(region) => write!(f, "{region}"),
            Self::Unrecognized(text) => f.write_str(text),
        }
    }
}

/// Where a join request should be routed.
///
/// Passed with every request instead of living in process-wide settings, so
/// two joins aimed at different regions can never overwrite each other.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "region", rename_all = "snake_case")]
pub enum RegionPreference {
    /// Let the matchmaker choose (lowest latency).
    #[default]
    Best,
    /// Pin the request to a region tag (lowercase).
    Fixed(String),
}

impl RegionPreference {
    /// Interprets free region text: blank or `"auto"` selects the best
    /// region, anything else is lowercased and pinned.
    pub fn from_input(text: Option<&str>) -> Self {
        match text.map(str::trim) {
            None => Self::Best,
            Some(t) if t.is_empty() || t.eq_ignore_ascii_case(AUTO_REGION) => Self::Best,
            Some(t) => Self::Fixed(t.to_lowercase()),
        }
    }

    /// The pinned region tag, if any.
    pub fn fixed_region(&self) -> Option<&str> {
        match self {
            Self::Best => None,
            Self::Fixed(tag) => Some(tag),
        }
    }
}

impl From<Region> for RegionPreference {
    fn from(region: Region) -> Self {
        Self::Fixed(region.tag().to_string())
    }
}

impl fmt::Display for RegionPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Best => f.write_str(AUTO_REGION),
            Self::Fixed(tag) => f.write_str(tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn region_tags_roundtrip_case_insensitively() {
        for region in Region::iter() {
            let upper = region.tag().to_uppercase();
            assert_eq!(upper.parse::<Region>().unwrap(), region);
        }
        assert_eq!(Region::Usw.to_string(), "usw");
    }

    #[test]
    fn all_sentinel_and_unknown_text() {
        assert_eq!(RegionFilter::parse("All"), RegionFilter::All);
        assert_eq!(RegionFilter::parse("all"), RegionFilter::All);
        assert_eq!(RegionFilter::parse("EU"), RegionFilter::Only(Region::Eu));
        assert_eq!(
            RegionFilter::parse("mars"),
            RegionFilter::Unrecognized("mars".into())
        );
    }

    #[test]
    fn unrecognized_region_matches_nothing() {
        let filter = RegionFilter::parse("mars");
        assert!(!filter.matches("mars"));
        assert!(!filter.matches("eu"));
    }

    #[test]
    fn only_filter_ignores_case_of_record_region() {
        let filter = RegionFilter::Only(Region::Eu);
        assert!(filter.matches("EU"));
        assert!(filter.matches("eu"));
        assert!(!filter.matches("us"));
    }

    #[test]
    fn preference_from_dropdown_text() {
        assert_eq!(RegionPreference::from_input(None), RegionPreference::Best);
        assert_eq!(RegionPreference::from_input(Some("  ")), RegionPreference::Best);
        assert_eq!(RegionPreference::from_input(Some("Auto")), RegionPreference::Best);
        assert_eq!(
            RegionPreference::from_input(Some("USW")),
            RegionPreference::Fixed("usw".into())
        );
        assert_eq!(
            RegionPreference::from(Region::Asia).fixed_region(),
            Some("asia")
        );
    }
}
