//! Advertised sessions and the lists built from them.
//!
//! A [`Snapshot`] is everything a session source knew at one instant; it
//! replaces any earlier snapshot in full. A [`ViewState`] is the filtered,
//! sorted projection handed to presentation. Both are plain values: nothing
//! here is mutated after construction.

use std::{ops::Deref, sync::Arc};

use serde::{Deserialize, Serialize};

/// Read-only description of one advertised session.
///
/// `player_count <= max_players` is expected from the source but not
/// enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Human-chosen session name, unique within one snapshot.
    pub name: String,
    /// Matchmaking region tag (e.g. `eu`).
    pub region: String,
    pub player_count: u32,
    pub max_players: u32,
}

impl SessionRecord {
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        player_count: u32,
        max_players: u32,
    ) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            player_count,
            max_players,
        }
    }

    pub fn is_full(&self) -> bool {
        self.player_count >= self.max_players
    }

    /// Occupancy text for list rows, e.g. `3/10 players`.
    pub fn occupancy_label(&self) -> String {
        format!("{}/{} players", self.player_count, self.max_players)
    }
}

/// Full set of sessions known at one instant, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    sessions: Vec<SessionRecord>,
}

impl Snapshot {
    pub fn new(sessions: Vec<SessionRecord>) -> Self {
        Self { sessions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SessionRecord> {
        self.sessions.iter()
    }

    /// First record with exactly this name.
    pub fn find(&self, name: &str) -> Option<&SessionRecord> {
        self.sessions.iter().find(|record| record.name == name)
    }
}

impl From<Vec<SessionRecord>> for Snapshot {
    fn from(sessions: Vec<SessionRecord>) -> Self {
        Self::new(sessions)
    }
}

impl FromIterator<SessionRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = SessionRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a SessionRecord;
    type IntoIter = std::slice::Iter<'a, SessionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.sessions.iter()
    }
}

/// Filtered and sorted session list for rendering.
///
/// Cloning is cheap (shared buffer) and there is no way to mutate the
/// contents; consumers always get a full replacement, never a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    sessions: Arc<Vec<SessionRecord>>,
}

impl ViewState {
    pub fn new(sessions: Vec<SessionRecord>) -> Self {
        Self {
            sessions: Arc::new(sessions),
        }
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    /// Session names in view order.
    pub fn names(&self) -> Vec<&str> {
        self.sessions.iter().map(|record| record.name.as_str()).collect()
    }
}

impl Deref for ViewState {
    type Target = [SessionRecord];

    fn deref(&self) -> &Self::Target {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_and_full() {
        let record = SessionRecord::new("Room_42", "eu", 3, 10);
        assert_eq!(record.occupancy_label(), "3/10 players");
        assert!(!record.is_full());
        assert!(SessionRecord::new("alpha", "us", 10, 10).is_full());
    }

    #[test]
    fn find_is_exact_and_case_sensitive() {
        let snapshot: Snapshot = vec![
            SessionRecord::new("alpha", "us", 10, 10),
            SessionRecord::new("Beta", "eu", 1, 10),
        ]
        .into_iter()
        .collect();

        assert_eq!(snapshot.find("Beta").map(|r| r.player_count), Some(1));
        assert!(snapshot.find("beta").is_none());
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn view_state_clones_share_contents() {
        let view = ViewState::new(vec![SessionRecord::new("a", "eu", 0, 4)]);
        let copy = view.clone();
        assert_eq!(view, copy);
        assert_eq!(copy.names(), vec!["a"]);
        assert_eq!(copy[0].region, "eu");
    }
}
