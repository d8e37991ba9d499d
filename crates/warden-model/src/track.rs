//! Tracks: linear promotion/demotion sequences of groups.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// An ordered sequence of group names a subject can be promoted along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    name: String,
    groups: Vec<String>,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_groups(name: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            name: name.into(),
            groups,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// The group after `group` on the track (promotion target), or
    /// `None` when `group` is last.
    pub fn next(&self, group: &str) -> Result<Option<&str>> {
        let idx = self.position_of(group)?;
        Ok(self.groups.get(idx + 1).map(String::as_str))
    }

    /// The group before `group` on the track (demotion target), or
    /// `None` when `group` is first.
    pub fn previous(&self, group: &str) -> Result<Option<&str>> {
        let idx = self.position_of(group)?;
        Ok(idx.checked_sub(1).and_then(|i| self.groups.get(i)).map(String::as_str))
    }

    /// Append a group to the end of the track.
    pub fn append(&mut self, group: impl Into<String>) -> Result<()> {
        let group = group.into();
        if self.contains(&group) {
            return Err(ModelError::AlreadyOnTrack {
                track: self.name.clone(),
                group,
            });
        }
        self.groups.push(group);
        Ok(())
    }

    /// Insert a group at a position, clamped to the track length.
    pub fn insert(&mut self, position: usize, group: impl Into<String>) -> Result<()> {
        let group = group.into();
        if self.contains(&group) {
            return Err(ModelError::AlreadyOnTrack {
                track: self.name.clone(),
                group,
            });
        }
        let position = position.min(self.groups.len());
        self.groups.insert(position, group);
        Ok(())
    }

    /// Remove a group from the track.
    pub fn remove(&mut self, group: &str) -> Result<()> {
        let idx = self.position_of(group)?;
        self.groups.remove(idx);
        Ok(())
    }

    fn position_of(&self, group: &str) -> Result<usize> {
        self.groups
            .iter()
            .position(|g| g == group)
            .ok_or_else(|| ModelError::NotOnTrack {
                track: self.name.clone(),
                group: group.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> Track {
        Track::with_groups(
            "staff",
            vec!["member".into(), "mod".into(), "admin".into()],
        )
    }

    #[test]
    fn test_next_previous() {
        let t = ladder();
        assert_eq!(t.next("member").unwrap(), Some("mod"));
        assert_eq!(t.next("admin").unwrap(), None);
        assert_eq!(t.previous("mod").unwrap(), Some("member"));
        assert_eq!(t.previous("member").unwrap(), None);
    }

    #[test]
    fn test_not_on_track() {
        let t = ladder();
        assert_eq!(
            t.next("owner"),
            Err(ModelError::NotOnTrack {
                track: "staff".to_string(),
                group: "owner".to_string()
            })
        );
    }

    #[test]
    fn test_append_and_duplicates() {
        let mut t = ladder();
        t.append("owner").unwrap();
        assert_eq!(t.next("admin").unwrap(), Some("owner"));
        assert!(matches!(
            t.append("mod"),
            Err(ModelError::AlreadyOnTrack { .. })
        ));
    }

    #[test]
    fn test_insert_and_remove() {
        let mut t = ladder();
        t.insert(1, "helper").unwrap();
        assert_eq!(t.groups(), &["member", "helper", "mod", "admin"]);

        t.remove("helper").unwrap();
        assert_eq!(t.groups(), &["member", "mod", "admin"]);
        assert!(matches!(
            t.remove("helper"),
            Err(ModelError::NotOnTrack { .. })
        ));
    }

    #[test]
    fn test_insert_clamps() {
        let mut t = ladder();
        t.insert(99, "owner").unwrap();
        assert_eq!(t.groups().last().map(String::as_str), Some("owner"));
    }
}
