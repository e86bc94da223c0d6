//! Actor Message Definitions
//!
//! Message types for inter-actor communication.
//!
//! ```text
//! FsActor --Changes--> BuildActor --Reload--> HubActor
//! ```

use std::collections::BTreeMap;
use std::net::TcpStream;

// =============================================================================
// Change sets
// =============================================================================

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }

    /// Combine with a later event for the same path; `None` drops the path.
    /// - Removed + Created/Modified: restored, counts as Modified
    /// - Created + Removed: appeared then vanished
    /// - Modified + Removed: Removed
    /// - otherwise the first event wins
    pub fn then(self, later: Self) -> Option<Self> {
        match (self, later) {
            (Self::Removed, Self::Created | Self::Modified) => Some(Self::Modified),
            (Self::Created, Self::Removed) => None,
            (Self::Modified, Self::Removed) => Some(Self::Removed),
            _ => Some(self),
        }
    }
}

/// One unit of watcher work, always handled as a whole.
///
/// Entries are slash-separated paths relative to the source root. The two
/// flags mark changes to files that are not site content: the host config
/// and the isolation scope.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub entries: BTreeMap<String, ChangeKind>,
    pub config: bool,
    pub scope: bool,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && !self.config && !self.scope
    }

    /// Record an event, folding it into any earlier event for the same path.
    pub fn record(&mut self, path: impl Into<String>, kind: ChangeKind) {
        let path = path.into();
        let folded = match self.entries.get(&path) {
            Some(&earlier) => earlier.then(kind),
            None => Some(kind),
        };
        match folded {
            Some(kind) => self.entries.insert(path, kind),
            None => self.entries.remove(&path),
        };
    }

    /// Fold a later change set into this one.
    pub fn merge(&mut self, later: ChangeSet) {
        for (path, kind) in later.entries {
            self.record(path, kind);
        }
        self.config |= later.config;
        self.scope |= later.scope;
    }

    fn with_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(p, _)| p.as_str())
    }

    pub fn added(&self) -> impl Iterator<Item = &str> {
        self.with_kind(ChangeKind::Created)
    }

    pub fn modified(&self) -> impl Iterator<Item = &str> {
        self.with_kind(ChangeKind::Modified)
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.with_kind(ChangeKind::Removed)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// =============================================================================
// BuildActor Messages
// =============================================================================

/// Messages to Build Actor
#[derive(Debug)]
pub enum BuildMsg {
    /// Debounced source changes
    Changes(ChangeSet),
    /// Shutdown
    Shutdown,
}

// =============================================================================
// HubActor Messages
// =============================================================================

/// Messages to Hub Actor
#[derive(Debug)]
pub enum HubMsg {
    /// Accepted push-channel connection (HTTP upgrade request not yet read)
    AddClient(TcpStream),
    /// Output pages that changed, in build-completion order
    Reload { pages: Vec<String> },
    /// Close every connection and stop
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_transitions() {
        let mut set = ChangeSet::default();
        set.record("a.md", ChangeKind::Removed);
        set.record("a.md", ChangeKind::Created);
        assert_eq!(set.entries["a.md"], ChangeKind::Modified);

        set.record("b.md", ChangeKind::Created);
        set.record("b.md", ChangeKind::Removed);
        assert!(!set.entries.contains_key("b.md"));

        set.record("c.md", ChangeKind::Modified);
        set.record("c.md", ChangeKind::Removed);
        assert_eq!(set.entries["c.md"], ChangeKind::Removed);

        set.record("d.md", ChangeKind::Created);
        set.record("d.md", ChangeKind::Modified);
        assert_eq!(set.entries["d.md"], ChangeKind::Created);
    }

    #[test]
    fn test_merge_keeps_flags() {
        let mut first = ChangeSet::default();
        first.record("a.md", ChangeKind::Modified);

        let mut later = ChangeSet {
            scope: true,
            ..Default::default()
        };
        later.record("b.css", ChangeKind::Created);

        first.merge(later);
        assert!(first.scope);
        assert!(!first.config);
        assert_eq!(first.modified().collect::<Vec<_>>(), vec!["a.md"]);
        assert_eq!(first.added().collect::<Vec<_>>(), vec!["b.css"]);
        assert_eq!(first.removed().count(), 0);
    }

    #[test]
    fn test_empty() {
        assert!(ChangeSet::default().is_empty());
        let flagged = ChangeSet {
            config: true,
            ..Default::default()
        };
        assert!(!flagged.is_empty());
    }
}
