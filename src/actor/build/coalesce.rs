use crate::actor::messages::ChangeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LaneState {
    Idle,
    Building,
    Stopped,
}

/// Serializes lane cycles: at most one in flight, later change sets merge
/// into a single pending one.
///
/// ```text
/// Idle --submit--> Building --finish (nothing pending)--> Idle
///                  Building --finish (pending)--> Building
/// any --stop--> Stopped
/// ```
#[derive(Debug)]
pub(super) struct Coalescer {
    state: LaneState,
    pending: Option<ChangeSet>,
}

impl Coalescer {
    pub(super) fn new() -> Self {
        Self {
            state: LaneState::Idle,
            pending: None,
        }
    }

    #[cfg(test)]
    pub(super) fn state(&self) -> LaneState {
        self.state
    }

    /// Returns the set to start now, or `None` when it was buffered.
    pub(super) fn submit(&mut self, changes: ChangeSet) -> Option<ChangeSet> {
        match self.state {
            LaneState::Idle => {
                self.state = LaneState::Building;
                Some(changes)
            }
            LaneState::Building => {
                match &mut self.pending {
                    Some(pending) => pending.merge(changes),
                    None => self.pending = Some(changes),
                }
                None
            }
            LaneState::Stopped => None,
        }
    }

    /// A cycle finished. Returns the merged backlog to run next, if any.
    pub(super) fn finish(&mut self) -> Option<ChangeSet> {
        if self.state != LaneState::Building {
            return None;
        }
        let next = self.pending.take();
        if next.is_none() {
            self.state = LaneState::Idle;
        }
        next
    }

    pub(super) fn stop(&mut self) {
        self.state = LaneState::Stopped;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::messages::ChangeKind;

    fn changes(path: &str) -> ChangeSet {
        let mut set = ChangeSet::default();
        set.record(path, ChangeKind::Modified);
        set
    }

    #[test]
    fn test_idle_starts_immediately() {
        let mut lane = Coalescer::new();
        assert_eq!(lane.submit(changes("a.md")), Some(changes("a.md")));
        assert_eq!(lane.state(), LaneState::Building);
        assert!(lane.finish().is_none());
        assert_eq!(lane.state(), LaneState::Idle);
    }

    #[test]
    fn test_submissions_during_build_merge() {
        let mut lane = Coalescer::new();
        lane.submit(changes("a.md"));
        assert!(lane.submit(changes("b.md")).is_none());
        assert!(lane.submit(changes("c.css")).is_none());

        let next = lane.finish().unwrap();
        assert_eq!(next.paths().collect::<Vec<_>>(), vec!["b.md", "c.css"]);
        assert_eq!(lane.state(), LaneState::Building);

        assert!(lane.finish().is_none());
        assert_eq!(lane.state(), LaneState::Idle);
    }

    #[test]
    fn test_stopped_is_terminal() {
        let mut lane = Coalescer::new();
        lane.submit(changes("a.md"));
        lane.submit(changes("b.md"));
        lane.stop();

        assert!(lane.finish().is_none());
        assert!(lane.submit(changes("c.md")).is_none());
        assert_eq!(lane.state(), LaneState::Stopped);
    }
}
