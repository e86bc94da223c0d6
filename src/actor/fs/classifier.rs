use std::path::PathBuf;

use rustc_hash::FxHashMap;

use crate::actor::messages::ChangeKind;

/// Reconciles debounced events with what is actually on disk.
///
/// Pipeline: correct_by_existence → filter_actionable
pub(super) struct EventClassifier;

impl EventClassifier {
    pub(super) fn classify(
        mut changes: FxHashMap<PathBuf, ChangeKind>,
    ) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        Self::correct_by_existence(&mut changes);
        Self::filter_actionable(&mut changes);

        (!changes.is_empty()).then_some(changes)
    }

    /// The watcher may report stale kinds: a Created file already deleted
    /// again, or a Removed file that exists after an atomic save.
    pub(super) fn correct_by_existence(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        changes.retain(|path, kind| {
            let exists = path.exists();
            match *kind {
                ChangeKind::Created if !exists => {
                    crate::debug!("watch"; "discard created (gone): {}", path.display());
                    return false;
                }
                ChangeKind::Modified if !exists => *kind = ChangeKind::Removed,
                ChangeKind::Removed if exists => *kind = ChangeKind::Modified,
                _ => {}
            }
            true
        });
    }

    /// Created/Modified must name a file; directory events carry no work.
    /// Removed entries stay, since a removed directory is still pruned from
    /// the destination.
    pub(super) fn filter_actionable(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        changes.retain(|path, kind| match kind {
            ChangeKind::Created | ChangeKind::Modified => path.is_file(),
            ChangeKind::Removed => true,
        });
    }
}
