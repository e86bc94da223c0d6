//! FileSystem Actor
//!
//! Watches the site and sends debounced change sets to the BuildActor.
//! The watcher starts before the initial build so that no edit made during
//! it is lost.
//!
//! ```text
//! Watcher → Debouncer (timing) → EventClassifier (disk state) → router → BuildMsg
//! ```

use std::path::PathBuf;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::BuildMsg;

// Disk-state reconciliation.
mod classifier;
// Timing and per-path deduplication.
mod debouncer;
// Absolute paths -> source-relative change set.
mod router;
// Watch root attach/re-attach.
mod watch_roots;


use classifier::EventClassifier;
use debouncer::Debouncer;
use router::{log_change_set, to_change_set};
use watch_roots::WatchRoots;

const HOLD_POLL: Duration = Duration::from_millis(100);

pub struct FsActor {
    /// notify callback → actor (sync side)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Must stay alive for events to flow
    watcher: RecommendedWatcher,
    watch_roots: WatchRoots,
    build_tx: mpsc::Sender<BuildMsg>,
    debouncer: Debouncer,
}

impl FsActor {
    pub fn new(paths: Vec<PathBuf>, build_tx: mpsc::Sender<BuildMsg>) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut watch_roots = WatchRoots::new(paths);
        watch_roots.attach_existing(&mut watcher)?;

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            build_tx,
            debouncer: Debouncer::new(),
        })
    }

    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            build_tx,
            mut debouncer,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // notify has no async API: bridge through a blocking thread
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => debouncer.add_event(&event),
                    None => break,
                },
                _ = tokio::time::sleep(wait_for(&debouncer)) => {
                    watch_roots.maintain(&mut watcher);
                    if flush(&mut debouncer, &build_tx).await.is_err() {
                        break;
                    }
                }
            }
        }
        crate::debug!("watch"; "stopped");
    }
}

/// Events are held until the initial build is done; poll slowly until then.
fn wait_for(debouncer: &Debouncer) -> Duration {
    if crate::core::is_serving() {
        debouncer.sleep_duration()
    } else {
        HOLD_POLL
    }
}

/// Send ready events to the build lane.
///
/// Returns `Err(())` once the BuildActor is gone.
async fn flush(debouncer: &mut Debouncer, build_tx: &mpsc::Sender<BuildMsg>) -> Result<(), ()> {
    // Hold events until the initial build is done (checked before taking)
    if !crate::core::is_serving() {
        return Ok(());
    }
    let Some(raw) = debouncer.take_if_ready() else {
        return Ok(());
    };
    let Some(changes) = EventClassifier::classify(raw) else {
        return Ok(());
    };

    let set = to_change_set(changes, &crate::config::cfg());
    if set.is_empty() {
        return Ok(());
    }
    log_change_set(&set);
    build_tx.send(BuildMsg::Changes(set)).await.map_err(|_| ())
}
