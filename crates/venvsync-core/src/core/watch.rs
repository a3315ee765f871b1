use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};
use venvsync_domain::{ProjectRoot, MARKER_FILE};

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to watch {root}: {source}")]
    Start {
        root: Utf8PathBuf,
        #[source]
        source: notify::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerEventKind {
    Created,
    Changed,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerEvent {
    pub root: ProjectRoot,
    pub kind: MarkerEventKind,
}

/// Live watch on one project root; dropping it stops the watch.
struct WatchHandle {
    _watcher: RecommendedWatcher,
}

/// Active marker watches keyed by project root.
pub struct WatchRegistry {
    watches: HashMap<Utf8PathBuf, WatchHandle>,
    tx: Sender<MarkerEvent>,
    rx: Receiver<MarkerEvent>,
}

impl Default for WatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchRegistry {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            watches: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Starts watching `root` for marker changes. Returns `false` when the
    /// root was already being watched.
    ///
    /// # Errors
    /// Returns an error when the platform watcher cannot be created.
    pub fn start(&mut self, root: &ProjectRoot) -> Result<bool, WatchError> {
        if self.watches.contains_key(root.path()) {
            return Ok(false);
        }
        let start_error = |source| WatchError::Start {
            root: root.path().to_path_buf(),
            source,
        };

        let tx = self.tx.clone();
        let event_root = root.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if let Some(kind) = marker_event_kind(&event) {
                        let _ = tx.send(MarkerEvent {
                            root: event_root.clone(),
                            kind,
                        });
                    }
                }
                Err(err) => warn!(root = %event_root, "watch error: {err}"),
            }
        })
        .map_err(start_error)?;
        // The marker may not exist yet, so watch its directory.
        watcher
            .watch(root.path().as_std_path(), RecursiveMode::NonRecursive)
            .map_err(start_error)?;

        debug!(root = %root, "watching marker");
        self.watches.insert(
            root.path().to_path_buf(),
            WatchHandle { _watcher: watcher },
        );
        Ok(true)
    }

    pub fn stop(&mut self, root: &ProjectRoot) -> bool {
        let removed = self.watches.remove(root.path()).is_some();
        if removed {
            debug!(root = %root, "stopped watching marker");
        }
        removed
    }

    pub fn stop_all(&mut self) {
        self.watches.clear();
    }

    #[must_use]
    pub fn is_watching(&self, root: &ProjectRoot) -> bool {
        self.watches.contains_key(root.path())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// Waits up to `timeout` for a marker event, then keeps collecting until
    /// the stream stays quiet for `settle` or another `timeout` has passed.
    ///
    /// Each root is reported once, with the kind of its latest event.
    pub fn wait_for_changes(&self, timeout: Duration, settle: Duration) -> Vec<MarkerEvent> {
        let mut changed = BTreeMap::new();
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                changed.insert(event.root, event.kind);
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                return Vec::new();
            }
        }
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!("marker events still arriving, flushing batch");
                break;
            }
            match self.rx.recv_timeout(settle.min(remaining)) {
                Ok(event) => {
                    changed.insert(event.root, event.kind);
                }
                Err(_) => break,
            }
        }
        changed
            .into_iter()
            .map(|(root, kind)| MarkerEvent { root, kind })
            .collect()
    }
}

fn marker_event_kind(event: &Event) -> Option<MarkerEventKind> {
    let touches_marker = event
        .paths
        .iter()
        .any(|path| path.file_name().is_some_and(|name| name == MARKER_FILE));
    if !touches_marker {
        return None;
    }
    match event.kind {
        EventKind::Create(_) => Some(MarkerEventKind::Created),
        EventKind::Modify(_) => Some(MarkerEventKind::Changed),
        EventKind::Remove(_) => Some(MarkerEventKind::Removed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use notify::event::{CreateKind, ModifyKind};

    use super::*;
    use crate::core::test_support::project_with_storage;

    #[test]
    fn start_and_stop_track_registrations() {
        let (_temp, root, _storage) = project_with_storage();
        let mut registry = WatchRegistry::new();
        assert!(registry.is_empty());

        assert!(registry.start(&root).unwrap());
        assert!(!registry.start(&root).unwrap());
        assert!(registry.is_watching(&root));
        assert_eq!(registry.len(), 1);

        assert!(registry.stop(&root));
        assert!(!registry.stop(&root));
        assert!(!registry.is_watching(&root));

        registry.start(&root).unwrap();
        registry.stop_all();
        assert!(registry.is_empty());
    }

    #[test]
    fn starting_on_missing_directory_fails() {
        let (_temp, root, _storage) = project_with_storage();
        let gone = ProjectRoot::new(root.path().join("missing")).unwrap();
        let mut registry = WatchRegistry::new();
        assert!(registry.start(&gone).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn only_marker_paths_produce_events() {
        let marker = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/p").join(MARKER_FILE));
        assert_eq!(marker_event_kind(&marker), Some(MarkerEventKind::Created));

        let modified = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/p").join(MARKER_FILE));
        assert_eq!(marker_event_kind(&modified), Some(MarkerEventKind::Changed));

        let other = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/p/pyproject.toml"));
        assert_eq!(marker_event_kind(&other), None);
    }

    #[test]
    fn writing_the_marker_reports_the_root() {
        let (_temp, root, _storage) = project_with_storage();
        let mut registry = WatchRegistry::new();
        registry.start(&root).unwrap();

        fs::write(root.marker_path(), "/usr/bin/python3\n").unwrap();
        let changed =
            registry.wait_for_changes(Duration::from_secs(10), Duration::from_millis(200));
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].root, root);
    }

    #[test]
    fn batch_keeps_latest_kind_per_root() {
        let (_temp, root, _storage) = project_with_storage();
        let registry = WatchRegistry::new();
        for kind in [MarkerEventKind::Created, MarkerEventKind::Removed] {
            registry
                .tx
                .send(MarkerEvent {
                    root: root.clone(),
                    kind,
                })
                .unwrap();
        }
        let changed =
            registry.wait_for_changes(Duration::from_millis(100), Duration::from_millis(10));
        assert_eq!(
            changed,
            vec![MarkerEvent {
                root,
                kind: MarkerEventKind::Removed,
            }]
        );
    }

    #[test]
    fn steady_event_stream_is_cut_off_at_the_deadline() {
        let (_temp, root, _storage) = project_with_storage();
        let registry = WatchRegistry::new();
        let tx = registry.tx.clone();
        let feeder_root = root.clone();
        let feeder = std::thread::spawn(move || {
            let until = Instant::now() + Duration::from_secs(2);
            while Instant::now() < until {
                let event = MarkerEvent {
                    root: feeder_root.clone(),
                    kind: MarkerEventKind::Changed,
                };
                if tx.send(event).is_err() {
                    break;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        });

        let started = Instant::now();
        let changed =
            registry.wait_for_changes(Duration::from_millis(200), Duration::from_millis(50));
        assert!(started.elapsed() < Duration::from_secs(1), "{:?}", started.elapsed());
        assert_eq!(changed.len(), 1);
        feeder.join().unwrap();
    }

    #[test]
    fn quiet_registry_times_out_empty() {
        let registry = WatchRegistry::new();
        assert!(registry
            .wait_for_changes(Duration::from_millis(50), Duration::from_millis(10))
            .is_empty());
    }
}
