use crate::{AssetError, AssetSource, ImportedScene, import_gltf};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Identifies one issued load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub u64);

impl std::fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "load-{}", self.0)
    }
}

/// Result of one load, reported exactly once per ticket.
#[derive(Debug)]
pub struct LoadOutcome {
    pub ticket: LoadTicket,
    pub path: String,
    pub result: Result<ImportedScene, AssetError>,
}

/// Delivers a worker's outcome. Dropped unsent, it reports
/// [`AssetError::Disconnected`] so a panicking worker still answers its ticket.
struct Reporter {
    ticket: LoadTicket,
    path: String,
    tx: Option<Sender<LoadOutcome>>,
}

impl Reporter {
    fn send(mut self, result: Result<ImportedScene, AssetError>) {
        self.deliver(result);
    }

    fn deliver(&mut self, result: Result<ImportedScene, AssetError>) {
        if let Some(tx) = self.tx.take() {
            // The receiver is gone once the loader is dropped.
            let _ = tx.send(LoadOutcome {
                ticket: self.ticket,
                path: std::mem::take(&mut self.path),
                result,
            });
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        if self.tx.is_some() {
            tracing::error!(ticket = %self.ticket, path = %self.path, "loader worker exited without reporting");
            self.deliver(Err(AssetError::Disconnected));
        }
    }
}

/// Fetches and decodes assets on worker threads.
///
/// Each request runs on its own thread so loads never wait on one another.
/// Outcomes arrive in completion order, which is not request order. There is
/// no cancellation: dropping the loader only makes late results undeliverable.
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
    next_ticket: u64,
    in_flight: usize,
}

impl AssetLoader {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            source,
            tx,
            rx,
            next_ticket: 0,
            in_flight: 0,
        }
    }

    /// Start loading `path` in the background.
    pub fn request(&mut self, path: impl Into<String>) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight += 1;

        let path = path.into();
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let worker_path = path.clone();

        let spawned = thread::Builder::new()
            .name(format!("asset-{ticket}"))
            .spawn(move || {
                let reporter = Reporter {
                    ticket,
                    path: worker_path,
                    tx: Some(tx),
                };
                let result = source
                    .fetch(&reporter.path)
                    .and_then(|bytes| import_gltf(&bytes));
                reporter.send(result);
            });

        if let Err(e) = spawned {
            tracing::error!(%ticket, %path, "failed to spawn loader thread: {e}");
            let _ = self.tx.send(LoadOutcome {
                ticket,
                path: path.clone(),
                result: Err(AssetError::Io(e)),
            });
        }

        tracing::debug!(%ticket, %path, "asset load requested");
        ticket
    }

    /// Take one finished load without blocking.
    pub fn try_next(&mut self) -> Option<LoadOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(outcome)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block up to `timeout` for the next finished load.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<LoadOutcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Loads requested but not yet taken.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemorySource, fixtures};
    use std::collections::BTreeSet;

    const WAIT: Duration = Duration::from_secs(10);

    #[test]
    fn every_request_reports_once() {
        let source = fixtures::room_source(&["frame", "roomA", "roomB"]);
        let mut loader = AssetLoader::new(Arc::new(source));
        let tickets: BTreeSet<_> = ["frame", "roomA", "roomB"]
            .iter()
            .map(|n| loader.request(format!("./assets/{n}.glb")))
            .collect();
        assert_eq!(loader.in_flight(), 3);

        let mut seen = BTreeSet::new();
        while let Some(outcome) = loader.next_timeout(WAIT) {
            assert!(outcome.result.is_ok());
            seen.insert(outcome.ticket);
            if seen.len() == tickets.len() {
                break;
            }
        }
        assert_eq!(seen, tickets);
        assert_eq!(loader.in_flight(), 0);
        assert!(loader.try_next().is_none());
    }

    #[test]
    fn missing_asset_reports_error() {
        let mut loader = AssetLoader::new(Arc::new(MemorySource::new()));
        let ticket = loader.request("./assets/roomC.glb");
        let outcome = loader.next_timeout(WAIT).unwrap();
        assert_eq!(outcome.ticket, ticket);
        assert_eq!(outcome.path, "./assets/roomC.glb");
        assert!(matches!(outcome.result, Err(AssetError::NotFound(_))));
    }

    #[test]
    fn malformed_asset_reports_error() {
        let source = MemorySource::new().with("bad.glb", b"glTF\x02".to_vec());
        let mut loader = AssetLoader::new(Arc::new(source));
        loader.request("bad.glb");
        let outcome = loader.next_timeout(WAIT).unwrap();
        assert!(matches!(outcome.result, Err(AssetError::Gltf(_))));
    }

    struct PanickingSource;

    impl AssetSource for PanickingSource {
        fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError> {
            panic!("source failed on {path}");
        }
    }

    #[test]
    fn panicked_worker_reports_disconnected() {
        let mut loader = AssetLoader::new(Arc::new(PanickingSource));
        let ticket = loader.request("./assets/frame.glb");
        let outcome = loader.next_timeout(WAIT).unwrap();
        assert_eq!(outcome.ticket, ticket);
        assert_eq!(outcome.path, "./assets/frame.glb");
        assert!(matches!(outcome.result, Err(AssetError::Disconnected)));
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn try_next_is_empty_before_any_request() {
        let mut loader = AssetLoader::new(Arc::new(MemorySource::new()));
        assert!(loader.try_next().is_none());
    }
}
