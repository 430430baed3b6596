//! Asynchronous asset loading.
//!
//! A load request carries a generation number. Loaders report back through
//! a [`LoadSender`], which tags every event with that generation and posts it
//! on the viewer's channel; the viewer drains the channel on its own thread
//! and drops events from superseded requests.
//!
//! A request ends with exactly one terminal event: [`LoadSender::succeed`] and
//! [`LoadSender::fail`] consume the sender, and a sender dropped without either
//! (loader bug, panicked thread) reports [`LoadError::Abandoned`].

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};

use thiserror::Error;
use tracing::{debug, warn};

use crate::geometry::{GeometryError, GeometryFormat, RawGeometry};

const READ_CHUNK: usize = 64 * 1024;

/// Why an asset could not be loaded.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("no asset registered at '{0}'")]
    NotFound(PathBuf),
    #[error("asset loader stopped without a result")]
    Abandoned,
    #[error("failed to start asset loader: {0}")]
    Spawn(std::io::Error),
    #[error("failed to build the loaded model: {0}")]
    Install(String),
}

/// A request to load one asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub path: PathBuf,
}

/// What happened to a request.
#[derive(Debug)]
pub enum LoadEventKind {
    Progress { loaded: u64, total: u64 },
    Loaded(RawGeometry),
    Failed(LoadError),
}

/// A [`LoadEventKind`] tagged with the generation of its request.
#[derive(Debug)]
pub struct LoadEvent {
    pub generation: u64,
    pub kind: LoadEventKind,
}

/// Reporting end of one load request.
#[derive(Debug)]
pub struct LoadSender {
    generation: u64,
    tx: Sender<LoadEvent>,
    finished: bool,
}

impl LoadSender {
    pub(crate) fn new(generation: u64, tx: Sender<LoadEvent>) -> Self {
        Self {
            generation,
            tx,
            finished: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn progress(&self, loaded: u64, total: u64) {
        self.send(LoadEventKind::Progress { loaded, total });
    }

    pub fn succeed(mut self, geometry: RawGeometry) {
        self.finished = true;
        self.send(LoadEventKind::Loaded(geometry));
    }

    pub fn fail(mut self, error: LoadError) {
        self.finished = true;
        self.send(LoadEventKind::Failed(error));
    }

    fn send(&self, kind: LoadEventKind) {
        let event = LoadEvent {
            generation: self.generation,
            kind,
        };
        // The viewer owning the receiver is gone; nobody is listening.
        if self.tx.send(event).is_err() {
            debug!(generation = self.generation, "load event dropped, receiver closed");
        }
    }
}

impl Drop for LoadSender {
    fn drop(&mut self) {
        if !self.finished {
            self.send(LoadEventKind::Failed(LoadError::Abandoned));
        }
    }
}

/// Something that can fetch an asset and report back asynchronously.
///
/// `load` must not block on the asset itself; events may be posted from any
/// thread and are processed on the next [`Viewer::poll_loads`](crate::Viewer::poll_loads).
pub trait AssetLoader {
    fn load(&mut self, request: LoadRequest, events: LoadSender);
}

/// Loads assets from disk on a background thread.
///
/// Paths are resolved against `root`. The file is read in chunks with a
/// progress event per chunk, then parsed by extension. A worker thread that
/// cannot be started is reported as [`LoadError::Spawn`].
#[derive(Clone, Debug, Default)]
pub struct FileLoader {
    root: PathBuf,
    stack_size: Option<usize>,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stack_size: None,
        }
    }

    /// Stack size of the worker threads, in bytes.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    fn read(path: &Path, events: &LoadSender) -> Result<RawGeometry, LoadError> {
        let format = GeometryFormat::from_path(path)?;
        let mut file = std::fs::File::open(path).map_err(GeometryError::from)?;
        let total = file.metadata().map_err(GeometryError::from)?.len();

        let mut bytes = Vec::with_capacity(total as usize);
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let n = file.read(&mut chunk).map_err(GeometryError::from)?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..n]);
            events.progress(bytes.len() as u64, total);
        }

        Ok(RawGeometry::from_bytes(format, &bytes)?)
    }
}

impl AssetLoader for FileLoader {
    fn load(&mut self, request: LoadRequest, events: LoadSender) {
        let path = self.root.join(&request.path);

        // The sender is handed over only once the thread is running, so a
        // failed spawn can still report through it.
        let (handoff, receive) = mpsc::channel::<LoadSender>();
        let mut builder =
            std::thread::Builder::new().name(format!("asset-load-{}", request.generation));
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        let spawned = builder.spawn(move || {
            let Ok(events) = receive.recv() else {
                return;
            };
            let result = Self::read(&path, &events);
            match result {
                Ok(geometry) => events.succeed(geometry),
                Err(e) => events.fail(e),
            }
        });

        match spawned {
            // A worker gone before the handoff drops the returned sender,
            // which reports the request as abandoned.
            Ok(_) => drop(handoff.send(events)),
            Err(e) => {
                warn!(generation = request.generation, error = %e, "failed to spawn asset loader thread");
                events.fail(LoadError::Spawn(e));
            }
        }
    }
}

/// Serves pre-registered geometry from memory.
///
/// Events are posted immediately but still processed on the next poll, so
/// callers observe the same asynchronous ordering as with [`FileLoader`].
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    assets: HashMap<PathBuf, RawGeometry>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, geometry: RawGeometry) {
        self.assets.insert(path.into(), geometry);
    }

    pub fn with(mut self, path: impl Into<PathBuf>, geometry: RawGeometry) -> Self {
        self.insert(path, geometry);
        self
    }
}

impl AssetLoader for MemoryLoader {
    fn load(&mut self, request: LoadRequest, events: LoadSender) {
        match self.assets.get(&request.path) {
            Some(geometry) => {
                let size = (geometry.vertices.len() * std::mem::size_of::<crate::mesh::Vertex3d>()) as u64;
                events.progress(size, size);
                events.succeed(geometry.clone());
            }
            None => events.fail(LoadError::NotFound(request.path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::mpsc;
    use std::time::Duration;

    const TRIANGLE_STL: &str = "solid t
facet normal 0 0 1
  outer loop
    vertex 0 0 0
    vertex 1 0 0
    vertex 0 1 0
  endloop
endfacet
endsolid t
";

    fn drain_until_terminal(rx: &mpsc::Receiver<LoadEvent>) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        loop {
            let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            let terminal = !matches!(event.kind, LoadEventKind::Progress { .. });
            events.push(event);
            if terminal {
                return events;
            }
        }
    }

    #[test]
    fn dropped_sender_reports_abandoned() {
        let (tx, rx) = mpsc::channel();
        drop(LoadSender::new(7, tx));

        let event = rx.recv().unwrap();
        assert_eq!(event.generation, 7);
        assert!(matches!(event.kind, LoadEventKind::Failed(LoadError::Abandoned)));
    }

    #[test]
    fn terminal_event_is_sent_once() {
        let (tx, rx) = mpsc::channel();
        LoadSender::new(1, tx).succeed(RawGeometry::default());

        assert!(matches!(rx.recv().unwrap().kind, LoadEventKind::Loaded(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn memory_loader_reports_missing_assets() {
        let (tx, rx) = mpsc::channel();
        let mut loader = MemoryLoader::new();
        loader.load(
            LoadRequest {
                generation: 3,
                path: "missing.stl".into(),
            },
            LoadSender::new(3, tx),
        );

        let event = rx.recv().unwrap();
        assert!(matches!(event.kind, LoadEventKind::Failed(LoadError::NotFound(_))));
    }

    #[test]
    fn file_loader_reads_stl_with_progress() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("tri.stl")).unwrap();
        file.write_all(TRIANGLE_STL.as_bytes()).unwrap();
        drop(file);

        let (tx, rx) = mpsc::channel();
        let mut loader = FileLoader::new(dir.path());
        loader.load(
            LoadRequest {
                generation: 1,
                path: "tri.stl".into(),
            },
            LoadSender::new(1, tx),
        );

        let events = drain_until_terminal(&rx);
        let (last, progress) = events.split_last().unwrap();
        assert!(!progress.is_empty());
        match &last.kind {
            LoadEventKind::Loaded(geometry) => assert_eq!(geometry.triangle_count(), 1),
            other => panic!("expected Loaded, got {:?}", other),
        }
    }

    #[test]
    fn file_loader_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        FileLoader::new(dir.path()).load(
            LoadRequest {
                generation: 2,
                path: "nope.stl".into(),
            },
            LoadSender::new(2, tx),
        );

        let events = drain_until_terminal(&rx);
        assert!(matches!(
            events.last().unwrap().kind,
            LoadEventKind::Failed(LoadError::Geometry(GeometryError::Io(_)))
        ));
    }

    #[test]
    fn file_loader_reports_thread_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        // No address space can hold this stack.
        FileLoader::new(dir.path()).with_stack_size(usize::MAX / 2).load(
            LoadRequest {
                generation: 4,
                path: "tri.stl".into(),
            },
            LoadSender::new(4, tx),
        );

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.generation, 4);
        assert!(matches!(event.kind, LoadEventKind::Failed(LoadError::Spawn(_))));
        assert!(rx.try_recv().is_err());
    }
}
