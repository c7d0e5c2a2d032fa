//! Sink Collaborators
//!
//! Narrow interfaces to the live-stream transport, the storage medium
//! and the status LED, with host implementations of each.

use crate::SinkError;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, trace, warn};

/// Live output, fire-and-forget
pub trait StreamSink: Send {
    fn write(&mut self, bytes: &[u8]);
}

/// Storage medium holding the CSV log files
///
/// Calls are made from the sink task without leaving the async context,
/// so an implementation must either be fast (one short row per call) or
/// run on a runtime where the sink task has a worker to itself.
pub trait LogMedium: Send {
    /// Create (or truncate) `name` and keep it open for writing
    fn create(&mut self, name: &str) -> Result<(), SinkError>;

    /// Append to the open file
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError>;

    /// Close the open file, if any
    fn close(&mut self);

    /// Full release and reacquire of the medium
    fn reset_medium(&mut self) -> Result<(), SinkError>;
}

/// Board status LED
pub trait StatusIndicator: Send {
    fn toggle(&mut self);
}

/// Live stream on the process's standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl StreamSink for StdoutSink {
    fn write(&mut self, bytes: &[u8]) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = out.write_all(bytes).and_then(|_| out.flush()) {
            debug!("Stream write dropped: {}", e);
        }
    }
}

/// Medium backed by a host directory
///
/// Uses blocking `std::fs` calls, and `close` waits for `sync_all`. Fine
/// for a local disk at the sampling rate; point it at slow or network
/// storage only with a multi-threaded runtime.
pub struct DirectoryMedium {
    root: PathBuf,
    file: Option<File>,
}

impl DirectoryMedium {
    /// Mount the medium at `root`, creating the directory if needed
    pub fn mount(root: impl AsRef<Path>) -> Result<Self, SinkError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| SinkError::Medium(format!("{}: {}", root.display(), e)))?;
        info!("Storage medium mounted at {}", root.display());
        Ok(Self { root, file: None })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl LogMedium for DirectoryMedium {
    fn create(&mut self, name: &str) -> Result<(), SinkError> {
        let path = self.root.join(name);
        let file = File::create(&path).map_err(|e| SinkError::Create {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.file = Some(file);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        let file = self.file.as_mut().ok_or(SinkError::NotOpen)?;
        file.write_all(bytes)
            .map_err(|e| SinkError::Write(e.to_string()))
    }

    fn close(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.sync_all() {
                warn!("Sync on close failed: {}", e);
            }
        }
    }

    fn reset_medium(&mut self) -> Result<(), SinkError> {
        debug!("Remounting storage medium at {}", self.root.display());
        self.file = None;
        fs::create_dir_all(&self.root)
            .map_err(|e| SinkError::Medium(format!("{}: {}", self.root.display(), e)))
    }
}

/// LED stand-in that reports its state in the trace log
#[derive(Debug, Default)]
pub struct TraceIndicator {
    lit: bool,
}

impl StatusIndicator for TraceIndicator {
    fn toggle(&mut self) {
        self.lit = !self.lit;
        trace!("Status LED {}", if self.lit { "on" } else { "off" });
    }
}

/// In-memory live stream; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryStream {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl StreamSink for MemoryStream {
    fn write(&mut self, bytes: &[u8]) {
        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(bytes);
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, Vec<u8>>,
    open: Option<String>,
    create_attempts: Vec<String>,
    resets: usize,
    failing_creates: usize,
    failing_writes: usize,
}

/// In-memory medium with scripted failures; clones share state
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` creates fail
    pub fn fail_next_creates(&self, count: usize) {
        self.lock().failing_creates = count;
    }

    /// Make the next `count` writes fail
    pub fn fail_next_writes(&self, count: usize) {
        self.lock().failing_writes = count;
    }

    /// Contents of a file, if it exists
    pub fn file(&self, name: &str) -> Option<String> {
        self.lock()
            .files
            .get(name)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Names of existing files
    pub fn file_names(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    /// Every name passed to `create`, in order
    pub fn create_attempts(&self) -> Vec<String> {
        self.lock().create_attempts.clone()
    }

    pub fn resets(&self) -> usize {
        self.lock().resets
    }

    pub fn is_open(&self) -> bool {
        self.lock().open.is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LogMedium for MemoryMedium {
    fn create(&mut self, name: &str) -> Result<(), SinkError> {
        let mut state = self.lock();
        state.create_attempts.push(name.to_string());
        if state.failing_creates > 0 {
            state.failing_creates -= 1;
            return Err(SinkError::Create {
                name: name.to_string(),
                reason: "medium not ready".to_string(),
            });
        }
        state.files.insert(name.to_string(), Vec::new());
        state.open = Some(name.to_string());
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        let mut state = self.lock();
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(SinkError::Write("medium not ready".to_string()));
        }
        let name = state.open.clone().ok_or(SinkError::NotOpen)?;
        state
            .files
            .entry(name)
            .or_default()
            .extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) {
        self.lock().open = None;
    }

    fn reset_medium(&mut self) -> Result<(), SinkError> {
        let mut state = self.lock();
        state.open = None;
        state.resets += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_medium_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = DirectoryMedium::mount(dir.path().join("sd")).unwrap();

        medium.create("log.csv").unwrap();
        medium.write(b"a,b\r\n").unwrap();
        medium.write(b"1,2\r\n").unwrap();
        medium.close();

        let written = fs::read_to_string(dir.path().join("sd").join("log.csv")).unwrap();
        assert_eq!(written, "a,b\r\n1,2\r\n");
        assert_eq!(medium.write(b"x"), Err(SinkError::NotOpen));
    }

    #[test]
    fn test_directory_medium_recovers_after_reset() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sd");
        let mut medium = DirectoryMedium::mount(&root).unwrap();

        // Card pulled: the mount point disappears
        fs::remove_dir_all(&root).unwrap();
        assert!(matches!(
            medium.create("log.csv"),
            Err(SinkError::Create { .. })
        ));

        medium.reset_medium().unwrap();
        medium.create("log.csv").unwrap();
        assert!(root.join("log.csv").exists());
    }

    #[test]
    fn test_memory_medium_scripted_failures() {
        let mut medium = MemoryMedium::new();
        let probe = medium.clone();
        probe.fail_next_creates(1);

        assert!(medium.create("a.csv").is_err());
        medium.create("a.csv").unwrap();
        medium.write(b"row").unwrap();

        assert_eq!(probe.create_attempts(), vec!["a.csv", "a.csv"]);
        assert_eq!(probe.file("a.csv").as_deref(), Some("row"));
        assert!(probe.is_open());
    }
}
