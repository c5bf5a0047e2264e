//! Removable storage the logs live on.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Byte sink a recording is written to.
pub type LogSink = Box<dyn Write + Send>;

/// Byte source a recording is read from.
pub type LogSource = Box<dyn Read + Send>;

/// A storage medium that may or may not be inserted.
pub trait Storage: Send + Sync {
    /// Whether the medium is present at all.
    fn is_present(&self) -> bool;

    /// Create (or truncate) the file at `path` for writing.
    fn create(&self, path: &Path) -> io::Result<LogSink>;

    /// Open the file at `path` for reading.
    fn open(&self, path: &Path) -> io::Result<LogSource>;
}

/// Storage on the local filesystem, present while its mount point exists.
#[derive(Clone, Debug)]
pub struct FsStorage {
    mount_point: PathBuf,
}

impl FsStorage {
    pub fn new(mount_point: impl Into<PathBuf>) -> Self {
        Self {
            mount_point: mount_point.into(),
        }
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }
}

impl Storage for FsStorage {
    fn is_present(&self) -> bool {
        self.mount_point.is_dir()
    }

    fn create(&self, path: &Path) -> io::Result<LogSink> {
        Ok(Box::new(File::create(path)?))
    }

    fn open(&self, path: &Path) -> io::Result<LogSource> {
        Ok(Box::new(File::open(path)?))
    }
}

type Files = Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>;

/// In-memory storage used by tests and tools.
///
/// Clones share the same files, so a test can keep one handle and inspect
/// what a session wrote through another.
#[derive(Clone, Debug)]
pub struct MemoryStorage {
    files: Files,
    present: Arc<AtomicBool>,
    write_budget: Arc<Mutex<Option<usize>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            present: Arc::new(AtomicBool::new(true)),
            write_budget: Arc::new(Mutex::new(None)),
        }
    }

    /// Simulate inserting or removing the medium.
    pub fn set_present(&self, present: bool) {
        self.present.store(present, Ordering::SeqCst);
    }

    /// Make writes fail once `bytes` more bytes have been accepted.
    pub fn fail_writes_after(&self, bytes: usize) {
        *self.write_budget.lock() = Some(bytes);
    }

    pub fn insert(&self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.files.lock().insert(path.into(), bytes);
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn is_present(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    fn create(&self, path: &Path) -> io::Result<LogSink> {
        if !self.is_present() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no medium"));
        }
        self.files.lock().insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(MemoryWriter {
            files: self.files.clone(),
            budget: self.write_budget.clone(),
            path: path.to_path_buf(),
        }))
    }

    fn open(&self, path: &Path) -> io::Result<LogSource> {
        let bytes = self
            .files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}

struct MemoryWriter {
    files: Files,
    budget: Arc<Mutex<Option<usize>>>,
    path: PathBuf,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut budget = self.budget.lock();
        let accepted = match *budget {
            Some(0) => return Err(io::Error::new(io::ErrorKind::Other, "medium full")),
            Some(left) => {
                let n = left.min(buf.len());
                *budget = Some(left - n);
                n
            }
            None => buf.len(),
        };

        self.files
            .lock()
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(&buf[..accepted]);
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
