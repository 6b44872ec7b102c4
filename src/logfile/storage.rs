//! Trait abstraction for logfile storage to enable testing

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Trait for append-only logfile storage
pub trait LogStorage: Send {
    /// Stream type handed out for each open logfile
    type Stream: Write + Send;

    /// Open `file_name` for appending, creating it if needed
    fn open_append(&mut self, file_name: &str) -> io::Result<Self::Stream>;

    /// Flush and close a stream
    fn close(&mut self, mut stream: Self::Stream) -> io::Result<()> {
        stream.flush()
    }

    /// Human-readable location of `file_name`, used in errors and logs
    fn location(&self, file_name: &str) -> String {
        file_name.to_string()
    }
}

/// Logfiles stored as real files under a directory (the storage mount point)
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl LogStorage for FsStorage {
    type Stream = BufWriter<File>;

    fn open_append(&mut self, file_name: &str) -> io::Result<Self::Stream> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(file_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "logfile_opened");
        Ok(BufWriter::new(file))
    }

    fn close(&mut self, stream: Self::Stream) -> io::Result<()> {
        let file = stream.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }

    fn location(&self, file_name: &str) -> String {
        self.root.join(file_name).display().to_string()
    }
}
