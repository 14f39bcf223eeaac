//! Key/value file writer.

use crate::errors::KvError;
use crate::frame::{check_header, file_header, FrameKind, RecordFrame, HEADER_SIZE};
use crate::record::KvRecord;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

/// Options for opening a writer.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Whether to fsync after each append (default: false).
    pub sync: bool,
    /// Whether to create the file if it doesn't exist (default: true).
    pub create: bool,
    /// Whether to keep existing records (default: true). When false the file
    /// is reset to an empty header.
    pub append: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync: false,
            create: true,
            append: true,
        }
    }
}

/// Appends put/remove frames to a key/value file.
///
/// ```rust
/// use sportsbuddy_kv::{KvWriter, WriteOptions};
/// use serde_json::json;
///
/// let dir = tempfile::tempdir()?;
/// let mut writer = KvWriter::open(dir.path().join("state.kv"), WriteOptions::default())?;
/// writer.put("categories", &json!(["Football"]))?;
/// writer.remove("session")?;
/// writer.finish()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct KvWriter {
    file: File,
    sync: bool,
}

impl KvWriter {
    /// Opens or creates a key/value file for appending.
    ///
    /// An empty file receives a fresh header. An existing file must carry a
    /// valid header.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, KvError> {
        let file = OpenOptions::new()
            .create(options.create)
            .write(true)
            .read(true)
            .open(path)?;

        let mut writer = Self {
            file,
            sync: options.sync,
        };

        let len = writer.file.metadata()?.len();
        if len == 0 {
            writer.write_header()?;
        } else if len < HEADER_SIZE as u64 {
            return Err(KvError::FileNotEmpty);
        } else {
            let mut header_bytes = [0u8; HEADER_SIZE];
            writer.file.seek(io::SeekFrom::Start(0))?;
            writer.file.read_exact(&mut header_bytes)?;
            check_header(&header_bytes)?;
            if options.append {
                writer.file.seek(io::SeekFrom::End(0))?;
            } else {
                writer.file.set_len(HEADER_SIZE as u64)?;
                writer.file.seek(io::SeekFrom::Start(HEADER_SIZE as u64))?;
            }
        }

        Ok(writer)
    }

    fn write_header(&mut self) -> Result<(), KvError> {
        self.file.write_all(&file_header())?;
        self.flush()
    }

    /// Appends a put frame.
    pub fn put(&mut self, key: &str, value: &Value) -> Result<(), KvError> {
        self.append(&KvRecord::Put {
            key: key.to_string(),
            value: value.clone(),
        })
    }

    /// Appends a remove frame.
    pub fn remove(&mut self, key: &str) -> Result<(), KvError> {
        self.append(&KvRecord::Remove {
            key: key.to_string(),
        })
    }

    /// Appends an encoded record.
    pub fn append(&mut self, record: &KvRecord) -> Result<(), KvError> {
        let (kind, payload) = record.encode()?;
        self.append_raw(kind, &payload)
    }

    /// Appends a raw frame with the given kind and payload.
    pub fn append_raw(&mut self, kind: FrameKind, payload: &[u8]) -> Result<(), KvError> {
        let frame = RecordFrame::new(kind, payload.len())?;
        // single write so a crash leaves at most one torn frame
        let mut buf = Vec::with_capacity(frame.to_bytes().len() + payload.len());
        buf.extend_from_slice(&frame.to_bytes());
        buf.extend_from_slice(payload);
        self.file.write_all(&buf)?;
        self.flush()
    }

    fn flush(&mut self) -> Result<(), KvError> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Flushes and closes the file.
    pub fn finish(mut self) -> Result<(), KvError> {
        self.flush()
    }
}

impl Drop for KvWriter {
    fn drop(&mut self) {
        let _ = self.file.flush();
        if self.sync {
            let _ = self.file.sync_all();
        }
    }
}
