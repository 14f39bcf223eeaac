//! In-memory view of a key/value file, replayed on open.

use crate::errors::KvError;
use crate::frame::{is_torn_header, HEADER_SIZE};
use crate::reader::{KvReader, ReadMode};
use crate::record::KvRecord;
use crate::writer::{KvWriter, WriteOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Options for [`KvStore::open`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Fsync after every write (default: false).
    pub sync: bool,
    /// Compact once this many frames are shadowed by later writes (default: 256).
    pub compact_after: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            sync: false,
            compact_after: 256,
        }
    }
}

/// Persistent string-keyed JSON map with last-write-wins replay.
///
/// Every mutation is appended as a frame and mirrored in memory, so reads
/// never touch the disk. A torn tail left by a crash is cut off on open.
pub struct KvStore {
    path: PathBuf,
    options: StoreOptions,
    writer: KvWriter,
    entries: BTreeMap<String, Value>,
    frames: u64,
}

impl KvStore {
    /// Opens (or creates) the file at `path` and replays it.
    pub fn open<P: AsRef<Path>>(path: P, options: StoreOptions) -> Result<Self, KvError> {
        let path = path.as_ref().to_path_buf();
        let mut entries = BTreeMap::new();
        let mut frames = 0u64;

        let mut existing = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if existing > 0 && existing < HEADER_SIZE as u64 && is_torn_header(&fs::read(&path)?) {
            warn!(path = %path.display(), len = existing, "discarding torn kv file header");
            OpenOptions::new().write(true).open(&path)?.set_len(0)?;
            existing = 0;
        }
        if existing > 0 {
            let mut reader = KvReader::open(&path, ReadMode::Permissive)?;
            while let Some(record) = reader.read_record()? {
                frames += 1;
                match record {
                    KvRecord::Put { key, value } => {
                        entries.insert(key, value);
                    }
                    KvRecord::Remove { key } => {
                        entries.remove(&key);
                    }
                }
            }
            if reader.position() < reader.file_len() {
                warn!(
                    path = %path.display(),
                    offset = reader.position(),
                    "discarding torn tail of kv file"
                );
                OpenOptions::new()
                    .write(true)
                    .open(&path)?
                    .set_len(reader.position())?;
            }
        }

        let writer = KvWriter::open(
            &path,
            WriteOptions {
                sync: options.sync,
                ..WriteOptions::default()
            },
        )?;
        debug!(path = %path.display(), keys = entries.len(), frames, "kv store opened");

        Ok(Self {
            path,
            options,
            writer,
            entries,
            frames,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw JSON value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Deserializes the value for `key`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, KvError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }

    /// True if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Sets `key` to `value`.
    pub fn put(&mut self, key: &str, value: Value) -> Result<(), KvError> {
        self.writer.put(key, &value)?;
        self.entries.insert(key.to_string(), value);
        self.frames += 1;
        self.maybe_compact()
    }

    /// Serializes `value` and stores it under `key`.
    pub fn put_as<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), KvError> {
        self.put(key, serde_json::to_value(value)?)
    }

    /// Removes `key`. Returns whether it was present; absent keys write nothing.
    pub fn remove(&mut self, key: &str) -> Result<bool, KvError> {
        if !self.entries.contains_key(key) {
            return Ok(false);
        }
        self.writer.remove(key)?;
        self.entries.remove(key);
        self.frames += 1;
        self.maybe_compact()?;
        Ok(true)
    }

    /// Keys in lexical order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Frames in the file that no longer contribute to the live state.
    pub fn stale_frames(&self) -> u64 {
        self.frames.saturating_sub(self.entries.len() as u64)
    }

    fn maybe_compact(&mut self) -> Result<(), KvError> {
        if self.stale_frames() >= self.options.compact_after {
            self.compact()?;
        }
        Ok(())
    }

    /// Rewrites the file with one put frame per live key.
    ///
    /// The new file is written beside the old one and renamed over it.
    pub fn compact(&mut self) -> Result<(), KvError> {
        let tmp = self.path.with_extension("kv.compact");
        {
            let mut out = KvWriter::open(
                &tmp,
                WriteOptions {
                    sync: true,
                    create: true,
                    append: false,
                },
            )?;
            for (key, value) in &self.entries {
                out.put(key, value)?;
            }
            out.finish()?;
        }
        fs::rename(&tmp, &self.path)?;

        self.writer = KvWriter::open(
            &self.path,
            WriteOptions {
                sync: self.options.sync,
                ..WriteOptions::default()
            },
        )?;
        debug!(
            path = %self.path.display(),
            dropped = self.stale_frames(),
            "kv store compacted"
        );
        self.frames = self.entries.len() as u64;
        Ok(())
    }
}
