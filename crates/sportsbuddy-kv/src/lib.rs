//! Append-only key/value file for the Sports Buddy local backend.
//!
//! This crate provides:
//! - A framed file format (`SBKV` header, put/remove record frames)
//! - Reader/writer APIs with strict and permissive truncation handling
//! - [`KvStore`], an in-memory map replayed from the file with last-write-wins
//!   semantics, torn-tail recovery, and compaction
//!
//! ```rust
//! use sportsbuddy_kv::{KvStore, StoreOptions};
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("state.kv");
//! {
//!     let mut store = KvStore::open(&path, StoreOptions::default())?;
//!     store.put("categories", json!(["Football", "Cricket"]))?;
//! }
//! let store = KvStore::open(&path, StoreOptions::default())?;
//! assert_eq!(store.get("categories"), Some(&json!(["Football", "Cricket"])));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]

/// Error types for key/value file operations.
pub mod errors;
/// Header and frame structure.
pub mod frame;
/// Reader implementation.
pub mod reader;
/// Put/remove record payloads.
pub mod record;
/// Replayed key/value store.
pub mod store;
/// Writer implementation.
pub mod writer;

pub use errors::KvError;
pub use frame::{check_header, file_header, is_torn_header, FrameKind, RecordFrame};
pub use reader::{KvReader, ReadMode};
pub use record::KvRecord;
pub use store::{KvStore, StoreOptions};
pub use writer::{KvWriter, WriteOptions};
