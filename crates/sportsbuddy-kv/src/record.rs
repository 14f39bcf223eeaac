//! Record payloads carried by put/remove frames.

use crate::errors::KvError;
use crate::frame::FrameKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single mutation of the key/value file.
#[derive(Debug, Clone, PartialEq)]
pub enum KvRecord {
    /// Sets `key` to `value`.
    Put {
        /// Key.
        key: String,
        /// JSON value.
        value: Value,
    },
    /// Removes `key`.
    Remove {
        /// Key.
        key: String,
    },
}

#[derive(Serialize, Deserialize)]
struct PutPayload<'a> {
    key: std::borrow::Cow<'a, str>,
    value: Value,
}

#[derive(Serialize, Deserialize)]
struct RemovePayload<'a> {
    key: std::borrow::Cow<'a, str>,
}

impl KvRecord {
    /// The key this record touches.
    pub fn key(&self) -> &str {
        match self {
            KvRecord::Put { key, .. } | KvRecord::Remove { key } => key,
        }
    }

    /// Encodes the record as a frame kind plus UTF-8 JSON payload.
    pub fn encode(&self) -> Result<(FrameKind, Vec<u8>), KvError> {
        match self {
            KvRecord::Put { key, value } => {
                let payload = PutPayload {
                    key: key.as_str().into(),
                    value: value.clone(),
                };
                Ok((FrameKind::Put, serde_json::to_vec(&payload)?))
            }
            KvRecord::Remove { key } => {
                let payload = RemovePayload {
                    key: key.as_str().into(),
                };
                Ok((FrameKind::Remove, serde_json::to_vec(&payload)?))
            }
        }
    }

    /// Decodes a frame payload. Unknown kinds yield `None`.
    pub fn decode(kind: FrameKind, payload: &[u8]) -> Result<Option<Self>, KvError> {
        match kind {
            FrameKind::Put => {
                let p: PutPayload = serde_json::from_str(std::str::from_utf8(payload)?)?;
                Ok(Some(KvRecord::Put {
                    key: p.key.into_owned(),
                    value: p.value,
                }))
            }
            FrameKind::Remove => {
                let p: RemovePayload = serde_json::from_str(std::str::from_utf8(payload)?)?;
                Ok(Some(KvRecord::Remove {
                    key: p.key.into_owned(),
                }))
            }
            FrameKind::Unknown(_) => Ok(None),
        }
    }
}
