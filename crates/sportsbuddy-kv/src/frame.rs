use crate::errors::KvError;

/// File magic bytes: `b"SBKV"`.
pub const MAGIC: &[u8; 4] = b"SBKV";

/// Current file format version: `0x0001`.
pub const VERSION: u16 = 0x0001;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Maximum payload size: 16 MiB.
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Record frame kind: put `{key, value}`.
pub const FRAME_KIND_PUT: u8 = 0x01;

/// Record frame kind: remove `{key}`.
pub const FRAME_KIND_REMOVE: u8 = 0x02;

/// The file header every kv file starts with.
///
/// There is exactly one valid header per format version, so it is handled as
/// bytes: `SBKV`, version (u16 LE), then ten zero bytes (flags and reserved).
pub fn file_header() -> [u8; HEADER_SIZE] {
    let mut bytes = [0u8; HEADER_SIZE];
    bytes[0..4].copy_from_slice(MAGIC);
    bytes[4..6].copy_from_slice(&VERSION.to_le_bytes());
    bytes
}

/// Checks that `bytes` starts with a valid file header.
pub fn check_header(bytes: &[u8]) -> Result<(), KvError> {
    let Some(header) = bytes.get(..HEADER_SIZE) else {
        return Err(KvError::InvalidHeader(format!(
            "header too short: {} bytes",
            bytes.len()
        )));
    };
    if &header[0..4] != MAGIC {
        return Err(KvError::InvalidHeader(format!(
            "invalid magic: {:?}, expected {:?}",
            &header[0..4],
            MAGIC
        )));
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != VERSION {
        return Err(KvError::InvalidHeader(format!(
            "unsupported version: 0x{:04x}, expected 0x{:04x}",
            version, VERSION
        )));
    }
    if header[6..].iter().any(|b| *b != 0) {
        return Err(KvError::InvalidHeader(
            "non-zero flags or reserved bytes".to_string(),
        ));
    }
    Ok(())
}

/// True if `bytes` is a non-empty proper prefix of [`file_header`]: the
/// first header write was cut short.
pub fn is_torn_header(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.len() < HEADER_SIZE && file_header().starts_with(bytes)
}

/// Record frame kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Sets a key to a JSON value.
    Put,
    /// Removes a key.
    Remove,
    /// Unknown kind; skipped by readers.
    Unknown(u8),
}

impl FrameKind {
    /// Creates a FrameKind from a byte value.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            FRAME_KIND_PUT => FrameKind::Put,
            FRAME_KIND_REMOVE => FrameKind::Remove,
            _ => FrameKind::Unknown(byte),
        }
    }

    /// Returns the byte value for this kind.
    pub fn to_byte(self) -> u8 {
        match self {
            FrameKind::Put => FRAME_KIND_PUT,
            FrameKind::Remove => FRAME_KIND_REMOVE,
            FrameKind::Unknown(b) => b,
        }
    }
}

/// Record frame header (8 bytes): kind, 3 reserved bytes, payload length (LE).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFrame {
    /// Frame kind.
    pub kind: FrameKind,
    /// Payload length in bytes.
    pub len: u32,
}

impl RecordFrame {
    /// Creates a frame header, rejecting oversized payloads.
    pub fn new(kind: FrameKind, len: usize) -> Result<Self, KvError> {
        if len > MAX_PAYLOAD_SIZE as usize {
            return Err(KvError::PayloadTooLarge {
                size: len as u64,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self {
            kind,
            len: len as u32,
        })
    }

    /// Serializes the frame header to bytes.
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut bytes = [0u8; FRAME_HEADER_SIZE];
        bytes[0] = self.kind.to_byte();
        bytes[4..8].copy_from_slice(&self.len.to_le_bytes());
        bytes
    }

    /// Deserializes a frame header found at `offset`.
    pub fn from_bytes(bytes: &[u8], offset: u64) -> Result<Self, KvError> {
        if bytes.len() < FRAME_HEADER_SIZE {
            return Err(KvError::InvalidFrame {
                offset,
                reason: format!("frame header too short: {} bytes", bytes.len()),
            });
        }

        if bytes[1..4] != [0u8; 3] {
            return Err(KvError::InvalidFrame {
                offset,
                reason: "non-zero reserved bytes".to_string(),
            });
        }
        let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if len > MAX_PAYLOAD_SIZE {
            return Err(KvError::InvalidFrame {
                offset,
                reason: format!("payload size {} exceeds maximum {}", len, MAX_PAYLOAD_SIZE),
            });
        }

        Ok(Self {
            kind: FrameKind::from_byte(bytes[0]),
            len,
        })
    }
}
