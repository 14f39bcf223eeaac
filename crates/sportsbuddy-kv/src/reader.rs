//! Key/value file reader.

use crate::errors::KvError;
use crate::frame::{check_header, FrameKind, RecordFrame, FRAME_HEADER_SIZE, HEADER_SIZE};
use crate::record::KvRecord;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read mode for handling a torn tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Truncated frames are errors.
    Strict,
    /// Truncation is treated as end-of-file.
    Permissive,
}

/// Sequential reader over the records of a key/value file.
///
/// [`position`](Self::position) always points just past the last complete
/// frame, so after a permissive read it is the length the file can be
/// truncated to.
pub struct KvReader {
    input: BufReader<File>,
    mode: ReadMode,
    position: u64,
    len: u64,
}

impl KvReader {
    /// Opens a file and validates its header.
    pub fn open<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<Self, KvError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let mut input = BufReader::new(file);

        let mut header_bytes = [0u8; HEADER_SIZE];
        input.read_exact(&mut header_bytes)?;
        check_header(&header_bytes)?;

        Ok(Self {
            input,
            mode,
            position: HEADER_SIZE as u64,
            len,
        })
    }

    /// Offset just past the last complete frame read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// File length observed at open.
    pub fn file_len(&self) -> u64 {
        self.len
    }

    fn truncated(&self) -> Result<Option<(FrameKind, Vec<u8>)>, KvError> {
        match self.mode {
            ReadMode::Permissive => Ok(None),
            ReadMode::Strict => Err(KvError::TruncatedFrame {
                offset: self.position,
            }),
        }
    }

    /// Reads the next raw frame. `Ok(None)` at end-of-file.
    pub fn read_frame(&mut self) -> Result<Option<(FrameKind, Vec<u8>)>, KvError> {
        if self.position >= self.len {
            return Ok(None);
        }

        let mut frame_header_bytes = [0u8; FRAME_HEADER_SIZE];
        match self.input.read_exact(&mut frame_header_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return self.truncated(),
            Err(e) => return Err(e.into()),
        }
        let frame = RecordFrame::from_bytes(&frame_header_bytes, self.position)?;

        let mut payload = vec![0u8; frame.len as usize];
        match self.input.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return self.truncated(),
            Err(e) => return Err(e.into()),
        }

        self.position += (FRAME_HEADER_SIZE + payload.len()) as u64;
        Ok(Some((frame.kind, payload)))
    }

    /// Reads the next record, skipping unknown frame kinds.
    pub fn read_record(&mut self) -> Result<Option<KvRecord>, KvError> {
        loop {
            match self.read_frame()? {
                None => return Ok(None),
                Some((kind, payload)) => {
                    if let Some(record) = KvRecord::decode(kind, &payload)? {
                        return Ok(Some(record));
                    }
                }
            }
        }
    }
}
