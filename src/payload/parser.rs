//! Streaming header parser.
//!
//! The header is self-describing: its total length is not known until the
//! extension length and extension have been read, and the total embedded
//! length is not known until the payload size field arrives. Extraction from
//! coefficient scans therefore feeds reconstructed bytes into this parser one
//! at a time and stops the moment it reports completion. Flat-buffer (LSB)
//! extraction drives the exact same parser in a single pass.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::StegoError;
use crate::payload::checksum;
use crate::payload::header::{PayloadHeader, SecretKind};
use crate::result::Result;

/// Parse stages in order. Each stage consumes a fixed or header-determined
/// number of bytes before advancing; there are no backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AwaitingChecksum,
    AwaitingExtLen,
    AwaitingExt { len: usize },
    AwaitingDims,
    AwaitingSize,
    AwaitingPayload { total: usize },
    Done,
    Aborted,
}

#[derive(Debug)]
pub struct HeaderParser {
    stage: Stage,
    pending: Vec<u8>,
    checksum: u16,
    kind: Option<SecretKind>,
    dims: Option<(i32, i32)>,
    payload: Vec<u8>,
    /// The error that aborted the parse, re-reported on later calls.
    failure: Option<StegoError>,
}

/// Re-create the remembered terminal error. Every abort source in `advance`
/// is value-like; anything else falls back to the generic incomplete report.
fn repeat_failure(failure: &Option<StegoError>) -> StegoError {
    match failure {
        Some(StegoError::ChecksumMismatch) => StegoError::ChecksumMismatch,
        Some(StegoError::InvalidExtension) => StegoError::InvalidExtension,
        Some(StegoError::OversizedExtension) => StegoError::OversizedExtension,
        Some(StegoError::InvalidExtensionLength) => StegoError::InvalidExtensionLength,
        Some(StegoError::InvalidDataSize) => StegoError::InvalidDataSize,
        Some(StegoError::InvalidTextData(e)) => StegoError::InvalidTextData(e.clone()),
        _ => StegoError::IncompleteExtraction,
    }
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderParser {
    pub fn new() -> Self {
        Self {
            stage: Stage::AwaitingChecksum,
            pending: Vec::new(),
            checksum: 0,
            kind: None,
            dims: None,
            payload: Vec::new(),
            failure: None,
        }
    }

    /// Feed the next reconstructed byte. Fails terminally on a bad checksum,
    /// unrecognized extension, zero extension length or zero payload size;
    /// a failed parser stays aborted and keeps reporting the error that
    /// aborted it.
    pub fn push(&mut self, byte: u8) -> Result<()> {
        match self.stage {
            Stage::Done => Ok(()),
            Stage::Aborted => Err(repeat_failure(&self.failure)),
            Stage::AwaitingPayload { total } => {
                self.payload.push(byte);
                if self.payload.len() == total {
                    self.stage = Stage::Done;
                }
                Ok(())
            }
            _ => {
                self.pending.push(byte);
                match self.advance() {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        self.stage = Stage::Aborted;
                        self.failure = Some(e);
                        Err(repeat_failure(&self.failure))
                    }
                }
            }
        }
    }

    fn advance(&mut self) -> Result<()> {
        match self.stage {
            Stage::AwaitingChecksum if self.pending.len() == 2 => {
                let tag = Cursor::new(&self.pending).read_u16::<LittleEndian>()?;
                if tag == 0 || !checksum::verify(tag) {
                    return Err(StegoError::ChecksumMismatch);
                }
                self.checksum = tag;
                self.pending.clear();
                self.stage = Stage::AwaitingExtLen;
            }
            Stage::AwaitingExtLen if self.pending.len() == 1 => {
                let len = self.pending[0];
                if len == 0 {
                    return Err(StegoError::InvalidExtensionLength);
                }
                self.pending.clear();
                self.stage = Stage::AwaitingExt {
                    len: len as usize,
                };
            }
            Stage::AwaitingExt { len } if self.pending.len() == len => {
                let ext = String::from_utf8(std::mem::take(&mut self.pending))?;
                let kind = SecretKind::from_ext(&ext)?;
                self.kind = Some(kind);
                self.stage = if kind.is_image() {
                    Stage::AwaitingDims
                } else {
                    Stage::AwaitingSize
                };
            }
            Stage::AwaitingDims if self.pending.len() == 8 => {
                let mut cursor = Cursor::new(&self.pending);
                let height = cursor.read_i32::<LittleEndian>()?;
                let width = cursor.read_i32::<LittleEndian>()?;
                self.dims = Some((height, width));
                self.pending.clear();
                self.stage = Stage::AwaitingSize;
            }
            Stage::AwaitingSize if self.pending.len() == 4 => {
                let size = Cursor::new(&self.pending).read_u32::<LittleEndian>()?;
                if size == 0 {
                    return Err(StegoError::InvalidDataSize);
                }
                self.pending.clear();
                self.payload = Vec::with_capacity(size as usize);
                self.stage = Stage::AwaitingPayload {
                    total: size as usize,
                };
            }
            _ => {}
        }
        Ok(())
    }

    /// True once the full payload has been consumed; extraction scans stop
    /// the instant this turns true.
    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn finish(self) -> Result<(PayloadHeader, Vec<u8>)> {
        if self.stage == Stage::Aborted {
            return Err(repeat_failure(&self.failure));
        }
        if self.stage != Stage::Done {
            return Err(StegoError::IncompleteExtraction);
        }
        let kind = self.kind.ok_or(StegoError::IncompleteExtraction)?;
        let header = PayloadHeader {
            checksum: self.checksum,
            kind,
            dims: self.dims,
            payload_size: self.payload.len() as u32,
        };
        Ok((header, self.payload))
    }
}
