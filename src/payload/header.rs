//! Serialization of the metadata block that precedes every hidden payload.
//!
//! The wire layout is fixed and byte-order sensitive: checksum (u16),
//! extension length (u8), extension bytes, optional height/width (i32 each,
//! only for image secrets), payload size (u32). All multi-byte fields are
//! little-endian regardless of platform.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::StegoError;
use crate::result::Result;

/// The recognized secret file kinds. Anything else is rejected before
/// embedding ever starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Text,
    Png,
    Jpeg,
    Jpg,
}

impl SecretKind {
    /// Classify a file extension, leading dot included.
    pub fn from_ext(ext: &str) -> Result<Self> {
        if ext.is_empty() {
            return Err(StegoError::InvalidExtension);
        }
        if ext.len() > u8::MAX as usize {
            return Err(StegoError::OversizedExtension);
        }
        match ext {
            ".txt" => Ok(Self::Text),
            ".png" => Ok(Self::Png),
            ".jpeg" => Ok(Self::Jpeg),
            ".jpg" => Ok(Self::Jpg),
            _ => Err(StegoError::InvalidExtension),
        }
    }

    pub fn as_ext(self) -> &'static str {
        match self {
            Self::Text => ".txt",
            Self::Png => ".png",
            Self::Jpeg => ".jpeg",
            Self::Jpg => ".jpg",
        }
    }

    /// Image secrets carry their pixel dimensions in the header so the
    /// extractor can rebuild the file from the raw pixel payload.
    pub fn is_image(self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// The self-describing metadata block. Built fresh per embedding, read back
/// exactly once per extraction, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadHeader {
    pub checksum: u16,
    pub kind: SecretKind,
    /// `(height, width)`, present iff the secret is an image kind.
    pub dims: Option<(i32, i32)>,
    pub payload_size: u32,
}

impl PayloadHeader {
    pub fn new(
        kind: SecretKind,
        dims: Option<(i32, i32)>,
        payload_size: u32,
        checksum: u16,
    ) -> Result<Self> {
        if payload_size == 0 {
            return Err(StegoError::InvalidDataSize);
        }
        // Dimensions travel iff the secret is an image: an image header
        // without them would be misread during the streaming parse.
        let dims = match (kind.is_image(), dims) {
            (true, Some(d)) => Some(d),
            (true, None) => return Err(StegoError::InvalidDataSize),
            (false, _) => None,
        };
        Ok(Self {
            checksum,
            kind,
            dims,
            payload_size,
        })
    }

    /// Serialized size in bytes.
    pub fn encoded_len(&self) -> usize {
        2 + 1 + self.kind.as_ext().len() + if self.dims.is_some() { 8 } else { 0 } + 4
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let ext = self.kind.as_ext().as_bytes();
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.write_u16::<LittleEndian>(self.checksum)?;
        buf.write_u8(ext.len() as u8)?;
        buf.extend_from_slice(ext);
        if let Some((height, width)) = self.dims {
            buf.write_i32::<LittleEndian>(height)?;
            buf.write_i32::<LittleEndian>(width)?;
        }
        buf.write_u32::<LittleEndian>(self.payload_size)?;
        Ok(buf)
    }

    /// Header bytes followed by the payload bytes: the exact sequence that
    /// gets embedded bit by bit.
    pub fn to_bitstream(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut buf = self.to_bytes()?;
        buf.reserve(payload.len());
        buf.extend_from_slice(payload);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_the_four_kinds() {
        assert_eq!(SecretKind::from_ext(".txt").unwrap(), SecretKind::Text);
        assert_eq!(SecretKind::from_ext(".png").unwrap(), SecretKind::Png);
        assert_eq!(SecretKind::from_ext(".jpeg").unwrap(), SecretKind::Jpeg);
        assert_eq!(SecretKind::from_ext(".jpg").unwrap(), SecretKind::Jpg);
    }

    #[test]
    fn rejects_unknown_and_empty_extensions() {
        assert!(matches!(
            SecretKind::from_ext(".bmp"),
            Err(StegoError::InvalidExtension)
        ));
        assert!(matches!(
            SecretKind::from_ext(""),
            Err(StegoError::InvalidExtension)
        ));
        let long = format!(".{}", "x".repeat(300));
        assert!(matches!(
            SecretKind::from_ext(&long),
            Err(StegoError::OversizedExtension)
        ));
    }

    #[test]
    fn text_header_layout() {
        let header = PayloadHeader::new(SecretKind::Text, None, 5, 13 * 100).unwrap();
        let bytes = header.to_bytes().unwrap();

        // 2 checksum + 1 ext_len + 4 ext + 4 size
        assert_eq!(bytes.len(), 11);
        assert_eq!(header.encoded_len(), 11);

        assert_eq!(&bytes[0..2], &1300u16.to_le_bytes());
        assert_eq!(bytes[2], 4);
        assert_eq!(&bytes[3..7], b".txt");
        assert_eq!(&bytes[7..11], &5u32.to_le_bytes());
    }

    #[test]
    fn image_header_carries_dimensions() {
        let header = PayloadHeader::new(SecretKind::Png, Some((480, 640)), 100, 13).unwrap();
        let bytes = header.to_bytes().unwrap();

        // 2 + 1 + 4 + 8 + 4
        assert_eq!(bytes.len(), 19);
        assert_eq!(&bytes[7..11], &480i32.to_le_bytes());
        assert_eq!(&bytes[11..15], &640i32.to_le_bytes());
    }

    #[test]
    fn text_header_drops_dimensions() {
        let header = PayloadHeader::new(SecretKind::Text, Some((1, 1)), 1, 13).unwrap();
        assert!(header.dims.is_none());
    }

    #[test]
    fn image_header_without_dimensions_is_rejected() {
        // Serializing such a header would omit the 8 dims bytes and the
        // streaming parser would misread the size field as dimensions.
        for kind in [SecretKind::Png, SecretKind::Jpeg, SecretKind::Jpg] {
            assert!(matches!(
                PayloadHeader::new(kind, None, 5, 13),
                Err(StegoError::InvalidDataSize)
            ));
        }
    }

    #[test]
    fn zero_payload_size_is_rejected() {
        assert!(matches!(
            PayloadHeader::new(SecretKind::Text, None, 0, 13),
            Err(StegoError::InvalidDataSize)
        ));
    }
}
