//! JPEG marker classification (ITU T.81 Table B.1).
//!
//! Only the markers the transcoder has to act on get their own variant;
//! everything else that carries a length field is preserved verbatim as
//! `Other` so the writer can copy it through untouched.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    /// Start of Image.
    Soi,
    /// End of Image.
    Eoi,
    /// Start of Frame; the parameter is the SOF type (0 = baseline,
    /// 2 = progressive, ...).
    Sof(u8),
    /// Define Huffman Table.
    Dht,
    /// Define Quantization Table.
    Dqt,
    /// Define Restart Interval.
    Dri,
    /// Start of Scan.
    Sos,
    /// Restart marker 0-7.
    Rst(u8),
    /// Application segment 0-15.
    App(u8),
    /// Comment.
    Com,
    /// Any other marker, kept by its raw byte.
    Other(u8),
}

impl Marker {
    /// Classify a marker byte. `None` for 0x00 (a stuffed byte) and 0xFF
    /// (a fill byte), which are not markers.
    pub fn from_u8(byte: u8) -> Option<Marker> {
        match byte {
            0x00 | 0xFF => None,
            0xC4 => Some(Marker::Dht),
            0xC0..=0xCF if byte != 0xC8 && byte != 0xCC => Some(Marker::Sof(byte - 0xC0)),
            0xD0..=0xD7 => Some(Marker::Rst(byte - 0xD0)),
            0xD8 => Some(Marker::Soi),
            0xD9 => Some(Marker::Eoi),
            0xDA => Some(Marker::Sos),
            0xDB => Some(Marker::Dqt),
            0xDD => Some(Marker::Dri),
            0xE0..=0xEF => Some(Marker::App(byte - 0xE0)),
            0xFE => Some(Marker::Com),
            other => Some(Marker::Other(other)),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Marker::Soi => 0xD8,
            Marker::Eoi => 0xD9,
            Marker::Sof(n) => 0xC0 + n,
            Marker::Dht => 0xC4,
            Marker::Dqt => 0xDB,
            Marker::Dri => 0xDD,
            Marker::Sos => 0xDA,
            Marker::Rst(n) => 0xD0 + n,
            Marker::App(n) => 0xE0 + n,
            Marker::Com => 0xFE,
            Marker::Other(b) => b,
        }
    }

    /// Whether a two-byte big-endian length field follows the marker.
    pub fn has_length(self) -> bool {
        !matches!(
            self,
            Marker::Soi | Marker::Eoi | Marker::Rst(_) | Marker::Other(0x01)
        )
    }
}
