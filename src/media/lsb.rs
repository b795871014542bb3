//! LSB bit-plane codec for flat byte buffers.
//!
//! Applies identically to RGBA channel bytes and to WAV sample bytes: one
//! payload bit goes into the low-order bit of each successive carrier byte,
//! least-significant payload bit first. Untouched trailing bytes stay
//! byte-identical.

use std::io::Cursor;

use bitstream_io::{BitRead, BitReader, LittleEndian};

use crate::payload::capacity;
use crate::payload::header::PayloadHeader;
use crate::payload::parser::HeaderParser;
use crate::result::Result;

pub struct LsbCodec;

impl LsbCodec {
    /// Write the bitstream into the low bits of `carrier`. Capacity is
    /// checked before the first byte is mutated, so a failed embed leaves
    /// the carrier untouched.
    pub fn embed(carrier: &mut [u8], bitstream: &[u8]) -> Result<()> {
        let required_bits = bitstream.len() * 8;
        capacity::ensure_fits(required_bits, carrier.len())?;

        let mut bits = BitReader::endian(Cursor::new(bitstream), LittleEndian);
        for unit in carrier.iter_mut().take(required_bits) {
            let bit = bits.read_bit()?;
            *unit = (*unit & (u8::MAX - 1)) | u8::from(bit);
        }
        Ok(())
    }

    /// Read low bits back out of `carrier`, reassembling bytes low-to-high
    /// and feeding them through the streaming header parser until the
    /// payload is complete.
    pub fn extract(carrier: &[u8]) -> Result<(PayloadHeader, Vec<u8>)> {
        let mut parser = HeaderParser::new();
        let mut acc = 0u8;
        let mut filled = 0u8;

        for unit in carrier {
            acc |= (unit & 1) << filled;
            filled += 1;
            if filled == 8 {
                parser.push(acc)?;
                if parser.is_complete() {
                    break;
                }
                acc = 0;
                filled = 0;
            }
        }

        parser.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StegoError;
    use crate::payload::checksum;
    use crate::payload::header::SecretKind;

    fn text_header(payload: &[u8]) -> PayloadHeader {
        let mut rng = fastrand::Rng::with_seed(21);
        PayloadHeader::new(
            SecretKind::Text,
            None,
            payload.len() as u32,
            checksum::generate_with(&mut rng),
        )
        .unwrap()
    }

    #[test]
    fn bits_land_least_significant_first() {
        // 0b0100_1011: bit order LSB-first is 1,1,0,1,0,0,1,0
        let mut carrier = vec![0xFEu8; 8];
        LsbCodec::embed(&mut carrier, &[0b0100_1011]).unwrap();

        let low_bits: Vec<u8> = carrier.iter().map(|b| b & 1).collect();
        assert_eq!(low_bits, vec![1, 1, 0, 1, 0, 0, 1, 0]);
        // High bits untouched.
        assert!(carrier.iter().all(|b| b & 0xFE == 0xFE));
    }

    #[test]
    fn hello_in_a_1000_byte_buffer() {
        let header = text_header(b"hello");
        let stream = header.to_bitstream(b"hello").unwrap();
        // 11 header bytes + 5 payload bytes = 128 bits.
        assert_eq!(stream.len(), 16);

        let mut carrier = vec![0u8; 1000];
        LsbCodec::embed(&mut carrier, &stream).unwrap();

        let (parsed, payload) = LsbCodec::extract(&carrier).unwrap();
        assert_eq!(parsed.kind, SecretKind::Text);
        assert_eq!(parsed.payload_size, 5);
        assert_eq!(payload, b"hello");
        // Bytes beyond the 128 embedded bits are untouched.
        assert!(carrier[128..].iter().all(|&b| b == 0));
    }

    #[test]
    fn capacity_boundary_is_exact() {
        let stream = vec![0xA5u8; 4];

        let mut exact = vec![0u8; 32];
        assert!(LsbCodec::embed(&mut exact, &stream).is_ok());

        let mut short = vec![7u8; 31];
        let err = LsbCodec::embed(&mut short, &stream).unwrap_err();
        assert!(matches!(
            err,
            StegoError::CapacityExceeded {
                required: 32,
                available: 31
            }
        ));
        // Failed embed leaves the carrier unmodified.
        assert!(short.iter().all(|&b| b == 7));
    }

    #[test]
    fn extraction_from_an_unembedded_buffer_fails() {
        // All-zero low bits decode to a zero checksum.
        let carrier = vec![0u8; 64];
        assert!(matches!(
            LsbCodec::extract(&carrier),
            Err(StegoError::ChecksumMismatch)
        ));
    }

    #[test]
    fn truncated_carrier_reports_incomplete_extraction() {
        let header = text_header(b"hello world");
        let stream = header.to_bitstream(b"hello world").unwrap();

        let mut carrier = vec![0u8; stream.len() * 8];
        LsbCodec::embed(&mut carrier, &stream).unwrap();

        // Drop the last payload byte's worth of carrier bytes.
        let err = LsbCodec::extract(&carrier[..carrier.len() - 8]).unwrap_err();
        assert!(matches!(err, StegoError::IncompleteExtraction));
    }

    #[test]
    fn tampered_checksum_fails_before_payload() {
        let header = text_header(b"attack at dawn");
        let stream = header.to_bitstream(b"attack at dawn").unwrap();

        let mut carrier = vec![0u8; 2000];
        LsbCodec::embed(&mut carrier, &stream).unwrap();
        // Flip the first checksum bit.
        carrier[0] ^= 1;

        assert!(matches!(
            LsbCodec::extract(&carrier),
            Err(StegoError::ChecksumMismatch)
        ));
    }
}
