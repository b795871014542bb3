//! JSTEG coefficient codec for JPEG carriers.
//!
//! A coefficient whose value is 0 or 1 is ineligible: flipping its low bit
//! would move it across the rounding classes JPEG's entropy coding is most
//! sensitive to. Eligible coefficients carry one payload bit each in their
//! low-order bit. Embed and extract walk the identical scan: components in
//! frame order, blocks in stored order, the 64 positions of each block.

use std::io::Cursor;

use bitstream_io::{BitRead, BitReader, LittleEndian};

use crate::media::jpeg::CoefficientImage;
use crate::payload::capacity;
use crate::payload::header::PayloadHeader;
use crate::payload::parser::HeaderParser;
use crate::result::Result;

/// The JSTEG eligibility rule.
#[inline]
pub fn eligible(coefficient: i16) -> bool {
    coefficient != 0 && coefficient != 1
}

pub struct JstegCodec;

impl JstegCodec {
    /// Number of eligible coefficients, i.e. the bit capacity of this
    /// carrier. Only discoverable by scanning.
    pub fn capacity(coefficients: &CoefficientImage) -> usize {
        coefficients
            .components
            .iter()
            .flat_map(|c| c.blocks.iter())
            .flat_map(|b| b.iter())
            .filter(|&&c| eligible(c))
            .count()
    }

    /// Write the bitstream into the low bits of eligible coefficients.
    /// Capacity is established by a counting scan first, so a failed embed
    /// leaves every coefficient unmodified.
    pub fn embed(coefficients: &mut CoefficientImage, bitstream: &[u8]) -> Result<()> {
        let required_bits = bitstream.len() * 8;
        capacity::ensure_fits(required_bits, Self::capacity(coefficients))?;

        let mut bits = BitReader::endian(Cursor::new(bitstream), LittleEndian);
        let mut placed = 0usize;

        'scan: for component in &mut coefficients.components {
            for block in &mut component.blocks {
                for coefficient in block.iter_mut() {
                    if placed == required_bits {
                        break 'scan;
                    }
                    if !eligible(*coefficient) {
                        continue;
                    }
                    let bit = bits.read_bit()?;
                    *coefficient = (*coefficient & !1) | i16::from(bit);
                    placed += 1;
                }
            }
        }

        Ok(())
    }

    /// Run the identical eligible-coefficient scan, accumulating bits
    /// low-to-high into bytes and feeding each completed byte to the
    /// streaming header parser. The scan stops the instant the parser has
    /// its full payload, mid-block if need be.
    pub fn extract(coefficients: &CoefficientImage) -> Result<(PayloadHeader, Vec<u8>)> {
        let mut parser = HeaderParser::new();
        let mut acc = 0u8;
        let mut filled = 0u8;

        'scan: for component in &coefficients.components {
            for block in &component.blocks {
                for &coefficient in block.iter() {
                    if !eligible(coefficient) {
                        continue;
                    }
                    acc |= ((coefficient & 1) as u8) << filled;
                    filled += 1;
                    if filled == 8 {
                        parser.push(acc)?;
                        if parser.is_complete() {
                            break 'scan;
                        }
                        acc = 0;
                        filled = 0;
                    }
                }
            }
        }

        parser.finish()
    }
}
