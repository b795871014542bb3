//! Baseline scan transcoding: entropy-coded scan data to DCT coefficients
//! and back, with no dequantization and no IDCT in between.
//!
//! Coefficients are stored per component, blocks in MCU scan order, each
//! block 64 values in zigzag order. An unmodified decode/encode pass
//! reproduces the original scan byte for byte; modified coefficients are
//! re-encoded with the original Huffman tables so every other compression
//! parameter survives.

use log::debug;

use super::entropy::{
    coefficient_category, HuffmanDecodeTable, HuffmanEncodeTable, ScanReader, ScanWriter,
};
use super::segments::{FrameInfo, JpegFile};
use crate::error::StegoError;
use crate::result::Result;

fn invalid(reason: impl Into<String>) -> StegoError {
    StegoError::InvalidJpegMedia {
        reason: reason.into(),
    }
}

/// All 8x8 coefficient blocks of one color component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentBlocks {
    pub blocks: Vec<[i16; 64]>,
}

/// Decoded coefficients for a whole image, grouped by component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientImage {
    pub components: Vec<ComponentBlocks>,
    pub width: u16,
    pub height: u16,
}

impl CoefficientImage {
    pub fn total_blocks(&self) -> usize {
        self.components.iter().map(|c| c.blocks.len()).sum()
    }
}

/// MCU geometry derived from the frame's sampling factors: MCU count and
/// blocks per MCU for each component.
fn mcu_geometry(frame: &FrameInfo) -> (usize, Vec<usize>) {
    let h_max = frame
        .components
        .iter()
        .map(|c| c.h_sampling as usize)
        .max()
        .unwrap_or(1);
    let v_max = frame
        .components
        .iter()
        .map(|c| c.v_sampling as usize)
        .max()
        .unwrap_or(1);

    let mcu_cols = (frame.width as usize).div_ceil(h_max * 8);
    let mcu_rows = (frame.height as usize).div_ceil(v_max * 8);

    let blocks_per_mcu = frame
        .components
        .iter()
        .map(|c| (c.h_sampling as usize) * (c.v_sampling as usize))
        .collect();

    (mcu_cols * mcu_rows, blocks_per_mcu)
}

fn scan_frame(jpeg: &JpegFile) -> Result<&FrameInfo> {
    let frame = jpeg
        .frame
        .as_ref()
        .ok_or_else(|| invalid("missing frame info (SOF)"))?;
    if frame.is_progressive() {
        return Err(invalid("progressive JPEGs are not supported"));
    }
    if jpeg.restart_interval != 0 {
        return Err(invalid("restart intervals are not supported"));
    }
    Ok(frame)
}

/// Decode the entropy-coded scan into per-component coefficient blocks.
pub fn decode_scan(jpeg: &JpegFile) -> Result<CoefficientImage> {
    let frame = scan_frame(jpeg)?;

    let mut dc_tables: [Option<HuffmanDecodeTable>; 4] = [None, None, None, None];
    let mut ac_tables: [Option<HuffmanDecodeTable>; 4] = [None, None, None, None];
    for (i, table) in jpeg.dc_tables.iter().enumerate() {
        if let Some(t) = table {
            dc_tables[i] = Some(HuffmanDecodeTable::from_table(t)?);
        }
    }
    for (i, table) in jpeg.ac_tables.iter().enumerate() {
        if let Some(t) = table {
            ac_tables[i] = Some(HuffmanDecodeTable::from_table(t)?);
        }
    }

    let (total_mcus, blocks_per_mcu) = mcu_geometry(frame);

    let mut components: Vec<ComponentBlocks> = blocks_per_mcu
        .iter()
        .map(|&per_mcu| ComponentBlocks {
            blocks: Vec::with_capacity(per_mcu * total_mcus),
        })
        .collect();

    let mut reader = ScanReader::new(&jpeg.scan_data);
    let mut dc_predictors = vec![0i16; frame.components.len()];

    for _ in 0..total_mcus {
        for (comp_idx, component) in frame.components.iter().enumerate() {
            let dc_table = dc_tables[component.dc_table_id as usize]
                .as_ref()
                .ok_or_else(|| {
                    invalid(format!("missing DC Huffman table {}", component.dc_table_id))
                })?;
            let ac_table = ac_tables[component.ac_table_id as usize]
                .as_ref()
                .ok_or_else(|| {
                    invalid(format!("missing AC Huffman table {}", component.ac_table_id))
                })?;

            for _ in 0..blocks_per_mcu[comp_idx] {
                let mut block = [0i16; 64];
                decode_block(
                    &mut reader,
                    &mut block,
                    dc_table,
                    ac_table,
                    &mut dc_predictors[comp_idx],
                )?;
                components[comp_idx].blocks.push(block);
            }
        }
    }

    Ok(CoefficientImage {
        components,
        width: frame.width,
        height: frame.height,
    })
}

/// Re-encode coefficient blocks into scan data using the original tables.
pub fn encode_scan(coefficients: &CoefficientImage, jpeg: &JpegFile) -> Result<Vec<u8>> {
    let frame = scan_frame(jpeg)?;

    let mut dc_tables: [Option<HuffmanEncodeTable>; 4] = [None, None, None, None];
    let mut ac_tables: [Option<HuffmanEncodeTable>; 4] = [None, None, None, None];
    for (i, table) in jpeg.dc_tables.iter().enumerate() {
        if let Some(t) = table {
            dc_tables[i] = Some(HuffmanEncodeTable::from_table(t)?);
        }
    }
    for (i, table) in jpeg.ac_tables.iter().enumerate() {
        if let Some(t) = table {
            ac_tables[i] = Some(HuffmanEncodeTable::from_table(t)?);
        }
    }

    let (total_mcus, blocks_per_mcu) = mcu_geometry(frame);
    if coefficients.components.len() != frame.components.len() {
        return Err(invalid("coefficient component count does not match frame"));
    }

    let mut writer = ScanWriter::with_capacity(jpeg.scan_data.len());
    let mut dc_predictors = vec![0i16; frame.components.len()];
    let mut cursors = vec![0usize; frame.components.len()];

    for _ in 0..total_mcus {
        for (comp_idx, component) in frame.components.iter().enumerate() {
            let dc_table = dc_tables[component.dc_table_id as usize]
                .as_ref()
                .ok_or_else(|| {
                    invalid(format!("missing DC Huffman table {}", component.dc_table_id))
                })?;
            let ac_table = ac_tables[component.ac_table_id as usize]
                .as_ref()
                .ok_or_else(|| {
                    invalid(format!("missing AC Huffman table {}", component.ac_table_id))
                })?;

            for _ in 0..blocks_per_mcu[comp_idx] {
                let block = coefficients.components[comp_idx]
                    .blocks
                    .get(cursors[comp_idx])
                    .ok_or_else(|| invalid("coefficient blocks exhausted mid-scan"))?;
                encode_block(
                    &mut writer,
                    block,
                    dc_table,
                    ac_table,
                    &mut dc_predictors[comp_idx],
                )?;
                cursors[comp_idx] += 1;
            }
        }
    }

    let data = writer.into_bytes();
    debug!(
        "re-encoded scan: {} blocks, {} bytes (was {})",
        coefficients.total_blocks(),
        data.len(),
        jpeg.scan_data.len()
    );
    Ok(data)
}

/// Decode one 8x8 block: a DC delta against the component predictor, then
/// run-length coded AC coefficients.
fn decode_block(
    reader: &mut ScanReader,
    block: &mut [i16; 64],
    dc_table: &HuffmanDecodeTable,
    ac_table: &HuffmanDecodeTable,
    dc_predictor: &mut i16,
) -> Result<()> {
    let dc_size = reader.decode_symbol(dc_table)?;
    if dc_size > 11 {
        return Err(invalid(format!("invalid DC coefficient size: {dc_size}")));
    }
    let dc_diff = reader.receive_extend(dc_size)?;
    *dc_predictor = dc_predictor.wrapping_add(dc_diff);
    block[0] = *dc_predictor;

    let mut k = 1;
    while k < 64 {
        let symbol = reader.decode_symbol(ac_table)?;
        let run = symbol >> 4;
        let size = symbol & 0x0F;

        if size == 0 {
            if run == 0 {
                // EOB: the rest of the block is zero.
                break;
            } else if run == 0x0F {
                // ZRL: sixteen zeros.
                k += 16;
            } else {
                return Err(invalid(format!("invalid AC run/size: {symbol:02X}")));
            }
        } else {
            k += run as usize;
            if k >= 64 {
                return Err(invalid("AC coefficient index out of bounds"));
            }
            block[k] = reader.receive_extend(size)?;
            k += 1;
        }
    }

    Ok(())
}

/// Encode one 8x8 block, the inverse of `decode_block`.
fn encode_block(
    writer: &mut ScanWriter,
    block: &[i16; 64],
    dc_table: &HuffmanEncodeTable,
    ac_table: &HuffmanEncodeTable,
    dc_predictor: &mut i16,
) -> Result<()> {
    let dc_value = block[0];
    let dc_diff = dc_value.wrapping_sub(*dc_predictor);
    *dc_predictor = dc_value;

    let (dc_size, dc_bits) = coefficient_category(dc_diff);
    writer.write_symbol(dc_size, dc_table)?;
    if dc_size > 0 {
        writer.write_bits(dc_bits, dc_size);
    }

    let mut zero_run = 0u8;
    for &coefficient in &block[1..] {
        if coefficient == 0 {
            zero_run += 1;
            continue;
        }

        while zero_run >= 16 {
            writer.write_symbol(0xF0, ac_table)?; // ZRL
            zero_run -= 16;
        }

        let (size, bits) = coefficient_category(coefficient);
        writer.write_symbol((zero_run << 4) | size, ac_table)?;
        writer.write_bits(bits, size);
        zero_run = 0;
    }

    if zero_run > 0 {
        writer.write_symbol(0x00, ac_table)?; // EOB
    }

    Ok(())
}
