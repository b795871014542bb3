//! JPEG structure parsing.
//!
//! Splits a JPEG file into the pieces coefficient transcoding needs: the
//! Huffman tables, the frame layout, the raw entropy-coded scan, and every
//! other segment verbatim so the writer can reproduce the file with nothing
//! but the scan replaced.

use super::marker::Marker;
use crate::error::StegoError;
use crate::result::Result;

fn invalid(reason: impl Into<String>) -> StegoError {
    StegoError::InvalidJpegMedia {
        reason: reason.into(),
    }
}

/// A Huffman table as defined by a DHT segment: the count of codes per
/// length 1-16, and the symbol values in code order.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    pub code_lengths: [u8; 16],
    pub values: Vec<u8>,
}

/// One color component of the frame.
#[derive(Debug, Clone)]
pub struct Component {
    pub id: u8,
    pub h_sampling: u8,
    pub v_sampling: u8,
    /// DC/AC Huffman table assignments, filled in from the SOS header.
    pub dc_table_id: u8,
    pub ac_table_id: u8,
}

/// Frame layout from the SOF segment.
#[derive(Debug, Clone)]
pub struct FrameInfo {
    pub sof_type: u8,
    pub height: u16,
    pub width: u16,
    pub components: Vec<Component>,
}

impl FrameInfo {
    pub fn is_progressive(&self) -> bool {
        self.sof_type == 2
    }
}

/// A preserved segment: marker plus raw body, excluding the length field.
#[derive(Debug, Clone)]
pub struct Segment {
    pub marker: Marker,
    pub data: Vec<u8>,
}

/// Everything extracted from one JPEG file.
#[derive(Debug, Clone, Default)]
pub struct JpegFile {
    /// All segments before the scan, in file order.
    pub segments: Vec<Segment>,
    pub dc_tables: [Option<HuffmanTable>; 4],
    pub ac_tables: [Option<HuffmanTable>; 4],
    pub frame: Option<FrameInfo>,
    pub restart_interval: u16,
    /// Entropy-coded scan data, byte stuffing intact.
    pub scan_data: Vec<u8>,
}

pub fn parse_jpeg(data: &[u8]) -> Result<JpegFile> {
    if data.len() < 2 || data[0..2] != [0xFF, 0xD8] {
        return Err(invalid("not a JPEG file (missing SOI marker)"));
    }

    let mut jpeg = JpegFile::default();
    let mut pos = 2usize;

    loop {
        let (marker, after_marker) = next_marker(data, pos)?;
        pos = after_marker;

        match marker {
            Marker::Eoi => break,

            Marker::Sos => {
                let (header, after) = read_segment(data, pos)?;
                parse_sos(&header, &mut jpeg)?;
                jpeg.scan_data = read_scan(data, after);
                break;
            }

            Marker::Dht => {
                let (body, after) = read_segment(data, pos)?;
                pos = after;
                parse_dht(&body, &mut jpeg)?;
                jpeg.segments.push(Segment { marker, data: body });
            }

            Marker::Sof(n) => {
                let (body, after) = read_segment(data, pos)?;
                pos = after;
                jpeg.frame = Some(parse_sof(n, &body)?);
                jpeg.segments.push(Segment { marker, data: body });
            }

            Marker::Dri => {
                let (body, after) = read_segment(data, pos)?;
                pos = after;
                if body.len() >= 2 {
                    jpeg.restart_interval = u16::from_be_bytes([body[0], body[1]]);
                }
                jpeg.segments.push(Segment { marker, data: body });
            }

            m if m.has_length() => {
                let (body, after) = read_segment(data, pos)?;
                pos = after;
                jpeg.segments.push(Segment { marker, data: body });
            }

            // Length-less markers should not appear before the scan.
            _ => {}
        }
    }

    Ok(jpeg)
}

/// Scan forward to the next marker: skip to 0xFF, skip the fill-byte run,
/// classify the byte after it.
fn next_marker(data: &[u8], mut pos: usize) -> Result<(Marker, usize)> {
    while pos < data.len() && data[pos] != 0xFF {
        pos += 1;
    }
    while pos < data.len() && data[pos] == 0xFF {
        pos += 1;
    }
    let byte = *data
        .get(pos)
        .ok_or_else(|| invalid("unexpected end of file while scanning for a marker"))?;
    let marker =
        Marker::from_u8(byte).ok_or_else(|| invalid(format!("invalid marker byte 0x{byte:02X}")))?;
    Ok((marker, pos + 1))
}

/// Read one length-prefixed segment body. The two length bytes are
/// big-endian and count themselves.
fn read_segment(data: &[u8], pos: usize) -> Result<(Vec<u8>, usize)> {
    if pos + 2 > data.len() {
        return Err(invalid("truncated segment length"));
    }
    let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
    if length < 2 {
        return Err(invalid("segment length too small"));
    }
    let start = pos + 2;
    let end = start + length - 2;
    if end > data.len() {
        return Err(invalid("segment extends past end of file"));
    }
    Ok((data[start..end].to_vec(), end))
}

/// Copy entropy-coded scan data up to the next real marker. Stuffed bytes
/// (0xFF 0x00) and restart markers stay in; de-stuffing happens at bit
/// reading time.
fn read_scan(data: &[u8], mut pos: usize) -> Vec<u8> {
    let mut scan = Vec::new();
    while pos < data.len() {
        let byte = data[pos];
        if byte != 0xFF {
            scan.push(byte);
            pos += 1;
            continue;
        }
        match data.get(pos + 1) {
            Some(0x00) => {
                scan.push(0xFF);
                scan.push(0x00);
                pos += 2;
            }
            Some(&rst @ 0xD0..=0xD7) => {
                scan.push(0xFF);
                scan.push(rst);
                pos += 2;
            }
            Some(0xFF) => {
                // Fill byte before a marker.
                pos += 1;
            }
            _ => break,
        }
    }
    scan
}

fn parse_dht(body: &[u8], jpeg: &mut JpegFile) -> Result<()> {
    let mut pos = 0;

    while pos < body.len() {
        let tc_th = body[pos];
        let class = (tc_th >> 4) & 0x0F;
        let id = tc_th & 0x0F;
        pos += 1;

        if class > 1 || id > 3 {
            return Err(invalid(format!(
                "invalid Huffman table: class={class}, id={id}"
            )));
        }

        if pos + 16 > body.len() {
            return Err(invalid("DHT segment too short for code lengths"));
        }
        let mut code_lengths = [0u8; 16];
        code_lengths.copy_from_slice(&body[pos..pos + 16]);
        pos += 16;

        let total_codes: usize = code_lengths.iter().map(|&n| n as usize).sum();
        if pos + total_codes > body.len() {
            return Err(invalid("DHT segment too short for symbol values"));
        }
        let values = body[pos..pos + total_codes].to_vec();
        pos += total_codes;

        let table = HuffmanTable {
            code_lengths,
            values,
        };
        if class == 0 {
            jpeg.dc_tables[id as usize] = Some(table);
        } else {
            jpeg.ac_tables[id as usize] = Some(table);
        }
    }

    Ok(())
}

fn parse_sof(sof_type: u8, body: &[u8]) -> Result<FrameInfo> {
    if body.len() < 6 {
        return Err(invalid("SOF segment too short"));
    }

    let height = u16::from_be_bytes([body[1], body[2]]);
    let width = u16::from_be_bytes([body[3], body[4]]);
    let num_components = body[5] as usize;

    if body.len() < 6 + num_components * 3 {
        return Err(invalid("SOF segment too short for components"));
    }

    let mut components = Vec::with_capacity(num_components);
    for i in 0..num_components {
        let offset = 6 + i * 3;
        let sampling = body[offset + 1];
        let h_sampling = (sampling >> 4) & 0x0F;
        let v_sampling = sampling & 0x0F;
        // T.81 A.1.1 limits sampling factors to 1-4; 0 would make the MCU
        // grid degenerate.
        if !(1..=4).contains(&h_sampling) || !(1..=4).contains(&v_sampling) {
            return Err(invalid(format!(
                "invalid sampling factors 0x{sampling:02X} for component {}",
                body[offset]
            )));
        }
        components.push(Component {
            id: body[offset],
            h_sampling,
            v_sampling,
            dc_table_id: 0,
            ac_table_id: 0,
        });
    }

    Ok(FrameInfo {
        sof_type,
        height,
        width,
        components,
    })
}

/// Pick the DC/AC table assignments out of the SOS header and attach them
/// to the frame components.
fn parse_sos(header: &[u8], jpeg: &mut JpegFile) -> Result<()> {
    if header.is_empty() {
        return Err(invalid("SOS header empty"));
    }

    let num_components = header[0] as usize;
    if header.len() < 1 + num_components * 2 + 3 {
        return Err(invalid("SOS header too short"));
    }

    let frame = jpeg
        .frame
        .as_mut()
        .ok_or_else(|| invalid("SOS before SOF"))?;

    for i in 0..num_components {
        let offset = 1 + i * 2;
        let component_id = header[offset];
        let table_ids = header[offset + 1];
        for comp in frame.components.iter_mut() {
            if comp.id == component_id {
                comp.dc_table_id = (table_ids >> 4) & 0x0F;
                comp.ac_table_id = table_ids & 0x0F;
                break;
            }
        }
    }

    Ok(())
}
