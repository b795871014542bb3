//! Huffman entropy coding for JPEG scan data.
//!
//! Decoding uses an 8-bit lookup table with a linear fallback for longer
//! codes; encoding uses a symbol-indexed map. Both are derived from the
//! same DHT tables so an unmodified decode/encode pass reproduces the scan
//! byte for byte.

use super::segments::HuffmanTable;
use crate::error::StegoError;
use crate::result::Result;

fn invalid(reason: impl Into<String>) -> StegoError {
    StegoError::InvalidJpegMedia {
        reason: reason.into(),
    }
}

const LUT_BITS: u8 = 8;
const LUT_SIZE: usize = 1 << LUT_BITS;

/// Decode-side Huffman table.
#[derive(Debug, Clone)]
pub struct HuffmanDecodeTable {
    /// `(symbol, code_length)` for codes of at most 8 bits; `(0, 0)` where
    /// the prefix belongs to a longer code.
    lut: Box<[(u8, u8); LUT_SIZE]>,
    codes: Vec<u16>,
    code_sizes: Vec<u8>,
    values: Vec<u8>,
}

impl HuffmanDecodeTable {
    pub fn from_table(table: &HuffmanTable) -> Result<Self> {
        let (code_sizes, codes) = derive_huffman_codes(&table.code_lengths)?;
        if table.values.len() < codes.len() {
            return Err(invalid("Huffman table has fewer symbols than codes"));
        }

        let mut lut = Box::new([(0u8, 0u8); LUT_SIZE]);
        for (idx, (&code, &len)) in codes.iter().zip(code_sizes.iter()).enumerate() {
            if len <= LUT_BITS {
                let shift = LUT_BITS - len;
                let base = (code as usize) << shift;
                for entry in lut.iter_mut().skip(base).take(1 << shift) {
                    *entry = (table.values[idx], len);
                }
            }
        }

        Ok(Self {
            lut,
            codes,
            code_sizes,
            values: table.values.clone(),
        })
    }
}

/// Encode-side Huffman table: symbol to `(code, length)`.
#[derive(Debug, Clone)]
pub struct HuffmanEncodeTable {
    encode_map: [Option<(u16, u8)>; 256],
}

impl HuffmanEncodeTable {
    pub fn from_table(table: &HuffmanTable) -> Result<Self> {
        let (code_sizes, codes) = derive_huffman_codes(&table.code_lengths)?;
        if table.values.len() < codes.len() {
            return Err(invalid("Huffman table has fewer symbols than codes"));
        }

        let mut encode_map = [None; 256];
        for (idx, (&code, &len)) in codes.iter().zip(code_sizes.iter()).enumerate() {
            encode_map[table.values[idx] as usize] = Some((code, len));
        }

        Ok(Self { encode_map })
    }

    #[inline]
    pub fn encode(&self, symbol: u8) -> Option<(u16, u8)> {
        self.encode_map[symbol as usize]
    }
}

/// Canonical code assignment per ITU T.81 Figures C.1 and C.2: sizes in
/// table order, then consecutive codes within each size.
fn derive_huffman_codes(code_lengths: &[u8; 16]) -> Result<(Vec<u8>, Vec<u16>)> {
    let total: usize = code_lengths.iter().map(|&n| n as usize).sum();
    if total > 256 {
        return Err(invalid("Huffman table has more than 256 symbols"));
    }

    let mut sizes = Vec::with_capacity(total);
    for (len, &count) in code_lengths.iter().enumerate() {
        for _ in 0..count {
            sizes.push((len + 1) as u8);
        }
    }

    let mut codes = Vec::with_capacity(total);
    let mut code: u32 = 0;
    let mut current_size = sizes.first().copied().unwrap_or(0);

    for &size in &sizes {
        while current_size < size {
            code <<= 1;
            current_size += 1;
        }
        if code >= (1u32 << size) {
            return Err(invalid("invalid Huffman code (overflow)"));
        }
        codes.push(code as u16);
        code += 1;
    }

    Ok((sizes, codes))
}

/// Bit-level reader over entropy-coded scan data. De-stuffs 0xFF 0x00,
/// skips restart markers, and treats any other marker as end of data.
pub struct ScanReader<'a> {
    data: &'a [u8],
    pos: usize,
    bits: u32,
    num_bits: u8,
}

impl<'a> ScanReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bits: 0,
            num_bits: 0,
        }
    }

    #[inline]
    fn peek_bits(&mut self, count: u8) -> Result<u16> {
        while self.num_bits < count {
            let before = self.num_bits;
            self.fill_bits();
            if self.num_bits == before {
                return Err(invalid(format!(
                    "unexpected end of scan: need {count} bits, have {}",
                    self.num_bits
                )));
            }
        }
        let shift = self.num_bits - count;
        let mask = (1u32 << count) - 1;
        Ok(((self.bits >> shift) & mask) as u16)
    }

    #[inline]
    fn consume_bits(&mut self, count: u8) {
        debug_assert!(count <= self.num_bits);
        self.num_bits -= count;
    }

    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u16> {
        let value = self.peek_bits(count)?;
        self.consume_bits(count);
        Ok(value)
    }

    fn fill_bits(&mut self) {
        while self.num_bits <= 24 && self.pos < self.data.len() {
            let byte = self.data[self.pos];
            self.pos += 1;

            if byte != 0xFF {
                self.bits = (self.bits << 8) | u32::from(byte);
                self.num_bits += 8;
                continue;
            }

            match self.data.get(self.pos) {
                Some(0x00) => {
                    // Stuffed byte.
                    self.pos += 1;
                    self.bits = (self.bits << 8) | 0xFF;
                    self.num_bits += 8;
                }
                Some(0xD0..=0xD7) => {
                    // Restart marker; predictor reset is the caller's job.
                    self.pos += 1;
                }
                _ => {
                    // A real marker ends the scan.
                    self.pos = self.data.len();
                    return;
                }
            }
        }
    }

    /// Decode one Huffman symbol.
    pub fn decode_symbol(&mut self, table: &HuffmanDecodeTable) -> Result<u8> {
        self.fill_bits();

        if self.num_bits >= LUT_BITS {
            let peek = self.peek_bits(LUT_BITS)?;
            let (symbol, len) = table.lut[peek as usize];
            if len > 0 {
                self.consume_bits(len);
                return Ok(symbol);
            }

            // Codes longer than the LUT covers.
            for (idx, (&code, &code_len)) in
                table.codes.iter().zip(table.code_sizes.iter()).enumerate()
            {
                if code_len > LUT_BITS && self.peek_bits(code_len)? == code {
                    self.consume_bits(code_len);
                    return Ok(table.values[idx]);
                }
            }
        } else if self.num_bits > 0 {
            // Tail of the stream: pad with 1 bits, which by the JPEG
            // padding convention cannot complete a longer valid code.
            let available = self.num_bits;
            let peek = self.peek_bits(available)?;
            let pad = LUT_BITS - available;
            let padded = ((peek as usize) << pad) | ((1usize << pad) - 1);
            let (symbol, len) = table.lut[padded];
            if len > 0 && len <= available {
                self.consume_bits(len);
                return Ok(symbol);
            }

            for (idx, (&code, &code_len)) in
                table.codes.iter().zip(table.code_sizes.iter()).enumerate()
            {
                if code_len <= available && self.peek_bits(code_len)? == code {
                    self.consume_bits(code_len);
                    return Ok(table.values[idx]);
                }
            }
        }

        Err(invalid(format!(
            "invalid Huffman code (bits available: {})",
            self.num_bits
        )))
    }

    /// Read `size` magnitude bits and sign-extend them (ITU T.81 Figure
    /// F.12): a leading 0 bit marks a negative value.
    pub fn receive_extend(&mut self, size: u8) -> Result<i16> {
        if size == 0 {
            return Ok(0);
        }
        let value = self.read_bits(size)? as i16;
        let threshold = 1 << (size - 1);
        if value < threshold {
            Ok(value + (-1 << size) + 1)
        } else {
            Ok(value)
        }
    }
}

/// Bit-level writer producing entropy-coded scan data with byte stuffing
/// and final 1-bit padding.
pub struct ScanWriter {
    data: Vec<u8>,
    bits: u32,
    num_bits: u8,
}

impl ScanWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            bits: 0,
            num_bits: 0,
        }
    }

    /// Append `count` bits of `value`, most significant first.
    #[inline]
    pub fn write_bits(&mut self, value: u16, count: u8) {
        debug_assert!(count <= 16);

        self.bits = (self.bits << count) | u32::from(value);
        self.num_bits += count;

        while self.num_bits >= 8 {
            self.num_bits -= 8;
            let byte = (self.bits >> self.num_bits) as u8;
            self.push_byte(byte);
        }
        self.bits &= (1u32 << self.num_bits) - 1;
    }

    #[inline]
    pub fn write_symbol(&mut self, symbol: u8, table: &HuffmanEncodeTable) -> Result<()> {
        let (code, len) = table
            .encode(symbol)
            .ok_or_else(|| invalid(format!("symbol {symbol} not in Huffman table")))?;
        self.write_bits(code, len);
        Ok(())
    }

    fn push_byte(&mut self, byte: u8) {
        self.data.push(byte);
        if byte == 0xFF {
            self.data.push(0x00);
        }
    }

    /// Pad the final partial byte with 1 bits and return the scan.
    pub fn into_bytes(mut self) -> Vec<u8> {
        if self.num_bits > 0 {
            let padding = 8 - self.num_bits;
            let byte = (self.bits << padding) | ((1u32 << padding) - 1);
            self.push_byte(byte as u8);
        }
        self.data
    }
}

/// Category coding for a coefficient: `(size, bits)` where `size` is the
/// magnitude category and `bits` the extra bits written after the Huffman
/// symbol. Negative values use the one's-complement form; this inverts
/// `receive_extend`.
#[inline]
pub fn coefficient_category(value: i16) -> (u8, u16) {
    if value == 0 {
        return (0, 0);
    }

    let magnitude = value.unsigned_abs();
    let size = (16 - magnitude.leading_zeros()) as u8;
    let bits = if value < 0 {
        ((1u16 << size) - 1) - magnitude
    } else {
        magnitude
    };
    (size, bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dc_luminance() -> HuffmanTable {
        HuffmanTable {
            code_lengths: [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
            values: vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }

    #[test]
    fn canonical_code_derivation() {
        let code_lengths = [0u8, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let (sizes, codes) = derive_huffman_codes(&code_lengths).unwrap();
        assert_eq!(sizes, vec![2, 3]);
        assert_eq!(codes, vec![0b00, 0b010]);
    }

    #[test]
    fn standard_dc_table_has_12_codes() {
        let (sizes, codes) = derive_huffman_codes(&dc_luminance().code_lengths).unwrap();
        assert_eq!(sizes.len(), 12);
        assert_eq!(codes.len(), 12);
        assert_eq!(sizes[0], 2);
    }

    #[test]
    fn encode_and_decode_tables_agree() {
        let table = dc_luminance();
        let encoder = HuffmanEncodeTable::from_table(&table).unwrap();
        let decoder = HuffmanDecodeTable::from_table(&table).unwrap();

        for &symbol in &table.values {
            let (code, len) = encoder.encode(symbol).unwrap();
            assert!(len <= 8);
            let padded = (code as usize) << (8 - len);
            assert_eq!(decoder.lut[padded], (symbol, len));
        }
        assert!(encoder.encode(255).is_none());
    }

    #[test]
    fn reader_handles_plain_bits() {
        let data = [0b1011_0100, 0b1100_1010];
        let mut reader = ScanReader::new(&data);
        assert_eq!(reader.read_bits(4).unwrap(), 0b1011);
        assert_eq!(reader.read_bits(4).unwrap(), 0b0100);
        assert_eq!(reader.read_bits(8).unwrap(), 0b1100_1010);
    }

    #[test]
    fn reader_destuffs_ff00() {
        let data = [0xFF, 0x00, 0x12];
        let mut reader = ScanReader::new(&data);
        assert_eq!(reader.read_bits(8).unwrap(), 0xFF);
        assert_eq!(reader.read_bits(8).unwrap(), 0x12);
    }

    #[test]
    fn receive_extend_sign_cases() {
        // Bits MSB-first: 1, 0, 01, 11
        let data = [0b1001_1100, 0b0000_0000];
        let mut reader = ScanReader::new(&data);
        assert_eq!(reader.receive_extend(1).unwrap(), 1);
        assert_eq!(reader.receive_extend(1).unwrap(), -1);
        assert_eq!(reader.receive_extend(2).unwrap(), -2);
        assert_eq!(reader.receive_extend(2).unwrap(), 3);
        assert_eq!(reader.receive_extend(0).unwrap(), 0);
    }

    #[test]
    fn writer_accumulates_and_pads() {
        let mut writer = ScanWriter::with_capacity(4);
        writer.write_bits(0b1011, 4);
        writer.write_bits(0b0100, 4);
        writer.write_bits(0b10110, 5);
        assert_eq!(writer.into_bytes(), vec![0b1011_0100, 0b1011_0111]);
    }

    #[test]
    fn writer_stuffs_ff() {
        let mut writer = ScanWriter::with_capacity(4);
        writer.write_bits(0xFF, 8);
        writer.write_bits(0x12, 8);
        assert_eq!(writer.into_bytes(), vec![0xFF, 0x00, 0x12]);
    }

    #[test]
    fn category_coding_inverts_receive_extend() {
        for value in -255i16..=255 {
            let (size, bits) = coefficient_category(value);
            if value == 0 {
                assert_eq!(size, 0);
                continue;
            }
            let threshold = 1i16 << (size - 1);
            let decoded = if (bits as i16) < threshold {
                (bits as i16) + ((-1i16) << size) + 1
            } else {
                bits as i16
            };
            assert_eq!(decoded, value);
        }
    }
}
