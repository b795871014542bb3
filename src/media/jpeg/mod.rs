//! In-tree JPEG coefficient transcoder.
//!
//! The carrier's native compression is never undone: the scan is Huffman
//! decoded to quantized DCT coefficients, modified, and Huffman re-encoded
//! with the original tables, so the output JPEG preserves every
//! compression parameter except the coefficient values themselves.

mod entropy;
mod marker;
mod scan;
mod segments;
mod writer;

pub use scan::{decode_scan, encode_scan, CoefficientImage, ComponentBlocks};
pub use segments::{parse_jpeg, JpegFile};
pub use writer::write_jpeg;
