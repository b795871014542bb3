//! Carrier media: the three data shapes secrets can be embedded into, and
//! the codecs that write payload bits into them.

pub mod jpeg;
pub mod jsteg;
pub mod lsb;
pub mod types;

use std::path::Path;

use crate::result::Result;

pub use jsteg::JstegCodec;
pub use lsb::LsbCodec;
pub use types::Media;

/// Saving a mutated carrier back to disk.
pub trait Persist {
    fn save_as(&mut self, file: &Path) -> Result<()>;
}
