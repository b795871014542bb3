//! The steganographic payload protocol: a self-describing header prefixed to
//! the raw secret bytes, plus the integrity tag and capacity accounting that
//! guard it.

pub mod capacity;
pub mod checksum;
pub mod header;
pub mod parser;

pub use header::{PayloadHeader, SecretKind};
pub use parser::HeaderParser;
