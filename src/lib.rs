//! # bitveil
//!
//! Hides a secret file inside a lossless image (PNG), a 16-bit PCM WAV or a
//! baseline JPEG, and recovers it bit-exactly later. Pixel and sample
//! carriers take one payload bit per byte in the least significant
//! position; JPEG carriers take one bit per eligible quantized DCT
//! coefficient, so the stego file survives as a valid JPEG without
//! recompression.
//!
//! Every embedded payload is prefixed with a small header carrying a
//! checksum tag, the secret's original extension, optional image
//! dimensions and the payload length, so extraction is self-describing
//! and tampered carriers are rejected early.
//!
//! ## Example
//!
//! ```rust
//! use bitveil::media::types::RgbaImage;
//!
//! let dir = tempfile::tempdir()?;
//! let carrier = dir.path().join("carrier.png");
//! let pixels: Vec<u8> = (0..64 * 64 * 4).map(|i| (i % 251) as u8).collect();
//! RgbaImage::from_raw(64, 64, pixels).unwrap().save(&carrier)?;
//!
//! let secret = dir.path().join("secret.txt");
//! std::fs::write(&secret, b"hidden in plain sight")?;
//!
//! let stego = dir.path().join("stego.png");
//! bitveil::commands::conceal(&secret, &carrier, &stego)?;
//!
//! let recovered = bitveil::commands::reveal(&stego, &dir.path().join("recovered"))?;
//! assert_eq!(std::fs::read(recovered)?, b"hidden in plain sight");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod commands;
pub mod error;
pub mod media;
pub mod payload;
pub mod result;
pub mod secret;

use std::path::{Path, PathBuf};

pub use error::StegoError;
pub use media::{Media, Persist};
pub use payload::{HeaderParser, PayloadHeader, SecretKind};
pub use result::Result;
pub use secret::Secret;

/// Fluent front door for hiding one secret in one carrier.
///
/// ```no_run
/// use std::path::Path;
/// use bitveil::Embedder;
///
/// Embedder::new()
///     .use_carrier(Path::new("image.png"))?
///     .use_secret_file(Path::new("secret.txt"))?
///     .save_as(Path::new("image.stego.png"))
///     .execute()?;
/// # Ok::<(), bitveil::StegoError>(())
/// ```
#[derive(Default)]
pub struct Embedder {
    carrier: Option<Media>,
    secret: Option<Secret>,
    target: Option<PathBuf>,
}

impl Embedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_carrier(mut self, f: &Path) -> Result<Self> {
        self.carrier = Some(Media::from_file(f)?);
        Ok(self)
    }

    pub fn use_secret_file(mut self, f: &Path) -> Result<Self> {
        self.secret = Some(Secret::from_file(f)?);
        Ok(self)
    }

    pub fn save_as(mut self, f: &Path) -> Self {
        self.target = Some(f.to_path_buf());
        self
    }

    pub fn execute(self) -> Result<()> {
        let mut carrier = self.carrier.ok_or(StegoError::CarrierNotSet)?;
        let secret = self.secret.ok_or(StegoError::SecretNotSet)?;
        let target = self.target.ok_or(StegoError::TargetNotSet)?;

        carrier.conceal(&secret)?;
        carrier.save_as(&target)
    }
}
