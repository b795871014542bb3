use std::ffi::OsString;
use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};
use log::debug;

use crate::error::StegoError;
use crate::payload::header::SecretKind;
use crate::result::Result;

/// The data to hide, already reduced to the form that travels through a
/// carrier: a kind tag, optional image dimensions and the raw payload.
///
/// Text secrets carry their file bytes verbatim. Image secrets are decoded
/// to raw RGBA pixels, with the dimensions recorded so the pixel buffer can
/// be reassembled on extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub kind: SecretKind,
    pub dims: Option<(i32, i32)>,
    pub payload: Vec<u8>,
}

impl Secret {
    pub fn from_file(f: &Path) -> Result<Self> {
        let ext = f
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .ok_or(StegoError::InvalidExtension)?;
        let kind = SecretKind::from_ext(&ext)?;

        match kind {
            SecretKind::Text => {
                let payload =
                    std::fs::read(f).map_err(|source| StegoError::ReadError { source })?;
                if payload.is_empty() {
                    return Err(StegoError::InvalidDataSize);
                }

                Ok(Self {
                    kind,
                    dims: None,
                    payload,
                })
            }
            SecretKind::Png | SecretKind::Jpeg | SecretKind::Jpg => {
                let img = image::open(f)
                    .map_err(|_e| StegoError::InvalidImageMedia)?
                    .to_rgba8();
                let dims = (img.height() as i32, img.width() as i32);
                debug!("secret image {dims:?}, {} payload bytes", img.len());

                Ok(Self {
                    kind,
                    dims: Some(dims),
                    payload: img.into_raw(),
                })
            }
        }
    }

    /// Write the secret next to `base`, appending the extension its kind
    /// dictates. Returns the path actually written.
    pub fn write_to(&self, base: &Path) -> Result<PathBuf> {
        let mut file = OsString::from(base.as_os_str());
        file.push(self.kind.as_ext());
        let file = PathBuf::from(file);

        match self.kind {
            SecretKind::Text => {
                std::fs::write(&file, &self.payload)
                    .map_err(|source| StegoError::WriteError { source })?;
            }
            SecretKind::Png | SecretKind::Jpeg | SecretKind::Jpg => {
                let (height, width) = match self.dims {
                    Some((h, w)) if h > 0 && w > 0 => (h as u32, w as u32),
                    _ => return Err(StegoError::InvalidDataSize),
                };
                let img = RgbaImage::from_raw(width, height, self.payload.clone())
                    .ok_or(StegoError::InvalidDataSize)?;

                match self.kind {
                    SecretKind::Png => img.save(&file).map_err(|_e| StegoError::ImageEncodingError)?,
                    // JPEG has no alpha channel; flatten before encoding.
                    _ => DynamicImage::ImageRgba8(img)
                        .to_rgb8()
                        .save_with_format(&file, image::ImageFormat::Jpeg)
                        .map_err(|_e| StegoError::ImageEncodingError)?,
                }
            }
        }

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_secret_keeps_file_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, b"plain bytes\n").unwrap();

        let secret = Secret::from_file(&path).unwrap();
        assert_eq!(secret.kind, SecretKind::Text);
        assert_eq!(secret.dims, None);
        assert_eq!(secret.payload, b"plain bytes\n");
    }

    #[test]
    fn empty_text_secret_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, b"").unwrap();

        assert!(matches!(
            Secret::from_file(&path),
            Err(StegoError::InvalidDataSize)
        ));
    }

    #[test]
    fn image_secret_records_dimensions_and_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        let img = RgbaImage::from_fn(6, 4, |x, y| image::Rgba([x as u8, y as u8, 7, 255]));
        img.save(&path).unwrap();

        let secret = Secret::from_file(&path).unwrap();
        assert_eq!(secret.kind, SecretKind::Png);
        assert_eq!(secret.dims, Some((4, 6)));
        assert_eq!(secret.payload.len(), 6 * 4 * 4);
    }

    #[test]
    fn write_to_appends_the_kind_extension() {
        let dir = tempfile::tempdir().unwrap();
        let secret = Secret {
            kind: SecretKind::Text,
            dims: None,
            payload: b"out".to_vec(),
        };

        let written = secret.write_to(&dir.path().join("recovered")).unwrap();
        assert!(written.to_string_lossy().ends_with("recovered.txt"));
        assert_eq!(std::fs::read(written).unwrap(), b"out");
    }

    #[test]
    fn png_secret_roundtrips_through_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::from_fn(5, 3, |x, y| image::Rgba([x as u8 * 40, y as u8 * 80, 1, 255]));
        let secret = Secret {
            kind: SecretKind::Png,
            dims: Some((3, 5)),
            payload: img.clone().into_raw(),
        };

        let written = secret.write_to(&dir.path().join("recovered")).unwrap();
        let reloaded = image::open(written).unwrap().to_rgba8();
        assert_eq!(reloaded, img);
    }

    #[test]
    fn image_secret_without_dimensions_cannot_be_written() {
        let dir = tempfile::tempdir().unwrap();
        let secret = Secret {
            kind: SecretKind::Png,
            dims: None,
            payload: vec![0; 16],
        };

        assert!(matches!(
            secret.write_to(&dir.path().join("bad")),
            Err(StegoError::InvalidDataSize)
        ));
    }
}
