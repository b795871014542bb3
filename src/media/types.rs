use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

pub use hound::{SampleFormat, WavSpec, WavWriter};
pub use image::RgbaImage;
use log::error;

use crate::error::StegoError;
use crate::media::jpeg::{self, CoefficientImage, JpegFile};
use crate::media::jsteg::JstegCodec;
use crate::media::lsb::LsbCodec;
use crate::payload::checksum;
use crate::payload::header::PayloadHeader;
use crate::result::Result;
use crate::secret::Secret;

use super::Persist;

pub type WavAudio = (WavSpec, Vec<i16>);

/// A JPEG carrier: the parsed container plus its decoded coefficients.
#[derive(Debug, Clone)]
pub struct JpegCarrier {
    pub file: JpegFile,
    pub coefficients: CoefficientImage,
}

/// A carrier media for steganography.
#[derive(Debug)]
pub enum Media {
    Image(RgbaImage),
    Audio(WavAudio),
    Jpeg(Box<JpegCarrier>),
}

impl Media {
    pub fn from_image(img: RgbaImage) -> Self {
        Self::Image(img)
    }

    pub fn from_audio(audio: WavAudio) -> Self {
        Self::Audio(audio)
    }

    pub fn from_file(f: &Path) -> Result<Self> {
        let ext = f
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or(StegoError::UnsupportedMedia)?;

        match ext.as_str() {
            "png" => Ok(Self::Image(
                image::open(f)
                    .map_err(|_e| StegoError::InvalidImageMedia)?
                    .to_rgba8(),
            )),
            "wav" => {
                let mut reader =
                    hound::WavReader::open(f).map_err(|_e| StegoError::InvalidAudioMedia)?;
                let spec = reader.spec();
                if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
                    return Err(StegoError::InvalidAudioMedia);
                }
                let samples: std::result::Result<Vec<i16>, _> = reader.samples().collect();
                let samples = samples.map_err(|_e| StegoError::InvalidAudioMedia)?;

                Ok(Self::Audio((spec, samples)))
            }
            "jpg" | "jpeg" => {
                let data = std::fs::read(f).map_err(|source| StegoError::ReadError { source })?;
                let file = jpeg::parse_jpeg(&data)?;
                let coefficients = jpeg::decode_scan(&file)?;
                Ok(Self::Jpeg(Box::new(JpegCarrier { file, coefficients })))
            }
            // A text file is a secret kind, but it has no embeddable shape.
            "txt" => Err(StegoError::UnsupportedCarrierShape),
            _ => Err(StegoError::UnsupportedMedia),
        }
    }

    /// Embed a secret: build the header, assemble the bitstream and hand it
    /// to the codec matching this carrier's shape. A failed embed leaves
    /// the carrier unmodified.
    pub fn conceal(&mut self, secret: &Secret) -> Result<&mut Self> {
        let payload_size =
            u32::try_from(secret.payload.len()).map_err(|_| StegoError::InvalidDataSize)?;
        let header =
            PayloadHeader::new(secret.kind, secret.dims, payload_size, checksum::generate())?;
        let bitstream = header.to_bitstream(&secret.payload)?;

        match self {
            Media::Image(img) => LsbCodec::embed(&mut **img, &bitstream)?,
            Media::Audio((_spec, samples)) => {
                let mut bytes = samples_to_bytes(samples);
                LsbCodec::embed(&mut bytes, &bitstream)?;
                *samples = bytes_to_samples(&bytes);
            }
            Media::Jpeg(carrier) => JstegCodec::embed(&mut carrier.coefficients, &bitstream)?,
        }

        Ok(self)
    }

    /// Extract whatever secret this carrier holds.
    pub fn reveal(&self) -> Result<Secret> {
        let (header, payload) = match self {
            Media::Image(img) => LsbCodec::extract(img.as_raw())?,
            Media::Audio((_spec, samples)) => LsbCodec::extract(&samples_to_bytes(samples))?,
            Media::Jpeg(carrier) => JstegCodec::extract(&carrier.coefficients)?,
        };

        Ok(Secret {
            kind: header.kind,
            dims: header.dims,
            payload,
        })
    }
}

/// The WAV data region as flat bytes: each 16-bit sample contributes its
/// two bytes, little-endian. RIFF headers never enter this buffer.
fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

fn bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

impl Persist for Media {
    fn save_as(&mut self, file: &Path) -> Result<()> {
        let f = File::create(file).map_err(|e| {
            error!("Error creating file {file:?}: {e}");
            StegoError::WriteError { source: e }
        })?;
        self.save_to_writer(f)
    }
}

impl Media {
    pub fn save_to_writer<W: Write + Seek>(&mut self, mut writer: W) -> Result<()> {
        match self {
            Media::Image(img) => img
                .write_to(&mut writer, image::ImageFormat::Png)
                .map_err(|e| {
                    error!("Error saving image: {e}");
                    StegoError::ImageEncodingError
                }),
            Media::Audio((spec, samples)) => {
                let mut wav_writer =
                    WavWriter::new(writer, *spec).map_err(|_| StegoError::AudioCreationError)?;
                for s in samples.iter() {
                    wav_writer
                        .write_sample(*s)
                        .map_err(|_| StegoError::AudioEncodingError)?;
                }
                wav_writer
                    .finalize()
                    .map_err(|_| StegoError::AudioEncodingError)?;

                Ok(())
            }
            Media::Jpeg(carrier) => {
                let scan = jpeg::encode_scan(&carrier.coefficients, &carrier.file)?;
                let bytes = jpeg::write_jpeg(&carrier.file, &scan);
                writer.write_all(&bytes).map_err(|e| {
                    error!("Error saving JPEG: {e}");
                    StegoError::WriteError { source: e }
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::header::SecretKind;

    fn noise_image(width: u32, height: u32) -> RgbaImage {
        let mut rng = fastrand::Rng::with_seed(5);
        RgbaImage::from_fn(width, height, |_, _| {
            image::Rgba([rng.u8(..), rng.u8(..), rng.u8(..), 255])
        })
    }

    fn audio(samples: usize) -> WavAudio {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let samples = (0..samples).map(|i| ((i * 37) % 1000) as i16 - 500).collect();
        (spec, samples)
    }

    fn text_secret(data: &[u8]) -> Secret {
        Secret {
            kind: SecretKind::Text,
            dims: None,
            payload: data.to_vec(),
        }
    }

    #[test]
    fn image_carrier_roundtrip() {
        let mut media = Media::from_image(noise_image(32, 32));
        media.conceal(&text_secret(b"in the pixels")).unwrap();

        let secret = media.reveal().unwrap();
        assert_eq!(secret.kind, SecretKind::Text);
        assert_eq!(secret.payload, b"in the pixels");
    }

    #[test]
    fn audio_carrier_roundtrip() {
        let mut media = Media::from_audio(audio(4000));
        media.conceal(&text_secret(b"in the samples")).unwrap();

        let secret = media.reveal().unwrap();
        assert_eq!(secret.payload, b"in the samples");
    }

    #[test]
    fn audio_sample_byte_conversion_is_lossless() {
        let (_, samples) = audio(100);
        assert_eq!(bytes_to_samples(&samples_to_bytes(&samples)), samples);
    }

    #[test]
    fn tiny_image_carrier_runs_out_of_capacity() {
        // 5x5 RGBA = 100 embeddable bytes, far short of header + payload.
        let mut media = Media::from_image(noise_image(5, 5));
        let err = media.conceal(&text_secret(b"does not fit")).unwrap_err();
        assert!(matches!(err, StegoError::CapacityExceeded { .. }));
    }
}
