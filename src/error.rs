use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StegoError {
    /// Represents an unsupported carrier media. For example, a movie file is not supported
    #[error("Media format is not supported")]
    UnsupportedMedia,

    /// Represents an invalid carrier audio media. For example, a broken WAV file
    #[error("Audio media is invalid")]
    InvalidAudioMedia,

    /// Represents an invalid carrier image media. For example, a broken PNG file
    #[error("Image media is invalid")]
    InvalidImageMedia,

    /// Represents a malformed or unsupported JPEG carrier
    #[error("JPEG media is invalid: {reason}")]
    InvalidJpegMedia { reason: String },

    /// Represents a carrier that exposes neither a flat byte buffer nor coefficient blocks
    #[error("Carrier provides no embeddable data shape")]
    UnsupportedCarrierShape,

    /// Represents a secret extension that is not one of the recognized kinds
    #[error("Extension is empty or not recognized")]
    InvalidExtension,

    /// Represents a secret extension longer than the header field can carry
    #[error("Extension exceeds 255 bytes")]
    OversizedExtension,

    /// Represents a zero extension length read back from a carrier
    #[error("Extension length field is zero")]
    InvalidExtensionLength,

    /// Represents a zero payload size, on embedding or on extraction
    #[error("Payload size is zero")]
    InvalidDataSize,

    /// Represents an integrity tag that fails verification on extraction
    #[error("Checksum verification failed")]
    ChecksumMismatch,

    /// Represents a bitstream too large for the carrier
    #[error("Carrier capacity exceeded: {required} bits required, {available} available")]
    CapacityExceeded { required: usize, available: usize },

    /// Represents a carrier that ran out of data before the full payload was recovered
    #[error("Carrier exhausted before the payload was fully extracted")]
    IncompleteExtraction,

    /// Represents invalid UTF-8 text data found inside an embedded header
    #[error("Invalid text data found inside a header")]
    InvalidTextData(#[from] FromUtf8Error),

    /// Represents a failure to read from input.
    #[error("Read error")]
    ReadError { source: std::io::Error },

    /// Represents a failure to write the target file.
    #[error("Write error")]
    WriteError { source: std::io::Error },

    /// Represents a failure when encoding an image file.
    #[error("Image encoding error")]
    ImageEncodingError,

    /// Represents a failure when encoding an audio file.
    #[error("Audio encoding error")]
    AudioEncodingError,

    /// Represents a failure when creating an audio file.
    #[error("Audio creation error")]
    AudioCreationError,

    /// Represents all other cases of `std::io::Error`.
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("No carrier media set")]
    CarrierNotSet,

    #[error("No target file set")]
    TargetNotSet,

    #[error("No secret file set")]
    SecretNotSet,
}
