use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions that abort a generation run before any output is written.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("logo file not found: {}", .0.display())]
    MissingLogo(PathBuf),

    #[error("failed to decode logo {}", .path.display())]
    LogoDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to decode QR image {}", .path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode QR code for link: {link}")]
    QrEncode {
        link: String,
        #[source]
        source: qrcode::types::QrError,
    },
}
