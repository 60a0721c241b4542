//! Error kinds raised at the asset boundary
//!
//! Dimension math and resampling never fail (bad input there is a caller
//! bug and panics). Everything that touches bytes, files or the encoder
//! reports one of these, and the batch pipeline turns each into a logged
//! per-item failure.

use std::path::PathBuf;

/// Errors raised while reading, decoding, encoding or writing one asset
#[derive(Debug, thiserror::Error)]
pub enum QuadError {
    #[error("failed to decode image: {message}")]
    Decode { message: String },

    #[error("failed to encode image as {extension}: {message}")]
    Encode { extension: String, message: String },

    #[error("unsupported output format: {extension}")]
    UnsupportedExtension { extension: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not allocate a {width}x{height} destination buffer")]
    Reinitialize { width: u32, height: u32 },
}

impl QuadError {
    pub fn decode(err: impl std::fmt::Display) -> Self {
        QuadError::Decode {
            message: err.to_string(),
        }
    }

    pub fn encode(extension: &str, err: impl std::fmt::Display) -> Self {
        QuadError::Encode {
            extension: extension.to_string(),
            message: err.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        QuadError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short kind name, attached as a field to per-item error logs
    pub fn kind(&self) -> &'static str {
        match self {
            QuadError::Decode { .. } => "decode",
            QuadError::Encode { .. } | QuadError::UnsupportedExtension { .. } => "encode",
            QuadError::Io { .. } => "io",
            QuadError::Reinitialize { .. } => "reinitialize",
        }
    }
}

pub type QuadResult<T> = std::result::Result<T, QuadError>;
