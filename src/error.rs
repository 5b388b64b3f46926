use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Container format errors
    #[error("Invalid bitmap signature")]
    InvalidBitmapSignature,
    #[error("Unsupported bit depth {0}, only 24-bit truecolor is supported")]
    UnsupportedBitDepth(u16),
    #[error("Unsupported bitmap compression {0}")]
    UnsupportedCompression(u32),
    #[error("Invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },
    #[error("Truncated data: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    // Artifact errors
    #[error("Malformed {artifact} artifact: {reason}")]
    MalformedArtifact {
        artifact: &'static str,
        reason: String,
    },
    #[error("AC run-length stream overruns the block at position {position}")]
    CoefficientOverrun { position: usize },
    #[error("AC run-length stream is missing its end-of-block marker")]
    MissingEndOfBlock,

    // Invocation errors
    #[error("Unknown method {0}")]
    UnknownMethod(u8),
    #[error("Missing artifact {}", .0.display())]
    MissingArtifact(PathBuf),
    #[error("Input image {} does not exist", .0.display())]
    MissingInput(PathBuf),
}

impl CodecError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(artifact: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedArtifact {
            artifact,
            reason: reason.into(),
        }
    }
}
