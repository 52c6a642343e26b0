use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for the accident detector.
///
/// Each variant carries the context of its error domain (filesystem, image
/// decoding, model inference, ...) so callers can report a useful message
/// without parsing strings.
#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error: {operation} failed (file: {path})")]
    ImageProcessing {
        path: String,
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Model error: {operation} failed: {reason}")]
    Model { operation: String, reason: String },

    #[error("Serialization error: {operation} failed")]
    Serialization {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Geocoding error: {reason}")]
    Geocoding { reason: String },

    #[error("Display error: {reason}")]
    Display { reason: String },
}

pub type Result<T> = std::result::Result<T, DetectorError>;

/// Fallback for I/O errors raised without path context. Code that knows the
/// path should build `DetectorError::FileSystem` itself.
impl From<std::io::Error> for DetectorError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

impl From<image::ImageError> for DetectorError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image processing".to_string(),
            source: Box::new(err),
        }
    }
}

/// ONNX Runtime errors are flattened to their message.
impl From<ort::Error> for DetectorError {
    fn from(err: ort::Error) -> Self {
        Self::Model {
            operation: "ort operation".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Shape errors come out of tensor handling around inference, so they are
/// reported as model errors.
impl From<ndarray::ShapeError> for DetectorError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Model {
            operation: "tensor shape conversion".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for DetectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            operation: "json".to_string(),
            source: err,
        }
    }
}

impl From<reqwest::Error> for DetectorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Geocoding {
            reason: err.to_string(),
        }
    }
}
