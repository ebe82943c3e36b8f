//! Error types for the reduction engine.

use thiserror::Error;

/// Errors that fail a reduction job.
///
/// Parse problems never show up here: a rule the parser cannot read is
/// skipped by the extractor. Everything else escapes `Reducer::process`
/// and, inside the queue, reaches the registered error callback.
#[derive(Debug, Error)]
pub enum ReduceError {
    /// A stylesheet or image could not be retrieved.
    #[error("failed to fetch `{url}`: {message}")]
    Fetch { url: String, message: String },

    /// The store rejected an artifact.
    #[error("failed to store `{url}`")]
    Store {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// A sprite sheet could not be encoded.
    #[error("failed to encode sprite sheet")]
    Image(#[from] image::ImageError),

    /// The worker caught a panic while reducing.
    #[error("reduction panicked: {0}")]
    Panicked(String),
}

impl ReduceError {
    pub fn fetch(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn store(url: impl Into<String>, source: std::io::Error) -> Self {
        Self::Store {
            url: url.into(),
            source,
        }
    }
}

pub type Result<T, E = ReduceError> = std::result::Result<T, E>;
