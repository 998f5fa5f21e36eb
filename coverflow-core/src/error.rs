use thiserror::Error;

/// Errors surfaced by image population.
///
/// Cancellation and stale completions are not errors; the cache drops them
/// silently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("Payload error: {0}")]
    Payload(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for ImageError {
    fn from(err: tokio::task::JoinError) -> Self {
        ImageError::Worker(err.to_string())
    }
}

impl From<image::ImageError> for ImageError {
    fn from(err: image::ImageError) -> Self {
        ImageError::Decode(err.to_string())
    }
}

/// Integration errors between the controller and its item source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CarouselError {
    #[error("Index desync: slots hold {slots} items, source reports {source_len}")]
    IndexDesync { slots: usize, source_len: usize },

    #[error("Index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, CarouselError>;
