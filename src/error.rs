use crate::session::{Event, Phase};

#[derive(thiserror::Error, Debug)]
pub enum ScoreError {
    #[error("dimension mismatch: annotation is {}x{}, reference is {}x{}", annotation.0, annotation.1, reference.0, reference.1)]
    DimensionMismatch {
        /// (width, height)
        annotation: (usize, usize),
        /// (width, height)
        reference: (usize, usize),
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot apply {event:?} while in {from:?} phase")]
    InvalidTransition { from: Phase, event: Event },

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScoreError>;

impl ScoreError {
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        ScoreError::InvalidInput(msg.into())
    }
}
