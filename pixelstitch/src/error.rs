use thiserror::Error;

/// Everything that can stop the stitching pipeline.
#[derive(Error, Debug)]
pub enum StitchError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Channel mismatch: {left} channels vs {right} channels")]
    ChannelMismatch { left: usize, right: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No mutually confirmed matches between the two photos")]
    EmptyMatches,

    #[error("Unsupported canvas geometry: {reason}")]
    Geometry { reason: String },
}

pub type Result<T> = std::result::Result<T, StitchError>;
