use thiserror::Error;

/// Failures of the inference adapter.
#[derive(Debug, Error)]
pub enum VisionError {
    /// Input bytes are not a parseable image.
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The checkpoint is absent, unreadable, or missing required weights.
    /// Fatal at startup; the process must not serve without a model.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    /// The forward pass itself failed.
    #[error("inference failed: {0}")]
    Inference(#[from] candle_core::Error),
}
