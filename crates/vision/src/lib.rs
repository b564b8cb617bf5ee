//! Model inference adapter.
//!
//! Wraps a pretrained 2-class image classifier behind the
//! [`DefectClassifier`] capability trait: decode bytes, run the fixed
//! preprocessing pipeline, one forward pass, softmax. Weights are loaded
//! once at startup from a PyTorch-style state-dict checkpoint.

pub mod checkpoint;
pub mod classifier;
pub mod convnext;
pub mod error;
pub mod preprocess;

pub use classifier::{ConvNextClassifier, DefectClassifier, Prediction};
pub use error::VisionError;
