use std::path::Path;

use candle_core::{DType, Device, D};
use candle_nn::ops::softmax;
use candle_nn::VarBuilder;
use tracing::info;

use crate::checkpoint;
use crate::convnext::ConvNeXt;
use crate::error::VisionError;
use crate::preprocess;

/// Model verdict for one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Probability of the "defect" class, in [0, 1].
    pub score: f32,
    /// Argmax over the two classes: 1 means defect, 0 means no defect.
    pub label: u8,
}

/// Capability object for defect classification.
///
/// Passed explicitly to whoever needs inference so tests can substitute a
/// stub. Implementations are stateless per call after construction and
/// safe for concurrent invocation.
pub trait DefectClassifier: Send + Sync + 'static {
    fn classify(&self, image_bytes: &[u8]) -> Result<Prediction, VisionError>;
}

/// ConvNeXt-Tiny with a 2-class head, evaluated on CPU.
pub struct ConvNextClassifier {
    model: ConvNeXt,
    device: Device,
}

impl ConvNextClassifier {
    /// Load the network once from the checkpoint at `path`.
    ///
    /// Tolerates the known checkpoint layout variants (see
    /// [`checkpoint::normalize_state_dict`]); a missing file or an
    /// incomplete weight map is a fatal startup error.
    pub fn load(path: &Path) -> Result<Self, VisionError> {
        let device = Device::Cpu;
        let tensors = checkpoint::load_state_dict(path)?;
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
        let model = ConvNeXt::new(2, vb)
            .map_err(|e| VisionError::Checkpoint(format!("state dict incomplete: {e}")))?;
        info!(path = %path.display(), "defect classifier ready");
        Ok(Self { model, device })
    }
}

impl DefectClassifier for ConvNextClassifier {
    fn classify(&self, image_bytes: &[u8]) -> Result<Prediction, VisionError> {
        let input = preprocess::image_to_tensor(image_bytes, &self.device)?;
        let logits = self.model.forward(&input)?;
        let probs = softmax(&logits, D::Minus1)?.squeeze(0)?.to_vec1::<f32>()?;

        // Two logits: [no_defect, has_defect]. Ties go to class 0.
        Ok(Prediction {
            score: probs[1],
            label: u8::from(probs[1] > probs[0]),
        })
    }
}
