//! State-dict checkpoint loading.
//!
//! Checkpoints arrive in more than one on-disk layout depending on how the
//! training run saved them: a raw weight map, or a wrapper object holding
//! the map under `model_state_dict`/`state_dict`, sometimes with the whole
//! network nested inside a `backbone.` module. Everything is normalized to
//! the layout the network expects before any weight is matched.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{pickle, DType, Tensor};
use tracing::{info, warn};

use crate::error::VisionError;

const WRAPPER_KEYS: [&str; 2] = ["model_state_dict.", "state_dict."];
const BACKBONE_PREFIX: &str = "backbone.";

/// Read and normalize the checkpoint at `path`.
///
/// An absent file is a fatal configuration error: the caller must not
/// start serving without a model.
pub fn load_state_dict(path: &Path) -> Result<HashMap<String, Tensor>, VisionError> {
    if !path.exists() {
        return Err(VisionError::Checkpoint(format!(
            "required model checkpoint not found at {}; provide a 2-class state dict before starting",
            path.display()
        )));
    }

    let raw = pickle::read_all(path)
        .map_err(|e| VisionError::Checkpoint(format!("{}: {e}", path.display())))?;
    info!(tensors = raw.len(), path = %path.display(), "read model checkpoint");
    normalize_state_dict(raw)
}

/// Bring raw checkpoint tensors into the network's expected layout.
///
/// - strips a `model_state_dict.`/`state_dict.` wrapper key path,
/// - strips a `backbone.` wrapper-module prefix,
/// - maps a 2-class head saved at `classifier.1` onto `classifier.2`
///   (the final linear layer's expected key pair),
/// - converts everything to f32.
///
/// Matching is non-strict: keys the network does not consume are kept and
/// logged, never fatal.
pub fn normalize_state_dict(
    raw: Vec<(String, Tensor)>,
) -> Result<HashMap<String, Tensor>, VisionError> {
    let mut map = HashMap::with_capacity(raw.len());
    for (name, tensor) in raw {
        let mut key = name.as_str();
        for wrapper in WRAPPER_KEYS {
            if let Some(stripped) = key.strip_prefix(wrapper) {
                key = stripped;
                break;
            }
        }
        if let Some(stripped) = key.strip_prefix(BACKBONE_PREFIX) {
            key = stripped;
        }

        let tensor = tensor
            .to_dtype(DType::F32)
            .map_err(|e| VisionError::Checkpoint(format!("tensor {key}: {e}")))?;
        map.insert(key.to_string(), tensor);
    }

    // The training run saved its replacement head at classifier.1; the
    // network's final linear layer lives at classifier.2.
    if map.contains_key("classifier.1.weight") && map.contains_key("classifier.1.bias") {
        info!("found trained 2-class head at classifier.1, mapping to classifier.2");
        if let Some(weight) = map.remove("classifier.1.weight") {
            map.insert("classifier.2.weight".to_string(), weight);
        }
        if let Some(bias) = map.remove("classifier.1.bias") {
            map.insert("classifier.2.bias".to_string(), bias);
        }
    }

    for key in map.keys() {
        if !key.starts_with("features.") && !key.starts_with("classifier.") {
            warn!(%key, "checkpoint key not consumed by the network; ignored");
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn t() -> Tensor {
        Tensor::zeros((1,), DType::F32, &Device::Cpu).unwrap()
    }

    fn normalize(names: &[&str]) -> HashMap<String, Tensor> {
        normalize_state_dict(names.iter().map(|n| (n.to_string(), t())).collect()).unwrap()
    }

    #[test]
    fn raw_weight_map_passes_through() {
        let map = normalize(&["features.0.0.weight", "classifier.2.bias"]);
        assert!(map.contains_key("features.0.0.weight"));
        assert!(map.contains_key("classifier.2.bias"));
    }

    #[test]
    fn wrapper_key_paths_are_stripped() {
        let map = normalize(&[
            "model_state_dict.features.0.0.weight",
            "state_dict.classifier.2.weight",
        ]);
        assert!(map.contains_key("features.0.0.weight"));
        assert!(map.contains_key("classifier.2.weight"));
    }

    #[test]
    fn backbone_prefix_is_stripped_even_inside_a_wrapper() {
        let map = normalize(&["model_state_dict.backbone.features.1.0.block.0.weight"]);
        assert!(map.contains_key("features.1.0.block.0.weight"));
    }

    #[test]
    fn alternate_head_pair_is_renamed_to_the_final_layer() {
        let map = normalize(&["classifier.1.weight", "classifier.1.bias"]);
        assert!(map.contains_key("classifier.2.weight"));
        assert!(map.contains_key("classifier.2.bias"));
        assert!(!map.contains_key("classifier.1.weight"));
    }

    #[test]
    fn lone_classifier_1_weight_is_left_alone() {
        let map = normalize(&["classifier.1.weight"]);
        assert!(map.contains_key("classifier.1.weight"));
        assert!(!map.contains_key("classifier.2.weight"));
    }

    #[test]
    fn unmatched_keys_are_kept_not_fatal() {
        let map = normalize(&["optimizer.param_groups.lr", "features.0.0.weight"]);
        assert_eq!(map.len(), 2);
    }
}
