//! ConvNeXt-Tiny, torchvision weight layout.
//!
//! Stem (4x4/4 patchify conv + channel norm), four stages of inverted
//! bottleneck blocks separated by 2x2/2 downsampling, global average pool
//! and a normalized linear head. Stochastic depth is identity at inference
//! and carries no weights, so it does not appear here.

use candle_core::{Result, Tensor, D};
use candle_nn::{conv2d, layer_norm, linear, Conv2d, Conv2dConfig, LayerNorm, Linear, Module, VarBuilder};

/// Blocks per stage for the Tiny variant.
const STAGE_DEPTHS: [usize; 4] = [3, 3, 9, 3];
/// Channel width per stage for the Tiny variant.
const STAGE_WIDTHS: [usize; 4] = [96, 192, 384, 768];

const NORM_EPS: f64 = 1e-6;

/// LayerNorm over the channel dimension of an NCHW tensor.
///
/// Weights are plain per-channel vectors; the permutation is purely a
/// runtime concern.
struct LayerNorm2d(LayerNorm);

impl LayerNorm2d {
    fn new(dim: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self(layer_norm(dim, NORM_EPS, vb)?))
    }

    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        self.0.forward(&xs.permute((0, 2, 3, 1))?)?.permute((0, 3, 1, 2))
    }
}

/// One inverted bottleneck block: 7x7 depthwise conv, channel norm, then a
/// 4x expansion MLP, scaled by a learned per-channel factor and added back
/// onto the residual.
struct Block {
    dwconv: Conv2d,
    norm: LayerNorm,
    expand: Linear,
    project: Linear,
    scale: Tensor,
}

impl Block {
    fn new(dim: usize, vb: VarBuilder) -> Result<Self> {
        let conv_cfg = Conv2dConfig {
            padding: 3,
            groups: dim,
            ..Default::default()
        };
        let inner = vb.pp("block");
        Ok(Self {
            dwconv: conv2d(dim, dim, 7, conv_cfg, inner.pp("0"))?,
            norm: layer_norm(dim, NORM_EPS, inner.pp("2"))?,
            expand: linear(dim, 4 * dim, inner.pp("3"))?,
            project: linear(4 * dim, dim, inner.pp("5"))?,
            scale: vb.get((dim, 1, 1), "layer_scale")?,
        })
    }

    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let residual = xs;
        // The MLP runs channels-last, matching the weight layout.
        let xs = self.dwconv.forward(xs)?;
        let xs = xs.permute((0, 2, 3, 1))?;
        let xs = self.norm.forward(&xs)?;
        let xs = self.expand.forward(&xs)?.gelu_erf()?;
        let xs = self.project.forward(&xs)?;
        let xs = xs.permute((0, 3, 1, 2))?;
        let xs = xs.broadcast_mul(&self.scale)?;
        residual + xs
    }
}

/// The full network with a configurable class count.
pub struct ConvNeXt {
    stem_conv: Conv2d,
    stem_norm: LayerNorm2d,
    downsamples: Vec<(LayerNorm2d, Conv2d)>,
    stages: Vec<Vec<Block>>,
    head_norm: LayerNorm2d,
    head: Linear,
}

impl ConvNeXt {
    pub fn new(num_classes: usize, vb: VarBuilder) -> Result<Self> {
        let features = vb.pp("features");

        let stem = features.pp("0");
        let stem_cfg = Conv2dConfig {
            stride: 4,
            ..Default::default()
        };
        let stem_conv = conv2d(3, STAGE_WIDTHS[0], 4, stem_cfg, stem.pp("0"))?;
        let stem_norm = LayerNorm2d::new(STAGE_WIDTHS[0], stem.pp("1"))?;

        let mut downsamples = Vec::new();
        let mut stages = Vec::new();
        for (idx, (&depth, &width)) in STAGE_DEPTHS.iter().zip(STAGE_WIDTHS.iter()).enumerate() {
            if idx > 0 {
                let ds = features.pp(format!("{}", 2 * idx));
                let ds_cfg = Conv2dConfig {
                    stride: 2,
                    ..Default::default()
                };
                downsamples.push((
                    LayerNorm2d::new(STAGE_WIDTHS[idx - 1], ds.pp("0"))?,
                    conv2d(STAGE_WIDTHS[idx - 1], width, 2, ds_cfg, ds.pp("1"))?,
                ));
            }

            let stage = features.pp(format!("{}", 2 * idx + 1));
            let mut blocks = Vec::with_capacity(depth);
            for block_idx in 0..depth {
                blocks.push(Block::new(width, stage.pp(format!("{block_idx}")))?);
            }
            stages.push(blocks);
        }

        let classifier = vb.pp("classifier");
        let head_norm = LayerNorm2d::new(STAGE_WIDTHS[3], classifier.pp("0"))?;
        let head = linear(STAGE_WIDTHS[3], num_classes, classifier.pp("2"))?;

        Ok(Self {
            stem_conv,
            stem_norm,
            downsamples,
            stages,
            head_norm,
            head,
        })
    }

    /// One forward pass: `(N, 3, H, W)` in, `(N, num_classes)` logits out.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = self.stem_norm.forward(&self.stem_conv.forward(xs)?)?;
        for (idx, blocks) in self.stages.iter().enumerate() {
            if idx > 0 {
                let (norm, conv) = &self.downsamples[idx - 1];
                xs = conv.forward(&norm.forward(&xs)?)?;
            }
            for block in blocks {
                xs = block.forward(&xs)?;
            }
        }

        // Global average pool to (N, C, 1, 1), channel norm, flatten, head.
        let xs = xs.mean_keepdim(D::Minus1)?.mean_keepdim(D::Minus2)?;
        let xs = self.head_norm.forward(&xs)?;
        self.head.forward(&xs.flatten_from(1)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use std::collections::HashMap;

    /// Zero-valued state dict with exactly the keys and shapes the Tiny
    /// variant expects in torchvision layout.
    fn tiny_state_dict(num_classes: usize) -> HashMap<String, Tensor> {
        let dev = Device::Cpu;
        let mut map = HashMap::new();
        let mut put = |name: String, shape: Vec<usize>| {
            map.insert(name, Tensor::zeros(shape, DType::F32, &dev).unwrap());
        };

        put("features.0.0.weight".into(), vec![96, 3, 4, 4]);
        put("features.0.0.bias".into(), vec![96]);
        put("features.0.1.weight".into(), vec![96]);
        put("features.0.1.bias".into(), vec![96]);

        for (idx, (&depth, &width)) in STAGE_DEPTHS.iter().zip(STAGE_WIDTHS.iter()).enumerate() {
            if idx > 0 {
                let prev = STAGE_WIDTHS[idx - 1];
                let ds = format!("features.{}", 2 * idx);
                put(format!("{ds}.0.weight"), vec![prev]);
                put(format!("{ds}.0.bias"), vec![prev]);
                put(format!("{ds}.1.weight"), vec![width, prev, 2, 2]);
                put(format!("{ds}.1.bias"), vec![width]);
            }
            for b in 0..depth {
                let block = format!("features.{}.{b}", 2 * idx + 1);
                put(format!("{block}.block.0.weight"), vec![width, 1, 7, 7]);
                put(format!("{block}.block.0.bias"), vec![width]);
                put(format!("{block}.block.2.weight"), vec![width]);
                put(format!("{block}.block.2.bias"), vec![width]);
                put(format!("{block}.block.3.weight"), vec![4 * width, width]);
                put(format!("{block}.block.3.bias"), vec![4 * width]);
                put(format!("{block}.block.5.weight"), vec![width, 4 * width]);
                put(format!("{block}.block.5.bias"), vec![width]);
                put(format!("{block}.layer_scale"), vec![width, 1, 1]);
            }
        }

        put("classifier.0.weight".into(), vec![768]);
        put("classifier.0.bias".into(), vec![768]);
        put("classifier.2.weight".into(), vec![num_classes, 768]);
        put("classifier.2.bias".into(), vec![num_classes]);
        map
    }

    #[test]
    fn builds_from_torchvision_layout_and_produces_two_logits() {
        let vb = VarBuilder::from_tensors(tiny_state_dict(2), DType::F32, &Device::Cpu);
        let model = ConvNeXt::new(2, vb).unwrap();

        let input = Tensor::zeros((1, 3, 150, 150), DType::F32, &Device::Cpu).unwrap();
        let logits = model.forward(&input).unwrap();
        assert_eq!(logits.dims(), &[1, 2]);
    }

    #[test]
    fn construction_fails_when_the_head_is_missing() {
        let mut dict = tiny_state_dict(2);
        dict.remove("classifier.2.weight");
        let vb = VarBuilder::from_tensors(dict, DType::F32, &Device::Cpu);
        assert!(ConvNeXt::new(2, vb).is_err());
    }
}
