//! Fixed preprocessing pipeline in front of the network.

use candle_core::{Device, Tensor};
use image::imageops::FilterType;

use crate::error::VisionError;

/// Spatial resolution the network was trained at.
pub const INPUT_SIZE: usize = 150;

/// Per-channel normalization constants (ImageNet convention).
pub const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode raw bytes into the `(1, 3, 150, 150)` input tensor.
///
/// Forces RGB, resizes bilinearly to the fixed resolution, scales to
/// [0, 1] and normalizes each channel.
pub fn image_to_tensor(bytes: &[u8], device: &Device) -> Result<Tensor, VisionError> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let resized = image::imageops::resize(
        &rgb,
        INPUT_SIZE as u32,
        INPUT_SIZE as u32,
        FilterType::Triangle,
    );

    let plane = INPUT_SIZE * INPUT_SIZE;
    let mut data = vec![0f32; 3 * plane];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = y as usize * INPUT_SIZE + x as usize;
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            data[c * plane + offset] = (value - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
        }
    }

    Ok(Tensor::from_vec(
        data,
        (1, 3, INPUT_SIZE, INPUT_SIZE),
        device,
    )?)
}
