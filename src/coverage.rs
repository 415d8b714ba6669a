use crate::error::{Result, TilerError};
use ndarray::{ArrayView3, Axis};

/// One-hot channel layout of the catalogue masks: [CLEAR, CLOUD, CLOUD_SHADOW]
pub const CLEAR_CHANNEL: usize = 0;
pub const CLOUD_CHANNEL: usize = 1;
pub const CLOUD_SHADOW_CHANNEL: usize = 2;

/// Fraction of tile pixels flagged cloud
pub fn cloud_coverage(mask_tile: &ArrayView3<f32>) -> Result<f64> {
    class_coverage(mask_tile, CLOUD_CHANNEL)
}

/// Fraction of tile pixels whose one-hot `channel` is set.
///
/// The denominator is the full tile area, so zero padding counts as
/// "not this class".
pub fn class_coverage(mask_tile: &ArrayView3<f32>, channel: usize) -> Result<f64> {
    let (rows, cols, channels) = mask_tile.dim();
    if channel >= channels {
        return Err(TilerError::MissingChannel { channel, channels });
    }

    let total_pixels = rows * cols;
    if total_pixels == 0 {
        return Ok(0.0);
    }

    let class_pixels = mask_tile
        .index_axis(Axis(2), channel)
        .iter()
        .filter(|&&value| value == 1.0)
        .count();

    Ok(class_pixels as f64 / total_pixels as f64)
}
