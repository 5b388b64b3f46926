//! Peak signal-to-noise ratio between two images.

use log::warn;

use crate::constants::{MAX_SAMPLE_VALUE, PSNR_MSE_THRESHOLD, PSNR_PERFECT};
use crate::error::CodecError;
use crate::pixel_grid::PixelGrid;

/// Mean squared error over all three channels of every pixel.
pub fn mean_squared_error(original: &PixelGrid, reconstructed: &PixelGrid) -> Result<f64, CodecError> {
    if original.dimensions() != reconstructed.dimensions() {
        let expected = original.dimensions();
        let found = reconstructed.dimensions();
        warn!(
            "Reconstruction is {}x{} but the reference is {}x{}",
            found.width, found.height, expected.width, expected.height
        );
        return Err(CodecError::InvalidDimensions {
            width: found.width as i64,
            height: found.height as i64,
        });
    }

    let mut sum = 0.0f64;
    for (a, b) in original.pixels().iter().zip(reconstructed.pixels()) {
        for (x, y) in [(a.r, b.r), (a.g, b.g), (a.b, b.b)] {
            let err = x as f64 - y as f64;
            sum += err * err;
        }
    }
    Ok(sum / (3.0 * original.pixels().len() as f64))
}

/// PSNR in decibels, or [`PSNR_PERFECT`] when the images are practically identical.
pub fn psnr(original: &PixelGrid, reconstructed: &PixelGrid) -> Result<f64, CodecError> {
    let mse = mean_squared_error(original, reconstructed)?;
    if mse < PSNR_MSE_THRESHOLD {
        return Ok(PSNR_PERFECT);
    }
    Ok(10.0 * ((MAX_SAMPLE_VALUE * MAX_SAMPLE_VALUE) / mse).log10())
}
