pub mod artifacts;
pub mod bmp;
pub mod codec;
pub mod constants;
pub mod error;
pub mod method;
pub mod pixel_grid;
pub mod psnr;

pub use error::CodecError;
pub use method::{DecodeJob, EncodeJob, Method};
pub use pixel_grid::{Pixel, PixelGrid};

use constants::BLOCK_SIZE;

/// Width and height of an image, persisted next to the transform artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        if self.width == 0 || self.height == 0 || self.width > i32::MAX as u32 || self.height > i32::MAX as u32 {
            return Err(CodecError::InvalidDimensions {
                width: self.width as i64,
                height: self.height as i64,
            });
        }
        Ok(())
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn blocks_wide(&self) -> usize {
        (self.width as usize).div_ceil(BLOCK_SIZE)
    }

    pub fn blocks_high(&self) -> usize {
        (self.height as usize).div_ceil(BLOCK_SIZE)
    }

    /// Number of 8x8 tiles needed to cover the image.
    pub fn block_count(&self) -> usize {
        self.blocks_wide() * self.blocks_high()
    }
}
