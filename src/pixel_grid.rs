//! In-memory truecolor image, top row first.

use crate::Dimensions;
use crate::constants::BLOCK_SIZE;
use crate::error::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Row-major grid of pixels with a validated, non-zero size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    dimensions: Dimensions,
    pixels: Vec<Pixel>,
}

impl PixelGrid {
    /// Creates a grid filled with black pixels.
    pub fn new(dimensions: Dimensions) -> Result<Self, CodecError> {
        dimensions.validate()?;
        Ok(Self {
            dimensions,
            pixels: vec![Pixel::default(); dimensions.pixel_count()],
        })
    }

    pub fn from_pixels(dimensions: Dimensions, pixels: Vec<Pixel>) -> Result<Self, CodecError> {
        dimensions.validate()?;
        if pixels.len() != dimensions.pixel_count() {
            return Err(CodecError::Truncated {
                expected: dimensions.pixel_count(),
                found: pixels.len(),
            });
        }
        Ok(Self { dimensions, pixels })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn width(&self) -> usize {
        self.dimensions.width as usize
    }

    pub fn height(&self) -> usize {
        self.dimensions.height as usize
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Pixel {
        self.pixels[y * self.width() + x]
    }

    pub fn set(&mut self, x: usize, y: usize, pixel: Pixel) {
        let width = self.width();
        self.pixels[y * width + x] = pixel;
    }

    /// Returns the pixel at (x, y), replicating the last column/row for coordinates past the edge.
    pub fn get_clamped(&self, x: usize, y: usize) -> Pixel {
        self.get(x.min(self.width() - 1), y.min(self.height() - 1))
    }

    pub fn row(&self, y: usize) -> &[Pixel] {
        let width = self.width();
        &self.pixels[y * width..(y + 1) * width]
    }

    /// Copies the 8x8 tile whose top-left corner is (block_x, block_y), row-major.
    pub fn tile(&self, block_x: usize, block_y: usize) -> [Pixel; BLOCK_SIZE * BLOCK_SIZE] {
        let mut tile = [Pixel::default(); BLOCK_SIZE * BLOCK_SIZE];
        for y in 0..BLOCK_SIZE {
            for x in 0..BLOCK_SIZE {
                tile[y * BLOCK_SIZE + x] = self.get_clamped(block_x + x, block_y + y);
            }
        }
        tile
    }

    /// Top-left corners of all tiles, block rows outer.
    pub fn tile_origins(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width();
        let height = self.height();
        (0..height)
            .step_by(BLOCK_SIZE)
            .flat_map(move |block_y| (0..width).step_by(BLOCK_SIZE).map(move |block_x| (block_x, block_y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> PixelGrid {
        let dimensions = Dimensions { width, height };
        let mut grid = PixelGrid::new(dimensions).unwrap();
        for y in 0..height as usize {
            for x in 0..width as usize {
                grid.set(x, y, Pixel::new(x as u8, y as u8, (x + y) as u8));
            }
        }
        grid
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let result = PixelGrid::new(Dimensions { width: 0, height: 4 });
        assert!(matches!(result, Err(CodecError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_from_pixels_length_mismatch() {
        let result = PixelGrid::from_pixels(Dimensions { width: 2, height: 2 }, vec![Pixel::default(); 3]);
        assert!(matches!(result, Err(CodecError::Truncated { expected: 4, found: 3 })));
    }

    #[test]
    fn test_tile_replicates_edges() {
        let grid = gradient(10, 10);
        let tile = grid.tile(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                let expected = grid.get((8 + x).min(9), (8 + y).min(9));
                assert_eq!(tile[y * 8 + x], expected, "tile mismatch at ({}, {})", x, y);
            }
        }
        // Everything right of column 1 repeats the last column.
        assert_eq!(tile[7], Pixel::new(9, 8, 17));
        assert_eq!(tile[63], Pixel::new(9, 9, 18));
    }

    #[test]
    fn test_tile_origins_raster_order() {
        let grid = gradient(17, 9);
        let origins: Vec<_> = grid.tile_origins().collect();
        assert_eq!(origins, vec![(0, 0), (8, 0), (16, 0), (0, 8), (8, 8), (16, 8)]);
    }
}
