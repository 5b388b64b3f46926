//! Block decoder: rebuilds pixels from coefficients or token streams.

use log::info;

use crate::Dimensions;
use crate::codec::color::{level_unshift, ycbcr_to_rgb};
use crate::codec::dct::idct_8x8;
use crate::codec::entropy::{DcPredictor, decode_ac};
use crate::codec::quantization::{
    QuantizationTable, STD_CHROMINANCE_QUANT_TABLE, STD_LUMINANCE_QUANT_TABLE, dequantize_block,
};
use crate::codec::zigzag::unflatten;
use crate::codec::{Block, Channel, EntropyImage, QuantizedImage, RawChannels};
use crate::constants::{BLOCK_DIM, BLOCK_SIZE};
use crate::error::CodecError;
use crate::pixel_grid::{Pixel, PixelGrid};

pub struct BlockDecoder {
    pub quantization_tables: [QuantizationTable; 3],
}

impl Default for BlockDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDecoder {
    /// Decoder using the standard luma table for Y and the chroma table for Cb and Cr.
    pub fn new() -> Self {
        Self {
            quantization_tables: [
                STD_LUMINANCE_QUANT_TABLE,
                STD_CHROMINANCE_QUANT_TABLE,
                STD_CHROMINANCE_QUANT_TABLE,
            ],
        }
    }

    pub fn with_tables(quantization_tables: [QuantizationTable; 3]) -> Self {
        Self { quantization_tables }
    }

    pub fn decode_raw(&self, raw: &RawChannels) -> Result<PixelGrid, CodecError> {
        let count = raw.dimensions.pixel_count();
        for plane in &raw.planes {
            if plane.len() != count {
                return Err(CodecError::Truncated {
                    expected: count,
                    found: plane.len(),
                });
            }
        }
        let pixels = (0..count)
            .map(|i| Pixel::new(raw.planes[0][i], raw.planes[1][i], raw.planes[2][i]))
            .collect();
        PixelGrid::from_pixels(raw.dimensions, pixels)
    }

    pub fn decode_quantized(&self, image: &QuantizedImage) -> Result<PixelGrid, CodecError> {
        let dimensions = image.dimensions;
        for channel in Channel::ALL {
            check_block_count(dimensions, image.channel(channel).len())?;
        }
        info!(
            "Reconstructing {}x{} image from {} blocks per channel",
            dimensions.width,
            dimensions.height,
            dimensions.block_count()
        );

        let mut grid = PixelGrid::new(dimensions)?;
        for index in 0..dimensions.block_count() {
            let blocks = [
                &image.coefficients[0][index],
                &image.coefficients[1][index],
                &image.coefficients[2][index],
            ];
            self.reconstruct_tile(&mut grid, index, blocks);
        }
        Ok(grid)
    }

    /// Rebuilds coefficients from DC differentials and AC tokens, then reconstructs the image.
    pub fn decode_entropy(&self, image: &EntropyImage) -> Result<PixelGrid, CodecError> {
        let quantized = self.entropy_to_coefficients(image)?;
        self.decode_quantized(&quantized)
    }

    /// Inverse of the DPCM and run-length stages, yielding zigzag-ordered blocks.
    pub fn entropy_to_coefficients(&self, image: &EntropyImage) -> Result<QuantizedImage, CodecError> {
        let dimensions = image.dimensions;
        let block_count = dimensions.block_count();
        for channel in Channel::ALL {
            check_block_count(dimensions, image.dc[channel.index()].len())?;
            check_block_count(dimensions, image.ac[channel.index()].len())?;
        }

        let mut coefficients: [Vec<Block<i16>>; 3] = std::array::from_fn(|_| Vec::with_capacity(block_count));
        let mut predictor = DcPredictor::new();
        for index in 0..block_count {
            for channel in Channel::ALL {
                let mut sequence = [0i16; BLOCK_DIM];
                sequence[0] = predictor.decode(channel, image.dc[channel.index()][index])?;
                let mut tokens = image.ac[channel.index()][index].iter().copied();
                decode_ac(&mut tokens, &mut sequence)?;
                if tokens.next().is_some() {
                    return Err(CodecError::malformed("AC run-length", format!("tokens after end of block {}", index)));
                }
                coefficients[channel.index()].push(sequence);
            }
        }

        Ok(QuantizedImage {
            dimensions,
            coefficients,
            errors: std::array::from_fn(|_| Vec::new()),
        })
    }

    fn reconstruct_tile(&self, grid: &mut PixelGrid, index: usize, blocks: [&Block<i16>; 3]) {
        let blocks_wide = grid.dimensions().blocks_wide();
        let origin_x = (index % blocks_wide) * BLOCK_SIZE;
        let origin_y = (index / blocks_wide) * BLOCK_SIZE;

        let mut samples = [[0.0f64; BLOCK_DIM]; 3];
        for channel in Channel::ALL {
            let mut dequant_coeffs = [0.0f64; BLOCK_DIM];
            dequantize_block(
                &unflatten(blocks[channel.index()]),
                &self.quantization_tables[channel.index()],
                &mut dequant_coeffs,
            );
            idct_8x8(&dequant_coeffs, &mut samples[channel.index()]);
        }

        // Samples past the image edge were replicated on encode and are dropped here.
        let rows = BLOCK_SIZE.min(grid.height() - origin_y);
        let cols = BLOCK_SIZE.min(grid.width() - origin_x);
        for y in 0..rows {
            for x in 0..cols {
                let i = y * BLOCK_SIZE + x;
                let pixel = ycbcr_to_rgb(
                    level_unshift(samples[0][i]),
                    level_unshift(samples[1][i]),
                    level_unshift(samples[2][i]),
                );
                grid.set(origin_x + x, origin_y + y, pixel);
            }
        }
    }
}

fn check_block_count(dimensions: Dimensions, found: usize) -> Result<(), CodecError> {
    let expected = dimensions.block_count();
    if found != expected {
        return Err(CodecError::malformed(
            "coefficient",
            format!(
                "{}x{} image needs {} blocks, found {}",
                dimensions.width, dimensions.height, expected, found
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BlockEncoder;

    fn grid_from_fn(width: u32, height: u32, f: impl Fn(usize, usize) -> Pixel) -> PixelGrid {
        let dimensions = Dimensions::new(width, height);
        let mut grid = PixelGrid::new(dimensions).unwrap();
        for y in 0..height as usize {
            for x in 0..width as usize {
                grid.set(x, y, f(x, y));
            }
        }
        grid
    }

    #[test]
    fn test_raw_round_trip_is_lossless() {
        let grid = grid_from_fn(2, 2, |x, y| Pixel::new((x * 100) as u8, (y * 50) as u8, 255));
        let raw = BlockEncoder::new().encode_raw(&grid);
        assert_eq!(BlockDecoder::new().decode_raw(&raw).unwrap(), grid);
    }

    #[test]
    fn test_raw_short_plane_rejected() {
        let grid = grid_from_fn(2, 2, |_, _| Pixel::new(1, 2, 3));
        let mut raw = BlockEncoder::new().encode_raw(&grid);
        raw.planes[1].pop();
        assert!(matches!(
            BlockDecoder::new().decode_raw(&raw),
            Err(CodecError::Truncated { expected: 4, found: 3 })
        ));
    }

    #[test]
    fn test_flat_gray_reconstructs_exactly() {
        let grid = grid_from_fn(8, 8, |_, _| Pixel::new(128, 128, 128));
        let quantized = BlockEncoder::new().encode_quantized(&grid);
        let decoded = BlockDecoder::new().decode_quantized(&quantized).unwrap();
        for pixel in decoded.pixels() {
            for channel in [pixel.r, pixel.g, pixel.b] {
                assert!((channel as i32 - 128).abs() <= 2, "{:?}", pixel);
            }
        }
    }

    #[test]
    fn test_smooth_gradient_stays_close() {
        let grid = grid_from_fn(16, 16, |x, y| Pixel::new((x * 8) as u8, (y * 8) as u8, 100));
        let quantized = BlockEncoder::new().encode_quantized(&grid);
        let decoded = BlockDecoder::new().decode_quantized(&quantized).unwrap();
        for (source, result) in grid.pixels().iter().zip(decoded.pixels()) {
            assert!((source.r as i32 - result.r as i32).abs() < 25, "{:?} vs {:?}", source, result);
            assert!((source.g as i32 - result.g as i32).abs() < 25, "{:?} vs {:?}", source, result);
            assert!((source.b as i32 - result.b as i32).abs() < 25, "{:?} vs {:?}", source, result);
        }
    }

    #[test]
    fn test_entropy_matches_quantized_path() {
        let grid = grid_from_fn(20, 12, |x, y| Pixel::new((x * 12) as u8, (y * 20) as u8, ((x + y) * 5) as u8));
        let encoder = BlockEncoder::new();
        let decoder = BlockDecoder::new();

        let quantized = encoder.encode_quantized(&grid);
        let entropy = encoder.encode_entropy(&grid);
        let rebuilt = decoder.entropy_to_coefficients(&entropy).unwrap();
        assert_eq!(rebuilt.coefficients, quantized.coefficients);
        assert_eq!(
            decoder.decode_entropy(&entropy).unwrap(),
            decoder.decode_quantized(&quantized).unwrap()
        );
    }

    #[test]
    fn test_partial_tiles_only_reflect_in_bounds_pixels() {
        // Left 8 columns black, the two columns of the partial tile white.
        let grid = grid_from_fn(10, 10, |x, _| if x >= 8 { Pixel::new(255, 255, 255) } else { Pixel::new(0, 0, 0) });
        let quantized = BlockEncoder::new().encode_quantized(&grid);
        let decoded = BlockDecoder::new().decode_quantized(&quantized).unwrap();

        assert_eq!(decoded.dimensions(), grid.dimensions());
        // The replicated columns are white too, so the partial tile stays flat white.
        for y in 0..10 {
            for x in 8..10 {
                let pixel = decoded.get(x, y);
                assert!(pixel.r >= 250 && pixel.g >= 250 && pixel.b >= 250, "({}, {}) = {:?}", x, y, pixel);
            }
        }
    }

    #[test]
    fn test_block_count_mismatch_rejected() {
        let grid = grid_from_fn(16, 8, |_, _| Pixel::new(10, 20, 30));
        let mut quantized = BlockEncoder::new().encode_quantized(&grid);
        quantized.coefficients[2].pop();
        assert!(matches!(
            BlockDecoder::new().decode_quantized(&quantized),
            Err(CodecError::MalformedArtifact { .. })
        ));
    }
}
