//! Block encoder orchestration.

use log::{debug, info};

use crate::codec::color::{level_shift, rgb_to_ycbcr};
use crate::codec::dct::fdct_8x8;
use crate::codec::entropy::{DcPredictor, encode_ac};
use crate::codec::quantization::{
    QuantizationTable, STD_CHROMINANCE_QUANT_TABLE, STD_LUMINANCE_QUANT_TABLE, quantization_error, quantize_block,
};
use crate::codec::zigzag::flatten;
use crate::codec::{Block, Channel, EntropyImage, QuantizedImage, RawChannels};
use crate::constants::BLOCK_DIM;
use crate::pixel_grid::PixelGrid;

pub struct BlockEncoder {
    pub quantization_table_lum: QuantizationTable,
    pub quantization_table_chrom: QuantizationTable,
}

impl Default for BlockEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockEncoder {
    pub fn new() -> Self {
        Self {
            quantization_table_lum: STD_LUMINANCE_QUANT_TABLE,
            quantization_table_chrom: STD_CHROMINANCE_QUANT_TABLE,
        }
    }

    pub fn table(&self, channel: Channel) -> &QuantizationTable {
        if channel.is_luma() {
            &self.quantization_table_lum
        } else {
            &self.quantization_table_chrom
        }
    }

    /// Splits the image into its R, G and B planes without any transform.
    pub fn encode_raw(&self, grid: &PixelGrid) -> RawChannels {
        let count = grid.dimensions().pixel_count();
        let mut planes = [Vec::with_capacity(count), Vec::with_capacity(count), Vec::with_capacity(count)];
        for pixel in grid.pixels() {
            planes[0].push(pixel.r);
            planes[1].push(pixel.g);
            planes[2].push(pixel.b);
        }
        RawChannels {
            dimensions: grid.dimensions(),
            planes,
        }
    }

    /// Transforms and quantizes every tile, producing zigzag-ordered coefficients per channel.
    pub fn encode_quantized(&self, grid: &PixelGrid) -> QuantizedImage {
        let dimensions = grid.dimensions();
        let block_count = dimensions.block_count();
        info!(
            "Quantizing {}x{} image as {} blocks per channel",
            dimensions.width, dimensions.height, block_count
        );

        let mut coefficients: [Vec<Block<i16>>; 3] = std::array::from_fn(|_| Vec::with_capacity(block_count));
        let mut errors: [Vec<Block<f32>>; 3] = std::array::from_fn(|_| Vec::with_capacity(block_count));

        for (block_x, block_y) in grid.tile_origins() {
            let samples = Self::extract_ycbcr(grid, block_x, block_y);
            for channel in Channel::ALL {
                let (quantized, error) = self.encode_block_internal(&samples[channel.index()], self.table(channel));
                coefficients[channel.index()].push(quantized);
                errors[channel.index()].push(error);
            }
        }

        QuantizedImage {
            dimensions,
            coefficients,
            errors,
        }
    }

    /// Quantizes the image, then codes each block's DC as a differential and its AC as run-length tokens.
    pub fn encode_entropy(&self, grid: &PixelGrid) -> EntropyImage {
        let quantized = self.encode_quantized(grid);
        let block_count = quantized.dimensions.block_count();

        let mut dc: [Vec<i32>; 3] = std::array::from_fn(|_| Vec::with_capacity(block_count));
        let mut ac: [Vec<Vec<_>>; 3] = std::array::from_fn(|_| Vec::with_capacity(block_count));

        // Blocks are stored in raster order, which is the order the DC chain requires.
        let mut predictor = DcPredictor::new();
        for index in 0..block_count {
            for channel in Channel::ALL {
                let block = &quantized.channel(channel)[index];
                dc[channel.index()].push(predictor.encode(channel, block[0]));
                ac[channel.index()].push(encode_ac(block));
            }
        }
        debug!(
            "Entropy coded {} blocks into {} AC tokens",
            block_count,
            ac.iter().flatten().map(Vec::len).sum::<usize>()
        );

        EntropyImage {
            dimensions: quantized.dimensions,
            dc,
            ac,
        }
    }

    /// Converts one tile to level-shifted Y, Cb and Cr blocks.
    fn extract_ycbcr(grid: &PixelGrid, block_x: usize, block_y: usize) -> [Block<f64>; 3] {
        let mut blocks = [[0.0f64; BLOCK_DIM]; 3];
        for (i, pixel) in grid.tile(block_x, block_y).into_iter().enumerate() {
            let ycbcr = rgb_to_ycbcr(pixel);
            for channel in Channel::ALL {
                blocks[channel.index()][i] = level_shift(ycbcr[channel.index()]);
            }
        }
        blocks
    }

    fn encode_block_internal(&self, block: &Block<f64>, quant_table: &QuantizationTable) -> (Block<i16>, Block<f32>) {
        let mut dct_coeffs = [0.0f64; BLOCK_DIM];
        fdct_8x8(block, &mut dct_coeffs);

        let mut quant_coeffs = [0i16; BLOCK_DIM];
        quantize_block(&dct_coeffs, quant_table, &mut quant_coeffs);
        let error = quantization_error(&dct_coeffs, &quant_coeffs, quant_table);

        (flatten(&quant_coeffs), flatten(&error))
    }
}
