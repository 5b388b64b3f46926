//! 8x8 block transform codec.
//!
//! This module implements the textbook JPEG transform pipeline:
//!
//! - RGB <-> YCbCr conversion (BT.601, chroma centered on 128) and level shift.
//! - Direct-summation 2D DCT and its inverse.
//! - Quantization against the standard luma/chroma tables.
//! - Zigzag coefficient reordering.
//! - DC differential (DPCM) and AC run-length token coding.
//!
//! There is no chroma subsampling and no bitstream packing: every channel is
//! coded at full resolution and the token streams stay human readable.

pub mod color;
pub mod dct;
pub mod decoder;
pub mod encoder;
pub mod entropy;
pub mod quantization;
pub mod zigzag;

pub use decoder::BlockDecoder;
pub use encoder::BlockEncoder;

use crate::constants::BLOCK_DIM;

/// One 8x8 block stored row-major: element `[u * 8 + v]` is row `u`, column `v`.
pub type Block<T> = [T; BLOCK_DIM];

/// The three coded channels, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Y = 0,
    Cb = 1,
    Cr = 2,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Y, Channel::Cb, Channel::Cr];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Suffix used in artifact file names.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Y => "Y",
            Channel::Cb => "Cb",
            Channel::Cr => "Cr",
        }
    }

    pub fn is_luma(self) -> bool {
        self == Channel::Y
    }
}

/// Quantized coefficients of a whole image, one zigzag-ordered block per tile and channel.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedImage {
    pub dimensions: crate::Dimensions,
    pub coefficients: [Vec<Block<i16>>; 3],
    /// Per-coefficient quantization error (`dct - q * table`), zigzag-ordered.
    pub errors: [Vec<Block<f32>>; 3],
}

impl QuantizedImage {
    pub fn channel(&self, channel: Channel) -> &[Block<i16>] {
        &self.coefficients[channel.index()]
    }
}

/// Token streams produced by the entropy method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntropyImage {
    pub dimensions: crate::Dimensions,
    pub dc: [Vec<i32>; 3],
    pub ac: [Vec<Vec<entropy::RunLength>>; 3],
}

/// Raw R, G and B planes, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChannels {
    pub dimensions: crate::Dimensions,
    pub planes: [Vec<u8>; 3],
}
