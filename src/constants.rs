// Geometry of a transform block.
pub const BLOCK_SIZE: usize = 8;
pub const BLOCK_DIM: usize = BLOCK_SIZE * BLOCK_SIZE;

// Offset removed from every YCbCr sample before the forward DCT and restored after the inverse.
pub const LEVEL_SHIFT: f64 = 128.0;

// Chroma is centered on this value by the RGB -> YCbCr conversion.
pub const CHROMA_OFFSET: f64 = 128.0;

pub const MAX_SAMPLE_VALUE: f64 = 255.0;

// MSE below this threshold is reported as a perfect reconstruction.
pub const PSNR_MSE_THRESHOLD: f64 = 0.0001;
pub const PSNR_PERFECT: f64 = 999.0;

// Run-length token limits.
pub const MAX_RUN_LENGTH: u8 = 15;
pub const ZERO_RUN_SKIP: usize = 16;

// Sizes of the BMP headers when serialized.
pub const BMP_FILE_HEADER_SIZE: usize = 14;
pub const BMP_INFO_HEADER_SIZE: usize = 40;
pub const BMP_PIXEL_DATA_OFFSET: u32 = (BMP_FILE_HEADER_SIZE + BMP_INFO_HEADER_SIZE) as u32;
pub const BMP_SIGNATURE: u16 = 0x4D42; // "BM"
pub const BMP_PIXELS_PER_METER: i32 = 2835; // 72 DPI
