//! Quantization of DCT coefficients against 8x8 tables.

use crate::codec::{Block, Channel};
use crate::constants::BLOCK_DIM;
use crate::error::CodecError;

/// An 8x8 table of positive quantizer step sizes, row-major.
pub type QuantizationTable = [u16; BLOCK_DIM];

/// Standard JPEG luminance quantization table (Quality 50).
#[rustfmt::skip]
pub const STD_LUMINANCE_QUANT_TABLE: QuantizationTable = [
    16, 11, 10, 16, 24, 40, 51, 61,
    12, 12, 14, 19, 26, 58, 60, 55,
    14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62,
    18, 22, 37, 56, 68, 109, 103, 77,
    24, 35, 55, 64, 81, 104, 113, 92,
    49, 64, 78, 87, 103, 121, 120, 101,
    72, 92, 95, 98, 112, 100, 103, 99,
];

/// Standard JPEG chrominance quantization table (Quality 50), shared by Cb and Cr.
#[rustfmt::skip]
pub const STD_CHROMINANCE_QUANT_TABLE: QuantizationTable = [
    17, 18, 24, 47, 99, 99, 99, 99,
    18, 21, 26, 66, 99, 99, 99, 99,
    24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
];

/// Returns the built-in table used for a channel.
pub fn standard_table(channel: Channel) -> &'static QuantizationTable {
    if channel.is_luma() {
        &STD_LUMINANCE_QUANT_TABLE
    } else {
        &STD_CHROMINANCE_QUANT_TABLE
    }
}

/// Builds a table from parsed values, rejecting zero or out-of-range steps.
pub fn table_from_values(values: &[i64]) -> Result<QuantizationTable, CodecError> {
    if values.len() != BLOCK_DIM {
        return Err(CodecError::malformed(
            "quantization table",
            format!("expected {} entries, found {}", BLOCK_DIM, values.len()),
        ));
    }
    let mut table = [0u16; BLOCK_DIM];
    for (slot, &value) in table.iter_mut().zip(values) {
        if value <= 0 || value > u16::MAX as i64 {
            return Err(CodecError::malformed(
                "quantization table",
                format!("step {} is not a positive 16-bit value", value),
            ));
        }
        *slot = value as u16;
    }
    Ok(table)
}

/// Quantizes DCT coefficients using a quantization table.
pub fn quantize_block(dct_block: &Block<f64>, quant_table: &QuantizationTable, output: &mut Block<i16>) {
    for i in 0..BLOCK_DIM {
        let q_val = quant_table[i] as f64;
        output[i] = (dct_block[i] / q_val).round() as i16;
    }
}

/// De-quantizes DCT coefficients.
pub fn dequantize_block(quant_block: &Block<i16>, quant_table: &QuantizationTable, output: &mut Block<f64>) {
    for i in 0..BLOCK_DIM {
        output[i] = quant_block[i] as f64 * quant_table[i] as f64;
    }
}

/// Difference between the coefficients and their dequantized approximation.
pub fn quantization_error(dct_block: &Block<f64>, quant_block: &Block<i16>, quant_table: &QuantizationTable) -> Block<f32> {
    let mut error = [0.0f32; BLOCK_DIM];
    for i in 0..BLOCK_DIM {
        error[i] = (dct_block[i] - quant_block[i] as f64 * quant_table[i] as f64) as f32;
    }
    error
}
