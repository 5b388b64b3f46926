//! Discrete Cosine Transform (DCT) over 8x8 blocks.
//!
//! Both directions use direct O(64^2) summation in double precision so that
//! `idct_8x8(fdct_8x8(b))` reproduces `b` to within floating-point rounding.

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::sync::OnceLock;

use crate::codec::Block;
use crate::constants::{BLOCK_DIM, BLOCK_SIZE};

/// `COSINE[u][x] = cos((2x + 1) * u * PI / 16)`
static COSINE: OnceLock<[[f64; BLOCK_SIZE]; BLOCK_SIZE]> = OnceLock::new();

fn cosine_table() -> &'static [[f64; BLOCK_SIZE]; BLOCK_SIZE] {
    COSINE.get_or_init(|| {
        let mut table = [[0.0f64; BLOCK_SIZE]; BLOCK_SIZE];
        for (u, row) in table.iter_mut().enumerate() {
            for (x, value) in row.iter_mut().enumerate() {
                *value = (((2 * x + 1) * u) as f64 * PI / 16.0).cos();
            }
        }
        table
    })
}

#[inline]
fn scale(index: usize) -> f64 {
    if index == 0 { FRAC_1_SQRT_2 } else { 1.0 }
}

/// Forward type-II DCT.
pub fn fdct_8x8(input: &Block<f64>, output: &mut Block<f64>) {
    let cos = cosine_table();
    for u in 0..BLOCK_SIZE {
        for v in 0..BLOCK_SIZE {
            let mut sum = 0.0f64;
            for x in 0..BLOCK_SIZE {
                for y in 0..BLOCK_SIZE {
                    sum += input[x * BLOCK_SIZE + y] * cos[u][x] * cos[v][y];
                }
            }
            output[u * BLOCK_SIZE + v] = 0.25 * scale(u) * scale(v) * sum;
        }
    }
}

/// Inverse (type-III) DCT.
pub fn idct_8x8(input: &Block<f64>, output: &mut Block<f64>) {
    let cos = cosine_table();
    for x in 0..BLOCK_SIZE {
        for y in 0..BLOCK_SIZE {
            let mut sum = 0.0f64;
            for u in 0..BLOCK_SIZE {
                for v in 0..BLOCK_SIZE {
                    sum += scale(u) * scale(v) * input[u * BLOCK_SIZE + v] * cos[u][x] * cos[v][y];
                }
            }
            output[x * BLOCK_SIZE + y] = 0.25 * sum;
        }
    }
}

pub fn forward(input: &Block<f64>) -> Block<f64> {
    let mut output = [0.0f64; BLOCK_DIM];
    fdct_8x8(input, &mut output);
    output
}

pub fn inverse(input: &Block<f64>) -> Block<f64> {
    let mut output = [0.0f64; BLOCK_DIM];
    idct_8x8(input, &mut output);
    output
}
