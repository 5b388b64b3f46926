//! Zigzag scan order for 8x8 blocks.

use crate::codec::Block;
use crate::constants::BLOCK_DIM;

/// Maps zigzag index to natural (row * 8 + col) index, lowest frequency first.
#[rustfmt::skip]
pub const ZIGZAG_ORDER: [usize; BLOCK_DIM] = [
    0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Checks that `order` names each of the 64 positions exactly once.
pub const fn is_permutation(order: &[usize; BLOCK_DIM]) -> bool {
    let mut seen = [false; BLOCK_DIM];
    let mut i = 0;
    while i < BLOCK_DIM {
        let position = order[i];
        if position >= BLOCK_DIM || seen[position] {
            return false;
        }
        seen[position] = true;
        i += 1;
    }
    true
}

const _: () = assert!(is_permutation(&ZIGZAG_ORDER));

/// Reorders a row-major block into zigzag order.
pub fn flatten<T: Copy + Default>(block: &Block<T>) -> Block<T> {
    let mut sequence = [T::default(); BLOCK_DIM];
    for (i, &position) in ZIGZAG_ORDER.iter().enumerate() {
        sequence[i] = block[position];
    }
    sequence
}

/// Inverse of [`flatten`].
pub fn unflatten<T: Copy + Default>(sequence: &Block<T>) -> Block<T> {
    let mut block = [T::default(); BLOCK_DIM];
    for (i, &position) in ZIGZAG_ORDER.iter().enumerate() {
        block[position] = sequence[i];
    }
    block
}
