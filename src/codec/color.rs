//! Color conversion between RGB and YCbCr (ITU-R BT.601, full range).

use crate::constants::{CHROMA_OFFSET, LEVEL_SHIFT, MAX_SAMPLE_VALUE};
use crate::pixel_grid::Pixel;

/// Converts a pixel to (Y, Cb, Cr). Cb and Cr are centered on 128.
pub fn rgb_to_ycbcr(pixel: Pixel) -> [f64; 3] {
    let r = pixel.r as f64;
    let g = pixel.g as f64;
    let b = pixel.b as f64;

    let luma = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = -0.168736 * r - 0.331264 * g + 0.5 * b + CHROMA_OFFSET;
    let cr = 0.5 * r - 0.418688 * g - 0.081312 * b + CHROMA_OFFSET;
    [luma, cb, cr]
}

/// Converts (Y, Cb, Cr) back to a pixel.
///
/// Cb and Cr must carry the same +128 centering that [`rgb_to_ycbcr`] produces.
/// Each channel is rounded to the nearest integer and clamped to [0, 255].
pub fn ycbcr_to_rgb(luma: f64, cb: f64, cr: f64) -> Pixel {
    let cb = cb - CHROMA_OFFSET;
    let cr = cr - CHROMA_OFFSET;

    let r = luma + 1.402 * cr;
    let g = luma - 0.344136 * cb - 0.714136 * cr;
    let b = luma + 1.772 * cb;
    Pixel::new(clamp_sample(r), clamp_sample(g), clamp_sample(b))
}

pub fn clamp_sample(value: f64) -> u8 {
    value.round().clamp(0.0, MAX_SAMPLE_VALUE) as u8
}

/// Centers a sample on zero for the transform.
pub fn level_shift(value: f64) -> f64 {
    value - LEVEL_SHIFT
}

/// Reverses [`level_shift`].
pub fn level_unshift(value: f64) -> f64 {
    value + LEVEL_SHIFT
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gray_has_neutral_chroma() {
        let [luma, cb, cr] = rgb_to_ycbcr(Pixel::new(128, 128, 128));
        assert_abs_diff_eq!(luma, 128.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cb, 128.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cr, 128.0, epsilon = 1e-9);
    }

    #[test]
    fn test_primaries() {
        let [luma, cb, cr] = rgb_to_ycbcr(Pixel::new(255, 0, 0));
        assert_abs_diff_eq!(luma, 76.245, epsilon = 1e-9);
        assert!(cb < 128.0);
        assert_abs_diff_eq!(cr, 255.5, epsilon = 1e-9);
    }

    #[test]
    fn test_round_trip_all_colors() {
        // Every 8-bit triple with a stride that still reaches both ends of the range.
        let levels: Vec<u8> = (0..=255u16).step_by(3).map(|v| v as u8).chain(std::iter::once(255)).collect();
        for &r in &levels {
            for &g in &levels {
                for &b in &levels {
                    let source = Pixel::new(r, g, b);
                    let [luma, cb, cr] = rgb_to_ycbcr(source);
                    let decoded = ycbcr_to_rgb(luma, cb, cr);
                    assert!((decoded.r as i32 - r as i32).abs() <= 1, "{:?} -> {:?}", source, decoded);
                    assert!((decoded.g as i32 - g as i32).abs() <= 1, "{:?} -> {:?}", source, decoded);
                    assert!((decoded.b as i32 - b as i32).abs() <= 1, "{:?} -> {:?}", source, decoded);
                }
            }
        }
    }

    #[test]
    fn test_level_shift_symmetric() {
        for value in [0.0, 127.5, 128.0, 255.0] {
            assert_eq!(level_unshift(level_shift(value)), value);
        }
        assert_eq!(level_shift(128.0), 0.0);
    }

    #[test]
    fn test_clamp_sample() {
        assert_eq!(clamp_sample(-3.2), 0);
        assert_eq!(clamp_sample(254.5), 255);
        assert_eq!(clamp_sample(300.0), 255);
        assert_eq!(clamp_sample(12.49), 12);
    }
}
