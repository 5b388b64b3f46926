//! DC differential (DPCM) and AC run-length coding of zigzag-ordered blocks.
//!
//! The token stream is textual and uncompressed: each AC token is written as
//! `(run,value)`, `(0,0)` ends a block and `(15,0)` skips sixteen zeros.

use std::fmt;
use std::str::FromStr;

use crate::codec::{Block, Channel};
use crate::constants::{BLOCK_DIM, MAX_RUN_LENGTH, ZERO_RUN_SKIP};
use crate::error::CodecError;

/// One AC token: `run` zeros followed by `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLength {
    pub run: u8,
    pub value: i16,
}

impl RunLength {
    pub const END_OF_BLOCK: RunLength = RunLength { run: 0, value: 0 };
    pub const ZERO_RUN: RunLength = RunLength {
        run: MAX_RUN_LENGTH,
        value: 0,
    };

    pub const fn new(run: u8, value: i16) -> Self {
        Self { run, value }
    }

    pub fn is_end_of_block(&self) -> bool {
        *self == Self::END_OF_BLOCK
    }

    pub fn is_zero_run(&self) -> bool {
        *self == Self::ZERO_RUN
    }
}

impl fmt::Display for RunLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.run, self.value)
    }
}

impl FromStr for RunLength {
    type Err = CodecError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let malformed = || CodecError::malformed("AC run-length", format!("bad token {:?}", token));
        let inner = token
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .ok_or_else(malformed)?;
        let (run, value) = inner.split_once(',').ok_or_else(malformed)?;
        let run: u8 = run.trim().parse().map_err(|_| malformed())?;
        let value: i16 = value.trim().parse().map_err(|_| malformed())?;
        if run > MAX_RUN_LENGTH {
            return Err(malformed());
        }
        Ok(Self { run, value })
    }
}

/// Running previous-DC value per channel. Each image starts from a fresh predictor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DcPredictor {
    previous: [i32; 3],
}

impl DcPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `dc - previous` and remembers `dc`.
    pub fn encode(&mut self, channel: Channel, dc: i16) -> i32 {
        let previous = &mut self.previous[channel.index()];
        let diff = dc as i32 - *previous;
        *previous = dc as i32;
        diff
    }

    /// Returns `previous + diff` and remembers it.
    pub fn decode(&mut self, channel: Channel, diff: i32) -> Result<i16, CodecError> {
        let previous = &mut self.previous[channel.index()];
        let dc = previous
            .checked_add(diff)
            .and_then(|dc| i16::try_from(dc).ok())
            .ok_or_else(|| CodecError::malformed("DC differential", format!("DC value out of range after diff {}", diff)))?;
        *previous = dc as i32;
        Ok(dc)
    }
}

/// Differentially encodes one channel's DC values, starting from zero.
pub fn encode_dc_sequence(dc_values: &[i16]) -> Vec<i32> {
    let mut predictor = DcPredictor::new();
    dc_values.iter().map(|&dc| predictor.encode(Channel::Y, dc)).collect()
}

/// Cumulative sum of differentials, starting from zero.
pub fn decode_dc_sequence(diffs: &[i32]) -> Result<Vec<i16>, CodecError> {
    let mut predictor = DcPredictor::new();
    diffs.iter().map(|&diff| predictor.decode(Channel::Y, diff)).collect()
}

/// Run-length encodes positions 1..63 of a zigzag-ordered block, always ending with `(0,0)`.
pub fn encode_ac(sequence: &Block<i16>) -> Vec<RunLength> {
    let mut tokens = Vec::new();
    let mut run = 0usize;
    for &ac_val in &sequence[1..] {
        if ac_val == 0 {
            run += 1;
            continue;
        }
        while run > MAX_RUN_LENGTH as usize {
            tokens.push(RunLength::ZERO_RUN);
            run -= ZERO_RUN_SKIP;
        }
        tokens.push(RunLength::new(run as u8, ac_val));
        run = 0;
    }
    tokens.push(RunLength::END_OF_BLOCK);
    tokens
}

/// Decodes AC tokens into positions 1..63 of `sequence`, consuming up to and including `(0,0)`.
///
/// Positions that receive no value are left at zero; the DC slot is untouched.
pub fn decode_ac<I>(tokens: &mut I, sequence: &mut Block<i16>) -> Result<(), CodecError>
where
    I: Iterator<Item = RunLength>,
{
    sequence[1..].fill(0);
    let mut k = 1;
    for token in tokens.by_ref() {
        if token.is_end_of_block() {
            return Ok(());
        }
        if token.is_zero_run() {
            k += ZERO_RUN_SKIP;
            if k > BLOCK_DIM {
                return Err(CodecError::CoefficientOverrun { position: k });
            }
            continue;
        }
        k += token.run as usize;
        if k >= BLOCK_DIM {
            return Err(CodecError::CoefficientOverrun { position: k });
        }
        sequence[k] = token.value;
        k += 1;
    }
    Err(CodecError::MissingEndOfBlock)
}

/// Formats one block's tokens as a line, each token followed by a space.
pub fn format_tokens(tokens: &[RunLength]) -> String {
    let mut line = String::with_capacity(tokens.len() * 6);
    for token in tokens {
        line.push_str(&token.to_string());
        line.push(' ');
    }
    line
}

/// Parses whitespace-separated tokens.
pub fn parse_tokens(line: &str) -> Result<Vec<RunLength>, CodecError> {
    line.split_whitespace().map(str::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_with(values: &[(usize, i16)]) -> Block<i16> {
        let mut block = [0i16; 64];
        for &(k, v) in values {
            block[k] = v;
        }
        block
    }

    fn round_trip(block: &Block<i16>) -> Block<i16> {
        let tokens = encode_ac(block);
        let mut decoded = [0i16; 64];
        decoded[0] = block[0];
        decode_ac(&mut tokens.into_iter(), &mut decoded).unwrap();
        decoded
    }

    #[test]
    fn test_all_zero_block_is_just_eob() {
        assert_eq!(encode_ac(&[0i16; 64]), vec![RunLength::END_OF_BLOCK]);
    }

    #[test]
    fn test_eob_emitted_without_trailing_run() {
        let block = block_with(&[(63, 4)]);
        let tokens = encode_ac(&block);
        // 62 zeros: three 16-zero escapes then a run of 14.
        assert_eq!(
            tokens,
            vec![
                RunLength::ZERO_RUN,
                RunLength::ZERO_RUN,
                RunLength::ZERO_RUN,
                RunLength::new(14, 4),
                RunLength::END_OF_BLOCK,
            ]
        );
        assert_eq!(round_trip(&block), block);
    }

    #[test]
    fn test_run_of_exactly_sixteen() {
        let block = block_with(&[(1, -3), (18, 7)]);
        let tokens = encode_ac(&block);
        assert_eq!(
            tokens,
            vec![RunLength::new(0, -3), RunLength::ZERO_RUN, RunLength::new(0, 7), RunLength::END_OF_BLOCK]
        );
        assert_eq!(round_trip(&block), block);
    }

    #[test]
    fn test_dense_block_round_trip() {
        let block: Block<i16> = std::array::from_fn(|i| if i % 3 == 0 { 0 } else { i as i16 - 30 });
        assert_eq!(round_trip(&block), block);
    }

    #[test]
    fn test_decode_stops_at_eob() {
        let tokens = vec![RunLength::new(2, 5), RunLength::END_OF_BLOCK, RunLength::new(0, 9), RunLength::END_OF_BLOCK];
        let mut iter = tokens.into_iter();
        let mut first = [0i16; 64];
        decode_ac(&mut iter, &mut first).unwrap();
        assert_eq!(first, block_with(&[(3, 5)]));

        let mut second = [0i16; 64];
        decode_ac(&mut iter, &mut second).unwrap();
        assert_eq!(second, block_with(&[(1, 9)]));
    }

    #[test]
    fn test_decode_missing_eob() {
        let mut iter = vec![RunLength::new(0, 1)].into_iter();
        let mut block = [0i16; 64];
        assert!(matches!(decode_ac(&mut iter, &mut block), Err(CodecError::MissingEndOfBlock)));
    }

    #[test]
    fn test_decode_overrun() {
        let mut iter = vec![RunLength::ZERO_RUN; 4].into_iter();
        let mut block = [0i16; 64];
        assert!(matches!(
            decode_ac(&mut iter, &mut block),
            Err(CodecError::CoefficientOverrun { .. })
        ));

        let mut iter = vec![RunLength::ZERO_RUN, RunLength::ZERO_RUN, RunLength::ZERO_RUN, RunLength::new(15, 2)].into_iter();
        assert!(matches!(
            decode_ac(&mut iter, &mut block),
            Err(CodecError::CoefficientOverrun { position: 64 })
        ));
    }

    #[test]
    fn test_token_text_round_trip() {
        let tokens = vec![RunLength::new(0, -12), RunLength::ZERO_RUN, RunLength::new(3, 1), RunLength::END_OF_BLOCK];
        let line = format_tokens(&tokens);
        assert_eq!(line, "(0,-12) (15,0) (3,1) (0,0) ");
        assert_eq!(parse_tokens(&line).unwrap(), tokens);
    }

    #[test]
    fn test_bad_tokens_rejected() {
        for token in ["(1;2)", "1,2", "(16,1)", "(a,1)", "(1,99999)"] {
            assert!(token.parse::<RunLength>().is_err(), "{} should not parse", token);
        }
    }

    #[test]
    fn test_dc_predictor_per_channel() {
        let mut predictor = DcPredictor::new();
        assert_eq!(predictor.encode(Channel::Y, 10), 10);
        assert_eq!(predictor.encode(Channel::Cb, -4), -4);
        assert_eq!(predictor.encode(Channel::Y, 7), -3);
        assert_eq!(predictor.encode(Channel::Cr, 0), 0);
        assert_eq!(predictor.encode(Channel::Cb, -4), 0);

        // A new image starts the chain from zero again.
        let mut next_image = DcPredictor::new();
        assert_eq!(next_image.encode(Channel::Y, 7), 7);
    }

    #[test]
    fn test_dc_sequence_round_trip() {
        let values = [0i16, 5, -20, i16::MAX, i16::MIN, 3, 3];
        let diffs = encode_dc_sequence(&values);
        assert_eq!(diffs[1], 5);
        assert_eq!(decode_dc_sequence(&diffs).unwrap(), values);
    }

    #[test]
    fn test_dc_decode_out_of_range() {
        assert!(decode_dc_sequence(&[i16::MAX as i32, 1]).is_err());
    }
}
