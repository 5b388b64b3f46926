//! Pipeline selection and the validated encode/decode jobs that run them.
//!
//! Method numbers follow the historical tool pair:
//!
//! - `0`: raw channel passthrough, encoder and decoder.
//! - `1` / `2`: DCT + quantization. The encoder was invoked as method 1 and the
//!   matching decoder as method 2; both numbers select [`Method::Quantized`].
//! - `3`: DCT + quantization + DC differential and AC run-length tokens.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::Dimensions;
use crate::artifacts::{self, ArtifactSet};
use crate::bmp::{read_bmp, write_bmp};
use crate::codec::{BlockDecoder, BlockEncoder, Channel};
use crate::error::CodecError;
use crate::psnr::psnr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Method {
    Raw = 0,
    #[num_enum(alternatives = [2])]
    Quantized = 1,
    Entropy = 3,
}

impl Method {
    pub fn from_number(number: u8) -> Result<Self, CodecError> {
        Self::try_from(number).map_err(|_| CodecError::UnknownMethod(number))
    }

    pub fn name(self) -> &'static str {
        match self {
            Method::Raw => "raw",
            Method::Quantized => "quantized",
            Method::Entropy => "entropy",
        }
    }

    /// Artifacts a decode run of this method reads.
    pub fn decode_inputs(self, set: &ArtifactSet) -> Vec<PathBuf> {
        let mut paths = vec![set.dimensions()];
        match self {
            Method::Raw => paths.extend((0..3).map(|i| set.raw_plane(i))),
            Method::Quantized => {
                for channel in Channel::ALL {
                    paths.push(set.quant_table(channel));
                    paths.push(set.coefficients(channel));
                }
            }
            Method::Entropy => {
                for channel in Channel::ALL {
                    paths.push(set.dc(channel));
                    paths.push(set.ac(channel));
                }
            }
        }
        paths
    }
}

impl FromStr for Method {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number: u8 = s
            .trim()
            .parse()
            .map_err(|_| CodecError::malformed("method", format!("{:?} is not a method number", s)))?;
        Self::from_number(number)
    }
}

/// A validated request to encode one image into an artifact directory.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub method: Method,
    pub input: PathBuf,
    pub artifacts: ArtifactSet,
}

impl EncodeJob {
    /// Checks the input exists and creates the artifact directory.
    pub fn new(method: Method, input: impl Into<PathBuf>, artifact_dir: impl Into<PathBuf>) -> Result<Self, CodecError> {
        let input = input.into();
        if !input.is_file() {
            return Err(CodecError::MissingInput(input));
        }
        let artifacts = ArtifactSet::new(artifact_dir);
        fs::create_dir_all(artifacts.dir()).map_err(|e| CodecError::io(artifacts.dir(), e))?;
        Ok(Self {
            method,
            input,
            artifacts,
        })
    }

    pub fn run(&self) -> Result<Dimensions, CodecError> {
        let grid = read_bmp(&self.input)?;
        let dimensions = grid.dimensions();
        info!(
            "Encoding {} ({}x{}) with the {} method",
            self.input.display(),
            dimensions.width,
            dimensions.height,
            self.method.name()
        );

        let encoder = BlockEncoder::new();
        match self.method {
            Method::Raw => artifacts::write_raw_channels(&self.artifacts, &encoder.encode_raw(&grid))?,
            Method::Quantized => {
                let tables = Channel::ALL.map(|channel| encoder.table(channel));
                artifacts::write_quantized(&self.artifacts, &encoder.encode_quantized(&grid), tables)?;
            }
            Method::Entropy => artifacts::write_entropy(&self.artifacts, &encoder.encode_entropy(&grid))?,
        }
        Ok(dimensions)
    }
}

/// Outcome of a decode run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeReport {
    pub dimensions: Dimensions,
    pub psnr: Option<f64>,
}

/// A validated request to rebuild an image from an artifact directory.
#[derive(Debug, Clone)]
pub struct DecodeJob {
    pub method: Method,
    pub artifacts: ArtifactSet,
    pub output: PathBuf,
    pub original: Option<PathBuf>,
}

impl DecodeJob {
    /// Checks every artifact the method reads, and the reference image if given, exists.
    pub fn new(
        method: Method,
        artifact_dir: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        original: Option<PathBuf>,
    ) -> Result<Self, CodecError> {
        let artifacts = ArtifactSet::new(artifact_dir);
        if let Some(missing) = method.decode_inputs(&artifacts).into_iter().find(|path| !path.is_file()) {
            return Err(CodecError::MissingArtifact(missing));
        }
        if let Some(original) = original.as_deref().filter(|path| !path.is_file()) {
            return Err(CodecError::MissingInput(original.to_path_buf()));
        }
        Ok(Self {
            method,
            artifacts,
            output: output.into(),
            original,
        })
    }

    pub fn run(&self) -> Result<DecodeReport, CodecError> {
        info!(
            "Decoding {} artifacts from {}",
            self.method.name(),
            self.artifacts.dir().display()
        );
        let grid = match self.method {
            Method::Raw => BlockDecoder::new().decode_raw(&artifacts::read_raw_channels(&self.artifacts)?)?,
            Method::Quantized => {
                let (image, tables) = artifacts::read_quantized(&self.artifacts)?;
                BlockDecoder::with_tables(tables).decode_quantized(&image)?
            }
            Method::Entropy => BlockDecoder::new().decode_entropy(&artifacts::read_entropy(&self.artifacts)?)?,
        };
        write_bmp(&self.output, &grid)?;

        let psnr = match &self.original {
            Some(original) => Some(self.report_psnr(original, &grid)?),
            None => None,
        };
        Ok(DecodeReport {
            dimensions: grid.dimensions(),
            psnr,
        })
    }

    fn report_psnr(&self, original: &Path, grid: &crate::PixelGrid) -> Result<f64, CodecError> {
        let reference = read_bmp(original)?;
        let value = psnr(&reference, grid)?;
        artifacts::write_psnr(&self.artifacts.psnr(), value)?;
        info!("PSNR against {}: {:.2} dB", original.display(), value);
        Ok(value)
    }
}
