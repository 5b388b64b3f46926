//! Persistence of the intermediate artifacts exchanged between encode and decode runs.
//!
//! Every artifact lives in one directory under a fixed file name:
//!
//! | Artifact               | Files                                  | Format                         |
//! |------------------------|----------------------------------------|--------------------------------|
//! | dimensions             | `dim.txt`                              | `width height`                 |
//! | raw channels           | `R.txt`, `G.txt`, `B.txt`              | one text row per image row     |
//! | quantization tables    | `Qt_Y.txt`, `Qt_Cb.txt`, `Qt_Cr.txt`   | 8 rows of 8 integers           |
//! | quantized coefficients | `qF_Y.raw`, `qF_Cb.raw`, `qF_Cr.raw`   | 64 x i16 LE per block, zigzag  |
//! | quantization error     | `eF_Y.raw`, `eF_Cb.raw`, `eF_Cr.raw`   | 64 x f32 LE per block, zigzag  |
//! | DC differentials       | `DC_Y.txt`, `DC_Cb.txt`, `DC_Cr.txt`   | one integer per block          |
//! | AC run-lengths         | `AC_Y.txt`, `AC_Cb.txt`, `AC_Cr.txt`   | one line of tokens per block   |
//! | fidelity report        | `psnr.txt`                             | PSNR in dB, two decimals       |

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::Dimensions;
use crate::codec::entropy::{RunLength, format_tokens, parse_tokens};
use crate::codec::quantization::{QuantizationTable, table_from_values};
use crate::codec::{Block, Channel, EntropyImage, QuantizedImage, RawChannels};
use crate::constants::{BLOCK_DIM, BLOCK_SIZE};
use crate::error::CodecError;

const RAW_CHANNEL_FILES: [&str; 3] = ["R.txt", "G.txt", "B.txt"];
const COEFFICIENT_BLOCK_BYTES: usize = BLOCK_DIM * 2;
const ERROR_BLOCK_BYTES: usize = BLOCK_DIM * 4;

/// File locations of every artifact inside one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    dir: PathBuf,
}

impl ArtifactSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dimensions(&self) -> PathBuf {
        self.dir.join("dim.txt")
    }

    /// Raw plane file for R (0), G (1) or B (2).
    pub fn raw_plane(&self, index: usize) -> PathBuf {
        self.dir.join(RAW_CHANNEL_FILES[index])
    }

    pub fn quant_table(&self, channel: Channel) -> PathBuf {
        self.dir.join(format!("Qt_{}.txt", channel.name()))
    }

    pub fn coefficients(&self, channel: Channel) -> PathBuf {
        self.dir.join(format!("qF_{}.raw", channel.name()))
    }

    pub fn errors(&self, channel: Channel) -> PathBuf {
        self.dir.join(format!("eF_{}.raw", channel.name()))
    }

    pub fn dc(&self, channel: Channel) -> PathBuf {
        self.dir.join(format!("DC_{}.txt", channel.name()))
    }

    pub fn ac(&self, channel: Channel) -> PathBuf {
        self.dir.join(format!("AC_{}.txt", channel.name()))
    }

    pub fn psnr(&self) -> PathBuf {
        self.dir.join("psnr.txt")
    }
}

fn read_text(path: &Path) -> Result<String, CodecError> {
    fs::read_to_string(path).map_err(|e| CodecError::io(path, e))
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), CodecError> {
    fs::write(path, contents).map_err(|e| CodecError::io(path, e))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn parse_integers(text: &str, artifact: &'static str) -> Result<Vec<i64>, CodecError> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|_| CodecError::malformed(artifact, format!("{:?} is not an integer", token)))
        })
        .collect()
}

pub fn write_dimensions(path: &Path, dimensions: Dimensions) -> Result<(), CodecError> {
    write_file(path, format!("{} {}\n", dimensions.width, dimensions.height))
}

pub fn read_dimensions(path: &Path) -> Result<Dimensions, CodecError> {
    let values = parse_integers(&read_text(path)?, "dimensions")?;
    let &[width, height] = values.as_slice() else {
        return Err(CodecError::malformed(
            "dimensions",
            format!("expected width and height, found {} values", values.len()),
        ));
    };
    let invalid = || CodecError::InvalidDimensions { width, height };
    let dimensions = Dimensions::new(
        u32::try_from(width).map_err(|_| invalid())?,
        u32::try_from(height).map_err(|_| invalid())?,
    );
    dimensions.validate().map_err(|_| invalid())?;
    Ok(dimensions)
}

pub fn write_raw_plane(path: &Path, plane: &[u8], dimensions: Dimensions) -> Result<(), CodecError> {
    let width = dimensions.width as usize;
    let mut text = String::with_capacity(plane.len() * 4);
    for row in plane.chunks(width) {
        for (x, value) in row.iter().enumerate() {
            if x > 0 {
                text.push(' ');
            }
            let _ = write!(text, "{}", value);
        }
        text.push('\n');
    }
    write_file(path, text)
}

pub fn read_raw_plane(path: &Path, dimensions: Dimensions) -> Result<Vec<u8>, CodecError> {
    let values = parse_integers(&read_text(path)?, "raw channel")?;
    let expected = dimensions.pixel_count();
    if values.len() < expected {
        return Err(CodecError::Truncated {
            expected,
            found: values.len(),
        });
    }
    values[..expected]
        .iter()
        .map(|&v| u8::try_from(v).map_err(|_| CodecError::malformed("raw channel", format!("sample {} out of range", v))))
        .collect()
}

pub fn write_quant_table(path: &Path, table: &QuantizationTable) -> Result<(), CodecError> {
    let mut text = String::new();
    for row in table.chunks(BLOCK_SIZE) {
        let line: Vec<String> = row.iter().map(u16::to_string).collect();
        text.push_str(&line.join(" "));
        text.push('\n');
    }
    write_file(path, text)
}

pub fn read_quant_table(path: &Path) -> Result<QuantizationTable, CodecError> {
    table_from_values(&parse_integers(&read_text(path)?, "quantization table")?)
}

pub fn write_coefficients(path: &Path, blocks: &[Block<i16>]) -> Result<(), CodecError> {
    let mut bytes = Vec::with_capacity(blocks.len() * COEFFICIENT_BLOCK_BYTES);
    for block in blocks {
        for value in block {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    write_file(path, bytes)
}

pub fn read_coefficients(path: &Path, block_count: usize) -> Result<Vec<Block<i16>>, CodecError> {
    let bytes = fs::read(path).map_err(|e| CodecError::io(path, e))?;
    let expected = block_count * COEFFICIENT_BLOCK_BYTES;
    if bytes.len() < expected {
        return Err(CodecError::Truncated {
            expected,
            found: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(CodecError::malformed(
            "coefficient",
            format!("{} trailing bytes after {} blocks", bytes.len() - expected, block_count),
        ));
    }
    Ok(bytes
        .chunks_exact(COEFFICIENT_BLOCK_BYTES)
        .map(|chunk| {
            let mut block = [0i16; BLOCK_DIM];
            for (value, pair) in block.iter_mut().zip(chunk.chunks_exact(2)) {
                *value = i16::from_le_bytes([pair[0], pair[1]]);
            }
            block
        })
        .collect())
}

pub fn write_errors(path: &Path, blocks: &[Block<f32>]) -> Result<(), CodecError> {
    let mut bytes = Vec::with_capacity(blocks.len() * ERROR_BLOCK_BYTES);
    for block in blocks {
        for value in block {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    write_file(path, bytes)
}

pub fn read_errors(path: &Path) -> Result<Vec<Block<f32>>, CodecError> {
    let bytes = fs::read(path).map_err(|e| CodecError::io(path, e))?;
    if bytes.len() % ERROR_BLOCK_BYTES != 0 {
        return Err(CodecError::malformed(
            "quantization error",
            format!("{} bytes is not a whole number of blocks", bytes.len()),
        ));
    }
    Ok(bytes
        .chunks_exact(ERROR_BLOCK_BYTES)
        .map(|chunk| {
            let mut block = [0.0f32; BLOCK_DIM];
            for (value, quad) in block.iter_mut().zip(chunk.chunks_exact(4)) {
                *value = f32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]);
            }
            block
        })
        .collect())
}

pub fn write_dc(path: &Path, diffs: &[i32]) -> Result<(), CodecError> {
    let mut text = String::with_capacity(diffs.len() * 4);
    for diff in diffs {
        let _ = write!(text, "{} ", diff);
    }
    text.push('\n');
    write_file(path, text)
}

pub fn read_dc(path: &Path) -> Result<Vec<i32>, CodecError> {
    parse_integers(&read_text(path)?, "DC differential")?
        .into_iter()
        .map(|v| i32::try_from(v).map_err(|_| CodecError::malformed("DC differential", format!("{} out of range", v))))
        .collect()
}

pub fn write_ac(path: &Path, blocks: &[Vec<RunLength>]) -> Result<(), CodecError> {
    let mut text = String::new();
    for tokens in blocks {
        text.push_str(&format_tokens(tokens));
        text.push('\n');
    }
    write_file(path, text)
}

/// Reads one token line per block; blank lines are ignored.
pub fn read_ac(path: &Path) -> Result<Vec<Vec<RunLength>>, CodecError> {
    read_text(path)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_tokens)
        .collect()
}

pub fn write_psnr(path: &Path, psnr: f64) -> Result<(), CodecError> {
    write_file(path, format!("{:.2}\n", psnr))
}

pub fn write_raw_channels(set: &ArtifactSet, raw: &RawChannels) -> Result<(), CodecError> {
    for (index, plane) in raw.planes.iter().enumerate() {
        write_raw_plane(&set.raw_plane(index), plane, raw.dimensions)?;
    }
    write_dimensions(&set.dimensions(), raw.dimensions)
}

pub fn read_raw_channels(set: &ArtifactSet) -> Result<RawChannels, CodecError> {
    let dimensions = read_dimensions(&set.dimensions())?;
    let planes = [
        read_raw_plane(&set.raw_plane(0), dimensions)?,
        read_raw_plane(&set.raw_plane(1), dimensions)?,
        read_raw_plane(&set.raw_plane(2), dimensions)?,
    ];
    Ok(RawChannels { dimensions, planes })
}

pub fn write_quantized(
    set: &ArtifactSet,
    image: &QuantizedImage,
    tables: [&QuantizationTable; 3],
) -> Result<(), CodecError> {
    for channel in Channel::ALL {
        write_quant_table(&set.quant_table(channel), tables[channel.index()])?;
    }
    write_dimensions(&set.dimensions(), image.dimensions)?;
    for channel in Channel::ALL {
        write_coefficients(&set.coefficients(channel), image.channel(channel))?;
        write_errors(&set.errors(channel), &image.errors[channel.index()])?;
    }
    Ok(())
}

/// Reads the coefficients together with the tables they were quantized with.
pub fn read_quantized(set: &ArtifactSet) -> Result<(QuantizedImage, [QuantizationTable; 3]), CodecError> {
    let tables = [
        read_quant_table(&set.quant_table(Channel::Y))?,
        read_quant_table(&set.quant_table(Channel::Cb))?,
        read_quant_table(&set.quant_table(Channel::Cr))?,
    ];
    let dimensions = read_dimensions(&set.dimensions())?;
    let block_count = dimensions.block_count();
    let coefficients = [
        read_coefficients(&set.coefficients(Channel::Y), block_count)?,
        read_coefficients(&set.coefficients(Channel::Cb), block_count)?,
        read_coefficients(&set.coefficients(Channel::Cr), block_count)?,
    ];
    let image = QuantizedImage {
        dimensions,
        coefficients,
        errors: std::array::from_fn(|_| Vec::new()),
    };
    Ok((image, tables))
}

pub fn write_entropy(set: &ArtifactSet, image: &EntropyImage) -> Result<(), CodecError> {
    for channel in Channel::ALL {
        write_dc(&set.dc(channel), &image.dc[channel.index()])?;
    }
    for channel in Channel::ALL {
        write_ac(&set.ac(channel), &image.ac[channel.index()])?;
    }
    write_dimensions(&set.dimensions(), image.dimensions)
}

pub fn read_entropy(set: &ArtifactSet) -> Result<EntropyImage, CodecError> {
    let dimensions = read_dimensions(&set.dimensions())?;
    let dc = [
        read_dc(&set.dc(Channel::Y))?,
        read_dc(&set.dc(Channel::Cb))?,
        read_dc(&set.dc(Channel::Cr))?,
    ];
    let ac = [
        read_ac(&set.ac(Channel::Y))?,
        read_ac(&set.ac(Channel::Cb))?,
        read_ac(&set.ac(Channel::Cr))?,
    ];
    Ok(EntropyImage { dimensions, dc, ac })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::quantization::STD_LUMINANCE_QUANT_TABLE;

    #[test]
    fn test_artifact_names() {
        let set = ArtifactSet::new("out");
        assert_eq!(set.dimensions(), Path::new("out/dim.txt"));
        assert_eq!(set.raw_plane(1), Path::new("out/G.txt"));
        assert_eq!(set.quant_table(Channel::Cb), Path::new("out/Qt_Cb.txt"));
        assert_eq!(set.coefficients(Channel::Y), Path::new("out/qF_Y.raw"));
        assert_eq!(set.errors(Channel::Cr), Path::new("out/eF_Cr.raw"));
        assert_eq!(set.dc(Channel::Y), Path::new("out/DC_Y.txt"));
        assert_eq!(set.ac(Channel::Cr), Path::new("out/AC_Cr.txt"));
    }

    #[test]
    fn test_dimensions_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dim.txt");
        write_dimensions(&path, Dimensions::new(10, 7)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "10 7\n");
        assert_eq!(read_dimensions(&path).unwrap(), Dimensions::new(10, 7));

        fs::write(&path, "10").unwrap();
        assert!(matches!(read_dimensions(&path), Err(CodecError::MalformedArtifact { .. })));
        fs::write(&path, "-4 3").unwrap();
        assert!(matches!(read_dimensions(&path), Err(CodecError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_raw_plane_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("R.txt");
        let dimensions = Dimensions::new(3, 2);
        write_raw_plane(&path, &[1, 2, 3, 250, 0, 9], dimensions).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1 2 3\n250 0 9\n");
        assert_eq!(read_raw_plane(&path, dimensions).unwrap(), vec![1, 2, 3, 250, 0, 9]);

        fs::write(&path, "1 2 3 4 5").unwrap();
        assert!(matches!(read_raw_plane(&path, dimensions), Err(CodecError::Truncated { .. })));
        fs::write(&path, "1 2 3 4 5 256").unwrap();
        assert!(matches!(read_raw_plane(&path, dimensions), Err(CodecError::MalformedArtifact { .. })));
    }

    #[test]
    fn test_quant_table_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Qt_Y.txt");
        write_quant_table(&path, &STD_LUMINANCE_QUANT_TABLE).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 8);
        assert_eq!(text.lines().next().unwrap(), "16 11 10 16 24 40 51 61");
        assert_eq!(read_quant_table(&path).unwrap(), STD_LUMINANCE_QUANT_TABLE);
    }

    #[test]
    fn test_coefficients_little_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qF_Y.raw");
        let mut block = [0i16; 64];
        block[0] = -2;
        block[1] = 0x0102;
        write_coefficients(&path, &[block, [7; 64]]).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 256);
        assert_eq!(&bytes[0..4], &[0xFE, 0xFF, 0x02, 0x01]);
        assert_eq!(read_coefficients(&path, 2).unwrap(), vec![block, [7; 64]]);
        assert!(matches!(read_coefficients(&path, 3), Err(CodecError::Truncated { .. })));
        assert!(matches!(read_coefficients(&path, 1), Err(CodecError::MalformedArtifact { .. })));
    }

    #[test]
    fn test_error_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eF_Y.raw");
        let block: Block<f32> = std::array::from_fn(|i| i as f32 * 0.25 - 8.0);
        write_errors(&path, &[block]).unwrap();
        assert_eq!(read_errors(&path).unwrap(), vec![block]);
    }

    #[test]
    fn test_dc_and_ac_text() {
        let dir = tempfile::tempdir().unwrap();
        let dc_path = dir.path().join("DC_Y.txt");
        write_dc(&dc_path, &[12, -3, 0]).unwrap();
        assert_eq!(fs::read_to_string(&dc_path).unwrap(), "12 -3 0 \n");
        assert_eq!(read_dc(&dc_path).unwrap(), vec![12, -3, 0]);

        let ac_path = dir.path().join("AC_Y.txt");
        let blocks = vec![
            vec![RunLength::new(0, 4), RunLength::END_OF_BLOCK],
            vec![RunLength::END_OF_BLOCK],
        ];
        write_ac(&ac_path, &blocks).unwrap();
        assert_eq!(fs::read_to_string(&ac_path).unwrap(), "(0,4) (0,0) \n(0,0) \n");
        assert_eq!(read_ac(&ac_path).unwrap(), blocks);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.txt");
        match read_dimensions(&path) {
            Err(CodecError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected I/O error, got {:?}", other),
        }
    }
}
