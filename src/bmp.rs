//! 24-bit truecolor BMP reading and writing.
//!
//! Pixel rows are stored bottom-up (positive height) or top-down (negative
//! height), three bytes per pixel in B, G, R order, each row padded with zero
//! bytes to a multiple of four. [`PixelGrid`] always holds the top row first.

use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::Dimensions;
use crate::constants::{
    BMP_FILE_HEADER_SIZE, BMP_INFO_HEADER_SIZE, BMP_PIXEL_DATA_OFFSET, BMP_PIXELS_PER_METER, BMP_SIGNATURE,
};
use crate::error::CodecError;
use crate::pixel_grid::{Pixel, PixelGrid};

const BITS_PER_PIXEL: u16 = 24;
const COMPRESSION_NONE: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFileHeader {
    pub file_type: u16,
    pub file_size: u32,
    pub pixel_data_offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfoHeader {
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pixels_per_meter: i32,
    pub y_pixels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

impl BitmapInfoHeader {
    pub fn is_bottom_up(&self) -> bool {
        self.height > 0
    }

    fn dimensions(&self) -> Result<Dimensions, CodecError> {
        let invalid = || CodecError::InvalidDimensions {
            width: self.width as i64,
            height: self.height as i64,
        };
        if self.width <= 0 || self.height == 0 || self.height == i32::MIN {
            return Err(invalid());
        }
        let dimensions = Dimensions::new(self.width as u32, self.height.unsigned_abs());
        dimensions.validate().map_err(|_| invalid())?;
        Ok(dimensions)
    }
}

/// Bytes per stored row, including padding.
pub fn row_stride(width: usize) -> usize {
    (width * 3).div_ceil(4) * 4
}

/// A little-endian cursor over an in-memory BMP file.
pub struct BmpReader<'a> {
    source: &'a [u8],
    position: usize,
}

impl<'a> BmpReader<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self { source, position: 0 }
    }

    fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], CodecError> {
        let end = self.position + count;
        if end > self.source.len() {
            return Err(CodecError::Truncated {
                expected: end,
                found: self.source.len(),
            });
        }
        let bytes = &self.source[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_file_header(&mut self) -> Result<BitmapFileHeader, CodecError> {
        let file_type = self.read_u16()?;
        if file_type != BMP_SIGNATURE {
            return Err(CodecError::InvalidBitmapSignature);
        }
        let file_size = self.read_u32()?;
        let _reserved1 = self.read_u16()?;
        let _reserved2 = self.read_u16()?;
        let pixel_data_offset = self.read_u32()?;
        Ok(BitmapFileHeader {
            file_type,
            file_size,
            pixel_data_offset,
        })
    }

    pub fn read_info_header(&mut self) -> Result<BitmapInfoHeader, CodecError> {
        let header = BitmapInfoHeader {
            header_size: self.read_u32()?,
            width: self.read_i32()?,
            height: self.read_i32()?,
            planes: self.read_u16()?,
            bit_count: self.read_u16()?,
            compression: self.read_u32()?,
            image_size: self.read_u32()?,
            x_pixels_per_meter: self.read_i32()?,
            y_pixels_per_meter: self.read_i32()?,
            colors_used: self.read_u32()?,
            colors_important: self.read_u32()?,
        };
        if header.bit_count != BITS_PER_PIXEL {
            return Err(CodecError::UnsupportedBitDepth(header.bit_count));
        }
        if header.compression != COMPRESSION_NONE {
            return Err(CodecError::UnsupportedCompression(header.compression));
        }
        Ok(header)
    }

    /// Reads both headers and the pixel rows.
    pub fn read_image(&mut self) -> Result<PixelGrid, CodecError> {
        let file_header = self.read_file_header()?;
        let info_header = self.read_info_header()?;
        let dimensions = info_header.dimensions()?;
        if !info_header.is_bottom_up() {
            warn!("Bitmap is stored top-down");
        }

        let offset = file_header.pixel_data_offset as usize;
        if offset < self.position {
            return Err(CodecError::Truncated {
                expected: self.position,
                found: offset,
            });
        }
        self.read_bytes(offset - self.position)?;

        let width = dimensions.width as usize;
        let height = dimensions.height as usize;
        let stride = row_stride(width);
        let remaining = self.source.len() - self.position;
        let pixel_bytes = stride.checked_mul(height).ok_or(CodecError::Truncated {
            expected: usize::MAX,
            found: remaining,
        })?;
        if remaining < pixel_bytes {
            return Err(CodecError::Truncated {
                expected: self.position.saturating_add(pixel_bytes),
                found: self.source.len(),
            });
        }
        let mut grid = PixelGrid::new(dimensions)?;
        for stored_row in 0..height {
            let y = if info_header.is_bottom_up() {
                height - 1 - stored_row
            } else {
                stored_row
            };
            let row = self.read_bytes(stride)?;
            for x in 0..width {
                let bgr = &row[x * 3..x * 3 + 3];
                grid.set(x, y, Pixel::new(bgr[2], bgr[1], bgr[0]));
            }
        }
        Ok(grid)
    }
}

/// Serializes a grid as a bottom-up 24-bit BMP.
pub struct BmpWriter {
    destination: Vec<u8>,
}

impl Default for BmpWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BmpWriter {
    pub fn new() -> Self {
        Self {
            destination: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.destination.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destination.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.destination
    }

    pub fn write_u16(&mut self, value: u16) {
        self.destination.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.destination.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.destination.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_image(&mut self, grid: &PixelGrid) -> Result<(), CodecError> {
        let width = grid.width();
        let height = grid.height();
        let stride = row_stride(width);
        let data_size = u32::try_from(stride * height).map_err(|_| CodecError::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        })?;

        // BITMAPFILEHEADER
        self.write_u16(BMP_SIGNATURE);
        self.write_u32(BMP_PIXEL_DATA_OFFSET + data_size);
        self.write_u16(0);
        self.write_u16(0);
        self.write_u32(BMP_PIXEL_DATA_OFFSET);

        // BITMAPINFOHEADER
        self.write_u32(BMP_INFO_HEADER_SIZE as u32);
        self.write_i32(width as i32);
        self.write_i32(height as i32);
        self.write_u16(1);
        self.write_u16(BITS_PER_PIXEL);
        self.write_u32(COMPRESSION_NONE);
        self.write_u32(data_size);
        self.write_i32(BMP_PIXELS_PER_METER);
        self.write_i32(BMP_PIXELS_PER_METER);
        self.write_u32(0);
        self.write_u32(0);
        debug_assert_eq!(self.len(), BMP_FILE_HEADER_SIZE + BMP_INFO_HEADER_SIZE);

        let padding = stride - width * 3;
        for y in (0..height).rev() {
            for pixel in grid.row(y) {
                self.destination.extend_from_slice(&[pixel.b, pixel.g, pixel.r]);
            }
            self.destination.extend(std::iter::repeat_n(0u8, padding));
        }
        Ok(())
    }
}

pub fn read_bmp(path: &Path) -> Result<PixelGrid, CodecError> {
    let data = fs::read(path).map_err(|e| CodecError::io(path, e))?;
    let grid = BmpReader::new(&data).read_image()?;
    debug!("Read {}x{} bitmap from {}", grid.width(), grid.height(), path.display());
    Ok(grid)
}

pub fn write_bmp(path: &Path, grid: &PixelGrid) -> Result<(), CodecError> {
    let mut writer = BmpWriter::new();
    writer.write_image(grid)?;
    fs::write(path, writer.into_bytes()).map_err(|e| CodecError::io(path, e))?;
    debug!("Wrote {}x{} bitmap to {}", grid.width(), grid.height(), path.display());
    Ok(())
}
