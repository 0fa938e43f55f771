//! Grayscale frames and binary masks backed by PNG files.

use std::io::Cursor;
use std::path::Path;

use crate::error::CollaboratorError;

/// A single-channel frame of up to 16-bit intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayFrame {
    width: u32,
    height: u32,
    pixels: Vec<u16>,
}

impl GrayFrame {
    /// Returns `None` if `pixels` does not hold `width * height` values.
    pub fn new(width: u32, height: u32, pixels: Vec<u16>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    /// Read a grayscale PNG (1-16 bit, alpha ignored)
    pub fn open_png(path: &Path) -> Result<Self, CollaboratorError> {
        let bytes = std::fs::read(path).map_err(|e| CollaboratorError::io(path, e))?;
        Self::decode_png(&bytes, path)
    }

    /// Decode PNG bytes; `path` is only used for error reporting
    pub fn decode_png(bytes: &[u8], path: &Path) -> Result<Self, CollaboratorError> {
        let decode_err = |e: png::DecodingError| CollaboratorError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut decoder = png::Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(png::Transformations::EXPAND);
        let mut reader = decoder.read_info().map_err(decode_err)?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).map_err(decode_err)?;
        let data = &buf[..info.buffer_size()];

        let (color_type, bit_depth) = reader.output_color_type();
        let pixels: Vec<u16> = match (color_type, bit_depth) {
            (png::ColorType::Grayscale, png::BitDepth::Eight) => {
                data.iter().map(|&v| u16::from(v)).collect()
            }
            (png::ColorType::Grayscale, png::BitDepth::Sixteen) => data
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect(),
            (png::ColorType::GrayscaleAlpha, png::BitDepth::Eight) => {
                data.chunks_exact(2).map(|c| u16::from(c[0])).collect()
            }
            (png::ColorType::GrayscaleAlpha, png::BitDepth::Sixteen) => data
                .chunks_exact(4)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect(),
            (color_type, bit_depth) => {
                return Err(CollaboratorError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    detail: format!("{color_type:?} at {bit_depth:?}, expected grayscale"),
                })
            }
        };

        Self::new(info.width, info.height, pixels).ok_or_else(|| CollaboratorError::Decode {
            path: path.to_path_buf(),
            message: "pixel data does not match image dimensions".to_string(),
        })
    }

    /// Encode as grayscale PNG: 8-bit when every value fits, 16-bit otherwise
    pub fn encode_png(&self) -> Result<Vec<u8>, png::EncodingError> {
        let wide = self.pixels.iter().any(|&v| v > u16::from(u8::MAX));
        let (depth, data) = if wide {
            let data: Vec<u8> = self.pixels.iter().flat_map(|v| v.to_be_bytes()).collect();
            (png::BitDepth::Sixteen, data)
        } else {
            let data: Vec<u8> = self.pixels.iter().map(|&v| v as u8).collect();
            (png::BitDepth::Eight, data)
        };

        let mut buf = Cursor::new(Vec::new());
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width, self.height);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(depth);
            encoder.set_compression(png::Compression::Fast);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&data)?;
        }
        Ok(buf.into_inner())
    }

    /// Encode and write to `path`
    pub fn save_png(&self, path: &Path) -> Result<(), CollaboratorError> {
        let bytes = self
            .encode_png()
            .map_err(|e| CollaboratorError::Encode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        std::fs::write(path, bytes).map_err(|e| CollaboratorError::io(path, e))
    }
}

/// Binary object mask: `true` marks foreground (detected cells).
#[derive(Debug, Clone, PartialEq)]
pub struct ForegroundMask {
    width: u32,
    height: u32,
    foreground: Vec<bool>,
}

impl ForegroundMask {
    /// Any nonzero pixel is foreground
    pub fn from_frame(frame: &GrayFrame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            foreground: frame.pixels.iter().map(|&v| v != 0).collect(),
        }
    }

    pub fn open_png(path: &Path) -> Result<Self, CollaboratorError> {
        GrayFrame::open_png(path).map(|frame| Self::from_frame(&frame))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_foreground(&self, index: usize) -> bool {
        self.foreground[index]
    }

    /// Background region as a 0/255 frame, for inspection
    pub fn background_frame(&self) -> GrayFrame {
        GrayFrame {
            width: self.width,
            height: self.height,
            pixels: self
                .foreground
                .iter()
                .map(|&fg| if fg { 0 } else { 255 })
                .collect(),
        }
    }
}
