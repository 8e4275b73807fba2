//! Cover and inline image optimization.
//!
//! Images are bounded in width and re-encoded as JPEG, lowering the quality step by step
//! until the encoded size fits the budget or the quality floor is reached.

use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView};
use serde::Deserialize;
use spdlog::debug;

use crate::data_uri::DataUri;
use crate::error::OptimizeError;

pub const JPEG_MIME: &str = "image/jpeg";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    pub max_width: u32,
    pub max_bytes: usize,
    pub default_quality: f32,
    pub min_quality: f32,
    pub quality_step: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            max_width: 800,
            max_bytes: 300_000,
            default_quality: 0.7,
            min_quality: 0.3,
            quality_step: 0.1,
        }
    }
}

pub enum ImageInput {
    Bytes(Vec<u8>),
    DataUri(String),
}

impl From<Vec<u8>> for ImageInput {
    fn from(value: Vec<u8>) -> Self {
        ImageInput::Bytes(value)
    }
}

impl From<&str> for ImageInput {
    fn from(value: &str) -> Self {
        ImageInput::DataUri(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    quality_percent: u8,
    pub attempts: u32,
}

impl EncodedImage {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn quality(&self) -> f32 {
        self.quality_percent as f32 / 100.0
    }

    pub fn quality_percent(&self) -> u8 {
        self.quality_percent
    }

    pub fn within_budget(&self, max_bytes: usize) -> bool {
        self.size() <= max_bytes
    }

    pub fn to_data_uri(&self) -> String {
        DataUri::format(JPEG_MIME, &self.bytes)
    }
}

pub struct ImageOptimizer {
    config: OptimizerConfig,
}

fn to_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

impl ImageOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        ImageOptimizer { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(OptimizerConfig::default())
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn optimize(&self, input: ImageInput) -> Result<EncodedImage, OptimizeError> {
        let bytes = match input {
            ImageInput::Bytes(bytes) => bytes,
            ImageInput::DataUri(uri) => DataUri::parse(&uri)?.data,
        };

        let img = image::load_from_memory(&bytes)
            .map_err(|e| OptimizeError::Decode(e.to_string()))?;

        let (orig_w, orig_h) = img.dimensions();
        let (width, height) = self.bounded_dimensions(orig_w, orig_h);
        let img = if (width, height) != (orig_w, orig_h) {
            img.resize_exact(width, height, FilterType::Triangle)
        } else {
            img
        };

        let min_quality = to_percent(self.config.min_quality);
        let step = to_percent(self.config.quality_step).max(1);
        let mut quality = to_percent(self.config.default_quality).max(min_quality);

        let mut encoded = Self::encode_jpeg(&img, quality)?;
        let mut attempts = 1;
        debug!("Encoded {}x{} at quality {}: {} bytes", width, height, quality, encoded.len());

        // The floor is a hard stop, even if the result is still over budget
        while encoded.len() > self.config.max_bytes && quality > min_quality {
            quality = quality.saturating_sub(step).max(min_quality);
            encoded = Self::encode_jpeg(&img, quality)?;
            attempts += 1;
            debug!("Re-encoded at quality {}: {} bytes", quality, encoded.len());
        }

        Ok(EncodedImage {
            bytes: encoded,
            width,
            height,
            quality_percent: quality,
            attempts,
        })
    }

    /// Runs [`ImageOptimizer::optimize`] on the blocking pool.
    pub async fn optimize_async(self: Arc<Self>, input: ImageInput) -> Result<EncodedImage, OptimizeError> {
        tokio::task::spawn_blocking(move || self.optimize(input))
            .await
            .map_err(|e| OptimizeError::Encode(format!("Optimizer task failed: {}", e)))?
    }

    /// Only the width is bounded. Images are never upscaled.
    fn bounded_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let max_width = self.config.max_width;
        if width <= max_width {
            return (width, height);
        }

        let height = (height as f64 * max_width as f64 / width as f64).round() as u32;
        (max_width, height.max(1))
    }

    fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, OptimizeError> {
        // JPEG has no alpha channel
        let rgb = img.to_rgb8();
        let mut buf = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
                .map_err(|e| OptimizeError::Encode(e.to_string()))?;
        }
        Ok(buf)
    }
}

#[cfg(test)]
pub(crate) mod test_images {
    use std::io::Cursor;

    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};

    /// Noise compresses badly, which is what the size budget tests need.
    pub fn noisy_png(width: u32, height: u32) -> Vec<u8> {
        let mut state: u32 = 0x9E37_79B9;
        let img = RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            Rgb([r, g, b])
        });
        to_png(DynamicImage::ImageRgb8(img))
    }

    pub fn flat_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 120, 40, 128]));
        to_png(DynamicImage::ImageRgba8(img))
    }

    fn to_png(img: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }
}
