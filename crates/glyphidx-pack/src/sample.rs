use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageError};

use crate::PackError;

/// Raw row-major grayscale pixels plus the size of the decoded source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSample {
    pub pixels: Vec<u8>,
    pub source_width: u32,
    pub source_height: u32,
}

/// Turns encoded image bytes into one fixed-size grayscale record.
pub trait SampleNormalizer {
    fn target(&self) -> (u32, u32);

    fn normalize(&self, bytes: &[u8]) -> Result<NormalizedSample, ImageError>;
}

/// Decode with the `image` crate, convert to 8-bit luma, resize to `width x height`.
#[derive(Debug, Clone, Copy)]
pub struct GrayscaleResize {
    pub width: u32,
    pub height: u32,
    pub filter: FilterType,
}

impl SampleNormalizer for GrayscaleResize {
    fn target(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn normalize(&self, bytes: &[u8]) -> Result<NormalizedSample, ImageError> {
        let decoded = image::load_from_memory(bytes)?;
        let source_width = decoded.width();
        let source_height = decoded.height();

        let gray: GrayImage = match decoded {
            DynamicImage::ImageLuma8(g) => g,
            other => other.to_luma8(),
        };
        let resized = if (source_width, source_height) == (self.width, self.height) {
            gray
        } else {
            imageops::resize(&gray, self.width, self.height, self.filter)
        };

        Ok(NormalizedSample {
            pixels: resized.into_raw(),
            source_width,
            source_height,
        })
    }
}

/// Runs `normalizer` and enforces the `width * height` record size.
pub fn normalize_entry<N: SampleNormalizer + ?Sized>(
    normalizer: &N,
    entry: &str,
    bytes: &[u8],
) -> Result<Vec<u8>, PackError> {
    let sample = normalizer
        .normalize(bytes)
        .map_err(|source| PackError::Decode {
            entry: entry.to_string(),
            source,
        })?;
    let (width, height) = normalizer.target();
    let expected = width as usize * height as usize;
    if sample.pixels.len() != expected {
        return Err(PackError::ShapeMismatch {
            entry: entry.to_string(),
            expected,
            got: sample.pixels.len(),
            source_width: sample.source_width,
            source_height: sample.source_height,
        });
    }
    Ok(sample.pixels)
}

pub fn parse_filter(s: &str) -> anyhow::Result<FilterType> {
    let v = s.trim().to_ascii_lowercase();
    let filter = match v.as_str() {
        "" | "nearest" => FilterType::Nearest,
        "triangle" | "bilinear" => FilterType::Triangle,
        "catmull-rom" | "catmullrom" | "bicubic" => FilterType::CatmullRom,
        "gaussian" => FilterType::Gaussian,
        "lanczos3" | "lanczos" => FilterType::Lanczos3,
        _ => anyhow::bail!(
            "invalid resize filter {s:?} (expected: nearest|triangle|catmull-rom|gaussian|lanczos3)"
        ),
    };
    Ok(filter)
}

pub fn filter_name(filter: FilterType) -> &'static str {
    match filter {
        FilterType::Nearest => "nearest",
        FilterType::Triangle => "triangle",
        FilterType::CatmullRom => "catmull-rom",
        FilterType::Gaussian => "gaussian",
        FilterType::Lanczos3 => "lanczos3",
    }
}
