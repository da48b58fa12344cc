use std::path::Path;

use anyhow::{Context, Result};
use glyphidx_core::{ElementType, IdxReader, LabelPolicy};
use image::GrayImage;
use tracing::{info, warn};

const SHADES: &[u8] = b" .:-=+*#%@";

/// One image record and its label from a paired image/label IDX set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub index: u64,
    pub count: u32,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub label: u8,
}

pub fn load_sample(images: &Path, labels: &Path, index: u64) -> Result<Sample> {
    let mut image_reader = IdxReader::open(images)
        .with_context(|| format!("bad images file: {}", images.display()))?;
    image_reader
        .expect_layout(ElementType::U8, 3)
        .with_context(|| format!("bad images file: {}", images.display()))?;
    let mut label_reader = IdxReader::open(labels)
        .with_context(|| format!("bad labels file: {}", labels.display()))?;
    label_reader
        .expect_layout(ElementType::U8, 1)
        .with_context(|| format!("bad labels file: {}", labels.display()))?;

    let count = image_reader.count();
    anyhow::ensure!(
        count == label_reader.count(),
        "images and labels are expected to have the same count: {} != {}",
        count,
        label_reader.count()
    );

    let dims = &image_reader.header().dims;
    let (height, width) = (dims[1], dims[2]);
    let pixels = image_reader.read_record(index)?;
    let label = label_reader.read_record(index)?[0];

    info!(
        target: "glyphidx",
        event = "view_sample",
        images = %images.display(),
        index,
        count,
        label,
        "loaded sample"
    );
    Ok(Sample {
        index,
        count,
        width,
        height,
        pixels,
        label,
    })
}

/// Payload offset of the first label byte `policy` never produces.
pub fn check_labels(labels: &Path, policy: LabelPolicy) -> Result<Option<u64>> {
    let mut reader = IdxReader::open(labels)
        .with_context(|| format!("bad labels file: {}", labels.display()))?;
    reader
        .expect_layout(ElementType::U8, 1)
        .with_context(|| format!("bad labels file: {}", labels.display()))?;
    let (lo, hi) = policy.label_range();
    let offender = reader.verify_u8_range(lo, hi)?;
    if let Some(offset) = offender {
        warn!(
            target: "glyphidx",
            event = "view_label_out_of_policy",
            labels = %labels.display(),
            offset,
            policy = policy.name(),
            "label outside policy range"
        );
    }
    Ok(offender)
}

/// `"A", 0x41, 65`; with a policy the character is the decoded class.
pub fn label_description(label: u8, policy: Option<LabelPolicy>) -> String {
    let c = match policy {
        Some(p) => p.decode(label),
        None => Some(char::from(label)),
    };
    let shown = match c {
        Some(c) if !c.is_control() => c.to_string(),
        _ => "?".to_string(),
    };
    format!("\"{shown}\", 0x{label:02x}, {label}")
}

/// One text row per pixel row; darker characters for brighter pixels.
pub fn render_ascii(sample: &Sample) -> String {
    let width = sample.width as usize;
    let mut out = String::with_capacity((width + 1) * sample.height as usize);
    if width == 0 {
        return out;
    }
    for row in sample.pixels.chunks(width) {
        for p in row {
            let i = *p as usize * (SHADES.len() - 1) / 255;
            out.push(char::from(SHADES[i]));
        }
        out.push('\n');
    }
    out
}

pub fn write_png(sample: &Sample, path: &Path) -> Result<()> {
    let img = GrayImage::from_raw(sample.width, sample.height, sample.pixels.clone())
        .context("sample pixels do not match its dimensions")?;
    img.save(path)
        .with_context(|| format!("write png failed: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(pixels: Vec<u8>, width: u32, height: u32) -> Sample {
        Sample {
            index: 0,
            count: 1,
            width,
            height,
            pixels,
            label: b'A',
        }
    }

    #[test]
    fn ascii_shading_uses_full_ramp() {
        let s = sample(vec![0, 255, 128, 30], 2, 2);
        assert_eq!(render_ascii(&s), " @\n=.\n");
    }

    #[test]
    fn describes_raw_and_policy_labels() {
        assert_eq!(label_description(0x41, None), "\"A\", 0x41, 65");
        assert_eq!(
            label_description(10, Some(LabelPolicy::Alnum62)),
            "\"A\", 0x0a, 10"
        );
        assert_eq!(label_description(10, None), "\"?\", 0x0a, 10");
    }
}
