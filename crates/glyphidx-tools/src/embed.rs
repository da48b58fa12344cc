use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

pub const VALUES_PER_LINE: usize = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbedError {
    #[error("symbol {0:?} is not a valid C identifier")]
    InvalidSymbol(String),
    #[error("alignment must be > 0")]
    ZeroAlign,
    #[error("input is {len} bytes, not a multiple of {align}")]
    Misaligned { len: u64, align: u64 },
}

#[derive(Debug, Clone)]
pub struct EmbedConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub symbol: String,
    /// Required size multiple of the input, checked before any output is written.
    pub align: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedResult {
    pub bytes: u64,
}

pub fn is_c_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

pub fn check_align(len: u64, align: Option<u64>) -> Result<(), EmbedError> {
    match align {
        None => Ok(()),
        Some(0) => Err(EmbedError::ZeroAlign),
        Some(a) if len % a != 0 => Err(EmbedError::Misaligned { len, align: a }),
        Some(_) => Ok(()),
    }
}

/// Renders `bytes` as a `constexpr uint8_t` array, `VALUES_PER_LINE` values per line.
pub fn render_array(bytes: &[u8], symbol: &str) -> String {
    let mut out = String::with_capacity(64 + bytes.len() * 5);
    out.push_str("// this file is generated\n\n");
    let _ = writeln!(out, "constexpr uint8_t {symbol}[] = {{");
    for line in bytes.chunks(VALUES_PER_LINE) {
        for b in line {
            let _ = write!(out, "0x{b:x},");
        }
        out.push('\n');
    }
    out.push_str("};\n");
    out
}

pub fn embed_file(cfg: &EmbedConfig) -> Result<EmbedResult> {
    if !is_c_identifier(&cfg.symbol) {
        return Err(EmbedError::InvalidSymbol(cfg.symbol.clone()).into());
    }
    let bytes = std::fs::read(&cfg.input)
        .with_context(|| format!("read failed: {}", cfg.input.display()))?;
    check_align(bytes.len() as u64, cfg.align)?;

    let text = render_array(&bytes, &cfg.symbol);
    std::fs::write(&cfg.output, text)
        .with_context(|| format!("write failed: {}", cfg.output.display()))?;

    info!(
        target: "glyphidx",
        event = "embed_complete",
        input = %cfg.input.display(),
        output = %cfg.output.display(),
        symbol = cfg.symbol.as_str(),
        bytes = bytes.len() as u64,
        "embedded binary"
    );
    Ok(EmbedResult {
        bytes: bytes.len() as u64,
    })
}
