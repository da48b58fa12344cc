use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpMode {
    /// Hex list followed by a character list.
    Lists,
    /// A single escaped byte-string literal.
    ByteString,
}

/// Reads up to `len` bytes starting at `offset`. Short at end of file.
pub fn read_range(path: &Path, offset: u64, len: u64) -> Result<Vec<u8>> {
    let mut f =
        File::open(path).with_context(|| format!("open failed: {}", path.display()))?;
    f.seek(SeekFrom::Start(offset))
        .with_context(|| format!("seek to {offset} failed: {}", path.display()))?;
    let mut out = Vec::new();
    f.take(len)
        .read_to_end(&mut out)
        .with_context(|| format!("read failed: {}", path.display()))?;
    Ok(out)
}

/// `['0xde','0xad']`
pub fn format_hex(bytes: &[u8]) -> String {
    let items: Vec<String> = bytes.iter().map(|b| format!("'0x{b:x}'")).collect();
    format!("[{}]", items.join(","))
}

fn push_char_escaped(out: &mut String, b: u8) {
    match b {
        b'\\' => out.push_str("\\\\"),
        b'\'' => out.push_str("\\'"),
        b'\n' => out.push_str("\\n"),
        b'\r' => out.push_str("\\r"),
        b'\t' => out.push_str("\\t"),
        // Latin-1 control, no-break space and soft hyphen have no visible glyph.
        0x00..=0x1F | 0x7F..=0xA0 | 0xAD => out.push_str(&format!("\\x{b:02x}")),
        _ => out.push(char::from(b)),
    }
}

/// `['a','\x00']`, bytes interpreted as Latin-1.
pub fn format_chars(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4 + 2);
    out.push('[');
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('\'');
        push_char_escaped(&mut out, *b);
        out.push('\'');
    }
    out.push(']');
    out
}

/// `b"\xde\xad"` with printable ascii kept as-is.
pub fn format_byte_string(bytes: &[u8]) -> String {
    let escaped: String = bytes
        .iter()
        .flat_map(|b| std::ascii::escape_default(*b))
        .map(char::from)
        .collect();
    format!("b\"{escaped}\"")
}

/// Text printed for a byte range; `Nothing` when the range is empty.
pub fn render(bytes: &[u8], mode: DumpMode) -> String {
    if bytes.is_empty() {
        return "Nothing".to_string();
    }
    match mode {
        DumpMode::Lists => format!("{}\n{}", format_hex(bytes), format_chars(bytes)),
        DumpMode::ByteString => format_byte_string(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_list_matches_expected_layout() {
        assert_eq!(
            format_hex(&[0xDE, 0xAD, 0xBE, 0xEF]),
            "['0xde','0xad','0xbe','0xef']"
        );
        assert_eq!(format_hex(&[0, 10]), "['0x0','0xa']");
    }

    #[test]
    fn chars_escape_invisible_bytes() {
        assert_eq!(format_chars(b"A\n\x00'"), "['A','\\n','\\x00','\\'']");
        assert_eq!(format_chars(&[0xE9]), "['\u{e9}']");
    }

    #[test]
    fn byte_string_escapes_non_ascii() {
        assert_eq!(format_byte_string(&[0xDE, b'a', b'"']), "b\"\\xdea\\\"\"");
    }

    #[test]
    fn empty_range_renders_nothing() {
        assert_eq!(render(&[], DumpMode::Lists), "Nothing");
        assert_eq!(render(&[], DumpMode::ByteString), "Nothing");
    }
}
