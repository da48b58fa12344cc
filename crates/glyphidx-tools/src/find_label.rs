use std::io::{Read, Seek};
use std::path::Path;

use anyhow::{Context, Result};
use glyphidx_core::{ElementType, IdxError, IdxReader, LabelPolicy};

/// Converts the command-line label argument into the byte stored in the file.
///
/// The argument must be a single ascii character. Without a policy the
/// character's own byte is searched for; with one, the policy's encoding is.
pub fn parse_label_arg(arg: &str, policy: Option<LabelPolicy>) -> Result<u8> {
    let mut chars = arg.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        anyhow::bail!("label must be exactly one character, got {arg:?}");
    };
    anyhow::ensure!(c.is_ascii(), "label must be ascii, got {c:?}");
    match policy {
        None => Ok(c as u8),
        Some(p) => Ok(p.encode(c as u32)?),
    }
}

/// Offset (relative to the payload start) of the first `label` at or after `start`.
pub fn find_in<R: Read + Seek>(
    reader: &mut IdxReader<R>,
    label: u8,
    start: u64,
) -> Result<Option<u64>, IdxError> {
    reader.expect_layout(ElementType::U8, 1)?;
    let mut buf = [0u8; 64 * 1024];
    let mut pos = start;
    let mut payload = reader.payload_from(start)?;
    loop {
        let n = payload.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        if let Some(i) = buf[..n].iter().position(|b| *b == label) {
            return Ok(Some(pos + i as u64));
        }
        pos += n as u64;
    }
}

pub fn find_label(path: &Path, label: u8, start: u64) -> Result<Option<u64>> {
    let mut reader = IdxReader::open(path)
        .with_context(|| format!("open label file failed: {}", path.display()))?;
    let found = find_in(&mut reader, label, start)
        .with_context(|| format!("search failed: {}", path.display()))?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use glyphidx_core::{IdxHeader, IdxWriter};

    use super::*;

    fn labels(bytes: &[u8]) -> IdxReader<Cursor<Vec<u8>>> {
        let mut w = IdxWriter::new(Vec::new(), IdxHeader::labels(bytes.len() as u32)).unwrap();
        for b in bytes {
            w.push(&[*b]).unwrap();
        }
        IdxReader::new(Cursor::new(w.finish().unwrap())).unwrap()
    }

    #[test]
    fn finds_first_occurrence_from_start() {
        let mut r = labels(b"0123A56A");
        assert_eq!(find_in(&mut r, b'A', 0).unwrap(), Some(4));
        assert_eq!(find_in(&mut r, b'A', 4).unwrap(), Some(4));
        assert_eq!(find_in(&mut r, b'A', 5).unwrap(), Some(7));
        assert_eq!(find_in(&mut r, b'Z', 0).unwrap(), None);
        assert_eq!(find_in(&mut r, b'A', 100).unwrap(), None);
    }

    #[test]
    fn image_files_are_rejected() {
        let mut w = IdxWriter::new(Vec::new(), IdxHeader::images(1, 1, 1)).unwrap();
        w.push(&[7]).unwrap();
        let mut r = IdxReader::new(Cursor::new(w.finish().unwrap())).unwrap();
        assert!(matches!(
            find_in(&mut r, 7, 0),
            Err(IdxError::UnexpectedLayout { .. })
        ));
    }

    #[test]
    fn label_arg_can_be_policy_encoded() {
        assert_eq!(parse_label_arg("A", None).unwrap(), b'A');
        assert_eq!(
            parse_label_arg("A", Some(LabelPolicy::Alnum62)).unwrap(),
            10
        );
        assert!(parse_label_arg("AB", None).is_err());
        assert!(parse_label_arg("", None).is_err());
        assert!(parse_label_arg("é", None).is_err());
    }
}
