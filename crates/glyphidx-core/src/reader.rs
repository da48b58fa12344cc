use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::types::{ElementType, IdxError, IdxHeader};

fn read_u32_be<R: Read>(reader: &mut R) -> Result<u32, IdxError> {
    let mut b = [0u8; 4];
    reader.read_exact(&mut b)?;
    Ok(u32::from_be_bytes(b))
}

/// Random-access IDX reader.
///
/// Opening validates the magic number and checks that the file is long enough
/// to hold the payload the header declares. Trailing bytes are tolerated.
pub struct IdxReader<R: Read + Seek> {
    inner: R,
    header: IdxHeader,
    header_len: u64,
    record_len: usize,
}

impl IdxReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, IdxError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> IdxReader<R> {
    pub fn new(mut inner: R) -> Result<Self, IdxError> {
        inner.seek(SeekFrom::Start(0))?;
        let mut magic = [0u8; 4];
        inner.read_exact(&mut magic)?;
        let (elem, ndims) = IdxHeader::parse_magic(magic)?;
        let mut dims = Vec::with_capacity(ndims);
        for _ in 0..ndims {
            dims.push(read_u32_be(&mut inner)?);
        }
        let header = IdxHeader { elem, dims };
        let header_len = header.encoded_len();
        let record_len = header.record_len()?;

        let expected = header_len
            .checked_add(header.payload_len()?)
            .ok_or(IdxError::RecordSizeOverflow)?;
        let actual = inner.seek(SeekFrom::End(0))?;
        if actual < expected {
            return Err(IdxError::Truncated { expected, actual });
        }
        inner.seek(SeekFrom::Start(header_len))?;

        Ok(Self {
            inner,
            header,
            header_len,
            record_len,
        })
    }

    pub fn header(&self) -> &IdxHeader {
        &self.header
    }

    pub fn count(&self) -> u32 {
        self.header.count()
    }

    pub fn record_len(&self) -> usize {
        self.record_len
    }

    /// Byte offset of the payload from the start of the file.
    pub fn header_len(&self) -> u64 {
        self.header_len
    }

    pub fn expect_layout(&self, elem: ElementType, ndims: usize) -> Result<(), IdxError> {
        self.header.expect_layout(elem, ndims)
    }

    pub fn read_record(&mut self, index: u64) -> Result<Vec<u8>, IdxError> {
        let count = self.count();
        if index >= u64::from(count) {
            return Err(IdxError::IndexOutOfRange { index, count });
        }
        let pos = self.header_len + index * self.record_len as u64;
        self.inner.seek(SeekFrom::Start(pos))?;
        let mut out = vec![0u8; self.record_len];
        self.inner.read_exact(&mut out)?;
        Ok(out)
    }

    /// Reader over the declared payload, starting `offset` bytes past the header.
    ///
    /// An offset past the end of the payload yields an empty reader.
    pub fn payload_from(&mut self, offset: u64) -> Result<impl Read + '_, IdxError> {
        let payload_len = self.header.payload_len()?;
        let offset = offset.min(payload_len);
        self.inner.seek(SeekFrom::Start(self.header_len + offset))?;
        Ok((&mut self.inner).take(payload_len - offset))
    }

    pub fn read_payload(&mut self) -> Result<Vec<u8>, IdxError> {
        let mut out = Vec::new();
        self.payload_from(0)?.read_to_end(&mut out)?;
        Ok(out)
    }

    /// Checks that every unsigned byte element lies in `lo..=hi`.
    ///
    /// Returns the payload offset of the first offending element.
    pub fn verify_u8_range(&mut self, lo: u8, hi: u8) -> Result<Option<u64>, IdxError> {
        self.expect_layout(ElementType::U8, self.header.dims.len())?;
        let mut buf = [0u8; 64 * 1024];
        let mut pos: u64 = 0;
        let mut payload = self.payload_from(0)?;
        loop {
            let n = payload.read(&mut buf)?;
            if n == 0 {
                return Ok(None);
            }
            if let Some(i) = buf[..n].iter().position(|b| *b < lo || *b > hi) {
                return Ok(Some(pos + i as u64));
            }
            pos += n as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn label_file(labels: &[u8]) -> Vec<u8> {
        let mut bytes = IdxHeader::labels(labels.len() as u32).encode();
        bytes.extend_from_slice(labels);
        bytes
    }

    #[test]
    fn reads_label_records() {
        let mut r = IdxReader::new(Cursor::new(label_file(&[3, 1, 4]))).unwrap();
        assert_eq!(r.count(), 3);
        assert_eq!(r.header_len(), 8);
        assert_eq!(r.read_record(2).unwrap(), vec![4]);
        assert!(matches!(
            r.read_record(3).unwrap_err(),
            IdxError::IndexOutOfRange { index: 3, count: 3 }
        ));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut bytes = label_file(&[1, 2, 3]);
        bytes.pop();
        let err = IdxReader::new(Cursor::new(bytes)).err().unwrap();
        assert!(matches!(
            err,
            IdxError::Truncated {
                expected: 11,
                actual: 10
            }
        ));
    }

    #[test]
    fn payload_from_clamps_to_payload() {
        let mut bytes = label_file(&[5, 6, 7]);
        bytes.extend_from_slice(b"trailing");
        let mut r = IdxReader::new(Cursor::new(bytes)).unwrap();

        let mut tail = Vec::new();
        r.payload_from(1).unwrap().read_to_end(&mut tail).unwrap();
        assert_eq!(tail, vec![6, 7]);

        let mut none = Vec::new();
        r.payload_from(10).unwrap().read_to_end(&mut none).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn verify_range_reports_first_offender() {
        let mut r = IdxReader::new(Cursor::new(label_file(&[0, 61, 62, 1]))).unwrap();
        assert_eq!(r.verify_u8_range(0, 61).unwrap(), Some(2));
        assert_eq!(r.verify_u8_range(0, 62).unwrap(), None);
    }
}
