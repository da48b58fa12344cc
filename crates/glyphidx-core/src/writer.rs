use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::types::{IdxError, IdxHeader};

/// Streaming IDX writer.
///
/// The header (and therefore the record count) is written up front; every
/// `push` appends one record of exactly `record_len` bytes. `finish` fails
/// unless the number of pushed records equals the declared count.
pub struct IdxWriter<W: Write> {
    inner: W,
    header: IdxHeader,
    record_len: usize,
    written: u32,
}

impl IdxWriter<BufWriter<File>> {
    pub fn create(path: &Path, header: IdxHeader) -> Result<Self, IdxError> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), header)
    }
}

impl<W: Write> IdxWriter<W> {
    pub fn new(mut inner: W, header: IdxHeader) -> Result<Self, IdxError> {
        header.validate()?;
        let record_len = header.record_len()?;
        inner.write_all(&header.encode())?;
        Ok(Self {
            inner,
            header,
            record_len,
            written: 0,
        })
    }

    pub fn push(&mut self, record: &[u8]) -> Result<(), IdxError> {
        if record.len() != self.record_len {
            return Err(IdxError::RecordLen {
                expected: self.record_len,
                got: record.len(),
            });
        }
        let declared = self.header.count();
        if self.written >= declared {
            return Err(IdxError::TooManyRecords { declared });
        }
        self.inner.write_all(record)?;
        self.written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W, IdxError> {
        let declared = self.header.count();
        if self.written != declared {
            return Err(IdxError::CountMismatch {
                declared,
                written: self.written,
            });
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_then_records() {
        let mut w = IdxWriter::new(Vec::new(), IdxHeader::labels(2)).unwrap();
        w.push(&[7]).unwrap();
        w.push(&[9]).unwrap();
        let out = w.finish().unwrap();
        assert_eq!(out, vec![0, 0, 8, 1, 0, 0, 0, 2, 7, 9]);
    }

    #[test]
    fn rejects_wrong_record_len() {
        let mut w = IdxWriter::new(Vec::new(), IdxHeader::images(1, 2, 2)).unwrap();
        let err = w.push(&[0, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            IdxError::RecordLen {
                expected: 4,
                got: 3
            }
        ));
    }

    #[test]
    fn rejects_records_past_declared_count() {
        let mut w = IdxWriter::new(Vec::new(), IdxHeader::labels(1)).unwrap();
        w.push(&[1]).unwrap();
        let err = w.push(&[2]).unwrap_err();
        assert!(matches!(err, IdxError::TooManyRecords { declared: 1 }));
    }

    #[test]
    fn finish_requires_declared_count() {
        let mut w = IdxWriter::new(Vec::new(), IdxHeader::labels(3)).unwrap();
        w.push(&[1]).unwrap();
        let err = w.finish().unwrap_err();
        assert!(matches!(
            err,
            IdxError::CountMismatch {
                declared: 3,
                written: 1
            }
        ));
    }

    #[test]
    fn empty_subset_is_header_only() {
        let w = IdxWriter::new(Vec::new(), IdxHeader::images(0, 28, 28)).unwrap();
        let out = w.finish().unwrap();
        assert_eq!(out.len(), 16);
    }
}
