use std::fmt;

use thiserror::Error;

/// Element type byte of an IDX magic number (`0x00 0x00 <type> <dims>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    U8,
    I8,
    I16,
    I32,
    F32,
    F64,
}

impl ElementType {
    pub fn code(self) -> u8 {
        match self {
            ElementType::U8 => 0x08,
            ElementType::I8 => 0x09,
            ElementType::I16 => 0x0B,
            ElementType::I32 => 0x0C,
            ElementType::F32 => 0x0D,
            ElementType::F64 => 0x0E,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, IdxError> {
        let ty = match code {
            0x08 => ElementType::U8,
            0x09 => ElementType::I8,
            0x0B => ElementType::I16,
            0x0C => ElementType::I32,
            0x0D => ElementType::F32,
            0x0E => ElementType::F64,
            other => return Err(IdxError::UnsupportedType(other)),
        };
        Ok(ty)
    }

    pub fn size_bytes(self) -> usize {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::I16 => 2,
            ElementType::I32 | ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::U8 => "u8",
            ElementType::I8 => "i8",
            ElementType::I16 => "i16",
            ElementType::I32 => "i32",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum IdxError {
    #[error("bad idx magic {0:02x?} (expected 00 00 <type> <dims>)")]
    BadMagic([u8; 4]),
    #[error("unsupported idx element type 0x{0:02x}")]
    UnsupportedType(u8),
    #[error("idx header must have at least one dimension")]
    NoDimensions,
    #[error("idx header supports at most 255 dimensions, got {0}")]
    TooManyDimensions(usize),
    #[error("idx record size overflows usize")]
    RecordSizeOverflow,
    #[error("expected {expected_type} idx with {expected_dims} dimension(s), found {found_type} with {found_dims}")]
    UnexpectedLayout {
        expected_type: ElementType,
        expected_dims: usize,
        found_type: ElementType,
        found_dims: usize,
    },
    #[error("record has {got} bytes, expected {expected}")]
    RecordLen { expected: usize, got: usize },
    #[error("header declares {declared} records; refusing to write more")]
    TooManyRecords { declared: u32 },
    #[error("header declares {declared} records but {written} were written")]
    CountMismatch { declared: u32, written: u32 },
    #[error("record index {index} out of range (count {count})")]
    IndexOutOfRange { index: u64, count: u32 },
    #[error("idx payload truncated: header needs {expected} bytes, file has {actual}")]
    Truncated { expected: u64, actual: u64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoded IDX header: element type plus big-endian `u32` dimension sizes.
///
/// `dims[0]` is always the record count; the remaining dimensions describe a
/// single record. Image files use `[count, rows, cols]` (height before width).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxHeader {
    pub elem: ElementType,
    pub dims: Vec<u32>,
}

impl IdxHeader {
    /// Label file header: `0x00 0x00 0x08 0x01` + count.
    pub fn labels(count: u32) -> Self {
        Self {
            elem: ElementType::U8,
            dims: vec![count],
        }
    }

    /// Image file header: `0x00 0x00 0x08 0x03` + count, rows, cols.
    pub fn images(count: u32, height: u32, width: u32) -> Self {
        Self {
            elem: ElementType::U8,
            dims: vec![count, height, width],
        }
    }

    pub fn validate(&self) -> Result<(), IdxError> {
        if self.dims.is_empty() {
            return Err(IdxError::NoDimensions);
        }
        if self.dims.len() > u8::MAX as usize {
            return Err(IdxError::TooManyDimensions(self.dims.len()));
        }
        self.record_len()?;
        Ok(())
    }

    pub fn count(&self) -> u32 {
        self.dims.first().copied().unwrap_or(0)
    }

    pub fn magic(&self) -> [u8; 4] {
        [0, 0, self.elem.code(), self.dims.len() as u8]
    }

    /// Size in bytes of the encoded header.
    pub fn encoded_len(&self) -> u64 {
        4 + 4 * self.dims.len() as u64
    }

    /// Size in bytes of one record (all dimensions after the count).
    pub fn record_len(&self) -> Result<usize, IdxError> {
        let mut len = self.elem.size_bytes();
        for d in self.dims.iter().skip(1) {
            len = len
                .checked_mul(*d as usize)
                .ok_or(IdxError::RecordSizeOverflow)?;
        }
        Ok(len)
    }

    pub fn payload_len(&self) -> Result<u64, IdxError> {
        (self.record_len()? as u64)
            .checked_mul(u64::from(self.count()))
            .ok_or(IdxError::RecordSizeOverflow)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len() as usize);
        out.extend_from_slice(&self.magic());
        for d in &self.dims {
            out.extend_from_slice(&d.to_be_bytes());
        }
        out
    }

    /// Parses the magic number and returns the element type and dimension count.
    pub fn parse_magic(magic: [u8; 4]) -> Result<(ElementType, usize), IdxError> {
        if magic[0] != 0 || magic[1] != 0 {
            return Err(IdxError::BadMagic(magic));
        }
        let elem = ElementType::from_code(magic[2])?;
        let ndims = magic[3] as usize;
        if ndims == 0 {
            return Err(IdxError::NoDimensions);
        }
        Ok((elem, ndims))
    }

    pub fn expect_layout(&self, elem: ElementType, ndims: usize) -> Result<(), IdxError> {
        if self.elem != elem || self.dims.len() != ndims {
            return Err(IdxError::UnexpectedLayout {
                expected_type: elem,
                expected_dims: ndims,
                found_type: self.elem,
                found_dims: self.dims.len(),
            });
        }
        Ok(())
    }
}
