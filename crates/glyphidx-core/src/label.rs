use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The 62-symbol alphabet used by `LabelPolicy::Alnum62`, in label order.
pub const ALNUM62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// How a class code point becomes a label byte.
///
/// The two policies produce different label files for the same archive and
/// must not be mixed within one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelPolicy {
    /// Index into `ALNUM62` (`'0'` -> 0, `'A'` -> 10, `'a'` -> 36).
    #[default]
    Alnum62,
    /// The code point itself, restricted to `33..=254`.
    Ascii,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("class code 0x{code:x} is not in 0-9A-Za-z")]
    NotAlphanumeric { code: u32 },
    #[error("class code 0x{code:x} is outside the ascii label range (32, 255)")]
    OutOfAsciiRange { code: u32 },
    #[error("invalid label policy {0:?} (expected: alnum62|ascii)")]
    UnknownPolicy(String),
}

impl LabelPolicy {
    pub fn name(self) -> &'static str {
        match self {
            LabelPolicy::Alnum62 => "alnum62",
            LabelPolicy::Ascii => "ascii",
        }
    }

    pub fn encode(self, code: u32) -> Result<u8, LabelError> {
        match self {
            LabelPolicy::Alnum62 => u8::try_from(code)
                .ok()
                .and_then(|c| ALNUM62.iter().position(|a| *a == c))
                .map(|i| i as u8)
                .ok_or(LabelError::NotAlphanumeric { code }),
            LabelPolicy::Ascii => {
                if code > 32 && code < 255 {
                    Ok(code as u8)
                } else {
                    Err(LabelError::OutOfAsciiRange { code })
                }
            }
        }
    }

    /// Inverse of `encode`; `None` for bytes the policy never produces.
    pub fn decode(self, label: u8) -> Option<char> {
        match self {
            LabelPolicy::Alnum62 => ALNUM62.get(label as usize).map(|b| char::from(*b)),
            LabelPolicy::Ascii => (label > 32 && label < 255).then(|| char::from(label)),
        }
    }

    /// Smallest and largest label byte the policy can produce.
    pub fn label_range(self) -> (u8, u8) {
        match self {
            LabelPolicy::Alnum62 => (0, (ALNUM62.len() - 1) as u8),
            LabelPolicy::Ascii => (33, 254),
        }
    }
}

impl FromStr for LabelPolicy {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim().to_ascii_lowercase();
        match v.as_str() {
            "alnum62" | "alnum" | "index" => Ok(LabelPolicy::Alnum62),
            "ascii" | "raw" => Ok(LabelPolicy::Ascii),
            _ => Err(LabelError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for LabelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alnum62_indexes_digits_then_upper_then_lower() {
        let p = LabelPolicy::Alnum62;
        assert_eq!(p.encode('0' as u32), Ok(0));
        assert_eq!(p.encode('9' as u32), Ok(9));
        assert_eq!(p.encode('A' as u32), Ok(10));
        assert_eq!(p.encode('Z' as u32), Ok(35));
        assert_eq!(p.encode('a' as u32), Ok(36));
        assert_eq!(p.encode('z' as u32), Ok(61));
        assert_eq!(p.decode(36), Some('a'));
        assert_eq!(p.decode(62), None);
        assert_eq!(p.label_range(), (0, 61));
    }

    #[test]
    fn alnum62_rejects_punctuation_and_wide_codes() {
        let p = LabelPolicy::Alnum62;
        assert_eq!(
            p.encode('!' as u32),
            Err(LabelError::NotAlphanumeric { code: 0x21 })
        );
        assert_eq!(
            p.encode(0x130),
            Err(LabelError::NotAlphanumeric { code: 0x130 })
        );
    }

    #[test]
    fn ascii_range_is_exclusive() {
        let p = LabelPolicy::Ascii;
        assert_eq!(p.encode(32), Err(LabelError::OutOfAsciiRange { code: 32 }));
        assert_eq!(p.encode(33), Ok(33));
        assert_eq!(p.encode(0x41), Ok(0x41));
        assert_eq!(p.encode(254), Ok(254));
        assert_eq!(
            p.encode(255),
            Err(LabelError::OutOfAsciiRange { code: 255 })
        );
        assert_eq!(p.label_range(), (33, 254));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("alnum62".parse(), Ok(LabelPolicy::Alnum62));
        assert_eq!(" ASCII ".parse(), Ok(LabelPolicy::Ascii));
        assert!("hex".parse::<LabelPolicy>().is_err());
    }
}
