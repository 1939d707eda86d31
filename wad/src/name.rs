use std::borrow::Cow;
use std::fmt;

/// The 8 byte name of a lump.
///
/// Names are stored NUL padded. Anything after the first NUL is discarded and
/// trailing spaces are treated as padding, so `"PLAYPAL "` and `"PLAYPAL\0"`
/// are the same name. Equality is exact on the stored bytes; use
/// [`LumpName::eq_ignore_case`] or [`LumpName::to_ascii_uppercase`] for case
/// folding.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LumpName([u8; 8]);

impl LumpName {
    pub const LEN: usize = 8;

    /// Build from raw directory bytes. Only the first 8 bytes are used.
    pub fn from_raw(raw: &[u8]) -> Self {
        let mut name = [0u8; Self::LEN];
        for (dst, src) in name.iter_mut().zip(raw.iter().take(Self::LEN)) {
            if *src == 0 {
                break;
            }
            *dst = *src;
        }
        for b in name.iter_mut().rev() {
            match *b {
                0 => continue,
                b' ' => *b = 0,
                _ => break,
            }
        }
        Self(name)
    }

    pub fn new(name: &str) -> Self {
        Self::from_raw(name.as_bytes())
    }

    /// The padded 8 byte form
    pub const fn raw(&self) -> &[u8; 8] {
        &self.0
    }

    /// The name without padding
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..self.len()]
    }

    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.0.iter().position(|b| *b == 0).unwrap_or(Self::LEN)
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    pub fn eq_ignore_case(&self, other: &LumpName) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    pub fn to_ascii_uppercase(&self) -> Self {
        let mut name = self.0;
        name.make_ascii_uppercase();
        Self(name)
    }
}

impl From<&str> for LumpName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for LumpName {
    fn eq(&self, other: &str) -> bool {
        *self == LumpName::new(other)
    }
}

impl PartialEq<&str> for LumpName {
    fn eq(&self, other: &&str) -> bool {
        *self == LumpName::new(other)
    }
}

impl fmt::Display for LumpName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl fmt::Debug for LumpName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.as_str())
    }
}
