//! Perceptual hash values.
//!
//! A [`PerceptualHash`] is a fixed-length sequence of discrete symbols. The
//! engine never interprets the symbols; it only compares them through a
//! [`HashMetric`](crate::distance::HashMetric).
//!
//! Two encodings are understood:
//!
//! | Constructor | Input | Symbol | Natural metric |
//! |-------------|-------|--------|----------------|
//! | [`PerceptualHash::from_symbols`] | `"0110..."`, `"abca..."` | one ASCII char | [`Hamming`](crate::distance::Hamming) |
//! | [`PerceptualHash::from_hex`] | `"f0e1c3..."` | one byte (two nibbles) | [`BitHamming`](crate::distance::BitHamming) |
//!
//! The hex form is what most image-hashing tools emit (aHash, dHash, pHash),
//! and packs 8 bits per symbol so that comparison is XOR + popcount.

use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 32 inline bytes covers 256-bit hex hashes and 32-symbol strings without
/// touching the heap.
type Symbols = SmallVec<[u8; 32]>;

/// Errors produced while decoding a hash string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseHashError {
    #[error("hash string is empty")]
    Empty,

    #[error("non-ASCII symbol {ch:?} at position {position}")]
    NonAscii { position: usize, ch: char },

    #[error("invalid hex digit {ch:?} at position {position}")]
    InvalidHexDigit { position: usize, ch: char },

    #[error("hex hash has odd length {0}")]
    OddHexLength(usize),
}

/// Fixed-length perceptual fingerprint of a media item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PerceptualHash {
    symbols: Symbols,
}

impl PerceptualHash {
    /// Wrap raw symbols.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            symbols: SmallVec::from_slice(bytes),
        }
    }

    /// One symbol per ASCII character.
    pub fn from_symbols(s: &str) -> Result<Self, ParseHashError> {
        if s.is_empty() {
            return Err(ParseHashError::Empty);
        }
        if let Some((position, ch)) = s.chars().enumerate().find(|(_, c)| !c.is_ascii()) {
            return Err(ParseHashError::NonAscii { position, ch });
        }
        Ok(Self::from_bytes(s.as_bytes()))
    }

    /// Hex string packed two nibbles per byte.
    pub fn from_hex(s: &str) -> Result<Self, ParseHashError> {
        if s.is_empty() {
            return Err(ParseHashError::Empty);
        }
        if s.len() % 2 != 0 {
            return Err(ParseHashError::OddHexLength(s.len()));
        }

        let mut symbols = Symbols::with_capacity(s.len() / 2);
        let mut high = 0u8;
        for (position, ch) in s.chars().enumerate() {
            let nibble = ch
                .to_digit(16)
                .ok_or(ParseHashError::InvalidHexDigit { position, ch })? as u8;
            if position % 2 == 0 {
                high = nibble << 4;
            } else {
                symbols.push(high | nibble);
            }
        }
        Ok(Self { symbols })
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.symbols
    }

    /// Lowercase hex rendering of the raw symbols.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.symbols.len() * 2);
        for b in &self.symbols {
            out.push_str(&format!("{b:02x}"));
        }
        out
    }
}

impl FromStr for PerceptualHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbols(s)
    }
}

impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
