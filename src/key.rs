//! Fixed-size word/frequency records.
//!
//! Layout (big endian, [`KEY_SIZE`] bytes):
//!
//! ```text
//! [word units: 14 x u16][freq: u32]
//! ```
//!
//! The word is stored as UTF-16 code units followed by [`DELIMITER`]. Units
//! after the delimiter are padding. The frequency always lives at
//! [`FREQ_OFFSET`] regardless of the word length.

use std::fmt;

use crate::error::{Error, Result};

/// Encoded size of one key record.
pub const KEY_SIZE: usize = 32;

/// Number of UTF-16 unit slots in the word run, delimiter included.
pub const WORD_SLOTS: usize = 14;

/// Longest storable word, in UTF-16 code units.
pub const MAX_WORD_UNITS: usize = WORD_SLOTS - 1;

/// Byte offset of the frequency inside a key record.
pub const FREQ_OFFSET: usize = 28;

/// Terminates the word run.
pub const DELIMITER: u16 = b'!' as u16;

/// First unit of the placeholder key that pads unused slots of a node.
pub const NULL_KEY_MARKER: u16 = b'.' as u16;

/// First unit of a zeroed (never written) slot.
pub const FREE_MARKER: u16 = 0;

/// A word together with its occurrence count in one document.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key {
    word: String,
    freq: u32,
}

impl Key {
    /// Build a key, truncating `word` to [`MAX_WORD_UNITS`] UTF-16 units.
    ///
    /// Truncation happens at a char boundary, so a character that would
    /// straddle the limit is dropped whole. Words containing the delimiter or
    /// starting with one of the slot markers are rejected.
    pub fn new(word: &str, freq: u32) -> Result<Self> {
        let word = truncate_word(word);
        if word.encode_utf16().any(|u| u == DELIMITER) {
            return Err(Error::InvalidWord {
                word: word.to_owned(),
                reason: "contains the '!' delimiter",
            });
        }
        match word.encode_utf16().next() {
            Some(NULL_KEY_MARKER) => Err(Error::InvalidWord {
                word: word.to_owned(),
                reason: "starts with the null-key marker '.'",
            }),
            Some(FREE_MARKER) => Err(Error::InvalidWord {
                word: word.to_owned(),
                reason: "starts with NUL",
            }),
            _ => Ok(Self {
                word: word.to_owned(),
                freq,
            }),
        }
    }

    #[inline]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[inline]
    pub fn freq(&self) -> u32 {
        self.freq
    }

    pub fn into_parts(self) -> (String, u32) {
        (self.word, self.freq)
    }

    /// Write this key into `out`, which must be exactly [`KEY_SIZE`] bytes.
    pub fn encode_into(&self, out: &mut [u8]) {
        encode_record(self.word.encode_utf16(), self.freq, out);
    }

    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        let mut out = [0u8; KEY_SIZE];
        self.encode_into(&mut out);
        out
    }

    /// Decode a key record.
    ///
    /// Fails if the record is not [`KEY_SIZE`] bytes, is a null-key
    /// placeholder or a free slot, or holds invalid UTF-16.
    pub fn decode(record: &[u8]) -> Result<Self> {
        if record.len() != KEY_SIZE {
            return Err(Error::RecordLength {
                expected: KEY_SIZE,
                actual: record.len(),
            });
        }
        match unit_at(record, 0) {
            NULL_KEY_MARKER => return Err(Error::InvalidKey("null key placeholder")),
            FREE_MARKER => return Err(Error::InvalidKey("free slot")),
            _ => {}
        }

        let mut units = [0u16; WORD_SLOTS];
        let mut len = 0;
        while len < WORD_SLOTS {
            let u = unit_at(record, len);
            if u == DELIMITER {
                break;
            }
            units[len] = u;
            len += 1;
        }

        let word = String::from_utf16(&units[..len])
            .map_err(|_| Error::InvalidKey("word run is not valid UTF-16"))?;
        let freq = u32::from_be_bytes([
            record[FREQ_OFFSET],
            record[FREQ_OFFSET + 1],
            record[FREQ_OFFSET + 2],
            record[FREQ_OFFSET + 3],
        ]);
        Ok(Self { word, freq })
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.word, self.freq)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.word, self.freq)
    }
}

/// Write the placeholder record that fills unused key slots.
pub(crate) fn encode_null_into(out: &mut [u8]) {
    encode_record([NULL_KEY_MARKER].into_iter(), 0, out);
}

fn encode_record(units: impl Iterator<Item = u16>, freq: u32, out: &mut [u8]) {
    debug_assert_eq!(out.len(), KEY_SIZE);
    out.fill(0);
    let mut i = 0;
    for u in units.take(MAX_WORD_UNITS) {
        out[i * 2..i * 2 + 2].copy_from_slice(&u.to_be_bytes());
        i += 1;
    }
    out[i * 2..i * 2 + 2].copy_from_slice(&DELIMITER.to_be_bytes());
    out[FREQ_OFFSET..FREQ_OFFSET + 4].copy_from_slice(&freq.to_be_bytes());
}

#[inline]
fn unit_at(record: &[u8], idx: usize) -> u16 {
    u16::from_be_bytes([record[idx * 2], record[idx * 2 + 1]])
}

/// Longest prefix of `word` that fits in [`MAX_WORD_UNITS`] UTF-16 units.
pub fn truncate_word(word: &str) -> &str {
    let mut units = 0;
    for (i, c) in word.char_indices() {
        units += c.len_utf16();
        if units > MAX_WORD_UNITS {
            return &word[..i];
        }
    }
    word
}
