//! Little-endian, length-prefixed reading and writing for the object-file wire format.
//!
//! [`ObjectCursor`] wraps an owned byte buffer the way [a general-purpose data
//! cursor](https://docs.rs/orthrus-core) would, but is fixed to little-endian and specialized to
//! the primitives the object format actually needs: fixed-width words and NUL-terminated symbol
//! strings. There is no byte-order choice to make here — the format is little-endian by fiat (see
//! the design notes on endianness), so exposing one would just be an unused knob.

use snafu::prelude::*;

/// Safety cap on how long a single symbol name may be before a read is rejected outright.
pub const MAX_SYMBOL_LEN: usize = 4096;

/// Error conditions for reading or writing through an [`ObjectCursor`].
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Thrown when a read runs past the end of the buffer mid-field.
    #[snafu(display("Unexpected end-of-file while reading object data"))]
    Truncated,
    /// Thrown when a symbol string exceeds [`MAX_SYMBOL_LEN`] without a NUL terminator.
    #[snafu(display("Symbol name exceeds {MAX_SYMBOL_LEN} bytes without a terminator"))]
    OversizedSymbol,
}
pub type Result<T> = core::result::Result<T, Error>;

/// An owned, little-endian cursor over a byte buffer.
///
/// Used both to parse incoming object files and, for the hybrid profile's object re-emission
/// path, to build one back up from a linked image.
#[derive(Debug, Default)]
pub struct ObjectCursor {
    data: Vec<u8>,
    pos: usize,
}

impl ObjectCursor {
    /// Wraps an existing byte buffer for reading.
    #[inline]
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// Starts an empty cursor for writing.
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self { data: Vec::new(), pos: 0 }
    }

    /// Returns the current byte position of this cursor.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of unread bytes remaining.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns `true` if every byte has been consumed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Consumes the cursor, returning the underlying buffer.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn take(&mut self, length: usize) -> Result<&[u8]> {
        ensure!(self.remaining() >= length, TruncatedSnafu);
        let slice = &self.data[self.pos..self.pos + length];
        self.pos += length;
        Ok(slice)
    }

    /// Reads a single `u32` in little-endian order.
    ///
    /// # Errors
    /// Returns [`Truncated`](Error::Truncated) if fewer than four bytes remain.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes: [u8; 4] = self.take(4)?.try_into().expect("length checked above");
        Ok(u32::from_le_bytes(bytes))
    }

    /// Reads a single `u64` in little-endian order.
    ///
    /// # Errors
    /// Returns [`Truncated`](Error::Truncated) if fewer than eight bytes remain.
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("length checked above");
        Ok(u64::from_le_bytes(bytes))
    }

    /// Reads a NUL-terminated symbol string, one byte at a time, stopping at and consuming the
    /// terminator without including it in the returned [`String`].
    ///
    /// # Errors
    /// Returns [`Truncated`](Error::Truncated) if EOF is reached before a NUL byte, or
    /// [`OversizedSymbol`](Error::OversizedSymbol) if the symbol exceeds [`MAX_SYMBOL_LEN`] bytes.
    #[inline]
    pub fn read_cstring(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            let byte = self.take(1)?[0];
            if byte == 0 {
                break;
            }
            ensure!(bytes.len() < MAX_SYMBOL_LEN, OversizedSymbolSnafu);
            bytes.push(byte);
        }
        // The on-disk format doesn't guarantee UTF-8, but every assembler producing these symbols
        // emits ASCII identifiers; lossy conversion keeps parsing infallible for malformed input.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Appends a `u32` in little-endian order.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a `u64` in little-endian order.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a symbol string followed by a NUL terminator.
    #[inline]
    pub fn write_cstring(&mut self, value: &str) {
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_words() {
        let mut cursor = ObjectCursor::empty();
        cursor.write_u32(0x1122_3344);
        cursor.write_u64(0x0011_2233_4455_6677);

        let mut reader = ObjectCursor::new(cursor.into_inner());
        assert_eq!(reader.read_u32().unwrap(), 0x1122_3344);
        assert_eq!(reader.read_u64().unwrap(), 0x0011_2233_4455_6677);
        assert!(reader.is_empty());
    }

    #[test]
    fn round_trips_cstring() {
        let mut cursor = ObjectCursor::empty();
        cursor.write_cstring("start");
        let mut reader = ObjectCursor::new(cursor.into_inner());
        assert_eq!(reader.read_cstring().unwrap(), "start");
    }

    #[test]
    fn truncated_word_errors() {
        let mut reader = ObjectCursor::new(vec![1, 2]);
        assert!(matches!(reader.read_u32(), Err(Error::Truncated)));
    }

    #[test]
    fn truncated_cstring_errors() {
        let mut reader = ObjectCursor::new(vec![b'a', b'b']);
        assert!(matches!(reader.read_cstring(), Err(Error::Truncated)));
    }

    #[test]
    fn oversized_symbol_errors() {
        let data = vec![b'a'; MAX_SYMBOL_LEN + 1];
        let mut reader = ObjectCursor::new(data);
        assert!(matches!(reader.read_cstring(), Err(Error::OversizedSymbol)));
    }
}
