//! Parsed relocatable units: one variant family for Profile-32, one for Profile-64.
//!
//! Both [`profile32::ObjectFile32`] and [`profile64::ObjectFile64`] are built by reading a flat,
//! little-endian binary layout (see each module's doc comment) through a [`subleq_core::cursor::ObjectCursor`].
//! Neither profile's format is self-describing about which variant produced it — the caller (the
//! driver, from its `--profile` flag) decides which layout to parse with.

pub mod profile32;
pub mod profile64;

use std::path::PathBuf;

use snafu::prelude::*;

/// Error conditions for parsing an object file, for either profile.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Thrown if reading runs past the end of the buffer mid-field.
    #[snafu(display("unexpected end-of-file while parsing object data"))]
    Truncated,
    /// Thrown if a symbol name exceeds the cursor's safety cap.
    #[snafu(display("symbol name exceeds the maximum allowed length"))]
    OversizedSymbol,
    /// Thrown for a Profile-64 reference or absolute-marker field tag outside 0, 1, or 2.
    #[snafu(display("invalid field tag {tag} (expected 0=A, 1=B, or 2=J)"))]
    MalformedField { tag: u32 },
    /// Thrown if an object declares zero words of code.
    #[snafu(display("object file contains no code"))]
    EmptyCode,
    /// Thrown if `text_offset` exceeds `mem_size`.
    #[snafu(display("text_offset {text_offset} exceeds mem_size {mem_size}"))]
    TextOffsetOutOfRange { text_offset: u32, mem_size: u32 },
    /// Thrown if an exported, imported, relative, or absolute address is `>= mem_size`.
    #[snafu(display("address {addr:#x} is out of range for a {mem_size}-word object"))]
    AddressOutOfRange { addr: u32, mem_size: u32 },
    /// Thrown when the object file cannot be read from disk.
    #[snafu(display("could not read object file {path}: {source}", path = path.display()))]
    Io { path: PathBuf, source: std::io::Error },
}
pub type Result<T> = core::result::Result<T, Error>;

impl From<subleq_core::cursor::Error> for Error {
    #[inline]
    fn from(error: subleq_core::cursor::Error) -> Self {
        match error {
            subleq_core::cursor::Error::Truncated => Self::Truncated,
            subleq_core::cursor::Error::OversizedSymbol => Self::OversizedSymbol,
            _ => unreachable!("subleq_core::cursor::Error has no other variants"),
        }
    }
}
