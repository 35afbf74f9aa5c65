//! Shared primitives for the `subleq-ld` crates: an endian-fixed byte cursor for the object-file
//! wire format, the machine-width constants every profile derives its addressing from, and (with
//! the `time` feature) a timestamp helper for the CLI's log formatter.

pub mod constants;
pub mod cursor;
pub mod prelude;

#[cfg(feature = "time")]
pub mod time;
