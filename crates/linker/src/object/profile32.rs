//! Profile-32 object files: one word per address, three on-disk variants.
//!
//! **Variant::A** (pure object-linker format):
//! ```text
//! u32 n_exports;        { cstring symbol, u32 local_addr }
//! u32 n_import_symbols; { cstring symbol, u32 n_refs, u32[n_refs] ref_addrs }
//! u32 n_relative;       u32[n_relative] relative_addrs
//! u32 mem_size;         u32[mem_size] code
//! ```
//!
//! **Variant::B** prepends `u32 text_offset` and swaps the `relative` section for `absolute`.
//!
//! **Variant::Hybrid** shares Variant::A's on-disk layout; it differs only in how the Linker
//! relocates and resolves against the `relative` set (see `subleq_linker::link::profile32`).
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use snafu::prelude::*;
use subleq_core::cursor::ObjectCursor;

use super::{AddressOutOfRangeSnafu, EmptyCodeSnafu, IoSnafu, Result, TextOffsetOutOfRangeSnafu};

pub type Address = u32;

/// Which of the three Profile-32 object-format/relocation-policy combinations this file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Unconditional `relative` relocation, overwrite resolution.
    A,
    /// `text_offset` + `absolute` markers, overwrite resolution.
    B,
    /// Same wire format as [`Variant::A`], deferred relocation, additive resolution.
    Hybrid,
}

/// A parsed Profile-32 relocatable unit.
#[derive(Debug, Default)]
pub struct ObjectFile32 {
    /// Load offset assigned by the Linker during Phase 1. Zero until then.
    pub offset: Address,
    /// First index of executable code; earlier indices are data (Variant::B only).
    pub text_offset: Address,
    pub exported: BTreeMap<String, Address>,
    pub imported: BTreeMap<String, Vec<Address>>,
    /// Slots relocated unconditionally (Variant::A) or deferred-if-pending (Variant::Hybrid).
    pub relative: BTreeSet<Address>,
    /// Slots exempt from relocation (Variant::B only).
    pub absolute: BTreeSet<Address>,
    pub mem: Vec<u32>,
}

impl ObjectFile32 {
    #[must_use]
    #[inline]
    pub fn mem_size(&self) -> Address {
        self.mem.len() as Address
    }

    /// Parses an in-memory object file of the given `variant`.
    ///
    /// # Errors
    /// Returns [`Error::Truncated`](super::Error::Truncated) on a short read, or
    /// [`Error::AddressOutOfRange`](super::Error::AddressOutOfRange) /
    /// [`Error::TextOffsetOutOfRange`](super::Error::TextOffsetOutOfRange) if the file's own
    /// tables disagree with its declared `mem_size`.
    pub fn parse(variant: Variant, data: Vec<u8>) -> Result<Self> {
        let mut cursor = ObjectCursor::new(data);
        let mut file = ObjectFile32::default();

        if variant == Variant::B {
            file.text_offset = cursor.read_u32()?;
        }

        let n_exports = cursor.read_u32()?;
        for _ in 0..n_exports {
            let symbol = cursor.read_cstring()?;
            let addr = cursor.read_u32()?;
            file.exported.insert(symbol, addr);
        }

        let n_import_symbols = cursor.read_u32()?;
        for _ in 0..n_import_symbols {
            let symbol = cursor.read_cstring()?;
            let n_refs = cursor.read_u32()?;
            let refs = file.imported.entry(symbol).or_default();
            for _ in 0..n_refs {
                refs.push(cursor.read_u32()?);
            }
        }

        match variant {
            Variant::A | Variant::Hybrid => {
                let n_relative = cursor.read_u32()?;
                for _ in 0..n_relative {
                    file.relative.insert(cursor.read_u32()?);
                }
            }
            Variant::B => {
                let n_absolute = cursor.read_u32()?;
                for _ in 0..n_absolute {
                    file.absolute.insert(cursor.read_u32()?);
                }
            }
        }

        let mem_size = cursor.read_u32()?;
        ensure!(mem_size > 0, EmptyCodeSnafu);
        let mut mem = Vec::with_capacity(mem_size as usize);
        for _ in 0..mem_size {
            mem.push(cursor.read_u32()?);
        }
        file.mem = mem;

        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<()> {
        let mem_size = self.mem_size();
        ensure!(
            self.text_offset <= mem_size,
            TextOffsetOutOfRangeSnafu { text_offset: self.text_offset, mem_size }
        );
        let in_range = |addr: Address| -> Result<()> {
            ensure!(addr < mem_size, AddressOutOfRangeSnafu { addr, mem_size });
            Ok(())
        };
        for &addr in self.exported.values() {
            in_range(addr)?;
        }
        for refs in self.imported.values() {
            for &addr in refs {
                in_range(addr)?;
            }
        }
        for &addr in self.relative.iter().chain(self.absolute.iter()) {
            in_range(addr)?;
        }
        Ok(())
    }

    /// Reads and parses an object file from disk.
    ///
    /// # Errors
    /// Returns [`Error::Io`](super::Error::Io) if the file cannot be read, or any parse error
    /// from [`Self::parse`].
    pub fn read_from_path(variant: Variant, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).context(IoSnafu { path: path.to_path_buf() })?;
        Self::parse(variant, data)
    }

    /// Encodes this file back to Variant::A's on-disk wire format.
    ///
    /// Used to re-emit a partially-linked Hybrid image as a mergeable object file: `text_offset`
    /// and `absolute` have no representation in Variant::A's layout, so callers that rely on them
    /// (Variant::B) must not round-trip through this method.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut cursor = ObjectCursor::empty();
        cursor.write_u32(self.exported.len() as u32);
        for (symbol, addr) in &self.exported {
            cursor.write_cstring(symbol);
            cursor.write_u32(*addr);
        }
        cursor.write_u32(self.imported.len() as u32);
        for (symbol, refs) in &self.imported {
            cursor.write_cstring(symbol);
            cursor.write_u32(refs.len() as u32);
            for addr in refs {
                cursor.write_u32(*addr);
            }
        }
        cursor.write_u32(self.relative.len() as u32);
        for addr in &self.relative {
            cursor.write_u32(*addr);
        }
        cursor.write_u32(self.mem_size());
        for word in &self.mem {
            cursor.write_u32(*word);
        }
        cursor.into_inner()
    }
}
