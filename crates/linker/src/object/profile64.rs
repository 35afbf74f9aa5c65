//! Profile-64 object files: one 64-bit word packs a three-address SUBLEQ instruction `⟨A, B, J⟩`.
//!
//! On-disk layout:
//! ```text
//! u32 text_offset;
//! u32 n_exports;      { cstring, u32 local_addr }
//! u32 n_import_syms;  { cstring, u32 n_refs, { u32 addr, u32 field }[n_refs] }
//! u32 n_absolute;      { u32 addr, u32 field }[n_absolute]
//! u32 mem_size;       u64[mem_size] code
//! ```
//! `field` is `0 => A`, `1 => B`, `2 => J`; any other value is [`Error::MalformedField`](super::Error::MalformedField).
use std::collections::BTreeMap;
use std::path::Path;

use snafu::prelude::*;
use subleq_core::cursor::ObjectCursor;
use subleq_core::prelude::address_width;

use super::{
    AddressOutOfRangeSnafu, EmptyCodeSnafu, IoSnafu, MalformedFieldSnafu, Result,
    TextOffsetOutOfRangeSnafu,
};

pub type Address = u32;

/// One of the three address slots packed into a Profile-64 instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    A = 0,
    B = 1,
    J = 2,
}

impl Field {
    /// Maps a wire-format tag to a [`Field`].
    ///
    /// # Errors
    /// Returns [`Error::MalformedField`](super::Error::MalformedField) for any tag other than
    /// `0`, `1`, or `2`.
    #[inline]
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(Self::A),
            1 => Ok(Self::B),
            2 => Ok(Self::J),
            tag => MalformedFieldSnafu { tag }.fail(),
        }
    }

    /// How many `ADDRESS_WIDTH`-sized slots this field sits above the bottom of the word. The A
    /// field occupies the highest slot, J the lowest.
    #[inline]
    #[must_use]
    pub fn shift_multiplier(self) -> u32 {
        match self {
            Self::A => 2,
            Self::B => 1,
            Self::J => 0,
        }
    }

    /// The mask that *clears* this field's bits within an instruction word.
    #[inline]
    #[must_use]
    pub fn clear_mask(self) -> u64 {
        let width = address_width();
        let address_mask = u64::from(subleq_core::prelude::address_mask());
        !(address_mask << (self.shift_multiplier() * width))
    }
}

/// Per-instruction, per-field absolute markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldMarks {
    pub a: bool,
    pub b: bool,
    pub j: bool,
}

impl FieldMarks {
    #[inline]
    #[must_use]
    pub fn get(self, field: Field) -> bool {
        match field {
            Field::A => self.a,
            Field::B => self.b,
            Field::J => self.j,
        }
    }

    #[inline]
    pub fn set(&mut self, field: Field) {
        match field {
            Field::A => self.a = true,
            Field::B => self.b = true,
            Field::J => self.j = true,
        }
    }
}

/// A local address paired with which field of the instruction at that address it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSite {
    pub addr: Address,
    pub field: Field,
}

/// A parsed Profile-64 relocatable unit.
#[derive(Debug, Default)]
pub struct ObjectFile64 {
    pub offset: Address,
    pub text_offset: Address,
    pub exported: BTreeMap<String, Address>,
    pub imported: BTreeMap<String, Vec<ReferenceSite>>,
    pub absolute: BTreeMap<Address, FieldMarks>,
    pub mem: Vec<u64>,
}

impl ObjectFile64 {
    #[must_use]
    #[inline]
    pub fn mem_size(&self) -> Address {
        self.mem.len() as Address
    }

    /// Parses an in-memory Profile-64 object file.
    ///
    /// # Errors
    /// Returns [`Error::Truncated`](super::Error::Truncated) on a short read,
    /// [`Error::MalformedField`](super::Error::MalformedField) for an invalid field tag, or
    /// [`Error::AddressOutOfRange`](super::Error::AddressOutOfRange) /
    /// [`Error::TextOffsetOutOfRange`](super::Error::TextOffsetOutOfRange) if the tables disagree
    /// with the declared `mem_size`.
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        let mut cursor = ObjectCursor::new(data);
        let mut file = ObjectFile64::default();

        file.text_offset = cursor.read_u32()?;

        let n_exports = cursor.read_u32()?;
        for _ in 0..n_exports {
            let symbol = cursor.read_cstring()?;
            let addr = cursor.read_u32()?;
            file.exported.insert(symbol, addr);
        }

        let n_import_syms = cursor.read_u32()?;
        for _ in 0..n_import_syms {
            let symbol = cursor.read_cstring()?;
            let n_refs = cursor.read_u32()?;
            let refs = file.imported.entry(symbol).or_default();
            for _ in 0..n_refs {
                let addr = cursor.read_u32()?;
                let field = Field::from_tag(cursor.read_u32()?)?;
                refs.push(ReferenceSite { addr, field });
            }
        }

        let n_absolute = cursor.read_u32()?;
        for _ in 0..n_absolute {
            let addr = cursor.read_u32()?;
            let field = Field::from_tag(cursor.read_u32()?)?;
            file.absolute.entry(addr).or_default().set(field);
        }

        let mem_size = cursor.read_u32()?;
        ensure!(mem_size > 0, EmptyCodeSnafu);
        let mut mem = Vec::with_capacity(mem_size as usize);
        for _ in 0..mem_size {
            mem.push(cursor.read_u64()?);
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
            for site in refs {
                in_range(site.addr)?;
            }
        }
        for &addr in self.absolute.keys() {
            in_range(addr)?;
        }
        Ok(())
    }

    /// Reads and parses an object file from disk.
    ///
    /// # Errors
    /// Returns [`Error::Io`](super::Error::Io) if the file cannot be read, or any parse error
    /// from [`Self::parse`].
    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).context(IoSnafu { path: path.to_path_buf() })?;
        Self::parse(data)
    }
}
