//! The Profile-64 link: identical five phases to [`super::profile32`], but relocation and
//! resolution act on one field of a packed instruction word rather than a whole word.
//!
//! Phase 2 adds each file's offset into every field of every instruction from `text_offset`
//! onward that isn't marked `absolute` (fields below `text_offset` are data and untouched).
//! Phase 5 then resolves import reference sites by clearing and overwriting their field outright,
//! unconditionally — the `absolute` marker only exempts a field from Phase 2 relocation, it has no
//! bearing on Phase 5 resolution, since an import reference site is by definition going to hold a
//! linker-assigned address rather than a relocated placeholder.
use std::collections::BTreeMap;

use snafu::prelude::*;
use subleq_core::prelude::{address_mask, address_width, MEM_WORDS};

use super::{ImageOverflowSnafu, Result, UnresolvedSymbolSnafu};
use crate::object::profile64::{Address, Field, ObjectFile64};

/// The concatenated, fully-resolved Profile-64 image ready for MIF emission.
#[derive(Debug)]
pub struct LinkedImage64 {
    pub mem: Vec<u64>,
}

/// Links a set of Profile-64 object files (already including a startup stub, if `-exec` was
/// requested) into one image.
///
/// # Errors
/// Returns [`Error::ImageOverflow`](super::Error::ImageOverflow) if the concatenated image
/// exceeds `MEM_WORDS`, or [`Error::UnresolvedSymbol`](super::Error::UnresolvedSymbol) if any
/// imported symbol is never exported.
pub fn link(mut files: Vec<ObjectFile64>) -> Result<LinkedImage64> {
    log::debug!("Linking {} files for Profile-64", files.len());

    // Phase 1: offset assignment.
    let mut cursor: Address = 0;
    for file in &mut files {
        file.offset = cursor;
        cursor += file.mem_size();
    }
    ensure!(cursor <= MEM_WORDS, ImageOverflowSnafu { size: cursor, mem_words: MEM_WORDS });

    // Phase 2: per-file relocation.
    for file in &mut files {
        relocate(file);
    }

    // Phase 3: symbol table assembly.
    let mut symbols: BTreeMap<String, Address> = BTreeMap::new();
    for file in &files {
        for (name, &local_addr) in &file.exported {
            if symbols.insert(name.clone(), file.offset + local_addr).is_some() {
                log::warn!("duplicate export `{name}`, last definition wins");
            }
        }
    }

    // Phase 4: concatenation.
    let mut mem = Vec::with_capacity(cursor as usize);
    for file in &files {
        mem.extend_from_slice(&file.mem);
    }

    // Phase 5: reference resolution.
    for file in &files {
        for (name, refs) in &file.imported {
            let target = symbols.get(name).copied().context(UnresolvedSymbolSnafu { name: name.clone() })?;
            for site in refs {
                let index = (file.offset + site.addr) as usize;
                mem[index] = write_field(mem[index], site.field, target);
            }
        }
    }

    Ok(LinkedImage64 { mem })
}

fn relocate(file: &mut ObjectFile64) {
    for addr in file.text_offset..file.mem_size() {
        for field in [Field::A, Field::B, Field::J] {
            if file.absolute.get(&addr).is_some_and(|marks| marks.get(field)) {
                continue;
            }
            let index = addr as usize;
            let relocated = (read_field(file.mem[index], field) + file.offset) & address_mask();
            file.mem[index] = write_field(file.mem[index], field, relocated);
        }
    }
}

fn read_field(word: u64, field: Field) -> Address {
    let width = address_width();
    let shift = field.shift_multiplier() * width;
    ((word >> shift) & u64::from(address_mask())) as Address
}

fn write_field(word: u64, field: Field, value: Address) -> u64 {
    let width = address_width();
    let shift = field.shift_multiplier() * width;
    (word & field.clear_mask()) | (u64::from(value) << shift)
}
