//! Synthetic startup stubs prepended to an `-exec` link.
//!
//! An executable image needs a transfer of control into `start` before anything else runs. Each
//! profile/variant gets its own tiny [`ObjectFile32`]/[`ObjectFile64`] built in memory rather than
//! read from disk, so it flows through the same offset-assignment and relocation phases as every
//! other input file.
use std::collections::{BTreeMap, BTreeSet};

use crate::object::profile32::{ObjectFile32, Variant};
use crate::object::profile64::{Field, ObjectFile64, ReferenceSite};

/// Builds the startup stub for a Profile-32 link.
///
/// `Variant::A` and `Variant::B` share a 3-word `SUBLEQ 0, 0, start` stub: the first instruction's
/// `J` slot (address 2) imports `start`, and every slot is zeroed so relocation has nothing to add
/// for Variant::A or mark absolute for Variant::B.
///
/// `Variant::Hybrid` instead emits a 4-word stub (`SUBLEQ 3, 3, 0` then a halt word) with every
/// slot in its own `relative` set, so the Linker's deferred-relocation pass sees real base
/// addresses to resolve `start` against later.
#[must_use]
pub fn profile32(variant: Variant) -> ObjectFile32 {
    let mut imported = BTreeMap::new();
    match variant {
        Variant::A | Variant::B => {
            imported.insert("start".to_string(), vec![2]);
            ObjectFile32 {
                offset: 0,
                text_offset: 0,
                exported: BTreeMap::new(),
                imported,
                relative: BTreeSet::new(),
                absolute: BTreeSet::new(),
                mem: vec![0, 0, 0],
            }
        }
        Variant::Hybrid => {
            imported.insert("start".to_string(), vec![2]);
            ObjectFile32 {
                offset: 0,
                text_offset: 0,
                exported: BTreeMap::new(),
                imported,
                relative: BTreeSet::from([0, 1, 2, 3]),
                absolute: BTreeSet::new(),
                mem: vec![3, 3, 0, 0],
            }
        }
    }
}

/// Builds the Profile-64 startup stub: a fixed two-word `mem = [0x0000_0000_0400_2000, 0]`, whose
/// first word's `J` field imports `start`. The exact byte pattern is part of the external
/// contract — the resulting image's first words determine the machine's boot behavior, so this is
/// not a derived or simplified encoding.
#[must_use]
pub fn profile64() -> ObjectFile64 {
    let mut imported = BTreeMap::new();
    imported.insert("start".to_string(), vec![ReferenceSite { addr: 0, field: Field::J }]);
    ObjectFile64 {
        offset: 0,
        text_offset: 0,
        exported: BTreeMap::new(),
        imported,
        absolute: BTreeMap::new(),
        mem: vec![0x0000_0000_0400_2000, 0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile32_a_stub_imports_start_at_slot_two() {
        let stub = profile32(Variant::A);
        assert_eq!(stub.imported["start"], vec![2]);
        assert_eq!(stub.mem, vec![0, 0, 0]);
        assert!(stub.relative.is_empty());
    }

    #[test]
    fn profile32_hybrid_stub_marks_every_slot_relative() {
        let stub = profile32(Variant::Hybrid);
        assert_eq!(stub.relative.len(), 4);
        assert_eq!(stub.mem, vec![3, 3, 0, 0]);
    }

    #[test]
    fn profile64_stub_imports_start_into_j_field() {
        let stub = profile64();
        assert_eq!(stub.imported["start"], vec![ReferenceSite { addr: 0, field: Field::J }]);
        assert_eq!(stub.mem, vec![0x0000_0000_0400_2000, 0]);
    }
}
