//! Object-file parsing, relocation, symbol resolution, and `.mif` emission for both SUBLEQ
//! machine profiles.
//!
//! [`object`] parses the on-disk relocatable units, [`stub`] synthesizes the startup stub for
//! `-exec` links, [`link`] runs the five-phase link itself, and [`mif`] renders the result as
//! Altera MIF text.

pub mod link;
pub mod mif;
pub mod object;
pub mod prelude;
pub mod raw;
pub mod stub;

#[cfg(test)]
mod tests {
    //! End-to-end exercises of the full parse → link → render pipeline, one per scenario this
    //! implementation is expected to reproduce exactly.
    use std::collections::{BTreeMap, BTreeSet};

    use crate::link;
    use crate::mif::{self, DataWidth};
    use crate::object::profile32::{ObjectFile32, Variant};
    use crate::object::profile64::{Field, FieldMarks, ObjectFile64};
    use crate::stub;

    fn object32(
        exported: &[(&str, u32)],
        imported: &[(&str, &[u32])],
        relative: &[u32],
        mem: &[u32],
    ) -> ObjectFile32 {
        ObjectFile32 {
            offset: 0,
            text_offset: 0,
            exported: exported.iter().map(|(n, a)| (n.to_string(), *a)).collect(),
            imported: imported.iter().map(|(n, r)| (n.to_string(), r.to_vec())).collect(),
            relative: relative.iter().copied().collect(),
            absolute: BTreeSet::new(),
            mem: mem.to_vec(),
        }
    }

    #[test]
    fn two_file_profile32a_link() {
        let a = object32(&[("main", 0)], &[], &[], &[0x10, 0x11]);
        let b = object32(&[], &[("main", &[0])], &[], &[0xDEAD]);
        let image = link::profile32::link(Variant::A, vec![a, b]).unwrap();
        assert_eq!(image.mem, vec![0x10, 0x11, 0]);

        let words: Vec<u64> = image.mem.into_iter().map(u64::from).collect();
        let text = mif::render(&words, DataWidth::Word32);
        assert!(text.contains("00000000 : 00000010;\n"));
        assert!(text.contains("00000001 : 00000011;\n"));
        assert!(text.contains("00000002 : 00000000;\n"));
    }

    #[test]
    fn profile32a_relocates_relative_addresses() {
        let a = object32(&[], &[], &[], &[0xAA]);
        let b = object32(&[], &[], &[0], &[0x10]);
        let image = link::profile32::link(Variant::A, vec![a, b]).unwrap();
        assert_eq!(image.mem[1], 0x10 + 1); // relocated by file b's load offset (1)
    }

    #[test]
    fn profile32_hybrid_executable_mode() {
        let stub = stub::profile32(Variant::Hybrid);
        let b = object32(&[], &[("start", &[0])], &[], &[0]);
        let image = link::profile32::link(Variant::Hybrid, vec![stub, b]).unwrap();
        image.ensure_resolved().unwrap();
        // stub occupies [0, 4); b's offset is 4, so the stub's `start` site (addr 2)
        // accumulates its placeholder (0) plus the resolved address (4).
        assert_eq!(image.mem[2], 4);
    }

    #[test]
    fn profile64_bitfield_relocation() {
        let padding = ObjectFile64 {
            offset: 0,
            text_offset: 0,
            exported: BTreeMap::new(),
            imported: BTreeMap::new(),
            absolute: BTreeMap::new(),
            mem: vec![0],
        };
        let mut word = 0u64;
        word |= 5 << (2 * subleq_core::prelude::address_width()); // A field = 5
        let target = ObjectFile64 {
            offset: 0,
            text_offset: 0,
            exported: BTreeMap::new(),
            imported: BTreeMap::new(),
            absolute: BTreeMap::new(),
            mem: vec![word],
        };
        let image = link::profile64::link(vec![padding, target]).unwrap();
        let shifted = image.mem[1] >> (2 * subleq_core::prelude::address_width());
        assert_eq!(shifted & u64::from(subleq_core::prelude::address_mask()), 6); // 5 + offset 1
    }

    #[test]
    fn profile64_absolute_marked_field_is_unrelocated() {
        let mut marks = FieldMarks::default();
        marks.set(Field::A);
        let mut absolute = BTreeMap::new();
        absolute.insert(0, marks);
        let word = 7u64 << (2 * subleq_core::prelude::address_width());
        let padding = ObjectFile64 {
            offset: 0,
            text_offset: 0,
            exported: BTreeMap::new(),
            imported: BTreeMap::new(),
            absolute: BTreeMap::new(),
            mem: vec![0],
        };
        let target =
            ObjectFile64 { offset: 0, text_offset: 0, exported: BTreeMap::new(), imported: BTreeMap::new(), absolute, mem: vec![word] };
        let image = link::profile64::link(vec![padding, target]).unwrap();
        let shifted = image.mem[1] >> (2 * subleq_core::prelude::address_width());
        assert_eq!(shifted & u64::from(subleq_core::prelude::address_mask()), 7); // unchanged, marked absolute
    }

    #[test]
    fn unresolved_import_in_object_output_mode_is_tolerated_then_fatal_for_exec() {
        let a = object32(&[], &[("foo", &[0])], &[], &[0]);
        let image = link::profile32::link(Variant::Hybrid, vec![a]).unwrap();
        assert_eq!(image.unresolved["foo"], vec![0]);
        let merged = image.into_object();
        assert_eq!(merged.imported["foo"], vec![0]);

        // Re-running with `start` still missing in executable mode is fatal.
        let stub = stub::profile32(Variant::Hybrid);
        let dangling = object32(&[], &[], &[], &[0]);
        assert!(matches!(
            link::profile32::link(Variant::Hybrid, vec![stub, dangling]).unwrap().ensure_resolved(),
            Err(link::Error::UnresolvedSymbol { .. })
        ));
    }
}
