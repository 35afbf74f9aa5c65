//! The Profile-32 link: offset assignment, relocation, symbol table assembly, concatenation, and
//! reference resolution, parameterized over [`Variant`].
//!
//! Relocation and resolution differ per variant:
//! - **Variant::A**: every address in `relative` gets `+= offset` during relocation (Phase 2);
//!   import references are resolved by overwrite (Phase 5: `mem[site] = target`).
//! - **Variant::B**: every code word from `text_offset` to `mem_size` *not* marked `absolute` gets
//!   `+= offset`; import references resolve the same way, by overwrite.
//! - **Variant::Hybrid**: every address in `relative` gets `+= offset` during relocation, *unless*
//!   that same address is also an import reference site, in which case the `+= offset` is
//!   deferred to Phase 5 and folded into the resolution write (`mem[site] += target`) instead.
//!   Reference sites that aren't in `relative` simply accumulate `+= target` on top of whatever
//!   placeholder they held. Either way resolution is additive, never an overwrite.
use std::collections::{BTreeMap, BTreeSet};

use snafu::prelude::*;
use subleq_core::prelude::MEM_WORDS;

use super::{ImageOverflowSnafu, Result, UnresolvedSymbolSnafu};
use crate::object::profile32::{Address, ObjectFile32, Variant};

/// The concatenated Profile-32 image.
///
/// `unresolved` is only ever non-empty for `Variant::Hybrid`: every other variant treats a
/// dangling import as fatal inside [`link`] itself. A caller producing a final executable MIF
/// must reject a non-empty `unresolved` with [`super::Error::UnresolvedSymbol`]; a caller
/// re-emitting a mergeable object file (non-`-exec` Hybrid mode) carries it forward via
/// [`LinkedImage32::into_object`].
#[derive(Debug)]
pub struct LinkedImage32 {
    pub mem: Vec<u32>,
    pub exported: BTreeMap<String, Address>,
    pub relative: BTreeSet<Address>,
    pub unresolved: BTreeMap<String, Vec<Address>>,
}

impl LinkedImage32 {
    /// Returns the first unresolved symbol name, if any.
    ///
    /// # Errors
    /// Returns [`super::Error::UnresolvedSymbol`] if `unresolved` is non-empty.
    pub fn ensure_resolved(&self) -> Result<()> {
        if let Some(name) = self.unresolved.keys().next() {
            return UnresolvedSymbolSnafu { name: name.clone() }.fail();
        }
        Ok(())
    }

    /// Re-packages a partially-resolved Hybrid image as a new mergeable [`ObjectFile32`], so it
    /// can be fed back into a later link alongside further object files.
    #[must_use]
    pub fn into_object(self) -> ObjectFile32 {
        ObjectFile32 {
            offset: 0,
            text_offset: 0,
            exported: self.exported,
            imported: self.unresolved,
            relative: self.relative,
            absolute: BTreeSet::new(),
            mem: self.mem,
        }
    }
}

/// Links a set of Profile-32 object files (already including a startup stub, if `-exec` was
/// requested) into one image.
///
/// # Errors
/// Returns [`Error::ImageOverflow`](super::Error::ImageOverflow) if the concatenated image
/// exceeds `MEM_WORDS`. For `Variant::A`/`Variant::B`, also returns
/// [`Error::UnresolvedSymbol`](super::Error::UnresolvedSymbol) directly, since those variants have
/// no re-emission path to carry a dangling import forward.
pub fn link(variant: Variant, mut files: Vec<ObjectFile32>) -> Result<LinkedImage32> {
    log::debug!("Linking {} files for Profile-32 ({variant:?})", files.len());

    // Phase 1: offset assignment.
    let mut cursor: Address = 0;
    for file in &mut files {
        file.offset = cursor;
        cursor += file.mem_size();
    }
    ensure!(cursor <= MEM_WORDS, ImageOverflowSnafu { size: cursor, mem_words: MEM_WORDS });

    // Phase 2: per-file relocation.
    let mut relative = BTreeSet::new();
    for file in &mut files {
        relocate(variant, file, &mut relative);
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
    let mut unresolved: BTreeMap<String, Vec<Address>> = BTreeMap::new();
    for file in &files {
        for (name, refs) in &file.imported {
            let Some(&target) = symbols.get(name) else {
                let sites = refs.iter().map(|&addr| file.offset + addr).collect::<Vec<_>>();
                match variant {
                    Variant::A | Variant::B => {
                        return UnresolvedSymbolSnafu { name: name.clone() }.fail();
                    }
                    Variant::Hybrid => {
                        unresolved.entry(name.clone()).or_default().extend(sites);
                        continue;
                    }
                }
            };
            for &addr in refs {
                let site = (file.offset + addr) as usize;
                match variant {
                    Variant::A | Variant::B => mem[site] = target,
                    Variant::Hybrid => mem[site] = mem[site].wrapping_add(target),
                }
            }
        }
    }

    Ok(LinkedImage32 { mem, exported: symbols, relative, unresolved })
}

fn relocate(variant: Variant, file: &mut ObjectFile32, relative: &mut BTreeSet<Address>) {
    match variant {
        Variant::A => {
            for &addr in &file.relative {
                let slot = addr as usize;
                file.mem[slot] = file.mem[slot].wrapping_add(file.offset);
                relative.insert(file.offset + addr);
            }
        }
        Variant::Hybrid => {
            let deferred: BTreeSet<Address> =
                file.imported.values().flatten().copied().filter(|addr| file.relative.contains(addr)).collect();
            for &addr in &file.relative {
                relative.insert(file.offset + addr);
                if deferred.contains(&addr) {
                    continue;
                }
                let slot = addr as usize;
                file.mem[slot] = file.mem[slot].wrapping_add(file.offset);
            }
        }
        Variant::B => {
            for addr in file.text_offset..file.mem_size() {
                if file.absolute.contains(&addr) {
                    continue;
                }
                let slot = addr as usize;
                file.mem[slot] = file.mem[slot].wrapping_add(file.offset);
                relative.insert(file.offset + addr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;

    fn file(
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
    fn variant_a_links_two_files_and_resolves_overwrite() {
        let a = file(&[("start", 0)], &[], &[], &[0, 0, 0]);
        let b = file(&[], &[("start", &[0])], &[], &[0]);
        let image = link(Variant::A, vec![a, b]).unwrap();
        assert_eq!(image.mem, vec![0, 0, 0, 0]);
    }

    #[test]
    fn variant_a_relocates_relative_slots_by_offset() {
        let a = file(&[], &[], &[], &[0xAA, 0xBB]);
        let b = file(&[], &[], &[0], &[5]);
        let image = link(Variant::A, vec![a, b]).unwrap();
        assert_eq!(image.mem[2], 5 + 2); // relocated by file b's offset of 2
    }

    #[test]
    fn variant_hybrid_relocates_non_import_relative_slots_eagerly() {
        let stub = file(&[], &[("start", &[1])], &[0, 1], &[0xAA, 0]);
        let callee = file(&[("start", 0)], &[], &[], &[0xFF]);
        let image = link(Variant::Hybrid, vec![stub, callee]).unwrap();
        // slot 0 is relative but not an import site: relocated eagerly by the stub's own offset (0).
        assert_eq!(image.mem[0], 0xAA);
        // slot 1 is both relative and an import site: deferred, then resolved additively to the
        // callee's offset (2) on top of its original placeholder value (0).
        assert_eq!(image.mem[1], 2);
    }

    #[test]
    fn unresolved_import_is_an_error() {
        let lone = file(&[], &[("missing", &[0])], &[], &[0]);
        assert!(matches!(
            link(Variant::A, vec![lone]),
            Err(super::super::Error::UnresolvedSymbol { .. })
        ));
    }

    #[test]
    fn hybrid_unresolved_import_is_tolerated_and_carried_forward() {
        let lone = file(&[], &[("missing", &[0])], &[], &[0]);
        let image = link(Variant::Hybrid, vec![lone]).unwrap();
        assert_eq!(image.unresolved["missing"], vec![0]);
        assert!(image.ensure_resolved().is_err());

        let merged = image.into_object();
        assert_eq!(merged.imported["missing"], vec![0]);
    }

    #[test]
    fn image_overflow_is_rejected() {
        let huge = file(&[], &[], &[], &vec![0; (MEM_WORDS + 1) as usize]);
        assert!(matches!(
            link(Variant::A, vec![huge]),
            Err(super::super::Error::ImageOverflow { .. })
        ));
    }
}
