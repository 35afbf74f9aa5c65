//! The five-phase link: offset assignment, per-file relocation, symbol table assembly,
//! concatenation, and reference resolution. See [`profile32`] and [`profile64`] for the two
//! profile-specific pipelines; the phases themselves are identical in shape across both, only the
//! relocation and resolution rules differ.
pub mod profile32;
pub mod profile64;

use snafu::prelude::*;

/// Error conditions raised while linking a set of parsed object files together.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Thrown if the concatenated image would not fit in the target's word-addressable memory.
    #[snafu(display("linked image of {size} words overflows {mem_words}-word memory"))]
    ImageOverflow { size: u32, mem_words: u32 },
    /// Thrown if an imported symbol is never exported by any input file, when producing a final
    /// executable image (`Variant::A`, `Variant::B`, `Variant::Hybrid` with `-exec`, or
    /// Profile-64). `Variant::Hybrid` without `-exec` tolerates this instead; see
    /// [`profile32::LinkedImage32::unresolved`].
    #[snafu(display("unresolved symbol `{name}`"))]
    UnresolvedSymbol { name: String },
}
pub type Result<T> = core::result::Result<T, Error>;
