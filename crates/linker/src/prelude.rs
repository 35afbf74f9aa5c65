//! Convenient re-exports of commonly used data types.
//!
//! ```
//! use subleq_linker::prelude::*;
//! ```

#[doc(inline)]
pub use crate::mif::DataWidth;
#[doc(inline)]
pub use crate::object::profile32::{ObjectFile32, Variant};
#[doc(inline)]
pub use crate::object::profile64::ObjectFile64;

/// Contains [`object::Error`], which is used in `Result`s returned by [`ObjectFile32`] and
/// [`ObjectFile64`].
pub mod object {
    pub use crate::object::Error;
}

/// Contains [`link::Error`], which is used in `Result`s returned by [`crate::link::profile32::link`]
/// and [`crate::link::profile64::link`].
pub mod link {
    pub use crate::link::Error;
}

/// Contains [`mif::Error`], which is used in the `Result` returned by [`crate::mif::write_to_path`].
pub mod mif {
    pub use crate::mif::Error;
}
