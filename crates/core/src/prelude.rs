//! Convenient re-exports of commonly used data types, designed to make crate usage painless.
//!
//! For example, when working with [`ObjectCursor`], you have to explicitly refer to
//! [`cursor::Error`].
//!
//! The contents of this module can be used by including the following in any module:
//! ```
//! use subleq_core::prelude::*;
//! ```

#[doc(inline)]
pub use crate::constants::{MEM_WORDS, address_mask, address_width};
#[doc(inline)]
pub use crate::cursor::ObjectCursor;

/// Contains [`cursor::Error`], which is used in `Result`s returned by [`ObjectCursor`].
pub mod cursor {
    pub use crate::cursor::Error;
}

#[cfg(all(feature = "time", feature = "std"))]
pub mod time {
    pub use crate::time::*;
}
