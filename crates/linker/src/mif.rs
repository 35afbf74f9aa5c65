//! Altera Memory Initialization File (`.mif`) emission.
//!
//! Output is written to a temporary file in the destination's directory and atomically renamed
//! into place, so a crash or a `Ctrl-C` mid-write never leaves a truncated `.mif` at the
//! requested path.
use std::io::Write as _;
use std::path::{Path, PathBuf};

use snafu::prelude::*;

use subleq_core::prelude::MEM_WORDS;

/// Address column width: 8 lowercase hex digits, regardless of `MEM_WORDS`.
const ADDRESS_HEX_DIGITS: usize = 8;

/// Error conditions raised while emitting a `.mif` file.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Thrown when the temporary file or the final rename cannot be written.
    #[snafu(display("could not write MIF file {path}: {source}", path = path.display()))]
    Io { path: PathBuf, source: std::io::Error },
}
pub type Result<T> = core::result::Result<T, Error>;

/// How wide each data word is rendered: Profile-32 uses 8 hex digits, Profile-64 uses 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataWidth {
    Word32,
    Word64,
}

impl DataWidth {
    #[inline]
    fn bits(self) -> u32 {
        match self {
            Self::Word32 => 32,
            Self::Word64 => 64,
        }
    }

    #[inline]
    fn hex_digits(self) -> usize {
        match self {
            Self::Word32 => 8,
            Self::Word64 => 16,
        }
    }
}

/// Renders a linked image as Altera MIF text. Only `words` (the populated prefix of the image)
/// is emitted; the declared `DEPTH` always reflects the full `MEM_WORDS` address space.
pub fn render(words: &[u64], width: DataWidth) -> String {
    let mut out = String::new();
    out.push_str(&format!("DEPTH = {MEM_WORDS};\n"));
    out.push_str(&format!("WIDTH = {};\n", width.bits()));
    out.push_str("ADDRESS_RADIX = HEX;\n");
    out.push_str("DATA_RADIX = HEX;\n");
    out.push_str("CONTENT\n");
    out.push_str("BEGIN\n\n");
    for (addr, &word) in words.iter().enumerate() {
        out.push_str(&format!(
            "{addr:0aw$x} : {word:0dw$x};\n",
            aw = ADDRESS_HEX_DIGITS,
            dw = width.hex_digits(),
        ));
    }
    out.push('\n');
    out.push_str("END;\n");
    out
}

/// Writes a linked image to `path` as an Altera MIF file, atomically.
///
/// # Errors
/// Returns [`Error::Io`] if the temporary file cannot be written or the rename fails.
pub fn write_to_path(path: impl AsRef<Path>, words: &[u64], width: DataWidth) -> Result<()> {
    let path = path.as_ref();
    let contents = render(words, width);

    let tmp_path = path.with_extension("mif.tmp");
    let write = || -> std::io::Result<()> {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    };
    write().context(IoSnafu { path: path.to_path_buf() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_header_and_rows() {
        let text = render(&[0x10, 0x20], DataWidth::Word32);
        assert!(text.starts_with("DEPTH = 8192;\n"));
        assert!(text.contains("WIDTH = 32;\n"));
        assert!(text.contains("CONTENT\nBEGIN\n\n"));
        assert!(text.contains("00000000 : 00000010;\n"));
        assert!(text.contains("00000001 : 00000020;\n"));
        assert!(text.trim_end().ends_with("END;"));
    }

    #[test]
    fn renders_64_bit_words_with_sixteen_digits() {
        let text = render(&[0xDEAD_BEEF], DataWidth::Word64);
        assert!(text.contains("00000000 : 00000000deadbeef;\n"));
    }

    #[test]
    fn write_to_path_is_atomic_via_rename() {
        let dir = std::env::temp_dir().join(format!("subleq-mif-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("out.mif");
        write_to_path(&target, &[1, 2, 3], DataWidth::Word32).unwrap();
        assert!(target.exists());
        assert!(!target.with_extension("mif.tmp").exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
