//! Raw little-endian binary emission for `Variant::Hybrid`'s `-exec` mode, which writes the full
//! linked image to `<out>` as a flat binary alongside the textual MIF at `<out>.mif`.
//!
//! Shares [`mif`](super::mif)'s atomic-write discipline: written to a temporary file beside the
//! destination, then renamed into place.
use std::io::Write as _;
use std::path::{Path, PathBuf};

use snafu::prelude::*;

/// Error conditions raised while emitting a raw binary image.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Thrown when the temporary file or the final rename cannot be written.
    #[snafu(display("could not write binary image {path}: {source}", path = path.display()))]
    Io { path: PathBuf, source: std::io::Error },
}
pub type Result<T> = core::result::Result<T, Error>;

/// Writes `words` (32-bit, little-endian) to `path` as a flat binary image, atomically.
///
/// # Errors
/// Returns [`Error::Io`] if the temporary file cannot be written or the rename fails.
pub fn write_to_path(path: impl AsRef<Path>, words: &[u32]) -> Result<()> {
    let path = path.as_ref();
    let mut bytes = Vec::with_capacity(words.len() * 4);
    for word in words {
        bytes.extend_from_slice(&word.to_le_bytes());
    }

    let tmp_path = path.with_extension("bin.tmp");
    let write = || -> std::io::Result<()> {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(&bytes)?;
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
    fn writes_little_endian_words() {
        let dir = std::env::temp_dir().join(format!("subleq-raw-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("out.bin");
        write_to_path(&target, &[0x0102_0304]).unwrap();
        let bytes = std::fs::read(&target).unwrap();
        assert_eq!(bytes, vec![0x04, 0x03, 0x02, 0x01]);
        std::fs::remove_dir_all(&dir).ok();
    }
}
