//! Small filesystem helpers.
//!
//! Output files are written through [`atomic_write_bytes`]: the content goes
//! to a temp file in the destination directory which is then renamed into
//! place, so a crashed run never leaves a truncated cache or data file.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

fn parent_dir_or_dot(path: &Path) -> &Path {
    // `Path::parent` returns `Some("")` for bare relative file names.
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Atomically replace `dest` with `bytes`, creating parent directories.
pub fn atomic_write_bytes(dest: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    let dest = dest.as_ref();
    let dir = parent_dir_or_dot(dest);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// Copy `src` to `dest`, creating the destination directory.
pub fn copy_file(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> io::Result<u64> {
    let dest = dest.as_ref();
    fs::create_dir_all(parent_dir_or_dot(dest))?;
    fs::copy(src, dest)
}

/// Remove a directory tree if it exists.
pub fn remove_dir_if_exists(dir: impl AsRef<Path>) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
