//! Local save of decrypted attachments.
//!
//! Content goes to a temp file in the destination directory, which is then
//! renamed into place. The temp file is the only handle on the plaintext and
//! is removed if anything fails before the rename.

use std::io::Write;
use std::path::{Path, PathBuf};

const FALLBACK_NAME: &str = "attachment";

/// Reduce a backend-supplied file name to a single safe path component.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    match last {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        other => other.to_string(),
    }
}

/// Write `content` to `dest_dir/{sanitized file_name}` atomically.
pub fn save_atomically(dest_dir: &Path, file_name: &str, content: &[u8]) -> std::io::Result<PathBuf> {
    let target = dest_dir.join(sanitize_file_name(file_name));

    let mut tmp = tempfile::NamedTempFile::new_in(dest_dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| e.error)?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("quote.pdf"), "quote.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\x\\photo.png"), "photo.png");
        assert_eq!(sanitize_file_name("dir/"), "attachment");
        assert_eq!(sanitize_file_name(".."), "attachment");
        assert_eq!(sanitize_file_name("  "), "attachment");
    }

    #[test]
    fn save_writes_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_atomically(dir.path(), "notes.txt", b"hello").unwrap();

        assert_eq!(path, dir.path().join("notes.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        save_atomically(dir.path(), "a.bin", b"old").unwrap();
        let path = save_atomically(dir.path(), "a.bin", b"new").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"new");
    }

    #[test]
    fn save_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(save_atomically(&missing, "a.bin", b"x").is_err());
    }
}
