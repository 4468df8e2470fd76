use std::{
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;

/// Replace `path` with `contents`.
///
/// The data goes to a uniquely named temporary file in the same directory,
/// which is then renamed over the target: readers see either the old or the
/// new file. The temporary file is removed if anything fails.
pub(crate) fn replace_file(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        fs::write(&path, "old").expect("write");
        replace_file(&path, "new").expect("replace");
        assert_eq!(fs::read_to_string(&path).expect("read"), "new");
        let entries: Vec<_> = fs::read_dir(dir.path()).expect("ls").collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn creates_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("new.txt");
        replace_file(&path, "").expect("replace");
        assert_eq!(fs::read_to_string(&path).expect("read"), "");
    }

    #[test]
    fn failure_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("occupied");
        fs::create_dir(&target).expect("mkdir");
        fs::write(target.join("inside"), "x").expect("write");

        assert!(replace_file(&target, "data").is_err());
        let entries: Vec<_> = fs::read_dir(dir.path()).expect("ls").collect();
        assert_eq!(entries.len(), 1);
    }
}
