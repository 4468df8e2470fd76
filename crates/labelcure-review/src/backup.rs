//! Snapshots taken before the first mutation of a file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Suffix of ledger snapshots.
pub const LEDGER_BACKUP_SUFFIX: &str = ".bak";

/// Backup directory of one review session.
///
/// Holds one snapshot of the pristine ledger, taken before its first
/// mutation, and one snapshot per image annotation file, taken the first time
/// that file is about to change. Existing snapshots are never overwritten.
#[derive(Debug)]
pub struct BackupStore {
    dir: PathBuf,
    ledger_snapshot: Option<PathBuf>,
}

impl BackupStore {
    /// Open (and create if needed) the backup directory.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            ledger_snapshot: None,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot taken for the ledger in this session, if any.
    pub fn ledger_snapshot(&self) -> Option<&Path> {
        self.ledger_snapshot.as_deref()
    }

    /// Copy the ledger into the backup directory unless this session
    /// already did. Returns the snapshot path.
    pub fn snapshot_ledger(&mut self, ledger_path: &Path) -> io::Result<PathBuf> {
        if let Some(existing) = &self.ledger_snapshot {
            return Ok(existing.clone());
        }
        let name = ledger_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger".to_string());
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let target = self.unused_path(&format!("{name}.{stamp}"), LEDGER_BACKUP_SUFFIX);
        fs::copy(ledger_path, &target)?;
        log::info!(
            "ledger {} backed up to {}",
            ledger_path.display(),
            target.display()
        );
        self.ledger_snapshot = Some(target.clone());
        Ok(target)
    }

    /// Path of the annotation snapshot of `image_id`.
    pub fn annotation_snapshot_path(&self, image_id: &str) -> PathBuf {
        self.dir.join(format!("{image_id}.txt"))
    }

    /// Copy an annotation file unless a snapshot of that image exists.
    ///
    /// Returns `true` when a new snapshot was written. A missing source file
    /// is recorded as an empty snapshot: the image had no labels.
    pub fn snapshot_annotations(&self, image_id: &str, source: &Path) -> io::Result<bool> {
        let target = self.annotation_snapshot_path(image_id);
        if target.exists() {
            return Ok(false);
        }
        if !source.exists() {
            fs::write(&target, "")?;
            log::debug!("{} missing, empty snapshot at {}", source.display(), target.display());
            return Ok(true);
        }
        fs::copy(source, &target)?;
        log::debug!("{} backed up to {}", source.display(), target.display());
        Ok(true)
    }

    fn unused_path(&self, stem: &str, suffix: &str) -> PathBuf {
        let mut candidate = self.dir.join(format!("{stem}{suffix}"));
        let mut n = 1;
        while candidate.exists() {
            candidate = self.dir.join(format!("{stem}-{n}{suffix}"));
            n += 1;
        }
        candidate
    }
}
