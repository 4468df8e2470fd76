use std::{io, path::PathBuf};

use labelcure_core::{DatasetError, LedgerError};

/// Failure of the verdict source. Ends the review session.
#[derive(thiserror::Error, Debug)]
pub enum PresenterError {
    #[error("presenter i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("presenter failed: {0}")]
    Backend(String),
}

/// Setup failures of a review session. Raised before any mutation.
#[derive(thiserror::Error, Debug)]
pub enum ReviewError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("cannot create backup directory {path}: {source}")]
    BackupDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure of one verdict. The record is skipped for the rest of the session.
#[derive(thiserror::Error, Debug)]
pub(crate) enum RecordError {
    #[error("backup failed: {0}")]
    Backup(#[source] io::Error),
    #[error(transparent)]
    Annotation(#[from] labelcure_core::AnnotationError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("{0}; the ledger is out of date, regenerate it")]
    Inconsistent(String),
}
