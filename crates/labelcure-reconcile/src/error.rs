use std::path::PathBuf;

/// Errors reported by a [`crate::Detector`].
#[derive(thiserror::Error, Debug)]
pub enum DetectorError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("detector backend: {0}")]
    Backend(String),
}

/// Setup errors of a batch run. Per-image failures are logged, not returned.
#[derive(thiserror::Error, Debug)]
pub enum ReconcileError {
    #[error("no labeled training images found in {0}")]
    NoImages(PathBuf),
    #[error(transparent)]
    Dataset(#[from] labelcure_core::DatasetError),
    #[error("can not write ledger {path}: {source}")]
    LedgerNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
