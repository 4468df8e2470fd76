//! Interactive review of a discrepancy ledger.
//!
//! A [`ReviewSession`] walks the untreated records of a ledger, shows each
//! candidate through a [`Presenter`] and commits the verdict to the dataset
//! and the ledger immediately:
//!
//! - records *to add* are confident detections without a label; accepting
//!   one appends it to the image's annotation file;
//! - records *to remove* are labels the detector does not confirm; deleting
//!   one removes it from the annotation file and drops the record.
//!
//! Files are backed up once, before their first change.

mod backup;
mod config;
mod error;
mod presenter;
mod selection;
mod session;

pub use backup::{BackupStore, LEDGER_BACKUP_SUFFIX};
pub use config::{ReviewConfig, DEFAULT_BACKUP_DIR};
pub use error::{PresenterError, ReviewError};
pub use presenter::{KeyBindings, Presenter, ReviewView, TerminalPresenter, Verdict};
pub use selection::{priority, remaining, select_candidate};
pub use session::{ReviewSession, ReviewState, ReviewSummary};
