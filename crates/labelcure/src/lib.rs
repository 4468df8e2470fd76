//! Dataset curation for darknet-format object detection datasets.
//!
//! The workflow has two phases:
//!
//! 1. **Reconcile**: run a detector over every labeled image and record
//!    where it disagrees with the labels ([`reconcile`]). The result is a
//!    tab-separated discrepancy ledger.
//! 2. **Review**: walk the ledger with a human in the loop ([`review`]),
//!    adding missed objects and removing spurious labels. Every verdict is
//!    committed immediately; files are backed up before their first change.
//!
//! ## Quickstart
//!
//! ```no_run
//! use labelcure::core::{CurationPolicy, DatasetLayout};
//! use labelcure::reconcile::{reconcile_dataset, PredictionFileDetector, Reconciler};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = DatasetLayout::new("dataset");
//! let mut detector = PredictionFileDetector::new("predictions");
//! let reconciler = Reconciler::new(CurationPolicy::default());
//!
//! let summary = reconcile_dataset(
//!     &layout,
//!     Path::new("results.duv"),
//!     &mut detector,
//!     &reconciler,
//! )?;
//! println!("{} records", summary.records_written);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `labelcure::core`: boxes, IoU, annotation files, the ledger, thresholds.
//! - `labelcure::reconcile`: detectors and the prediction/label comparison.
//! - `labelcure::review`: the review state machine, presenters and backups.

pub use labelcure_core as core;
pub use labelcure_reconcile as reconcile;
pub use labelcure_review as review;

pub use labelcure_core::{Annotation, BoundingBox, CurationPolicy, DiscrepancyRecord, Ledger};
pub use labelcure_reconcile::{reconcile_dataset, Detector, Reconciler};
pub use labelcure_review::{Presenter, ReviewSession, ReviewSummary, Verdict};
