//! Reconcile a detector's predictions against ground-truth annotations.
//!
//! For each image, [`Reconciler`] classifies every annotation and every
//! confident prediction; mismatches become [`labelcure_core::DiscrepancyRecord`]s.
//! [`reconcile_dataset`] runs a [`Detector`] over a whole dataset directory
//! and writes the resulting ledger.

mod batch;
mod detector;
mod engine;
mod error;
mod prediction;

pub use batch::{reconcile_dataset, BatchSummary};
pub use detector::{Detector, PredictionFileDetector};
pub use engine::Reconciler;
pub use error::{DetectorError, ReconcileError};
pub use prediction::Prediction;
