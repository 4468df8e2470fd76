//! Dataset-wide reconciliation producing the ledger file.

use crate::detector::Detector;
use crate::engine::Reconciler;
use crate::error::ReconcileError;
use labelcure_core::{read_annotations, serialize_ledger, DatasetLayout, LabelState, ParseMode};
use std::{fs::File, io::Write, path::Path};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Counters of one batch run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BatchSummary {
    pub images_total: usize,
    pub images_processed: usize,
    pub images_skipped: usize,
    pub records_written: usize,
}

/// Run `detector` over every labeled image of `layout` and write the
/// discrepancy ledger to `ledger_path`.
///
/// Setup problems (no labeled images, ledger not writable) are returned
/// before anything is written. Afterwards, an image that can not be decoded,
/// read or detected is logged and skipped; its records are simply absent
/// from the ledger. Records are appended image by image, in id order.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(detector, reconciler), fields(dataset = %layout.dir().display()))
)]
pub fn reconcile_dataset<D: Detector + ?Sized>(
    layout: &DatasetLayout,
    ledger_path: &Path,
    detector: &mut D,
    reconciler: &Reconciler,
) -> Result<BatchSummary, ReconcileError> {
    let image_ids = layout.list_images(LabelState::Labeled)?;
    if image_ids.is_empty() {
        return Err(ReconcileError::NoImages(layout.dir().to_path_buf()));
    }
    let mut ledger = File::create(ledger_path).map_err(|source| {
        ReconcileError::LedgerNotWritable {
            path: ledger_path.to_path_buf(),
            source,
        }
    })?;

    let threshold = reconciler.policy().validation_prob_thresh;
    let mut summary = BatchSummary {
        images_total: image_ids.len(),
        ..BatchSummary::default()
    };

    for (n, image_id) in image_ids.iter().enumerate() {
        let image = match layout.load_image(image_id) {
            Ok(img) => img,
            Err(e) => {
                log::error!(
                    "failed to load image {}: {e}",
                    layout.image_path(image_id).display()
                );
                summary.images_skipped += 1;
                continue;
            }
        };
        let ground_truth =
            match read_annotations(layout.annotation_path(image_id), ParseMode::Lenient) {
                Ok(gt) => gt,
                Err(e) => {
                    log::error!("{image_id}: {e}");
                    summary.images_skipped += 1;
                    continue;
                }
            };
        log::info!(
            "{}/{} {image_id}: {} annotations",
            n + 1,
            image_ids.len(),
            ground_truth.len()
        );

        let predictions = match detector.predict(image_id, &image, threshold) {
            Ok(p) => p,
            Err(e) => {
                log::error!("{image_id}: detector failed: {e}");
                summary.images_skipped += 1;
                continue;
            }
        };

        let records = reconciler.discrepancies(image_id, &predictions, &ground_truth);
        let chunk = serialize_ledger(&records);
        if let Err(e) = ledger.write_all(chunk.as_bytes()).and_then(|_| ledger.flush()) {
            log::error!(
                "{image_id}: can not append to {}: {e}",
                ledger_path.display()
            );
            summary.images_skipped += 1;
            continue;
        }
        log::debug!("{image_id}: {} discrepancies", records.len());
        summary.images_processed += 1;
        summary.records_written += records.len();
    }

    log::info!(
        "reconciliation finished: {} of {} images, {} records saved to {}",
        summary.images_processed,
        summary.images_total,
        summary.records_written,
        ledger_path.display()
    );
    Ok(summary)
}
