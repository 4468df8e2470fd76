//! Per-image reconciliation of predictions against ground truth.

use crate::prediction::Prediction;
use labelcure_core::{intersection_over_union, Annotation, CurationPolicy, DiscrepancyRecord};

/// Classifies detector output and ground truth of one image.
#[derive(Clone, Debug, Default)]
pub struct Reconciler {
    policy: CurationPolicy,
}

impl Reconciler {
    pub fn new(policy: CurationPolicy) -> Self {
        Self { policy }
    }

    #[inline]
    pub fn policy(&self) -> &CurationPolicy {
        &self.policy
    }

    /// All records of one image, agreements included.
    ///
    /// Two passes, in this order:
    /// 1. every annotation gets one record: the first prediction (scan order)
    ///    that overlaps it strongly with a valid probability for its class, or
    ///    the annotation itself with the "undetected" confidence and IoU 0;
    /// 2. every valid (prediction, class) pair that overlaps no annotation of
    ///    that class strongly gets a record carrying the best IoU it reached.
    ///
    /// Pairs matched in pass 2 were already reported by pass 1, so no
    /// detection is counted twice. Output order is deterministic.
    pub fn reconcile(
        &self,
        image_id: &str,
        predictions: &[Prediction],
        ground_truth: &[Annotation],
    ) -> Vec<DiscrepancyRecord> {
        let validation = self.policy.validation_prob_thresh;
        let strong = self.policy.strong_iou_thresh;
        let mut out = Vec::with_capacity(ground_truth.len() + predictions.len());

        for gt in ground_truth {
            let hit = predictions.iter().find_map(|pred| {
                let p = pred.probability(gt.class_id);
                let iou = intersection_over_union(&pred.bbox, &gt.bbox);
                (p > validation && iou > strong).then_some((pred, p, iou))
            });
            let record = match hit {
                Some((pred, p, iou)) => {
                    DiscrepancyRecord::new(gt.class_id, pred.bbox, p, iou, image_id)
                }
                None => DiscrepancyRecord::new(
                    gt.class_id,
                    gt.bbox,
                    self.policy.undetected_confidence,
                    0.0,
                    image_id,
                ),
            };
            out.push(record);
        }

        for pred in predictions {
            for (&class_id, &p) in &pred.probabilities {
                if p <= validation {
                    continue;
                }
                let best_iou = ground_truth
                    .iter()
                    .filter(|gt| gt.class_id == class_id)
                    .map(|gt| intersection_over_union(&pred.bbox, &gt.bbox))
                    .fold(0.0f32, f32::max);
                if best_iou <= strong {
                    out.push(DiscrepancyRecord::new(
                        class_id, pred.bbox, p, best_iou, image_id,
                    ));
                }
            }
        }

        out
    }

    /// Records at or above the strong-intersection threshold are agreements.
    #[inline]
    pub fn is_agreement(&self, record: &DiscrepancyRecord) -> bool {
        record.iou >= self.policy.strong_iou_thresh
    }

    /// [`Reconciler::reconcile`] with agreements dropped; this is what goes
    /// into the ledger.
    pub fn discrepancies(
        &self,
        image_id: &str,
        predictions: &[Prediction],
        ground_truth: &[Annotation],
    ) -> Vec<DiscrepancyRecord> {
        let mut records = self.reconcile(image_id, predictions, ground_truth);
        records.retain(|r| !self.is_agreement(r));
        records
    }
}
