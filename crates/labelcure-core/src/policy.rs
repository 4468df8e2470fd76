//! Thresholds shared by reconciliation and review.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum PolicyIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Confidence written for a ground-truth object the detector did not find.
pub const UNDETECTED_CONFIDENCE: f32 = -1.0;

/// Curation thresholds.
///
/// One policy must be used for both the batch reconciliation and the review
/// session of the same ledger; otherwise the add/remove categories stored in
/// the ledger stop meaning what the reviewer assumes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationPolicy {
    /// Minimum class probability for a prediction to count as a detection.
    pub validation_prob_thresh: f32,
    /// IoU above which a prediction and an annotation are the same object.
    pub strong_iou_thresh: f32,
    /// IoU above which two annotations are considered identical.
    pub match_iou_thresh: f32,
    /// Confidence stored for undetected ground truth.
    pub undetected_confidence: f32,
}

impl Default for CurationPolicy {
    fn default() -> Self {
        Self {
            validation_prob_thresh: 0.15,
            strong_iou_thresh: 0.45,
            match_iou_thresh: 0.99,
            undetected_confidence: UNDETECTED_CONFIDENCE,
        }
    }
}

impl CurationPolicy {
    /// Load a JSON policy from disk. Missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PolicyIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this policy to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PolicyIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let p: CurationPolicy = serde_json::from_str(r#"{"strong_iou_thresh": 0.5}"#).expect("json");
        assert_eq!(p.strong_iou_thresh, 0.5);
        assert_eq!(p.validation_prob_thresh, 0.15);
        assert_eq!(p.match_iou_thresh, 0.99);
        assert_eq!(p.undetected_confidence, UNDETECTED_CONFIDENCE);
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("policy.json");
        let p = CurationPolicy {
            validation_prob_thresh: 0.3,
            ..CurationPolicy::default()
        };
        p.write_json(&path).expect("write");
        assert_eq!(CurationPolicy::load_json(&path).expect("load"), p);
    }
}
