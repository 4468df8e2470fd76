//! Detector boundary.
//!
//! Inference itself is not part of this workspace. A detector is a
//! synchronous oracle: one call per image, no state shared between calls that
//! would change its answer.

use crate::error::DetectorError;
use crate::prediction::Prediction;
use image::DynamicImage;
use std::{fs, path::PathBuf};

pub trait Detector {
    /// Predictions for one decoded image.
    ///
    /// Classes with a probability below `threshold` may be omitted.
    fn predict(
        &mut self,
        image_id: &str,
        image: &DynamicImage,
        threshold: f32,
    ) -> Result<Vec<Prediction>, DetectorError>;
}

impl<F> Detector for F
where
    F: FnMut(&str, &DynamicImage, f32) -> Result<Vec<Prediction>, DetectorError>,
{
    fn predict(
        &mut self,
        image_id: &str,
        image: &DynamicImage,
        threshold: f32,
    ) -> Result<Vec<Prediction>, DetectorError> {
        self(image_id, image, threshold)
    }
}

/// Replays predictions exported by an external inference run.
///
/// Reads `<dir>/<image_id>.json`, a JSON array of [`Prediction`]s with
/// relative top-left boxes.
#[derive(Clone, Debug)]
pub struct PredictionFileDetector {
    dir: PathBuf,
}

impl PredictionFileDetector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn prediction_path(&self, image_id: &str) -> PathBuf {
        self.dir.join(format!("{image_id}.json"))
    }
}

impl Detector for PredictionFileDetector {
    fn predict(
        &mut self,
        image_id: &str,
        _image: &DynamicImage,
        threshold: f32,
    ) -> Result<Vec<Prediction>, DetectorError> {
        let path = self.prediction_path(image_id);
        let raw = fs::read_to_string(&path).map_err(|source| DetectorError::Io {
            path: path.clone(),
            source,
        })?;
        let mut predictions: Vec<Prediction> =
            serde_json::from_str(&raw).map_err(|source| DetectorError::Json { path, source })?;
        for p in &mut predictions {
            p.retain_above(threshold);
        }
        predictions.retain(|p| !p.probabilities.is_empty());
        Ok(predictions)
    }
}
