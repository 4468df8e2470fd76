use labelcure_core::BoundingBox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One detector output: a box plus a probability per class.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Relative box, `(x, y)` is the top-left corner.
    pub bbox: BoundingBox,
    /// Class id -> probability. Ordered so iteration is deterministic.
    #[serde(default)]
    pub probabilities: BTreeMap<u32, f32>,
}

impl Prediction {
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            probabilities: BTreeMap::new(),
        }
    }

    /// Build from a midpoint-based relative box, as most YOLO heads report it.
    pub fn from_center(mid_x: f32, mid_y: f32, width: f32, height: f32) -> Self {
        Self::new(BoundingBox::from_center(mid_x, mid_y, width, height))
    }

    /// Build from a pixel-space top-left rectangle.
    pub fn from_absolute(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image_width: u32,
        image_height: u32,
    ) -> Option<Self> {
        BoundingBox::from_absolute(x, y, width, height, image_width, image_height).map(Self::new)
    }

    pub fn with_probability(mut self, class_id: u32, probability: f32) -> Self {
        self.probabilities.insert(class_id, probability);
        self
    }

    /// Probability of `class_id`, 0 when the class is absent.
    #[inline]
    pub fn probability(&self, class_id: u32) -> f32 {
        self.probabilities.get(&class_id).copied().unwrap_or(0.0)
    }

    /// Drop classes whose probability is below `threshold`.
    pub fn retain_above(&mut self, threshold: f32) {
        self.probabilities.retain(|_, p| *p >= threshold);
    }
}
