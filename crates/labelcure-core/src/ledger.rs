//! Discrepancy ledger: one tab-separated line per reconciliation mismatch.
//!
//! Line format:
//! `image_id \t class_id \t mid_x \t mid_y \t width \t height \t confidence \t iou \t (t|f)`
//!
//! The ledger is written in bulk by batch reconciliation and then rewritten
//! in full after every verdict of a review session.

use crate::annotation::Annotation;
use crate::fs_util::replace_file;
use crate::geometry::BoundingBox;
use crate::parse::ParseMode;
use crate::policy::CurationPolicy;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

const FIELD_COUNT: usize = 9;

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bad ledger record at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Review category of an untreated record.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Confident detection with no matching label: add it to the dataset?
    Add,
    /// Label the detector does not confirm: remove it from the dataset?
    Remove,
}

impl Category {
    pub fn other(self) -> Self {
        match self {
            Category::Add => Category::Remove,
            Category::Remove => Category::Add,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Add => f.write_str("to add"),
            Category::Remove => f.write_str("to remove"),
        }
    }
}

/// One ledger entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyRecord {
    pub class_id: u32,
    pub bbox: BoundingBox,
    /// Detector probability; negative for ground truth the detector missed.
    pub confidence: f32,
    pub iou: f32,
    pub image_id: String,
    /// Set once an operator gave a verdict on this record.
    pub treated: bool,
}

impl DiscrepancyRecord {
    pub fn new(
        class_id: u32,
        bbox: BoundingBox,
        confidence: f32,
        iou: f32,
        image_id: impl Into<String>,
    ) -> Self {
        Self {
            class_id,
            bbox,
            confidence,
            iou,
            image_id: image_id.into(),
            treated: false,
        }
    }

    pub fn is_candidate_to_add(&self, policy: &CurationPolicy) -> bool {
        !self.treated
            && self.confidence >= policy.validation_prob_thresh
            && self.iou < policy.strong_iou_thresh
    }

    pub fn is_candidate_to_remove(&self, policy: &CurationPolicy) -> bool {
        !self.treated
            && self.confidence < policy.validation_prob_thresh
            && self.iou < policy.strong_iou_thresh
    }

    /// Category of an untreated mismatch; `None` for treated records and
    /// agreements.
    pub fn category(&self, policy: &CurationPolicy) -> Option<Category> {
        if self.is_candidate_to_add(policy) {
            Some(Category::Add)
        } else if self.is_candidate_to_remove(policy) {
            Some(Category::Remove)
        } else {
            None
        }
    }

    /// Image id set, slash-free; confidence in `[-1, 1]`; iou in `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        !self.image_id.is_empty()
            && !self.image_id.contains(['/', '\\'])
            && (-1.0..=1.0).contains(&self.confidence)
            && (0.0..=1.0).contains(&self.iou)
    }

    pub fn to_annotation(&self) -> Annotation {
        Annotation::new(self.class_id, self.bbox, self.image_id.clone())
    }

    /// Strict single-line parser.
    pub fn from_line(line: &str) -> Result<Self, String> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() != FIELD_COUNT {
            return Err(format!(
                "expected {FIELD_COUNT} tab-separated fields, got {}",
                parts.len()
            ));
        }
        let treated = match parts[8] {
            "t" => true,
            "f" => false,
            other => return Err(format!("treated flag must be 't' or 'f', got {other:?}")),
        };
        let class_id = parts[1]
            .parse::<u32>()
            .map_err(|e| format!("class id {:?}: {e}", parts[1]))?;
        let mut values = [0.0f32; 6];
        for (dst, raw) in values.iter_mut().zip(&parts[2..8]) {
            let v = raw
                .parse::<f32>()
                .map_err(|e| format!("value {raw:?}: {e}"))?;
            if !v.is_finite() {
                return Err(format!("value {raw:?} is not finite"));
            }
            *dst = v;
        }
        let [mid_x, mid_y, w, h, confidence, iou] = values;

        let record = Self {
            class_id,
            bbox: BoundingBox::from_center(mid_x, mid_y, w, h),
            confidence,
            iou,
            image_id: parts[0].to_string(),
            treated,
        };
        if !record.is_valid() {
            return Err("record fails validation".to_string());
        }
        Ok(record)
    }

    pub fn to_line(&self) -> String {
        let (mid_x, mid_y) = self.bbox.center();
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.image_id,
            self.class_id,
            mid_x,
            mid_y,
            self.bbox.width,
            self.bbox.height,
            self.confidence,
            self.iou,
            if self.treated { 't' } else { 'f' }
        )
    }
}

impl fmt::Display for DiscrepancyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} class {} {} p={:.2} iou={:.2}{}",
            self.image_id,
            self.class_id,
            self.bbox,
            self.confidence,
            self.iou,
            if self.treated { " (treated)" } else { "" }
        )
    }
}

/// Parse ledger text. Blank lines are ignored.
pub fn parse_ledger(
    text: &str,
    skip_treated: bool,
    mode: ParseMode,
) -> Result<Vec<DiscrepancyRecord>, LedgerError> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match DiscrepancyRecord::from_line(line) {
            Ok(r) if skip_treated && r.treated => {}
            Ok(r) => out.push(r),
            Err(reason) => match mode {
                ParseMode::Strict => {
                    return Err(LedgerError::Parse {
                        line: idx + 1,
                        reason,
                    })
                }
                ParseMode::Lenient => {
                    log::error!("dropping ledger line {} {line:?}: {reason}", idx + 1)
                }
            },
        }
    }
    Ok(out)
}

/// One line per record, each terminated by `\n`.
pub fn serialize_ledger<'a>(records: impl IntoIterator<Item = &'a DiscrepancyRecord>) -> String {
    let mut s = String::new();
    for r in records {
        s.push_str(&r.to_line());
        s.push('\n');
    }
    s
}

/// In-memory ledger with stable indices.
///
/// Removing a record leaves a tombstone, so indices handed out by
/// [`Ledger::iter`] stay valid for the lifetime of the ledger.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    slots: Vec<Option<DiscrepancyRecord>>,
}

impl Ledger {
    pub fn from_records(records: Vec<DiscrepancyRecord>) -> Self {
        Self {
            slots: records.into_iter().map(Some).collect(),
        }
    }

    pub fn load(
        path: impl AsRef<Path>,
        skip_treated: bool,
        mode: ParseMode,
    ) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_records(parse_ledger(&text, skip_treated, mode)?))
    }

    /// Rewrite the whole ledger file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LedgerError> {
        let path = path.as_ref();
        replace_file(path, &self.serialize()).map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn serialize(&self) -> String {
        serialize_ledger(self.records())
    }

    pub fn get(&self, index: usize) -> Option<&DiscrepancyRecord> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut DiscrepancyRecord> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Tombstone the record at `index`.
    pub fn remove(&mut self, index: usize) -> Option<DiscrepancyRecord> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Live records with their stable indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &DiscrepancyRecord)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (i, r)))
    }

    pub fn records(&self) -> impl Iterator<Item = &DiscrepancyRecord> {
        self.slots.iter().flatten()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Untreated records of `category`.
    pub fn count_category(&self, category: Category, policy: &CurationPolicy) -> usize {
        self.records()
            .filter(|r| r.category(policy) == Some(category))
            .count()
    }
}
