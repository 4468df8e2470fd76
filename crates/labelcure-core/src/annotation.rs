//! Per-image ground-truth files in darknet format.
//!
//! Each non-empty line is `class mid_x mid_y width height`, space separated,
//! with geometry normalized to the image size.

use crate::dataset::image_id_from_path;
use crate::fs_util::replace_file;
use crate::geometry::{intersection_over_union, BoundingBox};
use crate::parse::ParseMode;
use crate::policy::CurationPolicy;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum AnnotationError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bad annotation at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// One labeled object of one image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub class_id: u32,
    /// Relative box, `(x, y)` is the top-left corner.
    pub bbox: BoundingBox,
    /// Image basename without extension.
    pub image_id: String,
}

impl Annotation {
    pub fn new(class_id: u32, bbox: BoundingBox, image_id: impl Into<String>) -> Self {
        Self {
            class_id,
            bbox,
            image_id: image_id.into(),
        }
    }

    /// Parse one `class mid_x mid_y width height` line.
    pub fn from_line(line: &str, image_id: &str) -> Result<Self, String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(format!("expected 5 fields, got {}", parts.len()));
        }
        let class_id = parts[0]
            .parse::<u32>()
            .map_err(|e| format!("class id {:?}: {e}", parts[0]))?;
        let mut geom = [0.0f32; 4];
        for (dst, raw) in geom.iter_mut().zip(&parts[1..]) {
            let v = raw
                .parse::<f32>()
                .map_err(|e| format!("value {raw:?}: {e}"))?;
            if !v.is_finite() {
                return Err(format!("value {raw:?} is not finite"));
            }
            *dst = v;
        }
        let [mid_x, mid_y, w, h] = geom;
        Ok(Self::new(
            class_id,
            BoundingBox::from_center(mid_x, mid_y, w, h),
            image_id,
        ))
    }

    /// Darknet line, `(x, y)` written as the midpoint.
    pub fn to_line(&self) -> String {
        let (mid_x, mid_y) = self.bbox.center();
        format!(
            "{} {} {} {} {}",
            self.class_id, mid_x, mid_y, self.bbox.width, self.bbox.height
        )
    }

    /// Image id non-empty and box inside the image.
    pub fn is_valid(&self) -> bool {
        !self.image_id.is_empty() && self.bbox.is_valid()
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, {}", self.class_id, self.bbox, self.image_id)
    }
}

/// Parse the contents of one annotation file belonging to `image_id`.
pub fn parse_annotations(
    text: &str,
    image_id: &str,
    mode: ParseMode,
) -> Result<Vec<Annotation>, AnnotationError> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match Annotation::from_line(line, image_id) {
            Ok(a) => out.push(a),
            Err(reason) => match mode {
                ParseMode::Strict => {
                    return Err(AnnotationError::Parse {
                        line: idx + 1,
                        reason,
                    })
                }
                ParseMode::Lenient => {
                    log::warn!("{image_id}: skipping line {} {line:?}: {reason}", idx + 1)
                }
            },
        }
    }
    Ok(out)
}

/// Read an annotation file; the image id is the file basename.
pub fn read_annotations(
    path: impl AsRef<Path>,
    mode: ParseMode,
) -> Result<Vec<Annotation>, AnnotationError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| AnnotationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image_id = image_id_from_path(&path.to_string_lossy()).to_string();
    parse_annotations(&text, &image_id, mode)
}

/// Newline-separated darknet lines, no trailing newline.
pub fn serialize_annotations(annotations: &[Annotation]) -> String {
    annotations
        .iter()
        .map(Annotation::to_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rewrite an annotation file with `annotations`.
pub fn write_annotations(
    path: impl AsRef<Path>,
    annotations: &[Annotation],
) -> Result<(), AnnotationError> {
    let path = path.as_ref();
    replace_file(path, &serialize_annotations(annotations)).map_err(|source| {
        AnnotationError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Index of the first annotation identical to `needle`.
///
/// Identity means same class, same (basename-normalized) image and a box IoU
/// above `policy.match_iou_thresh`. This is an equality test, much tighter
/// than the overlap rule used by reconciliation.
pub fn find_matching_annotation(
    annotations: &[Annotation],
    needle: &Annotation,
    policy: &CurationPolicy,
) -> Option<usize> {
    let needle_image = image_id_from_path(&needle.image_id);
    annotations.iter().position(|a| {
        a.class_id == needle.class_id
            && image_id_from_path(&a.image_id) == needle_image
            && intersection_over_union(&a.bbox, &needle.bbox) > policy.match_iou_thresh
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const THREE: &str = "0 0.5 0.5 0.2 0.2\n1 0.25 0.75 0.1 0.3\n2 0.9 0.1 0.2 0.2";

    #[test]
    fn parses_midpoints_into_top_left() {
        let dets = parse_annotations(THREE, "img", ParseMode::Lenient).expect("parse");
        assert_eq!(dets.len(), 3);
        assert_eq!(dets[1].class_id, 1);
        assert_relative_eq!(dets[1].bbox.x, 0.2, epsilon = 1e-6);
        assert_relative_eq!(dets[1].bbox.y, 0.6, epsilon = 1e-6);
        assert!(dets.iter().all(Annotation::is_valid));
        assert!(dets.iter().all(|d| d.image_id == "img"));
    }

    #[test]
    fn lenient_mode_skips_bad_lines() {
        let text = "0 0.5 0.5 0.2 0.2\n0 0.5 0.5 0.2\nfoo 0.1 0.1 0.1 0.1\n\n3 0.5 nan 0.1 0.1\n1 0.3 0.3 0.1 0.1\n";
        let dets = parse_annotations(text, "img", ParseMode::Lenient).expect("parse");
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[1].class_id, 1);
    }

    #[test]
    fn strict_mode_reports_line_number() {
        let text = "0 0.5 0.5 0.2 0.2\n\n-1 0.5 0.5 0.2 0.2\n";
        match parse_annotations(text, "img", ParseMode::Strict) {
            Err(AnnotationError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn serialize_then_parse_is_identity() {
        let dets = parse_annotations(THREE, "img", ParseMode::Strict).expect("parse");
        let text = serialize_annotations(&dets);
        assert!(!text.ends_with('\n'));
        let again = parse_annotations(&text, "img", ParseMode::Strict).expect("parse");
        assert_eq!(again.len(), dets.len());
        for (a, b) in dets.iter().zip(&again) {
            assert_eq!(a.class_id, b.class_id);
            assert_relative_eq!(a.bbox.x, b.bbox.x, epsilon = 1e-6);
            assert_relative_eq!(a.bbox.y, b.bbox.y, epsilon = 1e-6);
            assert_relative_eq!(a.bbox.width, b.bbox.width, epsilon = 1e-6);
            assert_relative_eq!(a.bbox.height, b.bbox.height, epsilon = 1e-6);
        }
        assert_eq!(serialize_annotations(&[]), "");
    }

    #[test]
    fn file_round_trip_uses_basename_as_image_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("frame_7.txt");
        let dets = parse_annotations(THREE, "frame_7", ParseMode::Strict).expect("parse");
        write_annotations(&path, &dets).expect("write");
        let loaded = read_annotations(&path, ParseMode::Strict).expect("read");
        assert_eq!(loaded.len(), 3);
        assert!(loaded.iter().all(|d| d.image_id == "frame_7"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_annotations(dir.path().join("none.txt"), ParseMode::Lenient);
        assert!(matches!(err, Err(AnnotationError::Io { .. })));
    }

    #[test]
    fn matching_requires_class_image_and_near_identical_box() {
        let policy = CurationPolicy::default();
        let dets = parse_annotations(THREE, "img", ParseMode::Strict).expect("parse");

        let same = Annotation::new(2, dets[2].bbox, "/data/img.jpg");
        assert_eq!(find_matching_annotation(&dets, &same, &policy), Some(2));

        let other_class = Annotation::new(1, dets[2].bbox, "img");
        assert_eq!(find_matching_annotation(&dets, &other_class, &policy), None);

        let other_image = Annotation::new(2, dets[2].bbox, "img2");
        assert_eq!(find_matching_annotation(&dets, &other_image, &policy), None);

        // strongly overlapping, but not the same box
        let mut shifted = dets[0].clone();
        shifted.bbox.x += 0.02;
        assert!(intersection_over_union(&shifted.bbox, &dets[0].bbox) > 0.45);
        assert_eq!(find_matching_annotation(&dets, &shifted, &policy), None);
    }
}
