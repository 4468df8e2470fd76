//! Core types for object-detection dataset curation.
//!
//! This crate holds the data model shared by reconciliation and review:
//! normalized boxes and IoU, darknet annotation files, the tab-separated
//! discrepancy ledger and the curation thresholds. Image decoding sits
//! behind the `image` feature; no detector lives here.

mod annotation;
mod dataset;
mod fs_util;
mod geometry;
mod ledger;
mod logger;
mod parse;
mod policy;

pub use annotation::{
    find_matching_annotation, parse_annotations, read_annotations, serialize_annotations,
    write_annotations, Annotation, AnnotationError,
};
pub use dataset::{
    image_id_from_path, ClassNames, DatasetError, DatasetLayout, LabelState, SeedSummary,
    ANNOTATION_EXT, DEFAULT_IMAGE_EXT,
};
pub use geometry::{intersection_over_union, BoundingBox, EDGE_TOLERANCE};
pub use ledger::{
    parse_ledger, serialize_ledger, Category, DiscrepancyRecord, Ledger, LedgerError,
};
pub use parse::ParseMode;
pub use policy::{CurationPolicy, PolicyIoError, UNDETECTED_CONFIDENCE};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
