//! Spatial document model: bounding boxes, glyph-cluster merge, and the
//! geometric queries the pattern matcher runs on.

pub mod bbox;
pub mod document;
pub mod merge;

pub use bbox::{
    BoundingBox, DEFAULT_HORIZONTAL_ALIGN_TOLERANCE, DEFAULT_VERTICAL_ALIGN_TOLERANCE,
    NormalizedRect, PixelRect,
};
pub use document::{MatchMode, OcrFragment, OcrResponse, SpatialDocument};
pub use merge::{MergeParams, has_thai_content, merge_clusters};
