//! Spatial document: the full set of bounding boxes for one processed image.
//!
//! Word order is OCR emission order, not spatial order; every query computes
//! its own ordering and breaks ties by original index so extraction is
//! reproducible.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::bbox::{BoundingBox, NormalizedRect, PixelRect};
use super::merge::{MergeParams, has_thai_content, merge_clusters};

/// How query text is compared against fragment text. Both modes are
/// case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Fragment text equals the query.
    Exact,
    /// Fragment text contains the query as a substring.
    #[default]
    Contains,
}

/// One recognized fragment as produced by the external OCR provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrFragment {
    pub text: String,
    pub confidence: f64,
    /// Raw pixel rectangle [x1, y1, x2, y2].
    pub rect: PixelRect,
    /// Rectangle normalized to document dimensions, values in [0, 1].
    pub normalized_rect: NormalizedRect,
}

/// The OCR provider's output shape for one processed image. The core never
/// calls the provider itself; this is the boundary type it consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResponse {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub source_path: Option<PathBuf>,
    pub fragments: Vec<OcrFragment>,
}

/// An ordered collection of bounding boxes plus document metadata, with the
/// spatial queries used by the pattern matcher.
///
/// Built once per extraction attempt. The merge pass replaces fragments in
/// place before the document reaches the matcher; after that the document is
/// effectively read-only.
#[derive(Debug, Clone)]
pub struct SpatialDocument {
    words: Vec<BoundingBox>,
    width: u32,
    height: u32,
    source_path: PathBuf,
    created_at: DateTime<Utc>,
    metadata: FxHashMap<String, String>,
}

impl SpatialDocument {
    pub fn new(
        words: Vec<BoundingBox>,
        width: u32,
        height: u32,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            words,
            width,
            height,
            source_path: source_path.into(),
            created_at: Utc::now(),
            metadata: FxHashMap::default(),
        }
    }

    /// Builds a document from the OCR provider's response, assigning each
    /// fragment its position in the response as the original index.
    pub fn from_response(response: OcrResponse) -> Self {
        let words = response
            .fragments
            .into_iter()
            .enumerate()
            .map(|(index, f)| {
                BoundingBox::new(f.text, f.confidence, f.rect, f.normalized_rect, index)
            })
            .collect();
        Self::new(
            words,
            response.width,
            response.height,
            response.source_path.unwrap_or_default(),
        )
    }

    pub fn words(&self) -> &[BoundingBox] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn metadata(&self) -> &FxHashMap<String, String> {
        &self.metadata
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// All fragment text joined with newlines, in emission order.
    pub fn full_text(&self) -> String {
        self.words
            .iter()
            .map(BoundingBox::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether any fragment contains Thai-block code points, i.e. whether the
    /// glyph-cluster merge pass is applicable at all.
    pub fn has_thai_content(&self) -> bool {
        self.words.iter().any(|w| has_thai_content(w.text()))
    }

    /// Runs the glyph-cluster merge pass in place. A no-op for documents
    /// without Thai content. Returns the number of fragments fused away.
    pub fn merge_thai_clusters(&mut self, params: &MergeParams) -> usize {
        if !self.has_thai_content() {
            return 0;
        }
        let before = self.words.len();
        let words = std::mem::take(&mut self.words);
        self.words = merge_clusters(words, params);
        before - self.words.len()
    }

    /// All boxes whose raw center lies within the rectangle, inclusive
    /// bounds, in reading order (top-to-bottom, then left-to-right).
    pub fn find_in_area(&self, rect: PixelRect) -> Vec<&BoundingBox> {
        let (x1, y1, x2, y2) = rect;
        let mut hits: Vec<&BoundingBox> = self
            .words
            .iter()
            .filter(|w| {
                let (cx, cy) = w.center();
                f64::from(x1) <= cx && cx <= f64::from(x2) && f64::from(y1) <= cy && cy <= f64::from(y2)
            })
            .collect();
        sort_reading_order(&mut hits);
        hits
    }

    /// All boxes whose normalized center lies within the rectangle,
    /// inclusive bounds, in reading order.
    pub fn find_in_normalized_area(&self, rect: NormalizedRect) -> Vec<&BoundingBox> {
        let (x1, y1, x2, y2) = rect;
        let mut hits: Vec<&BoundingBox> = self
            .words
            .iter()
            .filter(|w| {
                let (cx, cy) = w.normalized_center();
                x1 <= cx && cx <= x2 && y1 <= cy && cy <= y2
            })
            .collect();
        sort_reading_order(&mut hits);
        hits
    }

    /// All other boxes sharing the reference box's row, left-to-right.
    pub fn find_row<'a>(&'a self, reference: &'a BoundingBox, tolerance: f64) -> Vec<&'a BoundingBox> {
        let mut hits: Vec<&BoundingBox> = self
            .others(reference)
            .filter(|w| w.horizontally_aligned(reference, tolerance))
            .collect();
        hits.sort_by_key(|w| (w.x1(), w.original_index()));
        hits
    }

    /// All other boxes sharing the reference box's column, top-to-bottom.
    pub fn find_column<'a>(&'a self, reference: &'a BoundingBox, tolerance: f64) -> Vec<&'a BoundingBox> {
        let mut hits: Vec<&BoundingBox> = self
            .others(reference)
            .filter(|w| w.vertically_aligned(reference, tolerance))
            .collect();
        hits.sort_by_key(|w| (w.y1(), w.original_index()));
        hits
    }

    /// Row neighbors strictly past the reference box's right edge,
    /// left-to-right.
    pub fn find_right_of<'a>(&'a self, reference: &'a BoundingBox, tolerance: f64) -> Vec<&'a BoundingBox> {
        let mut hits = self.find_row(reference, tolerance);
        hits.retain(|w| w.x1() > reference.x2());
        hits
    }

    /// Column neighbors strictly past the reference box's bottom edge,
    /// top-to-bottom.
    pub fn find_below<'a>(&'a self, reference: &'a BoundingBox, tolerance: f64) -> Vec<&'a BoundingBox> {
        let mut hits = self.find_column(reference, tolerance);
        hits.retain(|w| w.y1() > reference.y2());
        hits
    }

    /// All other boxes within `max_distance` of the reference box, sorted
    /// ascending by edge-to-edge Euclidean distance.
    pub fn find_nearest<'a>(&'a self, reference: &'a BoundingBox, max_distance: f64) -> Vec<&'a BoundingBox> {
        let mut hits: Vec<(f64, &BoundingBox)> = self
            .others(reference)
            .map(|w| (reference.edge_distance(w), w))
            .filter(|(d, _)| *d <= max_distance)
            .collect();
        hits.sort_by(|(da, wa), (db, wb)| {
            da.total_cmp(db)
                .then_with(|| wa.original_index().cmp(&wb.original_index()))
        });
        hits.into_iter().map(|(_, w)| w).collect()
    }

    /// Case-insensitive text search, in emission order.
    pub fn find_text(&self, query: &str, mode: MatchMode) -> Vec<&BoundingBox> {
        let needle = query.to_lowercase();
        self.words
            .iter()
            .filter(|w| {
                let text = w.text().to_lowercase();
                match mode {
                    MatchMode::Exact => text == needle,
                    MatchMode::Contains => text.contains(&needle),
                }
            })
            .collect()
    }

    /// Text search over several candidate strings, used for ambiguous vendor
    /// phrasing. A box matches if it matches any candidate.
    pub fn find_any_text<S: AsRef<str>>(&self, queries: &[S], mode: MatchMode) -> Vec<&BoundingBox> {
        let needles: Vec<String> = queries.iter().map(|q| q.as_ref().to_lowercase()).collect();
        self.words
            .iter()
            .filter(|w| {
                let text = w.text().to_lowercase();
                needles.iter().any(|n| match mode {
                    MatchMode::Exact => text == *n,
                    MatchMode::Contains => text.contains(n),
                })
            })
            .collect()
    }

    fn others<'a>(
        &'a self,
        reference: &'a BoundingBox,
    ) -> impl Iterator<Item = &'a BoundingBox> + 'a {
        self.words
            .iter()
            .filter(move |w| w.original_index() != reference.original_index())
    }
}

fn sort_reading_order(hits: &mut [&BoundingBox]) {
    hits.sort_by_key(|w| (w.y1(), w.x1(), w.original_index()));
}
