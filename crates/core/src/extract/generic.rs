//! Generic field extraction: running a format's named patterns against a
//! spatial document.
//!
//! Every pattern is attempted independently; an individual miss is recorded
//! as absence, never as an error. The result is `Failed` only when a
//! structural precondition fails (empty document), with the unknown
//! type/format cases handled by the parser before this layer runs.

use indexmap::IndexMap;
use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layout::{BoundingBox, SpatialDocument};
use crate::library::{SearchPattern, SubCollection, ValueSource};

/// Structural outcome of a generic extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Success,
    Failed,
}

/// One matched pattern's value, with the boxes it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub text: String,
    pub confidence: f64,
    /// Original indices of the boxes the value was read from.
    pub source_indices: Vec<usize>,
}

/// Flat field set produced by pattern matching, before semantic mapping.
///
/// A field is present only if its pattern matched with acceptable
/// confidence; absence is not an error by itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericDocumentData {
    pub document_type: String,
    pub format_name: String,
    pub fields: IndexMap<String, ExtractedField>,
    pub notes: IndexMap<String, String>,
    pub status: ExtractionStatus,
    pub failure_reason: Option<String>,
}

impl GenericDocumentData {
    pub fn failed(
        document_type: impl Into<String>,
        format_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            document_type: document_type.into(),
            format_name: format_name.into(),
            fields: IndexMap::new(),
            notes: IndexMap::new(),
            status: ExtractionStatus::Failed,
            failure_reason: Some(reason.into()),
        }
    }

    /// The field's text if present and non-blank.
    pub fn field_text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|f| f.text.trim())
            .filter(|t| !t.is_empty())
    }
}

/// Applies every pattern of one sub-collection to the document.
pub fn extract_generic(
    doc: &SpatialDocument,
    document_type: &str,
    format_name: &str,
    patterns: &SubCollection,
) -> GenericDocumentData {
    if doc.is_empty() || doc.full_text().trim().is_empty() {
        return GenericDocumentData::failed(
            document_type,
            format_name,
            "document contains no recognized text",
        );
    }

    let mut fields = IndexMap::new();
    for (name, pattern) in &patterns.patterns {
        match apply_pattern(doc, pattern) {
            Some(field) => {
                debug!(pattern = %name, value = %field.text, "pattern matched");
                fields.insert(name.clone(), field);
            }
            None => debug!(pattern = %name, "pattern did not match"),
        }
    }

    GenericDocumentData {
        document_type: document_type.to_string(),
        format_name: format_name.to_string(),
        fields,
        notes: IndexMap::new(),
        status: ExtractionStatus::Success,
        failure_reason: None,
    }
}

/// Attempts one pattern. Returns None on any miss: no anchor, no candidate
/// past the filters, or an unusable value filter.
pub fn apply_pattern(doc: &SpatialDocument, pattern: &SearchPattern) -> Option<ExtractedField> {
    let filter = match &pattern.value_filter {
        Some(source) => match Regex::new(source) {
            Ok(re) => Some(re),
            Err(err) => {
                warn!(pattern = %pattern.name, error = %err, "unusable value filter");
                return None;
            }
        },
        None => None,
    };

    let acceptable = |b: &&BoundingBox| {
        let text = b.text().trim();
        !text.is_empty()
            && b.confidence() >= pattern.min_confidence
            && filter.as_ref().is_none_or(|re| re.is_match(text))
    };

    if let ValueSource::Region { rect } = pattern.value_source {
        let hits: Vec<&BoundingBox> = doc
            .find_in_normalized_area(rect)
            .into_iter()
            .filter(acceptable)
            .collect();
        return collect_value(hits, pattern.join_values);
    }

    let anchors = doc.find_any_text(&pattern.keywords, pattern.match_mode);
    // First anchor that yields an acceptable value wins; later anchors are
    // only consulted when earlier ones come up empty.
    for anchor in anchors {
        let candidates: Vec<&BoundingBox> = match pattern.value_source {
            ValueSource::RightOf { tolerance } => doc.find_right_of(anchor, tolerance),
            ValueSource::Below { tolerance } => doc.find_below(anchor, tolerance),
            ValueSource::Nearest { max_distance } => doc.find_nearest(anchor, max_distance),
            ValueSource::Anchor => vec![anchor],
            ValueSource::Region { .. } => unreachable!("handled above"),
        };
        let hits: Vec<&BoundingBox> = candidates.into_iter().filter(acceptable).collect();
        if let Some(field) = collect_value(hits, pattern.join_values) {
            return Some(field);
        }
    }
    None
}

fn collect_value(hits: Vec<&BoundingBox>, join_values: bool) -> Option<ExtractedField> {
    if hits.is_empty() {
        return None;
    }
    let taken: &[&BoundingBox] = if join_values { &hits } else { &hits[..1] };
    let text = taken.iter().map(|b| b.text().trim()).join(" ");
    let confidence = taken
        .iter()
        .map(|b| b.confidence())
        .fold(f64::INFINITY, f64::min);
    Some(ExtractedField {
        text,
        confidence,
        source_indices: taken.iter().map(|b| b.original_index()).collect(),
    })
}
