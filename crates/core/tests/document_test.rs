//! Tests for spatial document queries: area, alignment, directional,
//! nearest-neighbor, and text search.

use salween_core::layout::{BoundingBox, MatchMode, OcrFragment, OcrResponse, SpatialDocument};

fn bbox(text: &str, rect: (i32, i32, i32, i32), index: usize) -> BoundingBox {
    let norm = (
        f64::from(rect.0) / 1000.0,
        f64::from(rect.1) / 1000.0,
        f64::from(rect.2) / 1000.0,
        f64::from(rect.3) / 1000.0,
    );
    BoundingBox::new(text, 0.9, rect, norm, index)
}

/// A small slip-like layout:
///
///   date_label   date_value
///   amount_label amount_value      side_note
///   footer
fn sample_doc() -> SpatialDocument {
    let words = vec![
        bbox("Date", (10, 10, 70, 40), 0),
        bbox("12/03/2024", (110, 10, 260, 40), 1),
        bbox("Amount", (10, 60, 100, 90), 2),
        bbox("1,500.00", (110, 60, 240, 90), 3),
        bbox("THB", (260, 60, 320, 90), 4),
        bbox("Footer", (10, 200, 100, 230), 5),
    ];
    SpatialDocument::new(words, 1000, 1000, "slip.png")
}

fn texts(hits: &[&BoundingBox]) -> Vec<String> {
    hits.iter().map(|b| b.text().to_string()).collect()
}

// ============================================================================
// Area search
// ============================================================================

#[test]
fn area_search_uses_center_containment_inclusive() {
    let doc = sample_doc();
    // The top row: centers at y=25.
    let hits = doc.find_in_area((0, 0, 1000, 25));
    assert_eq!(texts(&hits), vec!["Date", "12/03/2024"]);
}

#[test]
fn area_search_returns_reading_order() {
    let doc = sample_doc();
    let hits = doc.find_in_area((0, 0, 1000, 100));
    assert_eq!(
        texts(&hits),
        vec!["Date", "12/03/2024", "Amount", "1,500.00", "THB"]
    );
}

#[test]
fn normalized_area_search_matches_raw() {
    let doc = sample_doc();
    let raw = doc.find_in_area((0, 0, 1000, 100));
    let norm = doc.find_in_normalized_area((0.0, 0.0, 1.0, 0.1));
    assert_eq!(texts(&raw), texts(&norm));
}

// ============================================================================
// Alignment and directional search
// ============================================================================

#[test]
fn row_search_excludes_reference_and_sorts_left_to_right() {
    let doc = sample_doc();
    let amount_label = &doc.words()[2];
    let hits = doc.find_row(amount_label, 10.0);
    assert_eq!(texts(&hits), vec!["1,500.00", "THB"]);
}

#[test]
fn column_search_sorts_top_to_bottom() {
    let doc = sample_doc();
    let date_label = &doc.words()[0];
    let hits = doc.find_column(date_label, 20.0);
    assert_eq!(texts(&hits), vec!["Amount", "Footer"]);
}

#[test]
fn right_of_requires_strictly_past_far_edge() {
    let doc = sample_doc();
    let amount_value = &doc.words()[3];
    let hits = doc.find_right_of(amount_value, 10.0);
    assert_eq!(texts(&hits), vec!["THB"]);
    // Nothing right of the rightmost box.
    let thb = &doc.words()[4];
    assert!(doc.find_right_of(thb, 10.0).is_empty());
}

#[test]
fn below_requires_strictly_past_bottom_edge() {
    let doc = sample_doc();
    let date_label = &doc.words()[0];
    let hits = doc.find_below(date_label, 20.0);
    assert_eq!(texts(&hits), vec!["Amount", "Footer"]);
    let footer = &doc.words()[5];
    assert!(doc.find_below(footer, 20.0).is_empty());
}

// ============================================================================
// Nearest-neighbor search
// ============================================================================

#[test]
fn nearest_sorts_ascending_by_edge_distance() {
    let doc = sample_doc();
    let amount_label = &doc.words()[2];
    let hits = doc.find_nearest(amount_label, 50.0);
    // Touch/overlap distances first: the value on the same row (gap 10),
    // then the date label directly above (gap 20).
    assert_eq!(texts(&hits)[..2], ["1,500.00", "Date"]);
}

#[test]
fn nearest_respects_distance_budget() {
    let doc = sample_doc();
    let footer = &doc.words()[5];
    assert!(doc.find_nearest(footer, 50.0).is_empty());
    assert!(!doc.find_nearest(footer, 200.0).is_empty());
}

#[test]
fn nearest_breaks_ties_by_original_index() {
    let words = vec![
        bbox("ref", (100, 100, 120, 120), 0),
        bbox("right", (140, 100, 160, 120), 1),
        bbox("left", (60, 100, 80, 120), 2),
    ];
    let doc = SpatialDocument::new(words, 1000, 1000, "slip.png");
    let hits = doc.find_nearest(&doc.words()[0], 100.0);
    // Both neighbors sit exactly 20 pixels away.
    assert_eq!(texts(&hits), vec!["right", "left"]);
}

// ============================================================================
// Text search
// ============================================================================

#[test]
fn text_search_is_case_insensitive() {
    let doc = sample_doc();
    assert_eq!(doc.find_text("amount", MatchMode::Exact).len(), 1);
    assert_eq!(doc.find_text("AMOUNT", MatchMode::Contains).len(), 1);
    assert!(doc.find_text("amount!", MatchMode::Exact).is_empty());
}

#[test]
fn substring_search_matches_partial_text() {
    let doc = sample_doc();
    assert_eq!(doc.find_text("500", MatchMode::Contains).len(), 1);
    assert!(doc.find_text("500", MatchMode::Exact).is_empty());
}

#[test]
fn any_of_search_covers_vendor_phrasing_variants() {
    let doc = sample_doc();
    let hits = doc.find_any_text(&["Total", "Amount", "Sum"], MatchMode::Contains);
    assert_eq!(texts(&hits), vec!["Amount"]);
    assert!(
        doc.find_any_text(&["Total", "Sum"], MatchMode::Contains)
            .is_empty()
    );
}

// ============================================================================
// Construction from the OCR response shape
// ============================================================================

#[test]
fn response_ingest_assigns_original_indices() {
    let response = OcrResponse {
        width: 640,
        height: 480,
        source_path: Some("slip.png".into()),
        fragments: vec![
            OcrFragment {
                text: "a".into(),
                confidence: 0.9,
                rect: (0, 0, 10, 10),
                normalized_rect: (0.0, 0.0, 0.1, 0.1),
            },
            OcrFragment {
                text: "b".into(),
                confidence: 0.8,
                rect: (20, 0, 30, 10),
                normalized_rect: (0.2, 0.0, 0.3, 0.1),
            },
        ],
    };
    let doc = SpatialDocument::from_response(response);
    assert_eq!(doc.len(), 2);
    assert_eq!(doc.words()[0].original_index(), 0);
    assert_eq!(doc.words()[1].original_index(), 1);
    assert_eq!(doc.full_text(), "a\nb");
}
