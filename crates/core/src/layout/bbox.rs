//! OCR text fragment with raw and normalized rectangles.

/// Default tolerance in pixels for same-row checks (vertical-center
/// difference). Rows in slip layouts are visually looser than columns,
/// so this is wider than the column tolerance.
pub const DEFAULT_HORIZONTAL_ALIGN_TOLERANCE: f64 = 20.0;

/// Default tolerance in pixels for same-column checks (horizontal-center
/// difference).
pub const DEFAULT_VERTICAL_ALIGN_TOLERANCE: f64 = 10.0;

/// A raw pixel rectangle (x1, y1, x2, y2) with top-left origin and y growing
/// downward. x2 >= x1 and y2 >= y1.
pub type PixelRect = (i32, i32, i32, i32);

/// A rectangle normalized to the document dimensions, all values in [0, 1].
pub type NormalizedRect = (f64, f64, f64, f64);

/// One recognized text fragment: text, confidence, and its rectangle at both
/// the raw pixel scale and the normalized document scale.
///
/// Immutable after construction. The raw and normalized rectangles describe
/// the same fragment at different scales; `original_index` is the fragment's
/// position in the OCR response, kept for traceability through the merge
/// pass and into provenance notes.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    text: String,
    confidence: f64,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    nx1: f64,
    ny1: f64,
    nx2: f64,
    ny2: f64,
    original_index: usize,
}

impl BoundingBox {
    /// Creates a bounding box, reordering swapped coordinates and clamping
    /// the normalized rectangle and confidence into [0, 1].
    pub fn new(
        text: impl Into<String>,
        confidence: f64,
        rect: PixelRect,
        normalized: NormalizedRect,
        original_index: usize,
    ) -> Self {
        let (x1, y1, x2, y2) = rect;
        let (nx1, ny1, nx2, ny2) = normalized;
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
            nx1: nx1.min(nx2).clamp(0.0, 1.0),
            ny1: ny1.min(ny2).clamp(0.0, 1.0),
            nx2: nx1.max(nx2).clamp(0.0, 1.0),
            ny2: ny1.max(ny2).clamp(0.0, 1.0),
            original_index,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    pub fn x2(&self) -> i32 {
        self.x2
    }

    pub fn y2(&self) -> i32 {
        self.y2
    }

    pub fn rect(&self) -> PixelRect {
        (self.x1, self.y1, self.x2, self.y2)
    }

    pub fn normalized_rect(&self) -> NormalizedRect {
        (self.nx1, self.ny1, self.nx2, self.ny2)
    }

    pub fn original_index(&self) -> usize {
        self.original_index
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Raw width x raw height.
    pub fn area(&self) -> i64 {
        i64::from(self.width()) * i64::from(self.height())
    }

    /// Center of the raw rectangle.
    pub fn center(&self) -> (f64, f64) {
        (
            f64::from(self.x1 + self.x2) / 2.0,
            f64::from(self.y1 + self.y2) / 2.0,
        )
    }

    /// Center of the normalized rectangle.
    pub fn normalized_center(&self) -> (f64, f64) {
        ((self.nx1 + self.nx2) / 2.0, (self.ny1 + self.ny2) / 2.0)
    }

    /// Returns true if the two boxes sit on the same visual row: the
    /// difference between their vertical centers is within `tolerance`.
    pub fn horizontally_aligned(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (self.center().1 - other.center().1).abs() <= tolerance
    }

    /// Returns true if the two boxes sit in the same visual column: the
    /// difference between their horizontal centers is within `tolerance`.
    pub fn vertically_aligned(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (self.center().0 - other.center().0).abs() <= tolerance
    }

    /// Returns true if the two boxes share any horizontal extent.
    pub fn overlaps_horizontally(&self, other: &BoundingBox) -> bool {
        other.x1 <= self.x2 && self.x1 <= other.x2
    }

    /// Returns true if the two boxes share any vertical extent.
    pub fn overlaps_vertically(&self, other: &BoundingBox) -> bool {
        other.y1 <= self.y2 && self.y1 <= other.y2
    }

    /// Axis-aligned rectangle intersection test.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.overlaps_horizontally(other) && self.overlaps_vertically(other)
    }

    /// Gap between nearest vertical edges. Returns 0 if the boxes overlap on
    /// the horizontal axis. This is edge-to-edge, not center-to-center.
    pub fn horizontal_distance(&self, other: &BoundingBox) -> f64 {
        if self.overlaps_horizontally(other) {
            0.0
        } else {
            f64::from((self.x1 - other.x2).abs().min((self.x2 - other.x1).abs()))
        }
    }

    /// Gap between nearest horizontal edges. Returns 0 if the boxes overlap
    /// on the vertical axis.
    pub fn vertical_distance(&self, other: &BoundingBox) -> f64 {
        if self.overlaps_vertically(other) {
            0.0
        } else {
            f64::from((self.y1 - other.y2).abs().min((self.y2 - other.y1).abs()))
        }
    }

    /// Amount of horizontal extent shared with another box, in pixels.
    pub fn horizontal_overlap(&self, other: &BoundingBox) -> f64 {
        if self.overlaps_horizontally(other) {
            f64::from((self.x1 - other.x2).abs().min((self.x2 - other.x1).abs()))
        } else {
            0.0
        }
    }

    /// Euclidean distance built from the two edge-to-edge axis gaps:
    /// sqrt(h_dist^2 + v_dist^2). Zero for overlapping boxes.
    pub fn edge_distance(&self, other: &BoundingBox) -> f64 {
        let h = self.horizontal_distance(other);
        let v = self.vertical_distance(other);
        (h * h + v * v).sqrt()
    }
}
