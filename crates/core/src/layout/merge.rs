//! Glyph-cluster merge for Thai text.
//!
//! Some OCR engines emit a base glyph and its combining marks (tone marks,
//! above/below vowels) as separate fragments. This pass fuses fragments that
//! are stacked vertically with strong horizontal overlap back into single
//! logical words, so patterns match on whole word text rather than raw OCR
//! tokens. It must run before any pattern matching.

use tracing::debug;

use super::bbox::BoundingBox;

/// Parameters for the glyph-cluster merge pass.
///
/// Controls when two fragments are considered parts of one stacked glyph
/// cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeParams {
    /// Maximum edge-to-edge vertical gap, in pixels, for two fragments to be
    /// considered stacked. Fragments overlapping vertically have gap 0.
    pub max_vertical_gap: f64,

    /// Minimum horizontal overlap for two fragments to be considered
    /// stacked. Specified relative to the width of the narrower fragment.
    pub min_horizontal_overlap: f64,
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            max_vertical_gap: 8.0,
            min_horizontal_overlap: 0.5,
        }
    }
}

impl MergeParams {
    /// Creates merge parameters with the specified values.
    ///
    /// # Panics
    /// Panics if min_horizontal_overlap is not in range [0.0, 1.0].
    pub fn new(max_vertical_gap: f64, min_horizontal_overlap: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&min_horizontal_overlap),
            "min_horizontal_overlap should be a number between 0 and 1"
        );
        Self {
            max_vertical_gap,
            min_horizontal_overlap,
        }
    }
}

/// Returns true if the text contains any code point in the Thai block
/// (U+0E00..U+0E7F). Documents without Thai content skip the merge pass.
pub fn has_thai_content(text: &str) -> bool {
    text.chars().any(|c| ('\u{0E00}'..='\u{0E7F}').contains(&c))
}

fn should_merge(a: &BoundingBox, b: &BoundingBox, params: &MergeParams) -> bool {
    if a.vertical_distance(b) > params.max_vertical_gap {
        return false;
    }
    let narrower = f64::from(a.width().min(b.width()));
    if narrower <= 0.0 {
        return false;
    }
    a.horizontal_overlap(b) / narrower >= params.min_horizontal_overlap
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Fuses one cluster of stacked fragments into a single box.
///
/// Text order: the tallest fragment is the base glyph and comes first;
/// combining marks follow top-to-bottom, which matches Thai codepoint
/// ordering for above and below marks. Confidence is the minimum of the
/// cluster, never an average, so a low-confidence fragment stays visible.
fn fuse_cluster(cluster: &[&BoundingBox]) -> BoundingBox {
    debug_assert!(!cluster.is_empty());

    let base = cluster
        .iter()
        .enumerate()
        .max_by_key(|(i, b)| (b.height(), std::cmp::Reverse(*i)))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut marks: Vec<usize> = (0..cluster.len()).filter(|&i| i != base).collect();
    marks.sort_by_key(|&i| (cluster[i].y1(), cluster[i].original_index()));

    let mut text = cluster[base].text().to_string();
    for &i in &marks {
        text.push_str(cluster[i].text());
    }

    let mut rect = cluster[0].rect();
    let mut norm = cluster[0].normalized_rect();
    let mut confidence = cluster[0].confidence();
    let mut original_index = cluster[0].original_index();
    for b in &cluster[1..] {
        let (x1, y1, x2, y2) = b.rect();
        rect = (rect.0.min(x1), rect.1.min(y1), rect.2.max(x2), rect.3.max(y2));
        let (nx1, ny1, nx2, ny2) = b.normalized_rect();
        norm = (
            norm.0.min(nx1),
            norm.1.min(ny1),
            norm.2.max(nx2),
            norm.3.max(ny2),
        );
        confidence = confidence.min(b.confidence());
        original_index = original_index.min(b.original_index());
    }

    BoundingBox::new(text, confidence, rect, norm, original_index)
}

/// Merges stacked glyph fragments into whole words.
///
/// Fragments whose vertical gap and horizontal overlap satisfy `params` are
/// grouped transitively; each group is replaced by one box covering the
/// union of its members. Boxes that belong to no group pass through
/// untouched. Output preserves ascending original-index order, and running
/// the pass again on its own output produces no further changes for
/// already-fused words.
pub fn merge_clusters(words: Vec<BoundingBox>, params: &MergeParams) -> Vec<BoundingBox> {
    let n = words.len();
    if n < 2 {
        return words;
    }

    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if should_merge(&words[i], &words[j], params) {
                let (ri, rj) = (find_root(&mut parent, i), find_root(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut clusters: Vec<Vec<&BoundingBox>> = Vec::new();
    let mut cluster_of: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        let root = find_root(&mut parent, i);
        let slot = match cluster_of[root] {
            Some(slot) => slot,
            None => {
                clusters.push(Vec::new());
                cluster_of[root] = Some(clusters.len() - 1);
                clusters.len() - 1
            }
        };
        clusters[slot].push(&words[i]);
    }

    let fused = clusters.len();
    let mut merged: Vec<BoundingBox> = clusters.iter().map(|c| fuse_cluster(c)).collect();
    merged.sort_by_key(BoundingBox::original_index);

    if fused < n {
        debug!(fragments = n, words = fused, "merged stacked glyph clusters");
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, rect: (i32, i32, i32, i32), index: usize) -> BoundingBox {
        BoundingBox::new(text, 0.9, rect, (0.0, 0.0, 0.1, 0.1), index)
    }

    #[test]
    fn side_by_side_words_do_not_merge() {
        let words = vec![frag("one", (0, 0, 40, 20), 0), frag("two", (50, 0, 90, 20), 1)];
        let merged = merge_clusters(words.clone(), &MergeParams::default());
        assert_eq!(merged, words);
    }

    #[test]
    fn stacked_mark_merges_onto_base() {
        // Tone mark above the base glyph, almost fully contained horizontally.
        let base = frag("\u{0E01}", (10, 20, 30, 50), 0);
        let mark = frag("\u{0E49}", (14, 10, 26, 18), 1);
        let merged = merge_clusters(vec![base, mark], &MergeParams::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text(), "\u{0E01}\u{0E49}");
        assert_eq!(merged[0].rect(), (10, 10, 30, 50));
    }

    #[test]
    fn thai_content_detection() {
        assert!(has_thai_content("1,500.00 \u{0E1A}\u{0E32}\u{0E17}"));
        assert!(!has_thai_content("1,500.00 THB"));
    }
}
