//! Extraction of modified/added ranges from the document's edit history.
//!
//! The extractor squashes the complete history into one logical transaction
//! and walks it, recovering the absolute ranges of inserted content in the
//! current document. Deriving a full check pass queries this several times
//! with the same flags (once per definition), so results are memoized per
//! document revision.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::document::Document;
use crate::history::{Operation, squash};
use crate::range::Range;

/// Which candidate ranges a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExtractFlags {
    /// Keep only leaf-node interiors fully spanned by a candidate. Implies
    /// content-range projection.
    pub covered_nodes_only: bool,
    /// Project candidates onto content-bearing leaf-node interiors.
    pub content_ranges_only: bool,
    /// Drop candidates whose operation removed visible text (an edit that
    /// replaced prose, rather than adding some).
    pub pure_insertions_only: bool,
}

#[derive(Default)]
struct ExtractCache {
    revision: u64,
    entries: HashMap<ExtractFlags, Vec<Range>>,
}

/// Derives the set of ranges added or modified since the document was
/// loaded.
#[derive(Default)]
pub struct RangeDiffExtractor {
    cache: Mutex<ExtractCache>,
}

impl RangeDiffExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranges of content inserted by the accumulated edit history, in
    /// current-document offsets.
    ///
    /// A failure to squash the history is an accepted edge case of the
    /// transaction model and degrades to "no candidates" rather than an
    /// error: a check pass must never break the editor over a history shape
    /// it cannot fold.
    pub fn modified_ranges(&self, doc: &Document, flags: ExtractFlags) -> Vec<Range> {
        {
            let mut cache = self.cache.lock().unwrap();
            if cache.revision != doc.revision() {
                cache.revision = doc.revision();
                cache.entries.clear();
            } else if let Some(hit) = cache.entries.get(&flags) {
                debug!(revision = doc.revision(), ?flags, "modified-range cache hit");
                return hit.clone();
            }
        }

        let ranges = self.compute(doc, flags);

        let mut cache = self.cache.lock().unwrap();
        if cache.revision == doc.revision() {
            cache.entries.insert(flags, ranges.clone());
        }
        ranges
    }

    fn compute(&self, doc: &Document, flags: ExtractFlags) -> Vec<Range> {
        let ops = match squash(doc.history()) {
            Ok(ops) => ops,
            Err(e) => {
                warn!("failed to squash edit history, deriving no candidates: {e:#}");
                return Vec::new();
            }
        };

        let end = doc.addressable_end();
        let mut offset = 0usize;
        let mut candidates = Vec::new();
        for op in &ops {
            if offset >= end {
                break;
            }
            match op {
                Operation::Retain(n) => offset += n,
                Operation::Replace { remove, insert } => {
                    let qualifies = !insert.is_empty()
                        && (!flags.pure_insertions_only || remove.iter().all(|i| !i.is_char()));
                    if qualifies {
                        candidates.push(Range::new(offset, offset + insert.len()));
                    }
                    offset += insert.len();
                }
            }
        }

        if flags.content_ranges_only || flags.covered_nodes_only {
            let mut projected = Vec::new();
            for candidate in candidates {
                projected.extend(doc.content_ranges(candidate, flags.covered_nodes_only));
            }
            projected.sort();
            projected.dedup();
            candidates = projected;
        }

        debug!(
            revision = doc.revision(),
            count = candidates.len(),
            "derived modified ranges"
        );
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, NodeKind, paragraph, text_items, wrapped};

    #[test]
    fn test_pure_insertion_yields_exact_range() {
        let mut doc = Document::new();
        doc.insert(0, text_items("hello"));
        let extractor = RangeDiffExtractor::new();
        let ranges = extractor.modified_ranges(&doc, ExtractFlags::default());
        assert_eq!(ranges, vec![Range::new(0, 5)]);
    }

    #[test]
    fn test_element_only_removal_still_qualifies() {
        let mut doc = Document::from_items(paragraph("ab"));
        // Replace the whole paragraph node with a bare text run: removes
        // markers and chars; then a narrower case removing only markers.
        let mut structural = Document::from_items(wrapped(NodeKind::List, Vec::new()));
        structural.replace(Range::new(0, 2), text_items("xy"));
        let extractor = RangeDiffExtractor::new();
        let flags = ExtractFlags {
            pure_insertions_only: true,
            ..Default::default()
        };
        let ranges = extractor.modified_ranges(&structural, flags);
        assert_eq!(ranges, vec![Range::new(0, 2)]);

        // Removing visible text disqualifies under pure_insertions_only
        doc.replace(Range::new(1, 3), text_items("cd"));
        let extractor = RangeDiffExtractor::new();
        assert_eq!(extractor.modified_ranges(&doc, flags), Vec::new());
        // ...but is a candidate when modified ranges are acceptable
        assert_eq!(
            extractor.modified_ranges(&doc, ExtractFlags::default()),
            vec![Range::new(1, 3)]
        );
    }

    #[test]
    fn test_pure_deletion_yields_nothing() {
        let mut doc = Document::from_items(paragraph("abcdef"));
        doc.remove(Range::new(2, 4));
        let extractor = RangeDiffExtractor::new();
        assert_eq!(
            extractor.modified_ranges(&doc, ExtractFlags::default()),
            Vec::new()
        );
    }

    #[test]
    fn test_offsets_accumulate_across_operations() {
        let mut doc = Document::from_items(paragraph("abcdef"));
        doc.insert(3, text_items("XY"));
        doc.insert(8, text_items("Z"));
        let extractor = RangeDiffExtractor::new();
        let ranges = extractor.modified_ranges(&doc, ExtractFlags::default());
        assert_eq!(ranges, vec![Range::new(3, 5), Range::new(8, 9)]);
    }

    #[test]
    fn test_content_range_projection() {
        let mut doc = Document::new();
        doc.insert(0, paragraph("hello world"));
        let extractor = RangeDiffExtractor::new();
        let flags = ExtractFlags {
            content_ranges_only: true,
            ..Default::default()
        };
        // The insertion covers the node markers too; projection trims to the
        // paragraph interior.
        let ranges = extractor.modified_ranges(&doc, flags);
        assert_eq!(ranges, vec![Range::new(1, 12)]);
    }

    #[test]
    fn test_covered_nodes_only() {
        let mut doc = Document::from_items(paragraph("stable"));
        doc.insert(doc.len(), paragraph("fresh"));
        let extractor = RangeDiffExtractor::new();
        let covered = extractor.modified_ranges(
            &doc,
            ExtractFlags {
                covered_nodes_only: true,
                content_ranges_only: true,
                pure_insertions_only: true,
            },
        );
        // Only the freshly-inserted paragraph is fully covered
        assert_eq!(covered, vec![Range::new(9, 14)]);
    }

    #[test]
    fn test_stops_at_addressable_end() {
        let mut items = paragraph("ab");
        items.extend(wrapped(NodeKind::Internal, Vec::new()));
        let mut doc = Document::from_items(items);
        // An edit inside the trailing internal region is not a candidate
        doc.insert(5, text_items("x"));
        let extractor = RangeDiffExtractor::new();
        assert_eq!(
            extractor.modified_ranges(&doc, ExtractFlags::default()),
            Vec::new()
        );
    }

    #[test]
    fn test_cache_reused_within_revision() {
        let mut doc = Document::new();
        doc.insert(0, text_items("hello"));
        let extractor = RangeDiffExtractor::new();
        let first = extractor.modified_ranges(&doc, ExtractFlags::default());
        let second = extractor.modified_ranges(&doc, ExtractFlags::default());
        assert_eq!(first, second);
        // A new revision invalidates
        doc.insert(5, text_items("!"));
        let third = extractor.modified_ranges(&doc, ExtractFlags::default());
        assert_eq!(third, vec![Range::new(0, 6)]);
    }
}
