//! Session-scoped dismissal and acceptance tags.
//!
//! Checks keyed by an external id are tagged by id; everything else is
//! tagged by fragment: a range anchored at the revision it was tagged at
//! and re-projected through later edits on demand. Fragments are plain
//! values, not references into live document state, so the store stays
//! index-stable across arbitrary edits.

use std::collections::{BTreeSet, HashMap};

use crate::check::Check;
use crate::document::Document;
use crate::history::{Operation, Transaction};
use crate::range::Range;

/// Review verdicts that persist for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Dismissed,
    Accepted,
}

/// A range anchored at a past document revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub range: Range,
    pub revision: u64,
}

impl Fragment {
    pub fn new(range: Range, revision: u64) -> Self {
        Self { range, revision }
    }

    /// The fragment's range in the document's current revision, obtained by
    /// replaying every transaction applied since the fragment was anchored.
    pub fn project(&self, doc: &Document) -> Range {
        let mut range = self.range;
        for tx in &doc.history()[self.revision as usize..] {
            range = project_through(range, tx);
        }
        range
    }
}

/// Carry a range through one transaction.
///
/// Edits entirely before the range shift it; removals overlapping it shrink
/// it; insertions strictly inside grow it. Insertions at the boundary of a
/// non-empty range are excluded, so an edit adjacent to a dismissed span
/// does not inherit the dismissal. A collapsed range absorbs an insertion at
/// its position, so undoing and redoing an equivalent edit stays inside it.
fn project_through(range: Range, tx: &Transaction) -> Range {
    let mut range = range;
    let mut pos = 0usize;
    for op in &tx.ops {
        match op {
            Operation::Retain(n) => pos += n,
            Operation::Replace { remove, insert } => {
                range = adjust(range, pos, remove.len(), insert.len());
                pos += insert.len();
            }
        }
    }
    range
}

fn adjust(range: Range, pos: usize, removed: usize, inserted: usize) -> Range {
    let removal_end = pos + removed;

    // A collapsed range absorbs an insertion landing exactly on it
    if range.is_empty() && removed == 0 && pos == range.start {
        return Range::new(range.start, range.end + inserted);
    }
    // Entirely at or past the end (includes a boundary insertion at end)
    if pos >= range.end {
        return range;
    }
    // Entirely before the start (includes a boundary insertion at start)
    if removal_end <= range.start {
        return Range::new(
            range.start - removed + inserted,
            range.end - removed + inserted,
        );
    }

    // Overlap. Trim the removed span out of the range, then place the
    // insertion: inside if the edit began strictly inside, before otherwise.
    let removed_before = range.start.saturating_sub(pos);
    let removed_inside = removal_end.min(range.end) - pos.max(range.start);
    let mut start = range.start - removed_before;
    let mut end = range.end - removed_before - removed_inside;
    if pos > range.start {
        end += inserted;
    } else {
        start += inserted;
        end += inserted;
    }
    Range::new(start, end)
}

type Key = (String, Tag);

/// Dismissed / accepted bookkeeping for one review session.
#[derive(Debug, Default)]
pub struct TagStore {
    ids: HashMap<Key, BTreeSet<String>>,
    fragments: HashMap<Key, Vec<Fragment>>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `tag` for `check`: by id if it has one, by fragment otherwise.
    pub fn tag(&mut self, tag: Tag, check: &Check) {
        let key = (check.name.clone(), tag);
        if let Some(id) = &check.id {
            self.ids.entry(key).or_default().insert(id.clone());
        } else {
            self.fragments
                .entry(key)
                .or_default()
                .extend(check.fragments.iter().copied());
        }
    }

    /// Withdraw `tag` from `check`.
    pub fn untag(&mut self, tag: Tag, check: &Check, doc: &Document) {
        let key = (check.name.clone(), tag);
        if let Some(id) = &check.id {
            if let Some(set) = self.ids.get_mut(&key) {
                set.remove(id);
            }
            return;
        }
        let Some(fragments) = self.fragments.get_mut(&key) else {
            return;
        };
        let check_ranges: Vec<Range> = check.current_ranges(doc);
        fragments.retain(|f| {
            let projected = f.project(doc);
            !check_ranges.iter().any(|r| projected.touches_range(*r))
        });
    }

    pub fn is_tagged_id(&self, name: &str, tag: Tag, id: &str) -> bool {
        self.ids
            .get(&(name.to_string(), tag))
            .is_some_and(|set| set.contains(id))
    }

    /// Whether `range` lies within any tagged fragment, projected to the
    /// current revision.
    pub fn is_tagged_range(&self, name: &str, tag: Tag, range: Range, doc: &Document) -> bool {
        self.fragments
            .get(&(name.to_string(), tag))
            .is_some_and(|fragments| {
                fragments
                    .iter()
                    .any(|f| f.project(doc).contains_range(range))
            })
    }

    pub fn is_dismissed_id(&self, name: &str, id: &str) -> bool {
        self.is_tagged_id(name, Tag::Dismissed, id)
    }

    pub fn is_dismissed_range(&self, name: &str, range: Range, doc: &Document) -> bool {
        self.is_tagged_range(name, Tag::Dismissed, range, doc)
    }

    /// Drop every tag. Called when the review session ends.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.fragments.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.ids.values().all(BTreeSet::is_empty)
            && self.fragments.values().all(Vec::is_empty)
    }
}
