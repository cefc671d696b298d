//! Minimal linear rich-text document model.
//!
//! This is the surface the engine actually consumes from a host editor: a
//! flat item stream (characters interleaved with node open/close markers), an
//! append-only transaction history, and a handful of structure queries.
//! Hosts with a richer tree model adapt it down to this; tests drive it
//! directly.
//!
//! Offsets address items in the flat stream, so a node's *interior* is
//! `[open + 1, close)`. A single trailing [`NodeKind::Internal`] region may
//! hold structural bookkeeping; it is excluded from the addressable document
//! and the extractor never scans into it.

use std::collections::BTreeSet;

use crate::history::{Operation, Transaction};
use crate::range::Range;

/// The closed set of node types the engine can tell apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Paragraph,
    Heading { level: u8 },
    Blockquote,
    List,
    /// An inline citation node, keyed by the document's reference list.
    Reference { key: String },
    /// Trailing structural region, excluded from addressable content.
    Internal,
}

impl NodeKind {
    /// Content-bearing leaf blocks: the nodes whose interiors hold prose.
    pub fn is_content_branch(&self) -> bool {
        matches!(self, NodeKind::Paragraph | NodeKind::Heading { .. })
    }
}

/// One item of the linear document stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Char(char),
    Open(NodeKind),
    Close(NodeKind),
}

impl Item {
    pub fn is_char(&self) -> bool {
        matches!(self, Item::Char(_))
    }
}

/// Convert a string into a run of character items.
pub fn text_items(s: &str) -> Vec<Item> {
    s.chars().map(Item::Char).collect()
}

/// Wrap items in an open/close marker pair.
pub fn wrapped(kind: NodeKind, inner: Vec<Item>) -> Vec<Item> {
    let mut items = Vec::with_capacity(inner.len() + 2);
    items.push(Item::Open(kind.clone()));
    items.extend(inner);
    items.push(Item::Close(kind));
    items
}

/// A paragraph holding plain text.
pub fn paragraph(text: &str) -> Vec<Item> {
    wrapped(NodeKind::Paragraph, text_items(text))
}

/// A heading holding plain text.
pub fn heading(level: u8, text: &str) -> Vec<Item> {
    wrapped(NodeKind::Heading { level }, text_items(text))
}

/// An inline reference node holding its rendered content.
pub fn reference(key: &str, text: &str) -> Vec<Item> {
    wrapped(
        NodeKind::Reference {
            key: key.to_string(),
        },
        text_items(text),
    )
}

/// A heading found in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    /// The whole node, open and close markers included.
    pub range: Range,
}

/// A reference node found in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceNode {
    pub key: String,
    pub text: String,
    /// The whole node, open and close markers included.
    pub range: Range,
    /// The node's content, markers excluded.
    pub interior: Range,
}

/// The document: item stream, edit history, and page-level metadata.
#[derive(Debug, Clone, Default)]
pub struct Document {
    items: Vec<Item>,
    history: Vec<Transaction>,
    categories: BTreeSet<String>,
    templates: BTreeSet<String>,
    disambiguation: bool,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document seeded with pre-existing content. Seed items are the
    /// loaded state, not an edit: they do not appear in the history.
    pub fn from_items(items: Vec<Item>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    /// Monotonic revision counter; bumped by every applied transaction.
    pub fn revision(&self) -> u64 {
        self.history.len() as u64
    }

    /// End of the addressable document: the start of the trailing internal
    /// region if one exists, otherwise the full length.
    pub fn addressable_end(&self) -> usize {
        let mut depth = 0usize;
        for (i, item) in self.items.iter().enumerate() {
            match item {
                Item::Open(kind) => {
                    if depth == 0 && *kind == NodeKind::Internal {
                        return i;
                    }
                    depth += 1;
                }
                Item::Close(_) => depth = depth.saturating_sub(1),
                Item::Char(_) => {}
            }
        }
        self.items.len()
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn add_category(&mut self, name: impl Into<String>) {
        self.categories.insert(name.into());
    }

    pub fn templates(&self) -> &BTreeSet<String> {
        &self.templates
    }

    pub fn add_template(&mut self, name: impl Into<String>) {
        self.templates.insert(name.into());
    }

    pub fn is_disambiguation(&self) -> bool {
        self.disambiguation
    }

    pub fn set_disambiguation(&mut self, value: bool) {
        self.disambiguation = value;
    }

    // ------------------------------------------------------------------
    // Content queries
    // ------------------------------------------------------------------

    /// Characters within `range`, markers skipped.
    pub fn text_of(&self, range: Range) -> String {
        self.items[range.start..range.end]
            .iter()
            .filter_map(|item| match item {
                Item::Char(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Number of character items within `range`.
    pub fn char_count(&self, range: Range) -> usize {
        self.items[range.start..range.end]
            .iter()
            .filter(|item| item.is_char())
            .count()
    }

    /// Whether `range` contains a reference node's open marker.
    pub fn has_reference_in(&self, range: Range) -> bool {
        self.items[range.start..range.end]
            .iter()
            .any(|item| matches!(item, Item::Open(NodeKind::Reference { .. })))
    }

    /// Occurrences of `needle` within `range`, as item-offset ranges. Matches
    /// must be contiguous character runs; a marker in the middle breaks one.
    pub fn find_text(&self, range: Range, needle: &str) -> Vec<Range> {
        let needle: Vec<char> = needle.chars().collect();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut found = Vec::new();
        let mut i = range.start;
        'outer: while i + needle.len() <= range.end {
            for (j, nc) in needle.iter().enumerate() {
                match &self.items[i + j] {
                    Item::Char(c) if c == nc => {}
                    _ => {
                        i += 1;
                        continue 'outer;
                    }
                }
            }
            found.push(Range::new(i, i + needle.len()));
            i += needle.len();
        }
        found
    }

    // ------------------------------------------------------------------
    // Structure queries
    // ------------------------------------------------------------------

    /// All headings in document order.
    pub fn headings(&self) -> Vec<Heading> {
        let mut headings = Vec::new();
        let mut stack: Vec<(NodeKind, usize)> = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            match item {
                Item::Open(kind) => stack.push((kind.clone(), i)),
                Item::Close(_) => {
                    if let Some((NodeKind::Heading { level }, open)) = stack.pop() {
                        headings.push(Heading {
                            level,
                            text: self.text_of(Range::new(open + 1, i)),
                            range: Range::new(open, i + 1),
                        });
                    }
                }
                Item::Char(_) => {}
            }
        }
        headings
    }

    /// All reference nodes in document order.
    pub fn references(&self) -> Vec<ReferenceNode> {
        let mut refs = Vec::new();
        let mut stack: Vec<(NodeKind, usize)> = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            match item {
                Item::Open(kind) => stack.push((kind.clone(), i)),
                Item::Close(_) => {
                    if let Some((NodeKind::Reference { key }, open)) = stack.pop() {
                        refs.push(ReferenceNode {
                            key,
                            text: self.text_of(Range::new(open + 1, i)),
                            range: Range::new(open, i + 1),
                            interior: Range::new(open + 1, i),
                        });
                    }
                }
                Item::Char(_) => {}
            }
        }
        refs
    }

    /// Interior of the innermost content-bearing leaf block containing
    /// `offset`, if any.
    pub fn enclosing_block(&self, offset: usize) -> Option<Range> {
        let mut stack: Vec<(NodeKind, usize)> = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            match item {
                Item::Open(kind) => stack.push((kind.clone(), i)),
                Item::Close(_) => {
                    if let Some((kind, open)) = stack.pop() {
                        if kind.is_content_branch() && open < offset && offset < i {
                            return Some(Range::new(open + 1, i));
                        }
                    }
                }
                Item::Char(_) => {}
            }
        }
        None
    }

    /// Whether `offset` lies inside a blockquote container at any depth.
    pub fn is_inside_blockquote(&self, offset: usize) -> bool {
        let mut stack: Vec<(NodeKind, usize)> = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            match item {
                Item::Open(kind) => stack.push((kind.clone(), i)),
                Item::Close(_) => {
                    if let Some((NodeKind::Blockquote, open)) = stack.pop() {
                        if open < offset && offset < i {
                            return true;
                        }
                    }
                }
                Item::Char(_) => {}
            }
        }
        false
    }

    /// Project `range` onto the interiors of the content-bearing leaf blocks
    /// it intersects. With `covered_only`, an interior counts only when the
    /// range spans all of it.
    pub fn content_ranges(&self, range: Range, covered_only: bool) -> Vec<Range> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeKind, usize)> = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            match item {
                Item::Open(kind) => stack.push((kind.clone(), i)),
                Item::Close(_) => {
                    if let Some((kind, open)) = stack.pop() {
                        if !kind.is_content_branch() {
                            continue;
                        }
                        let interior = Range::new(open + 1, i);
                        if covered_only {
                            if range.contains_range(interior) && !interior.is_empty() {
                                out.push(interior);
                            }
                        } else if let Some(overlap) = range.intersection(interior) {
                            out.push(overlap);
                        }
                    }
                }
                Item::Char(_) => {}
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Insert `items` at `offset`.
    pub fn insert(&mut self, offset: usize, items: Vec<Item>) {
        assert!(
            offset <= self.items.len(),
            "insert offset {offset} out of bounds (len {})",
            self.items.len()
        );
        let tx = self.build_replace(Range::collapsed(offset), items);
        self.apply_transaction(tx);
    }

    /// Remove the items within `range`.
    pub fn remove(&mut self, range: Range) {
        let tx = self.build_replace(range, Vec::new());
        self.apply_transaction(tx);
    }

    /// Replace the items within `range` with `items`.
    pub fn replace(&mut self, range: Range, items: Vec<Item>) {
        let tx = self.build_replace(range, items);
        self.apply_transaction(tx);
    }

    /// Undo the most recent transaction. The inverse is applied and recorded
    /// as a new history entry (history is append-only, never truncated).
    pub fn undo(&mut self) -> bool {
        let Some(last) = self.history.last() else {
            return false;
        };
        let inverse = last.invert();
        self.apply_transaction(inverse);
        true
    }

    fn build_replace(&self, range: Range, insert: Vec<Item>) -> Transaction {
        assert!(
            range.end <= self.items.len(),
            "edit range {range} out of bounds (len {})",
            self.items.len()
        );
        let mut ops = Vec::with_capacity(3);
        if range.start > 0 {
            ops.push(Operation::Retain(range.start));
        }
        ops.push(Operation::Replace {
            remove: self.items[range.start..range.end].to_vec(),
            insert,
        });
        if range.end < self.items.len() {
            ops.push(Operation::Retain(self.items.len() - range.end));
        }
        Transaction::new(ops)
    }

    fn apply_transaction(&mut self, tx: Transaction) {
        assert_eq!(
            tx.len_before(),
            self.items.len(),
            "transaction does not span the document"
        );
        let mut next = Vec::with_capacity(tx.len_after());
        let mut cursor = 0;
        for op in &tx.ops {
            match op {
                Operation::Retain(n) => {
                    next.extend_from_slice(&self.items[cursor..cursor + n]);
                    cursor += n;
                }
                Operation::Replace { remove, insert } => {
                    cursor += remove.len();
                    next.extend(insert.iter().cloned());
                }
            }
        }
        self.items = next;
        self.history.push(tx);
    }
}
