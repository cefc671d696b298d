//! The document's append-only edit history.
//!
//! Every mutation is recorded as a [`Transaction`]: an ordered run of
//! retain/replace operations spanning the document it applied to. The range
//! extractor never walks transactions one by one; it first folds the whole
//! history into a single logical transaction over the originally-loaded
//! document via [`squash`], so that an insert-then-edit-then-undo sequence
//! collapses to its net effect.

use eyre::{Result, bail};

use crate::document::Item;

/// One operation of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Pass `n` items through unchanged.
    Retain(usize),
    /// Remove `remove` at the current position and insert `insert` in its
    /// place. Either side may be empty (pure insertion / pure deletion).
    Replace {
        remove: Vec<Item>,
        insert: Vec<Item>,
    },
}

impl Operation {
    /// Length of document content this operation consumes.
    pub fn consumed(&self) -> usize {
        match self {
            Operation::Retain(n) => *n,
            Operation::Replace { remove, .. } => remove.len(),
        }
    }

    /// Length of document content this operation produces.
    pub fn produced(&self) -> usize {
        match self {
            Operation::Retain(n) => *n,
            Operation::Replace { insert, .. } => insert.len(),
        }
    }
}

/// An ordered run of operations covering one whole document state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transaction {
    pub ops: Vec<Operation>,
}

impl Transaction {
    pub fn new(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    /// Document length this transaction applies to.
    pub fn len_before(&self) -> usize {
        self.ops.iter().map(Operation::consumed).sum()
    }

    /// Document length after this transaction.
    pub fn len_after(&self) -> usize {
        self.ops.iter().map(Operation::produced).sum()
    }

    /// The transaction that exactly undoes this one.
    pub fn invert(&self) -> Transaction {
        Transaction::new(
            self.ops
                .iter()
                .map(|op| match op {
                    Operation::Retain(n) => Operation::Retain(*n),
                    Operation::Replace { remove, insert } => Operation::Replace {
                        remove: insert.clone(),
                        insert: remove.clone(),
                    },
                })
                .collect(),
        )
    }
}

// ============================================================================
// Composition
// ============================================================================

/// Builds a normalized operation list: adjacent retains merge, removes and
/// inserts accumulate into the trailing replace.
#[derive(Default)]
struct OpBuilder {
    ops: Vec<Operation>,
}

impl OpBuilder {
    fn retain(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        if let Some(Operation::Retain(r)) = self.ops.last_mut() {
            *r += n;
        } else {
            self.ops.push(Operation::Retain(n));
        }
    }

    fn remove(&mut self, items: &[Item]) {
        if items.is_empty() {
            return;
        }
        if let Some(Operation::Replace { remove, .. }) = self.ops.last_mut() {
            remove.extend(items.iter().cloned());
        } else {
            self.ops.push(Operation::Replace {
                remove: items.to_vec(),
                insert: Vec::new(),
            });
        }
    }

    fn insert(&mut self, items: &[Item]) {
        if items.is_empty() {
            return;
        }
        if let Some(Operation::Replace { insert, .. }) = self.ops.last_mut() {
            insert.extend(items.iter().cloned());
        } else {
            self.ops.push(Operation::Replace {
                remove: Vec::new(),
                insert: items.to_vec(),
            });
        }
    }

    fn finish(self) -> Vec<Operation> {
        self.ops
    }
}

/// Cursor over the output stream of transaction `a` during composition.
struct Production<'a> {
    ops: &'a [Operation],
    idx: usize,
    /// How much of the current op's production has been consumed.
    off: usize,
    /// Whether the current op's removed items have been emitted.
    removed: bool,
}

impl<'a> Production<'a> {
    fn new(ops: &'a [Operation]) -> Self {
        Self {
            ops,
            idx: 0,
            off: 0,
            removed: false,
        }
    }

    /// Advance to the next op that still has unconsumed production, emitting
    /// the removes of every op entered along the way. Returns `None` when `a`
    /// is exhausted.
    fn settle(&mut self, out: &mut OpBuilder) -> Option<&'a Operation> {
        while let Some(op) = self.ops.get(self.idx) {
            if !self.removed {
                if let Operation::Replace { remove, .. } = op {
                    out.remove(remove);
                }
                self.removed = true;
            }
            if self.off < op.produced() {
                return Some(op);
            }
            self.idx += 1;
            self.off = 0;
            self.removed = false;
        }
        None
    }

    /// Whether any production is left (also drains trailing pure deletions).
    fn drain(&mut self, out: &mut OpBuilder) -> bool {
        self.settle(out).is_some()
    }
}

/// Compose two consecutive transactions into one: `a` maps the original
/// document to an intermediate state, `b` maps that state onward; the result
/// maps the original document directly to the final state.
///
/// Fails when `b` does not span exactly the document `a` produced, the
/// accepted failure mode of history squashing, which callers treat as "no
/// candidates" rather than an error.
pub fn compose(a: &[Operation], b: &[Operation]) -> Result<Vec<Operation>> {
    let mut out = OpBuilder::default();
    let mut prod = Production::new(a);

    for bop in b {
        match bop {
            Operation::Retain(m) => {
                let mut m = *m;
                while m > 0 {
                    let Some(aop) = prod.settle(&mut out) else {
                        bail!("history composition over-consumed: retain past end");
                    };
                    match aop {
                        Operation::Retain(n) => {
                            let k = m.min(n - prod.off);
                            out.retain(k);
                            prod.off += k;
                            m -= k;
                        }
                        Operation::Replace { insert, .. } => {
                            let k = m.min(insert.len() - prod.off);
                            out.insert(&insert[prod.off..prod.off + k]);
                            prod.off += k;
                            m -= k;
                        }
                    }
                }
            }
            Operation::Replace { remove, insert } => {
                let mut ri = 0;
                while ri < remove.len() {
                    let Some(aop) = prod.settle(&mut out) else {
                        bail!("history composition over-consumed: remove past end");
                    };
                    match aop {
                        Operation::Retain(n) => {
                            let k = (remove.len() - ri).min(n - prod.off);
                            out.remove(&remove[ri..ri + k]);
                            prod.off += k;
                            ri += k;
                        }
                        Operation::Replace {
                            insert: a_insert, ..
                        } => {
                            // b removed items that a had inserted: they cancel
                            let k = (remove.len() - ri).min(a_insert.len() - prod.off);
                            prod.off += k;
                            ri += k;
                        }
                    }
                }
                out.insert(insert);
            }
        }
    }

    if prod.drain(&mut out) {
        bail!("history composition under-consumed: leftover content");
    }

    Ok(out.finish())
}

/// Fold the complete history into one logical transaction over the
/// originally-loaded document. An empty history composes to no operations.
pub fn squash(history: &[Transaction]) -> Result<Vec<Operation>> {
    let mut iter = history.iter();
    let Some(first) = iter.next() else {
        return Ok(Vec::new());
    };
    let mut acc = first.ops.clone();
    for tx in iter {
        acc = compose(&acc, &tx.ops)?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::text_items;

    fn retain(n: usize) -> Operation {
        Operation::Retain(n)
    }

    fn replace(remove: &str, insert: &str) -> Operation {
        Operation::Replace {
            remove: text_items(remove),
            insert: text_items(insert),
        }
    }

    #[test]
    fn test_compose_sequential_inserts() {
        // "" -> "abc" -> "abXc"
        let a = vec![replace("", "abc")];
        let b = vec![retain(2), replace("", "X"), retain(1)];
        let out = compose(&a, &b).unwrap();
        assert_eq!(out, vec![replace("", "abXc")]);
    }

    #[test]
    fn test_compose_insert_then_delete_cancels() {
        // "xy" -> "xABy" -> "xy"
        let a = vec![retain(1), replace("", "AB"), retain(1)];
        let b = vec![retain(1), replace("AB", ""), retain(1)];
        let out = compose(&a, &b).unwrap();
        assert_eq!(out, vec![retain(2)]);
    }

    #[test]
    fn test_compose_delete_of_original_content() {
        // "abcd" -> "abcd" (a is identity) -> "ad"
        let a = vec![retain(4)];
        let b = vec![retain(1), replace("bc", ""), retain(1)];
        let out = compose(&a, &b).unwrap();
        assert_eq!(out, vec![retain(1), replace("bc", ""), retain(1)]);
    }

    #[test]
    fn test_compose_straddling_removal() {
        // "abcd" -> "abXYcd" -> "aZd" (removes bXYc, inserts Z)
        let a = vec![retain(2), replace("", "XY"), retain(2)];
        let b = vec![retain(1), replace("bXYc", "Z"), retain(1)];
        let out = compose(&a, &b).unwrap();
        assert_eq!(out, vec![retain(1), replace("bc", "Z"), retain(1)]);
    }

    #[test]
    fn test_compose_preserves_pure_deletion_in_a() {
        // "abc" -> "ac" -> "aXc"
        let a = vec![retain(1), replace("b", ""), retain(1)];
        let b = vec![retain(1), replace("", "X"), retain(1)];
        let out = compose(&a, &b).unwrap();
        assert_eq!(out, vec![retain(1), replace("b", "X"), retain(1)]);
    }

    #[test]
    fn test_compose_length_mismatch_is_error() {
        let a = vec![replace("", "abc")];
        let b = vec![retain(2)];
        assert!(compose(&a, &b).is_err());

        let b = vec![retain(5)];
        assert!(compose(&a, &b).is_err());
    }

    #[test]
    fn test_squash_three_step_history() {
        // "" -> "hello" -> "hello world" -> "hell world"
        let history = vec![
            Transaction::new(vec![replace("", "hello")]),
            Transaction::new(vec![retain(5), replace("", " world")]),
            Transaction::new(vec![retain(4), replace("o", ""), retain(6)]),
        ];
        let out = squash(&history).unwrap();
        assert_eq!(out, vec![replace("", "hell world")]);
    }

    #[test]
    fn test_squash_empty_history() {
        assert_eq!(squash(&[]).unwrap(), Vec::new());
    }

    #[test]
    fn test_invert_roundtrip_shape() {
        let tx = Transaction::new(vec![retain(2), replace("ab", "xyz"), retain(1)]);
        let inv = tx.invert();
        assert_eq!(inv.len_before(), tx.len_after());
        assert_eq!(inv.len_after(), tx.len_before());
        assert_eq!(inv.invert(), tx);
    }
}
