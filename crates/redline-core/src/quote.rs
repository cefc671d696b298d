//! Quotation detection: is a given offset inside quoted text?
//!
//! Block-level quotations are structural (any enclosing blockquote). Inline
//! quotations are inferred by scanning the enclosing leaf block and keeping a
//! parity count per quote-mark group; open and close glyphs differ within a
//! group but must pair, so every glyph of a group bumps the same counter. An
//! odd count means the scan position is inside that group's quotation.

use crate::document::{Document, Item};
use crate::range::Range;

/// Quote glyphs that pair with each other. The straight single quote is
/// special-cased below because it doubles as the apostrophe.
const QUOTE_GROUPS: &[&[char]] = &[
    &['"'],
    &['\''],
    &['\u{201C}', '\u{201D}'], // curly double
    &['\u{2018}', '\u{2019}'], // curly single
    &['\u{201E}', '\u{201F}'], // low-9 double
    &['\u{300C}', '\u{300D}'], // CJK corner brackets
    &['\u{300E}', '\u{300F}'], // CJK white corner brackets
    &['\u{00AB}', '\u{00BB}'], // guillemets
    &['\u{2039}', '\u{203A}'], // single guillemets
];

const STRAIGHT_SINGLE: usize = 1;

fn group_of(c: char) -> Option<usize> {
    QUOTE_GROUPS.iter().position(|group| group.contains(&c))
}

fn char_at(doc: &Document, block: Range, offset: usize) -> Option<char> {
    if !block.contains_offset(offset) {
        return None;
    }
    match &doc.items()[offset] {
        Item::Char(c) => Some(*c),
        _ => None,
    }
}

/// Whether `offset` is inside quoted content.
pub fn is_offset_quoted(offset: usize, doc: &Document) -> bool {
    if doc.is_inside_blockquote(offset) {
        return true;
    }
    let Some(block) = doc.enclosing_block(offset) else {
        return false;
    };

    let mut counts = [0usize; QUOTE_GROUPS.len()];
    let last = offset.min(block.end - 1);
    for i in block.start..=last {
        let Item::Char(c) = &doc.items()[i] else {
            continue;
        };
        let Some(group) = group_of(*c) else {
            continue;
        };
        if group == STRAIGHT_SINGLE {
            let prev = if i > block.start {
                char_at(doc, block, i - 1)
            } else {
                None
            };
            let next = char_at(doc, block, i + 1);
            // Word-internal apostrophe: don't, it's
            if prev.is_some_and(|p| p.is_alphanumeric()) && next.is_some_and(|n| n.is_alphanumeric())
            {
                continue;
            }
            // Trailing possessive (James') is only plausible when no
            // single quote is currently open
            if prev.is_some_and(|p| p == 's' || p == 'S') && counts[group] % 2 == 0 {
                continue;
            }
        }
        counts[group] += 1;
    }
    counts.iter().any(|count| count % 2 == 1)
}
