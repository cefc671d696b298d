//! Section scoping: which headings a range sits under, and whether that
//! section is eligible for a given check configuration.

use crate::config::{CheckConfig, SectionFilter};
use crate::document::{Document, Heading};
use crate::range::Range;

/// Case- and whitespace-tolerant section name comparison key.
pub(crate) fn section_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Climb the heading hierarchy above `range`: the nearest preceding heading,
/// then the nearest preceding heading at a strictly smaller level, and so on,
/// stopping after a top-level heading. Nearest first.
fn heading_stack<'a>(headings: &'a [Heading], range: Range) -> Vec<&'a Heading> {
    let preceding: Vec<&Heading> = headings
        .iter()
        .filter(|h| h.range.start < range.start)
        .collect();
    let mut stack = Vec::new();
    let mut current = preceding.last().copied();
    while let Some(h) = current {
        stack.push(h);
        if h.level <= 1 {
            break;
        }
        current = preceding
            .iter()
            .rev()
            .find(|x| x.range.start < h.range.start && x.level < h.level)
            .copied();
    }
    stack
}

/// Whether `range` lies in a section the configuration accepts.
///
/// The first heading (bottom-up) found in either the ignore or include list
/// decides. A range before every heading is the lead section, but only in a
/// document that has headings at all; a headingless stub is never a lead
/// section.
pub fn is_range_in_valid_section(range: Range, doc: &Document, config: &CheckConfig) -> bool {
    let headings = doc.headings();
    let stack = heading_stack(&headings, range);

    if stack.is_empty() {
        if !headings.is_empty() && config.ignore_lead_section {
            return false;
        }
        // Nothing to match an include list against
        return matches!(config.include_sections, SectionFilter::All);
    }

    for heading in &stack {
        let key = section_key(&heading.text);
        if config
            .ignore_sections
            .iter()
            .any(|s| section_key(s) == key)
        {
            return false;
        }
        if let SectionFilter::Listed(include) = &config.include_sections {
            if include.iter().any(|s| section_key(s) == key) {
                return true;
            }
        }
    }

    matches!(config.include_sections, SectionFilter::All)
}
