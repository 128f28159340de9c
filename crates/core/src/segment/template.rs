// Balanced `{{ ... }}` scanning for whole-template protection.
//
// One left-to-right pass over the text with an explicit stack of openers.
// Template parameters (`{{{1}}}`) close with three braces and templates with
// two. An opener that never closes stays on the stack and is ignored, so
// unbalanced input costs one pass, not one pass per opener.

use std::ops::Range;

/// Outermost balanced templates in `text`, in document order.
///
/// Templates nested inside another balanced template are not reported. A
/// template nested inside an opener that never closes is.
pub fn balanced_ranges(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut closed: Vec<Range<usize>> = Vec::new();
    let mut index = 0;

    while index < bytes.len() {
        let rest = &bytes[index..];
        if rest.starts_with(b"{{{") {
            stack.push((index, 3));
            index += 3;
        } else if rest.starts_with(b"{{") {
            stack.push((index, 2));
            index += 2;
        } else if rest.starts_with(b"}}") {
            match stack.pop() {
                Some((start, width)) => {
                    let width = if width == 3 && rest.starts_with(b"}}}") { 3 } else { 2 };
                    index += width;
                    closed.push(start..index);
                }
                None => index += 2,
            }
        } else {
            index += 1;
        }
    }

    // Inner templates close before their parents; keep only the outermost.
    closed.sort_by_key(|range| range.start);
    let mut outermost: Vec<Range<usize>> = Vec::with_capacity(closed.len());
    for range in closed {
        if outermost.last().map_or(true, |last| range.start >= last.end) {
            outermost.push(range);
        }
    }
    outermost
}

/// First of `ranges` (sorted, disjoint) starting in `from..=limit`.
pub fn first_in(ranges: &[Range<usize>], from: usize, limit: usize) -> Option<Range<usize>> {
    let index = ranges.partition_point(|range| range.start < from);
    ranges.get(index).filter(|range| range.start <= limit).cloned()
}
