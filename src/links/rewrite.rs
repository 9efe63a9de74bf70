//! Phase two of link conversion: position-sorted range replacement.

use std::ops::Range;

use crate::lists::parse_item;

/// New text for a byte range of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub range: Range<usize>,
    pub text: String,
}

/// Build a new line from `line` with every replacement applied.
///
/// Replacements are sorted by start; any that overlap an earlier one are
/// ignored, so the source line is never edited in place.
#[must_use]
pub fn apply_replacements(line: &str, mut replacements: Vec<Replacement>) -> String {
    replacements.sort_by_key(|r| r.range.start);
    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    for rep in replacements {
        if rep.range.start < cursor || rep.range.end > line.len() {
            continue;
        }
        out.push_str(&line[cursor..rep.range.start]);
        out.push_str(&rep.text);
        cursor = rep.range.end;
    }
    out.push_str(&line[cursor..]);
    out
}

/// Keep a rewritten list item's marker, indentation and spacing intact.
///
/// If `rewritten` no longer starts with the marker of `original`, the
/// original prefix is put back in front of the rewritten content.
#[must_use]
pub fn guard_list_item(original: &str, rewritten: String) -> String {
    let Some(orig) = parse_item(original) else {
        return rewritten;
    };
    let content = match parse_item(&rewritten) {
        Some(new) if new.indent == orig.indent && new.marker == orig.marker => return rewritten,
        Some(new) => new.content.to_string(),
        None => rewritten.trim_start().to_string(),
    };
    let spacing = if orig.spacing.is_empty() { " " } else { orig.spacing };
    format!("{}{}{spacing}{content}", orig.indent, orig.marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rep(range: Range<usize>, text: &str) -> Replacement {
        Replacement {
            range,
            text: text.to_string(),
        }
    }

    #[test]
    fn replaces_ranges_in_order() {
        let line = "a [x](u) b [y](v)";
        let out = apply_replacements(line, vec![rep(11..17, "[y][2]"), rep(2..8, "[x][1]")]);
        assert_eq!(out, "a [x][1] b [y][2]");
    }

    #[test]
    fn overlapping_replacement_is_ignored() {
        let out = apply_replacements("abcdef", vec![rep(0..3, "X"), rep(2..4, "Y")]);
        assert_eq!(out, "Xdef");
    }

    #[test]
    fn restores_lost_marker() {
        assert_eq!(guard_list_item("  - [a](u)", "  [a][1]".into()), "  - [a][1]");
        assert_eq!(guard_list_item("1. [a](u)", "* [a][1]".into()), "1. [a][1]");
        assert_eq!(guard_list_item("- [a](u)", "- [a][1]".into()), "- [a][1]");
        assert_eq!(guard_list_item("plain", "changed".into()), "changed");
    }
}
