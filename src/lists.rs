//! List item parsing, renumbering and bullet normalisation.
//!
//! The nesting state is a [`ListStack`] owned by the caller. [`normalize_item`]
//! takes the stack by value and hands back the updated one with the rewritten
//! line, so every step is visible to the pipeline and to tests.

use std::sync::LazyLock;

use regex::Regex;

use crate::classify::THEMATIC_BREAK_RE;

static ITEM_RE: LazyLock<Regex> = lazy_regex!(
    r"^([ \t]*)([-*+]|[0-9]{1,9}\.)([ \t]*)(.*)$",
    "valid list item regex",
);

/// Ordered (`1.`) or unordered (`-`, `*`, `+`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// Whether ordered lists restart at 1 or keep their first number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberingPolicy {
    #[default]
    Reset,
    Preserve,
}

impl NumberingPolicy {
    #[must_use]
    pub fn from_reset(reset: bool) -> Self { if reset { Self::Reset } else { Self::Preserve } }
}

/// A list item split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListItem<'a> {
    pub indent: &'a str,
    pub marker: &'a str,
    pub spacing: &'a str,
    pub content: &'a str,
    /// No whitespace between marker and content, as in `-item`.
    pub loose: bool,
}

impl ListItem<'_> {
    #[must_use]
    pub fn kind(&self) -> ListKind {
        if self.marker.ends_with('.') {
            ListKind::Ordered
        } else {
            ListKind::Unordered
        }
    }

    #[must_use]
    pub fn number(&self) -> Option<usize> { self.marker.strip_suffix('.')?.parse().ok() }

    /// Nesting depth: one level per tab plus one per `unit` spaces.
    #[must_use]
    pub fn level(&self, unit: usize) -> usize { indent_level(self.indent, unit) }

    /// Width of everything before the content.
    #[must_use]
    pub fn prefix_width(&self) -> usize {
        self.indent.chars().count() + self.marker.len() + self.spacing.chars().count().max(1)
    }
}

/// Split a list item into indent, marker, spacing and content.
///
/// A marker glued to its content is accepted only for `-`, `+` and numbers
/// followed by a letter; `*emphasis*` and `-1` are not list items.
///
/// ```
/// use mdfixup::lists::parse_item;
///
/// let item = parse_item("  3. three").unwrap();
/// assert_eq!((item.indent, item.marker, item.content), ("  ", "3.", "three"));
/// assert!(parse_item("-item").unwrap().loose);
/// assert!(parse_item("*emphasis*").is_none());
/// ```
#[must_use]
pub fn parse_item(line: &str) -> Option<ListItem<'_>> {
    let cap = ITEM_RE.captures(line)?;
    let indent = cap.get(1)?.as_str();
    let marker = cap.get(2)?.as_str();
    let spacing = cap.get(3)?.as_str();
    let content = cap.get(4)?.as_str();
    let loose = spacing.is_empty() && !content.is_empty();
    if loose {
        let glued_ok = marker != "*" && content.chars().next().is_some_and(char::is_alphabetic);
        if !glued_ok {
            return None;
        }
    }
    Some(ListItem {
        indent,
        marker,
        spacing,
        content,
        loose,
    })
}

fn indent_level(indent: &str, unit: usize) -> usize {
    let tabs = indent.chars().filter(|&c| c == '\t').count();
    let spaces = indent.chars().filter(|&c| c != '\t').count();
    tabs + spaces / unit.max(1)
}

/// Canonical bullet for a nesting depth.
#[must_use]
pub fn canonical_bullet(level: usize) -> char {
    match level {
        0 => '*',
        1 => '-',
        _ => '+',
    }
}

/// One open list level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListContext {
    pub level: usize,
    pub kind: ListKind,
    /// Last number emitted; `None` for unordered levels.
    pub counter: Option<usize>,
}

/// Open list levels, strictly increasing from bottom to top.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListStack(Vec<ListContext>);

impl ListStack {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn clear(&mut self) { self.0.clear(); }

    #[must_use]
    pub fn contexts(&self) -> &[ListContext] { &self.0 }

    /// Remove contexts deeper than `level`.
    fn prune_deeper(&mut self, level: usize) {
        while self.0.last().is_some_and(|ctx| ctx.level > level) {
            self.0.pop();
        }
    }

    /// True when a depth-0 item of `kind` starts a different list than the
    /// open depth-0 one.
    #[must_use]
    pub fn interrupted_by(&self, level: usize, kind: ListKind) -> bool {
        level == 0
            && self
                .0
                .first()
                .is_some_and(|ctx| ctx.level == 0 && ctx.kind != kind)
    }
}

/// Result of [`normalize_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedItem {
    pub line: String,
    pub stack: ListStack,
    /// The marker or spacing differs from the input.
    pub changed: bool,
    /// The rewrite no longer parsed as a list item and was discarded.
    pub ambiguous: bool,
}

/// Renumber or re-bullet one list item against the open levels.
///
/// Returns `None` when `line` is not a list item.
///
/// ```
/// use mdfixup::lists::{normalize_item, ListStack, NumberingPolicy};
///
/// let first = normalize_item("1. a", ListStack::new(), 2, NumberingPolicy::Reset).unwrap();
/// let second = normalize_item("5. b", first.stack, 2, NumberingPolicy::Reset).unwrap();
/// assert_eq!(second.line, "2. b");
/// ```
#[must_use]
pub fn normalize_item(
    line: &str,
    mut stack: ListStack,
    indent_unit: usize,
    policy: NumberingPolicy,
) -> Option<NormalizedItem> {
    let item = parse_item(line)?;
    let level = item.level(indent_unit);
    stack.prune_deeper(level);

    let marker = if let Some(ctx) = stack.0.last_mut().filter(|ctx| ctx.level == level) {
        match ctx.kind {
            ListKind::Ordered => {
                let next = ctx.counter.unwrap_or(0) + 1;
                ctx.counter = Some(next);
                format!("{next}.")
            }
            ListKind::Unordered => canonical_bullet(level).to_string(),
        }
    } else {
        let kind = item.kind();
        let counter = match (kind, policy) {
            (ListKind::Unordered, _) => None,
            (ListKind::Ordered, NumberingPolicy::Reset) => Some(1),
            (ListKind::Ordered, NumberingPolicy::Preserve) => Some(item.number().unwrap_or(1)),
        };
        stack.0.push(ListContext {
            level,
            kind,
            counter,
        });
        counter.map_or_else(|| canonical_bullet(level).to_string(), |n| format!("{n}."))
    };

    let spacing = if item.loose { " " } else { item.spacing };
    let rebuilt = if item.content.is_empty() {
        format!("{}{marker}", item.indent)
    } else {
        format!("{}{marker}{spacing}{}", item.indent, item.content)
    };
    let reparses = parse_item(&rebuilt).is_some() && !THEMATIC_BREAK_RE.is_match(&rebuilt);
    if !reparses {
        return Some(NormalizedItem {
            line: line.to_string(),
            stack,
            changed: false,
            ambiguous: true,
        });
    }
    Some(NormalizedItem {
        changed: rebuilt != line,
        line: rebuilt,
        stack,
        ambiguous: false,
    })
}

/// Detect the indent unit of the list block starting at `start`.
///
/// The first item indented by two or more spaces decides: four or more means
/// 4, otherwise 2. Blank lines and indented continuation lines are skipped;
/// any other line ends the block. Defaults to 2.
#[must_use]
pub fn detect_indent_unit(lines: &[String], start: usize) -> usize {
    for line in lines.iter().skip(start + 1) {
        let Some(item) = parse_item(line) else {
            if line.trim().is_empty() || line.starts_with([' ', '\t']) {
                continue;
            }
            break;
        };
        let spaces = item.indent.chars().filter(|&c| c != '\t').count();
        if spaces >= 2 {
            return if spaces >= 4 { 4 } else { 2 };
        }
    }
    2
}

/// Replace a list item's space indentation with one tab per level.
///
/// Lines already indented with tabs, and non-items, are returned unchanged.
#[must_use]
pub fn indent_with_tabs(line: &str, indent_unit: usize) -> String {
    match parse_item(line) {
        Some(item) if !item.indent.contains('\t') && !item.indent.is_empty() => {
            let tabs = "\t".repeat(item.level(indent_unit));
            format!("{tabs}{}", &line[item.indent.len()..])
        }
        _ => line.to_string(),
    }
}

/// Collapse the whitespace after a list marker to a single space.
#[must_use]
pub fn single_space_after_marker(line: &str) -> Option<String> {
    let item = parse_item(line)?;
    if item.loose || item.content.is_empty() || item.spacing == " " {
        return None;
    }
    Some(format!("{}{} {}", item.indent, item.marker, item.content))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn run(lines: &[&str], unit: usize, policy: NumberingPolicy) -> Vec<String> {
        let mut stack = ListStack::new();
        lines
            .iter()
            .map(|line| {
                let out = normalize_item(line, stack.clone(), unit, policy).unwrap();
                stack = out.stack;
                out.line
            })
            .collect()
    }

    #[rstest]
    #[case("- a", Some(("", "-", " ", "a")))]
    #[case("\t12.\tx", Some(("\t", "12.", "\t", "x")))]
    #[case("+", Some(("", "+", "", "")))]
    #[case("1.Item", Some(("", "1.", "", "Item")))]
    #[case("-1 degrees", None)]
    #[case("**bold**", None)]
    #[case("1.5 litres", None)]
    #[case("text", None)]
    fn parses_items(#[case] line: &str, #[case] expected: Option<(&str, &str, &str, &str)>) {
        let parsed = parse_item(line).map(|i| (i.indent, i.marker, i.spacing, i.content));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn renumbers_gaps() {
        let out = run(&["1. A", "3. B", "5. C"], 2, NumberingPolicy::Reset);
        assert_eq!(out, vec!["1. A", "2. B", "3. C"]);
    }

    #[test]
    fn preserve_policy_keeps_first_number() {
        let out = run(&["7. a", "9. b"], 2, NumberingPolicy::Preserve);
        assert_eq!(out, vec!["7. a", "8. b"]);
        let out = run(&["7. a", "9. b"], 2, NumberingPolicy::Reset);
        assert_eq!(out, vec!["1. a", "2. b"]);
    }

    #[test]
    fn bullets_follow_depth() {
        let out = run(&["+ a", "  * b", "    - c", "      * d", "- e"], 2, NumberingPolicy::Reset);
        assert_eq!(out, vec!["* a", "  - b", "    + c", "      + d", "* e"]);
    }

    #[test]
    fn nested_numbering_restarts_under_new_parent() {
        let out = run(
            &["1. a", "    4. x", "    9. y", "2. b", "    3. z"],
            4,
            NumberingPolicy::Reset,
        );
        assert_eq!(out, vec!["1. a", "    1. x", "    2. y", "2. b", "    1. z"]);
    }

    #[test]
    fn nested_kind_switch_continues_level() {
        let out = run(&["1. a", "  - x", "  3. y"], 2, NumberingPolicy::Reset);
        assert_eq!(out, vec!["1. a", "  - x", "  - y"]);
    }

    #[test]
    fn loose_marker_gets_one_space() {
        let out = normalize_item("-item", ListStack::new(), 2, NumberingPolicy::Reset).unwrap();
        assert_eq!(out.line, "* item");
        assert!(out.changed);
    }

    #[test]
    fn rewrite_that_becomes_a_rule_is_kept_verbatim() {
        let out = normalize_item("- ***", ListStack::new(), 2, NumberingPolicy::Reset).unwrap();
        assert_eq!(out.line, "- ***");
        assert!(out.ambiguous);
        assert_eq!(out.stack.contexts().len(), 1);
    }

    #[test]
    fn empty_item_emits_marker_alone() {
        let out = normalize_item("-", ListStack::new(), 2, NumberingPolicy::Reset).unwrap();
        assert_eq!(out.line, "*");
    }

    #[test]
    fn detects_interruption_only_at_depth_zero() {
        let first = normalize_item("1. a", ListStack::new(), 2, NumberingPolicy::Reset).unwrap();
        assert!(first.stack.interrupted_by(0, ListKind::Unordered));
        assert!(!first.stack.interrupted_by(0, ListKind::Ordered));
        assert!(!first.stack.interrupted_by(1, ListKind::Unordered));
    }

    #[rstest]
    #[case(&["- a", "  - b"], 2)]
    #[case(&["- a", "", "    - b"], 4)]
    #[case(&["- a", "- b"], 2)]
    #[case(&["- a", "para", "    - b"], 2)]
    #[case(&["- a", "  continued", "    - b"], 4)]
    fn detects_indent_unit(#[case] lines: &[&str], #[case] expected: usize) {
        let lines: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();
        assert_eq!(detect_indent_unit(&lines, 0), expected);
    }

    #[test]
    fn converts_indent_to_tabs() {
        assert_eq!(indent_with_tabs("    - b", 2), "\t\t- b");
        assert_eq!(indent_with_tabs("- a", 2), "- a");
        assert_eq!(indent_with_tabs("\t- c", 2), "\t- c");
    }

    #[test]
    fn collapses_marker_spacing() {
        assert_eq!(single_space_after_marker("-   a").as_deref(), Some("- a"));
        assert_eq!(single_space_after_marker("- a"), None);
    }
}
