//! Line classification shared by the pipeline, link conversion and wrapping.
//!
//! The structural pass never matches raw heading or rule patterns itself; it
//! asks [`classify_line`] and acts on the returned [`LineClass`].

use std::sync::LazyLock;

use regex::Regex;

use crate::lists::{parse_item, ListKind};

// Up to three spaces of indentation, one to six hashes, then space or end.
static HEADING_RE: LazyLock<Regex> =
    lazy_regex!(r"^[ ]{0,3}#{1,6}(?:\s|$)", "valid heading regex");

pub(crate) static THEMATIC_BREAK_RE: LazyLock<Regex> = lazy_regex!(
    r"^[ ]{0,3}((?:[ \t]*\*){3,}|(?:[ \t]*-){3,}|(?:[ \t]*_){3,})[ \t]*$",
    "valid thematic break regex",
);

static SETEXT_DASHES_RE: LazyLock<Regex> =
    lazy_regex!(r"^[ ]{0,3}(?:-+|=+)[ \t]*$", "valid setext underline regex");

/// Empty comment used to split two adjacent lists of different kinds.
pub const LIST_SEPARATOR: &str = "<!-- -->";

/// Block-level facts about a single line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "the classifier contract is a set of independent flags"
)]
pub struct LineClass {
    pub heading: bool,
    pub rule: bool,
    pub fence: bool,
    pub blockquote: bool,
    pub blank: bool,
}

impl LineClass {
    /// True when the line is a list item and nothing with higher precedence.
    #[must_use]
    pub fn is_list_item(self, line: &str) -> bool {
        !(self.heading || self.rule || self.fence || self.blockquote || self.blank)
            && parse_item(line).is_some()
    }
}

/// What the structural pass decided a line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Paragraph,
    ListItem { level: usize, kind: ListKind },
    /// Indented text under a list item.
    ListContinuation,
    Blockquote,
    Heading,
    Rule,
    /// Opening or closing fence, or a `$$` delimiter.
    Fence,
    Code,
    Math,
    Table,
    FrontMatter,
    Blank,
    /// The empty comment between two interrupted lists.
    Separator,
    /// A `[id]: url` reference definition.
    Definition,
    Html,
}

impl LineRole {
    /// Lines the wrap transformer may split.
    #[must_use]
    pub fn wrap_eligible(self) -> bool {
        matches!(
            self,
            Self::Paragraph | Self::ListItem { .. } | Self::ListContinuation | Self::Blockquote
        )
    }

    /// Lines scanned for links.
    #[must_use]
    pub fn carries_links(self) -> bool {
        self.wrap_eligible() || matches!(self, Self::Heading | Self::Table)
    }
}

/// A line of output together with its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedLine {
    pub text: String,
    pub role: LineRole,
    /// Index of the input line this came from; `None` for inserted lines.
    pub origin: Option<usize>,
}

impl EmittedLine {
    #[must_use]
    pub fn new(text: impl Into<String>, role: LineRole, origin: Option<usize>) -> Self {
        Self {
            text: text.into(),
            role,
            origin,
        }
    }

    /// An inserted blank line.
    #[must_use]
    pub fn blank() -> Self { Self::new(String::new(), LineRole::Blank, None) }

    #[must_use]
    pub fn is_blank(&self) -> bool { self.role == LineRole::Blank }

    #[must_use]
    pub fn wrap_eligible(&self) -> bool { self.role.wrap_eligible() }
}

/// Classify a line.
///
/// Thematic breaks win over list items, so `* * *` is a rule.
///
/// # Examples
///
/// ```
/// use mdfixup::classify::classify_line;
///
/// assert!(classify_line("## Title").heading);
/// assert!(classify_line("* * *").rule);
/// assert!(classify_line("~~~").fence);
/// assert!(classify_line("   ").blank);
/// ```
#[must_use]
pub fn classify_line(line: &str) -> LineClass {
    let blank = line.trim().is_empty();
    if blank {
        return LineClass {
            blank,
            ..LineClass::default()
        };
    }
    LineClass {
        heading: HEADING_RE.is_match(line),
        rule: THEMATIC_BREAK_RE.is_match(line),
        fence: crate::fences::is_fence(line).is_some(),
        blockquote: line.trim_start().starts_with('>'),
        blank,
    }
}

/// True for `---` or `===` runs that underline a preceding paragraph line.
#[must_use]
pub fn is_setext_underline(line: &str) -> bool { SETEXT_DASHES_RE.is_match(line) }

/// `[id]: url`, but not a `[^note]:` footnote definition.
#[must_use]
pub fn is_reference_definition(line: &str) -> bool {
    crate::links::parse_definition(line).is_some()
}

#[must_use]
pub fn is_front_matter_delimiter(line: &str) -> bool { line.trim_end() == "---" }

/// Front matter opens and closes with `---`; `...` may also close it.
///
/// Returns the number of lines including both delimiters.
#[must_use]
pub fn front_matter_len(lines: &[String]) -> Option<usize> {
    if !lines.first().is_some_and(|l| is_front_matter_delimiter(l)) {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, l)| matches!(l.trim(), "---" | "..."))
        .map(|(idx, _)| idx + 1)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("# Title", true)]
    #[case("###### Six", true)]
    #[case("#", true)]
    #[case("####### Seven", false)]
    #[case("#hashtag", false)]
    #[case("    # indented code", false)]
    fn detects_headings(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(classify_line(line).heading, expected);
    }

    #[rstest]
    #[case("---")]
    #[case("* * *")]
    #[case("___")]
    #[case("  - - -  ")]
    fn detects_rules(#[case] line: &str) {
        let class = classify_line(line);
        assert!(class.rule);
        assert!(!class.is_list_item(line));
    }

    #[test]
    fn list_items_exclude_quotes_and_headings() {
        assert!(classify_line("- item").is_list_item("- item"));
        assert!(classify_line("12. item").is_list_item("12. item"));
        assert!(!classify_line("> - quoted").is_list_item("> - quoted"));
        assert!(!classify_line("plain text").is_list_item("plain text"));
    }

    #[test]
    fn finds_front_matter() {
        let lines: Vec<String> = ["---", "title: x", "...", "body"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(front_matter_len(&lines), Some(3));
        let unterminated: Vec<String> =
            ["---", "title: x"].into_iter().map(str::to_string).collect();
        assert_eq!(front_matter_len(&unterminated), None);
    }

    #[test]
    fn reference_definitions() {
        assert!(is_reference_definition("[id]: http://example.com"));
        assert!(is_reference_definition("  [Some Id] :  http://example.com \"T\""));
        assert!(!is_reference_definition("[^1]: a footnote"));
        assert!(!is_reference_definition("[text](http://example.com)"));
    }

    #[test]
    fn setext_underlines() {
        assert!(is_setext_underline("---"));
        assert!(is_setext_underline("===="));
        assert!(!is_setext_underline("- - -"));
    }
}
