//! Text wrapping for wrap-eligible lines.
//!
//! Only lines the structural pass marks as paragraph, list item, list
//! continuation or blockquote are touched, and only when they are wider than
//! the target width. Widths are display columns from `unicode-width`.

use std::{ops::Range, sync::LazyLock};

use regex::Regex;
use unicode_width::UnicodeWidthStr;

use crate::{
    classify::{EmittedLine, LineRole},
    links::code_span_ranges,
    lists::parse_item,
};

static BLOCKQUOTE_PREFIX_RE: LazyLock<Regex> =
    lazy_regex!(r"^([ \t]*(?:>[ \t]?)+)(.*)$", "valid blockquote prefix regex");

// Whole links, so `[two words](url)` never splits.
static LINK_RE: LazyLock<Regex> = lazy_regex!(
    r"!?\[[^\]]+\](?:\((?:[^()]|\([^()]*\))+\)|\[[^\]]+\])?",
    "valid atomic link regex",
);

static BLOCK_START_RE: LazyLock<Regex> = lazy_regex!(
    concat!(
        r"^(?:[-+*]|[-+]\p{Alphabetic}.*|[0-9]+\.(?:\p{Alphabetic}.*)?",
        r"|#.*|>.*|\|.*|<.*|[-*_=]+|`{3,}.*|~{3,}.*|\$\$.*|\[[^\]]+\]:.*)$",
    ),
    "valid block start regex",
);

/// True when `word` would open a block if it began a line.
fn starts_block(word: &str) -> bool { BLOCK_START_RE.is_match(word) }

/// Split `text` into words, keeping code spans and links whole and gluing
/// block-starting words to the word before them.
fn tokenize(text: &str) -> Vec<String> {
    let spans = code_span_ranges(text);
    let links = LINK_RE
        .find_iter(text)
        .map(|m| m.range())
        .filter(|r| !spans.iter().any(|s| s.start < r.end && r.start < s.end));
    let protected: Vec<Range<usize>> = links.chain(spans.iter().cloned()).collect();
    let inside = |pos: usize| protected.iter().any(|r| r.start < pos && pos < r.end);

    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for (pos, ch) in text.char_indices() {
        if ch.is_whitespace() && !inside(pos) {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut tokens: Vec<String> = Vec::with_capacity(words.len());
    for word in words {
        match tokens.last_mut() {
            Some(prev) if starts_block(&word) => {
                prev.push(' ');
                prev.push_str(&word);
            }
            _ => tokens.push(word),
        }
    }
    tokens
}

/// Greedily fill lines of at most `width` columns. A token wider than
/// `width` gets a line of its own.
fn fill(tokens: &[String], width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for token in tokens {
        let token_width = UnicodeWidthStr::width(token.as_str());
        if current.is_empty() {
            current.push_str(token);
            current_width = token_width;
        } else if current_width + 1 + token_width <= width {
            current.push(' ');
            current.push_str(token);
            current_width += 1 + token_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(token);
            current_width = token_width;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Split a line into its first-line prefix, continuation prefix and text.
fn split_prefix(line: &str, role: LineRole) -> (String, String, &str) {
    match role {
        LineRole::ListItem { .. } => {
            if let Some(item) = parse_item(line) {
                let prefix = &line[..line.len() - item.content.len()];
                let prefix = if item.spacing.is_empty() {
                    format!("{prefix} ")
                } else {
                    prefix.to_string()
                };
                let hang = " ".repeat(
                    UnicodeWidthStr::width(prefix.as_str()) - UnicodeWidthStr::width(item.indent),
                );
                return (prefix, format!("{}{hang}", item.indent), item.content);
            }
        }
        LineRole::Blockquote => {
            if let Some(cap) = BLOCKQUOTE_PREFIX_RE.captures(line) {
                let prefix = cap.get(1).map_or("", |m| m.as_str());
                let rest = cap.get(2).map_or("", |m| m.as_str());
                let prefix = if prefix.ends_with([' ', '\t']) {
                    prefix.to_string()
                } else {
                    format!("{prefix} ")
                };
                return (prefix.clone(), prefix, rest);
            }
        }
        _ => {}
    }
    let indent_len = line.len() - line.trim_start().len();
    let indent = line[..indent_len].to_string();
    (indent.clone(), indent, &line[indent_len..])
}

/// Wrap one line according to its role.
///
/// Returns the line unchanged when it fits, is not wrap-eligible, or
/// contains a pipe.
///
/// ```
/// use mdfixup::{classify::LineRole, lists::ListKind, wrap::wrap_line};
///
/// let role = LineRole::ListItem { level: 0, kind: ListKind::Unordered };
/// assert_eq!(
///     wrap_line("* alpha beta gamma", role, 12),
///     vec!["* alpha beta", "  gamma"]
/// );
/// ```
#[must_use]
pub fn wrap_line(line: &str, role: LineRole, width: usize) -> Vec<String> {
    if !role.wrap_eligible() || line.contains('|') || UnicodeWidthStr::width(line) <= width {
        return vec![line.to_string()];
    }
    let hard_break = line.ends_with("  ") && !line.trim().is_empty();
    let (first, rest, text) = split_prefix(line, role);
    let prefix_width =
        UnicodeWidthStr::width(first.as_str()).max(UnicodeWidthStr::width(rest.as_str()));
    let available = width.saturating_sub(prefix_width).max(1);
    let tokens = tokenize(text);
    let mut out: Vec<String> = fill(&tokens, available)
        .into_iter()
        .enumerate()
        .map(|(idx, body)| {
            let prefix = if idx == 0 { &first } else { &rest };
            format!("{prefix}{body}")
        })
        .collect();
    if out.is_empty() {
        return vec![line.to_string()];
    }
    if hard_break && let Some(last) = out.last_mut() {
        last.push_str("  ");
    }
    out
}

/// Wrap every eligible line, keeping roles and origins.
///
/// Continuation lines of a list item become list continuations.
#[must_use]
pub fn wrap_lines(lines: Vec<EmittedLine>, width: usize) -> Vec<EmittedLine> {
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let wrapped = wrap_line(&line.text, line.role, width);
        if wrapped.len() == 1 {
            out.push(line);
            continue;
        }
        let continuation = match line.role {
            LineRole::ListItem { .. } => LineRole::ListContinuation,
            other => other,
        };
        for (idx, text) in wrapped.into_iter().enumerate() {
            let role = if idx == 0 { line.role } else { continuation };
            out.push(EmittedLine::new(text, role, line.origin));
        }
    }
    out
}
