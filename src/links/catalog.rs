//! Phase one of link conversion: an immutable catalog of definitions and
//! link occurrences.

use std::{collections::HashMap, ops::Range, sync::LazyLock};

use regex::Regex;

use crate::classify::{EmittedLine, LineRole};

static DEFINITION_RE: LazyLock<Regex> = lazy_regex!(
    r"^[ \t]*\[([^\]]+)\][ \t]*:[ \t]*(\S.*?)[ \t]*$",
    "valid reference definition regex",
);

static URL_TITLE_RE: LazyLock<Regex> =
    lazy_regex!(r#"^([^\s"]+)(?:\s+"([^"]+)")?$"#, "valid url and title regex");

// The destination may hold one level of balanced parentheses.
static INLINE_RE: LazyLock<Regex> = lazy_regex!(
    r"\[([^\]]+)\]\(((?:[^()]|\([^()]*\))+)\)",
    "valid inline link regex",
);

static REFERENCE_RE: LazyLock<Regex> =
    lazy_regex!(r"\[([^\]]+)\]\[([^\]]+)\]", "valid reference link regex");

static IMPLICIT_RE: LazyLock<Regex> = lazy_regex!(r"\[([^\]]+)\]", "valid implicit link regex");

/// A `[id]: url "title"` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
}

impl Definition {
    #[must_use]
    pub fn key(&self) -> String { normalize_id(&self.id) }

    /// Numeric ids sort after textual ones in the definition block.
    #[must_use]
    pub fn numeric_id(&self) -> Option<usize> { self.id.parse().ok() }

    #[must_use]
    pub fn render(&self) -> String {
        match &self.title {
            Some(title) => format!("[{}]: {} \"{title}\"", self.id, self.url),
            None => format!("[{}]: {}", self.id, self.url),
        }
    }
}

/// Ids match case-insensitively, ignoring surrounding whitespace.
#[must_use]
pub fn normalize_id(id: &str) -> String { id.trim().to_lowercase() }

fn split_destination(destination: &str) -> Option<(String, Option<String>)> {
    let cap = URL_TITLE_RE.captures(destination.trim())?;
    let url = cap.get(1)?.as_str().to_string();
    let title = cap.get(2).map(|m| m.as_str().to_string());
    Some((url, title))
}

/// Parse a reference definition. Footnote definitions (`[^id]:`) are not
/// reference definitions.
///
/// ```
/// use mdfixup::links::parse_definition;
///
/// let def = parse_definition(r#"[Docs]: https://example.com "Manual""#).unwrap();
/// assert_eq!(def.id, "Docs");
/// assert_eq!(def.title.as_deref(), Some("Manual"));
/// assert!(parse_definition("[^1]: footnote").is_none());
/// ```
#[must_use]
pub fn parse_definition(line: &str) -> Option<Definition> {
    let cap = DEFINITION_RE.captures(line)?;
    let id = cap.get(1)?.as_str();
    if id.starts_with('^') {
        return None;
    }
    let (url, title) = split_destination(cap.get(2)?.as_str())?;
    Some(Definition {
        id: id.to_string(),
        url,
        title,
    })
}

/// Surface syntax a link was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkForm {
    /// `[text](url "title")`
    Inline,
    /// `[text][id]`
    Reference,
    /// `[text]`, where the text doubles as the id.
    Implicit,
}

/// One resolved link occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Index into the scanned lines.
    pub line: usize,
    /// Byte range of the whole link in that line.
    pub range: Range<usize>,
    pub text: String,
    pub url: String,
    pub title: Option<String>,
    pub form: LinkForm,
    /// Id as written, for reference and implicit links.
    pub reference_id: Option<String>,
}

/// `[text][id]` whose id has no definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub line: usize,
    pub id: String,
}

/// Byte ranges of the backtick code spans in `line`.
///
/// A span opens on a run of backticks and closes on the next run of the same
/// length. Backslash-escaped backticks outside spans open nothing; an
/// unclosed run is literal text.
#[must_use]
pub fn code_span_ranges(line: &str) -> Vec<Range<usize>> {
    let bytes = line.as_bytes();
    let run_at = |at: usize| bytes[at..].iter().take_while(|&&b| b == b'`').count();
    let mut ranges = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let start = i;
                let run = run_at(i);
                i += run;
                let mut j = i;
                while j < bytes.len() {
                    if bytes[j] == b'`' {
                        let closing = run_at(j);
                        if closing == run {
                            ranges.push(start..j + closing);
                            i = j + closing;
                            break;
                        }
                        j += closing;
                    } else {
                        j += 1;
                    }
                }
            }
            _ => i += 1,
        }
    }
    ranges
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool { a.start < b.end && b.start < a.end }

fn escaped(line: &str, start: usize) -> bool { line[..start].ends_with('\\') }

/// Everything phase two needs, built once per document.
#[derive(Debug, Clone, Default)]
pub struct LinkCatalog {
    definitions: Vec<Definition>,
    /// Normalised id to the first definition with that id.
    by_id: HashMap<String, usize>,
    /// Indices of the lines holding definitions.
    pub definition_lines: Vec<usize>,
    pub links: Vec<LinkRecord>,
    pub unresolved: Vec<Unresolved>,
}

impl LinkCatalog {
    /// Collect definitions, then scan every link-bearing line.
    #[must_use]
    pub fn build(lines: &[EmittedLine]) -> Self {
        let mut catalog = Self::default();
        for (idx, line) in lines.iter().enumerate() {
            if line.role != LineRole::Definition {
                continue;
            }
            let Some(def) = parse_definition(&line.text) else {
                continue;
            };
            catalog.definition_lines.push(idx);
            let duplicate = catalog.definitions.iter().any(|d| d == &def);
            if duplicate {
                continue;
            }
            catalog
                .by_id
                .entry(def.key())
                .or_insert(catalog.definitions.len());
            catalog.definitions.push(def);
        }
        for (idx, line) in lines.iter().enumerate() {
            if line.role.carries_links() {
                catalog.scan_line(idx, &line.text);
            }
        }
        catalog
    }

    /// Definitions in the order they appeared, exact duplicates removed.
    #[must_use]
    pub fn definitions(&self) -> &[Definition] { &self.definitions }

    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<&Definition> {
        self.by_id
            .get(&normalize_id(id))
            .map(|&idx| &self.definitions[idx])
    }

    /// True when `def` is the definition links with its id resolve to.
    #[must_use]
    pub fn is_primary(&self, def: &Definition) -> bool {
        self.resolve(&def.id).is_some_and(|primary| primary == def)
    }

    fn scan_line(&mut self, idx: usize, line: &str) {
        let spans = code_span_ranges(line);
        let mut claimed: Vec<Range<usize>> = Vec::new();
        let free = |range: &Range<usize>, claimed: &[Range<usize>]| {
            !escaped(line, range.start)
                && !spans.iter().any(|s| overlaps(s, range))
                && !claimed.iter().any(|c| overlaps(c, range))
        };
        let mut found = Vec::new();

        for cap in INLINE_RE.captures_iter(line) {
            let Some(whole) = cap.get(0) else { continue };
            let range = whole.range();
            if !free(&range, &claimed) {
                continue;
            }
            let Some((url, title)) = cap.get(2).and_then(|m| split_destination(m.as_str())) else {
                continue;
            };
            claimed.push(range.clone());
            found.push(LinkRecord {
                line: idx,
                range,
                text: cap[1].to_string(),
                url,
                title,
                form: LinkForm::Inline,
                reference_id: None,
            });
        }

        for cap in REFERENCE_RE.captures_iter(line) {
            let Some(whole) = cap.get(0) else { continue };
            let range = whole.range();
            if !free(&range, &claimed) {
                continue;
            }
            claimed.push(range.clone());
            let id = cap[2].to_string();
            match self.resolve(&id).cloned() {
                Some(def) => found.push(LinkRecord {
                    line: idx,
                    range,
                    text: cap[1].to_string(),
                    url: def.url,
                    title: def.title,
                    form: LinkForm::Reference,
                    reference_id: Some(id),
                }),
                None => self.unresolved.push(Unresolved { line: idx, id }),
            }
        }

        for cap in IMPLICIT_RE.captures_iter(line) {
            let Some(whole) = cap.get(0) else { continue };
            let range = whole.range();
            let text = &cap[1];
            let followed = line[range.end..].starts_with(['[', '(']);
            if followed || text.starts_with('^') || !free(&range, &claimed) {
                continue;
            }
            let Some(def) = self.resolve(text).cloned() else {
                continue;
            };
            claimed.push(range.clone());
            found.push(LinkRecord {
                line: idx,
                range,
                text: text.to_string(),
                url: def.url,
                title: def.title,
                form: LinkForm::Implicit,
                reference_id: Some(text.to_string()),
            });
        }

        found.sort_by_key(|link| link.range.start);
        self.links.extend(found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::document;

    #[test]
    fn finds_code_spans() {
        assert_eq!(code_span_ranges("a `b` c"), vec![2..5]);
        assert_eq!(code_span_ranges("``a ` b`` c"), vec![0..9]);
        assert_eq!(code_span_ranges("\\`a` b"), Vec::<Range<usize>>::new());
        assert_eq!(code_span_ranges("unclosed ` tick"), Vec::<Range<usize>>::new());
    }

    #[test]
    fn collects_all_three_forms() {
        let lines = document(&[
            "See [a](http://a.com \"A\"), [b][B] and [c].",
            "[b]: http://b.com",
            "[C]: http://c.com",
        ]);
        let catalog = LinkCatalog::build(&lines);
        let forms: Vec<LinkForm> = catalog.links.iter().map(|l| l.form).collect();
        assert_eq!(forms, vec![LinkForm::Inline, LinkForm::Reference, LinkForm::Implicit]);
        assert_eq!(catalog.links[0].title.as_deref(), Some("A"));
        assert_eq!(catalog.links[1].url, "http://b.com");
        assert_eq!(catalog.links[2].reference_id.as_deref(), Some("c"));
        assert_eq!(catalog.definition_lines, vec![1, 2]);
    }

    #[test]
    fn skips_code_spans_and_escapes() {
        let lines = document(&["`[a](http://a.com)` and \\[b](http://b.com)"]);
        assert!(LinkCatalog::build(&lines).links.is_empty());
    }

    #[test]
    fn records_unresolved_references() {
        let lines = document(&["[text][missing] and [plain brackets]"]);
        let catalog = LinkCatalog::build(&lines);
        assert!(catalog.links.is_empty());
        assert_eq!(
            catalog.unresolved,
            vec![Unresolved {
                line: 0,
                id: "missing".into()
            }]
        );
    }

    #[test]
    fn first_definition_wins() {
        let lines = document(&["[x]: http://one", "[X]: http://two"]);
        let catalog = LinkCatalog::build(&lines);
        assert_eq!(catalog.resolve("x").map(|d| d.url.as_str()), Some("http://one"));
        assert_eq!(catalog.definitions().len(), 2);
        assert!(!catalog.is_primary(&catalog.definitions()[1]));
    }

    #[test]
    fn destination_keeps_balanced_parentheses() {
        let lines = document(&["See [wiki](https://en.wikipedia.org/wiki/Foo_(bar)) now"]);
        let catalog = LinkCatalog::build(&lines);
        assert_eq!(catalog.links.len(), 1);
        assert_eq!(catalog.links[0].url, "https://en.wikipedia.org/wiki/Foo_(bar)");
        assert_eq!(catalog.links[0].range, 4..51);
    }

    #[test]
    fn prose_after_brackets_is_not_a_definition() {
        assert!(parse_definition("[Note]: this is important").is_none());
    }
}
