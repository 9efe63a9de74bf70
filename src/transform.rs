//! Per-line rewrites applied before a line is classified.
//!
//! Each step looks at one line in isolation. Steps return `None` when they
//! leave the line alone so the common case borrows instead of allocating.

use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

use crate::{
    config::{Config, Rule},
    links::parse_definition,
    lists::single_space_after_marker,
};

static HEADING_SPACING_RE: LazyLock<Regex> = lazy_regex!(
    r"^(#{1,6})([ \t]*)([^ \t#].*)$",
    "valid heading spacing regex",
);

static FENCE_LANG_RE: LazyLock<Regex> = lazy_regex!(
    r"^([ \t]*)(`{3,}|~{3,})[ \t]+([^\s`~]+)",
    "valid fence language regex",
);

static REF_DEF_SPACING_RE: LazyLock<Regex> = lazy_regex!(
    r"^([ \t]*\[[^\]]+\])[ \t]*:[ \t]*",
    "valid reference definition spacing regex",
);

static TASK_RE: LazyLock<Regex> = lazy_regex!(
    r"^([ \t]*(?:[-*+]|[0-9]+\.))[ \t]+\[[Xx]\][ \t]+",
    "valid task checkbox regex",
);

static BLOCKQUOTE_RE: LazyLock<Regex> = lazy_regex!(
    r"^([ \t]*(?:>[ \t]*)*)>([^\s>])",
    "valid blockquote spacing regex",
);

/// A rewrite of a single line.
pub trait LineTransform {
    fn apply<'a>(&self, line: &'a str) -> Cow<'a, str>;
}

type Step = fn(&str) -> Option<String>;

fn changed(original: &str, candidate: Cow<'_, str>) -> Option<String> {
    (candidate != original).then(|| candidate.into_owned())
}

/// Keep exactly two trailing spaces as a hard break; strip anything else.
fn trailing_whitespace(line: &str) -> Option<String> {
    let trimmed = line.trim_end();
    let spaces = line.len() - line.trim_end_matches(' ').len();
    let fixed = if spaces == 2 && !trimmed.is_empty() {
        format!("{trimmed}  ")
    } else {
        trimmed.to_string()
    };
    changed(line, Cow::Owned(fixed))
}

fn heading_spacing(line: &str) -> Option<String> {
    let cap = HEADING_SPACING_RE.captures(line)?;
    if &cap[2] == " " {
        return None;
    }
    Some(format!("{} {}", &cap[1], &cap[3]))
}

fn fence_language(line: &str) -> Option<String> {
    changed(line, FENCE_LANG_RE.replace(line, "$1$2$3"))
}

fn reference_definition(line: &str) -> Option<String> {
    parse_definition(line)?;
    changed(line, REF_DEF_SPACING_RE.replace(line, "$1: "))
}

fn task_checkbox(line: &str) -> Option<String> { changed(line, TASK_RE.replace(line, "$1 [x] ")) }

fn blockquote(line: &str) -> Option<String> { changed(line, BLOCKQUOTE_RE.replace(line, "$1> $2")) }

/// The transforms selected by a rule set, applied in a fixed order.
#[derive(Debug, Clone)]
pub struct StandardTransforms {
    steps: Vec<Step>,
}

impl StandardTransforms {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let table: [(Rule, Step); 7] = [
            (Rule::Trailing, trailing_whitespace),
            (Rule::HeaderSpacing, heading_spacing),
            (Rule::CodeLangSpacing, fence_language),
            (Rule::RefLinkSpacing, reference_definition),
            (Rule::TaskCheckbox, task_checkbox),
            (Rule::BlockquoteSpacing, blockquote),
            (Rule::ListMarker, single_space_after_marker),
        ];
        let steps = table
            .into_iter()
            .filter(|(rule, _)| config.enabled(*rule))
            .map(|(_, step)| step)
            .collect();
        Self { steps }
    }

    /// Only the trailing whitespace step, for fence delimiters.
    #[must_use]
    pub fn trailing_only(config: &Config) -> Self {
        let steps: Vec<Step> = if config.enabled(Rule::Trailing) {
            vec![trailing_whitespace]
        } else {
            Vec::new()
        };
        Self { steps }
    }
}

impl LineTransform for StandardTransforms {
    fn apply<'a>(&self, line: &'a str) -> Cow<'a, str> {
        self.steps.iter().fold(Cow::Borrowed(line), |acc, step| match step(&acc) {
            Some(new) => Cow::Owned(new),
            None => acc,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn all() -> StandardTransforms { StandardTransforms::from_config(&Config::default()) }

    #[rstest]
    #[case("text   ", "text")]
    #[case("break  ", "break  ")]
    #[case("tab\t", "tab")]
    #[case("##Title", "## Title")]
    #[case("#   Spaced", "# Spaced")]
    #[case("####### seven", "####### seven")]
    #[case("``` rust", "```rust")]
    #[case("[id] :   http://x", "[id]: http://x")]
    #[case("- [X] done", "- [x] done")]
    #[case(">quote", "> quote")]
    #[case("> >nested", "> > nested")]
    #[case("-   wide", "- wide")]
    fn applies_rules(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(all().apply(input), expected);
    }

    #[test]
    fn unchanged_lines_are_borrowed() {
        assert!(matches!(all().apply("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn disabled_rules_do_nothing() {
        let config = Config::default();
        let mut rules = config.rules.clone();
        rules.disable(Rule::HeaderSpacing);
        let transforms = StandardTransforms::from_config(&Config::from_rules(rules, 60));
        assert_eq!(transforms.apply("##Title"), "##Title");
    }
}
