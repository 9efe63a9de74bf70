//! Configuration record, rule identifiers and the YAML rule file.
//!
//! The core only ever sees a resolved [`Config`]. [`ConfigFile`] and the
//! rule keyword parser exist so the binary can build one from a file and the
//! command line.

use std::{
    collections::BTreeSet,
    fmt::Write,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::{ConfigError, RuleError};

/// Wrap width used when neither the file nor the command line sets one.
pub const DEFAULT_WRAP_WIDTH: usize = 60;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_NAME: &str = ".mdfixup.yml";

/// A single normalisation rule that can be switched on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rule {
    Trailing,
    BlankLines,
    HeaderSpacing,
    HeaderNewline,
    CodeBefore,
    CodeAfter,
    ListBefore,
    ListAfter,
    RuleBefore,
    RuleAfter,
    ListTabs,
    ListMarker,
    Wrap,
    EndNewline,
    CodeLangSpacing,
    RefLinkSpacing,
    TaskCheckbox,
    BlockquoteSpacing,
    TableFormat,
    ListMarkers,
    ListReset,
    ReferenceLinks,
    LinksAtEnd,
    InlineLinks,
}

impl Rule {
    pub const ALL: [Rule; 24] = [
        Rule::Trailing,
        Rule::BlankLines,
        Rule::HeaderSpacing,
        Rule::HeaderNewline,
        Rule::CodeBefore,
        Rule::CodeAfter,
        Rule::ListBefore,
        Rule::ListAfter,
        Rule::RuleBefore,
        Rule::RuleAfter,
        Rule::ListTabs,
        Rule::ListMarker,
        Rule::Wrap,
        Rule::EndNewline,
        Rule::CodeLangSpacing,
        Rule::RefLinkSpacing,
        Rule::TaskCheckbox,
        Rule::BlockquoteSpacing,
        Rule::TableFormat,
        Rule::ListMarkers,
        Rule::ListReset,
        Rule::ReferenceLinks,
        Rule::LinksAtEnd,
        Rule::InlineLinks,
    ];

    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Trailing => "trailing",
            Self::BlankLines => "blank-lines",
            Self::HeaderSpacing => "header-spacing",
            Self::HeaderNewline => "header-newline",
            Self::CodeBefore => "code-before",
            Self::CodeAfter => "code-after",
            Self::ListBefore => "list-before",
            Self::ListAfter => "list-after",
            Self::RuleBefore => "rule-before",
            Self::RuleAfter => "rule-after",
            Self::ListTabs => "list-tabs",
            Self::ListMarker => "list-marker",
            Self::Wrap => "wrap",
            Self::EndNewline => "end-newline",
            Self::CodeLangSpacing => "code-lang-spacing",
            Self::RefLinkSpacing => "ref-link-spacing",
            Self::TaskCheckbox => "task-checkbox",
            Self::BlockquoteSpacing => "blockquote-spacing",
            Self::TableFormat => "table-format",
            Self::ListMarkers => "list-markers",
            Self::ListReset => "list-reset",
            Self::ReferenceLinks => "reference-links",
            Self::LinksAtEnd => "links-at-end",
            Self::InlineLinks => "inline-links",
        }
    }

    /// Legacy rule number accepted wherever a keyword is.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::Trailing => 2,
            Self::BlankLines => 3,
            Self::HeaderSpacing => 4,
            Self::HeaderNewline => 5,
            Self::CodeBefore => 6,
            Self::CodeAfter => 7,
            Self::ListBefore => 8,
            Self::ListAfter => 9,
            Self::RuleBefore => 10,
            Self::RuleAfter => 11,
            Self::ListTabs => 12,
            Self::ListMarker => 13,
            Self::Wrap => 14,
            Self::EndNewline => 15,
            Self::CodeLangSpacing => 17,
            Self::RefLinkSpacing => 18,
            Self::TaskCheckbox => 19,
            Self::BlockquoteSpacing => 20,
            Self::TableFormat => 22,
            Self::ListMarkers => 26,
            Self::ListReset => 27,
            Self::ReferenceLinks => 28,
            Self::LinksAtEnd => 29,
            Self::InlineLinks => 30,
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Trailing => "Trim trailing whitespace (keep exactly two spaces)",
            Self::BlankLines => "Collapse runs of blank lines",
            Self::HeaderSpacing => "Exactly one space after heading hashes",
            Self::HeaderNewline => "Blank line after headings",
            Self::CodeBefore => "Blank line before fenced code",
            Self::CodeAfter => "Blank line after fenced code",
            Self::ListBefore => "Blank line before lists",
            Self::ListAfter => "Blank line after lists",
            Self::RuleBefore => "Blank line before horizontal rules",
            Self::RuleAfter => "Blank line after horizontal rules",
            Self::ListTabs => "Indent nested list items with tabs",
            Self::ListMarker => "Exactly one space after list markers",
            Self::Wrap => "Wrap paragraphs, list items and quotes",
            Self::EndNewline => "Exactly one newline at end of file",
            Self::CodeLangSpacing => "No space between fence and language",
            Self::RefLinkSpacing => "Normalise reference definition spacing",
            Self::TaskCheckbox => "Lowercase task list checkboxes",
            Self::BlockquoteSpacing => "One space after blockquote markers",
            Self::TableFormat => "Reflow tables into aligned columns",
            Self::ListMarkers => "Renumber ordered lists and bullet by depth",
            Self::ListReset => "Restart ordered lists at 1",
            Self::ReferenceLinks => "Convert links to reference style",
            Self::LinksAtEnd => "Place link definitions at the end",
            Self::InlineLinks => "Convert links to inline style",
        }
    }

    /// Resolve a keyword, group keyword or legacy number to rules.
    ///
    /// # Errors
    /// Returns [`RuleError`] when the value names no rule.
    pub fn parse(value: &str) -> Result<Vec<Rule>, RuleError> {
        let value = value.trim();
        if value == "code-block-newlines" {
            return Ok(vec![Self::CodeBefore, Self::CodeAfter]);
        }
        if let Ok(number) = value.parse::<u8>() {
            return Self::ALL
                .into_iter()
                .find(|r| r.number() == number)
                .map(|r| vec![r])
                .ok_or(RuleError::UnknownNumber(number));
        }
        Self::ALL
            .into_iter()
            .find(|r| r.keyword() == value)
            .map(|r| vec![r])
            .ok_or_else(|| RuleError::UnknownKeyword(value.to_string()))
    }

    /// Parse a comma separated list such as `wrap,3,code-block-newlines`.
    ///
    /// # Errors
    /// Returns the first [`RuleError`] met.
    pub fn parse_list(list: &str) -> Result<Vec<Rule>, RuleError> {
        let mut rules = Vec::new();
        for value in list.split(',').filter(|v| !v.trim().is_empty()) {
            rules.extend(Self::parse(value)?);
        }
        Ok(rules)
    }
}

/// The set of enabled rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet(BTreeSet<Rule>);

impl Default for RuleSet {
    /// Everything except tab indentation and inline link conversion.
    fn default() -> Self {
        let mut set = Self::all();
        set.disable(Rule::ListTabs);
        set.disable(Rule::InlineLinks);
        set
    }
}

impl RuleSet {
    #[must_use]
    pub fn all() -> Self { Self(Rule::ALL.into_iter().collect()) }

    #[must_use]
    pub fn none() -> Self { Self(BTreeSet::new()) }

    #[must_use]
    pub fn contains(&self, rule: Rule) -> bool { self.0.contains(&rule) }

    pub fn enable(&mut self, rule: Rule) { self.0.insert(rule); }

    pub fn disable(&mut self, rule: Rule) { self.0.remove(&rule); }

    #[must_use]
    pub fn with(mut self, rule: Rule) -> Self {
        self.enable(rule);
        self
    }

    #[must_use]
    pub fn without(mut self, rule: Rule) -> Self {
        self.disable(rule);
        self
    }
}

/// How nested list indentation is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentUnit {
    /// Detect per list block from the first indented item.
    #[default]
    Auto,
    Two,
    Four,
}

impl IndentUnit {
    #[must_use]
    pub fn fixed(self) -> Option<usize> {
        match self {
            Self::Auto => None,
            Self::Two => Some(2),
            Self::Four => Some(4),
        }
    }
}

/// Target link style for the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkMode {
    /// `[text](url "title")` everywhere; definitions are inlined.
    Inline,
    /// `[text][id]` everywhere; definitions are collected into one block.
    #[default]
    Reference,
    /// Leave links alone.
    Preserve,
}

/// Where the definition block goes in reference mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkPlacement {
    #[default]
    End,
    /// After the front matter, or at the very top.
    Beginning,
}

/// Everything the normalisation core needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub wrap_width: usize,
    pub list_indent_unit: IndentUnit,
    /// Restart ordered lists at 1 instead of keeping the first number.
    pub list_reset: bool,
    pub link_mode: LinkMode,
    pub link_placement: LinkPlacement,
    pub rules: RuleSet,
}

impl Default for Config {
    fn default() -> Self { Self::from_rules(RuleSet::default(), DEFAULT_WRAP_WIDTH) }
}

impl Config {
    /// Build a config whose list and link options follow the rule set.
    ///
    /// `inline-links` wins over `reference-links`; with neither enabled links
    /// are preserved. `links-at-end` only selects the placement.
    #[must_use]
    pub fn from_rules(rules: RuleSet, wrap_width: usize) -> Self {
        let link_mode = if rules.contains(Rule::InlineLinks) {
            LinkMode::Inline
        } else if rules.contains(Rule::ReferenceLinks) {
            LinkMode::Reference
        } else {
            LinkMode::Preserve
        };
        let link_placement = if rules.contains(Rule::LinksAtEnd) {
            LinkPlacement::End
        } else {
            LinkPlacement::Beginning
        };
        Self {
            wrap_width,
            list_indent_unit: IndentUnit::Auto,
            list_reset: rules.contains(Rule::ListReset),
            link_mode,
            link_placement,
            rules,
        }
    }

    #[must_use]
    pub fn enabled(&self, rule: Rule) -> bool { self.rules.contains(rule) }
}

/// A `skip`/`include` entry: either the word `all` or a list of rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RulesList {
    Word(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesSection {
    pub skip: Option<RulesList>,
    pub include: Option<RulesList>,
}

/// On-disk rule enablement file.
///
/// ```yaml
/// width: 72
/// in_place: false
/// rules:
///   skip: [wrap, list-tabs]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub width: Option<usize>,
    pub in_place: Option<bool>,
    pub rules: Option<RulesSection>,
}

impl ConfigFile {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        Self::parse(&text, path)
    }

    /// Parse configuration text; `path` is only used for error messages.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed YAML.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Locate the configuration file: the local file first, then the user one.
    #[must_use]
    pub fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_NAME);
        if local.is_file() {
            return Some(local);
        }
        user_config_path().filter(|p| p.is_file())
    }

    /// Resolve the `rules` section against the default rule set.
    ///
    /// `skip: all` turns the `include` list into an allow-list; otherwise
    /// `skip` disables and `include` re-enables rules.
    ///
    /// # Errors
    /// Returns [`ConfigError::Rule`] for unknown keywords.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        let Some(section) = &self.rules else {
            return Ok(RuleSet::default());
        };
        let mut set = match &section.skip {
            Some(RulesList::Word(word)) if word.trim() == "all" => RuleSet::none(),
            Some(RulesList::Word(word)) => {
                let mut set = RuleSet::default();
                for rule in Rule::parse_list(word)? {
                    set.disable(rule);
                }
                set
            }
            Some(RulesList::List(items)) => {
                let mut set = RuleSet::default();
                for item in items {
                    for rule in Rule::parse(item)? {
                        set.disable(rule);
                    }
                }
                set
            }
            None => RuleSet::default(),
        };
        let includes: Vec<String> = match &section.include {
            Some(RulesList::Word(word)) if word.trim() == "all" => Rule::ALL
                .into_iter()
                .map(|r| r.keyword().to_string())
                .collect(),
            Some(RulesList::Word(word)) => vec![word.clone()],
            Some(RulesList::List(items)) => items.clone(),
            None => Vec::new(),
        };
        for item in includes {
            for rule in Rule::parse_list(&item)? {
                set.enable(rule);
            }
        }
        Ok(set)
    }
}

/// `$XDG_CONFIG_HOME/mdfixup/config.yml`, falling back to `~/.config`.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("mdfixup").join("config.yml"))
}

/// Default configuration file contents, listing every rule keyword.
#[must_use]
pub fn default_config_text() -> String {
    let mut text = format!("width: {DEFAULT_WRAP_WIDTH}\nin_place: false\nrules:\n");
    text.push_str("  skip:\n    - list-tabs\n    - inline-links\n");
    text.push_str("# Available rules:\n");
    for rule in Rule::ALL {
        let _ = writeln!(
            text,
            "#   {:<20} ({:>2}) {}",
            rule.keyword(),
            rule.number(),
            rule.description()
        );
    }
    text
}

/// Write [`default_config_text`] to `path`, refusing to overwrite.
///
/// # Errors
/// Returns [`ConfigError::FileExists`] or [`ConfigError::Io`].
pub fn init_config_file(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::FileExists {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            source,
            path: parent.to_path_buf(),
        })?;
    }
    fs::write(path, default_config_text()).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("wrap", vec![Rule::Wrap])]
    #[case("22", vec![Rule::TableFormat])]
    #[case(" list-reset ", vec![Rule::ListReset])]
    #[case("code-block-newlines", vec![Rule::CodeBefore, Rule::CodeAfter])]
    fn parses_rule_names(#[case] input: &str, #[case] expected: Vec<Rule>) {
        assert_eq!(Rule::parse(input).unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_rules() {
        assert_eq!(
            Rule::parse("typography"),
            Err(RuleError::UnknownKeyword("typography".into()))
        );
        assert_eq!(Rule::parse("16"), Err(RuleError::UnknownNumber(16)));
    }

    #[test]
    fn default_config_uses_reference_links_at_end() {
        let config = Config::default();
        assert_eq!(config.link_mode, LinkMode::Reference);
        assert_eq!(config.link_placement, LinkPlacement::End);
        assert!(config.list_reset);
        assert!(!config.enabled(Rule::ListTabs));
    }

    #[test]
    fn inline_links_take_precedence() {
        let config = Config::from_rules(RuleSet::default().with(Rule::InlineLinks), 80);
        assert_eq!(config.link_mode, LinkMode::Inline);
    }

    #[test]
    fn skipping_links_at_end_moves_definitions_to_top() {
        let config = Config::from_rules(RuleSet::default().without(Rule::LinksAtEnd), 80);
        assert_eq!(config.link_mode, LinkMode::Reference);
        assert_eq!(config.link_placement, LinkPlacement::Beginning);
    }

    #[test]
    fn no_link_rules_preserves_links() {
        let config = Config::from_rules(RuleSet::default().without(Rule::ReferenceLinks), 80);
        assert_eq!(config.link_mode, LinkMode::Preserve);
    }

    #[test]
    fn skip_all_with_include_is_an_allow_list() {
        let file = ConfigFile::parse(
            "rules:\n  skip: all\n  include:\n    - table-format\n    - \"26\"\n",
            Path::new("test.yml"),
        )
        .unwrap();
        let set = file.rule_set().unwrap();
        assert!(set.contains(Rule::TableFormat));
        assert!(set.contains(Rule::ListMarkers));
        assert!(!set.contains(Rule::Wrap));
    }

    #[test]
    fn skip_list_disables_rules() {
        let file = ConfigFile::parse(
            "width: 72\nrules:\n  skip: [wrap, code-block-newlines]\n",
            Path::new("test.yml"),
        )
        .unwrap();
        assert_eq!(file.width, Some(72));
        let set = file.rule_set().unwrap();
        assert!(!set.contains(Rule::Wrap));
        assert!(!set.contains(Rule::CodeBefore));
        assert!(set.contains(Rule::TableFormat));
    }

    #[test]
    fn unknown_keyword_in_file_is_an_error() {
        let file =
            ConfigFile::parse("rules:\n  skip: [nonsense]\n", Path::new("test.yml")).unwrap();
        assert!(matches!(file.rule_set(), Err(ConfigError::Rule(_))));
    }

    #[test]
    fn default_text_round_trips_to_default_rules() {
        let file = ConfigFile::parse(&default_config_text(), Path::new("test.yml")).unwrap();
        assert_eq!(file.rule_set().unwrap(), RuleSet::default());
        assert_eq!(file.width, Some(DEFAULT_WRAP_WIDTH));
    }
}
