//! Utility helpers shared across integration tests.

use mdfixup::{Config, Rule, RuleSet, normalize_document};

/// Build a `Vec<String>` from a list of string slices.
macro_rules! lines_vec {
    ($($line:expr),* $(,)?) => {
        vec![$($line.to_string()),*]
    };
}

/// Default configuration with wrapping switched off, so structural
/// expectations are not disturbed by line length.
pub fn no_wrap() -> Config { Config::from_rules(RuleSet::default().without(Rule::Wrap), 60) }

/// Normalise `input` and return the output lines.
pub fn normalize(input: &[String], config: &Config) -> Vec<String> {
    normalize_document(input, config).lines
}

/// Assert that a second run over the output changes nothing.
pub fn assert_idempotent(input: &[String], config: &Config) {
    let once = normalize(input, config);
    let twice = normalize(&once, config);
    assert_eq!(once, twice, "second pass changed the output of {input:?}");
}
