//! Builders shared by the unit tests.

use crate::{
    classify::{EmittedLine, LineRole},
    links::parse_definition,
};

/// Collect string literals into a `Vec<String>`.
#[macro_export]
macro_rules! string_vec {
    ($($line:expr),* $(,)?) => {
        vec![$(::std::string::String::from($line)),*]
    };
}

/// Tag plain lines the way the structural pass would for a simple document:
/// blank, reference definition or paragraph.
pub fn document(lines: &[&str]) -> Vec<EmittedLine> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            let role = if text.trim().is_empty() {
                LineRole::Blank
            } else if parse_definition(text).is_some() {
                LineRole::Definition
            } else {
                LineRole::Paragraph
            };
            EmittedLine::new(*text, role, Some(idx))
        })
        .collect()
}

pub fn texts(lines: &[EmittedLine]) -> Vec<&str> { lines.iter().map(|l| l.text.as_str()).collect() }
