//! Library for normalising the structure of Markdown documents.
//!
//! The pipeline renumbers and re-bullets lists, reflows pipe tables into
//! aligned columns, rewrites links into one consistent style and wraps
//! prose. Every step is driven by a [`Config`] and is idempotent: running
//! the output through again changes nothing.
//!
//! ```
//! use mdfixup::{normalize_document, Config};
//!
//! let input: Vec<String> = ["* a", "* b", "1. c"].into_iter().map(String::from).collect();
//! let out = normalize_document(&input, &Config::default());
//! assert_eq!(out.lines, vec!["* a", "* b", "", "<!-- -->", "", "1. c", ""]);
//! ```

#[macro_use]
mod macros;

pub mod classify;
pub mod config;
pub mod error;
pub mod fences;
pub mod io;
pub mod links;
pub mod lists;
pub mod process;
mod reflow;
pub mod table;
#[cfg(test)]
mod test_utils;
pub mod transform;
pub mod wrap;

pub use classify::{EmittedLine, LineRole};
pub use config::{Config, ConfigFile, IndentUnit, LinkMode, LinkPlacement, Rule, RuleSet};
pub use error::{ConfigError, Notice, RewriteError, RuleError};
pub use io::{normalize_file, normalize_text, rewrite};
pub use links::convert_links;
pub use lists::{normalize_item, ListKind, ListStack};
pub use process::{normalize_document, render, structural_pass, Normalized, Pass};
pub use table::{reflow_table, TableModel};
pub use wrap::wrap_lines;
