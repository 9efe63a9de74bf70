//! Crate-wide macros.

/// Build the initialiser for a `static LazyLock<Regex>`.
///
/// Patterns are string literals, so a compile failure is a bug; `$msg` names
/// the pattern in the resulting panic.
///
/// ```
/// use std::sync::LazyLock;
///
/// use regex::Regex;
///
/// static ORDERED: LazyLock<Regex> = mdfixup::lazy_regex!(r"^\s*\d+\.\s", "ordered marker");
/// assert!(ORDERED.is_match("12. item"));
/// assert!(!ORDERED.is_match("- item"));
/// ```
#[macro_export]
macro_rules! lazy_regex {
    ($pattern:expr, $msg:expr $(,)?) => {
        ::std::sync::LazyLock::new(|| ::regex::Regex::new($pattern).expect($msg))
    };
}
