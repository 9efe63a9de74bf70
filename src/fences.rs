//! Fenced code and display math tracking.
//!
//! [`BlockState`] replaces ad hoc `in_code`/`in_math` booleans: a document is
//! either in normal flow, inside a fence opened by a particular marker run, or
//! inside a `$$` math block. Nothing else is representable.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_RE: LazyLock<Regex> = lazy_regex!(
    // indent, fence run of 3+ backticks or tildes, then the info string
    r"^(\s*)(`{3,}|~{3,})([^\r\n]*)$",
    "valid fence regex",
);

/// Return fence components if the line is a fence delimiter.
///
/// # Examples
///
/// ```rust
/// use mdfixup::fences::is_fence;
/// assert_eq!(is_fence("```rust"), Some(("", "```", "rust")));
/// assert_eq!(is_fence("  ~~~~"), Some(("  ", "~~~~", "")));
/// assert!(is_fence("not a fence").is_none());
/// ```
#[must_use]
#[rustfmt::skip]
pub fn is_fence(line: &str) -> Option<(&str, &str, &str)> {
    FENCE_RE.captures(line).map(|cap| {
        let indent = cap.get(1).map_or("", |m| m.as_str());
        let fence  = cap.get(2).map_or("", |m| m.as_str());
        let info   = cap.get(3).map_or("", |m| m.as_str());
        (indent, fence, info)
    })
}

/// Where the scanner currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockState {
    #[default]
    Normal,
    InFence { marker: char, len: usize },
    InMath,
}

/// What a line did to the [`BlockState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Ordinary line in the current state.
    Content,
    /// The line opened a fence or math block.
    Open,
    /// The line closed the open block.
    Close,
}

impl BlockState {
    /// Feed one line and return what it did.
    ///
    /// A fence closes only on the same marker character with a run at least
    /// as long as the opener and no info string.
    pub fn advance(&mut self, line: &str) -> Transition {
        match *self {
            Self::Normal => {
                if let Some((_, fence, _)) = is_fence(line) {
                    *self = Self::InFence {
                        marker: fence.chars().next().unwrap_or('`'),
                        len: fence.chars().count(),
                    };
                    Transition::Open
                } else if line.trim() == "$$" {
                    *self = Self::InMath;
                    Transition::Open
                } else {
                    Transition::Content
                }
            }
            Self::InFence { marker, len } => match is_fence(line) {
                Some((_, fence, info))
                    if info.trim().is_empty()
                        && fence.starts_with(marker)
                        && fence.chars().count() >= len =>
                {
                    *self = Self::Normal;
                    Transition::Close
                }
                _ => Transition::Content,
            },
            Self::InMath => {
                if line.trim() == "$$" {
                    *self = Self::Normal;
                    Transition::Close
                } else {
                    Transition::Content
                }
            }
        }
    }

    #[must_use]
    pub fn is_normal(self) -> bool { self == Self::Normal }
}
