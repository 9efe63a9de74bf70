//! Markdown table parsing and reflow.
//!
//! [`TableModel::parse`] turns a block of pipe-delimited lines into columns
//! and rows; rendering lives in the `reflow` module.

use std::fmt;

/// Column alignment taken from the separator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Center,
}

impl Alignment {
    /// `:-:` is center, `-:` right, anything else left.
    #[must_use]
    pub fn from_separator_cell(cell: &str) -> Self {
        let cell = cell.trim();
        match (cell.starts_with(':'), cell.len() > 1 && cell.ends_with(':')) {
            (true, true) => Self::Center,
            (false, true) => Self::Right,
            _ => Self::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub alignment: Alignment,
    pub width: usize,
}

/// Where the separator row sits in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Separator first, no header.
    Headerless,
    /// Header, separator, data.
    Standard,
    /// No separator in the input; one is synthesised after the first row.
    Relaxed,
}

/// Why a block was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSkip {
    TooFewRows,
    MissingPipe,
    NoColumns,
    ExtraCells,
}

impl TableSkip {
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Self::TooFewRows => "fewer than two rows",
            Self::MissingPipe => "a row has no pipe",
            Self::NoColumns => "no columns",
            Self::ExtraCells => "a row has more cells than the separator",
        }
    }
}

impl fmt::Display for TableSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.reason()) }
}

/// A parsed table. Every row holds exactly `columns.len()` padded cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableModel {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    pub layout: Layout,
}

/// Split a row on unescaped pipes, dropping one outer pipe on each side.
///
/// Escaped pipes stay in the cell as `\|`.
///
/// ```
/// use mdfixup::table::split_cells;
/// assert_eq!(split_cells("| a | b\\|c |"), vec!["a", "b\\|c"]);
/// assert_eq!(split_cells("x|y"), vec!["x", "y"]);
/// ```
#[must_use]
pub fn split_cells(line: &str) -> Vec<String> {
    let mut s = line.trim();
    if let Some(stripped) = s.strip_prefix('|') {
        s = stripped;
    }
    if let Some(stripped) = s.strip_suffix('|').filter(|_| !s.ends_with("\\|")) {
        s = stripped;
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&'|') {
            chars.next();
            current.push_str("\\|");
            continue;
        }
        if ch == '|' {
            cells.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// A row made only of pipes, colons, dashes and spaces with at least one dash.
#[must_use]
pub fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.contains('|')
        && trimmed.contains('-')
        && trimmed.chars().all(|c| matches!(c, '|' | ':' | '-' | ' '))
}

/// Fit a content row to `columns` cells, each wrapped in one space of padding.
fn pad_row(mut cells: Vec<String>, columns: usize) -> Result<Vec<String>, TableSkip> {
    while cells.len() > columns && cells.last().is_some_and(String::is_empty) {
        cells.pop();
    }
    if cells.len() > columns {
        return Err(TableSkip::ExtraCells);
    }
    cells.resize(columns, String::new());
    Ok(cells.into_iter().map(|c| format!(" {c} ")).collect())
}

impl TableModel {
    /// Parse a block of table lines.
    ///
    /// # Errors
    /// Returns the [`TableSkip`] reason when the block cannot be reflowed.
    pub fn parse(lines: &[String]) -> Result<Self, TableSkip> {
        let lines: Vec<&str> = lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.len() < 2 {
            return Err(TableSkip::TooFewRows);
        }
        if !lines.iter().all(|l| l.contains('|')) {
            return Err(TableSkip::MissingPipe);
        }

        let (layout, sep_idx) = if is_separator_row(lines[0]) {
            (Layout::Headerless, Some(0))
        } else {
            match lines.iter().position(|l| is_separator_row(l)) {
                Some(idx) => (Layout::Standard, Some(idx)),
                None => (Layout::Relaxed, None),
            }
        };

        let alignments: Vec<Alignment> = match sep_idx {
            Some(idx) => split_cells(lines[idx])
                .iter()
                .map(|c| Alignment::from_separator_cell(c))
                .collect(),
            None => vec![Alignment::Left; split_cells(lines[0]).len()],
        };
        if alignments.is_empty() {
            return Err(TableSkip::NoColumns);
        }

        let rows = lines
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != sep_idx)
            .map(|(_, line)| pad_row(split_cells(line), alignments.len()))
            .collect::<Result<Vec<_>, _>>()?;

        let widths = crate::reflow::calculate_widths(&rows, &alignments);
        let columns = alignments
            .into_iter()
            .zip(widths)
            .map(|(alignment, width)| Column { alignment, width })
            .collect();
        Ok(Self {
            columns,
            rows,
            layout,
        })
    }

    /// Render every row plus the separator, each prefixed with `indent`.
    #[must_use]
    pub fn render(&self, indent: &str) -> Vec<String> {
        let rows = crate::reflow::format_rows(&self.rows, &self.columns, indent);
        let separator = format!("{indent}{}", crate::reflow::format_separator(&self.columns));
        crate::reflow::insert_separator(rows, separator, self.layout)
    }
}

/// Reflow a table block, keeping the first line's indentation.
///
/// # Errors
/// Returns the [`TableSkip`] reason when the block must stay unchanged.
pub fn try_reflow(lines: &[String]) -> Result<Vec<String>, TableSkip> {
    let indent: String = lines
        .iter()
        .find(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).collect())
        .unwrap_or_default();
    TableModel::parse(lines).map(|model| model.render(&indent))
}

/// Reflow a table block, or `None` when it must be left as is.
///
/// ```
/// use mdfixup::table::reflow_table;
///
/// let lines = vec!["|a|bb|".to_string(), "|-|:-:|".to_string()];
/// assert_eq!(
///     reflow_table(&lines).unwrap(),
///     vec!["| a | bb |".to_string(), "|:--|:--:|".to_string()]
/// );
/// ```
#[must_use]
pub fn reflow_table(lines: &[String]) -> Option<Vec<String>> { try_reflow(lines).ok() }

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::string_vec;

    #[rstest]
    #[case(":---:", Alignment::Center)]
    #[case("---:", Alignment::Right)]
    #[case(":---", Alignment::Left)]
    #[case("---", Alignment::Left)]
    #[case(":", Alignment::Left)]
    fn alignment_from_colons(#[case] cell: &str, #[case] expected: Alignment) {
        assert_eq!(Alignment::from_separator_cell(cell), expected);
    }

    #[rstest]
    #[case("| --- | :-: |", true)]
    #[case("|---|", true)]
    #[case("| | |", false)]
    #[case("| a | - |", false)]
    fn separator_rows(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(is_separator_row(line), expected);
    }

    #[test]
    fn standard_table() {
        let input = string_vec!["| H1 | H2 |", "| --- | --- |", "| a | bb |"];
        let expected = string_vec!["| H1 | H2 |", "|:---|:---|", "| a  | bb |"];
        assert_eq!(reflow_table(&input).unwrap(), expected);
    }

    #[test]
    fn right_and_center_alignment() {
        let input = string_vec!["|n|name|", "|--:|:-:|", "|10|x|"];
        let expected = string_vec!["|  n | name |", "|---:|:----:|", "| 10 |  x   |"];
        assert_eq!(reflow_table(&input).unwrap(), expected);
    }

    #[test]
    fn headerless_table_keeps_separator_first() {
        let input = string_vec!["|---|---|", "|a|b|", "|c|d|"];
        let out = reflow_table(&input).unwrap();
        assert_eq!(out[0], "|:--|:--|");
        assert_eq!(out[1], "| a | b |");
    }

    #[test]
    fn relaxed_table_gets_separator() {
        let input = string_vec!["a | b", "c | d"];
        let expected = string_vec!["| a | b |", "|:--|:--|", "| c | d |"];
        assert_eq!(reflow_table(&input).unwrap(), expected);
    }

    #[test]
    fn short_rows_are_padded() {
        let input = string_vec!["| a | b |", "|---|---|", "| c |"];
        let out = reflow_table(&input).unwrap();
        assert_eq!(out[2], "| c |   |");
    }

    #[test]
    fn extra_cells_leave_block_alone() {
        let input = string_vec!["| a |", "|---|", "| b | c |"];
        assert_eq!(try_reflow(&input), Err(TableSkip::ExtraCells));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let input = string_vec!["| é | ü |", "|---|---|", "| ab | c |"];
        let out = reflow_table(&input).unwrap();
        assert_eq!(out[0], "| é  | ü |");
        assert_eq!(out[2], "| ab | c |");
    }

    #[test]
    fn keeps_escaped_pipes_and_indent() {
        let input = string_vec!["  | a\\|b | c |", "  |---|---|"];
        let out = reflow_table(&input).unwrap();
        assert_eq!(out[0], "  | a\\|b | c |");
        assert_eq!(out[1], "  |:-----|:--|");
    }

    #[test]
    fn single_line_is_not_a_table() {
        assert_eq!(try_reflow(&string_vec!["| a |"]), Err(TableSkip::TooFewRows));
    }
}
