// Rendering helpers for reflowing markdown tables.
//
// These small utilities break down the output side of `TableModel` so each
// step can be understood and tested independently.

use crate::table::{Alignment, Column, Layout};

/// Narrowest column, bumper padding included.
const MIN_WIDTH: usize = 2;
/// Center columns need room for `:-:`.
const MIN_CENTER_WIDTH: usize = 3;

fn display_len(cell: &str) -> usize { cell.chars().count() }

pub(crate) fn calculate_widths(rows: &[Vec<String>], alignments: &[Alignment]) -> Vec<usize> {
    alignments
        .iter()
        .enumerate()
        .map(|(idx, alignment)| {
            let floor = if *alignment == Alignment::Center {
                MIN_CENTER_WIDTH
            } else {
                MIN_WIDTH
            };
            rows.iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| display_len(cell))
                .fold(floor, usize::max)
        })
        .collect()
}

fn justify(cell: &str, column: Column) -> String {
    let padding = column.width.saturating_sub(display_len(cell));
    match column.alignment {
        Alignment::Left => format!("{cell}{}", " ".repeat(padding)),
        Alignment::Right => format!("{}{cell}", " ".repeat(padding)),
        Alignment::Center => {
            let left = padding / 2;
            format!("{}{cell}{}", " ".repeat(left), " ".repeat(padding - left))
        }
    }
}

pub(crate) fn format_rows(rows: &[Vec<String>], columns: &[Column], indent: &str) -> Vec<String> {
    rows.iter()
        .map(|row| {
            let cells: Vec<String> = row
                .iter()
                .zip(columns)
                .map(|(cell, column)| justify(cell, *column))
                .collect();
            format!("{indent}|{}|", cells.join("|"))
        })
        .collect()
}

/// Build the separator row for the given columns.
pub(crate) fn format_separator(columns: &[Column]) -> String {
    let cells: Vec<String> = columns
        .iter()
        .map(|column| {
            let dashes = "-".repeat(column.width.saturating_sub(2));
            match column.alignment {
                Alignment::Left => format!(":{dashes}-"),
                Alignment::Right => format!("-{dashes}:"),
                Alignment::Center => format!(":{dashes}:"),
            }
        })
        .collect();
    format!("|{}|", cells.join("|"))
}

pub(crate) fn insert_separator(
    mut rows: Vec<String>,
    separator: String,
    layout: Layout,
) -> Vec<String> {
    let at = match layout {
        Layout::Headerless => 0,
        Layout::Standard | Layout::Relaxed => 1.min(rows.len()),
    };
    rows.insert(at, separator);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(alignment: Alignment, width: usize) -> Column { Column { alignment, width } }

    #[test]
    fn widths_respect_minimums() {
        let rows = vec![vec!["  ".to_string(), "  ".to_string()]];
        assert_eq!(
            calculate_widths(&rows, &[Alignment::Left, Alignment::Center]),
            vec![2, 3]
        );
    }

    #[test]
    fn justifies_cells() {
        assert_eq!(justify(" a ", column(Alignment::Left, 5)), " a   ");
        assert_eq!(justify(" a ", column(Alignment::Right, 5)), "   a ");
        assert_eq!(justify(" a ", column(Alignment::Center, 6)), "  a   ");
    }

    #[test]
    fn separator_marks_alignment() {
        let columns = [
            column(Alignment::Left, 2),
            column(Alignment::Right, 4),
            column(Alignment::Center, 5),
        ];
        assert_eq!(format_separator(&columns), "|:-|---:|:---:|");
    }

    #[test]
    fn separator_position_follows_layout() {
        let rows = vec!["h".to_string(), "d".to_string()];
        assert_eq!(
            insert_separator(rows.clone(), "s".into(), Layout::Headerless),
            vec!["s", "h", "d"]
        );
        assert_eq!(
            insert_separator(rows, "s".into(), Layout::Relaxed),
            vec!["h", "s", "d"]
        );
    }
}
