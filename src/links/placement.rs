//! Removing definitions from their old position and emitting the block.

use crate::{
    classify::{EmittedLine, LineRole},
    config::LinkPlacement,
};

/// Drop the lines at `indices`, collapsing a blank line left doubled.
///
/// Blank lines left dangling at the end by a removal are dropped too.
#[must_use]
pub fn remove_lines(lines: Vec<EmittedLine>, indices: &[usize]) -> Vec<EmittedLine> {
    let mut out: Vec<EmittedLine> = Vec::with_capacity(lines.len());
    let mut removed_since_push = false;
    for (idx, line) in lines.into_iter().enumerate() {
        if indices.contains(&idx) {
            removed_since_push = true;
            continue;
        }
        let doubled = out.last().is_none_or(EmittedLine::is_blank);
        if removed_since_push && line.is_blank() && doubled {
            continue;
        }
        removed_since_push = false;
        out.push(line);
    }
    if removed_since_push {
        while out.last().is_some_and(EmittedLine::is_blank) {
            out.pop();
        }
    }
    out
}

/// Insert the definition block at the configured position.
#[must_use]
pub fn place_block(
    mut lines: Vec<EmittedLine>,
    block: Vec<EmittedLine>,
    placement: LinkPlacement,
) -> Vec<EmittedLine> {
    if block.is_empty() {
        return lines;
    }
    match placement {
        LinkPlacement::End => {
            while lines.last().is_some_and(EmittedLine::is_blank) {
                lines.pop();
            }
            if !lines.is_empty() {
                lines.push(EmittedLine::blank());
            }
            lines.extend(block);
            lines
        }
        LinkPlacement::Beginning => {
            let at = lines
                .iter()
                .take_while(|l| l.role == LineRole::FrontMatter)
                .count();
            let rest_start = lines[at..]
                .iter()
                .position(|l| !l.is_blank())
                .map_or(lines.len(), |p| at + p);
            let rest = lines.split_off(rest_start);
            lines.truncate(at);
            if at > 0 {
                lines.push(EmittedLine::blank());
            }
            lines.extend(block);
            if !rest.is_empty() {
                lines.push(EmittedLine::blank());
                lines.extend(rest);
            }
            lines
        }
    }
}
