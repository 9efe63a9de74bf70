//! Link style conversion.
//!
//! Conversion runs in two phases. [`LinkCatalog::build`] collects every
//! reference definition and link occurrence into an immutable catalog; the
//! second phase turns the catalog into non-overlapping range replacements per
//! line and a single definition block placed at the start or the end.
//!
//! In reference mode existing `[text][id]` and `[text]` links keep their id
//! and inline links get fresh numeric ids. In inline mode every resolvable
//! link is expanded and the definitions it used are dropped. Definitions no
//! link uses are always kept.

mod catalog;
mod placement;
mod rewrite;

use std::collections::{BTreeSet, HashMap, HashSet};

pub use catalog::{
    code_span_ranges, normalize_id, parse_definition, Definition, LinkCatalog, LinkForm,
    LinkRecord, Unresolved,
};
pub use placement::{place_block, remove_lines};
pub use rewrite::{apply_replacements, guard_list_item, Replacement};

use crate::{
    classify::{EmittedLine, LineRole},
    config::{LinkMode, LinkPlacement},
    error::Notice,
};

/// Result of [`convert_links`].
#[derive(Debug, Clone, Default)]
pub struct LinkOutcome {
    pub lines: Vec<EmittedLine>,
    pub notices: Vec<Notice>,
}

fn inline_form(text: &str, url: &str, title: Option<&str>) -> String {
    match title {
        Some(title) => format!("[{text}]({url} \"{title}\")"),
        None => format!("[{text}]({url})"),
    }
}

/// Numeric ids for inline links, one per distinct url and title.
///
/// Allocation starts after the highest numeric id already defined and skips
/// any number in use.
fn assign_numeric_ids(catalog: &LinkCatalog) -> HashMap<(String, Option<String>), usize> {
    let mut used: BTreeSet<usize> = catalog
        .definitions()
        .iter()
        .filter_map(Definition::numeric_id)
        .collect();
    let mut next = used.last().map_or(1, |max| max + 1);
    let mut assigned = HashMap::new();
    for link in catalog.links.iter().filter(|l| l.form == LinkForm::Inline) {
        let key = (link.url.clone(), link.title.clone());
        assigned.entry(key).or_insert_with(|| {
            while used.contains(&next) {
                next += 1;
            }
            used.insert(next);
            next
        });
    }
    assigned
}

/// Order the definition block: textual ids first (used ones in order of first
/// use, then the rest in definition order), numeric ids after in ascending
/// order.
fn order_block(catalog: &LinkCatalog, defs: Vec<Definition>) -> Vec<Definition> {
    let first_use: Vec<String> = catalog
        .links
        .iter()
        .filter_map(|l| l.reference_id.as_deref().map(normalize_id))
        .collect();
    let rank = |def: &Definition| {
        if catalog.is_primary(def) {
            first_use.iter().position(|id| *id == def.key())
        } else {
            None
        }
    };
    let (mut numeric, mut textual): (Vec<Definition>, Vec<Definition>) =
        defs.into_iter().partition(|d| d.numeric_id().is_some());
    textual.sort_by_key(|def| rank(def).map_or((1, 0), |pos| (0, pos)));
    numeric.sort_by_key(|def| def.numeric_id());
    textual.extend(numeric);
    textual
}

fn definition_lines(defs: Vec<Definition>) -> Vec<EmittedLine> {
    defs.into_iter()
        .map(|d| EmittedLine::new(d.render(), LineRole::Definition, None))
        .collect()
}

/// Rewrite every link in `lines` to `mode` and re-emit the definitions.
///
/// `Preserve` returns the lines unchanged.
///
/// ```
/// use mdfixup::{
///     classify::{EmittedLine, LineRole},
///     config::{LinkMode, LinkPlacement},
///     links::convert_links,
/// };
///
/// let lines = vec![EmittedLine::new("[x](http://example.com)", LineRole::Paragraph, Some(0))];
/// let out = convert_links(&lines, LinkMode::Reference, LinkPlacement::End);
/// let texts: Vec<&str> = out.lines.iter().map(|l| l.text.as_str()).collect();
/// assert_eq!(texts, vec!["[x][1]", "", "[1]: http://example.com"]);
/// ```
#[must_use]
pub fn convert_links(
    lines: &[EmittedLine],
    mode: LinkMode,
    placement: LinkPlacement,
) -> LinkOutcome {
    if mode == LinkMode::Preserve {
        return LinkOutcome {
            lines: lines.to_vec(),
            notices: Vec::new(),
        };
    }
    let catalog = LinkCatalog::build(lines);
    let notices = catalog
        .unresolved
        .iter()
        .map(|u| Notice::UnresolvedReference {
            line: lines[u.line].origin.unwrap_or(u.line),
            id: u.id.clone(),
        })
        .collect();

    let numeric = if mode == LinkMode::Reference {
        assign_numeric_ids(&catalog)
    } else {
        HashMap::new()
    };

    let mut per_line: HashMap<usize, Vec<Replacement>> = HashMap::new();
    let mut inlined: HashSet<String> = HashSet::new();
    for link in &catalog.links {
        let text = match (mode, link.form) {
            (LinkMode::Reference, LinkForm::Inline) => {
                let id = numeric[&(link.url.clone(), link.title.clone())];
                format!("[{}][{id}]", link.text)
            }
            (LinkMode::Reference, _) => continue,
            _ => {
                if let Some(id) = &link.reference_id {
                    inlined.insert(normalize_id(id));
                }
                inline_form(&link.text, &link.url, link.title.as_deref())
            }
        };
        per_line.entry(link.line).or_default().push(Replacement {
            range: link.range.clone(),
            text,
        });
    }

    let mut out = lines.to_vec();
    for (idx, reps) in per_line {
        let original = &lines[idx].text;
        let rewritten = apply_replacements(original, reps);
        out[idx].text = if matches!(lines[idx].role, LineRole::ListItem { .. }) {
            guard_list_item(original, rewritten)
        } else {
            rewritten
        };
    }

    let mut block: Vec<Definition> = catalog
        .definitions()
        .iter()
        .filter(|def| !(catalog.is_primary(def) && inlined.contains(&def.key())))
        .cloned()
        .collect();
    let mut fresh: Vec<(usize, (String, Option<String>))> =
        numeric.into_iter().map(|(key, id)| (id, key)).collect();
    fresh.sort_by_key(|(id, _)| *id);
    block.extend(fresh.into_iter().map(|(id, (url, title))| Definition {
        id: id.to_string(),
        url,
        title,
    }));

    log::debug!(
        "link conversion: {} links, {} definitions",
        catalog.links.len(),
        block.len()
    );
    let out = remove_lines(out, &catalog.definition_lines);
    let block = definition_lines(order_block(&catalog, block));
    LinkOutcome {
        lines: place_block(out, block, placement),
        notices,
    }
}
