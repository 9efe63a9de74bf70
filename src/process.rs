//! High-level Markdown stream processing.
//!
//! [`structural_pass`] walks the document once, tagging every emitted line
//! with a [`LineRole`]. [`normalize_document`] then runs the link post-pass,
//! re-aligns tables, wraps and fixes the end of the document.

use crate::{
    classify::{
        classify_line, front_matter_len, is_setext_underline, EmittedLine, LineClass, LineRole,
        LIST_SEPARATOR,
    },
    config::{Config, Rule},
    error::Notice,
    fences::{BlockState, Transition},
    links::{convert_links, parse_definition},
    lists::{
        detect_indent_unit, indent_with_tabs, normalize_item, parse_item, ListStack,
        NumberingPolicy,
    },
    table::try_reflow,
    transform::{LineTransform, StandardTransforms},
    wrap::wrap_lines,
};

/// Output of [`structural_pass`].
#[derive(Debug, Clone, Default)]
pub struct Pass {
    pub lines: Vec<EmittedLine>,
    pub notices: Vec<Notice>,
}

/// Output of [`normalize_document`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    /// Output lines; with `end-newline` the last one is empty.
    pub lines: Vec<String>,
    pub notices: Vec<Notice>,
}

fn is_list_line(line: &EmittedLine) -> bool {
    matches!(line.role, LineRole::ListItem { .. } | LineRole::ListContinuation)
}

fn is_indented(line: &str) -> bool { line.starts_with([' ', '\t']) }

fn is_indented_code(line: &str) -> bool { line.starts_with("    ") || line.starts_with('\t') }

/// A pipe-bearing line that no other block claims.
fn is_table_candidate(line: &str, class: LineClass) -> bool {
    line.contains('|')
        && !(class.heading || class.rule || class.fence || class.blockquote || class.blank)
        && !class.is_list_item(line)
}

struct Walker<'a> {
    config: &'a Config,
    transforms: StandardTransforms,
    fence_transforms: StandardTransforms,
    policy: NumberingPolicy,
    out: Vec<EmittedLine>,
    notices: Vec<Notice>,
    stack: ListStack,
    indent_unit: usize,
    state: BlockState,
    blank_pending: bool,
}

impl<'a> Walker<'a> {
    fn new(config: &'a Config) -> Self {
        Self {
            config,
            transforms: StandardTransforms::from_config(config),
            fence_transforms: StandardTransforms::trailing_only(config),
            policy: NumberingPolicy::from_reset(config.list_reset),
            out: Vec::new(),
            notices: Vec::new(),
            stack: ListStack::new(),
            indent_unit: 2,
            state: BlockState::Normal,
            blank_pending: false,
        }
    }

    fn enabled(&self, rule: Rule) -> bool { self.config.enabled(rule) }

    fn last(&self) -> Option<&EmittedLine> { self.out.last() }

    /// Push a line, first honouring a blank requested by the previous block.
    fn push(&mut self, text: String, role: LineRole, origin: usize) {
        if role == LineRole::Blank {
            self.blank_pending = false;
        } else if std::mem::take(&mut self.blank_pending) {
            self.ensure_blank();
        }
        self.out.push(EmittedLine::new(text, role, Some(origin)));
    }

    /// Insert a blank line unless the output is empty or already ends in one.
    fn ensure_blank(&mut self) {
        if self.last().is_some_and(|l| !l.is_blank()) {
            self.out.push(EmittedLine::blank());
        }
    }

    fn blank_if(&mut self, rule: Rule) {
        if self.enabled(rule) {
            self.ensure_blank();
        }
    }

    /// Blank line after a list line, when `list-after` asks for one.
    fn end_list_item(&mut self) {
        if self.enabled(Rule::ListAfter) && self.last().is_some_and(is_list_line) {
            self.ensure_blank();
        }
    }

    /// Leave any open list before a top-level block.
    fn close_list(&mut self) {
        self.end_list_item();
        self.stack.clear();
    }

    fn detect_unit(&self, lines: &[String], idx: usize) -> usize {
        self.config
            .list_indent_unit
            .fixed()
            .unwrap_or_else(|| detect_indent_unit(lines, idx))
    }

    /// Indented code may follow anything but a paragraph-like line.
    fn code_allowed(&self) -> bool {
        self.stack.is_empty()
            && (self.blank_pending || self.last().is_none_or(|l| !l.wrap_eligible()))
    }

    fn step(&mut self, lines: &[String], idx: usize) -> usize {
        let raw = lines[idx].as_str();
        if !self.state.is_normal() {
            let in_math = self.state == BlockState::InMath;
            if self.state.advance(raw) == Transition::Close {
                let text = self.fence_transforms.apply(raw).into_owned();
                self.push(text, LineRole::Fence, idx);
                if !in_math && self.enabled(Rule::CodeAfter) {
                    self.blank_pending = true;
                }
            } else {
                let role = if in_math { LineRole::Math } else { LineRole::Code };
                self.push(raw.to_string(), role, idx);
            }
            return idx + 1;
        }

        let line = self.transforms.apply(raw).into_owned();
        let class = classify_line(&line);
        let in_list_body = !self.stack.is_empty() && is_indented(&line);

        if class.fence || line.trim() == "$$" {
            self.state.advance(&line);
            if !in_list_body {
                self.close_list();
            }
            if class.fence {
                self.blank_if(Rule::CodeBefore);
            }
            self.push(line, LineRole::Fence, idx);
        } else if class.blank {
            let collapse =
                self.enabled(Rule::BlankLines) && self.last().is_none_or(EmittedLine::is_blank);
            if !collapse {
                self.push(line, LineRole::Blank, idx);
            }
        } else if is_table_candidate(&line, class)
            && let Some(run) = self.table_run(lines, idx, line.clone())
        {
            return self.table(run, idx, in_list_body);
        } else if is_setext_underline(&line)
            && self.last().is_some_and(|l| l.role == LineRole::Paragraph)
        {
            if let Some(prev) = self.out.last_mut() {
                prev.role = LineRole::Heading;
            }
            self.push(line, LineRole::Heading, idx);
            self.blank_pending = self.enabled(Rule::HeaderNewline);
        } else if class.heading {
            if !in_list_body {
                self.close_list();
            }
            self.push(line, LineRole::Heading, idx);
            self.blank_pending = self.enabled(Rule::HeaderNewline);
        } else if class.rule {
            if !in_list_body {
                self.close_list();
            }
            self.blank_if(Rule::RuleBefore);
            self.push(line, LineRole::Rule, idx);
            self.blank_pending = self.enabled(Rule::RuleAfter);
        } else if class.is_list_item(&line) {
            self.list_item(lines, idx, line);
        } else if class.blockquote {
            if !in_list_body {
                self.close_list();
            }
            self.push(line, LineRole::Blockquote, idx);
        } else if line.trim() == LIST_SEPARATOR {
            self.stack.clear();
            self.push(line, LineRole::Separator, idx);
        } else if in_list_body {
            self.push(line, LineRole::ListContinuation, idx);
        } else if parse_definition(&line).is_some() && self.definition_allowed() {
            // The link pass removes definitions, so an open list stays open.
            self.end_list_item();
            self.push(line, LineRole::Definition, idx);
        } else if line.trim_start().starts_with('<') {
            self.close_list();
            self.push(line, LineRole::Html, idx);
        } else if is_indented_code(&line) && self.code_allowed() {
            self.push(line, LineRole::Code, idx);
        } else {
            self.close_list();
            self.push(line, LineRole::Paragraph, idx);
        }
        idx + 1
    }

    /// A definition may not continue a paragraph. A list line counts as a
    /// paragraph unless `list-after` is about to separate it.
    fn definition_allowed(&self) -> bool {
        self.last().is_none_or(|l| {
            !l.wrap_eligible() || (is_list_line(l) && self.enabled(Rule::ListAfter))
        })
    }

    /// The contiguous table candidates starting at `idx`, when there are at
    /// least two.
    fn table_run(&self, lines: &[String], idx: usize, first: String) -> Option<Vec<String>> {
        let mut run = vec![first];
        for raw in &lines[idx + 1..] {
            let line = self.transforms.apply(raw);
            if !is_table_candidate(&line, classify_line(&line)) {
                break;
            }
            run.push(line.into_owned());
        }
        (run.len() >= 2).then_some(run)
    }

    fn table(&mut self, run: Vec<String>, idx: usize, in_list_body: bool) -> usize {
        let consumed = run.len();
        if !in_list_body {
            self.close_list();
        }
        let rendered = if self.enabled(Rule::TableFormat) {
            match try_reflow(&run) {
                Ok(rendered) => rendered,
                Err(skip) => {
                    log::debug!("line {}: table left unchanged: {skip}", idx + 1);
                    self.notices.push(Notice::StructuralViolation {
                        line: idx,
                        reason: skip.reason(),
                    });
                    run
                }
            }
        } else {
            run
        };
        for (offset, text) in rendered.into_iter().enumerate() {
            self.push(text, LineRole::Table, idx + offset.min(consumed - 1));
        }
        idx + consumed
    }

    fn list_item(&mut self, lines: &[String], idx: usize, line: String) {
        if self.stack.is_empty() {
            self.indent_unit = self.detect_unit(lines, idx);
        }
        let Some(item) = parse_item(&line) else {
            self.close_list();
            self.push(line, LineRole::Paragraph, idx);
            return;
        };
        let kind = item.kind();
        let mut level = item.level(self.indent_unit);

        if self.enabled(Rule::ListMarkers) && self.stack.interrupted_by(level, kind) {
            log::debug!("line {}: separating lists of different kinds", idx + 1);
            while self.last().is_some_and(EmittedLine::is_blank) {
                self.out.pop();
            }
            self.blank_pending = false;
            self.out.push(EmittedLine::blank());
            self.out.push(EmittedLine::new(LIST_SEPARATOR, LineRole::Separator, None));
            self.out.push(EmittedLine::blank());
            self.stack.clear();
            self.indent_unit = self.detect_unit(lines, idx);
            level = item.level(self.indent_unit);
        } else if self.enabled(Rule::ListBefore)
            && self.last().is_some_and(|l| {
                !l.is_blank()
                    && !is_list_line(l)
                    && !matches!(l.role, LineRole::Blockquote | LineRole::Heading)
            })
        {
            self.ensure_blank();
        }

        let stack = std::mem::take(&mut self.stack);
        let Some(result) = normalize_item(&line, stack, self.indent_unit, self.policy) else {
            self.push(line, LineRole::Paragraph, idx);
            return;
        };
        self.stack = result.stack;
        let kind = self.stack.contexts().last().map_or(kind, |ctx| ctx.kind);

        let mut text = if self.enabled(Rule::ListMarkers) { result.line } else { line };
        if result.ambiguous {
            log::debug!("line {}: ambiguous list item kept verbatim", idx + 1);
            self.notices.push(Notice::ParseAmbiguity {
                line: idx,
                text: text.clone(),
            });
        }
        if self.enabled(Rule::ListTabs) {
            text = indent_with_tabs(&text, self.indent_unit);
        }
        self.push(text, LineRole::ListItem { level, kind }, idx);
    }
}

/// Walk the document once, emitting every line with its role.
///
/// Front matter is copied verbatim; code and math blocks are copied
/// verbatim apart from trailing whitespace on their delimiters.
#[must_use]
pub fn structural_pass(lines: &[String], config: &Config) -> Pass {
    let mut walker = Walker::new(config);
    let start = front_matter_len(lines).unwrap_or(0);
    for (idx, line) in lines[..start].iter().enumerate() {
        walker.push(line.clone(), LineRole::FrontMatter, idx);
    }
    let mut idx = start;
    while idx < lines.len() {
        idx = walker.step(lines, idx);
    }
    Pass {
        lines: walker.out,
        notices: walker.notices,
    }
}

/// Reflow table runs again after link rewriting changed cell widths.
fn realign_tables(lines: &mut [EmittedLine]) {
    let mut start = 0;
    while start < lines.len() {
        if lines[start].role != LineRole::Table {
            start += 1;
            continue;
        }
        let end = start
            + lines[start..]
                .iter()
                .take_while(|l| l.role == LineRole::Table)
                .count();
        let run: Vec<String> = lines[start..end].iter().map(|l| l.text.clone()).collect();
        if let Ok(realigned) = try_reflow(&run)
            && realigned.len() == run.len()
        {
            for (line, text) in lines[start..end].iter_mut().zip(realigned) {
                line.text = text;
            }
        }
        start = end;
    }
}

/// Normalise a whole document.
///
/// ```
/// use mdfixup::{config::Config, process::normalize_document};
///
/// let input: Vec<String> = ["#Title", "3. one", "7. two"]
///     .into_iter()
///     .map(String::from)
///     .collect();
/// let out = normalize_document(&input, &Config::default());
/// assert_eq!(out.lines, vec!["# Title", "", "1. one", "2. two", ""]);
/// ```
#[must_use]
pub fn normalize_document(lines: &[String], config: &Config) -> Normalized {
    let Pass {
        lines: emitted,
        mut notices,
    } = structural_pass(lines, config);
    let links = convert_links(&emitted, config.link_mode, config.link_placement);
    notices.extend(links.notices);
    let mut emitted = links.lines;
    if config.enabled(Rule::TableFormat) {
        realign_tables(&mut emitted);
    }
    if config.enabled(Rule::Wrap) {
        emitted = wrap_lines(emitted, config.wrap_width);
    }

    let had_front_matter = emitted.first().is_some_and(|l| l.role == LineRole::FrontMatter);
    let mut out: Vec<String> = emitted.into_iter().map(|l| l.text).collect();
    // A leading rule must not read as front matter next time.
    if !had_front_matter && front_matter_len(&out).is_some() {
        out.insert(0, String::new());
    }
    if config.enabled(Rule::EndNewline) {
        while out.last().is_some_and(|l| l.trim().is_empty()) {
            out.pop();
        }
        if !out.is_empty() {
            out.push(String::new());
        }
    }
    Normalized { lines: out, notices }
}

/// Join output lines into file contents ending in a single newline.
#[must_use]
pub fn render(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    if lines.last().is_some_and(|l| !l.is_empty()) {
        text.push('\n');
    }
    text
}
