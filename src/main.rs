use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use mdfixup::{
    config::{ConfigFile, DEFAULT_WRAP_WIDTH, init_config_file, user_config_path},
    io::{read_document, rewrite},
    normalize_text, render, Config, IndentUnit, LinkMode, LinkPlacement, Notice, Rule, RuleSet,
};
use rayon::prelude::*;

#[derive(Parser)]
#[command(version, about = "Normalise Markdown lists, tables and links")]
struct Cli {
    /// Rewrite files in place
    #[arg(long = "in-place", requires = "files")]
    in_place: bool,
    /// Wrap width in columns
    #[arg(long, value_name = "N")]
    width: Option<usize>,
    /// Comma separated rules to disable, or `all`
    #[arg(long, value_name = "RULES")]
    skip: Option<String>,
    /// Comma separated rules to enable
    #[arg(long, value_name = "RULES")]
    include: Option<String>,
    /// Link style for the whole document
    #[arg(long, value_enum)]
    links: Option<LinksArg>,
    /// Where reference definitions go
    #[arg(long = "links-at", value_enum)]
    links_at: Option<PlacementArg>,
    /// Spaces per nesting level of lists
    #[arg(long = "list-indent", value_enum)]
    list_indent: Option<IndentArg>,
    /// Configuration file to use instead of the discovered one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Write a default configuration file and exit
    #[arg(long = "init-config")]
    init_config: bool,
    /// Log each decision the normaliser makes
    #[arg(short, long)]
    verbose: bool,
    /// Markdown files to fix
    files: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LinksArg {
    Inline,
    Reference,
    Preserve,
}

impl From<LinksArg> for LinkMode {
    fn from(arg: LinksArg) -> Self {
        match arg {
            LinksArg::Inline => Self::Inline,
            LinksArg::Reference => Self::Reference,
            LinksArg::Preserve => Self::Preserve,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PlacementArg {
    End,
    Beginning,
}

impl From<PlacementArg> for LinkPlacement {
    fn from(arg: PlacementArg) -> Self {
        match arg {
            PlacementArg::End => Self::End,
            PlacementArg::Beginning => Self::Beginning,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum IndentArg {
    Auto,
    #[value(name = "2")]
    Two,
    #[value(name = "4")]
    Four,
}

impl From<IndentArg> for IndentUnit {
    fn from(arg: IndentArg) -> Self {
        match arg {
            IndentArg::Auto => Self::Auto,
            IndentArg::Two => Self::Two,
            IndentArg::Four => Self::Four,
        }
    }
}

/// Defaults, then the configuration file, then the command line.
fn resolve_config(cli: &Cli) -> anyhow::Result<(Config, bool)> {
    let file = match cli.config.clone().or_else(ConfigFile::discover) {
        Some(path) => {
            log::debug!("using configuration file {}", path.display());
            ConfigFile::load(&path)?
        }
        None => ConfigFile::default(),
    };
    let mut rules = file.rule_set()?;
    if let Some(skip) = &cli.skip {
        if skip.trim() == "all" {
            rules = RuleSet::none();
        } else {
            for rule in Rule::parse_list(skip)? {
                rules.disable(rule);
            }
        }
    }
    if let Some(include) = &cli.include {
        for rule in Rule::parse_list(include)? {
            rules.enable(rule);
        }
    }

    let width = cli.width.or(file.width).unwrap_or(DEFAULT_WRAP_WIDTH);
    let mut config = Config::from_rules(rules, width);
    if let Some(links) = cli.links {
        config.link_mode = links.into();
    }
    if let Some(at) = cli.links_at {
        config.link_placement = at.into();
    }
    if let Some(indent) = cli.list_indent {
        config.list_indent_unit = indent.into();
    }
    Ok((config, cli.in_place || file.in_place.unwrap_or(false)))
}

fn report(source: &str, notices: &[Notice]) {
    for notice in notices {
        log::warn!("{source}: {notice}");
    }
}

/// Either the rewritten text for stdout or nothing when written in place.
fn process_path(
    path: &Path,
    config: &Config,
    in_place: bool,
) -> anyhow::Result<(Option<String>, Vec<Notice>)> {
    if in_place {
        let notices = rewrite(path, config).context("in-place rewrite failed")?;
        return Ok((None, notices));
    }
    let text = read_document(path).context("cannot read document")?;
    let normalized = normalize_text(&text, config);
    Ok((Some(render(&normalized.lines)), normalized.notices))
}

fn init_config(cli: &Cli) -> anyhow::Result<()> {
    let path = cli
        .config
        .clone()
        .or_else(user_config_path)
        .context("cannot determine the configuration directory")?;
    init_config_file(&path)?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Entry point for the command-line tool.
///
/// With no files the document is read from standard input and the result
/// printed to standard output. Files are processed in parallel; output and
/// errors are reported in argument order, and one failing file does not stop
/// the others.
///
/// # Examples
///
/// ```sh
/// # Print the normalised document
/// mdfixup notes.md
///
/// # Fix files in place, leaving links alone
/// mdfixup --in-place --links preserve docs/*.md
///
/// # Normalise standard input
/// cat notes.md | mdfixup --skip wrap
/// ```
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    if cli.init_config {
        return init_config(&cli);
    }
    let (config, in_place) = resolve_config(&cli)?;

    if cli.files.is_empty() {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read standard input")?;
        let normalized = normalize_text(&input, &config);
        report("<stdin>", &normalized.notices);
        print!("{}", render(&normalized.lines));
        return Ok(());
    }

    let results: Vec<_> = cli
        .files
        .par_iter()
        .map(|path| process_path(path, &config, in_place))
        .collect();

    let mut failures = 0;
    for (path, result) in cli.files.iter().zip(results) {
        match result {
            Ok((text, notices)) => {
                report(&path.display().to_string(), &notices);
                if let Some(text) = text {
                    print!("{text}");
                }
            }
            Err(err) => {
                eprintln!("mdfixup: {err:#}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} file(s) could not be processed");
    }
    Ok(())
}
