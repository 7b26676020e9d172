use super::config_file::ConfigFile;
use super::help::{config_help, helpers_listing, keys_help, USAGE_EXAMPLES};
use crate::config::{
    parse_size, BinaryKind, Listing, QueryLanguage, SearchMode, SessionConfig, TellSource,
    DEFAULT_LINE_COUNT, DEFAULT_MAX_BYTES,
};
use crate::display::TerminalSurface;
use crate::error::{TsError, TsResult};
use crate::searchers::code_helpers::{expand_template, find_builtin, needs_query, normalize_name};
use crate::searchers::Strategy;
use crate::session::{self, Session};
use crate::tree::ItemTree;
use crate::tui::{Controller, SystemLauncher, TerminalKeys};
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use log::debug;
use std::env;
use std::path::PathBuf;

/// バンドル展開の入れ子上限
const MAX_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BinaryArg {
    Any,
    #[value(alias = "float", alias = "float32")]
    F32,
    #[value(alias = "uint32")]
    U32,
    #[value(alias = "i32", alias = "int32")]
    S32,
    #[value(alias = "uint16")]
    U16,
    #[value(alias = "i16", alias = "int16")]
    S16,
}

impl From<BinaryArg> for BinaryKind {
    fn from(arg: BinaryArg) -> Self {
        match arg {
            BinaryArg::Any => BinaryKind::Any,
            BinaryArg::F32 => BinaryKind::F32,
            BinaryArg::U32 => BinaryKind::U32,
            BinaryArg::S32 => BinaryKind::I32,
            BinaryArg::U16 => BinaryKind::U16,
            BinaryArg::S16 => BinaryKind::I16,
        }
    }
}

/// ts - interactive terminal content search
#[derive(Parser, Debug)]
#[command(name = "ts", author, version, about, long_about = None, after_help = USAGE_EXAMPLES)]
pub struct Cli {
    /// Roots to search followed by the query. Roots default to the current
    /// directory; the query is omitted when the helper needs none
    #[arg(value_name = "ROOT... QUERY")]
    pub args: Vec<String>,

    /// Recurse into subdirectories
    #[arg(short = 's', long)]
    pub recurse: bool,

    /// Case-sensitive matching
    #[arg(short = 'c', long)]
    pub case_sensitive: bool,

    /// Treat the query as a regular expression
    #[arg(short = 'r', long)]
    pub regex: bool,

    /// Binary search in 4-byte windows (`-b` or `-b=u32`)
    #[arg(
        short = 'b',
        long,
        value_name = "KIND",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "any"
    )]
    pub binary: Option<BinaryArg>,

    /// XPath query over XML documents (`//book/@id`)
    #[arg(short = 'x', long)]
    pub structured: bool,

    /// With -x: evaluate the query as a JSON path (`servers/*/port`, `**/host`)
    #[arg(long)]
    pub json: bool,

    /// Print matched text only, without pausing
    #[arg(short = 'm', long = "match")]
    pub match_only: bool,

    /// With --match: print each distinct match once
    #[arg(long)]
    pub unique: bool,

    /// With --match: append the file path to each match
    #[arg(long)]
    pub match_file: bool,

    /// List the files containing the query
    #[arg(short = 't', long)]
    pub names_only: bool,

    /// List per-file occurrence counts, highest first
    #[arg(short = 'T', long)]
    pub count: bool,

    /// List the files NOT containing the query
    #[arg(long)]
    pub not: bool,

    /// Only search files with these extensions (comma-separated or repeated)
    #[arg(short = 'o', long, value_name = "EXT", value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip files with these extensions
    #[arg(short = 'e', long, value_name = "EXT", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Skip files larger than this (`4096`, `512k`, `20m`)
    #[arg(long, value_name = "SIZE")]
    pub max_size: Option<String>,

    /// Number of lines shown around each hit
    #[arg(short = 'n', long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub lines: Option<u32>,

    /// Stop after this many hits
    #[arg(long, value_name = "N")]
    pub hit: Option<usize>,

    /// Show line numbers
    #[arg(short = 'l', long)]
    pub line_numbers: bool,

    /// Do not pause at hits
    #[arg(short = 'a', long)]
    pub auto: bool,

    /// Print every scanned path
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Wrap the query in double quotes
    #[arg(long = "str")]
    pub wrap_quotes: bool,

    /// Code helper or custom switch wrapping the query in a pattern
    #[arg(short = 'k', long, value_name = "NAME")]
    pub helper: Option<String>,

    /// Honour .gitignore and .ignore files
    #[arg(long)]
    pub git_ignore: bool,

    /// Config file to use instead of the one beside the executable
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Explain the config file format
    #[arg(long)]
    pub config_help: bool,

    /// Explain the keys available at each hit
    #[arg(long)]
    pub keys_help: bool,

    /// List built-in helpers and custom switches
    #[arg(long)]
    pub list_helpers: bool,
}

/// Roots and settings for one session
#[derive(Debug)]
pub struct Invocation {
    pub roots: Vec<PathBuf>,
    pub config: SessionConfig,
}

/// ヘルパー名からテンプレートを解決（カスタムスイッチ優先）
fn resolve_helper(name: &str, switches: &ConfigFile) -> TsResult<String> {
    if let Some(switch) = switches.find(name) {
        if !switch.is_bundle() {
            return Ok(switch.value.clone());
        }
    }
    find_builtin(name)
        .map(|helper| helper.template.to_string())
        .ok_or_else(|| TsError::UnknownHelper(name.to_string()))
}

/// `.CPP` → `cpp`
fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

impl Cli {
    pub fn into_invocation(self, switches: &ConfigFile) -> TsResult<Invocation> {
        let template = self
            .helper
            .as_deref()
            .map(|name| resolve_helper(name, switches))
            .transpose()?;
        let query_needed = template
            .as_deref()
            .map_or(true, needs_query);

        let mut positionals = self.args;
        let raw_query = if query_needed {
            positionals.pop().ok_or(TsError::MissingQuery)?
        } else {
            String::new()
        };
        let mut roots: Vec<PathBuf> = positionals.into_iter().map(PathBuf::from).collect();
        if roots.is_empty() {
            roots.push(PathBuf::from("."));
        }

        let mut query = raw_query.replace('`', "\"");
        if self.wrap_quotes {
            query = format!("\"{query}\"");
        }

        let pattern = match &template {
            Some(template) => Some(expand_template(template, &query)),
            None if self.regex => Some(query.clone()),
            None => None,
        };

        let listing = if self.not {
            Some(Listing::Not)
        } else if self.count {
            Some(Listing::Count)
        } else if self.names_only {
            Some(Listing::Names)
        } else {
            None
        };

        let mode = if let Some(kind) = self.binary {
            SearchMode::Binary(kind.into())
        } else if let Some(listing) = listing {
            let source = if self.structured {
                TellSource::Structured
            } else if let Some(pattern) = pattern {
                TellSource::Pattern(pattern)
            } else {
                TellSource::Literal
            };
            SearchMode::Tell { listing, source }
        } else if self.structured {
            SearchMode::Structured
        } else if self.match_only || self.unique || self.match_file {
            SearchMode::Match {
                pattern,
                unique: self.unique,
                show_file: self.match_file,
            }
        } else if let Some(pattern) = pattern {
            SearchMode::Regex { pattern }
        } else {
            SearchMode::Literal
        };

        let max_bytes = match self.max_size.as_deref() {
            Some(size) => parse_size(size)?,
            None => DEFAULT_MAX_BYTES,
        };

        let mut config = SessionConfig::new(mode, query);
        if self.json {
            config.query_language = QueryLanguage::JsonPath;
        }
        config.case_sensitive = self.case_sensitive;
        config.recurse = self.recurse;
        config.only_extensions = normalize_extensions(&self.only);
        config.excluded_extensions = normalize_extensions(&self.exclude);
        config.max_bytes = max_bytes;
        config.line_count = self.lines.map_or(DEFAULT_LINE_COUNT, |n| n as usize);
        config.hit_limit = self.hit.filter(|limit| *limit > 0);
        config.show_line_numbers = self.line_numbers;
        config.auto = self.auto;
        config.verbose = self.verbose;
        config.respect_ignore_files = self.git_ignore;

        Ok(Invocation { roots, config })
    }
}

/// `--config PATH` / `--config=PATH` を展開前に拾う
pub fn config_path_arg(raw: &[String]) -> Option<PathBuf> {
    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }
        if arg == "--config" {
            return iter.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

/// デフォルトフラグを先頭に挿入し、`--NAME` 形式のスイッチを展開する
pub fn expand_args(raw: &[String], switches: &ConfigFile) -> Vec<String> {
    let mut expanded = Vec::with_capacity(raw.len() + switches.defaults.len());
    let Some((program, rest)) = raw.split_first() else {
        return expanded;
    };
    expanded.push(program.clone());
    expand_into(&switches.defaults, switches, 0, &mut expanded);
    expand_into(rest, switches, 0, &mut expanded);
    expanded
}

fn expand_into(args: &[String], switches: &ConfigFile, depth: usize, out: &mut Vec<String>) {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            out.push(arg.clone());
            out.extend(iter.cloned());
            return;
        }
        let name = match arg.strip_prefix("--") {
            Some(name) if !name.is_empty() && !name.contains('=') => normalize_name(name),
            _ => {
                out.push(arg.clone());
                continue;
            }
        };

        if let Some(switch) = switches.find(&name) {
            if switch.is_bundle() {
                if depth < MAX_EXPANSION_DEPTH {
                    expand_into(&switch.bundle_args(), switches, depth + 1, out);
                } else {
                    log::warn!("Switch bundle --{} nests too deeply; ignored", name);
                }
            } else {
                out.push("--helper".to_string());
                out.push(name);
            }
        } else if find_builtin(&name).is_some() {
            out.push("--helper".to_string());
            out.push(name);
        } else {
            out.push(arg.clone());
        }
    }
}

fn load_switches(raw: &[String]) -> Result<ConfigFile> {
    match config_path_arg(raw) {
        Some(path) => ConfigFile::load(&path)
            .with_context(|| format!("Failed to load config file {}", path.display())),
        None => ConfigFile::load_default().context("Failed to load ts.cfg"),
    }
}

/// CLI実行エントリーポイント
pub fn run_cli() -> Result<()> {
    let raw: Vec<String> = env::args().collect();
    let switches = load_switches(&raw)?;
    let args = expand_args(&raw, &switches);
    debug!("Expanded arguments: {:?}", args);

    let cli = Cli::parse_from(args);

    if cli.config_help {
        println!("{}", config_help());
        return Ok(());
    }
    if cli.keys_help {
        println!("{}", keys_help());
        return Ok(());
    }
    if cli.list_helpers {
        print!("{}", helpers_listing(&switches));
        return Ok(());
    }
    if cli.args.is_empty() && cli.helper.is_none() {
        Cli::command().print_help().context("Failed to print help")?;
        return Ok(());
    }

    let invocation = cli
        .into_invocation(&switches)
        .context("Invalid arguments")?;
    let config = &invocation.config;
    let mut strategy = Strategy::from_config(config).context("Invalid search parameters")?;
    debug!("Mode: {:?}, roots: {:?}", config.mode, invocation.roots);

    let mut tree = ItemTree::build(&invocation.roots, config);
    debug!("Collected {} documents", tree.document_count());

    let mut surface = TerminalSurface::new();
    let controller = Controller::new(TerminalKeys, SystemLauncher::from_env());
    let mut session = Session::new(config, &mut surface, controller);
    session::run(&mut tree, &mut strategy, &mut session).context("Search session failed")?;

    Ok(())
}
