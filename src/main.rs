use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use stanza_cli::StanzaError;
use stanza_cli::conf::{ParseProfile, parse_conf_file};
use stanza_cli::filter::{
	FilterCriteria, OutputMode, StanzaFilter, filter_confs, render_filter_output,
};
use stanza_cli::matching::MatchMode;
use stanza_cli::merge::{MergeOptions, MergeOutcome, MergeTarget, merge_conf_files};
use stanza_cli::settings::{EffectiveSettings, load_effective_settings, user_settings_path};

/// Environment variable holding the log filter directive.
const LOG_ENV_VAR: &str = "STANZA_LOG";

const DEFAULT_LOG_FILTER: &str = "stanza=info,stanza_cli=info";

#[derive(Parser)]
#[command(name = "stanza")]
#[command(
	author,
	version,
	about = "Stanza-aware filter and layered merge tool for .conf files"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// A stanza-aware GREP tool for conf files
	Filter(FilterArgs),
	/// Merge two or more .conf files
	Merge(MergeArgs),
	/// Display effective settings with source annotations
	Settings,
}

#[derive(Args)]
struct FilterArgs {
	/// Input conf files
	#[arg(value_name = "CONF", required = true)]
	conf: Vec<PathBuf>,

	/// File where the filtered results are written. Defaults to standard out.
	#[arg(short = 'o', long, value_name = "FILE")]
	output: Option<PathBuf>,

	/// Preserve comments. Comments are discarded by default.
	#[arg(short = 'C', long, overrides_with = "no_comments")]
	comments: bool,

	/// Discard comments even when settings preserve them
	#[arg(long, overrides_with = "comments")]
	no_comments: bool,

	/// Pattern matching mode: string, regex, or wildcard (default: regex)
	#[arg(short = 'm', long = "match", value_name = "MODE")]
	match_mode: Option<String>,

	/// Ignore case when comparing or matching strings
	#[arg(short = 'i', long, overrides_with = "no_ignore_case")]
	ignore_case: bool,

	/// Match case even when settings enable ignore-case
	#[arg(long, overrides_with = "ignore_case")]
	no_ignore_case: bool,

	/// Invert match results, showing what does NOT match
	#[arg(short = 'v', long)]
	invert_match: bool,

	/// List files that match the given search criteria
	#[arg(short = 'l', long, conflicts_with = "count")]
	files_with_matches: bool,

	/// Count matching stanzas
	#[arg(short = 'c', long)]
	count: bool,

	/// Match any stanza whose name matches PATTERN (supports file://)
	#[arg(long, value_name = "PATTERN")]
	stanza: Vec<String>,

	/// Match any stanza that includes the ATTR attribute (supports file://)
	#[arg(long, value_name = "ATTR")]
	attr_present: Vec<String>,

	/// Match any stanza whose ATTR value matches PATTERN
	#[arg(long, num_args = 2, value_names = ["ATTR", "PATTERN"])]
	attr_eq: Vec<String>,
}

#[derive(Args)]
struct MergeArgs {
	/// Source conf files, lowest precedence first
	#[arg(value_name = "FILE", required = true)]
	conf: Vec<PathBuf>,

	/// Save the merged configuration to this file instead of standard out
	#[arg(short = 't', long, value_name = "FILE")]
	target: Option<PathBuf>,

	/// Show the changes that would be made to TARGET as a diff instead of writing it
	#[arg(short = 'D', long)]
	dry_run: bool,

	/// A banner or warning comment to add to the TARGET file
	#[arg(short = 'b', long, value_name = "TEXT")]
	banner: Option<String>,
}

fn main() -> ExitCode {
	init_tracing();

	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

/// Diagnostics go to stderr so stdout stays pipeable.
fn init_tracing() {
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(std::io::stderr().is_terminal())
				.with_target(false)
				.without_time(),
		)
		.init();
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let settings = load_effective_settings(&cwd).context("Failed to load settings")?;

	match cli.command {
		Commands::Filter(args) => handle_filter(args, &settings),
		Commands::Merge(args) => handle_merge(args, &settings),
		Commands::Settings => handle_settings(&settings),
	}
}

fn handle_filter(args: FilterArgs, settings: &EffectiveSettings) -> Result<ExitCode> {
	let mode = match args.match_mode {
		Some(ref name) => name
			.parse::<MatchMode>()
			.context("Invalid --match value")?,
		None => settings.match_mode,
	};
	let comments = flag_or_setting(args.comments, args.no_comments, settings.comments);

	let criteria = FilterCriteria {
		mode,
		ignore_case: flag_or_setting(args.ignore_case, args.no_ignore_case, settings.ignore_case),
		invert_match: args.invert_match,
		stanza_patterns: args.stanza,
		attr_present_patterns: args.attr_present,
		attr_eq_patterns: args
			.attr_eq
			.chunks_exact(2)
			.map(|pair| (pair[0].clone(), pair[1].clone()))
			.collect(),
	};

	// Patterns are compiled before any input is read.
	let filter = StanzaFilter::from_criteria(&criteria).context("Failed to prepare filters")?;
	let output_mode = OutputMode::from_flags(args.count, args.files_with_matches)?;

	let profile = ParseProfile::LENIENT.with_comments(comments);
	let inputs = args
		.conf
		.iter()
		.map(|path| parse_conf_file(path, profile))
		.collect::<stanza_cli::Result<Vec<_>>>()
		.context("Failed to read input")?;

	let results = filter_confs(&filter, &inputs);
	let rendered = render_filter_output(&results, output_mode);

	write_output(args.output.as_deref(), &rendered)?;
	Ok(ExitCode::SUCCESS)
}

/// Resolve an on/off flag pair, falling back to the settings value.
fn flag_or_setting(on: bool, off: bool, setting: bool) -> bool {
	match (on, off) {
		(true, _) => true,
		(_, true) => false,
		_ => setting,
	}
}

fn handle_merge(args: MergeArgs, settings: &EffectiveSettings) -> Result<ExitCode> {
	let target = match args.target {
		Some(path) => MergeTarget::File(path),
		None => MergeTarget::Stdout,
	};
	// An explicit empty --banner disables the banner from settings.
	let banner = args
		.banner
		.or_else(|| settings.banner.clone())
		.filter(|b| !b.trim().is_empty());
	let options = MergeOptions {
		dry_run: args.dry_run,
		banner,
	};

	let outcome =
		merge_conf_files(&target, &args.conf, &options).context("Failed to merge conf files")?;

	match outcome {
		MergeOutcome::Written { .. } => {}
		MergeOutcome::Preview { path, diff } => {
			if diff.is_empty() {
				tracing::info!(path = %path.display(), "No changes");
			} else {
				write_output(None, &diff)?;
			}
		}
		MergeOutcome::Rendered(text) => write_output(None, &text)?,
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_settings(settings: &EffectiveSettings) -> Result<ExitCode> {
	if settings.sources.is_empty() {
		println!("No settings files found; using defaults.");
	} else {
		println!("Settings files (in cascade order):");
		for path in &settings.sources {
			println!("  {}", path.display());
		}
	}
	println!();
	println!("filter.match: {}", settings.match_mode);
	println!("filter.ignore-case: {}", settings.ignore_case);
	println!("filter.comments: {}", settings.comments);
	match settings.banner {
		Some(ref banner) => println!("merge.banner: {banner}"),
		None => println!("merge.banner: (none)"),
	}

	if let Ok(user_path) = user_settings_path() {
		println!();
		println!("User settings path: {}", user_path.display());
	}

	Ok(ExitCode::SUCCESS)
}

/// Write primary output in one call, to `path` or standard out.
fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
	match path {
		Some(path) => {
			std::fs::write(path, content).map_err(|source| StanzaError::OutputWriteError {
				destination: path.display().to_string(),
				source,
			})?;
		}
		None => {
			let mut stdout = std::io::stdout().lock();
			stdout
				.write_all(content.as_bytes())
				.and_then(|()| stdout.flush())
				.map_err(|source| StanzaError::OutputWriteError {
					destination: "<stdout>".to_string(),
					source,
				})?;
		}
	}
	Ok(())
}
