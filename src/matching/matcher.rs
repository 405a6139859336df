use crate::error::{Result, StanzaError};
use regex::{Regex, RegexBuilder};
use std::cell::OnceCell;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Prefix that turns a pattern argument into a reference to a pattern file.
pub const FILE_PATTERN_PREFIX: &str = "file://";

const COMMAND_LINE_ORIGIN: &str = "command line";

/// How patterns are compared against candidate strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
	/// Exact string equality.
	String,

	/// Regular expression anchored at the start of the candidate.
	#[default]
	Regex,

	/// Shell-style glob (`*`, `?`, `[...]`) matching the whole candidate.
	Wildcard,
}

impl MatchMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			MatchMode::String => "string",
			MatchMode::Regex => "regex",
			MatchMode::Wildcard => "wildcard",
		}
	}
}

impl fmt::Display for MatchMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for MatchMode {
	type Err = StanzaError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"string" => Ok(MatchMode::String),
			"regex" => Ok(MatchMode::Regex),
			"wildcard" => Ok(MatchMode::Wildcard),
			other => Err(StanzaError::ConfigurationError {
				message: format!(
					"unknown matching mode {other:?} (expected string, regex, or wildcard)"
				),
			}),
		}
	}
}

/// Compiled form of the fed patterns, one variant per mode.
#[derive(Debug)]
enum Strategy {
	Exact,
	Regex(Vec<Regex>),
	Glob(Vec<glob::Pattern>),
}

/// A set of user patterns evaluated under one [`MatchMode`].
///
/// A matcher with no patterns accepts every candidate, so an absent filter
/// never suppresses anything.
#[derive(Debug)]
pub struct PatternMatcher {
	mode: MatchMode,
	ignore_case: bool,
	patterns: Vec<String>,
	strategy: Strategy,

	/// Lower-cased pattern set for case-insensitive string mode, built on first use.
	folded: OnceCell<HashSet<String>>,
}

impl PatternMatcher {
	pub fn new(mode: MatchMode, ignore_case: bool) -> Self {
		let strategy = match mode {
			MatchMode::String => Strategy::Exact,
			MatchMode::Regex => Strategy::Regex(Vec::new()),
			MatchMode::Wildcard => Strategy::Glob(Vec::new()),
		};
		PatternMatcher {
			mode,
			ignore_case,
			patterns: Vec::new(),
			strategy,
			folded: OnceCell::new(),
		}
	}

	/// Build a matcher from a mode name such as `"wildcard"`.
	pub fn from_mode_name(mode: &str, ignore_case: bool) -> Result<Self> {
		Ok(Self::new(mode.parse()?, ignore_case))
	}

	pub fn mode(&self) -> MatchMode {
		self.mode
	}

	pub fn ignore_case(&self) -> bool {
		self.ignore_case
	}

	/// The raw patterns in the order they were fed.
	pub fn patterns(&self) -> &[String] {
		&self.patterns
	}

	pub fn has_rules(&self) -> bool {
		!self.patterns.is_empty()
	}

	/// Add a pattern, or every pattern listed in a `file://<path>` reference.
	pub fn feed(&mut self, item: &str) -> Result<()> {
		match item.strip_prefix(FILE_PATTERN_PREFIX) {
			Some(path) => {
				let path = Path::new(path);
				let patterns = read_pattern_file(path)?;
				let origin = path.display().to_string();
				for pattern in patterns {
					self.push(pattern, &origin)?;
				}
				Ok(())
			}
			None => self.push(item.to_string(), COMMAND_LINE_ORIGIN),
		}
	}

	/// Feed several items in order.
	pub fn feed_all<I, S>(&mut self, items: I) -> Result<()>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		for item in items {
			self.feed(item.as_ref())?;
		}
		Ok(())
	}

	fn push(&mut self, pattern: String, origin: &str) -> Result<()> {
		match &mut self.strategy {
			Strategy::Exact => {}
			Strategy::Regex(compiled) => {
				compiled.push(compile_regex(&pattern, origin, self.ignore_case)?);
			}
			Strategy::Glob(compiled) => {
				compiled.push(compile_glob(&pattern, origin)?);
			}
		}
		self.patterns.push(pattern);
		// New patterns invalidate the folded view.
		self.folded = OnceCell::new();
		Ok(())
	}

	/// Check whether `candidate` satisfies any pattern.
	pub fn matches(&self, candidate: &str) -> bool {
		if self.patterns.is_empty() {
			return true;
		}

		match &self.strategy {
			Strategy::Exact => self.matches_exact(candidate),
			// Leftmost match starting at 0 means some match is anchored at the start.
			Strategy::Regex(compiled) => compiled
				.iter()
				.any(|re| re.find(candidate).is_some_and(|m| m.start() == 0)),
			Strategy::Glob(compiled) => {
				let options = glob::MatchOptions {
					case_sensitive: !self.ignore_case,
					require_literal_separator: false,
					require_literal_leading_dot: false,
				};
				compiled
					.iter()
					.any(|pattern| pattern.matches_with(candidate, options))
			}
		}
	}

	fn matches_exact(&self, candidate: &str) -> bool {
		if self.ignore_case {
			let folded = self
				.folded
				.get_or_init(|| self.patterns.iter().map(|p| p.to_lowercase()).collect());
			folded.contains(&candidate.to_lowercase())
		} else {
			self.patterns.iter().any(|p| p == candidate)
		}
	}
}

fn compile_regex(pattern: &str, origin: &str, ignore_case: bool) -> Result<Regex> {
	RegexBuilder::new(pattern)
		.case_insensitive(ignore_case)
		.build()
		.map_err(|source| StanzaError::InvalidRegex {
			pattern: pattern.to_string(),
			origin: origin.to_string(),
			source,
		})
}

fn compile_glob(pattern: &str, origin: &str) -> Result<glob::Pattern> {
	glob::Pattern::new(&shell_glob(pattern)).map_err(|source| StanzaError::InvalidGlob {
		pattern: pattern.to_string(),
		origin: origin.to_string(),
		source,
	})
}

/// Rewrite a shell glob into `glob::Pattern` syntax.
///
/// Runs of `*` collapse to one `*`, and a `[` without a closing `]` is a
/// literal bracket. Bracket classes are copied unchanged.
fn shell_glob(pattern: &str) -> String {
	let chars: Vec<char> = pattern.chars().collect();
	let mut out = String::with_capacity(pattern.len());
	let mut i = 0;

	while i < chars.len() {
		match chars[i] {
			'*' => {
				out.push('*');
				while chars.get(i + 1) == Some(&'*') {
					i += 1;
				}
			}
			'[' => match class_end(&chars, i) {
				Some(end) => {
					out.extend(&chars[i..=end]);
					i = end;
				}
				None => out.push_str(&glob::Pattern::escape("[")),
			},
			c => out.push(c),
		}
		i += 1;
	}

	out
}

/// Index of the `]` closing the class opened at `start`. A `]` right after
/// `[` or `[!` is a class member.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
	let mut j = start + 1;
	if chars.get(j) == Some(&'!') {
		j += 1;
	}
	if chars.get(j) == Some(&']') {
		j += 1;
	}
	(j..chars.len()).find(|&k| chars[k] == ']')
}

/// Read one pattern per line, skipping blank lines and `#` comments.
fn read_pattern_file(path: &Path) -> Result<Vec<String>> {
	let content = std::fs::read_to_string(path).map_err(|source| StanzaError::PatternFileError {
		path: path.to_path_buf(),
		source,
	})?;

	let patterns: Vec<String> = content
		.lines()
		.map(str::trim_end)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.map(str::to_string)
		.collect();

	tracing::info!(
		path = %path.display(),
		count = patterns.len(),
		"Loaded patterns from file"
	);

	Ok(patterns)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	fn matcher(mode: MatchMode, ignore_case: bool, patterns: &[&str]) -> PatternMatcher {
		let mut m = PatternMatcher::new(mode, ignore_case);
		m.feed_all(patterns).unwrap();
		m
	}

	#[test]
	fn test_mode_from_str() {
		assert_eq!("string".parse::<MatchMode>().unwrap(), MatchMode::String);
		assert_eq!("regex".parse::<MatchMode>().unwrap(), MatchMode::Regex);
		assert_eq!(
			"wildcard".parse::<MatchMode>().unwrap(),
			MatchMode::Wildcard
		);
	}

	#[test]
	fn test_unknown_mode_is_configuration_error() {
		let result = PatternMatcher::from_mode_name("fuzzy", false);
		match result.unwrap_err() {
			StanzaError::ConfigurationError { message } => assert!(message.contains("fuzzy")),
			other => panic!("Expected ConfigurationError, got {other:?}"),
		}
	}

	#[test]
	fn test_no_patterns_accepts_everything() {
		for mode in [MatchMode::String, MatchMode::Regex, MatchMode::Wildcard] {
			let m = PatternMatcher::new(mode, false);
			assert!(!m.has_rules());
			assert!(m.matches("anything"));
			assert!(m.matches(""));
		}
	}

	#[test]
	fn test_string_mode_exact() {
		let m = matcher(MatchMode::String, false, &["my_search"]);
		assert!(m.matches("my_search"));
		assert!(!m.matches("my_search2"));
		assert!(!m.matches("My_Search"));
	}

	#[test]
	fn test_string_mode_ignore_case() {
		let m = matcher(MatchMode::String, true, &["My_Search"]);
		assert!(m.matches("my_search"));
		assert!(m.matches("MY_SEARCH"));
		assert!(!m.matches("my_search2"));
		// Raw patterns are not rewritten by folding.
		assert_eq!(m.patterns(), ["My_Search"]);
	}

	#[test]
	fn test_string_fold_refreshed_after_feed() {
		let mut m = matcher(MatchMode::String, true, &["alpha"]);
		assert!(!m.matches("BETA"));
		m.feed("Beta").unwrap();
		assert!(m.matches("BETA"));
	}

	#[test]
	fn test_regex_anchored_at_start() {
		let m = matcher(MatchMode::Regex, false, &["foo"]);
		assert!(m.matches("foobar"));
		assert!(!m.matches("barfoo"));

		let m = matcher(MatchMode::Regex, false, &["^foo$"]);
		assert!(!m.matches("foobar"));
		assert!(m.matches("foo"));
	}

	#[test]
	fn test_regex_alternation_stays_anchored() {
		let m = matcher(MatchMode::Regex, false, &["a|b"]);
		assert!(m.matches("b_stanza"));
		assert!(!m.matches("xb"));
	}

	#[test]
	fn test_regex_ignore_case() {
		let m = matcher(MatchMode::Regex, true, &["error"]);
		assert!(m.matches("ERROR_alerts"));
	}

	#[test]
	fn test_regex_any_pattern() {
		let m = matcher(MatchMode::Regex, false, &["abc", "x.z"]);
		assert!(m.matches("xyz"));
		assert!(m.matches("abcdef"));
		assert!(!m.matches("zzz"));
	}

	#[test]
	fn test_invalid_regex_names_pattern() {
		let mut m = PatternMatcher::new(MatchMode::Regex, false);
		match m.feed("[invalid").unwrap_err() {
			StanzaError::InvalidRegex {
				pattern, origin, ..
			} => {
				assert_eq!(pattern, "[invalid");
				assert_eq!(origin, "command line");
			}
			other => panic!("Expected InvalidRegex error, got {other:?}"),
		}
		assert!(!m.has_rules());
	}

	#[test]
	fn test_wildcard_whole_candidate() {
		let m = matcher(MatchMode::Wildcard, false, &["*.conf"]);
		assert!(m.matches("props.conf"));
		assert!(!m.matches("props.conf.bak"));
	}

	#[test]
	fn test_wildcard_question_and_class() {
		let m = matcher(MatchMode::Wildcard, false, &["search_?", "[ab]lert"]);
		assert!(m.matches("search_1"));
		assert!(!m.matches("search_10"));
		assert!(m.matches("alert"));
		assert!(!m.matches("clert"));
	}

	#[test]
	fn test_wildcard_star_crosses_separators() {
		let m = matcher(MatchMode::Wildcard, false, &["source::*"]);
		assert!(m.matches("source::/var/log/messages"));
	}

	#[test]
	fn test_wildcard_case() {
		let m = matcher(MatchMode::Wildcard, false, &["my_*"]);
		assert!(!m.matches("MY_SEARCH"));

		let m = matcher(MatchMode::Wildcard, true, &["my_*"]);
		assert!(m.matches("MY_SEARCH"));
	}

	#[test]
	fn test_wildcard_double_star_acts_as_star() {
		let m = matcher(MatchMode::Wildcard, false, &["my_**", "a**b"]);
		assert!(m.matches("my_search"));
		assert!(m.matches("a_to_b"));
		assert!(!m.matches("other_search"));
		assert_eq!(m.patterns(), ["my_**", "a**b"]);
	}

	#[test]
	fn test_wildcard_unclosed_bracket_is_literal() {
		let m = matcher(MatchMode::Wildcard, false, &["[unclosed*"]);
		assert!(m.matches("[unclosed_stanza"));
		assert!(!m.matches("unclosed_stanza"));
	}

	#[test]
	fn test_wildcard_bracket_member_after_open() {
		let m = matcher(MatchMode::Wildcard, false, &["x[]a]", "y[!]]"]);
		assert!(m.matches("x]"));
		assert!(m.matches("xa"));
		assert!(m.matches("yb"));
		assert!(!m.matches("y]"));
	}

	#[test]
	fn test_shell_glob_rewrite() {
		assert_eq!(shell_glob("a***b*"), "a*b*");
		assert_eq!(shell_glob("[ab]*"), "[ab]*");
		assert_eq!(shell_glob("[x"), "[[]x");
		assert_eq!(shell_glob("[**]"), "[**]");
	}

	#[test]
	fn test_feed_from_file() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("patterns.txt");
		fs::write(
			&path,
			"# stanzas to keep\n\nsecond   \n\n#first\nfirst\n  indented\n",
		)
		.unwrap();

		let mut m = PatternMatcher::new(MatchMode::String, false);
		m.feed("zero").unwrap();
		m.feed(&format!("file://{}", path.display())).unwrap();

		assert_eq!(m.patterns(), ["zero", "second", "first", "  indented"]);
		assert!(m.matches("second"));
		assert!(!m.matches("#first"));
	}

	#[test]
	fn test_feed_from_missing_file() {
		let mut m = PatternMatcher::new(MatchMode::String, false);
		match m.feed("file:///nonexistent/patterns.txt").unwrap_err() {
			StanzaError::PatternFileError { path, .. } => {
				assert_eq!(path, Path::new("/nonexistent/patterns.txt"));
			}
			other => panic!("Expected PatternFileError, got {other:?}"),
		}
	}

	#[test]
	fn test_invalid_regex_in_file_reports_file() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("bad.txt");
		fs::write(&path, "good\n(bad\n").unwrap();

		let mut m = PatternMatcher::new(MatchMode::Regex, false);
		match m.feed(&format!("file://{}", path.display())).unwrap_err() {
			StanzaError::InvalidRegex {
				pattern, origin, ..
			} => {
				assert_eq!(pattern, "(bad");
				assert_eq!(origin, path.display().to_string());
			}
			other => panic!("Expected InvalidRegex error, got {other:?}"),
		}
	}
}
