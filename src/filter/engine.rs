use crate::conf::{ConfDocument, LoadedConf, Stanza, render_conf};
use crate::error::{Result, StanzaError};
use crate::matching::{MatchMode, PatternMatcher};
use std::path::PathBuf;

/// User-supplied selection criteria, before any pattern is compiled.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
	pub mode: MatchMode,
	pub ignore_case: bool,
	pub invert_match: bool,

	/// Patterns for stanza names. `file://` references are expanded.
	pub stanza_patterns: Vec<String>,

	/// Patterns for attribute names that must be present.
	pub attr_present_patterns: Vec<String>,

	/// `(attribute, value pattern)` pairs.
	pub attr_eq_patterns: Vec<(String, String)>,
}

/// Keep stanzas that carry `attribute` with a value matching `matcher`.
#[derive(Debug)]
pub struct AttributeValueRule {
	pub attribute: String,
	pub matcher: PatternMatcher,
}

impl AttributeValueRule {
	pub fn matches(&self, stanza: &Stanza) -> bool {
		stanza
			.get(&self.attribute)
			.is_some_and(|value| self.matcher.matches(value))
	}
}

/// Per-stanza inclusion predicate.
#[derive(Debug)]
pub struct StanzaFilter {
	stanza_matcher: PatternMatcher,
	attr_present_matcher: PatternMatcher,
	value_rules: Vec<AttributeValueRule>,
	invert_match: bool,
}

impl StanzaFilter {
	pub fn new(
		stanza_matcher: PatternMatcher,
		attr_present_matcher: PatternMatcher,
		invert_match: bool,
	) -> Self {
		StanzaFilter {
			stanza_matcher,
			attr_present_matcher,
			value_rules: Vec::new(),
			invert_match,
		}
	}

	/// Add an attribute value rule.
	pub fn with_value_rule(mut self, rule: AttributeValueRule) -> Self {
		self.value_rules.push(rule);
		self
	}

	/// Build the matchers for `criteria`, loading any pattern files.
	pub fn from_criteria(criteria: &FilterCriteria) -> Result<Self> {
		let mut stanza_matcher = PatternMatcher::new(criteria.mode, criteria.ignore_case);
		stanza_matcher.feed_all(&criteria.stanza_patterns)?;

		let mut attr_present_matcher = PatternMatcher::new(criteria.mode, criteria.ignore_case);
		attr_present_matcher.feed_all(&criteria.attr_present_patterns)?;

		let mut filter = StanzaFilter::new(
			stanza_matcher,
			attr_present_matcher,
			criteria.invert_match,
		);

		for (attribute, pattern) in &criteria.attr_eq_patterns {
			let mut matcher = PatternMatcher::new(criteria.mode, criteria.ignore_case);
			matcher.feed(pattern)?;
			filter = filter.with_value_rule(AttributeValueRule {
				attribute: attribute.clone(),
				matcher,
			});
		}

		Ok(filter)
	}

	fn has_attribute_rules(&self) -> bool {
		self.attr_present_matcher.has_rules() || !self.value_rules.is_empty()
	}

	/// Selection test, ignoring the invert flag.
	pub fn test(&self, name: &str, stanza: &Stanza) -> bool {
		if !self.stanza_matcher.matches(name) {
			return false;
		}

		// No attribute level filters: keep, which also preserves empty stanzas.
		if !self.has_attribute_rules() {
			return true;
		}

		if self.attr_present_matcher.has_rules()
			&& stanza
				.attribute_names()
				.any(|attr| self.attr_present_matcher.matches(attr))
		{
			return true;
		}

		self.value_rules.iter().any(|rule| rule.matches(stanza))
	}

	/// Final keep decision, with the invert flag applied.
	pub fn keep(&self, name: &str, stanza: &Stanza) -> bool {
		self.test(name, stanza) ^ self.invert_match
	}

	/// Retained stanzas of `document`, in their original order.
	pub fn filter_document(&self, document: &ConfDocument) -> ConfDocument {
		document
			.iter()
			.filter(|(name, stanza)| self.keep(name, stanza))
			.map(|(name, stanza)| (name.to_string(), stanza.clone()))
			.collect()
	}
}

/// What a filter run prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
	/// The retained stanzas as conf text.
	#[default]
	Stanzas,

	/// Number of retained stanzas.
	Count,

	/// Paths of inputs with at least one retained stanza.
	FilesWithMatches,
}

impl OutputMode {
	/// Resolve the output mode from the two alternate-mode flags.
	pub fn from_flags(count: bool, files_with_matches: bool) -> Result<Self> {
		match (count, files_with_matches) {
			(true, true) => Err(StanzaError::MutuallyExclusive {
				option1: "--count".to_string(),
				option2: "--files-with-matches".to_string(),
			}),
			(true, false) => Ok(OutputMode::Count),
			(false, true) => Ok(OutputMode::FilesWithMatches),
			(false, false) => Ok(OutputMode::Stanzas),
		}
	}
}

/// Filter result for one input.
#[derive(Debug, Clone)]
pub struct FilteredConf {
	pub path: PathBuf,
	pub document: ConfDocument,
}

/// Apply `filter` to every input independently.
///
/// Stanza names repeated across inputs are not deduplicated.
pub fn filter_confs(filter: &StanzaFilter, inputs: &[LoadedConf]) -> Vec<FilteredConf> {
	inputs
		.iter()
		.map(|loaded| {
			let document = filter.filter_document(&loaded.document);
			tracing::debug!(
				path = %loaded.path.display(),
				kept = document.len(),
				total = loaded.document.len(),
				"Filtered conf"
			);
			FilteredConf {
				path: loaded.path.clone(),
				document,
			}
		})
		.collect()
}

/// Render filter results for the primary output.
pub fn render_filter_output(results: &[FilteredConf], mode: OutputMode) -> String {
	let multiple = results.len() > 1;
	let mut out = String::new();

	match mode {
		OutputMode::Stanzas => {
			let mut first = true;
			for result in results.iter().filter(|r| !r.document.is_empty()) {
				if !first {
					out.push('\n');
				}
				first = false;
				if multiple {
					out.push_str(&format!("# {}\n", result.path.display()));
				}
				out.push_str(&render_conf(&result.document, None));
			}
		}
		OutputMode::Count => {
			for result in results {
				if multiple {
					out.push_str(&format!("{}:{}\n", result.path.display(), result.document.len()));
				} else {
					out.push_str(&format!("{}\n", result.document.len()));
				}
			}
		}
		OutputMode::FilesWithMatches => {
			for result in results.iter().filter(|r| !r.document.is_empty()) {
				out.push_str(&format!("{}\n", result.path.display()));
			}
		}
	}

	out
}
