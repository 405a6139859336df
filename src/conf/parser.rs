use crate::conf::types::{ConfDocument, GLOBAL_STANZA, LoadedConf};
use crate::error::{Result, StanzaError};
use std::path::Path;

/// Controls how the reader treats duplicates and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseProfile {
	/// Reject duplicate stanzas and duplicate keys instead of combining them.
	pub strict_duplicates: bool,

	/// Keep whole-line comments on the stanza they belong to.
	pub keep_comments: bool,
}

impl ParseProfile {
	/// Duplicates are errors, comments dropped. Used for merge targets.
	pub const STRICT: ParseProfile = ParseProfile {
		strict_duplicates: true,
		keep_comments: false,
	};

	/// Duplicate stanzas are combined and duplicate keys overwrite. Used for inputs.
	pub const LENIENT: ParseProfile = ParseProfile {
		strict_duplicates: false,
		keep_comments: false,
	};

	pub fn with_comments(self, keep_comments: bool) -> Self {
		ParseProfile {
			keep_comments,
			..self
		}
	}
}

/// Parse a conf file from the given path.
pub fn parse_conf_file(path: &Path, profile: ParseProfile) -> Result<LoadedConf> {
	let content = std::fs::read_to_string(path).map_err(|source| StanzaError::SourceReadError {
		path: path.to_path_buf(),
		source,
	})?;

	let document = parse_conf_str(&content, path, profile)?;
	Ok(LoadedConf {
		document,
		path: path.to_path_buf(),
	})
}

/// Parse a conf document from a string (useful for testing).
///
/// `path` is only used for error reporting.
pub fn parse_conf_str(content: &str, path: &Path, profile: ParseProfile) -> Result<ConfDocument> {
	let mut document = ConfDocument::new();
	let mut current: Option<String> = None;
	let mut pending_comments: Vec<String> = Vec::new();

	let parse_error = |line: usize, message: String| StanzaError::SourceParseError {
		path: path.to_path_buf(),
		line,
		message,
	};

	for (index, raw) in content.lines().enumerate() {
		let line_no = index + 1;
		let line = raw.trim();

		if line.is_empty() {
			continue;
		}

		if line.starts_with('#') || line.starts_with(';') {
			if profile.keep_comments {
				pending_comments.push(line.to_string());
			}
			continue;
		}

		if line.starts_with('[') {
			let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) else {
				return Err(parse_error(
					line_no,
					format!("unterminated stanza header: {line}"),
				));
			};

			if profile.strict_duplicates && document.contains(name) {
				return Err(parse_error(line_no, format!("duplicate stanza [{name}]")));
			}

			// Comments ahead of the first header belong to the global stanza.
			if current.is_none() && !pending_comments.is_empty() {
				document
					.stanza_mut(GLOBAL_STANZA)
					.comments
					.append(&mut pending_comments);
			}

			let stanza = document.stanza_mut(name);
			stanza.comments.append(&mut pending_comments);
			current = Some(name.to_string());
			continue;
		}

		let Some((key, value)) = line.split_once('=') else {
			return Err(parse_error(
				line_no,
				format!("expected 'key = value', found: {line}"),
			));
		};
		let key = key.trim();
		if key.is_empty() {
			return Err(parse_error(line_no, "attribute name is empty".to_string()));
		}

		let stanza_name = current.as_deref().unwrap_or(GLOBAL_STANZA);
		let stanza = document.stanza_mut(stanza_name);
		stanza.comments.append(&mut pending_comments);

		if profile.strict_duplicates && stanza.attributes.contains_key(key) {
			let shown = if stanza_name.is_empty() {
				"global stanza".to_string()
			} else {
				format!("[{stanza_name}]")
			};
			return Err(parse_error(
				line_no,
				format!("duplicate key '{key}' in {shown}"),
			));
		}
		stanza.set(key, value.trim());
	}

	if !pending_comments.is_empty() {
		let stanza_name = current.as_deref().unwrap_or(GLOBAL_STANZA);
		document
			.stanza_mut(stanza_name)
			.comments
			.append(&mut pending_comments);
	}

	Ok(document)
}
