use crate::conf::{ConfDocument, ParseProfile, parse_conf_file, parse_conf_str, render_conf};
use crate::error::{Result, StanzaError};
use crate::merge::diff::unified_diff;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Where the merged document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeTarget {
	/// Print the merged document on standard output.
	Stdout,

	/// Replace the contents of this file.
	File(PathBuf),
}

/// Options for a merge run.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
	/// Show a diff of the change instead of writing the target.
	pub dry_run: bool,

	/// Comment block placed once at the top of the written file.
	pub banner: Option<String>,
}

/// What a merge run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
	/// The target file was replaced.
	Written { path: PathBuf, stanzas: usize },

	/// Dry run against a file target: unified diff (empty when nothing changes).
	Preview { path: PathBuf, diff: String },

	/// Rendered document destined for standard output.
	Rendered(String),
}

/// Fold `source` into `accumulator`.
///
/// New stanzas are appended in source order. For an existing stanza, each
/// source attribute overrides the value in place, and new attributes are
/// appended.
pub fn merge_into(accumulator: &mut ConfDocument, source: &ConfDocument) {
	for (name, stanza) in source.iter() {
		if !accumulator.contains(name) {
			accumulator.insert(name, stanza.clone());
			continue;
		}

		let existing = accumulator.stanza_mut(name);
		for (key, value) in &stanza.attributes {
			existing.set(key.as_str(), value.as_str());
		}
	}
}

/// Merge `sources` in order on top of `base`. Later sources win.
pub fn merge_documents<'a, I>(base: ConfDocument, sources: I) -> ConfDocument
where
	I: IntoIterator<Item = &'a ConfDocument>,
{
	sources.into_iter().fold(base, |mut accumulator, source| {
		merge_into(&mut accumulator, source);
		accumulator
	})
}

/// Fail early if an existing target cannot be opened for writing.
fn check_target_writable(path: &Path) -> Result<()> {
	if !path.exists() {
		return Ok(());
	}

	OpenOptions::new()
		.write(true)
		.open(path)
		.map(|_| ())
		.map_err(|source| StanzaError::TargetWriteError {
			path: path.to_path_buf(),
			source,
		})
}

/// Current target text, or `None` when the target does not exist yet.
fn read_target(path: &Path) -> Result<Option<String>> {
	if !path.exists() {
		return Ok(None);
	}

	std::fs::read_to_string(path)
		.map(Some)
		.map_err(|source| StanzaError::TargetReadError {
			path: path.to_path_buf(),
			source,
		})
}

/// Parse existing target text. Failures are reported against the target.
fn parse_target(text: &str, path: &Path) -> Result<ConfDocument> {
	parse_conf_str(text, path, ParseProfile::STRICT).map_err(|err| match err {
		StanzaError::SourceParseError {
			path,
			line,
			message,
		} => StanzaError::TargetParseError {
			path,
			line,
			message,
		},
		other => other,
	})
}

/// Merge the conf files at `sources` into `target`.
///
/// Every source is read and parsed before anything is merged, so a bad source
/// leaves the target untouched. The result is rendered once and written in a
/// single call, replacing the whole target.
pub fn merge_conf_files(
	target: &MergeTarget,
	sources: &[PathBuf],
	options: &MergeOptions,
) -> Result<MergeOutcome> {
	if let MergeTarget::File(path) = target
		&& !options.dry_run
	{
		check_target_writable(path)?;
	}

	let loaded = sources
		.iter()
		.map(|path| parse_conf_file(path, ParseProfile::LENIENT))
		.collect::<Result<Vec<_>>>()?;

	let (base, current_text) = match target {
		MergeTarget::File(path) => match read_target(path)? {
			Some(text) => (parse_target(&text, path)?, Some(text)),
			None => (ConfDocument::new(), None),
		},
		MergeTarget::Stdout => (ConfDocument::new(), None),
	};

	for source in &loaded {
		tracing::debug!(
			path = %source.path.display(),
			stanzas = source.document.len(),
			"Merging source"
		);
	}
	let merged = merge_documents(base, loaded.iter().map(|l| &l.document));
	let rendered = render_conf(&merged, options.banner.as_deref());

	let MergeTarget::File(path) = target else {
		return Ok(MergeOutcome::Rendered(rendered));
	};

	if options.dry_run {
		let label = path.display().to_string();
		let diff = unified_diff(
			current_text.as_deref().unwrap_or(""),
			&rendered,
			&format!("{label} (current)"),
			&format!("{label} (merged)"),
		);
		return Ok(MergeOutcome::Preview {
			path: path.clone(),
			diff,
		});
	}

	std::fs::write(path, rendered).map_err(|source| StanzaError::TargetWriteError {
		path: path.clone(),
		source,
	})?;
	tracing::info!(path = %path.display(), stanzas = merged.len(), "Wrote merged conf");

	Ok(MergeOutcome::Written {
		path: path.clone(),
		stanzas: merged.len(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::conf::Stanza;
	use std::fs;

	fn doc(stanzas: Vec<(&str, Vec<(&str, &str)>)>) -> ConfDocument {
		stanzas
			.into_iter()
			.map(|(name, pairs)| (name.to_string(), Stanza::from_pairs(pairs)))
			.collect()
	}

	fn pairs(stanza: &Stanza) -> Vec<(&str, &str)> {
		stanza
			.attributes
			.iter()
			.map(|(k, v)| (k.as_str(), v.as_str()))
			.collect()
	}

	#[test]
	fn test_attribute_precedence_and_order() {
		let a = doc(vec![("s", vec![("k", "1")])]);
		let b = doc(vec![("s", vec![("k", "2"), ("j", "3")])]);

		let merged = merge_documents(ConfDocument::new(), [&a, &b]);
		assert_eq!(pairs(merged.get("s").unwrap()), vec![("k", "2"), ("j", "3")]);
	}

	#[test]
	fn test_override_keeps_position() {
		let a = doc(vec![("s", vec![("x", "1"), ("y", "1"), ("z", "1")])]);
		let b = doc(vec![("s", vec![("w", "2"), ("y", "2")])]);

		let merged = merge_documents(ConfDocument::new(), [&a, &b]);
		assert_eq!(
			pairs(merged.get("s").unwrap()),
			vec![("x", "1"), ("y", "2"), ("z", "1"), ("w", "2")]
		);
	}

	#[test]
	fn test_new_stanzas_append_in_first_introduction_order() {
		let a = doc(vec![("one", vec![]), ("two", vec![])]);
		let b = doc(vec![("three", vec![]), ("one", vec![("k", "v")]), ("four", vec![])]);

		let merged = merge_documents(ConfDocument::new(), [&a, &b]);
		assert_eq!(
			merged.names().collect::<Vec<_>>(),
			vec!["one", "two", "three", "four"]
		);
	}

	#[test]
	fn test_merge_is_associative() {
		let a = doc(vec![("s", vec![("k", "1")]), ("t", vec![("a", "1")])]);
		let b = doc(vec![("s", vec![("k", "2"), ("j", "3")])]);
		let c = doc(vec![("u", vec![("n", "1")]), ("s", vec![("j", "4"), ("m", "5")])]);

		let all_at_once = merge_documents(ConfDocument::new(), [&a, &b, &c]);
		let partial = merge_documents(ConfDocument::new(), [&a, &b]);
		let stepwise = merge_documents(partial, [&c]);

		assert_eq!(all_at_once, stepwise);
	}

	#[test]
	fn test_sources_are_not_mutated() {
		let a = doc(vec![("s", vec![("k", "1")])]);
		let b = doc(vec![("s", vec![("k", "2")])]);
		let before = (a.clone(), b.clone());

		let _ = merge_documents(ConfDocument::new(), [&a, &b]);
		assert_eq!((a, b), before);
	}

	#[test]
	fn test_merge_starts_from_base() {
		let base = doc(vec![("existing", vec![("keep", "me")]), ("s", vec![("k", "0")])]);
		let a = doc(vec![("s", vec![("k", "1")])]);

		let merged = merge_documents(base, [&a]);
		assert_eq!(merged.names().collect::<Vec<_>>(), vec!["existing", "s"]);
		assert_eq!(merged.get("s").unwrap().get("k"), Some("1"));
	}

	fn write_sources(dir: &Path) -> Vec<PathBuf> {
		let first = dir.join("default.conf");
		let second = dir.join("local.conf");
		fs::write(&first, "[s]\nk = 1\n\n[only_default]\nx = y\n").unwrap();
		fs::write(&second, "[s]\nk = 2\nj = 3\n").unwrap();
		vec![first, second]
	}

	#[test]
	fn test_merge_files_to_stdout() {
		let temp_dir = tempfile::tempdir().unwrap();
		let sources = write_sources(temp_dir.path());

		let outcome =
			merge_conf_files(&MergeTarget::Stdout, &sources, &MergeOptions::default()).unwrap();
		assert_eq!(
			outcome,
			MergeOutcome::Rendered("[s]\nk = 2\nj = 3\n\n[only_default]\nx = y\n".to_string())
		);
	}

	#[test]
	fn test_merge_files_writes_target_with_banner_once() {
		let temp_dir = tempfile::tempdir().unwrap();
		let sources = write_sources(temp_dir.path());
		let target_path = temp_dir.path().join("merged.conf");
		let target = MergeTarget::File(target_path.clone());
		let options = MergeOptions {
			dry_run: false,
			banner: Some("Generated file, do not edit".to_string()),
		};

		// Second run reads the first run's output back in as the base.
		merge_conf_files(&target, &sources, &options).unwrap();
		let outcome = merge_conf_files(&target, &sources, &options).unwrap();
		assert_eq!(
			outcome,
			MergeOutcome::Written {
				path: target_path.clone(),
				stanzas: 2
			}
		);

		let content = fs::read_to_string(&target_path).unwrap();
		assert!(content.starts_with("# Generated file, do not edit\n\n[s]\n"));
		assert_eq!(content.matches("Generated file").count(), 1);
	}

	#[test]
	fn test_dry_run_leaves_target_untouched() {
		let temp_dir = tempfile::tempdir().unwrap();
		let sources = write_sources(temp_dir.path());
		let target_path = temp_dir.path().join("merged.conf");
		let original = "[s]\nk = 0\nold = yes\n";
		fs::write(&target_path, original).unwrap();

		let outcome = merge_conf_files(
			&MergeTarget::File(target_path.clone()),
			&sources,
			&MergeOptions {
				dry_run: true,
				banner: None,
			},
		)
		.unwrap();

		let MergeOutcome::Preview { diff, .. } = &outcome else {
			panic!("Expected a preview, got {outcome:?}");
		};
		assert!(diff.contains("-k = 0\n"));
		assert!(diff.contains("+k = 2\n"));
		assert!(diff.contains("+[only_default]\n"));
		assert_eq!(fs::read_to_string(&target_path).unwrap(), original);
	}

	#[test]
	fn test_dry_run_missing_target_is_not_created() {
		let temp_dir = tempfile::tempdir().unwrap();
		let sources = write_sources(temp_dir.path());
		let target_path = temp_dir.path().join("new.conf");

		let outcome = merge_conf_files(
			&MergeTarget::File(target_path.clone()),
			&sources,
			&MergeOptions {
				dry_run: true,
				banner: None,
			},
		)
		.unwrap();

		assert!(matches!(outcome, MergeOutcome::Preview { ref diff, .. } if diff.contains("+[s]")));
		assert!(!target_path.exists());
	}

	#[test]
	fn test_missing_source_fails_before_write() {
		let temp_dir = tempfile::tempdir().unwrap();
		let mut sources = write_sources(temp_dir.path());
		sources.push(temp_dir.path().join("missing.conf"));
		let target_path = temp_dir.path().join("merged.conf");
		fs::write(&target_path, "[keep]\na = b\n").unwrap();

		let result = merge_conf_files(
			&MergeTarget::File(target_path.clone()),
			&sources,
			&MergeOptions::default(),
		);

		assert!(matches!(result, Err(StanzaError::SourceReadError { .. })));
		assert_eq!(fs::read_to_string(&target_path).unwrap(), "[keep]\na = b\n");
	}

	#[test]
	fn test_unparsable_source_fails() {
		let temp_dir = tempfile::tempdir().unwrap();
		let bad = temp_dir.path().join("bad.conf");
		fs::write(&bad, "[s]\nnot a key value line\n").unwrap();

		let result = merge_conf_files(&MergeTarget::Stdout, &[bad], &MergeOptions::default());
		assert!(matches!(
			result,
			Err(StanzaError::SourceParseError { line: 2, .. })
		));
	}

	#[test]
	fn test_unwritable_target() {
		let temp_dir = tempfile::tempdir().unwrap();
		let sources = write_sources(temp_dir.path());
		// A directory can never be opened for writing, even by root.
		let target_path = temp_dir.path().join("target.d");
		fs::create_dir(&target_path).unwrap();

		let result = merge_conf_files(
			&MergeTarget::File(target_path),
			&sources,
			&MergeOptions::default(),
		);
		assert!(matches!(result, Err(StanzaError::TargetWriteError { .. })));
	}

	#[test]
	fn test_strict_target_rejects_duplicates() {
		let temp_dir = tempfile::tempdir().unwrap();
		let sources = write_sources(temp_dir.path());
		let target_path = temp_dir.path().join("merged.conf");
		let original = "[s]\nk = 1\nk = 2\n";
		fs::write(&target_path, original).unwrap();

		let result = merge_conf_files(
			&MergeTarget::File(target_path.clone()),
			&sources,
			&MergeOptions::default(),
		);
		match result.unwrap_err() {
			StanzaError::TargetParseError { path, line, message } => {
				assert_eq!(path, target_path);
				assert_eq!(line, 3);
				assert!(message.contains("duplicate key 'k'"));
			}
			other => panic!("Expected TargetParseError, got {other:?}"),
		}
		assert_eq!(fs::read_to_string(&target_path).unwrap(), original);
	}

	#[test]
	fn test_unparsable_target_dry_run() {
		let temp_dir = tempfile::tempdir().unwrap();
		let sources = write_sources(temp_dir.path());
		let target_path = temp_dir.path().join("merged.conf");
		fs::write(&target_path, "[s
").unwrap();

		let result = merge_conf_files(
			&MergeTarget::File(target_path.clone()),
			&sources,
			&MergeOptions {
				dry_run: true,
				banner: None,
			},
		);
		assert!(matches!(
			result,
			Err(StanzaError::TargetParseError { line: 1, .. })
		));
	}
}
