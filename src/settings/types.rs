use crate::error::{Result, StanzaError};
use crate::matching::MatchMode;
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level settings from a `.stanza.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
	/// If true, stop the directory cascade and jump directly to ~/.stanza.toml.
	#[serde(default)]
	pub root: bool,

	/// Defaults for `stanza filter`.
	#[serde(default)]
	pub filter: FilterSettings,

	/// Defaults for `stanza merge`.
	#[serde(default)]
	pub merge: MergeSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FilterSettings {
	/// Default matching mode: "string", "regex" or "wildcard".
	#[serde(rename = "match")]
	pub match_mode: Option<String>,

	pub ignore_case: Option<bool>,

	/// Preserve comments in filter output.
	pub comments: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MergeSettings {
	/// Banner written at the top of every merge target.
	pub banner: Option<String>,
}

/// Settings with the path they were loaded from.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
	pub settings: Settings,
	pub path: PathBuf,
}

/// Effective settings after the cascade, nearest file first.
#[derive(Debug, Clone, Default)]
pub struct EffectiveSettings {
	pub match_mode: MatchMode,
	pub ignore_case: bool,
	pub comments: bool,
	pub banner: Option<String>,

	/// Files that contributed, in cascade order.
	pub sources: Vec<PathBuf>,
}

impl Settings {
	/// Check values that serde cannot validate on its own.
	pub fn validate(&self) -> Result<()> {
		if let Some(ref mode) = self.filter.match_mode {
			mode.parse::<MatchMode>()?;
		}
		if let Some(ref banner) = self.merge.banner
			&& banner.trim().is_empty()
		{
			return Err(StanzaError::ConfigurationError {
				message: "merge.banner must not be blank".to_string(),
			});
		}
		Ok(())
	}
}
