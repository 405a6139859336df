use crate::error::{Result, StanzaError};
use crate::settings::parser::parse_settings_file;
use crate::settings::types::{EffectiveSettings, LoadedSettings};
use std::path::{Path, PathBuf};

/// File name looked up in every directory of the cascade.
pub const SETTINGS_FILE_NAME: &str = ".stanza.toml";

/// Discover and load all settings files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.stanza.toml`
/// 2. If found and `root = true`, skip to user settings only
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check ~/.stanza.toml
///
/// Returns settings in cascade order (most specific first).
pub fn discover_settings(start_dir: &Path) -> Result<Vec<LoadedSettings>> {
	let home_dir = dirs::home_dir().ok_or(StanzaError::HomeDirectoryNotFound)?;
	discover_settings_with_home(start_dir, &home_dir)
}

fn discover_settings_with_home(start_dir: &Path, home_dir: &Path) -> Result<Vec<LoadedSettings>> {
	let mut found = Vec::new();
	let mut current_dir = Some(start_dir);

	while let Some(dir) = current_dir {
		let path = dir.join(SETTINGS_FILE_NAME);

		if path.is_file() {
			let settings = parse_settings_file(&path)?;
			let root = settings.root;
			found.push(LoadedSettings { settings, path });

			if root {
				break;
			}
		}

		current_dir = dir.parent();
	}

	let user_path = home_dir.join(SETTINGS_FILE_NAME);
	if user_path.is_file() && !found.iter().any(|loaded| loaded.path == user_path) {
		let settings = parse_settings_file(&user_path)?;
		found.push(LoadedSettings {
			settings,
			path: user_path,
		});
	}

	Ok(found)
}

/// Merge settings into effective values.
///
/// Each key takes the value from the first (nearest) file that sets it.
pub fn merge_settings(found: &[LoadedSettings]) -> Result<EffectiveSettings> {
	let mut effective = EffectiveSettings::default();

	let match_mode = found
		.iter()
		.find_map(|loaded| loaded.settings.filter.match_mode.as_deref());
	if let Some(mode) = match_mode {
		effective.match_mode = mode.parse()?;
	}

	effective.ignore_case = found
		.iter()
		.find_map(|loaded| loaded.settings.filter.ignore_case)
		.unwrap_or(false);
	effective.comments = found
		.iter()
		.find_map(|loaded| loaded.settings.filter.comments)
		.unwrap_or(false);
	effective.banner = found
		.iter()
		.find_map(|loaded| loaded.settings.merge.banner.clone());
	effective.sources = found.iter().map(|loaded| loaded.path.clone()).collect();

	Ok(effective)
}

/// Convenience function to discover, load, and merge settings from a directory.
pub fn load_effective_settings(start_dir: &Path) -> Result<EffectiveSettings> {
	let found = discover_settings(start_dir)?;
	let effective = merge_settings(&found)?;
	tracing::debug!(files = effective.sources.len(), "Loaded settings");
	Ok(effective)
}

/// Get the path to the user's settings file.
pub fn user_settings_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(StanzaError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(SETTINGS_FILE_NAME))
}
