//! Optional user defaults for stanza.
//!
//! This module handles:
//! - `.stanza.toml` parsing
//! - Directory cascade discovery
//! - Resolving effective defaults (nearest file wins)

pub mod cascade;
pub mod parser;
pub mod types;

pub use cascade::{
	SETTINGS_FILE_NAME, discover_settings, load_effective_settings, merge_settings,
	user_settings_path,
};
pub use parser::{parse_settings_file, parse_settings_str};
pub use types::{EffectiveSettings, FilterSettings, LoadedSettings, MergeSettings, Settings};
