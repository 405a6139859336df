use std::path::PathBuf;

/// Library-level structured errors for stanza.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum StanzaError {
	#[error("Invalid configuration: {message}")]
	ConfigurationError { message: String },

	#[error("Mutually exclusive options: {option1} and {option2}")]
	MutuallyExclusive { option1: String, option2: String },

	#[error("Invalid regex pattern {pattern:?} (from {origin})")]
	InvalidRegex {
		pattern: String,
		origin: String,
		#[source]
		source: regex::Error,
	},

	#[error("Invalid wildcard pattern {pattern:?} (from {origin})")]
	InvalidGlob {
		pattern: String,
		origin: String,
		#[source]
		source: glob::PatternError,
	},

	#[error("Failed to read pattern file: {path}")]
	PatternFileError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to read source file: {path}")]
	SourceReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse {path} at line {line}: {message}")]
	SourceParseError {
		path: PathBuf,
		line: usize,
		message: String,
	},

	#[error("Failed to read target file: {path}")]
	TargetReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse target file {path} at line {line}: {message}")]
	TargetParseError {
		path: PathBuf,
		line: usize,
		message: String,
	},

	#[error("Target file is not writable: {path}")]
	TargetWriteError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write output: {destination}")]
	OutputWriteError {
		destination: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to read settings file: {path}")]
	SettingsReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse settings file: {path}")]
	SettingsParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using StanzaError.
pub type Result<T> = std::result::Result<T, StanzaError>;
