//! Stanza - a stanza-aware filter and layered merge tool for `.conf` files.
//!
//! This library provides the core functionality for stanza, including:
//! - An ordered conf document model with a small reader and writer
//! - Pattern matching in string, regex, and wildcard modes
//! - Stanza selection by name, attribute presence, and attribute value
//! - Layered merging with later-wins precedence and dry-run diffs
//! - Optional `.stanza.toml` defaults discovered by directory cascade
//!
//! # Example
//!
//! ```no_run
//! use stanza_cli::conf::{ParseProfile, parse_conf_file, render_conf};
//! use stanza_cli::filter::{FilterCriteria, StanzaFilter};
//! use stanza_cli::matching::MatchMode;
//! use std::path::Path;
//!
//! let loaded = parse_conf_file(Path::new("savedsearches.conf"), ParseProfile::LENIENT).unwrap();
//! let filter = StanzaFilter::from_criteria(&FilterCriteria {
//!     mode: MatchMode::Wildcard,
//!     stanza_patterns: vec!["my_*".to_string()],
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let kept = filter.filter_document(&loaded.document);
//! print!("{}", render_conf(&kept, None));
//! ```

pub mod conf;
pub mod error;
pub mod filter;
pub mod matching;
pub mod merge;
pub mod settings;

pub use error::{Result, StanzaError};
