//! Conf document model for stanza.
//!
//! This module handles:
//! - The ordered document/stanza model shared by the filter and merge engines
//! - A line-oriented reader with strict and lenient duplicate handling
//! - Rendering documents back to `[stanza]` / `key = value` text

pub mod parser;
pub mod types;
pub mod writer;

pub use parser::{ParseProfile, parse_conf_file, parse_conf_str};
pub use types::{ConfDocument, GLOBAL_STANZA, LoadedConf, Stanza};
pub use writer::render_conf;
