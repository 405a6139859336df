//! Stanza-aware selection ("grep") over conf documents.
//!
//! This module handles:
//! - Building stanza-name, attribute-presence and attribute-value matchers
//! - The per-stanza keep predicate, including invert-match
//! - Rendering results as stanzas, counts, or matching file names

pub mod engine;

pub use engine::{
	AttributeValueRule, FilterCriteria, FilteredConf, OutputMode, StanzaFilter, filter_confs,
	render_filter_output,
};
