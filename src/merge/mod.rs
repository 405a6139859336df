//! Layered merge of conf documents.
//!
//! This module handles:
//! - Folding sources into a target with later-wins precedence
//! - Dry-run previews as a unified diff
//! - Writing the merged result in a single replace

pub mod diff;
pub mod engine;

pub use diff::unified_diff;
pub use engine::{
	MergeOptions, MergeOutcome, MergeTarget, merge_conf_files, merge_documents, merge_into,
};
