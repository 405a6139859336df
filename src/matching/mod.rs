//! Pattern matching for stanza and attribute names.
//!
//! Supports exact string, start-anchored regex, and whole-string wildcard
//! matching, with bulk patterns loaded from `file://` references.

pub mod matcher;

pub use matcher::{FILE_PATTERN_PREFIX, MatchMode, PatternMatcher};
