use similar::TextDiff;

/// Lines of unchanged context around each hunk.
const CONTEXT_LINES: usize = 3;

/// Unified diff from `old` to `new`. Empty when the texts are identical.
pub fn unified_diff(old: &str, new: &str, old_label: &str, new_label: &str) -> String {
	if old == new {
		return String::new();
	}

	TextDiff::from_lines(old, new)
		.unified_diff()
		.context_radius(CONTEXT_LINES)
		.header(old_label, new_label)
		.to_string()
}
