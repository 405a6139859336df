use crate::conf::types::{ConfDocument, GLOBAL_STANZA, Stanza};

/// Render a banner as a comment block, one `#` line per banner line.
fn render_banner(out: &mut String, banner: &str) {
	for line in banner.lines() {
		let line = line.trim_end();
		if line.starts_with('#') {
			out.push_str(line);
		} else if line.is_empty() {
			out.push('#');
		} else {
			out.push_str("# ");
			out.push_str(line);
		}
		out.push('\n');
	}
	out.push('\n');
}

fn render_stanza_body(out: &mut String, stanza: &Stanza) {
	for (key, value) in &stanza.attributes {
		if value.is_empty() {
			out.push_str(&format!("{key} =\n"));
		} else {
			out.push_str(&format!("{key} = {value}\n"));
		}
	}
}

/// Render a document to conf text.
///
/// The global stanza is written first without a header. Every other stanza is
/// written as its retained comments, `[name]`, then `key = value` lines, with a
/// blank line between stanzas. A non-empty `banner` is placed once at the top.
pub fn render_conf(document: &ConfDocument, banner: Option<&str>) -> String {
	let mut out = String::new();

	if let Some(banner) = banner.filter(|b| !b.trim().is_empty()) {
		render_banner(&mut out, banner);
	}

	let mut first = true;
	if let Some(global) = document.get(GLOBAL_STANZA)
		&& !global.is_empty()
	{
		for comment in &global.comments {
			out.push_str(comment);
			out.push('\n');
		}
		render_stanza_body(&mut out, global);
		first = false;
	}

	for (name, stanza) in document.iter() {
		if name == GLOBAL_STANZA {
			continue;
		}
		if !first {
			out.push('\n');
		}
		first = false;

		for comment in &stanza.comments {
			out.push_str(comment);
			out.push('\n');
		}
		out.push_str(&format!("[{name}]\n"));
		render_stanza_body(&mut out, stanza);
	}

	out
}
