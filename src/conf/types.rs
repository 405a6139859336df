use indexmap::IndexMap;
use indexmap::map::Entry;

/// Name of the global stanza (attributes that appear before any `[header]`).
pub const GLOBAL_STANZA: &str = "";

/// A named section of a conf document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stanza {
	/// Attributes in file order.
	pub attributes: IndexMap<String, String>,

	/// Whole-line comments retained when the reader keeps comments.
	/// Rendered ahead of the stanza header.
	pub comments: Vec<String>,
}

impl Stanza {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a stanza from `(key, value)` pairs, keeping their order.
	pub fn from_pairs<K, V, I>(pairs: I) -> Self
	where
		K: Into<String>,
		V: Into<String>,
		I: IntoIterator<Item = (K, V)>,
	{
		Stanza {
			attributes: pairs
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
			comments: Vec::new(),
		}
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.attributes.get(key).map(String::as_str)
	}

	/// Set an attribute. An existing key keeps its position; a new key is appended.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.attributes.insert(key.into(), value.into());
	}

	pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
		self.attributes.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.attributes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.attributes.is_empty() && self.comments.is_empty()
	}
}

/// Ordered, structured representation of a parsed conf file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfDocument {
	pub stanzas: IndexMap<String, Stanza>,
}

impl ConfDocument {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, name: &str) -> Option<&Stanza> {
		self.stanzas.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.stanzas.contains_key(name)
	}

	/// Insert or replace a stanza. Replacing keeps the original position.
	pub fn insert(&mut self, name: impl Into<String>, stanza: Stanza) {
		self.stanzas.insert(name.into(), stanza);
	}

	/// Get a stanza for modification, appending an empty one if missing.
	pub fn stanza_mut(&mut self, name: &str) -> &mut Stanza {
		match self.stanzas.entry(name.to_string()) {
			Entry::Occupied(entry) => entry.into_mut(),
			Entry::Vacant(entry) => entry.insert(Stanza::new()),
		}
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.stanzas.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Stanza)> {
		self.stanzas.iter().map(|(name, stanza)| (name.as_str(), stanza))
	}

	pub fn len(&self) -> usize {
		self.stanzas.len()
	}

	pub fn is_empty(&self) -> bool {
		self.stanzas.is_empty()
	}
}

impl FromIterator<(String, Stanza)> for ConfDocument {
	fn from_iter<I: IntoIterator<Item = (String, Stanza)>>(iter: I) -> Self {
		ConfDocument {
			stanzas: iter.into_iter().collect(),
		}
	}
}

/// A document together with the path it was read from.
#[derive(Debug, Clone)]
pub struct LoadedConf {
	/// The parsed document.
	pub document: ConfDocument,

	/// Where the document came from (for display and diagnostics).
	pub path: std::path::PathBuf,
}
