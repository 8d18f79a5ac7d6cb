use std::fmt;

use url::form_urlencoded;

/// Flat `application/x-www-form-urlencoded` parameters of a navigable location.
///
/// Keys keep their first-insertion order. Setting a key replaces every earlier
/// value for it in place, so parameters owned by other parts of the client
/// survive untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
	pairs: Vec<(String, String)>,
}

impl QueryParams {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses a query string, with or without its leading `?`.
	pub fn parse(query: &str) -> Self {
		let query = query.strip_prefix('?').unwrap_or(query);
		Self {
			pairs: form_urlencoded::parse(query.as_bytes()).into_owned().collect(),
		}
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	/// Like [`QueryParams::get`], treating an empty value as absent.
	pub fn get_non_empty(&self, key: &str) -> Option<&str> {
		self.get(key).filter(|v| !v.is_empty())
	}

	pub fn set(&mut self, key: &str, value: impl Into<String>) {
		let value = value.into();
		match self.pairs.iter().position(|(k, _)| k == key) {
			Some(first) => {
				self.pairs[first].1 = value;
				let mut index = 0;
				self.pairs.retain(|(k, _)| {
					let keep = index <= first || k != key;
					index += 1;
					keep
				});
			}
			None => self.pairs.push((key.to_string(), value)),
		}
	}

	/// Sets `key` when `value` is non-empty, deletes it otherwise.
	pub fn set_or_delete(&mut self, key: &str, value: Option<&str>) {
		match value.filter(|v| !v.is_empty()) {
			Some(value) => self.set(key, value),
			None => self.delete(key),
		}
	}

	pub fn delete(&mut self, key: &str) {
		self.pairs.retain(|(k, _)| k != key);
	}

	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Serializes without a leading `?`.
	pub fn to_query_string(&self) -> String {
		form_urlencoded::Serializer::new(String::new()).extend_pairs(self.iter()).finish()
	}
}

impl fmt::Display for QueryParams {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_query_string())
	}
}
