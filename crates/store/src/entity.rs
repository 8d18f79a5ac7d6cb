use std::cmp::Ordering;
use std::fmt;

use serde_json::{Map, Value};

/// A record kept in an [`EntityCollection`](crate::EntityCollection).
pub trait Entity: Clone + Send + Sync + 'static {
	/// Stable identity. Composite keys order by their parts.
	type Key: Ord + Clone + fmt::Debug + Send + Sync + 'static;

	/// Kind name used in logs.
	const KIND: &'static str;

	fn key(&self) -> Self::Key;

	/// Shallow merge: every field present in `changes` overwrites the stored
	/// one, absent fields are kept. Key fields are never touched.
	///
	/// An explicit null counts as absent, for typed and extra fields alike, so
	/// a partial record never clears a known value.
	fn merge(&mut self, changes: Self);

	/// Fields not modelled explicitly.
	fn extra(&self) -> &Map<String, Value>;

	/// True when `name` is present and truthy: not null, not false, not zero,
	/// not an empty string.
	fn has_field(&self, name: &str) -> bool {
		is_truthy_in(self.extra(), name)
	}

	/// Presentation order of [`EntityCollection::select_all`](crate::EntityCollection::select_all).
	fn order(a: &Self, b: &Self) -> Ordering {
		a.key().cmp(&b.key())
	}
}

/// Keys that name a child of some parent entity.
pub trait ChildKey: Ord + Sized {
	type Parent;

	fn parent(&self) -> Self::Parent;

	/// Smallest key under `parent`.
	fn first_of(parent: &Self::Parent) -> Self;

	/// Largest key under `parent`.
	fn last_of(parent: &Self::Parent) -> Self;
}

pub(crate) fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

pub(crate) fn is_truthy_in(map: &Map<String, Value>, name: &str) -> bool {
	map.get(name).is_some_and(is_truthy)
}

pub(crate) fn merge_extra(target: &mut Map<String, Value>, changes: Map<String, Value>) {
	for (key, value) in changes {
		if !value.is_null() {
			target.insert(key, value);
		}
	}
}

/// Implements field-wise merge and truthiness lookups for the `Option` fields of a model.
macro_rules! optional_fields {
	($ty:ty { $($field:ident),* $(,)? }) => {
		impl $ty {
			fn merge_optional(&mut self, changes: &mut Self) {
				$(
					if changes.$field.is_some() {
						self.$field = changes.$field.take();
					}
				)*
			}

			fn optional_present(&self, name: &str) -> Option<bool> {
				match name {
					$( stringify!($field) => Some($crate::entity::OptionalField::is_truthy(&self.$field)), )*
					_ => None,
				}
			}
		}
	};
}

pub(crate) use optional_fields;

/// Truthiness of typed optional fields, mirroring [`is_truthy`] for JSON.
pub(crate) trait OptionalField {
	fn is_truthy(&self) -> bool;
}

impl OptionalField for Option<String> {
	fn is_truthy(&self) -> bool {
		self.as_deref().is_some_and(|s| !s.is_empty())
	}
}

impl OptionalField for Option<f64> {
	fn is_truthy(&self) -> bool {
		self.is_some_and(|f| f != 0.0)
	}
}

impl OptionalField for Option<u64> {
	fn is_truthy(&self) -> bool {
		self.is_some_and(|n| n != 0)
	}
}

impl<T> OptionalField for Option<chrono::DateTime<T>>
where
	T: chrono::TimeZone,
{
	fn is_truthy(&self) -> bool {
		self.is_some()
	}
}

impl OptionalField for Option<Value> {
	fn is_truthy(&self) -> bool {
		self.as_ref().is_some_and(is_truthy)
	}
}
