use std::collections::{BTreeMap, btree_map};

use tracing::trace;

use crate::entity::{ChildKey, Entity};

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
	Inserted,
	Merged,
}

/// Keyed records of one entity kind.
///
/// Records are only reachable through shared references; every mutation goes
/// through the operations below. Reads that need presentation order sort on
/// demand with [`Entity::order`].
#[derive(Debug, Clone)]
pub struct EntityCollection<E: Entity> {
	entities: BTreeMap<E::Key, E>,
}

impl<E: Entity> Default for EntityCollection<E> {
	fn default() -> Self {
		Self { entities: BTreeMap::new() }
	}
}

impl<E: Entity> EntityCollection<E> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	/// Inserts `entity`, or shallow-merges it into the stored record with the same key.
	pub fn upsert_one(&mut self, entity: E) -> Upsert {
		match self.entities.get_mut(&entity.key()) {
			Some(existing) => {
				existing.merge(entity);
				Upsert::Merged
			}
			None => {
				self.entities.insert(entity.key(), entity);
				Upsert::Inserted
			}
		}
	}

	/// Upserts every record in order. Returns how many were new.
	pub fn upsert_many(&mut self, entities: impl IntoIterator<Item = E>) -> usize {
		let mut inserted = 0;
		for entity in entities {
			if self.upsert_one(entity) == Upsert::Inserted {
				inserted += 1;
			}
		}
		trace!(kind = E::KIND, inserted, total = self.entities.len(), "store.upsert_many");
		inserted
	}

	/// Replaces the stored record wholesale.
	pub fn set_one(&mut self, entity: E) {
		self.entities.insert(entity.key(), entity);
	}

	pub fn set_many(&mut self, entities: impl IntoIterator<Item = E>) {
		for entity in entities {
			self.set_one(entity);
		}
	}

	/// Shallow-merges `changes` into the record stored under `key`.
	///
	/// Key fields carried by `changes` are ignored. Returns false, changing
	/// nothing, when no record exists under `key`.
	pub fn update_by_id(&mut self, key: &E::Key, changes: E) -> bool {
		match self.entities.get_mut(key) {
			Some(existing) => {
				existing.merge(changes);
				true
			}
			None => {
				trace!(kind = E::KIND, ?key, "store.update_missing");
				false
			}
		}
	}

	pub fn remove_by_id(&mut self, key: &E::Key) -> Option<E> {
		self.entities.remove(key)
	}

	/// Removes every listed key. Returns how many records existed.
	pub fn remove_many<'a>(&mut self, keys: impl IntoIterator<Item = &'a E::Key>) -> usize {
		keys.into_iter().filter(|key| self.entities.remove(*key).is_some()).count()
	}

	pub fn clear(&mut self) {
		self.entities.clear();
	}

	pub fn select_by_id(&self, key: &E::Key) -> Option<&E> {
		self.entities.get(key)
	}

	pub fn contains(&self, key: &E::Key) -> bool {
		self.entities.contains_key(key)
	}

	/// Records in presentation order.
	pub fn select_all(&self) -> Vec<&E> {
		let mut all: Vec<&E> = self.entities.values().collect();
		all.sort_by(|a, b| E::order(a, b));
		all
	}

	/// Keys in presentation order.
	pub fn ids(&self) -> Vec<E::Key> {
		self.select_all().into_iter().map(Entity::key).collect()
	}

	/// Records matching `predicate`, in presentation order.
	pub fn select_where(&self, mut predicate: impl FnMut(&E) -> bool) -> Vec<&E> {
		let mut matched: Vec<&E> = self.entities.values().filter(|e| predicate(*e)).collect();
		matched.sort_by(|a, b| E::order(a, b));
		matched
	}

	/// Records on which every named field is present and truthy.
	pub fn select_with_fields(&self, fields: &[&str]) -> Vec<&E> {
		self.select_where(|e| fields.iter().all(|field| e.has_field(field)))
	}

	/// Records in key order, without sorting.
	pub fn iter(&self) -> btree_map::Values<'_, E::Key, E> {
		self.entities.values()
	}
}

impl<E> EntityCollection<E>
where
	E: Entity,
	E::Key: ChildKey,
{
	/// Records whose key falls under `parent`, in key order.
	pub fn select_by_parent(&self, parent: &<E::Key as ChildKey>::Parent) -> Vec<&E> {
		let range = <E::Key as ChildKey>::first_of(parent)..=<E::Key as ChildKey>::last_of(parent);
		self.entities.range(range).map(|(_, e)| e).collect()
	}

	/// Keys under `parent`, in key order.
	pub fn keys_under(&self, parent: &<E::Key as ChildKey>::Parent) -> Vec<E::Key> {
		let range = <E::Key as ChildKey>::first_of(parent)..=<E::Key as ChildKey>::last_of(parent);
		self.entities.range(range).map(|(k, _)| k.clone()).collect()
	}

	/// Removes every record under `parent`. Returns how many were removed.
	pub fn remove_under(&mut self, parent: &<E::Key as ChildKey>::Parent) -> usize {
		let keys = self.keys_under(parent);
		self.remove_many(&keys)
	}
}

impl<E: Entity> FromIterator<E> for EntityCollection<E> {
	fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
		let mut collection = Self::new();
		collection.upsert_many(iter);
		collection
	}
}

#[cfg(test)]
mod tests;
