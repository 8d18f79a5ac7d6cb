//! Location filter options derived from the address fields of a collection.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::model::Located;

/// Option shown first in every filter, meaning "no restriction".
pub const ALL: &str = "All";

/// One address filter: the options present in the data plus the current pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationFilter {
	selected: String,
	options: Vec<String>,
}

impl Default for LocationFilter {
	fn default() -> Self {
		Self {
			selected: ALL.to_string(),
			options: vec![ALL.to_string()],
		}
	}
}

impl LocationFilter {
	pub fn selected(&self) -> &str {
		&self.selected
	}

	pub fn options(&self) -> &[String] {
		&self.options
	}

	/// True unless the selection is [`ALL`].
	pub fn is_active(&self) -> bool {
		self.selected != ALL
	}

	/// Selects `value`. Returns false, keeping the selection, when it is not an option.
	pub fn set_selected(&mut self, value: &str) -> bool {
		if !self.options.iter().any(|o| o == value) {
			return false;
		}
		self.selected = value.to_string();
		true
	}

	/// True when `value` passes this filter.
	pub fn admits(&self, value: Option<&str>) -> bool {
		!self.is_active() || value == Some(self.selected.as_str())
	}

	fn rebuild<'a>(&mut self, values: impl Iterator<Item = &'a str>, cmp: fn(&str, &str) -> Ordering) {
		let distinct: BTreeSet<&str> = values.filter(|v| !v.is_empty()).collect();
		let mut sorted: Vec<&str> = distinct.into_iter().collect();
		sorted.sort_by(|a, b| cmp(a, b));
		self.options = std::iter::once(ALL).chain(sorted).map(str::to_string).collect();
	}
}

/// Filters for state, city and zip code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFilters {
	pub state: LocationFilter,
	pub city: LocationFilter,
	pub zip_code: LocationFilter,
}

impl LocationFilters {
	/// Recomputes the options from `items`. Selections are kept as they are.
	pub fn refresh<'a, L: Located + 'a>(&mut self, items: impl IntoIterator<Item = &'a L> + Clone) {
		self.state.rebuild(items.clone().into_iter().filter_map(Located::state), str::cmp);
		self.city.rebuild(items.clone().into_iter().filter_map(Located::city), str::cmp);
		self.zip_code.rebuild(items.into_iter().filter_map(Located::zip_code), zip_order);
	}

	/// True when `item` passes every active filter.
	pub fn admits(&self, item: &impl Located) -> bool {
		self.state.admits(item.state()) && self.city.admits(item.city()) && self.zip_code.admits(item.zip_code())
	}
}

/// Numeric zip codes sort by value and before anything non-numeric.
fn zip_order(a: &str, b: &str) -> Ordering {
	match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
		(Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
		(Ok(_), Err(_)) => Ordering::Less,
		(Err(_), Ok(_)) => Ordering::Greater,
		(Err(_), Err(_)) => a.cmp(b),
	}
}

#[cfg(test)]
mod tests;
