use evfleet_primitives::{MapView, ViewportKey};
use tracing::{debug, trace, warn};

use crate::map_state::{MapPatch, MapState};
use crate::query::QueryParams;
use crate::record::{ViewMode, ViewStateRecord};

/// How a navigation entry was reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
	/// The location carried values; they were copied into memory.
	PersistedWon,
	/// The location was empty; in-memory state was written out to it.
	MemoryWon,
	/// Nothing to do, or this entry was already reconciled.
	Unchanged,
}

/// Device layout the view state is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Layout {
	pub mobile: bool,
	pub view: ViewMode,
}

/// Keeps the in-memory view state and the location's query parameters in agreement.
///
/// [`ViewStateSync::navigate`] starts a navigation entry and
/// [`ViewStateSync::reconcile`] settles it once. Afterwards every setter
/// updates memory and the parameters together. Map moves are keyed by their
/// rounded viewport, so jitter below the key precision writes nothing.
#[derive(Debug, Clone)]
pub struct ViewStateSync {
	params: QueryParams,
	record: ViewStateRecord,
	map: MapState,
	precision: u32,
	map_key: Option<ViewportKey>,
	entry_pending: bool,
}

impl ViewStateSync {
	pub fn new(precision: u32) -> Self {
		Self {
			params: QueryParams::new(),
			record: ViewStateRecord::default(),
			map: MapState::default(),
			precision,
			map_key: None,
			entry_pending: false,
		}
	}

	pub fn record(&self) -> &ViewStateRecord {
		&self.record
	}

	pub fn params(&self) -> &QueryParams {
		&self.params
	}

	pub fn query_string(&self) -> String {
		self.params.to_query_string()
	}

	pub fn map_state(&self) -> &MapState {
		&self.map
	}

	/// Enters a new location. Its parameters replace the current ones.
	pub fn navigate(&mut self, query: &str) {
		self.params = QueryParams::parse(query);
		self.entry_pending = true;
		trace!(query, "view_state.navigate");
	}

	/// Settles the current navigation entry; later calls are no-ops until the next
	/// [`ViewStateSync::navigate`].
	///
	/// Malformed parameter groups are logged and treated as absent.
	pub fn reconcile(&mut self) -> Reconciled {
		if !std::mem::take(&mut self.entry_pending) {
			return Reconciled::Unchanged;
		}
		let (persisted, errors) = ViewStateRecord::from_params_lenient(&self.params);
		for err in &errors {
			warn!(error = %err, "view_state.decode_failed");
		}
		let outcome = if !persisted.is_empty() {
			if let Some(map) = persisted.map {
				self.adopt_map(Some(map));
			}
			if persisted.view.is_some() {
				self.record.view = persisted.view;
			}
			if persisted.search.is_some() {
				self.record.search = persisted.search;
			}
			Reconciled::PersistedWon
		} else if !self.record.is_empty() {
			Reconciled::MemoryWon
		} else {
			Reconciled::Unchanged
		};
		self.record.write_into(&mut self.params);
		debug!(?outcome, query = %self.params, "view_state.reconcile");
		outcome
	}

	/// Replaces the map position. Returns false when the rounded viewport is unchanged.
	pub fn set_map_view(&mut self, view: Option<MapView>) -> bool {
		let key = view.map(|v| v.viewport_key(self.precision));
		if key == self.map_key {
			return false;
		}
		self.adopt_map(view);
		self.record.write_into(&mut self.params);
		true
	}

	pub fn set_search_token(&mut self, search: &str) {
		self.record.search = (!search.is_empty()).then(|| search.to_string());
		self.record.write_into(&mut self.params);
	}

	pub fn set_active_mode(&mut self, view: Option<ViewMode>) {
		self.record.view = view;
		self.record.write_into(&mut self.params);
	}

	/// Applies a map widget update, persisting center and zoom when they move.
	pub fn update_map(&mut self, patch: MapPatch) -> bool {
		if self.map.apply(patch)
			&& let Some(view) = self.map.view()
		{
			return self.set_map_view(Some(view));
		}
		false
	}

	/// Drops the search token while a map position is persisted.
	pub fn clear_search_on_map(&mut self) {
		if self.record.map.is_some() && self.record.search.is_some() {
			self.set_search_token("");
		}
	}

	/// On mobile the active mode follows the layout.
	pub fn set_view_on_mobile(&mut self, layout: Layout) {
		if layout.mobile && self.record.view != Some(layout.view) {
			self.set_active_mode(Some(layout.view));
		}
	}

	pub fn is_mobile_list_view(&self, layout: Layout) -> bool {
		layout.mobile && self.record.view == Some(ViewMode::List)
	}

	/// Searching in the mobile list drops the map position.
	pub fn clear_map_on_search_in_mobile_list_view(&mut self, layout: Layout) {
		if self.record.search.is_some() && self.is_mobile_list_view(layout) {
			self.set_map_view(None);
		}
	}

	fn adopt_map(&mut self, view: Option<MapView>) {
		self.map_key = view.map(|v| v.viewport_key(self.precision));
		self.record.map = view;
		if let Some(view) = view {
			self.map.apply(MapPatch::view(view));
		}
	}
}
