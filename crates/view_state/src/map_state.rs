use evfleet_primitives::{Bounds, LatLng, MapView};
use serde::{Deserialize, Serialize};

/// Zoom level at or above which list views follow the map viewport.
pub const DEFAULT_MIN_LIST_ZOOM: f64 = 13.0;

/// Live state of the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapState {
	pub center: Option<LatLng>,
	pub lower_bound: Option<LatLng>,
	pub upper_bound: Option<LatLng>,
	pub zoom: Option<f64>,
	/// Where the user is, once located.
	pub location: Option<LatLng>,
}

/// A partial update of [`MapState`]. Absent fields keep their value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MapPatch {
	pub center: Option<LatLng>,
	pub lower_bound: Option<LatLng>,
	pub upper_bound: Option<LatLng>,
	pub zoom: Option<f64>,
	pub location: Option<LatLng>,
}

impl MapPatch {
	pub fn view(view: MapView) -> Self {
		Self {
			center: Some(view.center),
			zoom: Some(view.zoom),
			..Self::default()
		}
	}

	pub fn bounds(bounds: Bounds) -> Self {
		Self {
			lower_bound: Some(bounds.lower),
			upper_bound: Some(bounds.upper),
			..Self::default()
		}
	}
}

impl MapState {
	/// Applies `patch`. Returns true when center or zoom changed.
	pub fn apply(&mut self, patch: MapPatch) -> bool {
		let before = self.view();
		fn merge<T>(slot: &mut Option<T>, value: Option<T>) {
			if value.is_some() {
				*slot = value;
			}
		}
		merge(&mut self.center, patch.center);
		merge(&mut self.lower_bound, patch.lower_bound);
		merge(&mut self.upper_bound, patch.upper_bound);
		merge(&mut self.zoom, patch.zoom);
		merge(&mut self.location, patch.location);
		self.view() != before
	}

	/// Center and zoom, once both are known.
	pub fn view(&self) -> Option<MapView> {
		Some(MapView::new(self.center?, self.zoom?))
	}

	pub fn bounds(&self) -> Option<Bounds> {
		Some(Bounds::new(self.lower_bound?, self.upper_bound?))
	}

	/// True when zoomed in far enough for list views to follow the viewport.
	pub fn is_zoom_in_limit(&self, min_zoom: f64) -> bool {
		self.zoom.is_some_and(|z| z >= min_zoom)
	}

	pub fn clear(&mut self) {
		*self = Self::default();
	}
}
