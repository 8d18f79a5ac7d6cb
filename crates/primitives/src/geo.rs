use std::fmt;

use serde::{Deserialize, Serialize};

/// Decimal places kept for zoom levels when deriving a [`ViewportKey`].
const ZOOM_PRECISION: u32 = 2;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
	pub lat: f64,
	pub lng: f64,
}

impl LatLng {
	pub const fn new(lat: f64, lng: f64) -> Self {
		Self { lat, lng }
	}

	/// Returns true when both components are finite and inside the WGS84 range.
	pub fn is_valid(&self) -> bool {
		self.lat.is_finite() && self.lng.is_finite() && (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
	}

	/// Formats the pair as `lat,lng`, the form list endpoints accept for origins and bounds.
	pub fn to_param(&self) -> String {
		format!("{},{}", self.lat, self.lng)
	}
}

impl fmt::Display for LatLng {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{},{}", self.lat, self.lng)
	}
}

/// Map center plus zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
	pub center: LatLng,
	pub zoom: f64,
}

impl MapView {
	pub const fn new(center: LatLng, zoom: f64) -> Self {
		Self { center, zoom }
	}

	/// Derives the dedupe key for this view.
	///
	/// Coordinates are rounded to `precision` decimal places so that sub-pixel
	/// jitter from continuous map movement maps onto the same key.
	pub fn viewport_key(&self, precision: u32) -> ViewportKey {
		let lat = round_to(self.center.lat, precision);
		let lng = round_to(self.center.lng, precision);
		let zoom = round_to(self.zoom, ZOOM_PRECISION);
		let digits = precision as usize;
		ViewportKey(format!("{lat:.digits$},{lng:.digits$},{zoom}"))
	}
}

/// Rounds half away from zero and folds negative zero into positive zero.
fn round_to(value: f64, precision: u32) -> f64 {
	let factor = 10f64.powi(precision as i32);
	(value * factor).round() / factor + 0.0
}

/// Composite identity of a rounded viewport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewportKey(String);

impl ViewportKey {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ViewportKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<ViewportKey> for String {
	fn from(key: ViewportKey) -> Self {
		key.0
	}
}

/// Axis-aligned rectangle given by its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
	pub lower: LatLng,
	pub upper: LatLng,
}

impl Bounds {
	pub const fn new(lower: LatLng, upper: LatLng) -> Self {
		Self { lower, upper }
	}

	pub fn contains(&self, point: LatLng) -> bool {
		(self.lower.lat..=self.upper.lat).contains(&point.lat) && (self.lower.lng..=self.upper.lng).contains(&point.lng)
	}

	/// Smallest bounds enclosing every point, or `None` for an empty input.
	pub fn enclosing(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
		points.into_iter().fold(None, |acc: Option<Self>, p| {
			Some(match acc {
				None => Self::new(p, p),
				Some(b) => Self::new(
					LatLng::new(b.lower.lat.min(p.lat), b.lower.lng.min(p.lng)),
					LatLng::new(b.upper.lat.max(p.lat), b.upper.lng.max(p.lng)),
				),
			})
		})
	}

	/// Items with a known position that falls outside these bounds.
	///
	/// Items without a position are never reported.
	pub fn outside<'a, T: Positioned>(&self, items: impl IntoIterator<Item = &'a T>) -> Vec<&'a T>
	where
		T: 'a,
	{
		items
			.into_iter()
			.filter(|item| item.position().is_some_and(|p| !self.contains(p)))
			.collect()
	}
}

/// Anything that may sit at a point on the map.
pub trait Positioned {
	fn position(&self) -> Option<LatLng>;
}

#[cfg(test)]
mod tests;
