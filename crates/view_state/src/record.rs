use std::fmt;

use evfleet_primitives::{LatLng, MapView};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};
use crate::query::QueryParams;

pub const LAT: &str = "lat";
pub const LNG: &str = "lng";
pub const ZOOM: &str = "z";
pub const VIEW: &str = "view";
pub const SEARCH: &str = "search";

/// Keys owned by the view-state record, in encoding order.
pub const KEYS: [&str; 5] = [LAT, LNG, ZOOM, VIEW, SEARCH];

/// Which presentation of the entity list is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
	#[default]
	List,
	Map,
}

impl ViewMode {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::List => "list",
			Self::Map => "map",
		}
	}

	pub fn parse(raw: &str) -> Result<Self> {
		match raw {
			"list" => Ok(Self::List),
			"map" => Ok(Self::Map),
			other => Err(DecodeError::UnknownView(other.to_string())),
		}
	}
}

impl fmt::Display for ViewMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The persisted part of the view state. `None` means unset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewStateRecord {
	pub map: Option<MapView>,
	pub view: Option<ViewMode>,
	pub search: Option<String>,
}

impl ViewStateRecord {
	/// True when no field is set.
	pub fn is_empty(&self) -> bool {
		self.map.is_none() && self.view.is_none() && self.search.as_deref().is_none_or(str::is_empty)
	}

	/// Writes every field into `params`, deleting the keys of unset fields.
	pub fn write_into(&self, params: &mut QueryParams) {
		match &self.map {
			Some(map) => {
				params.set(LAT, map.center.lat.to_string());
				params.set(LNG, map.center.lng.to_string());
				params.set(ZOOM, map.zoom.to_string());
			}
			None => {
				params.delete(LAT);
				params.delete(LNG);
				params.delete(ZOOM);
			}
		}
		params.set_or_delete(VIEW, self.view.map(ViewMode::as_str));
		params.set_or_delete(SEARCH, self.search.as_deref());
	}

	pub fn encode(&self) -> String {
		let mut params = QueryParams::new();
		self.write_into(&mut params);
		params.to_query_string()
	}

	/// Strict decode: any malformed group is an error.
	pub fn decode(query: &str) -> Result<Self> {
		Self::from_params(&QueryParams::parse(query))
	}

	pub fn from_params(params: &QueryParams) -> Result<Self> {
		Ok(Self {
			map: decode_map(params)?,
			view: params.get_non_empty(VIEW).map(ViewMode::parse).transpose()?,
			search: params.get_non_empty(SEARCH).map(str::to_string),
		})
	}

	/// Decodes each group on its own; a malformed group is dropped and reported.
	pub fn from_params_lenient(params: &QueryParams) -> (Self, Vec<DecodeError>) {
		let mut errors = Vec::new();
		let map = decode_map(params).unwrap_or_else(|err| {
			errors.push(err);
			None
		});
		let view = params.get_non_empty(VIEW).and_then(|raw| {
			ViewMode::parse(raw)
				.map_err(|err| errors.push(err))
				.ok()
		});
		let search = params.get_non_empty(SEARCH).map(str::to_string);
		(Self { map, view, search }, errors)
	}
}

/// The map group is all-or-nothing: `lat`, `lng` and `z` together, or none of them.
fn decode_map(params: &QueryParams) -> Result<Option<MapView>> {
	let parts = [LAT, LNG, ZOOM].map(|key| (key, params.get_non_empty(key)));
	if parts.iter().all(|(_, value)| value.is_none()) {
		return Ok(None);
	}
	let [lat, lng, zoom] = parts.map(|(key, value)| {
		let value = value.ok_or(DecodeError::MissingMapPart { key })?;
		value
			.parse::<f64>()
			.ok()
			.filter(|n| n.is_finite())
			.ok_or_else(|| DecodeError::InvalidNumber { key, value: value.to_string() })
	});
	let (lat, lng, zoom) = (lat?, lng?, zoom?);
	let center = LatLng::new(lat, lng);
	if !center.is_valid() {
		return Err(DecodeError::OutOfRange {
			lat: lat.to_string(),
			lng: lng.to_string(),
		});
	}
	Ok(Some(MapView::new(center, zoom)))
}
