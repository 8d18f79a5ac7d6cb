//! Client for the list endpoints of the pull API.

use std::time::Duration;

use evfleet_primitives::{Bounds, Cursor, CursorEnvelope, LatLng};
use parking_lot::RwLock;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};
use url::{Url, form_urlencoded};

use crate::error::{FetchError, Result};
use crate::scroll::Paginated;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub cursor: CursorEnvelope,
}

impl<T> Page<T> {
	pub fn has_more(&self) -> bool {
		self.cursor.has_more()
	}
}

impl<T> Paginated for Page<T> {
	fn cursor(&self) -> &CursorEnvelope {
		&self.cursor
	}
}

/// Query parameters of a list request.
///
/// Empty values are never sent: setting a parameter to an empty string, a
/// zero id or a zero limit removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
	params: Vec<(&'static str, String)>,
}

impl ListQuery {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
		let value = value.into();
		self.params.retain(|(k, _)| *k != key);
		if !value.is_empty() {
			self.params.push((key, value));
		}
		self
	}

	fn id(self, key: &'static str, id: Option<u64>) -> Self {
		let value = id.filter(|id| *id != 0).map(|id| id.to_string()).unwrap_or_default();
		self.param(key, value)
	}

	pub fn fields(self, fields: &[&str]) -> Self {
		self.param("fields", fields.join(","))
	}

	pub fn search(self, search: &str) -> Self {
		self.param("search", search)
	}

	pub fn sort_by(self, key: &str) -> Self {
		self.param("sort_by", key)
	}

	pub fn name(self, name: &str) -> Self {
		self.param("name", name)
	}

	pub fn city(self, city: &str) -> Self {
		self.param("city", city)
	}

	pub fn state(self, state: &str) -> Self {
		self.param("state", state)
	}

	pub fn zip_code(self, zip: &str) -> Self {
		self.param("zip_code", zip)
	}

	pub fn owner_id(self, id: Option<u64>) -> Self {
		self.id("owner_id", id)
	}

	pub fn site_id(self, id: Option<u64>) -> Self {
		self.id("site_id", id)
	}

	pub fn origin(self, origin: Option<LatLng>) -> Self {
		self.param("lat_lng_origin", origin.map(|o| o.to_param()).unwrap_or_default())
	}

	/// Restricts results to the rectangle between two corners.
	pub fn within(self, bounds: Option<&Bounds>) -> Self {
		let (min, max) = bounds.map(|b| (b.lower.to_param(), b.upper.to_param())).unwrap_or_default();
		self.param("lat_lng_min", min).param("lat_lng_max", max)
	}

	pub fn cursor(self, cursor: Option<&Cursor>) -> Self {
		self.param("cursor", cursor.map(Cursor::to_string).unwrap_or_default())
	}

	pub fn limit(self, limit: u32) -> Self {
		let value = if limit == 0 { String::new() } else { limit.to_string() };
		self.param("limit", value)
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
	}

	pub fn is_empty(&self) -> bool {
		self.params.is_empty()
	}

	/// Encodes the parameters in insertion order.
	pub fn to_query_string(&self) -> String {
		form_urlencoded::Serializer::new(String::new()).extend_pairs(self.params.iter().map(|(k, v)| (*k, v.as_str()))).finish()
	}
}

/// Path of every resource, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiPaths {
	pub stations: String,
	pub evses: String,
	pub sites: String,
	pub station_status: String,
	pub station_events: String,
	pub users: String,
}

impl Default for ApiPaths {
	fn default() -> Self {
		Self {
			stations: "/api/stations".into(),
			evses: "/api/stations/evses".into(),
			sites: "/api/sites".into(),
			station_status: "/api/stations/status".into(),
			station_events: "/api/stations/events".into(),
			users: "/api/users".into(),
		}
	}
}

/// A paginated list resource and the body field carrying its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
	Stations,
	Evses,
	Sites,
	StationStatus,
	Users,
}

impl Resource {
	pub const fn items_field(self) -> &'static str {
		match self {
			Self::Stations => "stations",
			Self::Evses => "evses",
			Self::Sites => "sites",
			Self::StationStatus => "data",
			Self::Users => "users",
		}
	}

	fn path(self, paths: &ApiPaths) -> &str {
		match self {
			Self::Stations => &paths.stations,
			Self::Evses => &paths.evses,
			Self::Sites => &paths.sites,
			Self::StationStatus => &paths.station_status,
			Self::Users => &paths.users,
		}
	}
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	message: Option<String>,
}

/// HTTP client for the pull API.
///
/// A bearer token, once set, is attached to every request until cleared.
#[derive(Debug)]
pub struct PullClient {
	http: Client,
	base: Url,
	paths: ApiPaths,
	token: RwLock<Option<String>>,
}

impl PullClient {
	pub fn new(base: Url, paths: ApiPaths) -> Self {
		Self {
			http: Client::new(),
			base,
			paths,
			token: RwLock::new(None),
		}
	}

	pub fn base(&self) -> &Url {
		&self.base
	}

	pub fn paths(&self) -> &ApiPaths {
		&self.paths
	}

	pub fn set_token(&self, token: impl Into<String>) {
		*self.token.write() = Some(token.into());
	}

	pub fn clear_token(&self) {
		if self.token.write().take().is_some() {
			debug!("fetch.token_cleared");
		}
	}

	pub fn has_token(&self) -> bool {
		self.token.read().is_some()
	}

	/// Fetches one page of a list resource.
	pub async fn list<T: DeserializeOwned>(&self, resource: Resource, query: &ListQuery) -> Result<Page<T>> {
		let url = self.url(resource.path(&self.paths), query)?;
		let body: Value = self.get_json(url).await?;
		decode_page(body, resource.items_field())
	}

	/// Sub-units of one station.
	pub async fn evses_of_station<T: DeserializeOwned>(&self, station_id: u64) -> Result<Vec<T>> {
		let path = format!("{}/{station_id}/evses", self.paths.stations);
		self.get_json(self.url(&path, &ListQuery::new())?).await
	}

	/// Sub-unit statuses of one station.
	pub async fn status_of_station<T: DeserializeOwned>(&self, station_id: u64) -> Result<Vec<T>> {
		let path = format!("{}/{station_id}", self.paths.station_status);
		self.get_json(self.url(&path, &ListQuery::new())?).await
	}

	/// Event log of one station.
	pub async fn events_of_station<T: DeserializeOwned>(&self, station_id: u64) -> Result<Vec<T>> {
		let path = format!("{}/{station_id}", self.paths.station_events);
		self.get_json(self.url(&path, &ListQuery::new())?).await
	}

	fn url(&self, path: &str, query: &ListQuery) -> Result<Url> {
		let mut url = self.base.join(path)?;
		if !query.is_empty() {
			url.set_query(Some(&query.to_query_string()));
		}
		Ok(url)
	}

	async fn get_json<R: DeserializeOwned>(&self, url: Url) -> Result<R> {
		trace!(url = %url, "fetch.request");
		let mut request = self.http.get(url).timeout(REQUEST_TIMEOUT);
		let token = self.token.read().clone();
		if let Some(token) = token {
			request = request.header(AUTHORIZATION, format!("Bearer {token}"));
		}
		let response = request.send().await.map_err(|e| FetchError::Network(e.to_string()))?;
		let response = check_status(response).await?;
		response.json().await.map_err(|e| FetchError::Decode(e.to_string()))
	}
}

async fn check_status(response: Response) -> Result<Response> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}
	let body = response.json::<ErrorBody>().await.unwrap_or_default();
	Err(http_error(status, body.name, body.message))
}

/// Builds an HTTP failure, naming it after the status when the body does not.
fn http_error(status: StatusCode, name: Option<String>, message: Option<String>) -> FetchError {
	let name = name.filter(|n| !n.is_empty()).unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
	FetchError::Http {
		status: status.as_u16(),
		name,
		message: message.unwrap_or_default(),
	}
}

/// Splits a list response body into its items and cursor envelope.
pub fn decode_page<T: DeserializeOwned>(mut body: Value, items_field: &str) -> Result<Page<T>> {
	let items = match body.get_mut(items_field).map(Value::take) {
		Some(items) => serde_json::from_value(items).map_err(|e| FetchError::Decode(format!("{items_field}: {e}")))?,
		None => return Err(FetchError::Decode(format!("missing `{items_field}`"))),
	};
	let cursor = match body.get_mut("cursor").map(Value::take) {
		Some(Value::Null) | None => CursorEnvelope::exhausted(),
		Some(cursor) => serde_json::from_value(cursor).map_err(|e| FetchError::Decode(format!("cursor: {e}")))?,
	};
	Ok(Page { items, cursor })
}
