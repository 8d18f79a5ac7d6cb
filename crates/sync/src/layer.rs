use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use evfleet_channel::{ChannelManager, ChannelStatus, Endpoint, StationAction, StationEventPush, StationEventSocket, StationMessage, Subscription, Transport, UpdateBatcher};
use evfleet_fetch::{ListQuery, Page, PullClient, Resource, ScrollFetch, ViewportFetch};
use evfleet_primitives::{CursorEnvelope, ErrorReport, ErrorSink, SharedErrorSink};
use evfleet_store::{Entity, EntityStore, Evse, EvseKey, EvseStatus, EvseStatusRecord, Site, Station, StationEvent, StoreHandle, User};
use evfleet_view_state::{MapState, ViewStateSync};
use evfleet_worker::GenerationClock;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::config::{Result, SyncConfig};
use crate::error_board::ErrorBoard;

/// Status records a status push resolves to.
///
/// A push naming a sub-unit updates that one; a push without one applies to
/// every sub-unit of the station known to the store. Pushes without a
/// connector status carry nothing to record.
pub fn status_updates(store: &EntityStore, push: &StationEventPush) -> Vec<EvseStatusRecord> {
	let Some(status) = push.connector_status().map(EvseStatus::parse) else {
		return Vec::new();
	};
	let keys = match push.evse_id() {
		Some(evse_id) => vec![EvseKey::new(push.station_id, evse_id)],
		None => store.status_keys_for_station(push.station_id),
	};
	keys.into_iter().map(|key| EvseStatusRecord::new(key, status)).collect()
}

/// Event log entry for a pushed event.
///
/// Pushes carry no id of their own, so one is derived from the station, the
/// timestamp and the event name.
pub fn event_from_push(push: StationEventPush) -> StationEvent {
	let created_at = push
		.created_at
		.as_deref()
		.and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
		.map(|at| at.with_timezone(&Utc));
	StationEvent {
		id: format!("{}:{}:{}", push.station_id, push.created_at.as_deref().unwrap_or_default(), push.event),
		station_id: Some(push.station_id),
		event: Some(push.event),
		payload: Some(push.payload),
		created_at,
		..StationEvent::default()
	}
}

struct LiveFeed {
	_subscriptions: [Subscription; 3],
	batcher: Arc<UpdateBatcher<EvseStatusRecord>>,
	socket: StationEventSocket,
}

struct Session {
	store: StoreHandle,
	client: Arc<PullClient>,
	feed: Mutex<Option<LiveFeed>>,
	/// Advanced by every teardown.
	sessions: GenerationClock,
}

impl Session {
	fn pull_scope(&self) -> PullScope {
		PullScope {
			client: Arc::clone(&self.client),
			store: self.store.clone(),
			sessions: self.sessions.clone(),
			started: self.sessions.current(),
		}
	}

	fn close_feed(&self) -> bool {
		let Some(feed) = self.feed.lock().take() else {
			return false;
		};
		feed.batcher.cancel();
		feed.socket.forget_watch();
		debug!("sync.feed_closed");
		true
	}

	fn teardown(&self) {
		self.close_feed();
		self.client.clear_token();
		self.sessions.next();
		self.store.write(|store| store.clear());
		info!("sync.teardown");
	}
}

/// What a pull needs to land its results, tied to the session it started in.
struct PullScope {
	client: Arc<PullClient>,
	store: StoreHandle,
	sessions: GenerationClock,
	started: u64,
}

impl PullScope {
	/// Applies `f` unless the session was torn down since the pull started.
	fn write<R>(&self, f: impl FnOnce(&mut EntityStore) -> R) -> Option<R> {
		let written = self.store.write(|store| (self.sessions.current() == self.started).then(|| f(store)));
		if written.is_none() {
			debug!(session = self.started, "sync.stale_pull_dropped");
		}
		written
	}
}

/// Joins the push channel, the update batcher, the entity store and the pull
/// client into one session.
///
/// Status pushes are coalesced per sub-unit and written to the store once per
/// batch window. Event pushes go straight to the event log. An unauthorized
/// report on the [`ErrorBoard`] tears the session down: the live feed is
/// closed, the bearer token dropped and every collection cleared.
pub struct SyncLayer {
	config: SyncConfig,
	endpoint: Endpoint,
	manager: ChannelManager,
	errors: Arc<ErrorBoard>,
	session: Arc<Session>,
}

impl SyncLayer {
	pub fn new(config: SyncConfig, transport: Arc<dyn Transport>) -> Result<Self> {
		config.validate()?;
		let endpoint = config.endpoint()?;
		let client = Arc::new(PullClient::new(config.api_base()?, config.api.paths.clone()));
		let session = Arc::new(Session {
			store: StoreHandle::new(),
			client,
			feed: Mutex::new(None),
			sessions: GenerationClock::new(),
		});
		let errors = Arc::new(ErrorBoard::new());
		errors.on_unauthorized({
			let session = Arc::downgrade(&session);
			move |_| {
				if let Some(session) = session.upgrade() {
					session.teardown();
				}
			}
		});
		Ok(Self {
			manager: ChannelManager::new(transport, config.channel_config()),
			config,
			endpoint,
			errors,
			session,
		})
	}

	pub fn config(&self) -> &SyncConfig {
		&self.config
	}

	pub fn store(&self) -> &StoreHandle {
		&self.session.store
	}

	pub fn client(&self) -> &Arc<PullClient> {
		&self.session.client
	}

	pub fn errors(&self) -> &Arc<ErrorBoard> {
		&self.errors
	}

	pub fn error_sink(&self) -> SharedErrorSink {
		self.errors.clone()
	}

	/// Opens the live feed, replacing one already open.
	///
	/// A token authorizes both the channel, as its `token` query parameter,
	/// and later pulls.
	pub fn connect(&self, token: Option<&str>) {
		self.session.close_feed();
		let mut endpoint = self.endpoint.clone();
		if let Some(token) = token {
			self.session.client.set_token(token);
			endpoint = endpoint.with_query_param("token", token);
		}
		let socket = StationEventSocket::new(self.manager.open(&endpoint));
		let store = self.session.store.clone();

		let batcher = Arc::new(UpdateBatcher::coalescing(self.config.batch_window(), |record: &EvseStatusRecord| record.key(), {
			let store = store.clone();
			move |record: EvseStatusRecord| {
				store.write(|s| s.evse_statuses_mut().upsert_one(record));
			}
		}));

		let statuses = socket.on_event(StationAction::WatchStatusEvent, {
			let store = store.clone();
			let batcher = Arc::clone(&batcher);
			move |push| {
				let updates = store.read(|s| status_updates(s, &push));
				trace!(station = push.station_id, updates = updates.len(), "sync.status_push");
				for update in updates {
					batcher.record(update);
				}
			}
		});
		let events = socket.on_event(StationAction::WatchAllEvent, {
			let store = store.clone();
			move |push| {
				let event = event_from_push(push);
				store.write(|s| s.events_mut().upsert_one(event));
			}
		});
		let replies = socket.on_reply({
			let errors = Arc::clone(&self.errors);
			move |reply| {
				if let StationMessage::Reply { action, status, info } = reply
					&& status == "Rejected"
				{
					let message = info.and_then(|info| info.message).unwrap_or_default();
					errors.report(ErrorReport::new(None, format!("{action:?} rejected"), message));
				} else {
					trace!("sync.reply_accepted");
				}
			}
		});

		*self.session.feed.lock() = Some(LiveFeed {
			_subscriptions: [statuses, events, replies],
			batcher,
			socket,
		});
		info!(endpoint = %self.endpoint, "sync.connected");
	}

	/// Closes the live feed, dropping buffered status updates. Returns false if none was open.
	pub fn disconnect(&self) -> bool {
		self.session.close_feed()
	}

	/// Ends the session as an unauthorized response would.
	pub fn sign_out(&self) {
		self.session.teardown();
	}

	pub fn is_connected(&self) -> bool {
		self.session.feed.lock().is_some()
	}

	fn with_feed<R>(&self, f: impl FnOnce(&LiveFeed) -> R) -> Option<R> {
		self.session.feed.lock().as_ref().map(f)
	}

	pub fn channel_status(&self) -> Option<ChannelStatus> {
		self.with_feed(|feed| feed.socket.channel().status())
	}

	pub fn watch_channel(&self) -> Option<watch::Receiver<ChannelStatus>> {
		self.with_feed(|feed| feed.socket.channel().watch_status())
	}

	/// Reopens a channel that closed or gave up reconnecting.
	pub fn reconnect(&self) -> bool {
		self.with_feed(|feed| feed.socket.channel().reconnect()).is_some()
	}

	/// Watches status pushes of the given stations, replacing the previous watch.
	pub fn watch_status(&self, station_ids: impl IntoIterator<Item = u64>) -> bool {
		self.with_feed(|feed| feed.socket.watch_status_events(station_ids)).unwrap_or(false)
	}

	/// Watches every event of one station, replacing the previous watch.
	pub fn watch_station(&self, station_id: u64) -> bool {
		self.with_feed(|feed| feed.socket.watch_all_events(station_id)).unwrap_or(false)
	}

	pub fn remote_start(&self, station_id: u64, evse_id: u64) -> bool {
		self.with_feed(|feed| feed.socket.remote_start(station_id, evse_id)).unwrap_or(false)
	}

	pub fn remote_stop(&self, station_id: u64, evse_id: u64) -> bool {
		self.with_feed(|feed| feed.socket.remote_stop(station_id, evse_id)).unwrap_or(false)
	}

	/// Status updates waiting for the next batch window.
	pub fn pending_updates(&self) -> usize {
		self.with_feed(|feed| feed.batcher.pending()).unwrap_or(0)
	}

	/// Writes buffered status updates now. Returns how many were delivered.
	pub fn flush_updates(&self) -> usize {
		self.with_feed(|feed| feed.batcher.flush_now()).unwrap_or(0)
	}

	/// List query preloaded with the configured page limit.
	pub fn list_query(&self) -> ListQuery {
		ListQuery::new().limit(self.config.fetch.page_limit)
	}

	/// Scroll call site reporting to the error board. Pull actions resolve to the page cursor.
	pub fn scroll_site(&self, name: impl Into<String>) -> ScrollFetch<CursorEnvelope> {
		ScrollFetch::new(name, self.config.fetch.scroll_lookahead, self.error_sink())
	}

	/// Viewport call site reporting to the error board.
	pub fn viewport_site<T: Clone + Send + Sync + 'static>(&self, name: impl Into<String>) -> ViewportFetch<T> {
		ViewportFetch::new(name, self.config.fetch.viewport_precision, self.error_sink())
	}

	pub fn view_state(&self) -> ViewStateSync {
		ViewStateSync::new(self.config.fetch.viewport_precision)
	}

	/// Whether the map is zoomed in far enough to list individual stations.
	pub fn is_zoom_in_limit(&self, map: &MapState) -> bool {
		map.is_zoom_in_limit(self.config.fetch.min_list_zoom)
	}

	fn pull<E, M>(&self, resource: Resource, query: ListQuery, merge: M) -> impl Future<Output = evfleet_fetch::Result<CursorEnvelope>> + Send + 'static
	where
		E: DeserializeOwned + Send + 'static,
		M: FnOnce(&mut EntityStore, Vec<E>) + Send + 'static,
	{
		let scope = self.session.pull_scope();
		async move {
			let Page { items, cursor } = scope.client.list::<E>(resource, &query).await?;
			let count = items.len();
			if scope.write(move |s| merge(s, items)).is_none() {
				return Ok(CursorEnvelope::default());
			}
			debug!(?resource, count, has_more = cursor.has_more(), "sync.pulled");
			Ok(cursor)
		}
	}

	/// Pulls one page of stations into the store.
	pub fn pull_stations(&self, query: ListQuery) -> impl Future<Output = evfleet_fetch::Result<CursorEnvelope>> + Send + 'static {
		self.pull(Resource::Stations, query, |store, items: Vec<Station>| {
			store.update_stations(|stations| stations.upsert_many(items));
		})
	}

	pub fn pull_sites(&self, query: ListQuery) -> impl Future<Output = evfleet_fetch::Result<CursorEnvelope>> + Send + 'static {
		self.pull(Resource::Sites, query, |store, items: Vec<Site>| {
			store.update_sites(|sites| sites.upsert_many(items));
		})
	}

	pub fn pull_evses(&self, query: ListQuery) -> impl Future<Output = evfleet_fetch::Result<CursorEnvelope>> + Send + 'static {
		self.pull(Resource::Evses, query, |store, items: Vec<Evse>| {
			store.evses_mut().upsert_many(items);
		})
	}

	pub fn pull_statuses(&self, query: ListQuery) -> impl Future<Output = evfleet_fetch::Result<CursorEnvelope>> + Send + 'static {
		self.pull(Resource::StationStatus, query, |store, items: Vec<EvseStatusRecord>| {
			store.evse_statuses_mut().upsert_many(items);
		})
	}

	pub fn pull_users(&self, query: ListQuery) -> impl Future<Output = evfleet_fetch::Result<CursorEnvelope>> + Send + 'static {
		self.pull(Resource::Users, query, |store, items: Vec<User>| {
			store.users_mut().upsert_many(items);
		})
	}

	/// Pulls the sub-units of one station and their statuses.
	pub fn pull_station_detail(&self, station_id: u64) -> impl Future<Output = evfleet_fetch::Result<()>> + Send + 'static {
		let scope = self.session.pull_scope();
		async move {
			let evses: Vec<Evse> = scope.client.evses_of_station(station_id).await?;
			let statuses: Vec<EvseStatusRecord> = scope.client.status_of_station(station_id).await?;
			debug!(station_id, evses = evses.len(), statuses = statuses.len(), "sync.pulled_detail");
			scope.write(move |s| {
				s.evses_mut().upsert_many(evses);
				s.evse_statuses_mut().upsert_many(statuses);
			});
			Ok(())
		}
	}

	/// Pulls the event log of one station. Resolves to how many events were new.
	pub fn pull_station_events(&self, station_id: u64) -> impl Future<Output = evfleet_fetch::Result<usize>> + Send + 'static {
		let scope = self.session.pull_scope();
		async move {
			let events: Vec<StationEvent> = scope.client.events_of_station(station_id).await?;
			Ok(scope.write(move |s| s.events_mut().upsert_many(events)).unwrap_or(0))
		}
	}
}

impl std::fmt::Debug for SyncLayer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SyncLayer")
			.field("endpoint", &self.endpoint)
			.field("connected", &self.is_connected())
			.field("errors", &self.errors)
			.finish_non_exhaustive()
	}
}
