//! Per-key cache of fetched tag pages.
//!
//! Keys are `(filter, page)`. A fetch is described by a [`FetchTicket`] carrying a
//! generation number; results are stored for their key unless a newer fetch for
//! the same key was issued, and they only reach the screen while their key is
//! still the active one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::external_api::tags_api::models::tags_response::TagsResponse;
use crate::external_api::ApiError;
use super::route_state::RouteState;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub filter: String,
    pub page: u32,
}

impl QueryKey {
    pub fn new(filter: &str, page: u32) -> Self {
        Self { filter: filter.to_string(), page }
    }
}

impl From<&RouteState> for QueryKey {
    fn from(route: &RouteState) -> Self {
        Self::new(route.filter(), route.page())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Fetching,
    Success,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Option<Arc<TagsResponse>>,
    pub fetched_at: Option<Instant>,
    pub status: QueryStatus,
    latest_generation: u64,
    stale: bool,
    last_used: Instant,
}

impl CacheEntry {
    fn new() -> Self {
        Self {
            data: None,
            fetched_at: None,
            status: QueryStatus::Idle,
            latest_generation: 0,
            stale: false,
            last_used: Instant::now(),
        }
    }

    fn is_fresh(&self, stale_time: Duration) -> bool {
        !self.stale
            && self.data.is_some()
            && self.fetched_at.is_some_and(|at| at.elapsed() < stale_time)
    }
}

/// A fetch the caller has to perform and report back with [`QueryCache::complete`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: QueryKey,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Cached data is within the freshness window
    Fresh,
    /// A fetch for this key is already running
    InFlight,
    Fetch(FetchTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Stored and shown: the key is the active one
    Applied,
    /// Stored for later, but the user has moved to another key
    Abandoned,
    /// Dropped: a newer fetch for the same key was issued
    Superseded,
}

/// What the screen can show for the active key
#[derive(Debug, Clone, Default)]
pub struct QueryView<'a> {
    pub data: Option<&'a TagsResponse>,
    /// `data` belongs to a previously displayed key
    pub is_placeholder: bool,
    pub is_fetching: bool,
    pub error: Option<&'a str>,
}

pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    stale_time: Duration,
    cache_time: Duration,
    generation: u64,
    active: Option<QueryKey>,
    last_shown: Option<Arc<TagsResponse>>,
}

impl QueryCache {
    /// Entries not requested for `cache_time` are dropped, except the active one
    /// and those with a fetch in flight
    pub fn new(stale_time: Duration, cache_time: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stale_time,
            cache_time,
            generation: 0,
            active: None,
            last_shown: None,
        }
    }

    /// Page count reported for `filter` by the most recent response stored for it
    pub fn known_pages(&self, filter: &str) -> Option<u32> {
        self.entries
            .iter()
            .filter(|(key, _)| key.filter == filter)
            .filter_map(|(_, entry)| Some((entry.fetched_at?, entry.data.as_ref()?.pages)))
            .max_by_key(|(fetched_at, _)| *fetched_at)
            .map(|(_, pages)| pages)
    }

    pub fn in_flight(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.status == QueryStatus::Fetching)
            .count()
    }

    /// Make `key` the active key and decide whether it has to be fetched
    pub fn request(&mut self, key: QueryKey) -> Lookup {
        self.remember_shown();
        self.active = Some(key.clone());
        self.evict_unused();

        let stale_time = self.stale_time;
        let entry = self.entries.entry(key.clone()).or_insert_with(CacheEntry::new);
        entry.last_used = Instant::now();
        if entry.status == QueryStatus::Fetching {
            debug!(?key, "Fetch already in flight");
            return Lookup::InFlight;
        }
        if entry.is_fresh(stale_time) {
            debug!(?key, "Serving fresh cache entry");
            return Lookup::Fresh;
        }

        self.generation += 1;
        entry.latest_generation = self.generation;
        entry.status = QueryStatus::Fetching;
        debug!(?key, generation = self.generation, "Issuing fetch");
        Lookup::Fetch(FetchTicket { key, generation: self.generation })
    }

    /// Record the outcome of a fetch issued by [`QueryCache::request`]
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<TagsResponse, ApiError>,
    ) -> Completion {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            return Completion::Superseded;
        };
        if ticket.generation < entry.latest_generation {
            debug!(key = ?ticket.key, generation = ticket.generation, "Dropping superseded response");
            return Completion::Superseded;
        }

        match result {
            Ok(response) => {
                entry.data = Some(Arc::new(response));
                entry.fetched_at = Some(Instant::now());
                entry.status = QueryStatus::Success;
                entry.stale = false;
            }
            Err(error) => {
                entry.status = QueryStatus::Error(error.to_string());
            }
        }

        if self.active.as_ref() == Some(&ticket.key) {
            Completion::Applied
        } else {
            debug!(key = ?ticket.key, "Response for an abandoned key kept in cache");
            Completion::Abandoned
        }
    }

    /// Mark `key` stale so the next request fetches it again
    pub fn invalidate(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.stale = true;
        }
    }

    pub fn view(&self) -> QueryView<'_> {
        let Some(entry) = self.active.as_ref().and_then(|key| self.entries.get(key)) else {
            return QueryView::default();
        };
        let error = match &entry.status {
            QueryStatus::Error(message) => Some(message.as_str()),
            _ => None,
        };
        let is_fetching = entry.status == QueryStatus::Fetching;

        match (&entry.data, &self.last_shown) {
            (Some(data), _) => QueryView { data: Some(data), is_placeholder: false, is_fetching, error },
            (None, Some(previous)) => QueryView { data: Some(previous), is_placeholder: true, is_fetching, error },
            (None, None) => QueryView { data: None, is_placeholder: false, is_fetching, error },
        }
    }

    fn evict_unused(&mut self) {
        let cache_time = self.cache_time;
        let active = self.active.as_ref();
        let before = self.entries.len();
        self.entries.retain(|key, entry| {
            Some(key) == active
                || entry.status == QueryStatus::Fetching
                || entry.last_used.elapsed() < cache_time
        });
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "Evicted unused cache entries");
        }
    }

    fn remember_shown(&mut self) {
        let shown = self
            .active
            .as_ref()
            .and_then(|key| self.entries.get(key))
            .and_then(|entry| entry.data.clone());
        if shown.is_some() {
            self.last_shown = shown;
        }
    }
}
