//! Shareable location state (`?page=2&filter=music`).
//!
//! [`RouteState`] is immutable; the only way to change the location is
//! [`RouteStore::update`], which also records history and notifies subscribers.

use tokio::sync::watch;
use tracing::debug;
use url::form_urlencoded;

const PAGE_PARAM: &str = "page";
const FILTER_PARAM: &str = "filter";
pub const FIRST_PAGE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteState {
    filter: String,
    page: u32,
    /// Parameters this view does not own, kept so they survive updates
    extra: Vec<(String, String)>,
}

impl Default for RouteState {
    fn default() -> Self {
        Self { filter: String::new(), page: FIRST_PAGE, extra: Vec::new() }
    }
}

/// Partial update merged into the current [`RouteState`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteUpdate {
    pub filter: Option<String>,
    pub page: Option<u32>,
}

impl RouteUpdate {
    /// Commit a filter; always goes back to the first page
    pub fn commit_filter(filter: &str) -> Self {
        Self { filter: Some(filter.to_string()), page: Some(FIRST_PAGE) }
    }

    pub fn page(page: u32) -> Self {
        Self { filter: None, page: Some(page) }
    }
}

fn parse_page(value: &str) -> u32 {
    match value.trim().parse::<u32>() {
        Ok(page) if page >= FIRST_PAGE => page,
        _ => FIRST_PAGE,
    }
}

impl RouteState {
    pub fn new(filter: &str, page: u32) -> Self {
        Self { filter: filter.to_string(), page: page.max(FIRST_PAGE), extra: Vec::new() }
    }

    /// Build the state from a location.
    ///
    /// Accepts a bare query (`page=2`), a search string (`?page=2`) or a full URL.
    /// A missing or unparseable `page` falls back to the first page, a missing
    /// `filter` to the empty string.
    pub fn from_query(location: &str) -> Self {
        let location = location.trim();
        let query = match location.split_once('?') {
            Some((_, query)) => query,
            None if location.contains("://") => "",
            None => location,
        };
        let query = query.split('#').next().unwrap_or_default();

        let mut state = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PAGE_PARAM => state.page = parse_page(&value),
                FILTER_PARAM => state.filter = value.into_owned(),
                _ => state.extra.push((key.into_owned(), value.into_owned())),
            }
        }
        state
    }

    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer
            .append_pair(PAGE_PARAM, &self.page.to_string())
            .append_pair(FILTER_PARAM, &self.filter);
        for (key, value) in &self.extra {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Address-bar form of the state
    pub fn location(&self) -> String {
        format!("?{}", self.to_query())
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn apply(&self, update: &RouteUpdate) -> Self {
        let mut next = self.clone();
        if let Some(filter) = &update.filter {
            next.filter = filter.clone();
        }
        if let Some(page) = update.page {
            next.page = page.max(FIRST_PAGE);
        }
        next
    }
}

/// Single-writer store for the current [`RouteState`]
pub struct RouteStore {
    current: watch::Sender<RouteState>,
    history: Vec<RouteState>,
}

impl RouteStore {
    pub fn new(initial: RouteState) -> Self {
        let (current, _) = watch::channel(initial);
        Self { current, history: Vec::new() }
    }

    pub fn from_location(location: &str) -> Self {
        Self::new(RouteState::from_query(location))
    }

    pub fn current(&self) -> RouteState {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RouteState> {
        self.current.subscribe()
    }

    /// Locations visited before the current one, oldest first
    pub fn history(&self) -> &[RouteState] {
        &self.history
    }

    /// Merge `update` into the current state. Returns `true` if the location changed.
    pub fn update(&mut self, update: RouteUpdate) -> bool {
        let previous = self.current();
        let next = previous.apply(&update);
        if next == previous {
            return false;
        }
        debug!(from = %previous.location(), to = %next.location(), "Route changed");
        self.history.push(previous);
        self.current.send_replace(next);
        true
    }

    /// Return to the previous location, if any
    pub fn back(&mut self) -> Option<RouteState> {
        let previous = self.history.pop()?;
        self.current.send_replace(previous.clone());
        Some(previous)
    }
}
