//! The tag list screen: keeps the route, the search input, the debounced
//! filter and the query cache in sync.

use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::constants::{Message, CACHE_TIME_SECS, HELP_TEXT};
use crate::external_api::tags_api::models::tags_response::TagsResponse;
use crate::external_api::ApiError;
use super::debounce::Debouncer;
use super::list_view::{render_screen, Screen};
use super::query_cache::{Completion, FetchTicket, Lookup, QueryCache, QueryKey};
use super::route_state::{RouteStore, RouteUpdate, FIRST_PAGE};

/// User input on the tag list screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace the text of the search input
    Input(String),
    ApplyFilter,
    GoToPage(u32),
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    Refresh,
    Back,
    CreateNew,
    Export,
    RowMenu(String),
    Help,
    Quit,
    Unknown(String),
}

impl Action {
    /// Lines starting with `:` are commands, anything else is search text
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(command) = line.strip_prefix(':') else {
            return Action::Input(line.to_string());
        };
        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let argument = parts.next();
        match (name, argument) {
            ("filter" | "f", None) => Action::ApplyFilter,
            ("clear", None) => Action::Input(String::new()),
            ("page" | "p", Some(page)) => match page.parse::<u32>() {
                Ok(page) if page >= FIRST_PAGE => Action::GoToPage(page),
                _ => Action::Unknown(command.to_string()),
            },
            ("next" | "n", None) => Action::NextPage,
            ("prev" | "previous", None) => Action::PrevPage,
            ("first", None) => Action::FirstPage,
            ("last", None) => Action::LastPage,
            ("refresh" | "r", None) => Action::Refresh,
            ("back" | "b", None) => Action::Back,
            ("create", None) => Action::CreateNew,
            ("export", None) => Action::Export,
            ("menu", Some(tag_id)) => Action::RowMenu(tag_id.to_string()),
            ("help" | "h", None) => Action::Help,
            ("quit" | "q", None) => Action::Quit,
            _ => Action::Unknown(command.to_string()),
        }
    }
}

pub struct TagListView {
    route: RouteStore,
    live_filter: String,
    debounced_filter: Debouncer<String>,
    cache: QueryCache,
    notice: Option<String>,
    updated_at: Option<DateTime<Local>>,
}

impl TagListView {
    /// Needs a tokio runtime for the debounce timer
    pub fn new(route: RouteStore, debounce_delay: Duration, stale_time: Duration) -> Self {
        let committed = route.current().filter().to_string();
        Self {
            route,
            live_filter: committed.clone(),
            debounced_filter: Debouncer::new(committed, debounce_delay),
            cache: QueryCache::new(stale_time, Duration::from_secs(CACHE_TIME_SECS)),
            notice: None,
            updated_at: None,
        }
    }

    pub fn route(&self) -> &RouteStore {
        &self.route
    }

    pub fn live_filter(&self) -> &str {
        &self.live_filter
    }

    pub fn subscribe_debounced(&self) -> watch::Receiver<String> {
        self.debounced_filter.subscribe()
    }

    /// Key of the data the screen should show: debounced search text and committed page
    pub fn query_key(&self) -> QueryKey {
        QueryKey::new(&self.debounced_filter.value(), self.route.current().page())
    }

    /// `true` while a debounce countdown or a fetch is still running
    pub fn is_busy(&self) -> bool {
        self.debounced_filter.is_pending() || self.cache.in_flight() > 0
    }

    /// Apply a user action. Returns `false` when the screen should close.
    pub fn handle(&mut self, action: Action) -> bool {
        self.notice = None;
        match action {
            Action::Input(text) => {
                self.live_filter = text.clone();
                self.debounced_filter.schedule(text);
            }
            Action::ApplyFilter => {
                info!(filter = %self.live_filter, "Applying filter");
                self.route.update(RouteUpdate::commit_filter(&self.live_filter));
                self.debounced_filter.flush(self.live_filter.clone());
            }
            Action::GoToPage(page) => self.go_to_page(page),
            Action::NextPage => self.go_to_page(self.route.current().page().saturating_add(1)),
            Action::PrevPage => self.go_to_page(self.route.current().page().saturating_sub(1)),
            Action::FirstPage => self.go_to_page(FIRST_PAGE),
            Action::LastPage => {
                let last = self.known_pages().unwrap_or(FIRST_PAGE);
                self.go_to_page(last);
            }
            Action::Refresh => {
                let key = self.query_key();
                info!(?key, "Refreshing");
                self.cache.invalidate(&key);
            }
            Action::Back => match self.route.back() {
                Some(previous) => {
                    self.live_filter = previous.filter().to_string();
                    self.debounced_filter.flush(self.live_filter.clone());
                }
                None => self.notice = Some(Message::NoHistory.to_formatted_string()),
            },
            Action::CreateNew => {
                info!("Create new requested");
                self.notice = Some(Message::NotAvailable("Create new".to_string()).to_formatted_string());
            }
            Action::Export => {
                info!("Export requested");
                self.notice = Some(Message::NotAvailable("Export".to_string()).to_formatted_string());
            }
            Action::RowMenu(tag_id) => {
                info!(%tag_id, "Row menu requested");
                self.notice = Some(Message::RowMenu(tag_id).to_formatted_string());
            }
            Action::Help => self.notice = Some(HELP_TEXT.to_string()),
            Action::Unknown(command) => {
                self.notice = Some(Message::UnknownCommand(command).to_formatted_string());
            }
            Action::Quit => return false,
        }
        true
    }

    /// Page count last reported for the filter being shown
    fn known_pages(&self) -> Option<u32> {
        let filter = self.debounced_filter.value();
        self.cache.known_pages(&filter).map(|pages| pages.max(FIRST_PAGE))
    }

    fn go_to_page(&mut self, page: u32) {
        let mut page = page.max(FIRST_PAGE);
        if let Some(pages) = self.known_pages() {
            page = page.min(pages);
        }
        debug!(page, "Changing page");
        self.route.update(RouteUpdate::page(page));
    }

    /// Point the cache at the current key. Returns the fetch to run, if one is needed.
    pub fn sync(&mut self) -> Option<FetchTicket> {
        match self.cache.request(self.query_key()) {
            Lookup::Fetch(ticket) => Some(ticket),
            Lookup::Fresh | Lookup::InFlight => None,
        }
    }

    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<TagsResponse, ApiError>,
    ) -> Completion {
        let failed = result.is_err();
        let completion = self.cache.complete(ticket, result);
        if completion == Completion::Applied && !failed {
            self.updated_at = Some(Local::now());
        }
        completion
    }

    pub fn render(&self) -> String {
        let route = self.route.current();
        render_screen(&Screen {
            route: &route,
            live_filter: &self.live_filter,
            view: self.cache.view(),
            notice: self.notice.as_deref(),
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external_api::tags_api::models::tag::Tag;
    use crate::view::route_state::RouteState;
    use rstest::rstest;
    use tokio::time::sleep;

    const DELAY: Duration = Duration::from_millis(1000);
    const STALE_TIME: Duration = Duration::from_secs(60);

    fn view_at(location: &str) -> TagListView {
        TagListView::new(RouteStore::from_location(location), DELAY, STALE_TIME)
    }

    fn response(page: u32, pages: u32, title: &str) -> TagsResponse {
        TagsResponse::new_test(page, pages, pages * 10, vec![Tag::new_test("id", title, 2)])
    }

    fn load(view: &mut TagListView, page: u32, pages: u32, title: &str) {
        let ticket = view.sync().expect("a fetch");
        view.complete(ticket, Ok(response(page, pages, title)));
    }

    #[rstest]
    #[case(":filter", Action::ApplyFilter)]
    #[case(":page 3", Action::GoToPage(3))]
    #[case(":p 12", Action::GoToPage(12))]
    #[case(":next", Action::NextPage)]
    #[case(":prev", Action::PrevPage)]
    #[case(":clear", Action::Input(String::new()))]
    #[case(":menu t-1", Action::RowMenu("t-1".to_string()))]
    #[case(":q", Action::Quit)]
    #[case("music", Action::Input("music".to_string()))]
    #[case("  spaced  ", Action::Input("  spaced  ".to_string()))]
    #[case("", Action::Input(String::new()))]
    #[case(":page 0", Action::Unknown("page 0".to_string()))]
    #[case(":page", Action::Unknown("page".to_string()))]
    #[case(":jump", Action::Unknown("jump".to_string()))]
    fn test_action_parse(#[case] line: &str, #[case] expected: Action) {
        assert_eq!(Action::parse(line), expected);
    }

    #[tokio::test]
    async fn test_initial_key_comes_from_location() {
        let view = view_at("?page=2&filter=music");
        assert_eq!(view.query_key(), QueryKey::new("music", 2));
        assert_eq!(view.live_filter(), "music");
    }

    #[tokio::test]
    async fn test_apply_filter_commits_and_resets_page() {
        let mut view = view_at("?page=4&filter=old");
        view.handle(Action::Input("new".to_string()));
        view.handle(Action::ApplyFilter);

        assert_eq!(view.route().current(), RouteState::new("new", 1));
        assert_eq!(view.query_key(), QueryKey::new("new", 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_updates_key_after_debounce_only() {
        let mut view = view_at("");
        for text in ["m", "mu", "mus"] {
            view.handle(Action::Input(text.to_string()));
            sleep(Duration::from_millis(200)).await;
            assert_eq!(view.query_key(), QueryKey::new("", 1));
        }
        assert!(view.is_busy());

        sleep(DELAY).await;
        assert_eq!(view.query_key(), QueryKey::new("mus", 1));
        assert_eq!(view.route().current().filter(), "");
        assert!(!view.is_busy());
    }

    #[tokio::test]
    async fn test_paging_is_bounded_by_known_pages() {
        let mut view = view_at("?page=1");
        view.handle(Action::PrevPage);
        assert_eq!(view.route().current().page(), 1);

        load(&mut view, 1, 3, "first");
        view.handle(Action::LastPage);
        assert_eq!(view.route().current().page(), 3);
        view.handle(Action::NextPage);
        assert_eq!(view.route().current().page(), 3);
        view.handle(Action::GoToPage(99));
        assert_eq!(view.route().current().page(), 3);
    }

    #[tokio::test]
    async fn test_paging_ignores_page_count_of_previous_filter() {
        let mut view = view_at("");
        load(&mut view, 1, 1, "everything");
        view.handle(Action::Input("rock".to_string()));
        view.handle(Action::ApplyFilter);
        assert!(view.sync().is_some());

        view.handle(Action::GoToPage(3));
        assert_eq!(view.route().current(), RouteState::new("rock", 3));
    }

    #[tokio::test]
    async fn test_paging_uses_page_count_of_filter_while_next_page_loads() {
        let mut view = view_at("?filter=rock");
        load(&mut view, 1, 2, "rock");
        view.handle(Action::NextPage);
        assert!(view.sync().is_some());

        view.handle(Action::NextPage);
        assert_eq!(view.route().current().page(), 2);
        view.handle(Action::LastPage);
        assert_eq!(view.route().current().page(), 2);
    }

    #[tokio::test]
    async fn test_race_keeps_latest_page() {
        let mut view = view_at("?page=1");
        let first = view.sync().unwrap();
        view.handle(Action::GoToPage(2));
        let second = view.sync().unwrap();

        assert_eq!(view.complete(second, Ok(response(2, 5, "page two"))), Completion::Applied);
        assert_eq!(view.complete(first, Ok(response(1, 5, "page one"))), Completion::Abandoned);

        let frame = view.render();
        assert!(frame.contains("page two"));
        assert!(!frame.contains("page one"));
        assert!(frame.contains("Page 2 of 5"));
    }

    #[tokio::test]
    async fn test_returning_to_cached_page_does_not_fetch() {
        let mut view = view_at("?page=1");
        load(&mut view, 1, 5, "page one");
        view.handle(Action::NextPage);
        load(&mut view, 2, 5, "page two");

        view.handle(Action::PrevPage);
        assert!(view.sync().is_none());
        assert!(view.render().contains("page one"));
    }

    #[tokio::test]
    async fn test_refresh_refetches_current_key() {
        let mut view = view_at("");
        load(&mut view, 1, 1, "x");
        assert!(view.sync().is_none());

        view.handle(Action::Refresh);
        assert_eq!(view.sync().map(|ticket| ticket.key), Some(QueryKey::new("", 1)));
    }

    #[tokio::test]
    async fn test_back_restores_previous_location() {
        let mut view = view_at("?page=3&filter=a");
        view.handle(Action::Input("b".to_string()));
        view.handle(Action::ApplyFilter);
        view.handle(Action::Back);

        assert_eq!(view.query_key(), QueryKey::new("a", 3));
        assert_eq!(view.live_filter(), "a");

        view.handle(Action::Back);
        assert!(view.render().contains(&Message::NoHistory.to_formatted_string()));
    }

    #[tokio::test]
    async fn test_inert_actions_show_notice() {
        let mut view = view_at("");
        view.handle(Action::Export);
        assert!(view.render().contains("'Export' is not available yet"));
        view.handle(Action::RowMenu("t-9".to_string()));
        let frame = view.render();
        assert!(frame.contains("Actions for tag 't-9' are not available yet"));
        assert!(!frame.contains("Export' is not"));
        assert!(!view.handle(Action::Quit));
    }
}
