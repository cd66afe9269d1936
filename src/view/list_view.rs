use chrono::{DateTime, Local};

use crate::constants::Message;
use crate::external_api::tags_api::models::tag::Tag;
use crate::external_api::tags_api::models::tags_response::TagsResponse;
use super::query_cache::QueryView;
use super::route_state::RouteState;

const SELECT_CELL: &str = "[ ]";
const ACTIONS_CELL: &str = "...";
const HEADERS: [&str; 4] = ["", "Tag", "Amount of videos", ""];
const LOADING: &str = "Loading tags...";
const NO_TAGS: &str = "No tags found";
const PLACEHOLDER_MARK: &str = "(showing previous results)";

/// Everything one frame of the tag list is drawn from
pub struct Screen<'a> {
    pub route: &'a RouteState,
    pub live_filter: &'a str,
    pub view: QueryView<'a>,
    pub notice: Option<&'a str>,
    pub updated_at: Option<DateTime<Local>>,
}

pub fn render_screen(screen: &Screen) -> String {
    let mut lines = vec![render_toolbar(screen.live_filter, screen.route.filter())];

    if let Some(notice) = screen.notice {
        lines.push(format!("! {}", notice));
    }
    if let Some(error) = screen.view.error {
        lines.push(format!("! {}", Message::FetchFailed(error.to_string()).to_formatted_string()));
    }

    match screen.view.data {
        Some(response) => {
            if screen.view.is_placeholder {
                lines.push(PLACEHOLDER_MARK.to_string());
            }
            lines.push(render_table(&response.data));
            lines.push(render_pagination(response, screen.route.page()));
        }
        None if screen.view.error.is_none() => lines.push(LOADING.to_string()),
        None => {}
    }

    let mut status = format!("Location: {}", screen.route.location());
    if screen.view.is_fetching && screen.view.data.is_some() {
        status.push_str(" | refreshing...");
    }
    if let Some(updated_at) = screen.updated_at {
        status.push_str(&format!(" | updated {}", updated_at.format("%H:%M:%S")));
    }
    lines.push(status);
    lines.join("\n")
}

/// Title bar and the search/filter/export controls
pub fn render_toolbar(live_filter: &str, committed_filter: &str) -> String {
    let mut search = format!("Search tags... [{}] [Filter]", live_filter);
    if live_filter != committed_filter {
        search.push_str(&format!(" (applied: \"{}\")", committed_filter));
    }
    format!("Tags [+ Create new]\n{}  [Export]", search)
}

pub fn render_table(tags: &[Tag]) -> String {
    let rows: Vec<[String; 4]> = tags
        .iter()
        .map(|tag| {
            [
                SELECT_CELL.to_string(),
                tag.title.clone(),
                format!("{} video(s)", tag.amount_of_videos),
                ACTIONS_CELL.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|header| header.chars().count());
    widths[0] = widths[0].max(SELECT_CELL.len());
    widths[3] = widths[3].max(ACTIONS_CELL.len());
    for (row, tag) in rows.iter().zip(tags) {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
        widths[1] = widths[1].max(tag.id.chars().count());
    }

    let mut lines = vec![
        render_row(&HEADERS.map(String::from), &widths),
        widths.iter().map(|width| "-".repeat(width + 2)).collect::<Vec<_>>().join("+"),
    ];
    for (row, tag) in rows.iter().zip(tags) {
        lines.push(render_row(row, &widths));
        lines.push(render_row(&[String::new(), tag.id.clone(), String::new(), String::new()], &widths));
    }
    if tags.is_empty() {
        lines.push(format!(" {}", NO_TAGS));
    }
    lines.join("\n")
}

fn render_row(cells: &[String; 4], widths: &[usize; 4]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!(" {:<width$} ", cell, width = width))
        .collect::<Vec<_>>()
        .join("|")
        .trim_end()
        .to_string()
}

pub fn render_pagination(response: &TagsResponse, page: u32) -> String {
    format!(
        "Showing {} of {} items | Page {} of {} | :prev :next",
        response.data.len(),
        response.items,
        page,
        response.pages.max(1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_response() -> TagsResponse {
        TagsResponse::new_test(
            2,
            5,
            42,
            vec![
                Tag::new_test("t-11", "music", 14),
                Tag::new_test("t-12", "music video", 1),
            ],
        )
    }

    #[test]
    fn test_render_table_rows() {
        let table = render_table(&scenario_response().data);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 2 + 2 * 2);
        assert!(lines[0].contains("Tag"));
        assert!(lines[0].contains("Amount of videos"));
        assert!(lines[2].starts_with(" [ ] | music "));
        assert!(lines[2].contains("14 video(s)"));
        assert!(lines[2].ends_with("..."));
        assert!(lines[3].contains("t-11"));
        assert!(lines[4].contains("music video"));
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let table = render_table(&scenario_response().data);
        let separators: Vec<Vec<usize>> = table
            .lines()
            .filter(|line| !line.starts_with('-'))
            .map(|line| line.match_indices('|').map(|(index, _)| index).collect())
            .collect();
        assert!(separators.windows(2).all(|pair| pair[0][..2] == pair[1][..2]));
    }

    #[test]
    fn test_render_empty_table() {
        let table = render_table(&[]);
        assert_eq!(table.lines().count(), 3);
        assert!(table.ends_with(NO_TAGS));
    }

    #[test]
    fn test_render_pagination() {
        assert_eq!(
            render_pagination(&scenario_response(), 2),
            "Showing 2 of 42 items | Page 2 of 5 | :prev :next"
        );
        let empty = TagsResponse::new_test(1, 0, 0, vec![]);
        assert!(render_pagination(&empty, 1).contains("Page 1 of 1"));
    }

    #[test]
    fn test_render_toolbar_shows_uncommitted_input() {
        assert!(!render_toolbar("music", "music").contains("applied"));
        assert!(render_toolbar("musi", "").contains("Search tags... [musi] [Filter] (applied: \"\")"));
    }

    #[test]
    fn test_render_screen_scenario() {
        let route = RouteState::from_query("?page=2&filter=music");
        let response = scenario_response();
        let screen = Screen {
            route: &route,
            live_filter: "music",
            view: QueryView { data: Some(&response), ..Default::default() },
            notice: None,
            updated_at: None,
        };
        let frame = render_screen(&screen);
        assert!(frame.contains("music video"));
        assert!(frame.contains("Page 2 of 5"));
        assert!(frame.contains("42 items"));
        assert!(frame.ends_with("Location: ?page=2&filter=music"));
        assert!(!frame.contains(PLACEHOLDER_MARK));
    }

    #[test]
    fn test_render_screen_loading() {
        let route = RouteState::default();
        let screen = Screen {
            route: &route,
            live_filter: "",
            view: QueryView { is_fetching: true, ..Default::default() },
            notice: None,
            updated_at: None,
        };
        assert!(render_screen(&screen).contains(LOADING));
    }

    #[test]
    fn test_render_screen_error_with_placeholder() {
        let route = RouteState::new("", 3);
        let response = scenario_response();
        let screen = Screen {
            route: &route,
            live_filter: "",
            view: QueryView {
                data: Some(&response),
                is_placeholder: true,
                is_fetching: false,
                error: Some("Network error: refused"),
            },
            notice: Some("'Export' is not available yet"),
            updated_at: None,
        };
        let frame = render_screen(&screen);
        assert!(frame.contains("! 'Export' is not available yet"));
        assert!(frame.contains("! Failed to load tags: Network error: refused. Type :refresh to try again"));
        assert!(frame.contains(PLACEHOLDER_MARK));
        assert!(!frame.contains(LOADING));
    }
}
