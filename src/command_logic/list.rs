use chrono::Local;
use tracing::info;

use crate::external_api::tags_api::TagsApi;
use crate::external_api::ApiError;
use crate::view::list_view::{render_screen, Screen};
use crate::view::query_cache::{QueryKey, QueryView};
use crate::view::route_state::RouteState;

/// Fetch one page of tags for `route` and render it
pub async fn list_tags(route: &RouteState, tags_api: &TagsApi) -> Result<String, ApiError> {
    let key = QueryKey::from(route);
    info!(?key, "Listing tags");
    let response = tags_api.fetch_page(&key).await?;
    Ok(render_screen(&Screen {
        route,
        live_filter: route.filter(),
        view: QueryView { data: Some(&response), ..Default::default() },
        notice: None,
        updated_at: Some(Local::now()),
    }))
}
