pub mod models;

use std::time::Duration;
use tracing::debug;
use super::{BaseApiClient, ApiError};
use crate::constants::{PER_PAGE, TAGS_ENDPOINT};
use crate::view::query_cache::QueryKey;
use models::tags_response::TagsResponse;


pub struct TagsApi {
    pub client: BaseApiClient,
}

impl TagsApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_api_client = BaseApiClient::new(base_url, timeout)?;
        Ok(Self { client: base_api_client })
    }

    #[cfg(test)]
    pub fn mock(base_url: &str) -> Self {
        let base_api_client = BaseApiClient::new(base_url, Duration::from_secs(5)).unwrap();
        Self { client: base_api_client }
    }

    /// `GET /tags?_page={page}&_per_page=10&title={filter}`
    pub async fn fetch_page(&self, key: &QueryKey) -> Result<TagsResponse, ApiError> {
        let page = key.page.to_string();
        let per_page = PER_PAGE.to_string();
        let query = [
            ("_page", page.as_str()),
            ("_per_page", per_page.as_str()),
            ("title", key.filter.as_str()),
        ];
        let response: TagsResponse = self.client.get(TAGS_ENDPOINT, &query).await?;
        debug!(?response, "Fetched tags page");
        Ok(response)
    }

    #[cfg(test)]
    pub async fn mock_get_tags(
        server: &mut mockito::ServerGuard,
        filter: &str,
        page: u32,
        response: &TagsResponse,
    ) -> mockito::Mock {
        use mockito::Matcher;
        server
            .mock("GET", TAGS_ENDPOINT)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("_page".into(), page.to_string()),
                Matcher::UrlEncoded("_per_page".into(), PER_PAGE.to_string()),
                Matcher::UrlEncoded("title".into(), filter.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::to_string(response).unwrap())
            .create_async()
            .await
    }
}
