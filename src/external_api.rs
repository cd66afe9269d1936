pub mod tags_api;

use reqwest::{header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE}, Client, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const APPLICATION_JSON: &str = "application/json";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Api error {0}: {1}")]
    Api(StatusCode, String),
    #[error("Deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("URL parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to retrieve the user's directories")]
    NotFoundUserDir,
    #[error("The string entered must be a URL")]
    InvalidUrl,
    #[error("The page must be an integer greater than zero")]
    PageMustBePositive,
    #[error("Couldn't create a config")]
    CantCreateConfig,
    #[error("Couldn't read the config in the path: \"{0}\". We got an error: {1}")]
    NotReadConfig(String, String),
}

/// Basic api client
pub struct BaseApiClient {
    client: Client,
    pub base_url: Url,
}

impl BaseApiClient {

    fn build_url(&self, endpoint: &str) -> Result<Url, ApiError> {
        self.base_url.join(endpoint).map_err(|e| ApiError::Parse(e.to_string()))
    }

    fn get_default_headers() -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        headers
    }

    async fn handle_response<T: serde::de::DeserializeOwned> (
        &self,
        response: reqwest::Response
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, body_len = body.len(), "Received response");

        if !status.is_success() {
            return Err(ApiError::Api(status, body));
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(e) => Err(ApiError::Serde(e))
        }
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .default_headers(Self::get_default_headers())
            .timeout(timeout)
            .build()?;

        let parse_base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        Ok(
            Self {
                client,
                base_url: parse_base_url,
        })
    }

    pub async fn get<T: serde::de::DeserializeOwned, Q: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        query: &Q,
    ) -> Result<T, ApiError> {
        let url = self.build_url(endpoint)?;
        debug!(%url, "GET");
        let response = self.client.get(url).query(query).send().await?;
        self.handle_response(response).await
    }
}
