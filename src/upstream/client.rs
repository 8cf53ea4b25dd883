use reqwest::header::{HeaderMap, HeaderValue, COOKIE, ORIGIN, REFERER, USER_AGENT};
use reqwest::StatusCode;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::UpstreamConfig;
use crate::errors::AppError;
use crate::upstream::payload::UpstreamPayload;

const CONVERSATION_PATH: &str = "/rest/app-chat/conversations/new";
const REQUEST_ID_HEADER: &str = "x-xai-request-id";
const STATSIG_HEADER: &str = "x-statsig-id";

/// Outbound client for the chat mirror.
/// The inner `reqwest::Client` is a shared connection pool; each call gets its
/// own request and response, so clones can be handed to concurrent handlers.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Unexpected(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: format!("{}{CONVERSATION_PATH}", config.base_url),
            headers: static_headers(config)?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends the payload and returns the response once headers arrive, with the
    /// body still unread. Anything other than `200 OK` is turned into
    /// [`AppError::UpstreamStatus`].
    pub async fn open_stream(&self, payload: &UpstreamPayload) -> Result<reqwest::Response, AppError> {
        let request_id = Uuid::new_v4().to_string();
        info!(url = %self.url, %request_id, "dispatching upstream request");

        let response = self
            .http
            .post(&self.url)
            .headers(self.headers.clone())
            .header(REQUEST_ID_HEADER, &request_id)
            .json(payload)
            .send()
            .await
            .map_err(AppError::from_send)?;

        let status = response.status();
        info!(%request_id, status = status.as_u16(), "upstream responded");

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let err = AppError::upstream_status(status.as_u16(), &body);
            warn!(%request_id, "upstream rejected request: {err}");
            return Err(err);
        }

        Ok(response)
    }
}

fn static_headers(config: &UpstreamConfig) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value("User-Agent", &config.user_agent)?);
    headers.insert(ORIGIN, header_value("Origin", config.origin())?);
    headers.insert(REFERER, header_value("Referer", &config.referer())?);
    if !config.cookie.is_empty() {
        headers.insert(COOKIE, header_value("Cookie", &config.cookie)?);
    }
    if !config.statsig_id.is_empty() {
        headers.insert(STATSIG_HEADER, header_value(STATSIG_HEADER, &config.statsig_id)?);
    }
    Ok(headers)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Unexpected(format!("invalid {name} header value: {e}")))
}
