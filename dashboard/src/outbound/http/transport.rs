//! Shared reqwest transport: endpoint building, request execution and
//! mapping of HTTP failures into domain errors.

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::dto::ErrorBodyDto;
use crate::domain::{AuthToken, Error, ErrorCode, GENERIC_NETWORK_FAILURE};

const USER_AGENT: &str = concat!("dashboard/", env!("CARGO_PKG_VERSION"));
const PROJECT_HEADER: &str = "x-project-id";

/// Base URL, project identity and pooled client shared by every adapter.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
    project_id: HeaderValue,
}

impl HttpTransport {
    /// Build a transport with a default reqwest client.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be constructed or the project
    /// id is not a valid header value.
    pub fn new(base: Url, project_id: &str) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| Error::internal(format!("failed to build HTTP client: {err}")))?;
        Self::with_client(client, base, project_id)
    }

    /// Build a transport around an existing client.
    ///
    /// # Errors
    ///
    /// Returns an error when the project id is not a valid header value.
    pub fn with_client(client: Client, base: Url, project_id: &str) -> Result<Self, Error> {
        let project_id = HeaderValue::from_str(project_id)
            .map_err(|err| Error::internal(format!("invalid project id: {err}")))?;
        Ok(Self {
            client,
            base,
            project_id,
        })
    }

    /// `base` with `segments` appended as percent-encoded path segments.
    pub(super) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::internal(format!("base URL {} cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(super) fn get(&self, url: Url) -> RequestBuilder {
        self.client.get(url)
    }

    pub(super) fn post(&self, url: Url) -> RequestBuilder {
        self.client.post(url)
    }

    pub(super) fn put(&self, url: Url) -> RequestBuilder {
        self.client.put(url)
    }

    pub(super) fn delete(&self, url: Url) -> RequestBuilder {
        self.client.delete(url)
    }

    /// Send `request` and read the whole body.
    pub(super) async fn execute(
        &self,
        request: RequestBuilder,
        token: Option<AuthToken>,
    ) -> Result<(StatusCode, Vec<u8>), Error> {
        let request = request
            .header(ACCEPT, "application/json")
            .header(PROJECT_HEADER, self.project_id.clone());
        let request = match token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        };
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(status = status.as_u16(), bytes = body.len(), "backend responded");
        Ok((status, body.to_vec()))
    }
}

pub(super) fn map_transport_error(error: reqwest::Error) -> Error {
    warn!(%error, timeout = error.is_timeout(), "backend request failed");
    Error::network_failure()
}

/// Error code for a non-2xx status.
pub(super) fn code_for_status(status: StatusCode) -> ErrorCode {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorCode::InvalidRequest,
        StatusCode::UNAUTHORIZED => ErrorCode::Unauthorized,
        StatusCode::FORBIDDEN => ErrorCode::Forbidden,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::CONFLICT => ErrorCode::Conflict,
        status if status.is_client_error() => ErrorCode::InvalidRequest,
        _ => ErrorCode::ServiceUnavailable,
    }
}

/// Human-readable message carried by an error body, if any.
///
/// Checked in order: `message`, `error` as a string, `error.message`.
pub(super) fn extract_message(body: &[u8]) -> Option<String> {
    let decoded: ErrorBodyDto = serde_json::from_slice(body).ok()?;
    decoded.into_message()
}

pub(super) fn map_status_error(status: StatusCode, body: &[u8]) -> Error {
    let message = extract_message(body).unwrap_or_else(|| GENERIC_NETWORK_FAILURE.to_owned());
    let code = code_for_status(status);
    if code == ErrorCode::ServiceUnavailable {
        warn!(status = status.as_u16(), %message, "backend failure");
    } else {
        debug!(status = status.as_u16(), %message, "backend rejected request");
    }
    Error::new(code, message).with_details(json!({ "status": status.as_u16() }))
}

/// Decode a bare or `{"data": ...}`-wrapped payload.
pub(super) fn decode<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T, Error> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| Error::internal(format!("invalid {what} payload: {err}")))?;
    let inner = match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(inner)
        .map_err(|err| Error::internal(format!("invalid {what} payload: {err}")))
}
