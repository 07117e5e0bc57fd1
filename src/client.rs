use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::Deserialize;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{
    ChatReply, ChatRequest, ChatRoute, TokenParams, TokenResponse, VoiceCredential,
};

/// Backend used when neither an explicit URL nor the environment names one.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "TELLER_API_URL";

/// Client for the agent backend.
///
/// No request timeout is applied unless one is passed to
/// [`AgentClient::with_options`]; the transport's own limits govern otherwise.
#[derive(Clone)]
pub struct AgentClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl AgentClient {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the `TELLER_API_URL`
    /// environment variable, falling back to [`DEFAULT_API_URL`].
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = resolve_base_url(base_url)?;
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every exchange.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The normalized backend base URL (always ends in `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send one chat turn and return the backend's reply.
    pub async fn send_chat(&self, route: ChatRoute, request: &ChatRequest) -> Result<ChatReply> {
        let result = self.try_send_chat(route, request).await;
        match &result {
            Ok(reply) => {
                if let Some(logger) = &self.logger {
                    logger.log_chat(request, reply);
                }
            }
            Err(err) => self.record_failure("chat", err),
        }
        result
    }

    async fn try_send_chat(&self, route: ChatRoute, request: &ChatRequest) -> Result<ChatReply> {
        let url = self.endpoint(route.path())?;
        tracing::debug!(
            %url,
            customer = request.customer_id.as_ref().map(|c| c.as_str()),
            thread = request.thread_id.as_ref().map(|t| t.as_str()),
            "sending chat turn"
        );
        let response = self.execute(self.client.post(url).json(request)).await?;
        response.json::<ChatReply>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse chat reply: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// Request a media-room credential for one call attempt.
    ///
    /// Placeholder or missing media-server URLs are rejected here with
    /// [`Error::Configuration`] so that no caller ever tries to join with them.
    pub async fn request_voice_token(&self, params: &TokenParams) -> Result<VoiceCredential> {
        let result = self.try_request_voice_token(params).await;
        match &result {
            Ok(credential) => {
                if let Some(logger) = &self.logger {
                    logger.log_credential(credential);
                }
            }
            Err(err) => self.record_failure("voice_token", err),
        }
        result
    }

    async fn try_request_voice_token(&self, params: &TokenParams) -> Result<VoiceCredential> {
        let url = self.endpoint("voice/token")?;
        tracing::debug!(
            %url,
            room = %params.room_name,
            participant = %params.participant_name,
            "requesting voice token"
        );
        let response = self.execute(self.client.post(url).query(params)).await?;
        let body = response.json::<TokenResponse>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse voice token: {}", e),
                Some(Box::new(e)),
            )
        })?;
        VoiceCredential::from_response(body)
    }

    /// Probe the backend root and return its status message.
    pub async fn health(&self) -> Result<String> {
        let result = self.try_health().await;
        if let Err(err) = &result {
            self.record_failure("health", err);
        }
        result
    }

    async fn try_health(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct Health {
            message: String,
        }

        let url = self.endpoint("")?;
        let response = self.execute(self.client.get(url)).await?;
        let health = response.json::<Health>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse health response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        Ok(health.message)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn record_failure(&self, operation: &str, err: &Error) {
        CLIENT_REQUEST_ERRORS.click();
        tracing::debug!(operation, error = %err, "backend request failed");
        if let Some(logger) = &self.logger {
            logger.log_failure(operation, err);
        }
    }

    /// Send a request and turn transport failures and error statuses into [`Error`].
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {}", e),
                    self.timeout.map(|t| t.as_secs_f64()),
                )
            } else if e.is_connect() {
                Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
            } else {
                Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
            }
        });
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        let response = response?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    /// Process backend error responses and convert to our Error type.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        // FastAPI reports failures as {"detail": ...}; detail is a string for
        // raised HTTP errors and a list for validation failures.
        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<serde_json::Value>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.detail)
            .map(|detail| match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            });
        let error_message = match detail {
            Some(detail) => detail,
            None if !error_body.trim().is_empty() => error_body,
            None => status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string(),
        };

        match status_code {
            404 => Error::not_found(error_message),
            422 => Error::unprocessable(error_message),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(status_code, error_message),
            _ => Error::api(status_code, error_message),
        }
    }
}

impl std::fmt::Debug for AgentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

/// Pick the base URL (explicit, then environment, then default) and make sure
/// relative joins land underneath it.
fn resolve_base_url(base_url: Option<String>) -> Result<Url> {
    let raw = match base_url {
        Some(url) => url,
        None => env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::validation(
            "backend URL must not be empty",
            Some("base_url".to_string()),
        ));
    }
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(format!("{raw} cannot be used as a base URL"), None));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = AgentClient::new(Some("http://backend.test:8000".to_string())).unwrap();
        assert_eq!(client.base_url().as_str(), "http://backend.test:8000/");
        assert_eq!(client.timeout, None);

        let client = AgentClient::with_options(
            Some("https://bank.example.com/api".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url().as_str(), "https://bank.example.com/api/");
        assert_eq!(client.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn endpoints_stay_under_base() {
        let client = AgentClient::new(Some("https://bank.example.com/api".to_string())).unwrap();
        assert_eq!(
            client.endpoint(ChatRoute::Hosted.path()).unwrap().as_str(),
            "https://bank.example.com/api/chat"
        );
        assert_eq!(
            client.endpoint(ChatRoute::Local.path()).unwrap().as_str(),
            "https://bank.example.com/api/chat/local"
        );
        assert_eq!(
            client.endpoint("voice/token").unwrap().as_str(),
            "https://bank.example.com/api/voice/token"
        );
        assert_eq!(
            client.endpoint("").unwrap().as_str(),
            "https://bank.example.com/api/"
        );
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(resolve_base_url(Some("  ".to_string())).unwrap_err().is_validation());
        assert!(matches!(
            resolve_base_url(Some("not a url".to_string())),
            Err(Error::Url { .. })
        ));
        assert!(matches!(
            resolve_base_url(Some("mailto:teller@example.com".to_string())),
            Err(Error::Url { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_connection_error() {
        // Port 9 (discard) is closed on loopback in any sane test environment.
        let client = AgentClient::new(Some("http://127.0.0.1:9".to_string())).unwrap();
        let err = client
            .send_chat(ChatRoute::Hosted, &ChatRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(err.is_connection(), "unexpected error: {err:?}");
        assert_eq!(err.status_code(), None);
    }
}
