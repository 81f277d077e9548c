use crate::error::TransportError;
use crate::transport::Transport;
use crate::types::{
    error_detail, CreateInteractionRequest, Credential, InteractionResource, Task, TaskId,
    TaskSpec,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Response;
use tracing::debug;
use url::Url;

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Longest slice of a response body quoted in an error.
const MAX_BODY_EXCERPT: usize = 1024;

/// The HTTP client for the Gemini Interactions API.
///
/// It holds the shared `reqwest::Client` and the base URL for all API requests.
/// It is cheap to clone and safe to share across concurrent research runs.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl GeminiClient {
    /// Creates a new `GeminiClient` against the public API endpoint.
    ///
    /// # Errors
    ///
    /// - `TransportError::InvalidCredential` if the key cannot be sent as a header.
    /// - `TransportError::Request` if the internal HTTP client fails to build.
    pub fn new(credential: &Credential) -> Result<Self, TransportError> {
        Self::new_with_url(credential, DEFAULT_API_URL)
    }

    /// Creates a new `GeminiClient` with a custom base URL.
    ///
    /// This is useful for testing or for routing through a proxy. A trailing
    /// slash is added when missing so that endpoint paths are appended, not
    /// substituted for the last segment.
    ///
    /// # Arguments
    ///
    /// * `credential` - The API key for authentication.
    /// * `base_url` - The base URL for the API (e.g., for a mock server).
    ///
    /// # Errors
    ///
    /// - `TransportError::InvalidCredential` if the key cannot be sent as a header.
    /// - `TransportError::Request` if the internal HTTP client fails to build.
    /// - `TransportError::UrlParseFailed` if the provided `base_url` is invalid.
    pub fn new_with_url(credential: &Credential, base_url: &str) -> Result<Self, TransportError> {
        let mut key = HeaderValue::from_str(credential.expose())
            .map_err(|_| TransportError::InvalidCredential)?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Submits a query to run as a background interaction.
    ///
    /// # Returns
    ///
    /// The created [`Task`], carrying at least its id and initial status.
    pub async fn create_interaction(&self, spec: &TaskSpec) -> Result<Task, TransportError> {
        let url = self.base_url.join("interactions")?;
        let request_body = CreateInteractionRequest {
            input: &spec.input,
            agent: &spec.agent,
            background: true,
        };

        let response = self.client.post(url).json(&request_body).send().await?;
        read_task(response).await
    }

    /// Retrieves the current state of an interaction.
    ///
    /// This is the call made on every poll of a long-running task.
    pub async fn get_interaction(&self, id: &TaskId) -> Result<Task, TransportError> {
        let url = self.interaction_url(id)?;
        let response = self.client.get(url).send().await?;
        read_task(response).await
    }

    /// `{base}/interactions/{id}`, with the id escaped as a single path segment.
    fn interaction_url(&self, id: &TaskId) -> Result<Url, TransportError> {
        let mut url = self.base_url.join("interactions")?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(id.as_str());
        Ok(url)
    }
}

#[async_trait]
impl Transport for GeminiClient {
    async fn submit(&self, spec: &TaskSpec) -> Result<Task, TransportError> {
        self.create_interaction(spec).await
    }

    async fn fetch(&self, id: &TaskId) -> Result<Task, TransportError> {
        self.get_interaction(id).await
    }
}

/// Turns a raw response into a normalized task or a transport error.
///
/// The body is read as text first; the API does not always return JSON on
/// failure, so parsing problems become errors rather than panics.
async fn read_task(response: Response) -> Result<Task, TransportError> {
    let status = response.status();
    let body = response.text().await?;
    debug!(status = status.as_u16(), bytes = body.len(), "received API response");

    if !status.is_success() {
        return Err(TransportError::Api {
            status: status.as_u16(),
            message: api_error_message(&body),
        });
    }

    let resource: InteractionResource =
        serde_json::from_str(&body).map_err(|e| TransportError::MalformedResponse {
            detail: format!("{}; body: {}", e, excerpt(&body)),
        })?;
    Task::try_from(resource).map_err(|e| match e {
        TransportError::MalformedResponse { detail } => TransportError::MalformedResponse {
            detail: format!("{}; body: {}", detail, excerpt(&body)),
        },
        other => other,
    })
}

/// Prefers `error.message` from a JSON error envelope, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(error_detail))
        .unwrap_or_else(|| excerpt(body).to_string())
}

fn excerpt(body: &str) -> &str {
    if body.len() <= MAX_BODY_EXCERPT {
        return body;
    }
    let mut end = MAX_BODY_EXCERPT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
