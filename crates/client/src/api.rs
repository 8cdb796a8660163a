//! HTTP client for the studio API.
//!
//! [`StudioApi`] is the seam the controller talks through;
//! [`HttpStudioClient`] implements it with [`reqwest`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, REQUEST_FAILED};
use crate::types::{AuthSession, Credentials, Generation, GenerationRequest, Items};

/// Operations the studio front end needs from the server.
#[async_trait]
pub trait StudioApi: Send + Sync {
    async fn signup(&self, credentials: &Credentials) -> Result<AuthSession, ClientError>;

    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ClientError>;

    /// The caller's most recent generations, newest first.
    async fn list_generations(&self, token: &str, limit: i64)
        -> Result<Vec<Generation>, ClientError>;

    /// Submit one generation. Resolves to [`ClientError::Cancelled`] as soon
    /// as `cancel` fires.
    async fn create_generation(
        &self,
        token: &str,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Generation, ClientError>;
}

/// [`StudioApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStudioClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStudioClient {
    /// * `base_url` - Server origin, e.g. `http://localhost:4000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_credentials(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<AuthSession, ClientError> {
        let response = self
            .client
            .post(self.url(path))
            .json(credentials)
            .send()
            .await?;
        parse_response(response).await
    }
}

#[async_trait]
impl StudioApi for HttpStudioClient {
    async fn signup(&self, credentials: &Credentials) -> Result<AuthSession, ClientError> {
        self.post_credentials("/auth/signup", credentials).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ClientError> {
        self.post_credentials("/auth/login", credentials).await
    }

    async fn list_generations(
        &self,
        token: &str,
        limit: i64,
    ) -> Result<Vec<Generation>, ClientError> {
        let response = self
            .client
            .get(self.url("/generations"))
            .query(&[("limit", limit)])
            .bearer_auth(token)
            .send()
            .await?;
        let page: Items<Generation> = parse_response(response).await?;
        Ok(page.items)
    }

    async fn create_generation(
        &self,
        token: &str,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Generation, ClientError> {
        let image = Part::bytes(request.image.bytes.clone())
            .file_name(request.image.filename.clone())
            .mime_str(&request.image.content_type)?;
        let form = Form::new()
            .text("prompt", request.prompt.clone())
            .text("style", request.style.as_str())
            .part("image", image);

        let send = async {
            let response = self
                .client
                .post(self.url("/generations"))
                .bearer_auth(token)
                .multipart(form)
                .send()
                .await?;
            parse_response::<Generation>(response).await
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("Generation request cancelled");
                Err(ClientError::Cancelled)
            }
            result = send => result,
        }
    }
}

/// Turn a response into `T`, or into [`ClientError::Api`] carrying the
/// server's `message` for non-2xx statuses.
async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<serde_json::Value>(&bytes)
            .ok()
            .and_then(|body| body.get("message")?.as_str().map(str::to_string))
            .unwrap_or_else(|| REQUEST_FAILED.to_string());
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}
