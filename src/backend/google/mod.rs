//! Google Cloud clients: Vision for photo analysis, Vertex AI for
//! Imagen and Gemini.

use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, trace};

pub mod auth;
pub mod gemini;
pub mod imagen;
pub mod vision;

pub use auth::Credentials;
pub use gemini::{ChatClient, ImageEditClient};
pub use imagen::ImagenClient;
pub use vision::VisionClient;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    #[error("authentication failed: {0}")]
    Auth(gcp_auth::Error),
    #[error("request failed. status: {status}, message: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("failed to decode response: {0}")]
    Decode(serde_json::Error),
    #[error("invalid base64 image data: {0}")]
    Base64(base64::DecodeError),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("response contained no image")]
    NoImage,
    #[error("response contained no text")]
    NoText,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    pub status: Option<String>,
}

/// Human-readable message out of a Google error body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error }) if !error.message.is_empty() => error.message,
        _ => body.chars().take(500).collect(),
    }
}

/// `:method` URL of a Vertex AI publisher model.
pub fn vertex_endpoint(project_id: &str, location: &str, model: &str, method: &str) -> String {
    let host = if location == "global" {
        "aiplatform.googleapis.com".to_owned()
    } else {
        format!("{location}-aiplatform.googleapis.com")
    };
    format!(
        "https://{host}/v1/projects/{project_id}/locations/{location}/publishers/google/models/{model}:{method}"
    )
}

/// Authenticated JSON transport shared by the Google clients.
#[derive(Debug, Clone)]
pub struct Session {
    http: reqwest::Client,
    credentials: Credentials,
    project_id: String,
    location: String,
}

impl Session {
    pub fn new(
        http: reqwest::Client,
        credentials: Credentials,
        project_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            http,
            credentials,
            project_id: project_id.into(),
            location: location.into(),
        }
    }

    pub fn model_endpoint(&self, model: &str, method: &str) -> String {
        vertex_endpoint(&self.project_id, &self.location, model, method)
    }

    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let token = self.credentials.token().await?;
        debug!(endpoint, "sending request");
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(token.as_str())
            .header("x-goog-user-project", &self.project_id)
            .timeout(DEFAULT_TIMEOUT)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = response.status();
        let text = response.text().await.map_err(Error::Transport)?;
        trace!(endpoint, %status, size = text.len(), "received response");
        if !status.is_success() {
            return Err(Error::Api {
                status,
                message: error_message(&text),
            });
        }
        serde_json::from_str(&text).map_err(Error::Decode)
    }
}
