use std::{path::PathBuf, time::Duration};

use derive_debug::Dbg;
use tracing::debug;

use crate::imagetool;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to download image ({url}): {error}")]
    FetchRemote { error: reqwest::Error, url: url::Url },
    #[error("failed to download image ({url}): HTTP {status}")]
    Status {
        status: reqwest::StatusCode,
        url: url::Url,
    },
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("failed to decode data URL: {0}")]
    DecodeDataUrl(String),
    #[error("failed to read local file ({path:?}): {error}")]
    ReadLocal {
        error: std::io::Error,
        path: PathBuf,
    },
}

#[derive(Dbg, Clone, PartialEq, Eq)]
pub enum Origin {
    Remote(url::Url),
    Local(PathBuf),
    DataUrl,
}

#[derive(Dbg, Clone, PartialEq, Eq)]
pub struct Object {
    #[dbg(skip)]
    pub body: Box<[u8]>,
    pub content_type: Option<String>,
    pub origin: Origin,
}

impl Object {
    /// Declared content type, falling back to sniffing the bytes.
    pub fn mime_type(&self) -> Option<String> {
        self.content_type
            .clone()
            .filter(|ct| ct.starts_with("image/"))
            .or_else(|| imagetool::sniff_mime(&self.body).map(str::to_owned))
    }
}

/// Loads product photos from `http(s)://` URLs, `data:` URLs or local paths.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn load_remote(&self, url: url::Url) -> Result<Object, Error> {
        let response = self
            .client
            .get(url.clone())
            .timeout(DEFAULT_TIMEOUT)
            .send()
            .await
            .map_err(|error| Error::FetchRemote {
                error,
                url: url.clone(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { status, url });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<mime::Mime>().ok())
            .map(|mime| mime.essence_str().to_owned());
        let body = response.bytes().await.map_err(|error| Error::FetchRemote {
            error,
            url: url.clone(),
        })?;
        debug!(%url, size = body.len(), ?content_type, "downloaded image");
        Ok(Object {
            body: body.to_vec().into_boxed_slice(),
            content_type,
            origin: Origin::Remote(url),
        })
    }

    pub async fn load(&self, src: &str) -> Result<Object, Error> {
        let src = src.trim();
        if let Ok(url) = url::Url::parse(src) {
            if matches!(url.scheme(), "https" | "http") {
                return self.load_remote(url).await;
            }
        }
        if src.starts_with("data:") {
            let data = data_url::DataUrl::process(src)
                .map_err(|error| Error::InvalidDataUrl(format!("{error:?}")))?;
            let (body, _) = data
                .decode_to_vec()
                .map_err(|error| Error::DecodeDataUrl(format!("{error:?}")))?;
            return Ok(Object {
                body: body.into_boxed_slice(),
                content_type: Some(data.mime_type().to_string()),
                origin: Origin::DataUrl,
            });
        }

        let path = PathBuf::from(src);
        let body = tokio::fs::read(&path)
            .await
            .map_err(|error| Error::ReadLocal {
                error,
                path: path.clone(),
            })?;
        let content_type = mime_guess::from_path(&path)
            .first()
            .map(|mime| mime.essence_str().to_owned());
        Ok(Object {
            body: body.into_boxed_slice(),
            content_type,
            origin: Origin::Local(path),
        })
    }
}
