use std::{path::Path, sync::Arc};

use gcp_auth::{CustomServiceAccount, Token, TokenProvider};
use tracing::debug;

use super::Error;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Source of OAuth access tokens for the Google APIs.
#[derive(Clone)]
pub struct Credentials {
    provider: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

impl Credentials {
    /// Service account key file.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let account = CustomServiceAccount::from_file(path).map_err(Error::Auth)?;
        debug!(?path, "loaded service account key");
        Ok(Self {
            provider: Arc::new(account),
        })
    }

    /// Application default credentials from the environment.
    pub async fn discover() -> Result<Self, Error> {
        let provider = gcp_auth::provider().await.map_err(Error::Auth)?;
        debug!("using application default credentials");
        Ok(Self { provider })
    }

    pub async fn token(&self) -> Result<Arc<Token>, Error> {
        self.provider
            .token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(Error::Auth)
    }

    /// Project the credentials belong to.
    pub async fn project_id(&self) -> Result<Arc<str>, Error> {
        self.provider.project_id().await.map_err(Error::Auth)
    }
}
