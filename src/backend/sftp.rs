use std::{
    io::Write as _,
    net::{TcpStream, ToSocketAddrs as _},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use derive_debug::Dbg;
use tracing::{debug, info};

use crate::{job::service::upload, record};

pub const DEFAULT_PORT: u16 = 22;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read local file ({path:?}): {error}")]
    ReadLocal {
        error: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to connect to {address}: {error}")]
    Connect {
        error: std::io::Error,
        address: String,
    },
    #[error("ssh error: {0}")]
    Ssh(#[from] ssh2::Error),
    #[error("server rejected credentials for user {0}")]
    AuthRejected(String),
    #[error("failed to write remote file ({path}): {error}")]
    WriteRemote {
        error: std::io::Error,
        path: String,
    },
}

#[derive(Dbg, Clone)]
pub struct SftpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    #[dbg(skip)]
    pub password: String,
    /// Directory on the server the scenes are written into.
    pub remote_dir: String,
    /// Public URL prefix the remote directory is served under.
    pub base_url: String,
    pub timeout: Duration,
}

pub fn remote_path(remote_dir: &str, filename: &str) -> String {
    let dir = remote_dir.trim_end_matches('/');
    if dir.is_empty() && !remote_dir.starts_with('/') {
        filename.to_owned()
    } else {
        format!("{dir}/{filename}")
    }
}

/// Uploads over SFTP with password authentication.
///
/// Host keys are not verified. Each upload opens its own session.
#[derive(Debug, Clone)]
pub struct SftpUploader {
    settings: Arc<SftpSettings>,
}

impl SftpUploader {
    pub fn new(settings: SftpSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}

/// Opens a TCP connection to the first reachable resolved address, waiting
/// at most `settings.timeout` for each.
fn connect(settings: &SftpSettings) -> Result<TcpStream, Error> {
    let address = format!("{}:{}", settings.host, settings.port);
    let connect_error = |error| Error::Connect {
        error,
        address: address.clone(),
    };
    let mut last_error = None;
    for socket in address.as_str().to_socket_addrs().map_err(connect_error)? {
        match TcpStream::connect_timeout(&socket, settings.timeout) {
            Ok(tcp) => return Ok(tcp),
            Err(error) => {
                debug!(%socket, %error, "sftp address unreachable");
                last_error = Some(error);
            }
        }
    }
    Err(connect_error(last_error.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "host resolved to no addresses")
    })))
}

fn upload(settings: &SftpSettings, path: &str, body: &[u8]) -> Result<(), Error> {
    let address = format!("{}:{}", settings.host, settings.port);
    let tcp = connect(settings)?;
    let mut session = ssh2::Session::new()?;
    session.set_timeout(settings.timeout.as_millis().try_into().unwrap_or(u32::MAX));
    session.set_tcp_stream(tcp);
    session.handshake()?;
    session.userauth_password(&settings.username, &settings.password)?;
    if !session.authenticated() {
        return Err(Error::AuthRejected(settings.username.clone()));
    }
    debug!(%address, user = %settings.username, "sftp session established");

    let sftp = session.sftp()?;
    let mut remote = sftp.create(Path::new(path))?;
    remote
        .write_all(body)
        .and_then(|_| remote.flush())
        .map_err(|error| Error::WriteRemote {
            error,
            path: path.to_owned(),
        })?;
    drop(remote);
    session.disconnect(None, "upload complete", None)?;
    Ok(())
}

impl upload::Client for SftpUploader {
    type Error = Error;

    async fn put(&self, local_path: &Path, filename: &str) -> Result<String, Self::Error> {
        let body = tokio::fs::read(local_path)
            .await
            .map_err(|error| Error::ReadLocal {
                error,
                path: local_path.to_owned(),
            })?;
        let path = remote_path(&self.settings.remote_dir, filename);
        let settings = self.settings.clone();
        let size = body.len();
        blocking::unblock({
            let path = path.clone();
            move || upload(&settings, &path, &body)
        })
        .await?;
        info!(%path, size, "uploaded over sftp");
        Ok(record::public_url(&self.settings.base_url, filename))
    }
}
