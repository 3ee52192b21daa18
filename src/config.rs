use std::{path::PathBuf, time::Duration};

use crate::{
    backend::sftp::{self, SftpSettings},
    imagetool::DEFAULT_EDGE,
    job::{Mode, Options},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum UploadBackend {
    #[default]
    Sftp,
    Local,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{backend} upload backend requires {name}")]
    Missing {
        backend: &'static str,
        name: &'static str,
    },
    #[error("target dimensions must be positive")]
    ZeroDimension,
}

/// Where finished scenes are published.
#[derive(Debug, Clone)]
pub enum UploadTarget {
    Sftp(SftpSettings),
    Local { dir: PathBuf, base_url: String },
}

/// Run configuration. Every option can also come from the environment.
#[derive(clap::Args, Debug, Clone)]
pub struct Config {
    /// Google Cloud project; defaults to the project of the credentials
    #[clap(long, env = "GOOGLE_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Vertex AI location
    #[clap(long, env = "GOOGLE_LOCATION", default_value = "us-central1")]
    pub location: String,

    /// Service account key file; application default credentials when unset
    #[clap(long, env = "GOOGLE_CREDENTIALS_PATH")]
    pub credentials_path: Option<PathBuf>,

    #[clap(
        long,
        env = "EXCEL_INPUT_PATH",
        default_value = "./Overstock White Label Project 093025.xlsx"
    )]
    pub input: PathBuf,

    #[clap(
        long,
        env = "EXCEL_OUTPUT_PATH",
        default_value = "./output/Overstock White Label Project 093025_updated.xlsx"
    )]
    pub output: PathBuf,

    /// Directory the generated scenes are saved into before upload
    #[clap(long, env = "OUTPUT_DIR", default_value = "./output")]
    pub output_dir: PathBuf,

    #[clap(long, env = "GENERATION_MODE", value_enum, default_value_t = Mode::Edit)]
    pub mode: Mode,

    #[clap(long, env = "IMAGEN_MODEL", default_value = "imagegeneration@006")]
    pub imagen_model: String,

    /// Text model used to refine editing prompts
    #[clap(long, env = "CHAT_MODEL", default_value = "gemini-2.5-flash")]
    pub chat_model: String,

    /// Image model used to edit product photos
    #[clap(long, env = "IMAGE_MODEL", default_value = "gemini-2.5-flash-image")]
    pub image_model: String,

    #[clap(long, env = "TARGET_WIDTH")]
    pub target_width: Option<u32>,

    #[clap(long, env = "TARGET_HEIGHT")]
    pub target_height: Option<u32>,

    /// Pause between records that reached the remote services
    #[clap(long, env = "ITEM_DELAY_SECS", default_value_t = 2.0)]
    pub item_delay_secs: f64,

    #[clap(long, env = "UPLOAD_BACKEND", value_enum, default_value_t = UploadBackend::Sftp)]
    pub upload_backend: UploadBackend,

    #[clap(long, env = "SFTP_HOST")]
    pub sftp_host: Option<String>,

    #[clap(long, env = "SFTP_PORT", default_value_t = sftp::DEFAULT_PORT)]
    pub sftp_port: u16,

    #[clap(long, env = "SFTP_USERNAME")]
    pub sftp_username: Option<String>,

    #[clap(long, env = "SFTP_PASSWORD", hide_env_values = true)]
    pub sftp_password: Option<String>,

    #[clap(long, env = "SFTP_REMOTE_PATH")]
    pub sftp_remote_path: Option<String>,

    #[clap(long, env = "SFTP_BASE_URL")]
    pub sftp_base_url: Option<String>,

    #[clap(long, env = "LOCAL_UPLOAD_DIR")]
    pub local_upload_dir: Option<PathBuf>,

    #[clap(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// Regenerate rows whose output holds an error marker
    #[clap(long, env = "RETRY_ERRORS")]
    pub retry_errors: bool,

    /// Seed for the room choice, for reproducible runs
    #[clap(long, env = "RUN_SEED")]
    pub seed: Option<u64>,
}

fn required<T: Clone>(
    value: &Option<T>,
    backend: &'static str,
    name: &'static str,
) -> Result<T, ConfigError> {
    value.clone().ok_or(ConfigError::Missing { backend, name })
}

impl Config {
    /// Letterbox target, `None` when neither dimension is set.
    pub fn target_dimensions(&self) -> Result<Option<(u32, u32)>, ConfigError> {
        let target = match (self.target_width, self.target_height) {
            (None, None) => return Ok(None),
            (width, height) => (
                width.unwrap_or(DEFAULT_EDGE),
                height.unwrap_or(DEFAULT_EDGE),
            ),
        };
        if target.0 == 0 || target.1 == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        Ok(Some(target))
    }

    pub fn item_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.item_delay_secs).unwrap_or_default()
    }

    /// Resolve the upload backend, failing on incomplete settings.
    pub fn validate(&self) -> Result<UploadTarget, ConfigError> {
        self.target_dimensions()?;
        match self.upload_backend {
            UploadBackend::Sftp => Ok(UploadTarget::Sftp(SftpSettings {
                host: required(&self.sftp_host, "sftp", "SFTP_HOST")?,
                port: self.sftp_port,
                username: required(&self.sftp_username, "sftp", "SFTP_USERNAME")?,
                password: required(&self.sftp_password, "sftp", "SFTP_PASSWORD")?,
                remote_dir: required(&self.sftp_remote_path, "sftp", "SFTP_REMOTE_PATH")?,
                base_url: required(&self.sftp_base_url, "sftp", "SFTP_BASE_URL")?,
                timeout: sftp::DEFAULT_TIMEOUT,
            })),
            UploadBackend::Local => Ok(UploadTarget::Local {
                dir: required(&self.local_upload_dir, "local", "LOCAL_UPLOAD_DIR")?,
                base_url: required(&self.public_base_url, "local", "PUBLIC_BASE_URL")?,
            }),
        }
    }

    pub fn job_options(&self) -> Result<Options, ConfigError> {
        Ok(Options {
            mode: self.mode,
            output_dir: self.output_dir.clone(),
            item_delay: self.item_delay(),
            target: self.target_dimensions()?,
            retry_errors: self.retry_errors,
            seed: self.seed,
        })
    }
}
