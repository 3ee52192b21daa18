use std::{fmt, process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use furniture_scenes::{
    backend::{
        google::{ChatClient, Credentials, ImageEditClient, ImagenClient, Session, VisionClient},
        local::LocalUploader,
        sftp::SftpUploader,
    },
    config::{Config, UploadTarget},
    fetch::Fetcher,
    job::{JobExecutor, Mode, Options, Summary, service},
    progress::{self, BatchPhase, ProgressReporter, QuietReporter},
    sheet::{self, Sheet},
};
use tracing::{error, info};

#[derive(Parser)]
#[clap(version, about = "Stage product photos in generated room scenes")]
struct Opts {
    #[clap(flatten)]
    config: Config,

    /// Disable progress bars and per-record status lines
    #[clap(long, env = "NO_PROGRESS")]
    no_progress: bool,
}

struct Clients {
    session: Session,
    fetcher: Fetcher,
}

async fn session(config: &Config, http: reqwest::Client) -> anyhow::Result<Session> {
    let credentials = match &config.credentials_path {
        Some(path) => Credentials::from_file(path)
            .with_context(|| format!("load credentials from {}", path.display()))?,
        None => Credentials::discover()
            .await
            .context("find application default credentials")?,
    };
    credentials
        .token()
        .await
        .context("obtain access token")?;
    let project_id = match &config.project_id {
        Some(project_id) => project_id.clone(),
        None => credentials
            .project_id()
            .await
            .context("determine project id (set GOOGLE_PROJECT_ID)")?
            .to_string(),
    };
    info!(%project_id, location = %config.location, "authenticated with google cloud");
    Ok(Session::new(http, credentials, project_id, &config.location))
}

async fn execute<I, U>(
    clients: &Clients,
    config: &Config,
    options: Options,
    image: I,
    uploader: U,
    reporter: Arc<dyn ProgressReporter>,
    sheet: &mut Sheet,
) -> Result<Summary, sheet::Error>
where
    I: service::image::Client,
    I::Error: fmt::Debug + fmt::Display,
    U: service::upload::Client,
    U::Error: fmt::Debug + fmt::Display,
{
    let executor = JobExecutor::new(
        VisionClient::new(clients.session.clone()),
        ChatClient::new(clients.session.clone(), &config.chat_model),
        image,
        uploader,
        clients.fetcher.clone(),
        options,
        reporter,
    );
    executor.run(sheet).await
}

async fn dispatch<U>(
    clients: &Clients,
    config: &Config,
    options: Options,
    uploader: U,
    reporter: Arc<dyn ProgressReporter>,
    sheet: &mut Sheet,
) -> Result<Summary, sheet::Error>
where
    U: service::upload::Client,
    U::Error: fmt::Debug + fmt::Display,
{
    match options.mode {
        Mode::Imagen => {
            let image = ImagenClient::new(clients.session.clone(), &config.imagen_model);
            execute(clients, config, options, image, uploader, reporter, sheet).await
        }
        Mode::Edit => {
            let image = ImageEditClient::new(clients.session.clone(), &config.image_model);
            execute(clients, config, options, image, uploader, reporter, sheet).await
        }
    }
}

async fn run(opts: Opts, reporter: Arc<dyn ProgressReporter>) -> anyhow::Result<Summary> {
    let config = &opts.config;
    reporter.set_phase(BatchPhase::Initializing);
    let upload = config.validate().context("invalid configuration")?;
    let options = config.job_options().context("invalid configuration")?;
    let http = reqwest::Client::new();
    let clients = Clients {
        session: session(config, http.clone()).await?,
        fetcher: Fetcher::new(http),
    };

    reporter.set_phase(BatchPhase::ReadingSheet);
    let input = config.input.clone();
    let mut products = blocking::unblock(move || sheet::load(&input))
        .await
        .with_context(|| format!("read {}", config.input.display()))?;
    info!(rows = products.len(), sheet = products.name(), "loaded product sheet");

    reporter.set_phase(BatchPhase::ProcessingRecords);
    let summary = match upload {
        UploadTarget::Sftp(settings) => {
            let uploader = SftpUploader::new(settings);
            dispatch(&clients, config, options, uploader, reporter.clone(), &mut products).await
        }
        UploadTarget::Local { dir, base_url } => {
            let uploader = LocalUploader::new(dir, base_url);
            dispatch(&clients, config, options, uploader, reporter.clone(), &mut products).await
        }
    }
    .context("process product sheet")?;

    reporter.set_phase(BatchPhase::WritingSheet);
    let output = config.output.clone();
    blocking::unblock(move || sheet::save(&products, &output))
        .await
        .with_context(|| format!("write {}", config.output.display()))?;
    info!(path = ?config.output, "saved updated sheet");
    Ok(summary)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let reporter: Arc<dyn ProgressReporter> = if opts.no_progress {
        Arc::new(QuietReporter::new())
    } else {
        progress::create_reporter()
    };

    match run(opts, reporter.clone()).await {
        Ok(summary) => {
            reporter.set_phase(BatchPhase::Completed);
            reporter.finish();
            info!(%summary, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            reporter.set_phase(BatchPhase::Failed(format!("{e:#}")));
            reporter.finish();
            error!(?e, "critical error");
            ExitCode::FAILURE
        }
    }
}
