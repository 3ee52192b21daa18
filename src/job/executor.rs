//! Batch executor.
//!
//! Walks the sheet row by row: skip checks, fetch, classify, generate,
//! upload, then write the URL (or an error marker) back into the row.

use std::{
    fmt::{Debug, Display},
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use rand::{SeedableRng as _, rngs::StdRng};
use tracing::{debug, error, info, warn};

use super::{
    edit::{EditError, EditState, EditWorkflow},
    service::{annotate, image, text, upload},
};
use crate::{
    classify,
    fetch::{self, Fetcher},
    imagetool,
    progress::{EntryStatus, ProgressReporter, SkipReason},
    prompt,
    record::{self, Columns, ProductRecord},
    sheet::{self, Cell, Sheet},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// Text-to-image generation from a classification-driven prompt
    Imagen,
    /// Stage the product photo itself through the editing workflow
    #[default]
    Edit,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub mode: Mode,
    pub output_dir: PathBuf,
    pub item_delay: Duration,
    pub target: Option<(u32, u32)>,
    pub retry_errors: bool,
    pub seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            output_dir: PathBuf::from("./output"),
            item_delay: Duration::from_secs(2),
            target: None,
            retry_errors: false,
            seed: None,
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub processed: usize,
    pub skipped: usize,
    pub already_done: usize,
    pub errors: usize,
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} processed, {} skipped, {} already done, {} errors",
            self.processed, self.skipped, self.already_done, self.errors
        )
    }
}

/// Why a single record failed. The `Display` text is what lands in the sheet.
#[derive(Debug, thiserror::Error)]
pub enum RecordError<AE, IE, UE> {
    #[error("{0}")]
    Fetch(fetch::Error),
    #[error("image analysis failed: {0}")]
    Annotate(AE),
    #[error("image generation failed: {0}")]
    Generate(IE),
    #[error("{0}")]
    Edit(EditError<IE>),
    #[error("generated image could not be converted to png: {0}")]
    Encode(::image::ImageError),
    #[error("failed to save image ({path:?}): {error}")]
    Save {
        error: std::io::Error,
        path: PathBuf,
    },
    #[error("upload failed: {0}")]
    Upload(UE),
}

/// What happened to one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Processed { url: String },
    Skipped(SkipReason),
    AlreadyDone,
    Failed { marker: String },
}

/// Job executor that drives one record at a time through the services.
pub struct JobExecutor<A, T, I, U> {
    pub annotator: A,
    pub text: T,
    pub image: I,
    pub uploader: U,
    pub fetcher: Fetcher,
    pub options: Options,
    pub reporter: Arc<dyn ProgressReporter>,
    rng: Mutex<StdRng>,
}

impl<A, T, I, U> JobExecutor<A, T, I, U>
where
    A: annotate::Client,
    A::Error: Debug + Display,
    T: text::Client,
    T::Error: Display,
    I: image::Client,
    I::Error: Debug + Display,
    U: upload::Client,
    U::Error: Debug + Display,
{
    pub fn new(
        annotator: A,
        text: T,
        image: I,
        uploader: U,
        fetcher: Fetcher,
        options: Options,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            annotator,
            text,
            image,
            uploader,
            fetcher,
            options,
            reporter,
            rng: Mutex::new(rng),
        }
    }

    fn room_context(&self, furniture_type: &str) -> prompt::RoomContext {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        prompt::room_context(furniture_type, &mut *rng)
    }

    /// Identifier and source photo of a record that needs work, or the
    /// outcome for one that does not.
    fn precheck<'r>(&self, record: &'r ProductRecord) -> Result<(&'r str, &'r str), Outcome> {
        let Some(wl) = record.wl.as_deref() else {
            return Err(Outcome::Skipped(SkipReason::MissingIdentifier));
        };
        let Some(silo_image) = record.silo_image.as_deref() else {
            return Err(Outcome::Skipped(SkipReason::MissingSourcePhoto));
        };
        match &record.lifestyle_image {
            Some(_) if self.options.retry_errors && record.has_error_marker() => {
                info!(wl, "retrying record that previously failed");
                Ok((wl, silo_image))
            }
            Some(_) => Err(Outcome::AlreadyDone),
            None => Ok((wl, silo_image)),
        }
    }

    async fn process(
        &self,
        entry: &str,
        record: &ProductRecord,
        wl: &str,
        silo_image: &str,
    ) -> Result<String, RecordError<A::Error, I::Error, U::Error>> {
        self.reporter.update_entry(entry, EntryStatus::Fetching);
        let source = self
            .fetcher
            .load(silo_image)
            .await
            .map_err(RecordError::Fetch)?;

        self.reporter.update_entry(entry, EntryStatus::Classifying);
        let annotations = self
            .annotator
            .annotate(&source.body)
            .await
            .map_err(RecordError::Annotate)?;
        let classification =
            classify::classify(&annotations, record.website_link_for_context.as_deref());
        let room = self.room_context(classification.furniture_type);
        info!(wl, %classification, room = room.room_type, "classified product");

        self.reporter.update_entry(entry, EntryStatus::Generating);
        let generated = match self.options.mode {
            Mode::Imagen => {
                let prompt = prompt::scene_prompt(&classification, &room);
                self.image
                    .generate(&prompt, None)
                    .await
                    .map_err(RecordError::Generate)?
            }
            Mode::Edit => {
                let workflow = EditWorkflow {
                    text: &self.text,
                    image: &self.image,
                    target: self.options.target,
                };
                let state = EditState::new(
                    prompt::placement_prompt(&classification, &room),
                    record,
                    &source,
                );
                workflow.run(state).await.map_err(RecordError::Edit)?
            }
        };

        let filename = record::output_filename(wl);
        let local_path = self.options.output_dir.join(&filename);
        let png = imagetool::ensure_png(generated.bytes).map_err(RecordError::Encode)?;
        tokio::fs::write(&local_path, &png)
            .await
            .map_err(|error| RecordError::Save {
                error,
                path: local_path.clone(),
            })?;
        debug!(wl, path = ?local_path, size = png.len(), "saved scene image");

        self.reporter.update_entry(entry, EntryStatus::Uploading);
        let url = self
            .uploader
            .put(&local_path, &filename)
            .await
            .map_err(RecordError::Upload)?;
        Ok(url)
    }

    /// Process every row of `sheet` in order, updating the output column
    /// in place.
    ///
    /// Fails only when the sheet lacks a required column; per-record
    /// failures are written into the sheet instead.
    pub async fn run(&self, sheet: &mut Sheet) -> Result<Summary, sheet::Error> {
        let columns = Columns::resolve(sheet)
            .inspect_err(|error| error!(%error, "sheet is missing a required column"))?;
        tokio::fs::create_dir_all(&self.options.output_dir)
            .await
            .map_err(|error| sheet::Error::CreateDir {
                error,
                path: self.options.output_dir.clone(),
            })?;

        let records = sheet
            .rows()
            .map(|row| ProductRecord::from_row(&columns, row))
            .collect::<Vec<_>>();
        let entries = records
            .iter()
            .enumerate()
            .map(|(index, record)| entry_name(index, record))
            .collect::<Vec<_>>();
        self.reporter.register_entries(entries.clone());

        let total = records.len();
        let mut summary = Summary::default();
        for (index, (record, entry)) in records.iter().zip(&entries).enumerate() {
            info!(row = index + 1, total, %entry, model = ?record.model, "processing record");
            self.reporter.update_entry(entry, EntryStatus::Processing);

            let outcome = match self.precheck(record) {
                Err(outcome) => outcome,
                Ok((wl, silo_image)) => {
                    let outcome = match self.process(entry, record, wl, silo_image).await {
                        Ok(url) => Outcome::Processed { url },
                        Err(error) => {
                            warn!(%entry, %error, "record failed");
                            Outcome::Failed {
                                marker: record::error_marker(&error),
                            }
                        }
                    };
                    if index + 1 < total && !self.options.item_delay.is_zero() {
                        debug!(delay = ?self.options.item_delay, "waiting before next record");
                        tokio::time::sleep(self.options.item_delay).await;
                    }
                    outcome
                }
            };

            match &outcome {
                Outcome::Processed { url } => {
                    info!(%entry, %url, "scene uploaded");
                    sheet.set(index, columns.lifestyle_image, Cell::Text(url.clone()));
                    summary.processed += 1;
                    self.reporter.update_entry(entry, EntryStatus::Done);
                }
                Outcome::Failed { marker } => {
                    sheet.set(index, columns.lifestyle_image, Cell::Text(marker.clone()));
                    summary.errors += 1;
                    self.reporter
                        .update_entry(entry, EntryStatus::Failed(marker.clone()));
                }
                Outcome::Skipped(reason) => {
                    info!(%entry, %reason, "skipping record");
                    summary.skipped += 1;
                    self.reporter
                        .update_entry(entry, EntryStatus::Skipped(*reason));
                }
                Outcome::AlreadyDone => {
                    info!(%entry, "already has a lifestyle image, skipping");
                    summary.already_done += 1;
                    self.reporter.update_entry(entry, EntryStatus::AlreadyDone);
                }
            }
        }
        info!(%summary, "batch finished");
        Ok(summary)
    }
}

fn entry_name(index: usize, record: &ProductRecord) -> String {
    match &record.wl {
        Some(wl) => format!("#{} {wl}", index + 1),
        None => format!("#{}", index + 1),
    }
}
