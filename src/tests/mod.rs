use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use ::image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::{
    backend::local::LocalUploader,
    classify::Annotations,
    fetch::Fetcher,
    imagetool,
    job::{
        JobExecutor, Mode, Options,
        service::{
            annotate,
            image::{self, GeneratedImage, Reference},
            text,
        },
    },
    progress::NullReporter,
    record::column,
    sheet::{Cell, Sheet},
};

mod batch;
mod edit;

pub const BASE_URL: &str = "https://cdn.example.com/rooms/";

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([120, 80, 40])));
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    buffer
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub String);

pub struct FakeAnnotator {
    pub labels: Vec<String>,
}

impl annotate::Client for FakeAnnotator {
    type Error = FakeError;

    async fn annotate(&self, image: &[u8]) -> Result<Annotations, Self::Error> {
        imagetool::decode(image).map_err(|e| FakeError(e.to_string()))?;
        Ok(Annotations {
            labels: self.labels.clone(),
            ..Default::default()
        })
    }
}

pub struct FakeText {
    pub reply: Result<String, String>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeText {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_owned()),
            requests: Mutex::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_owned()),
            requests: Mutex::default(),
        }
    }
}

impl text::Client for FakeText {
    type Error = FakeError;

    async fn complete(&self, prompt: &str) -> Result<String, Self::Error> {
        self.requests.lock().unwrap().push(prompt.to_owned());
        self.reply.clone().map_err(FakeError)
    }
}

/// What the image model was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCall {
    pub prompt: String,
    /// Mime type and decoded size of the attached photo.
    pub reference: Option<(String, (u32, u32))>,
}

pub struct FakeImage {
    /// 1-based call numbers that fail.
    pub fail_on: Vec<usize>,
    pub output: Vec<u8>,
    pub calls: Mutex<Vec<ImageCall>>,
}

impl Default for FakeImage {
    fn default() -> Self {
        Self {
            fail_on: Vec::new(),
            output: png_bytes(16, 9),
            calls: Mutex::default(),
        }
    }
}

impl FakeImage {
    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            fail_on: calls.to_vec(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<ImageCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl image::Client for FakeImage {
    type Error = FakeError;

    async fn generate(
        &self,
        prompt: &str,
        reference: Option<Reference<'_>>,
    ) -> Result<GeneratedImage, Self::Error> {
        let reference = reference.map(|reference| {
            let decoded = imagetool::decode(reference.data).unwrap();
            (
                reference.mime_type.to_owned(),
                (decoded.width(), decoded.height()),
            )
        });
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(ImageCall {
                prompt: prompt.to_owned(),
                reference,
            });
            calls.len()
        };
        if self.fail_on.contains(&call) {
            return Err(FakeError("quota exceeded".into()));
        }
        Ok(GeneratedImage {
            bytes: self.output.clone(),
            mime_type: None,
        })
    }
}

pub type TestExecutor = JobExecutor<FakeAnnotator, FakeText, FakeImage, LocalUploader>;

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub executor: TestExecutor,
}

impl Harness {
    pub fn new(mode: Mode, text: FakeText, image: FakeImage) -> Self {
        Self::with_options(mode, text, image, |_| {})
    }

    pub fn with_options(
        mode: Mode,
        text: FakeText,
        image: FakeImage,
        configure: impl FnOnce(&mut Options),
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut options = Options {
            mode,
            output_dir: dir.path().join("output"),
            item_delay: Duration::ZERO,
            target: None,
            retry_errors: false,
            seed: Some(42),
        };
        configure(&mut options);
        let executor = JobExecutor::new(
            FakeAnnotator {
                labels: vec!["wine cabinet".into(), "wood".into()],
            },
            text,
            image,
            LocalUploader::new(dir.path().join("public"), BASE_URL),
            Fetcher::new(reqwest::Client::new()),
            options,
            Arc::new(NullReporter),
        );
        Self { dir, executor }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.executor.options.output_dir.clone()
    }

    pub fn public_dir(&self) -> PathBuf {
        self.dir.path().join("public")
    }

    /// Write a source photo for `wl` and return its path as sheet text.
    pub fn photo(&self, wl: &str, bytes: &[u8]) -> Cell {
        let path = self.dir.path().join(format!("silo-{wl}.png"));
        std::fs::write(&path, bytes).unwrap();
        Cell::Text(path.to_string_lossy().into_owned())
    }

    pub fn missing_photo(&self) -> Cell {
        Cell::Text(self.dir.path().join("absent.png").to_string_lossy().into_owned())
    }
}

pub const LIFESTYLE: usize = 4;

/// Sheet with the columns the pipeline reads; rows are
/// `(WL, Silo Image, Lifestyle Image)`.
pub fn product_sheet(rows: impl IntoIterator<Item = (Cell, Cell, Cell)>) -> Sheet {
    let mut sheet = Sheet::new(
        "Products",
        [
            column::MODEL,
            column::WL,
            column::RETAIL,
            column::SILO_IMAGE,
            column::LIFESTYLE_IMAGE,
            column::COMMENT,
        ],
    );
    for (wl, silo, lifestyle) in rows {
        sheet.push_row([
            Cell::Text("CAB-1200".into()),
            wl,
            Cell::Float(1299.99),
            silo,
            lifestyle,
            Cell::Text("keep me".into()),
        ]);
    }
    sheet
}

pub fn cell_text(value: &str) -> Cell {
    Cell::Text(value.into())
}

pub fn is_png_file(path: &Path) -> bool {
    std::fs::read(path).is_ok_and(|bytes| imagetool::is_png(&bytes))
}
