//! Photo editing workflow.
//!
//! A fixed, ordered list of steps run against one product. A failing step
//! ends the workflow, except prompt refinement which falls back to the
//! original prompt.

use std::fmt::Display;

use ::image::ImageError;
use derive_debug::Dbg;
use tracing::{debug, info, warn};

use super::service::{image, text};
use crate::{fetch::Object, imagetool, prompt, record::ProductRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStep {
    ImprovePrompt,
    LoadImage,
    ResizeImage,
    EditImage,
}

impl EditStep {
    pub const ALL: [EditStep; 4] = [
        EditStep::ImprovePrompt,
        EditStep::LoadImage,
        EditStep::ResizeImage,
        EditStep::EditImage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EditStep::ImprovePrompt => "improve_prompt",
            EditStep::LoadImage => "load_image",
            EditStep::ResizeImage => "resize_image",
            EditStep::EditImage => "edit_image",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EditError<IE> {
    #[error("source image is not a supported image: {0}")]
    Decode(ImageError),
    #[error("source image type could not be determined")]
    UnknownFormat,
    #[error("failed to resize source image: {0}")]
    Resize(ImageError),
    #[error("image editing failed: {0}")]
    Edit(IE),
    #[error("step {0} ran before the source image was loaded")]
    MissingSource(&'static str),
    #[error("image model returned no image")]
    NoResponse,
}

#[derive(Dbg, Clone, PartialEq, Eq)]
pub struct SourceImage {
    #[dbg(skip)]
    pub data: Vec<u8>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Dbg)]
pub struct EditState<'a> {
    pub original_prompt: String,
    pub improved_prompt: Option<String>,
    pub product: &'a ProductRecord,
    pub source: &'a Object,
    pub image: Option<SourceImage>,
    pub response: Option<image::GeneratedImage>,
}

impl<'a> EditState<'a> {
    pub fn new(original_prompt: String, product: &'a ProductRecord, source: &'a Object) -> Self {
        Self {
            original_prompt,
            improved_prompt: None,
            product,
            source,
            image: None,
            response: None,
        }
    }

    /// The refined prompt when there is one, the original otherwise.
    pub fn prompt(&self) -> &str {
        self.improved_prompt
            .as_deref()
            .unwrap_or(&self.original_prompt)
    }
}

pub struct EditWorkflow<'c, T, I> {
    pub text: &'c T,
    pub image: &'c I,
    /// Letterbox the photo to this size before editing.
    pub target: Option<(u32, u32)>,
}

impl<'c, T, I> EditWorkflow<'c, T, I>
where
    T: text::Client,
    T::Error: Display,
    I: image::Client,
{
    pub async fn run(
        &self,
        mut state: EditState<'_>,
    ) -> Result<image::GeneratedImage, EditError<I::Error>> {
        for step in EditStep::ALL {
            debug!(step = step.name(), "running edit step");
            self.step(step, &mut state).await?;
        }
        state.response.ok_or(EditError::NoResponse)
    }

    async fn step(
        &self,
        step: EditStep,
        state: &mut EditState<'_>,
    ) -> Result<(), EditError<I::Error>> {
        match step {
            EditStep::ImprovePrompt => {
                let request = prompt::refinement_request(&state.original_prompt, state.product);
                match self.text.complete(&request).await {
                    Ok(improved) if !improved.trim().is_empty() => {
                        let improved = improved.trim().to_owned();
                        info!(chars = improved.len(), "improved prompt");
                        state.improved_prompt = Some(improved);
                    }
                    Ok(_) => warn!("prompt refinement returned nothing, using original prompt"),
                    Err(error) => warn!(%error, "prompt refinement failed, using original prompt"),
                }
            }
            EditStep::LoadImage => {
                let mime_type = state.source.mime_type().ok_or(EditError::UnknownFormat)?;
                let decoded = imagetool::decode(&state.source.body).map_err(EditError::Decode)?;
                debug!(
                    size = state.source.body.len(),
                    %mime_type,
                    width = decoded.width(),
                    height = decoded.height(),
                    "loaded source image"
                );
                state.image = Some(SourceImage {
                    data: state.source.body.to_vec(),
                    mime_type,
                    width: decoded.width(),
                    height: decoded.height(),
                });
            }
            EditStep::ResizeImage => {
                let Some((width, height)) = self.target else {
                    debug!("no target dimensions, keeping source size");
                    return Ok(());
                };
                let source = state
                    .image
                    .as_ref()
                    .ok_or(EditError::MissingSource(step.name()))?;
                let decoded = imagetool::decode(&source.data).map_err(EditError::Resize)?;
                let boxed = imagetool::letterbox(&decoded, width, height);
                state.image = Some(SourceImage {
                    data: imagetool::encode_png(&boxed).map_err(EditError::Resize)?,
                    mime_type: mime::IMAGE_PNG.to_string(),
                    width,
                    height,
                });
                debug!(width, height, "resized source image");
            }
            EditStep::EditImage => {
                let source = state
                    .image
                    .as_ref()
                    .ok_or(EditError::MissingSource(step.name()))?;
                let reference = image::Reference {
                    mime_type: &source.mime_type,
                    data: &source.data,
                };
                let response = self
                    .image
                    .generate(state.prompt(), Some(reference))
                    .await
                    .map_err(EditError::Edit)?;
                info!(size = response.bytes.len(), "image edited");
                state.response = Some(response);
            }
        }
        Ok(())
    }
}
