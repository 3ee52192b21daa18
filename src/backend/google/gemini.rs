//! Gemini `generateContent` clients.
//!
//! The same endpoint serves both prompt refinement (text out) and photo
//! editing (text plus attached image in, image out).

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Error, Session};
use crate::job::service::{
    image::{self, GeneratedImage, Reference},
    text,
};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
        data: String,
    },
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: [&'static str; 2],
    image_config: ImageConfig,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
pub struct ResponsePart {
    pub text: Option<String>,
    #[serde(default, alias = "inline_data", rename = "inlineData")]
    pub inline_data: Option<InlineData>,
}

#[derive(Deserialize, Debug)]
pub struct InlineData {
    #[serde(default, alias = "mime_type", rename = "mimeType")]
    pub mime_type: Option<String>,
    pub data: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

fn parts(response: GenerateContentResponse) -> Result<Vec<ResponsePart>, Error> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(Error::Rejected(reason));
    }
    let candidate = response.candidates.into_iter().next();
    let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
    let parts = candidate
        .and_then(|c| c.content)
        .map(|content| content.parts)
        .unwrap_or_default();
    let blocked = matches!(
        finish_reason.as_deref(),
        Some("SAFETY" | "PROHIBITED_CONTENT" | "IMAGE_SAFETY")
    );
    if blocked && parts.is_empty() {
        return Err(Error::Rejected(finish_reason.unwrap_or_default()));
    }
    Ok(parts)
}

/// Concatenated text of the first candidate.
pub fn response_text(response: GenerateContentResponse) -> Result<String, Error> {
    let text = parts(response)?
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<String>();
    if text.trim().is_empty() {
        return Err(Error::NoText);
    }
    Ok(text)
}

/// First inline image of the first candidate.
pub fn response_image(response: GenerateContentResponse) -> Result<GeneratedImage, Error> {
    let inline = parts(response)?
        .into_iter()
        .find_map(|part| part.inline_data)
        .ok_or(Error::NoImage)?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(inline.data)
        .map_err(Error::Base64)?;
    Ok(GeneratedImage {
        bytes,
        mime_type: inline.mime_type,
    })
}

/// Chat model used to refine editing prompts.
#[derive(Debug, Clone)]
pub struct ChatClient {
    session: Session,
    endpoint: String,
}

impl ChatClient {
    pub fn new(session: Session, model: &str) -> Self {
        let endpoint = session.model_endpoint(model, "generateContent");
        Self { session, endpoint }
    }
}

impl text::Client for ChatClient {
    type Error = Error;

    async fn complete(&self, prompt: &str) -> Result<String, Self::Error> {
        let request = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: vec![Part::Text(prompt)],
            }],
            generation_config: None,
        };
        let response = self.session.post_json(&self.endpoint, &request).await?;
        let text = response_text(response)?;
        debug!(chars = text.len(), "chat model replied");
        Ok(text)
    }
}

/// Image model that stages an attached product photo.
#[derive(Debug, Clone)]
pub struct ImageEditClient {
    session: Session,
    endpoint: String,
}

impl ImageEditClient {
    pub fn new(session: Session, model: &str) -> Self {
        let endpoint = session.model_endpoint(model, "generateContent");
        Self { session, endpoint }
    }
}

fn edit_request<'a>(prompt: &'a str, reference: Option<Reference<'a>>) -> GenerateContentRequest<'a> {
    let mut parts = vec![Part::Text(prompt)];
    if let Some(reference) = reference {
        parts.push(Part::InlineData {
            mime_type: reference.mime_type,
            data: base64::engine::general_purpose::STANDARD.encode(reference.data),
        });
    }
    GenerateContentRequest {
        contents: [Content {
            role: "user",
            parts,
        }],
        generation_config: Some(GenerationConfig {
            response_modalities: ["TEXT", "IMAGE"],
            image_config: ImageConfig {
                aspect_ratio: "16:9",
            },
        }),
    }
}

impl image::Client for ImageEditClient {
    type Error = Error;

    async fn generate(
        &self,
        prompt: &str,
        reference: Option<Reference<'_>>,
    ) -> Result<GeneratedImage, Self::Error> {
        let request = edit_request(prompt, reference);
        let response = self.session.post_json(&self.endpoint, &request).await?;
        let image = response_image(response)?;
        debug!(size = image.bytes.len(), mime_type = ?image.mime_type, "image model returned image");
        Ok(image)
    }
}
