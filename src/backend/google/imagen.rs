use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Error, Session};
use crate::job::service::image::{self, GeneratedImage, Reference};

#[derive(Serialize, Debug)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
    parameters: Parameters,
}

#[derive(Serialize, Debug)]
struct Instance<'a> {
    prompt: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    sample_count: u32,
    aspect_ratio: &'static str,
    safety_setting: &'static str,
    person_generation: &'static str,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            sample_count: 1,
            aspect_ratio: "16:9",
            safety_setting: "block_some",
            person_generation: "dont_allow",
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub bytes_base64_encoded: Option<String>,
    pub mime_type: Option<String>,
    pub rai_filtered_reason: Option<String>,
}

/// First image of a `:predict` response.
pub fn first_image(response: PredictResponse) -> Result<GeneratedImage, Error> {
    let mut filtered = None;
    for prediction in response.predictions {
        if let Some(data) = prediction.bytes_base64_encoded {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(Error::Base64)?;
            return Ok(GeneratedImage {
                bytes,
                mime_type: prediction.mime_type,
            });
        }
        filtered = filtered.or(prediction.rai_filtered_reason);
    }
    Err(filtered.map(Error::Rejected).unwrap_or(Error::NoImage))
}

/// Imagen text-to-image client on Vertex AI.
#[derive(Debug, Clone)]
pub struct ImagenClient {
    session: Session,
    endpoint: String,
}

impl ImagenClient {
    pub fn new(session: Session, model: &str) -> Self {
        let endpoint = session.model_endpoint(model, "predict");
        Self { session, endpoint }
    }
}

impl image::Client for ImagenClient {
    type Error = Error;

    async fn generate(
        &self,
        prompt: &str,
        reference: Option<Reference<'_>>,
    ) -> Result<GeneratedImage, Self::Error> {
        if reference.is_some() {
            warn!("imagen generates from text only, ignoring reference photo");
        }
        let request = PredictRequest {
            instances: [Instance { prompt }],
            parameters: Parameters::default(),
        };
        let response = self.session.post_json(&self.endpoint, &request).await?;
        let image = first_image(response)?;
        debug!(size = image.bytes.len(), mime_type = ?image.mime_type, "imagen returned image");
        Ok(image)
    }
}
