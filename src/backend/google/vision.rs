use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Error, ErrorDetail, Session};
use crate::{
    classify::{Annotations, Rgb},
    job::service::annotate,
};

pub const ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";
pub const MAX_LABELS: u32 = 15;

#[derive(Serialize, Debug)]
struct AnnotateRequest<'a> {
    requests: [ImageRequest<'a>; 1],
}

#[derive(Serialize, Debug)]
struct ImageRequest<'a> {
    image: ImageContent,
    features: &'a [Feature],
}

#[derive(Serialize, Debug)]
struct ImageContent {
    content: String,
}

#[derive(Serialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_results: Option<u32>,
}

const FEATURES: &[Feature] = &[
    Feature {
        kind: "LABEL_DETECTION",
        max_results: Some(MAX_LABELS),
    },
    Feature {
        kind: "IMAGE_PROPERTIES",
        max_results: None,
    },
    Feature {
        kind: "OBJECT_LOCALIZATION",
        max_results: None,
    },
    Feature {
        kind: "WEB_DETECTION",
        max_results: None,
    },
];

#[derive(Deserialize, Debug, Default)]
pub struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<ImageResponse>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    #[serde(default)]
    pub label_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    pub localized_object_annotations: Vec<LocalizedObject>,
    pub web_detection: Option<WebDetection>,
    pub image_properties_annotation: Option<ImageProperties>,
    pub error: Option<ErrorDetail>,
}

#[derive(Deserialize, Debug)]
pub struct EntityAnnotation {
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct LocalizedObject {
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct WebDetection {
    #[serde(default)]
    pub web_entities: Vec<WebEntity>,
}

#[derive(Deserialize, Debug)]
pub struct WebEntity {
    pub description: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImageProperties {
    pub dominant_colors: Option<DominantColors>,
}

#[derive(Deserialize, Debug)]
pub struct DominantColors {
    #[serde(default)]
    pub colors: Vec<ColorInfo>,
}

#[derive(Deserialize, Debug)]
pub struct ColorInfo {
    #[serde(default)]
    pub color: Color,
}

/// Components are omitted from the wire format when zero.
#[derive(Deserialize, Debug, Default, Clone, Copy)]
pub struct Color {
    #[serde(default)]
    pub red: f64,
    #[serde(default)]
    pub green: f64,
    #[serde(default)]
    pub blue: f64,
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

impl From<Color> for Rgb {
    fn from(color: Color) -> Self {
        Rgb {
            red: channel(color.red),
            green: channel(color.green),
            blue: channel(color.blue),
        }
    }
}

/// Flatten the first per-image response into [`Annotations`].
pub fn annotations(response: AnnotateResponse) -> Result<Annotations, Error> {
    let Some(image) = response.responses.into_iter().next() else {
        return Ok(Annotations::default());
    };
    if let Some(error) = image.error.filter(|error| !error.message.is_empty()) {
        return Err(Error::Rejected(error.message));
    }
    let non_empty = |s: String| (!s.is_empty()).then_some(s);
    Ok(Annotations {
        labels: image
            .label_annotations
            .into_iter()
            .filter_map(|label| non_empty(label.description))
            .collect(),
        objects: image
            .localized_object_annotations
            .into_iter()
            .filter_map(|object| non_empty(object.name))
            .collect(),
        web_entities: image
            .web_detection
            .map(|web| web.web_entities)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entity| entity.description.and_then(non_empty))
            .collect(),
        dominant_color: image
            .image_properties_annotation
            .and_then(|properties| properties.dominant_colors)
            .and_then(|dominant| dominant.colors.into_iter().next())
            .map(|info| info.color.into()),
    })
}

/// Cloud Vision `images:annotate` client.
#[derive(Debug, Clone)]
pub struct VisionClient {
    session: Session,
}

impl VisionClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl annotate::Client for VisionClient {
    type Error = Error;

    async fn annotate(&self, image: &[u8]) -> Result<Annotations, Self::Error> {
        let request = AnnotateRequest {
            requests: [ImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(image),
                },
                features: FEATURES,
            }],
        };
        let response = self.session.post_json(ENDPOINT, &request).await?;
        let annotations = annotations(response)?;
        debug!(
            labels = ?annotations.labels,
            objects = ?annotations.objects,
            web_entities = annotations.web_entities.len(),
            dominant_color = ?annotations.dominant_color,
            "image analysed"
        );
        Ok(annotations)
    }
}
