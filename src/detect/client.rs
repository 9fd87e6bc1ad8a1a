use std::time::Duration;

use axum::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tracing::warn;

use crate::config::AppConfig;
use crate::detect::dto::{BoundingBox, Detection};

const DETECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote object-detection backend.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn detect(&self, image: Bytes) -> anyhow::Result<Vec<Detection>>;
}

/// Detection as returned by the Hugging Face inference API.
#[derive(Debug, Deserialize)]
struct RemoteDetection {
    #[serde(default = "unknown_label")]
    label: String,
    #[serde(default)]
    score: f64,
    #[serde(rename = "box", default)]
    bbox: RemoteBox,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteBox {
    #[serde(default)]
    xmin: f64,
    #[serde(default)]
    ymin: f64,
    #[serde(default)]
    xmax: f64,
    #[serde(default)]
    ymax: f64,
}

fn unknown_label() -> String {
    "Unknown".to_string()
}

impl From<RemoteDetection> for Detection {
    fn from(d: RemoteDetection) -> Self {
        // Corner schema becomes x/y/width/height. Malformed remote boxes can
        // yield negative extents; passed through unclamped, caller beware.
        Detection {
            label: d.label,
            score: d.score,
            bbox: BoundingBox {
                x: d.bbox.xmin,
                y: d.bbox.ymin,
                width: d.bbox.xmax - d.bbox.xmin,
                height: d.bbox.ymax - d.bbox.ymin,
            },
        }
    }
}

/// Object detection via the Hugging Face inference API.
pub struct HuggingFaceDetector {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl HuggingFaceDetector {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DETECTION_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_url: config.detection_api_url.clone(),
            api_key: config.detection_api_key.clone(),
        })
    }
}

#[async_trait]
impl ObjectDetector for HuggingFaceDetector {
    async fn detect(&self, image: Bytes) -> anyhow::Result<Vec<Detection>> {
        let mut request = self.client.post(&self.api_url).body(image);
        // Without a key we still attempt an unauthenticated call.
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body.chars().take(200).collect::<String>(),
                "detection API returned non-success status");
            anyhow::bail!("detection API error: {status}");
        }

        let remote: Vec<RemoteDetection> = response.json().await?;
        Ok(remote.into_iter().map(Detection::from).collect())
    }
}
