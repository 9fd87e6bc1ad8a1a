use serde::{Deserialize, Serialize};

/// Axis-aligned box in image-pixel space, origin top-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// One recognized object instance. This is the canonical shape: everything
/// downstream of the ingestion boundary sees only this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub score: f64,
    pub bbox: BoundingBox,
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub detections: Vec<Detection>,
    #[serde(rename = "annotatedImage")]
    pub annotated_image: String,
}
