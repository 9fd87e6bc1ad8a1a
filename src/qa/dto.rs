use serde::{Deserialize, Serialize};

use crate::detect::dto::{BoundingBox, Detection};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct QaRequest {
    pub question: Option<String>,
    /// Left as raw JSON so a non-array body maps to a 400 instead of a
    /// decode rejection.
    pub detections: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct QaResponse {
    pub answer: String,
}

/// Detection as clients are allowed to send it: `label` or `class`,
/// `score` or `confidence`, bbox as an object or a corner array. Both key
/// spellings are kept as options so a null, empty, or absent primary key
/// falls through to the secondary one.
#[derive(Debug, Deserialize)]
pub struct RawDetection {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub bbox: RawBoundingBox,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawBoundingBox {
    Edges {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        width: f64,
        #[serde(default)]
        height: f64,
    },
    /// `[xmin, ymin, xmax, ymax]`; missing entries read as 0.
    Corners(Vec<f64>),
}

impl Default for RawBoundingBox {
    fn default() -> Self {
        RawBoundingBox::Edges {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }
}

impl From<RawDetection> for Detection {
    fn from(raw: RawDetection) -> Self {
        // An empty label defers to `class`, and a zero score defers to
        // `confidence`, matching how lenient clients mix the two schemas.
        let label = raw
            .label
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| raw.class.unwrap_or_else(|| "Unknown".to_string()));
        let score = raw
            .score
            .filter(|s| *s != 0.0)
            .unwrap_or_else(|| raw.confidence.unwrap_or(0.0));
        let bbox = match raw.bbox {
            RawBoundingBox::Edges {
                x,
                y,
                width,
                height,
            } => BoundingBox {
                x,
                y,
                width,
                height,
            },
            RawBoundingBox::Corners(c) => {
                let at = |i: usize| c.get(i).copied().unwrap_or(0.0);
                BoundingBox {
                    x: at(0),
                    y: at(1),
                    width: at(2) - at(0),
                    height: at(3) - at(1),
                }
            }
        };
        Detection { label, score, bbox }
    }
}

/// Normalize client-supplied detections into the canonical shape. Everything
/// downstream only ever sees `Detection`.
pub fn normalize_detections(items: &[serde_json::Value]) -> Result<Vec<Detection>, ApiError> {
    items
        .iter()
        .map(|v| {
            serde_json::from_value::<RawDetection>(v.clone())
                .map(Detection::from)
                .map_err(|_| ApiError::Validation("Invalid detection object".into()))
        })
        .collect()
}
