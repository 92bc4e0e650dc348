//! Adapter over the external coin-detection endpoint (Azure Custom Vision).
//!
//! Detection is advisory: it improves the crop but is never required for
//! correctness. The outcome is therefore a tri-state value rather than a
//! `Result` — transport failures, timeouts, and malformed responses all
//! collapse into [`DetectionOutcome::ServiceError`], which the cropper
//! treats exactly like [`DetectionOutcome::NotDetected`]. Nothing from this
//! module propagates past the crop stage.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{DETECTION_CONFIDENCE_THRESHOLD, DETECTOR_TIMEOUT_SECS};
use crate::error::DetectorError;
use crate::geometry::BoundingBoxPercent;

/// Result of a detection attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    /// A prediction cleared the confidence threshold.
    Detected(BoundingBoxPercent),
    /// The service responded but no prediction was confident enough.
    NotDetected,
    /// The service could not be reached or answered nonsense.
    ServiceError(String),
}

impl DetectionOutcome {
    /// The bounding box to crop with, if any. `NotDetected` and
    /// `ServiceError` both yield `None`, selecting the fallback crop.
    pub fn bounding_box(&self) -> Option<&BoundingBoxPercent> {
        match self {
            DetectionOutcome::Detected(bbox) => Some(bbox),
            DetectionOutcome::NotDetected | DetectionOutcome::ServiceError(_) => None,
        }
    }
}

/// Wire format of a single prediction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Prediction {
    pub probability: f64,
    #[serde(default)]
    pub bounding_box: WireBoundingBox,
}

/// Wire format of a relative bounding box. Values are untrusted and get
/// clamped during conversion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireBoundingBox {
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub top: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DetectionResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

/// Configuration for the Custom Vision prediction endpoint.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Base endpoint, e.g. `https://region.api.cognitive.microsoft.com`
    pub endpoint: String,
    /// Custom Vision project ID
    pub project_id: String,
    /// Published iteration name
    pub published_name: String,
    /// `Prediction-Key` header value
    pub prediction_key: String,
    /// Per-request timeout; elapsed timeouts degrade to the fallback crop
    pub timeout: Duration,
}

impl DetectorConfig {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        published_name: impl Into<String>,
        prediction_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            published_name: published_name.into(),
            prediction_key: prediction_key.into(),
            timeout: Duration::from_secs(DETECTOR_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds and validates the prediction URL.
    fn prediction_url(&self) -> Result<url::Url, String> {
        let raw = format!(
            "{}/customvision/v3.0/Prediction/{}/detect/iterations/{}/image",
            self.endpoint.trim_end_matches('/'),
            self.project_id,
            self.published_name
        );
        url::Url::parse(&raw).map_err(|e| format!("Invalid detector URL {}: {}", raw, e))
    }
}

/// Seam for the object detector so the pipeline can run against a stub.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Attempts to locate the coin in the given (orientation-corrected)
    /// image bytes. Infallible by design; failures become outcomes.
    async fn detect(&self, image_bytes: &[u8]) -> DetectionOutcome;
}

/// HTTP adapter for the Custom Vision object-detection service.
pub struct CustomVisionDetector {
    client: reqwest::Client,
    config: DetectorConfig,
}

impl CustomVisionDetector {
    /// Builds the adapter with a pooled HTTP client and the configured
    /// request timeout.
    pub fn new(config: DetectorConfig) -> Result<Self, DetectorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DetectorError::ClientBuild(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn try_detect(&self, image_bytes: &[u8]) -> Result<DetectionOutcome, String> {
        let url = self.config.prediction_url()?;

        let response = self
            .client
            .post(url)
            .header("Prediction-Key", &self.config.prediction_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image_bytes.to_vec())
            .send()
            .await
            .map_err(|e| format!("Detection request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Detection service returned {}", status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read detection response: {}", e))?;

        let parsed: DetectionResponse = serde_json::from_str(&body)
            .map_err(|e| format!("Failed to parse detection response: {}", e))?;

        Ok(select_prediction(&parsed.predictions))
    }
}

#[async_trait]
impl Detector for CustomVisionDetector {
    async fn detect(&self, image_bytes: &[u8]) -> DetectionOutcome {
        match self.try_detect(image_bytes).await {
            Ok(outcome) => {
                debug!(?outcome, "Coin detection completed");
                outcome
            }
            Err(reason) => {
                warn!(%reason, "Coin detection unavailable, crop will fall back");
                DetectionOutcome::ServiceError(reason)
            }
        }
    }
}

/// Picks the first prediction clearing the confidence threshold, in
/// response order. Detector floats are clamped into valid fractions.
fn select_prediction(predictions: &[Prediction]) -> DetectionOutcome {
    for prediction in predictions {
        if prediction.probability > DETECTION_CONFIDENCE_THRESHOLD {
            let b = &prediction.bounding_box;
            let bbox = BoundingBoxPercent::from_wire(b.left, b.top, b.width, b.height);
            return DetectionOutcome::Detected(bbox);
        }
    }
    DetectionOutcome::NotDetected
}
