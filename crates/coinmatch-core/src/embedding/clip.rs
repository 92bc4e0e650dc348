//! CLIP ViT-B/32 vision encoder using Candle.
//!
//! Loads the full CLIP checkpoint from safetensors bytes and uses only the
//! image tower: `get_image_features` runs the vision transformer and the
//! visual projection, yielding the 512-dimensional `image_embeds` output of
//! the equivalent ONNX artifact.

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use tracing::info;

use crate::config::EMBEDDING_DIM;
use crate::embedding::preprocess::to_encoder_input;
use crate::embedding::{l2_normalize, ImageEncoder};
use crate::error::EncoderError;
use crate::image::CroppedImage;

/// CLIP image encoder.
///
/// The model handle is heavyweight (~600MB of weights): create it once and
/// share it behind the serial scheduler rather than per request. `Device`
/// ownership stays with whoever constructed the encoder; all inference for
/// this handle must run on that thread or be externally serialized.
pub struct ClipImageEncoder {
    model: ClipModel,
    device: Device,
}

impl ClipImageEncoder {
    /// Loads CLIP ViT-B/32 weights from safetensors bytes onto the given
    /// device.
    ///
    /// # Errors
    ///
    /// Returns `EncoderError::ModelLoad` when the weights are malformed or
    /// incomplete. Model-load failure is fatal; there is no fallback
    /// encoder.
    pub fn from_safetensors_bytes(
        model_bytes: Vec<u8>,
        device: &Device,
    ) -> Result<Self, EncoderError> {
        info!(
            "Loading CLIP ViT-B/32 vision encoder ({:.2}MB of weights)",
            model_bytes.len() as f64 / 1_000_000.0
        );

        let vb = VarBuilder::from_buffered_safetensors(model_bytes, DType::F32, device)
            .map_err(|e| EncoderError::ModelLoad(e.to_string()))?;

        let config = ClipConfig::vit_base_patch32();
        let model =
            ClipModel::new(vb, &config).map_err(|e| EncoderError::ModelLoad(e.to_string()))?;

        info!("CLIP encoder loaded");

        Ok(Self {
            model,
            device: device.clone(),
        })
    }
}

impl ImageEncoder for ClipImageEncoder {
    fn embedding_dim(&self) -> usize {
        EMBEDDING_DIM
    }

    fn encode(&self, image: &CroppedImage) -> Result<Vec<f32>, EncoderError> {
        let input = to_encoder_input(image);
        let side = input.size as usize;

        let pixel_values = Tensor::from_vec(input.data, (1, 3, side, side), &self.device)
            .map_err(|e| EncoderError::TensorCreation(e.to_string()))?;

        let features = self
            .model
            .get_image_features(&pixel_values)
            .map_err(|e| EncoderError::InferenceFailed(e.to_string()))?;

        let raw = features
            .flatten_all()
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| EncoderError::InferenceFailed(e.to_string()))?;

        l2_normalize(raw)
    }
}
