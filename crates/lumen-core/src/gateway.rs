//! The remote edit gateway boundary.
//!
//! The AI image service is an opaque collaborator: given an image and a
//! text instruction it returns a new image, or it fails with a
//! human-readable message. The engine does not interpret failure kinds
//! beyond surfacing that message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::image::ImageData;
use crate::session::PixelPoint;

/// Failures reported by an [`EditGateway`] implementation.
///
/// The variant messages are shown to the user verbatim (prefixed by the
/// action that failed), so they are written as full sentences.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum GatewayError {
    /// The request was rejected before any generation ran.
    #[error("Request was blocked due to {reason}. {detail}")]
    Blocked { reason: String, detail: String },

    /// The model finished without producing an image.
    #[error("{0}")]
    NoImage(String),

    /// Non-success HTTP response from the API. `retryable` is a
    /// classification only; nothing in the engine retries.
    #[error("{message}")]
    Api {
        status_code: Option<u16>,
        message: String,
        retryable: bool,
    },

    /// The request never reached the service or the connection dropped.
    #[error("Request to the image service failed: {0}")]
    Transport(String),

    /// The service answered with a body the client could not interpret.
    #[error("Failed to parse the image service response: {0}")]
    MalformedResponse(String),

    /// The gateway is not configured (e.g. missing API key).
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A type alias for `Result<T, GatewayError>`.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// The external AI image-editing service.
///
/// Each call is a single request/response: no retry, no streaming, no
/// partial results. Timeouts are the transport's concern.
#[async_trait]
pub trait EditGateway: Send + Sync {
    /// Generates a new image from a text prompt alone.
    async fn generate(&self, prompt: &str) -> GatewayResult<ImageData>;

    /// Performs a localized edit focused on `hotspot`, a pixel coordinate
    /// in the source image's native resolution.
    async fn edit(
        &self,
        image: &ImageData,
        prompt: &str,
        hotspot: PixelPoint,
    ) -> GatewayResult<ImageData>;

    /// Applies a stylistic filter to the entire image.
    async fn filter(&self, image: &ImageData, prompt: &str) -> GatewayResult<ImageData>;

    /// Applies a global, photorealistic adjustment to the entire image.
    async fn adjust(&self, image: &ImageData, prompt: &str) -> GatewayResult<ImageData>;

    /// Colorizes a black-and-white image.
    async fn colorize(&self, image: &ImageData) -> GatewayResult<ImageData>;

    /// Applies the artistic style of `style` to `content`.
    async fn style_transfer(
        &self,
        content: &ImageData,
        style: &ImageData,
    ) -> GatewayResult<ImageData>;

    /// Rewrites a text-to-image prompt to be more descriptive.
    async fn enhance_prompt(&self, prompt: &str) -> GatewayResult<String>;
}
