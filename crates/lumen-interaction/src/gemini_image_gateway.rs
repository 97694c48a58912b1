//! GeminiImageGateway - Direct REST API implementation of [`EditGateway`].
//!
//! This gateway calls the Gemini REST API directly without an SDK
//! dependency. Image-to-image operations go through `generateContent` with
//! inline base64 parts; from-scratch generation goes through the Imagen
//! `predict` endpoint. Configuration is loaded from secret.json.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use lumen_core::gateway::{EditGateway, GatewayError, GatewayResult};
use lumen_core::image::ImageData;
use lumen_core::session::PixelPoint;
use lumen_infrastructure::SecretService;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_EDIT_MODEL: &str = "gemini-2.5-flash-image-preview";
const DEFAULT_GENERATION_MODEL: &str = "imagen-4.0-generate-001";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

const COLORIZE_PROMPT: &str = "You are a world-class expert in photo restoration. Colorize the provided black and white image. The colors must be photorealistic and context-aware. Preserve all original details.\nOutput: Return ONLY the final colorized image.";

const STYLE_TRANSFER_PROMPT: &str = "Analyze the artistic style of the second image (style image) and apply it to the first image (content image). Retain the subject of the content image.\nOutput: Return ONLY the final styled image.";

const ENHANCE_SYSTEM_INSTRUCTION: &str = "You are a creative assistant that helps users write better text-to-image prompts. Rewrite the user's prompt to be more descriptive, evocative, and detailed. Focus on adding details about the subject, setting, lighting, composition, and artistic style. Return ONLY the enhanced prompt.";

/// Gateway implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiImageGateway {
    client: Client,
    api_key: String,
    edit_model: String,
    generation_model: String,
    text_model: String,
}

impl GeminiImageGateway {
    /// Creates a gateway with the provided API key and default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            edit_model: DEFAULT_EDIT_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
        }
    }

    /// Loads configuration from secret.json.
    ///
    /// `model_name` overrides the image-edit model when present.
    pub fn from_config() -> GatewayResult<Self> {
        let service = SecretService::new().map_err(|e| GatewayError::Config(e.to_string()))?;
        let config = service
            .load_gemini()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let mut gateway = Self::new(config.api_key);
        if let Some(model) = config.model_name {
            gateway.edit_model = model;
        }
        Ok(gateway)
    }

    /// Overrides the image-edit model after construction.
    pub fn with_edit_model(mut self, model: impl Into<String>) -> Self {
        self.edit_model = model.into();
        self
    }

    /// Overrides the text-to-image generation model after construction.
    pub fn with_generation_model(mut self, model: impl Into<String>) -> Self {
        self.generation_model = model.into();
        self
    }

    /// Overrides the text model used for prompt enhancement.
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    fn image_part(image: &ImageData) -> Part {
        Part::InlineData {
            inline_data: InlineDataPayload {
                mime_type: image.mime_type().to_string(),
                data: BASE64_STANDARD.encode(image.bytes()),
            },
        }
    }

    fn text_part(text: impl Into<String>) -> Part {
        Part::Text { text: text.into() }
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> GatewayResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read the Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        response
            .json()
            .await
            .map_err(|err| GatewayError::MalformedResponse(err.to_string()))
    }

    /// Runs an image-to-image request and extracts the returned image.
    async fn generate_image_content(
        &self,
        parts: Vec<Part>,
        context: &str,
    ) -> GatewayResult<ImageData> {
        tracing::debug!("[GeminiImageGateway] {} request via {}", context, self.edit_model);

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            }),
        };

        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = self.edit_model,
            api_key = self.api_key
        );
        let response: GenerateContentResponse = self.post_json(&url, &request).await?;
        extract_image_response(response, context)
    }
}

#[async_trait]
impl EditGateway for GeminiImageGateway {
    async fn generate(&self, prompt: &str) -> GatewayResult<ImageData> {
        tracing::debug!(
            "[GeminiImageGateway] generation request via {}",
            self.generation_model
        );

        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: "1:1".to_string(),
                output_mime_type: "image/png".to_string(),
            },
        };

        let url = format!(
            "{}/{model}:predict?key={api_key}",
            BASE_URL,
            model = self.generation_model,
            api_key = self.api_key
        );
        let response: PredictResponse = self.post_json(&url, &request).await?;
        extract_generated_image(response)
    }

    async fn edit(
        &self,
        image: &ImageData,
        prompt: &str,
        hotspot: PixelPoint,
    ) -> GatewayResult<ImageData> {
        self.generate_image_content(
            vec![
                Self::image_part(image),
                Self::text_part(edit_instruction(prompt, hotspot)),
            ],
            "edit",
        )
        .await
    }

    async fn filter(&self, image: &ImageData, prompt: &str) -> GatewayResult<ImageData> {
        let instruction = format!(
            "You are an expert photo editor AI. Apply a stylistic filter to the entire image. Do not change the composition or content, only apply the style.\n\
             Filter Request: \"{prompt}\"\n\
             Output: Return ONLY the final filtered image."
        );
        self.generate_image_content(
            vec![Self::image_part(image), Self::text_part(instruction)],
            "filter",
        )
        .await
    }

    async fn adjust(&self, image: &ImageData, prompt: &str) -> GatewayResult<ImageData> {
        let instruction = format!(
            "You are an expert photo editor AI. Perform a natural, global adjustment to the entire image. The result must be photorealistic.\n\
             User Request: \"{prompt}\"\n\
             Output: Return ONLY the final adjusted image."
        );
        self.generate_image_content(
            vec![Self::image_part(image), Self::text_part(instruction)],
            "adjustment",
        )
        .await
    }

    async fn colorize(&self, image: &ImageData) -> GatewayResult<ImageData> {
        self.generate_image_content(
            vec![Self::image_part(image), Self::text_part(COLORIZE_PROMPT)],
            "colorization",
        )
        .await
    }

    async fn style_transfer(
        &self,
        content: &ImageData,
        style: &ImageData,
    ) -> GatewayResult<ImageData> {
        self.generate_image_content(
            vec![
                Self::image_part(content),
                Self::image_part(style),
                Self::text_part(STYLE_TRANSFER_PROMPT),
            ],
            "style transfer",
        )
        .await
    }

    async fn enhance_prompt(&self, prompt: &str) -> GatewayResult<String> {
        tracing::debug!(
            "[GeminiImageGateway] prompt enhancement via {}",
            self.text_model
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Self::text_part(prompt)],
            }],
            system_instruction: Some(Content {
                role: "system".to_string(),
                parts: vec![Self::text_part(ENHANCE_SYSTEM_INSTRUCTION)],
            }),
            generation_config: None,
        };

        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = self.text_model,
            api_key = self.api_key
        );
        let response: GenerateContentResponse = self.post_json(&url, &request).await?;
        extract_text_response(response)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "systemInstruction")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "generationConfig")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<String>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
    output_mime_type: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
    #[serde(rename = "blockReasonMessage")]
    block_reason_message: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineDataResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataResponse {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Option<Vec<Prediction>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

// ============================================================================
// Response mapping
// ============================================================================

/// Maps a `generateContent` response to an image, mirroring the service's
/// failure modes: prompt block first, then the image part, then the finish
/// reason, then a generic no-image error quoting any text that came back.
fn extract_image_response(
    response: GenerateContentResponse,
    context: &str,
) -> GatewayResult<ImageData> {
    if let Some(feedback) = &response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            let detail = feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| "Please adjust your prompt and try again.".to_string());
            return Err(GatewayError::Blocked {
                reason: reason.clone(),
                detail,
            });
        }
    }

    let candidate = response
        .candidates
        .and_then(|mut candidates| (!candidates.is_empty()).then(|| candidates.remove(0)));

    let parts = candidate
        .as_ref()
        .and_then(|c| c.content.as_ref())
        .map(|content| content.parts.as_slice())
        .unwrap_or_default();

    if let Some(inline) = parts.iter().find_map(|part| part.inline_data.as_ref()) {
        let bytes = BASE64_STANDARD
            .decode(&inline.data)
            .map_err(|err| GatewayError::MalformedResponse(err.to_string()))?;
        return Ok(ImageData::new(bytes, inline.mime_type.clone()));
    }

    match candidate.as_ref().and_then(|c| c.finish_reason.as_deref()) {
        Some("SAFETY") => {
            return Err(GatewayError::NoImage(
                "The request was blocked due to safety settings. Please modify your prompt or image."
                    .to_string(),
            ));
        }
        Some("RECITATION") => {
            return Err(GatewayError::NoImage(
                "The request was blocked due to recitation policies.".to_string(),
            ));
        }
        Some("MAX_TOKENS") => {
            return Err(GatewayError::NoImage(
                "The request failed because it exceeded the maximum token limit.".to_string(),
            ));
        }
        // STOP means the model answered with text instead of an image;
        // fall through to the generic error which quotes that text.
        Some("STOP") | None => {}
        Some(other) => {
            return Err(GatewayError::NoImage(format!(
                "Image generation stopped unexpectedly. Reason: {other}."
            )));
        }
    }

    let text_feedback = parts
        .iter()
        .find_map(|part| part.text.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty());

    let message = match text_feedback {
        Some(text) => format!(
            "The AI model did not return an image for the {context}. The model responded with text: \"{text}\""
        ),
        None => format!(
            "The AI model did not return an image for the {context}. This can happen due to safety filters or if the request is too complex. Please try rephrasing your prompt to be more direct."
        ),
    };
    Err(GatewayError::NoImage(message))
}

fn extract_generated_image(response: PredictResponse) -> GatewayResult<ImageData> {
    let prediction = response
        .predictions
        .and_then(|mut predictions| (!predictions.is_empty()).then(|| predictions.remove(0)));

    match prediction.and_then(|p| p.bytes_base64_encoded.map(|data| (data, p.mime_type))) {
        Some((data, mime_type)) => {
            let bytes = BASE64_STANDARD
                .decode(&data)
                .map_err(|err| GatewayError::MalformedResponse(err.to_string()))?;
            Ok(ImageData::new(
                bytes,
                mime_type.unwrap_or_else(|| "image/png".to_string()),
            ))
        }
        None => Err(GatewayError::NoImage(
            "The AI model did not return an image. This may be due to safety settings or an issue with the service. Please try a different prompt."
                .to_string(),
        )),
    }
}

fn extract_text_response(response: GenerateContentResponse) -> GatewayResult<String> {
    let text = response
        .candidates
        .and_then(|mut candidates| (!candidates.is_empty()).then(|| candidates.remove(0)))
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    text.ok_or_else(|| {
        GatewayError::NoImage("The AI model did not return an enhanced prompt.".to_string())
    })
}

fn edit_instruction(prompt: &str, hotspot: PixelPoint) -> String {
    format!(
        "You are an expert photo editor AI. Your task is to perform a natural, localized edit on the provided image based on the user's request.\n\
         User Request: \"{prompt}\"\n\
         Edit Location: Focus on the area around pixel coordinates (x: {x}, y: {y}). The rest of the image must remain identical.\n\
         Output: Return ONLY the final edited image.",
        x = hotspot.x,
        y = hotspot.y
    )
}

fn map_http_error(status: StatusCode, body: String) -> GatewayError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    GatewayError::Api {
        status_code: Some(status.as_u16()),
        message,
        retryable,
    }
}
