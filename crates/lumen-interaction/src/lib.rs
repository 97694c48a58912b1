pub mod gemini_image_gateway;

pub use gemini_image_gateway::GeminiImageGateway;
