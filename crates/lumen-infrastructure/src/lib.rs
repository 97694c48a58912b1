pub mod handle_registry;
pub mod image_loader;
pub mod secret_service;

pub use handle_registry::InMemoryHandleRegistry;
pub use image_loader::load_image;
pub use secret_service::{GeminiConfig, SecretConfig, SecretService};
