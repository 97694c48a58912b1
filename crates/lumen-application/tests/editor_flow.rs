//! End-to-end session flows against mock gateways.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use lumen_application::EditorUseCase;
use lumen_core::gateway::{EditGateway, GatewayError, GatewayResult};
use lumen_core::image::ImageData;
use lumen_core::session::{CropRect, Hotspot, PixelPoint, Tool};
use lumen_infrastructure::InMemoryHandleRegistry;

// Scripted gateway: pops pre-loaded responses and records every call.
#[derive(Default)]
struct ScriptedGateway {
    image_responses: Mutex<VecDeque<GatewayResult<ImageData>>>,
    text_responses: Mutex<VecDeque<GatewayResult<String>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    fn new() -> Self {
        Self::default()
    }

    fn push_image(&self, response: GatewayResult<ImageData>) {
        self.image_responses.lock().unwrap().push_back(response);
    }

    fn push_text(&self, response: GatewayResult<String>) {
        self.text_responses.lock().unwrap().push_back(response);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn next_image(&self, operation: &str) -> GatewayResult<ImageData> {
        self.calls.lock().unwrap().push(operation.to_string());
        self.image_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response for '{operation}'"))
    }
}

#[async_trait]
impl EditGateway for ScriptedGateway {
    async fn generate(&self, _prompt: &str) -> GatewayResult<ImageData> {
        self.next_image("generate")
    }

    async fn edit(
        &self,
        _image: &ImageData,
        _prompt: &str,
        _hotspot: PixelPoint,
    ) -> GatewayResult<ImageData> {
        self.next_image("edit")
    }

    async fn filter(&self, _image: &ImageData, _prompt: &str) -> GatewayResult<ImageData> {
        self.next_image("filter")
    }

    async fn adjust(&self, _image: &ImageData, _prompt: &str) -> GatewayResult<ImageData> {
        self.next_image("adjust")
    }

    async fn colorize(&self, _image: &ImageData) -> GatewayResult<ImageData> {
        self.next_image("colorize")
    }

    async fn style_transfer(
        &self,
        _content: &ImageData,
        _style: &ImageData,
    ) -> GatewayResult<ImageData> {
        self.next_image("style_transfer")
    }

    async fn enhance_prompt(&self, _prompt: &str) -> GatewayResult<String> {
        self.calls.lock().unwrap().push("enhance_prompt".to_string());
        self.text_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response for 'enhance_prompt'")
    }
}

// Gateway that parks inside colorize until released, to observe the busy
// window from the outside.
#[derive(Default)]
struct BlockingGateway {
    started: Notify,
    release: Notify,
}

#[async_trait]
impl EditGateway for BlockingGateway {
    async fn generate(&self, _prompt: &str) -> GatewayResult<ImageData> {
        panic!("unexpected generate call")
    }

    async fn edit(
        &self,
        _image: &ImageData,
        _prompt: &str,
        _hotspot: PixelPoint,
    ) -> GatewayResult<ImageData> {
        panic!("unexpected edit call")
    }

    async fn filter(&self, _image: &ImageData, _prompt: &str) -> GatewayResult<ImageData> {
        panic!("unexpected filter call")
    }

    async fn adjust(&self, _image: &ImageData, _prompt: &str) -> GatewayResult<ImageData> {
        panic!("unexpected adjust call")
    }

    async fn colorize(&self, image: &ImageData) -> GatewayResult<ImageData> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(image.clone())
    }

    async fn style_transfer(
        &self,
        _content: &ImageData,
        _style: &ImageData,
    ) -> GatewayResult<ImageData> {
        panic!("unexpected style_transfer call")
    }

    async fn enhance_prompt(&self, _prompt: &str) -> GatewayResult<String> {
        panic!("unexpected enhance_prompt call")
    }
}

fn png(tag: u8) -> ImageData {
    ImageData::png(vec![tag])
}

async fn labels(editor: &EditorUseCase) -> Vec<String> {
    editor
        .with_state(|state| {
            state
                .history()
                .items()
                .iter()
                .map(|item| item.label().to_string())
                .collect()
        })
        .await
}

#[tokio::test]
async fn test_upload_initializes_session() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway);

    editor.upload_image(png(1)).await;

    editor
        .with_state(|state| {
            assert_eq!(state.history().len(), 1);
            assert_eq!(state.history().cursor(), Some(0));
            assert_eq!(
                state.history().current().unwrap().label(),
                "Original Image"
            );
            assert_eq!(state.active_tool(), Tool::Retouch);
        })
        .await;
}

#[tokio::test]
async fn test_branching_discards_redo_tail_and_revokes_handles() {
    let gateway = Arc::new(ScriptedGateway::new());
    let registry = Arc::new(InMemoryHandleRegistry::new());
    let editor = EditorUseCase::with_handle_registry(gateway.clone(), registry.clone());

    editor.upload_image(png(1)).await;

    gateway.push_image(Ok(png(2)));
    editor.set_filter_prompt("Sepia").await;
    editor.apply_filter().await.unwrap();
    assert_eq!(labels(&editor).await, ["Original Image", "Sepia"]);

    assert!(editor.undo().await);
    editor
        .with_state(|state| {
            assert_eq!(state.history().cursor(), Some(0));
            assert_eq!(state.current_image().unwrap().bytes(), &[1]);
        })
        .await;

    gateway.push_image(Ok(png(3)));
    editor.set_adjustment_prompt("Brighten").await;
    editor.apply_adjustment().await.unwrap();

    assert_eq!(labels(&editor).await, ["Original Image", "Brighten"]);
    editor
        .with_state(|state| assert_eq!(state.history().cursor(), Some(1)))
        .await;
    // The Sepia snapshot was evicted and its handle revoked with it.
    assert_eq!(registry.live_count(), 2);
    assert_eq!(gateway.calls(), ["filter", "adjust"]);
}

#[tokio::test]
async fn test_failed_edit_reports_error_and_leaves_history_alone() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    editor.upload_image(png(1)).await;
    gateway.push_image(Err(GatewayError::Api {
        status_code: Some(429),
        message: "quota exceeded".to_string(),
        retryable: true,
    }));

    let err = editor.apply_colorize().await.unwrap_err();
    assert!(err.is_gateway());

    let notice = editor.last_error().await.expect("error should be recorded");
    assert!(notice.message().contains("Failed to colorize."));
    assert!(notice.message().contains("quota exceeded"));
    assert!(!editor.is_busy().await);
    assert_eq!(labels(&editor).await, ["Original Image"]);
}

#[tokio::test]
async fn test_blank_failure_cause_is_normalized() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    editor.upload_image(png(1)).await;
    gateway.push_image(Err(GatewayError::NoImage(String::new())));

    editor.apply_colorize().await.unwrap_err();
    let notice = editor.last_error().await.unwrap();
    assert_eq!(
        notice.message(),
        "Failed to colorize. An unknown error occurred."
    );
}

#[tokio::test]
async fn test_retouch_validation_short_circuits() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    editor.upload_image(png(1)).await;
    // Prompt set but no hotspot picked.
    editor.set_retouch_prompt("remove the lamp post").await;

    let err = editor.retouch().await.unwrap_err();
    assert!(err.is_validation());

    let notice = editor.last_error().await.unwrap();
    assert_eq!(
        notice.message(),
        "Please select an area on the image and provide a prompt."
    );
    assert!(gateway.calls().is_empty());
    assert_eq!(labels(&editor).await, ["Original Image"]);
    assert!(!editor.is_busy().await);
}

#[tokio::test]
async fn test_actions_without_an_image_are_rejected() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    let err = editor.apply_colorize().await.unwrap_err();
    assert!(matches!(err, lumen_core::LumenError::NoCurrentImage));
    assert!(gateway.calls().is_empty());
    assert!(editor.last_error().await.is_some());
}

#[tokio::test]
async fn test_generate_appends_and_activates_retouch() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    gateway.push_image(Ok(png(9)));
    editor.set_generate_prompt("a cat astronaut").await;
    editor.generate_from_prompt().await.unwrap();

    assert_eq!(labels(&editor).await, ["Generate Image"]);
    editor
        .with_state(|state| assert_eq!(state.active_tool(), Tool::Retouch))
        .await;
}

#[tokio::test]
async fn test_generate_failure_keeps_generate_tool_active() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    gateway.push_image(Err(GatewayError::NoImage(
        "The AI model did not return an image.".to_string(),
    )));
    editor.set_generate_prompt("a cat astronaut").await;

    editor.generate_from_prompt().await.unwrap_err();
    let notice = editor.last_error().await.unwrap();
    assert!(notice.message().starts_with("Failed to generate image."));
    editor
        .with_state(|state| {
            assert_eq!(state.active_tool(), Tool::Generate);
            assert!(state.history().is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_generate_requires_a_prompt() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    let err = editor.generate_from_prompt().await.unwrap_err();
    assert!(err.is_validation());
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_style_transfer_requires_reference_image() {
    let gateway = Arc::new(ScriptedGateway::new());
    let registry = Arc::new(InMemoryHandleRegistry::new());
    let editor = EditorUseCase::with_handle_registry(gateway.clone(), registry.clone());

    editor.upload_image(png(1)).await;
    let err = editor.apply_style().await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(
        editor.last_error().await.unwrap().message(),
        "Please provide a content image and a style image."
    );

    editor.set_style_image(Some(png(5))).await;
    gateway.push_image(Ok(png(6)));
    editor.apply_style().await.unwrap();

    assert_eq!(labels(&editor).await, ["Original Image", "Style Transfer"]);
    // Two history snapshots plus the style preview are live.
    assert_eq!(registry.live_count(), 3);
}

#[tokio::test]
async fn test_crop_is_local_and_appends_to_history() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    // A real 8x6 PNG; crop rasterization decodes it.
    let source = image::RgbaImage::from_pixel(8, 6, image::Rgba([7, 7, 7, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(source)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    editor.upload_image(ImageData::png(bytes)).await;

    editor
        .set_pending_crop(Some(CropRect::new(1, 1, 4, 3)))
        .await;
    editor.apply_crop().await.unwrap();

    assert_eq!(labels(&editor).await, ["Original Image", "Crop"]);
    assert!(gateway.calls().is_empty());

    editor
        .with_state(|state| {
            let cropped = state.current_image().unwrap();
            let decoded = image::load_from_memory(cropped.bytes()).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (4, 3));
            // The applied crop consumed the pending selection.
            assert!(state.pending_crop().is_none());
        })
        .await;
}

#[tokio::test]
async fn test_crop_requires_a_selection() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    editor.upload_image(png(1)).await;
    let err = editor.apply_crop().await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(
        editor.last_error().await.unwrap().message(),
        "Please select an area to crop."
    );
}

#[tokio::test]
async fn test_enhance_prompt_replaces_the_generate_prompt() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    editor.set_generate_prompt("a cat").await;
    gateway.push_text(Ok("a regal tabby cat lit by golden hour sun".to_string()));
    editor.enhance_prompt().await.unwrap();

    editor
        .with_state(|state| {
            assert_eq!(
                state.generate_prompt(),
                "a regal tabby cat lit by golden hour sun"
            );
            assert!(!state.is_enhancing_prompt());
            assert!(!state.is_busy());
            assert!(state.history().is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_enhance_prompt_failure_reports_without_touching_prompt() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    editor.set_generate_prompt("a cat").await;
    gateway.push_text(Err(GatewayError::NoImage(
        "The AI model did not return an enhanced prompt.".to_string(),
    )));

    editor.enhance_prompt().await.unwrap_err();
    editor
        .with_state(|state| {
            assert_eq!(state.generate_prompt(), "a cat");
            assert!(!state.is_enhancing_prompt());
        })
        .await;
    assert!(
        editor
            .last_error()
            .await
            .unwrap()
            .message()
            .starts_with("Failed to enhance prompt:")
    );
}

#[tokio::test]
async fn test_enhance_prompt_ignores_blank_prompt() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    editor.enhance_prompt().await.unwrap();
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_cursor_moves_clear_spatial_selections() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    editor.upload_image(png(1)).await;
    gateway.push_image(Ok(png(2)));
    editor.set_filter_prompt("Sepia").await;
    editor.apply_filter().await.unwrap();

    editor
        .set_hotspot(Some(Hotspot::new(
            PixelPoint::new(40, 20),
            PixelPoint::new(10, 5),
        )))
        .await;
    editor.move_cursor(0).await.unwrap();
    editor
        .with_state(|state| assert!(state.hotspot().is_none()))
        .await;

    let err = editor.move_cursor(5).await.unwrap_err();
    assert!(matches!(
        err,
        lumen_core::LumenError::IndexOutOfBounds { index: 5, len: 2 }
    ));
}

#[tokio::test]
async fn test_second_action_is_refused_while_busy() {
    let gateway = Arc::new(BlockingGateway::default());
    let editor = Arc::new(EditorUseCase::new(gateway.clone()));

    editor.upload_image(png(1)).await;
    let in_flight = tokio::spawn({
        let editor = editor.clone();
        async move { editor.apply_colorize().await }
    });

    gateway.started.notified().await;
    assert!(editor.is_busy().await);

    // Synchronous operations still take effect while the edit is in flight.
    editor.set_filter_prompt("Sepia").await;

    let err = editor.apply_filter().await.unwrap_err();
    assert!(err.is_busy());
    // The refusal leaves the in-flight edit's state untouched.
    assert!(editor.is_busy().await);
    assert!(editor.last_error().await.is_none());

    gateway.release.notify_one();
    in_flight.await.unwrap().unwrap();

    assert!(!editor.is_busy().await);
    assert_eq!(labels(&editor).await, ["Original Image", "Colorize"]);
}

#[tokio::test]
async fn test_reset_revokes_every_live_handle() {
    let gateway = Arc::new(ScriptedGateway::new());
    let registry = Arc::new(InMemoryHandleRegistry::new());
    let editor = EditorUseCase::with_handle_registry(gateway.clone(), registry.clone());

    editor.upload_image(png(1)).await;
    gateway.push_image(Ok(png(2)));
    editor.set_filter_prompt("Sepia").await;
    editor.apply_filter().await.unwrap();
    editor.set_style_image(Some(png(3))).await;
    assert_eq!(registry.live_count(), 3);

    editor.reset().await;

    assert_eq!(registry.live_count(), 0);
    editor
        .with_state(|state| {
            assert!(state.history().is_empty());
            assert_eq!(state.active_tool(), Tool::Generate);
            assert!(state.style_image().is_none());
        })
        .await;
}

#[tokio::test]
async fn test_rewind_preserves_redo_tail() {
    let gateway = Arc::new(ScriptedGateway::new());
    let editor = EditorUseCase::new(gateway.clone());

    editor.upload_image(png(1)).await;
    gateway.push_image(Ok(png(2)));
    editor.set_filter_prompt("Sepia").await;
    editor.apply_filter().await.unwrap();

    editor.rewind().await;
    editor
        .with_state(|state| {
            assert_eq!(state.history().cursor(), Some(0));
            assert_eq!(state.history().len(), 2);
            assert!(state.history().can_redo());
        })
        .await;

    assert!(editor.redo().await);
    editor
        .with_state(|state| assert_eq!(state.history().cursor(), Some(1)))
        .await;
}
