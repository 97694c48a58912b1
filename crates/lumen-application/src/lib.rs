pub mod editor_usecase;
pub mod imaging;

pub use editor_usecase::EditorUseCase;
