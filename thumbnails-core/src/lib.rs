pub mod app_config;
pub mod main_queue;
pub mod previewable;

// Re-export the types most callers need
pub use app_config::{ResizeFilter, ThumbnailsConfig};
pub use main_queue::{MainHandle, MainQueue};
pub use previewable::{
    generator::ThumbnailsGenerator, Preview, PreviewError, PreviewSource, Size, AUDIO_FILE_EXTENSIONS,
};
