use camino::Utf8Path;
use image::{DynamicImage, GenericImageView};

/// Extensions of audio files. The synchronous preview path never asks the preview backend to
/// render these and goes straight to the file icon. Matching is case-sensitive.
pub static AUDIO_FILE_EXTENSIONS: &[&str] = &[
    "caf", "wav", "wave", "bwf", "aif", "aiff", "aifc", "cdda", "amr", "mp3", "au", "snd", "ac3", "eac3",
];

/// Returns true if the path has an extension listed in [`AUDIO_FILE_EXTENSIONS`].
pub fn has_audio_extension(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|ext| AUDIO_FILE_EXTENSIONS.contains(&ext))
}

/// Pixel dimensions of a requested or produced image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Size { width, height }
    }

    pub const fn square(side: u32) -> Self {
        Size { width: side, height: side }
    }

    /// Multiplies both sides by `scale`, rounding to the nearest pixel. Non-positive scales yield
    /// an empty size.
    pub fn scaled(self, scale: f64) -> Self {
        let scale_side = |side: u32| (side as f64 * scale).round().clamp(0.0, u32::MAX as f64) as u32;
        Size { width: scale_side(self.width), height: scale_side(self.height) }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Where the pixels of a [`Preview`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSource {
    /// Rendered from the file's content, by the preview backend or by decoding the file directly
    Thumbnail,
    /// The icon registered for the file's type
    Icon,
}

/// An image produced for a file. Ownership passes to the caller on delivery.
#[derive(Debug, Clone)]
pub struct Preview {
    pub image: DynamicImage,
    pub source: PreviewSource,
}

impl Preview {
    pub fn thumbnail(image: DynamicImage) -> Self {
        Preview { image, source: PreviewSource::Thumbnail }
    }

    pub fn icon(image: DynamicImage) -> Self {
        Preview { image, source: PreviewSource::Icon }
    }

    /// The intrinsic pixel size of the image.
    pub fn size(&self) -> Size {
        let (width, height) = self.image.dimensions();
        Size { width, height }
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// Errors that can occur while producing a preview.
///
/// The callback based operations of [`ThumbnailsGenerator`](generator::ThumbnailsGenerator) never
/// surface these; they are returned by the future based counterparts so callers can decide
/// whether a failure is worth logging.
#[derive(thiserror::Error, Debug)]
pub enum PreviewError {
    /// The file could not be found at the specified path.
    #[error("File was not found: {path}")]
    NotFound { path: String },

    /// An I/O error occurred while reading the file.
    #[error("Error interacting with file: {path}")]
    IO { path: String, #[source] source: std::io::Error },

    /// The preview backend failed to render the file.
    #[error("Error while generating preview for file: {path}")]
    Generation { path: String, #[source] source: anyhow::Error },

    /// The file's bytes could not be decoded as an image.
    #[error("Error while decoding image: {path}")]
    Decode { path: String, #[source] source: image::ImageError },

    /// The background task doing the work panicked or was cancelled.
    #[error("Background preview task did not complete")]
    Worker { #[source] source: tokio::task::JoinError },
}

impl PreviewError {
    pub(crate) fn from_io(path: &Utf8Path, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => PreviewError::NotFound { path: path.to_string() },
            _ => PreviewError::IO { path: path.to_string(), source: e },
        }
    }
}

pub mod generator;
pub mod os;
