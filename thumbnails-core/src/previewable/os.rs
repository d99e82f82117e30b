use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use image::DynamicImage;
use mime::Mime;

use crate::{app_config::ThumbnailsConfig, previewable::Size};

/// Services the host platform provides for previewing files.
///
/// Which previews can be produced depends on what the platform understands how to render, by
/// default or through an installed plugin for its preview system (QuickLook on OS X, Preview
/// Handler on Windows, etc). The portable implementations in this module cover the formats the
/// `image` crate decodes and fall back to built-in icons for everything else.
///
/// All methods may block and are only ever called from a background worker.
pub trait ThumbnailGenerator: Send + Sync {
    /// Renders the best representation the platform can produce within the request's
    /// constraints. `Ok(None)` means the platform has nothing to offer for this file.
    fn generate_best_representation(&self, request: &ThumbnailRequest) -> Result<Option<DynamicImage>, anyhow::Error>;
}

/// Quick preview image service, the synchronous sibling of [`ThumbnailGenerator`].
pub trait QuickPreview: Send + Sync {
    /// Renders a preview of the file fitting within `size`. With `as_icon` set, the preview is
    /// drawn in the style of a file icon rather than as bare content.
    fn thumbnail_image(&self, path: &Utf8Path, size: Size, as_icon: bool) -> Option<DynamicImage>;
}

/// Looks up the icon registered for a file's type.
pub trait FileIconProvider: Send + Sync {
    fn icon_for_file(&self, path: &Utf8Path) -> Result<DynamicImage, anyhow::Error>;
}

/// The active display.
pub trait Display: Send + Sync {
    /// Ratio of physical to logical pixels, `None` if there is no display.
    fn backing_scale_factor(&self) -> Option<f64>;
}

/// Resolves the declared type of a file.
pub trait TypeIdentifierProvider: Send + Sync {
    /// Returns `None` if the type of the file cannot be determined.
    fn type_identifier(&self, path: &Utf8Path) -> Option<Mime>;
}

/// True if the type identifier describes an image.
pub fn conforms_to_image(type_identifier: &Mime) -> bool {
    type_identifier.type_() == mime::IMAGE
}

/// Kinds of representation a [`ThumbnailRequest`] may be satisfied with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepresentationTypes {
    /// The file's content drawn in the style of a file icon
    Icon,
    /// The file's content
    Thumbnail,
    /// A fast, possibly blurry rendering of the file's content
    LowQualityThumbnail,
    /// Whichever of the above is best
    All,
}

/// A request for the best representation of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailRequest {
    pub path: Utf8PathBuf,
    /// Logical size of the representation
    pub size: Size,
    /// Backing scale factor, 0 when no display is available
    pub scale: f64,
    pub representation_types: RepresentationTypes,
}

impl ThumbnailRequest {
    /// The size in physical pixels. A scale of 0 or below is treated as 1.
    pub fn pixel_size(&self) -> Size {
        if self.scale > 0.0 {
            self.size.scaled(self.scale)
        } else {
            self.size
        }
    }
}

/// The set of platform services a [`ThumbnailsGenerator`](super::generator::ThumbnailsGenerator)
/// works with.
#[derive(Clone)]
pub struct Platform {
    pub generator: Arc<dyn ThumbnailGenerator>,
    pub quick_preview: Arc<dyn QuickPreview>,
    pub icons: Arc<dyn FileIconProvider>,
    pub display: Arc<dyn Display>,
    pub types: Arc<dyn TypeIdentifierProvider>,
}

impl Platform {
    /// Builds the default platform services: the `image` based thumbnailer and the system's file
    /// icons, with the built-in icons standing in where the system has none.
    pub fn from_config(config: &ThumbnailsConfig) -> Self {
        let thumbnailer = Arc::new(ImageThumbnailer::new(config.resize_filter.into()));

        Platform {
            generator: thumbnailer.clone(),
            quick_preview: thumbnailer,
            icons: Arc::new(SystemIconProvider::default()),
            display: Arc::new(ConfiguredDisplay { scale: config.backing_scale_factor }),
            types: Arc::new(MimeTypeResolver),
        }
    }
}

/// A display whose scale factor comes from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredDisplay {
    pub scale: Option<f64>,
}

impl Display for ConfiguredDisplay {
    fn backing_scale_factor(&self) -> Option<f64> {
        self.scale
    }
}

pub use file_type::MimeTypeResolver;
pub use icons::{fallback_icon, EmbeddedIconProvider, IconKind, SystemIconProvider};
pub use image_thumbnailer::ImageThumbnailer;

mod file_type;
mod icons;
mod image_thumbnailer;
