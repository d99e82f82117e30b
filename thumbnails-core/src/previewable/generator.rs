use camino::{Utf8Path, Utf8PathBuf};
use image::imageops::FilterType;
use log::{debug, warn};
use tokio::{fs, task};

use crate::{
    app_config::ThumbnailsConfig,
    main_queue::MainHandle,
    previewable::{
        has_audio_extension,
        os::{conforms_to_image, fallback_icon, Platform, RepresentationTypes, ThumbnailRequest},
        Preview, PreviewError, Size,
    },
};

/// Produces thumbnails and previews of files using the platform's preview services.
///
/// Every operation is stateless and one-shot. Blocking platform calls and file reads run on the
/// Tokio blocking pool, and completion callbacks are delivered on the controlling context behind
/// the [`MainHandle`] the generator was created with.
///
/// The callback based operations only call back on success; failures are logged at `debug` level
/// and otherwise dropped. Each has a future based counterpart returning the failure instead.
///
/// Spawning operations must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct ThumbnailsGenerator {
    platform: Platform,
    config: ThumbnailsConfig,
    main: MainHandle,
}

impl ThumbnailsGenerator {
    /// Creates a generator backed by the portable platform services.
    pub fn new(config: ThumbnailsConfig, main: MainHandle) -> Self {
        let platform = Platform::from_config(&config);
        ThumbnailsGenerator { platform, config, main }
    }

    /// Creates a generator backed by the given platform services.
    pub fn with_platform(platform: Platform, config: ThumbnailsConfig, main: MainHandle) -> Self {
        ThumbnailsGenerator { platform, config, main }
    }

    /// The request used for best representation thumbnails: a square of
    /// `best_representation_side` points at the display's backing scale factor (0 without a
    /// display), drawn as an icon.
    pub fn best_representation_request(&self, path: &Utf8Path) -> ThumbnailRequest {
        ThumbnailRequest {
            path: path.to_path_buf(),
            size: Size::square(self.config.best_representation_side),
            scale: self.platform.display.backing_scale_factor().unwrap_or(0.0),
            representation_types: RepresentationTypes::Icon,
        }
    }

    /// Asks the platform thumbnail generator, once, for the best representation of the file.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Preview))` - The platform rendered a thumbnail
    /// * `Ok(None)` - The platform had nothing for this file
    /// * `Err(PreviewError)` - The platform failed while rendering
    pub async fn best_representation(&self, path: &Utf8Path) -> Result<Option<Preview>, PreviewError> {
        let request = self.best_representation_request(path);
        let generator = self.platform.generator.clone();

        let image = task::spawn_blocking(move || generator.generate_best_representation(&request))
            .await
            .map_err(|source| PreviewError::Worker { source })?
            .map_err(|source| PreviewError::Generation { path: path.to_string(), source })?;

        Ok(image.map(Preview::thumbnail))
    }

    /// Generates the best representation thumbnail in the background and hands it to
    /// `completion` on the controlling context. `completion` is never called if generation fails
    /// or produces nothing.
    pub fn generate_thumbnail<F>(&self, path: impl Into<Utf8PathBuf>, completion: F)
    where
        F: FnOnce(Preview) + Send + 'static,
    {
        let this = self.clone();
        let path = path.into();
        tokio::spawn(async move {
            match this.best_representation(&path).await {
                Ok(Some(preview)) => {
                    this.main.dispatch(move || completion(preview));
                }
                Ok(None) => debug!("No thumbnail available for {}", path),
                Err(e) => debug!("Thumbnail generation failed for {}: {:#}", path, anyhow::Error::from(e)),
            }
        });
    }

    /// Returns a preview of the file at `size`, or its icon.
    ///
    /// Files with an extension from [`AUDIO_FILE_EXTENSIONS`](crate::AUDIO_FILE_EXTENSIONS) and
    /// files the platform cannot preview get the icon registered for their type, resized to
    /// exactly `size`. Other files get the platform's preview at its intrinsic size, which fits
    /// within `size`.
    ///
    /// Always returns an image. This blocks on platform calls; from async code prefer
    /// [`previews_for_files`](Self::previews_for_files).
    pub fn preview_for_file(&self, path: &Utf8Path, size: Size, as_icon: bool) -> Preview {
        if !has_audio_extension(path) {
            if let Some(image) = self.platform.quick_preview.thumbnail_image(path, size, as_icon) {
                return Preview::thumbnail(image);
            }
        }

        self.icon_preview(path, size)
    }

    /// Runs [`preview_for_file`](Self::preview_for_file) for each path, one after the other on a
    /// single background task. The result is in the same order as `paths`.
    pub async fn previews_for_files(&self, paths: Vec<Utf8PathBuf>, size: Size, as_icon: bool)
        -> Result<Vec<Preview>, PreviewError>
    {
        let this = self.clone();
        task::spawn_blocking(move || {
            paths.iter()
                .map(|path| this.preview_for_file(path, size, as_icon))
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|source| PreviewError::Worker { source })
    }

    /// Computes previews for every path in the background and hands all of them, in input
    /// order, to `completion` on the controlling context.
    pub fn preview_for_files<F>(&self, paths: Vec<Utf8PathBuf>, size: Size, as_icon: bool, completion: F)
    where
        F: FnOnce(Vec<Preview>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move {
            match this.previews_for_files(paths, size, as_icon).await {
                Ok(previews) => {
                    this.main.dispatch(move || completion(previews));
                }
                Err(e) => warn!("Batch preview task failed: {:#}", anyhow::Error::from(e)),
            }
        });
    }

    /// Decodes the file at full resolution if its declared type is an image.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Preview))` - The file is an image and was decoded
    /// * `Ok(None)` - The file's type is unknown or not an image
    /// * `Err(PreviewError)` - The file could not be read or decoded
    pub async fn preview_if_image(&self, path: &Utf8Path) -> Result<Option<Preview>, PreviewError> {
        let types = self.platform.types.clone();
        let lookup_path = path.to_path_buf();
        let type_identifier = task::spawn_blocking(move || types.type_identifier(&lookup_path))
            .await
            .map_err(|source| PreviewError::Worker { source })?;

        let Some(type_identifier) = type_identifier else {
            debug!("No type identifier for {}", path);
            return Ok(None);
        };
        if !conforms_to_image(&type_identifier) {
            return Ok(None);
        }

        let bytes = fs::read(path).await
            .map_err(|e| PreviewError::from_io(path, e))?;
        let image = task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|source| PreviewError::Worker { source })?
            .map_err(|source| PreviewError::Decode { path: path.to_string(), source })?;

        Ok(Some(Preview::thumbnail(image)))
    }

    /// Decodes the file in the background if it is an image and hands the result to
    /// `completion` on the controlling context. `completion` is never called for files that
    /// are not images or fail to decode.
    pub fn generate_preview<F>(&self, path: impl Into<Utf8PathBuf>, completion: F)
    where
        F: FnOnce(Preview) + Send + 'static,
    {
        let this = self.clone();
        let path = path.into();
        tokio::spawn(async move {
            match this.preview_if_image(&path).await {
                Ok(Some(preview)) => {
                    this.main.dispatch(move || completion(preview));
                }
                Ok(None) => {}
                Err(e) => debug!("Image preview failed for {}: {:#}", path, anyhow::Error::from(e)),
            }
        });
    }

    // The icon registered for the file, stretched to `size`. Falls back to the generic document
    // icon if the platform has none.
    fn icon_preview(&self, path: &Utf8Path, size: Size) -> Preview {
        let icon = match self.platform.icons.icon_for_file(path) {
            Ok(icon) if !size.is_empty() => {
                let filter: FilterType = self.config.resize_filter.into();
                icon.resize_exact(size.width, size.height, filter)
            }
            Ok(_) => fallback_icon(size),
            Err(e) => {
                debug!("Icon lookup failed for {}: {:#}", path, e);
                fallback_icon(size)
            }
        };

        Preview::icon(icon)
    }
}
