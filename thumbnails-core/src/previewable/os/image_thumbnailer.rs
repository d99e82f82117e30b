use camino::Utf8Path;
use image::{imageops::{self, FilterType}, DynamicImage, ImageError, ImageReader, RgbaImage};
use log::debug;

use super::{QuickPreview, RepresentationTypes, ThumbnailGenerator, ThumbnailRequest};
use crate::previewable::Size;

/// Renders previews of every format the `image` crate can decode.
///
/// Files in other formats have no preview, which lets the caller fall back to the file's icon.
#[derive(Debug, Clone, Copy)]
pub struct ImageThumbnailer {
    filter: FilterType,
}

impl ImageThumbnailer {
    pub fn new(filter: FilterType) -> Self {
        ImageThumbnailer { filter }
    }

    /// Decodes the file and renders it to fit within `size`. Icon style previews are centered on a
    /// transparent square canvas of the full requested size.
    fn render(&self, path: &Utf8Path, size: Size, as_icon: bool) -> Result<Option<DynamicImage>, anyhow::Error> {
        self.render_with(path, size, as_icon, self.filter)
    }

    fn render_with(
        &self,
        path: &Utf8Path,
        size: Size,
        as_icon: bool,
        filter: FilterType,
    ) -> Result<Option<DynamicImage>, anyhow::Error> {
        if size.is_empty() {
            return Ok(None);
        }

        let image = match ImageReader::open(path)?.with_guessed_format()?.decode() {
            Ok(image) => image,
            Err(ImageError::Unsupported(e)) => {
                debug!("No preview for {}: {}", path, e);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let fitted = image.resize(size.width, size.height, filter);
        if !as_icon {
            return Ok(Some(fitted));
        }

        let mut canvas = RgbaImage::new(size.width, size.height);
        let x = (size.width - fitted.width()) / 2;
        let y = (size.height - fitted.height()) / 2;
        imageops::overlay(&mut canvas, &fitted.to_rgba8(), x.into(), y.into());
        Ok(Some(DynamicImage::ImageRgba8(canvas)))
    }
}

impl ThumbnailGenerator for ImageThumbnailer {
    fn generate_best_representation(&self, request: &ThumbnailRequest) -> Result<Option<DynamicImage>, anyhow::Error> {
        let size = request.pixel_size();
        match request.representation_types {
            // Icon styled content is the richest representation this backend draws
            RepresentationTypes::Icon | RepresentationTypes::All => self.render(&request.path, size, true),
            RepresentationTypes::Thumbnail => self.render(&request.path, size, false),
            RepresentationTypes::LowQualityThumbnail => {
                self.render_with(&request.path, size, false, FilterType::Nearest)
            }
        }
    }
}

impl QuickPreview for ImageThumbnailer {
    fn thumbnail_image(&self, path: &Utf8Path, size: Size, as_icon: bool) -> Option<DynamicImage> {
        self.render(path, size, as_icon)
            .unwrap_or_else(|e| {
                debug!("Quick preview failed for {}: {:#}", path, e);
                None
            })
    }
}
