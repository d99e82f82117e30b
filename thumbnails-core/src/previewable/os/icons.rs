use anyhow::anyhow;
use camino::Utf8Path;
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};
use log::{debug, warn};
use mime::Mime;
use resvg::{tiny_skia, usvg};

use super::{FileIconProvider, MimeTypeResolver, TypeIdentifierProvider};
use crate::previewable::Size;

/// Generic file icons, one per broad family of file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Document,
    Audio,
    Image,
    Video,
    Text,
    Archive,
    Folder,
}

impl IconKind {
    /// Picks the icon for a file of the given type. Unknown types get the generic document.
    pub fn for_type(type_identifier: Option<&Mime>) -> Self {
        let Some(type_identifier) = type_identifier else {
            return IconKind::Document;
        };

        if type_identifier.essence_str() == "inode/directory" {
            return IconKind::Folder;
        }

        match type_identifier.type_().as_str() {
            "audio" => IconKind::Audio,
            "image" => IconKind::Image,
            "video" => IconKind::Video,
            "text" => IconKind::Text,
            "application" if ARCHIVE_SUBTYPES.contains(&type_identifier.subtype().as_str()) => IconKind::Archive,
            _ => IconKind::Document,
        }
    }

    fn svg(self) -> &'static str {
        match self {
            IconKind::Document => include_str!("../../../assets/icons/document.svg"),
            IconKind::Audio => include_str!("../../../assets/icons/audio.svg"),
            IconKind::Image => include_str!("../../../assets/icons/image.svg"),
            IconKind::Video => include_str!("../../../assets/icons/video.svg"),
            IconKind::Text => include_str!("../../../assets/icons/text.svg"),
            IconKind::Archive => include_str!("../../../assets/icons/archive.svg"),
            IconKind::Folder => include_str!("../../../assets/icons/folder.svg"),
        }
    }

    /// Rasterizes the icon onto a transparent `side`×`side` canvas.
    pub fn render(self, side: u32) -> Result<DynamicImage, anyhow::Error> {
        let tree = usvg::Tree::from_str(self.svg(), &usvg::Options::default())?;
        let mut pixmap = tiny_skia::Pixmap::new(side, side)
            .ok_or_else(|| anyhow!("Could not allocate a {side}x{side} pixmap for icon {:?}", self))?;

        let svg_size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            side as f32 / svg_size.width(),
            side as f32 / svg_size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        // tiny-skia stores premultiplied alpha, image expects straight alpha
        let pixels: Vec<u8> = pixmap.pixels()
            .iter()
            .flat_map(|pixel| {
                let color = pixel.demultiply();
                [color.red(), color.green(), color.blue(), color.alpha()]
            })
            .collect();

        RgbaImage::from_raw(side, side, pixels)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| anyhow!("Rendered icon {:?} had an unexpected buffer length", self))
    }
}

/// Draws the built-in icon matching each file's type.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedIconProvider {
    types: MimeTypeResolver,
    side: u32,
}

impl Default for EmbeddedIconProvider {
    fn default() -> Self {
        EmbeddedIconProvider { types: MimeTypeResolver, side: ICON_RENDER_SIDE }
    }
}

impl FileIconProvider for EmbeddedIconProvider {
    fn icon_for_file(&self, path: &Utf8Path) -> Result<DynamicImage, anyhow::Error> {
        let type_identifier = self.types.type_identifier(path)
            .or_else(|| mime_guess::from_path(path).first());
        IconKind::for_type(type_identifier.as_ref()).render(self.side)
    }
}

/// Asks the operating system for the icon it shows for each file, using the built-in icons when
/// the system has none to offer.
///
/// The lookup goes through `file_icon_provider` when the `system-icons` feature is enabled. On
/// Linux that needs the GTK 3 development libraries, so the feature is off by default and
/// without it every lookup falls through to [`EmbeddedIconProvider`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIconProvider {
    embedded: EmbeddedIconProvider,
}

impl SystemIconProvider {
    #[cfg(feature = "system-icons")]
    fn system_icon(&self, path: &Utf8Path) -> Result<DynamicImage, anyhow::Error> {
        let icon = file_icon_provider::get_file_icon(path, SYSTEM_ICON_SIDE)?;
        RgbaImage::from_raw(icon.width, icon.height, icon.pixels)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| anyhow!("System icon for {} had an unexpected buffer length", path))
    }

    #[cfg(not(feature = "system-icons"))]
    fn system_icon(&self, _path: &Utf8Path) -> Result<DynamicImage, anyhow::Error> {
        Err(anyhow!("Built without the system-icons feature"))
    }
}

impl FileIconProvider for SystemIconProvider {
    fn icon_for_file(&self, path: &Utf8Path) -> Result<DynamicImage, anyhow::Error> {
        match self.system_icon(path) {
            Ok(icon) if icon.width() > 0 && icon.height() > 0 => Ok(icon),
            Ok(_) => {
                debug!("System icon for {} was empty", path);
                self.embedded.icon_for_file(path)
            }
            Err(e) => {
                debug!("No system icon for {}: {:#}", path, e);
                self.embedded.icon_for_file(path)
            }
        }
    }
}

/// The generic document icon at exactly `size`, for when every other icon source has failed.
///
/// Never fails. Empty sizes are widened to one pixel.
pub fn fallback_icon(size: Size) -> DynamicImage {
    let width = size.width.max(1);
    let height = size.height.max(1);

    match IconKind::Document.render(width.max(height)) {
        Ok(icon) => icon.resize_exact(width, height, image::imageops::FilterType::Triangle),
        Err(e) => {
            warn!("Could not render the generic document icon: {:#}", e);
            DynamicImage::ImageRgba8(ImageBuffer::from_pixel(width, height, Rgba(FALLBACK_COLOR)))
        }
    }
}

// Private constants
const ICON_RENDER_SIDE: u32 = 512;
#[cfg(feature = "system-icons")]
const SYSTEM_ICON_SIDE: u16 = 256;
const FALLBACK_COLOR: [u8; 4] = [0xf4, 0xf5, 0xf7, 0xff];
const ARCHIVE_SUBTYPES: &[&str] = &[
    "zip", "gzip", "x-gzip", "x-tar", "x-bzip2", "x-xz", "x-7z-compressed", "vnd.rar", "x-rar-compressed",
];

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use image::GenericImageView;

    use super::*;

    const ALL_KINDS: [IconKind; 7] = [
        IconKind::Document, IconKind::Audio, IconKind::Image, IconKind::Video,
        IconKind::Text, IconKind::Archive, IconKind::Folder,
    ];

    #[test]
    fn every_embedded_icon_renders() {
        for kind in ALL_KINDS {
            let icon = kind.render(64).unwrap_or_else(|e| panic!("{kind:?} failed to render: {e}"));
            assert_eq!(icon.dimensions(), (64, 64));
            // Something was drawn
            assert!(icon.to_rgba8().pixels().any(|p| p[3] > 0), "{kind:?} rendered fully transparent");
        }
    }

    #[test]
    fn kinds_follow_type_families() {
        assert_eq!(IconKind::for_type(None), IconKind::Document);
        assert_eq!(IconKind::for_type(Some(&"audio/mpeg".parse().unwrap())), IconKind::Audio);
        assert_eq!(IconKind::for_type(Some(&mime::IMAGE_JPEG)), IconKind::Image);
        assert_eq!(IconKind::for_type(Some(&"video/mp4".parse().unwrap())), IconKind::Video);
        assert_eq!(IconKind::for_type(Some(&mime::TEXT_PLAIN)), IconKind::Text);
        assert_eq!(IconKind::for_type(Some(&"application/zip".parse().unwrap())), IconKind::Archive);
        assert_eq!(IconKind::for_type(Some(&"inode/directory".parse().unwrap())), IconKind::Folder);
        assert_eq!(IconKind::for_type(Some(&mime::APPLICATION_PDF)), IconKind::Document);
    }

    #[test]
    fn icon_lookup_works_for_missing_files() {
        let provider = EmbeddedIconProvider::default();
        let icon = provider.icon_for_file(&Utf8PathBuf::from("/definitely/not/here.mp3")).unwrap();
        assert_eq!(icon.dimensions(), (ICON_RENDER_SIDE, ICON_RENDER_SIDE));
    }

    #[test]
    fn system_icons_cover_real_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("notes.txt")).unwrap();
        std::fs::write(&path, "hello").unwrap();

        let icon = SystemIconProvider::default().icon_for_file(&path).unwrap();
        assert!(icon.width() > 0 && icon.height() > 0);
        assert!(icon.to_rgba8().pixels().any(|p| p[3] > 0), "system icon is fully transparent");
    }

    #[test]
    fn system_icons_fall_back_for_missing_files() {
        // The system lookup refuses paths that do not exist
        let icon = SystemIconProvider::default()
            .icon_for_file(&Utf8PathBuf::from("/definitely/not/here.mp3"))
            .unwrap();
        let expected = IconKind::Audio.render(ICON_RENDER_SIDE).unwrap();
        assert_eq!(icon.to_rgba8(), expected.to_rgba8());
    }

    #[test]
    fn fallback_icon_has_exact_size() {
        assert_eq!(fallback_icon(Size::new(40, 20)).dimensions(), (40, 20));
        assert_eq!(fallback_icon(Size::new(0, 0)).dimensions(), (1, 1));
    }
}
