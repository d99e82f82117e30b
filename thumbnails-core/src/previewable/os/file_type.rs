use camino::Utf8Path;
use mime::Mime;

use super::TypeIdentifierProvider;

/// Resolves file types from their extension, the way desktop file managers declare them.
///
/// Only files that exist have a type. Directories resolve to `inode/directory`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeTypeResolver;

impl TypeIdentifierProvider for MimeTypeResolver {
    fn type_identifier(&self, path: &Utf8Path) -> Option<Mime> {
        let metadata = path.metadata().ok()?;
        if metadata.is_dir() {
            return DIRECTORY_TYPE.parse().ok();
        }

        mime_guess::from_path(path).first()
    }
}

const DIRECTORY_TYPE: &str = "inode/directory";

#[cfg(test)]
mod tests {
    use std::fs;

    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn resolves_existing_files_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(root.join("photo.png"), b"not really a png").unwrap();
        fs::write(root.join("notes.txt"), b"hello").unwrap();

        assert_eq!(MimeTypeResolver.type_identifier(&root.join("photo.png")), Some(mime::IMAGE_PNG));
        assert_eq!(MimeTypeResolver.type_identifier(&root.join("notes.txt")), Some(mime::TEXT_PLAIN));
    }

    #[test]
    fn missing_files_have_no_type() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        assert_eq!(MimeTypeResolver.type_identifier(&root.join("gone.png")), None);
    }

    #[test]
    fn directories_are_not_images() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let type_identifier = MimeTypeResolver.type_identifier(&root).unwrap();
        assert_eq!(type_identifier.essence_str(), "inode/directory");
    }
}
