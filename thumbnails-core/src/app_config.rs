use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigError, Environment, File, FileFormat};
use image::imageops::FilterType;
use serde::Deserialize;

/// Settings shared by every operation of the [`ThumbnailsGenerator`](crate::ThumbnailsGenerator).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThumbnailsConfig {
    /// Ratio of physical to logical pixels of the active display. `None` when there is no display,
    /// in which case best representation requests use a scale of 0.
    #[serde(default)]
    pub backing_scale_factor: Option<f64>,
    /// Logical side length of the square best representation request.
    pub best_representation_side: u32,
    /// Filter used when resizing icons and thumbnails.
    pub resize_filter: ResizeFilter,
}

/// Serializable mirror of [`image::imageops::FilterType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        ThumbnailsConfig {
            backing_scale_factor: None,
            best_representation_side: DEFAULT_BEST_REPRESENTATION_SIDE,
            resize_filter: ResizeFilter::Triangle,
        }
    }
}

impl ThumbnailsConfig {
    /// Loads the configuration from the built-in defaults, the user configuration file (if one
    /// exists at [`user_config_file_path`]) and `THUMBNAILS_*` environment variables, in that
    /// order of priority.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(user_config_file_path().as_deref())
    }

    /// Loads the configuration layering the optional file at `path` over the built-in defaults,
    /// with `THUMBNAILS_*` environment variables taking precedence over both. A missing file is
    /// not an error.
    pub fn from_sources(path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path.as_str()).required(false));
        }

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }
}

/// Gets the path of the optional user configuration file, `thumbnails/thumbnails.toml` inside the
/// platform configuration directory.
///
/// Returns `None` if the platform has no configuration directory or it is not valid UTF-8.
pub fn user_config_file_path() -> Option<Utf8PathBuf> {
    let config_dir = Utf8PathBuf::from_path_buf(dirs::config_dir()?).ok()?;
    Some(config_dir.join(APP_FOLDER_NAME).join(CONFIG_FILE_NAME))
}

// Private constants
const DEFAULT_CONFIG: &str = include_str!("../artifacts/defaults/thumbnails.toml");
const DEFAULT_BEST_REPRESENTATION_SIDE: u32 = 256;
const ENV_PREFIX: &str = "THUMBNAILS";
const APP_FOLDER_NAME: &str = "thumbnails";
const CONFIG_FILE_NAME: &str = "thumbnails.toml";

#[cfg(test)]
mod tests {
    use std::{env, fs, sync::{Mutex, MutexGuard}};

    use super::*;

    // Tests that read configuration share the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn builtin_defaults_match_default_impl() {
        let _env = lock_env();
        let config = ThumbnailsConfig::from_sources(None).unwrap();
        assert_eq!(config, ThumbnailsConfig::default());
    }

    #[test]
    fn missing_user_file_is_ignored() {
        let _env = lock_env();
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("absent.toml")).unwrap();

        let config = ThumbnailsConfig::from_sources(Some(&path)).unwrap();
        assert_eq!(config.best_representation_side, 256);
    }

    #[test]
    fn user_file_overrides_defaults() {
        let _env = lock_env();
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("thumbnails.toml")).unwrap();
        fs::write(&path, "backing_scale_factor = 2.0\nresize_filter = \"lanczos3\"\n").unwrap();

        let config = ThumbnailsConfig::from_sources(Some(&path)).unwrap();
        assert_eq!(config.backing_scale_factor, Some(2.0));
        assert_eq!(config.resize_filter, ResizeFilter::Lanczos3);
        assert_eq!(config.best_representation_side, 256);
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let _env = lock_env();
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("thumbnails.toml")).unwrap();
        fs::write(&path, "resize_filter = \"bicubic\"\n").unwrap();

        assert!(ThumbnailsConfig::from_sources(Some(&path)).is_err());
    }

    #[test]
    fn environment_overrides_user_file() {
        let _env = lock_env();
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("thumbnails.toml")).unwrap();
        fs::write(&path, "backing_scale_factor = 1.0\nbest_representation_side = 128\n").unwrap();

        env::set_var("THUMBNAILS_BEST_REPRESENTATION_SIDE", "300");
        env::set_var("THUMBNAILS_BACKING_SCALE_FACTOR", "2.5");
        let config = ThumbnailsConfig::from_sources(Some(&path));
        env::remove_var("THUMBNAILS_BEST_REPRESENTATION_SIDE");
        env::remove_var("THUMBNAILS_BACKING_SCALE_FACTOR");

        let config = config.unwrap();
        assert_eq!(config.best_representation_side, 300);
        assert_eq!(config.backing_scale_factor, Some(2.5));
        assert_eq!(config.resize_filter, ResizeFilter::Triangle);

        // Without the variables the user file applies again
        let config = ThumbnailsConfig::from_sources(Some(&path)).unwrap();
        assert_eq!(config.best_representation_side, 128);
        assert_eq!(config.backing_scale_factor, Some(1.0));
    }

    #[test]
    fn user_config_file_lives_in_app_folder() {
        if let Some(path) = user_config_file_path() {
            assert!(path.ends_with("thumbnails/thumbnails.toml"));
        }
    }
}
