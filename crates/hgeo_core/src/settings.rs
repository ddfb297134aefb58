//! Path and export preferences.
//!
//! Settings are stored as JSON. Missing keys fall back to their defaults, so
//! a settings file only needs the values that differ.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{EncodeOptions, DEFAULT_FILE_VERSION, GEO_EXTENSION};
use crate::populate::{ScenePopulator, DEFAULT_REUSE_TOLERANCE};

/// Errors that can occur while loading or saving settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Geometry import/export preferences.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoSettings {
    /// Project root. Empty means the working directory.
    pub root_path: PathBuf,

    /// Geometry directory, relative to the root
    pub geometry_path: PathBuf,

    /// Spline geometry directory, relative to the geometry directory
    pub splines_path: PathBuf,

    /// Version written to the `fileversion` key of exported files
    pub file_version: String,

    /// Mirror vectors between engine and file space on import and export
    pub translate_coordinate_systems: bool,

    /// Distance within which existing instances are reused
    pub instance_reuse_tolerance: f32,
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            root_path: PathBuf::new(),
            geometry_path: PathBuf::from("geo/"),
            splines_path: PathBuf::from("Splines/"),
            file_version: DEFAULT_FILE_VERSION.to_string(),
            translate_coordinate_systems: true,
            instance_reuse_tolerance: DEFAULT_REUSE_TOLERANCE,
        }
    }
}

impl GeoSettings {
    /// Load settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save settings as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SettingsResult<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Directory geometry files are exported to.
    pub fn geometry_dir(&self) -> PathBuf {
        self.root_path.join(&self.geometry_path)
    }

    /// Directory spline geometry is exported to.
    pub fn splines_dir(&self) -> PathBuf {
        self.geometry_dir().join(&self.splines_path)
    }

    /// Path of a geometry file named `name` in the geometry directory.
    ///
    /// The `.geo` extension is appended unless already present.
    pub fn export_path(&self, name: &str) -> PathBuf {
        let mut path = self.geometry_dir().join(name);
        if path.extension().and_then(|e| e.to_str()) != Some(GEO_EXTENSION) {
            let mut file = path.into_os_string();
            file.push(".");
            file.push(GEO_EXTENSION);
            path = PathBuf::from(file);
        }
        path
    }

    /// Encoder options matching these settings.
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions::default().with_file_version(self.file_version.clone())
    }

    /// A population driver using the configured reuse tolerance.
    pub fn populator(&self) -> ScenePopulator {
        ScenePopulator::new(self.instance_reuse_tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let settings = GeoSettings::default();
        assert_eq!(settings.geometry_dir(), PathBuf::from("geo/"));
        assert_eq!(settings.splines_dir(), PathBuf::from("geo/Splines/"));
        assert_eq!(settings.export_path("roads"), PathBuf::from("geo/roads.geo"));
        assert_eq!(settings.export_path("roads.geo"), PathBuf::from("geo/roads.geo"));
        assert_eq!(
            settings.export_path("World-Level.v2/MetaData"),
            PathBuf::from("geo/World-Level.v2/MetaData.geo")
        );
    }

    #[test]
    fn test_root_path_prefix() {
        let settings = GeoSettings {
            root_path: PathBuf::from("/projects/houdini"),
            ..Default::default()
        };
        assert_eq!(settings.splines_dir(), PathBuf::from("/projects/houdini/geo/Splines/"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: GeoSettings =
            serde_json::from_str(r#"{ "file_version": "19.5.303" }"#).unwrap();
        assert_eq!(settings.file_version, "19.5.303");
        assert!(settings.translate_coordinate_systems);
        assert_eq!(settings.instance_reuse_tolerance, 0.01);
        assert_eq!(settings.encode_options().file_version, "19.5.303");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = GeoSettings {
            translate_coordinate_systems: false,
            instance_reuse_tolerance: 0.5,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(GeoSettings::load(&path).unwrap(), settings);
        assert_eq!(settings.populator().tolerance(), 0.5);
    }

    #[test]
    fn test_load_missing_file() {
        let err = GeoSettings::load("does/not/exist.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
