//! Viewer Configuration
//!
//! Every section defaults to the production constants, so a config file only
//! needs to name what it changes:
//!
//! ```json
//! {
//!   "records_path": "yard.json",
//!   "layout": { "max_tiers": 4 },
//!   "input": { "interact": "F" }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::build::BuildConfig;
use crate::camera::CameraConfig;
use crate::input::InputBindings;
use crate::render::GpuContextConfig;
use crate::scene::SceneConfig;
use crate::selection::SelectionConfig;
use crate::world::YardLayoutConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Yard Viewer".to_string(),
            width: 1600,
            height: 900,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub gpu: GpuContextConfig,
    pub layout: YardLayoutConfig,
    pub camera: CameraConfig,
    pub selection: SelectionConfig,
    pub build: BuildConfig,
    pub scene: SceneConfig,
    pub input: InputBindings,
    /// JSON array of container records; relative paths resolve against the
    /// config file's directory
    pub records_path: Option<PathBuf>,
}

impl ViewerConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&text)?;

        if let Some(records) = config.records_path.as_mut()
            && records.is_relative()
            && let Some(dir) = path.parent()
        {
            *records = dir.join(&*records);
        }
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate().map_err(ConfigError::Invalid)?;

        let camera = &self.camera;
        if !(1.0..179.0).contains(&camera.fov) {
            return Err(ConfigError::Invalid(format!("camera fov {} out of range", camera.fov)));
        }
        if camera.near <= 0.0 || camera.far <= camera.near {
            return Err(ConfigError::Invalid("camera clip planes must satisfy 0 < near < far".into()));
        }
        if self.selection.max_interact_distance <= 0.0 || self.selection.max_pick_distance <= 0.0 {
            return Err(ConfigError::Invalid("selection distances must be positive".into()));
        }
        if self.build.grid_size <= 0.0 || self.build.max_reach <= 0.0 {
            return Err(ConfigError::Invalid("build grid size and reach must be positive".into()));
        }
        if self.scene.index_cell_size <= 0.0 || self.scene.index_poll_limit == 0 {
            return Err(ConfigError::Invalid(
                "index cell size and poll limit must be positive".into(),
            ));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".into()));
        }
        Ok(())
    }
}
