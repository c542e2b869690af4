//! Underwater effect settings. Loaded from `underwater.ron` at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::post_process::{OceanState, PostProcessOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Persistent underwater effect settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwaterConfig {
    /// Copy shared shading parameters from the ocean material every frame.
    #[serde(default = "default_true")]
    pub copy_params_from_ocean_material: bool,
    /// Render the mask instead of the effect.
    #[serde(default)]
    pub debug_view_ocean_mask: bool,
    /// World height of the undisturbed sea plane.
    #[serde(default)]
    pub sea_level: f32,
    /// Peak-to-peak vertical wave displacement.
    #[serde(default = "default_max_vertical_displacement")]
    pub max_vertical_displacement: f32,
    /// Number of LOD levels in the simulation stack.
    #[serde(default = "default_lod_count")]
    pub lod_count: u32,
}

fn default_true() -> bool {
    true
}
fn default_max_vertical_displacement() -> f32 {
    2.0
}
fn default_lod_count() -> u32 {
    7
}

impl Default for UnderwaterConfig {
    fn default() -> Self {
        Self {
            copy_params_from_ocean_material: default_true(),
            debug_view_ocean_mask: false,
            sea_level: 0.0,
            max_vertical_displacement: default_max_vertical_displacement(),
            lod_count: default_lod_count(),
        }
    }
}

impl UnderwaterConfig {
    /// Load config from `underwater.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_ron(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    /// Save current config to `underwater.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(&path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }

    pub fn post_process_options(&self) -> PostProcessOptions {
        PostProcessOptions {
            copy_params_from_ocean_material: self.copy_params_from_ocean_material,
            debug_view_ocean_mask: self.debug_view_ocean_mask,
        }
    }

    /// Ocean state seeded from the config; per-frame fields start at defaults.
    pub fn ocean_state(&self) -> OceanState {
        OceanState {
            sea_level: self.sea_level,
            max_vertical_displacement: self.max_vertical_displacement,
            lod_count: self.lod_count,
            ..Default::default()
        }
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("underwater.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let c = UnderwaterConfig::from_ron("(sea_level: 4.5)").unwrap();
        assert_eq!(c.sea_level, 4.5);
        assert!(c.copy_params_from_ocean_material);
        assert!(!c.debug_view_ocean_mask);
        assert_eq!(c.max_vertical_displacement, 2.0);
        assert_eq!(c.lod_count, 7);
    }

    #[test]
    fn pretty_output_parses_back() {
        let c = UnderwaterConfig {
            debug_view_ocean_mask: true,
            lod_count: 5,
            ..Default::default()
        };
        let s = ron::ser::to_string_pretty(&c, ron::ser::PrettyConfig::default()).unwrap();
        assert_eq!(UnderwaterConfig::from_ron(&s).unwrap(), c);
    }

    #[test]
    fn invalid_file_reports_path() {
        let path = std::env::temp_dir().join("underwater_invalid_config_test.ron");
        std::fs::write(&path, "(sea_level: \"deep\")").unwrap();
        let err = UnderwaterConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn options_and_state_follow_config() {
        let c = UnderwaterConfig {
            copy_params_from_ocean_material: false,
            sea_level: -2.0,
            max_vertical_displacement: 6.0,
            ..Default::default()
        };
        assert!(!c.post_process_options().copy_params_from_ocean_material);
        let state = c.ocean_state();
        assert_eq!(state.sea_level, -2.0);
        assert_eq!(state.max_vertical_displacement, 6.0);
    }
}
