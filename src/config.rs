//! Tunables for zoom, resizing, hit testing and history.
//!
//! Loaded from TOML or JSON. The extension picks the first format tried and
//! the other one is used as a fallback, so a misnamed file still loads.

use std::{fs, path::Path};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    pub scale_step: f32,
    pub initial_scale: f32,
    /// Floor for element width and height while resizing, in diagram units.
    pub min_element_size: f32,
    /// Box selections smaller than this (screen px, both dimensions) count as clicks.
    pub click_threshold: f32,
    /// Side of a resize handle square, screen px.
    pub handle_size: f32,
    /// Pick distance for relationship lines, screen px.
    pub hit_tolerance: f32,
    /// Maximum number of undo steps; `None` keeps everything.
    pub history_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 2.0,
            scale_step: 0.1,
            initial_scale: 1.0,
            min_element_size: 50.0,
            click_threshold: 2.0,
            handle_size: 10.0,
            hit_tolerance: 6.0,
            history_limit: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let parsed = if is_json {
            serde_json::from_str::<EngineConfig>(&text)
                .map_err(ConfigError::from)
                .or_else(|err| toml::from_str::<EngineConfig>(&text).map_err(|_| err))
        } else {
            toml::from_str::<EngineConfig>(&text)
                .map_err(ConfigError::from)
                .or_else(|err| serde_json::from_str::<EngineConfig>(&text).map_err(|_| err))
        }?;
        debug!(path:? = path; "Loaded engine configuration");
        Ok(parsed.normalized())
    }

    /// Repairs values that would break zooming or resizing.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            warn!(min_scale = self.min_scale; "Invalid minimum scale, using default");
            self.min_scale = defaults.min_scale;
        }
        if !(self.max_scale.is_finite() && self.max_scale >= self.min_scale) {
            warn!(max_scale = self.max_scale; "Invalid maximum scale, using minimum");
            self.max_scale = self.min_scale.max(defaults.max_scale);
        }
        if !(self.scale_step.is_finite() && self.scale_step > 0.0) {
            self.scale_step = defaults.scale_step;
        }
        if !self.initial_scale.is_finite() {
            self.initial_scale = defaults.initial_scale;
        }
        self.initial_scale = self.initial_scale.clamp(self.min_scale, self.max_scale);
        if !(self.min_element_size.is_finite() && self.min_element_size > 0.0) {
            self.min_element_size = defaults.min_element_size;
        }
        for value in [
            &mut self.click_threshold,
            &mut self.handle_size,
            &mut self.hit_tolerance,
        ] {
            if !value.is_finite() || *value < 0.0 {
                *value = 0.0;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("sysml-canvas-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_match_zoom_limits() {
        let config = EngineConfig::default();
        assert_eq!(config.min_scale, 0.5);
        assert_eq!(config.max_scale, 2.0);
        assert_eq!(config.min_element_size, 50.0);
        assert_eq!(config.history_limit, None);
    }

    #[test]
    fn loads_partial_toml() {
        let path = temp_file("partial.toml", "maxScale = 4.0\nhistoryLimit = 20\n");
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.max_scale, 4.0);
        assert_eq!(config.history_limit, Some(20));
        assert_eq!(config.min_scale, 0.5);
    }

    #[test]
    fn json_in_toml_file_falls_back() {
        let path = temp_file("misnamed.toml", r#"{ "minElementSize": 30.0 }"#);
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.min_element_size, 30.0);
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let path = temp_file("broken.json", "not = [valid");
        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EngineConfig::load("/nonexistent/sysml-canvas.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn normalized_repairs_inverted_bounds() {
        let config = EngineConfig {
            min_scale: -1.0,
            max_scale: 0.1,
            initial_scale: 9.0,
            ..EngineConfig::default()
        }
        .normalized();
        assert_eq!(config.min_scale, 0.5);
        assert!(config.max_scale >= config.min_scale);
        assert!(config.initial_scale <= config.max_scale);
    }
}
