use std::path::{Path, PathBuf};

use log::{info, warn};
use sysml_canvas::EngineConfig;

const FILE_NAME: &str = "sysml-canvas.toml";

/// `$HOME/.config/sysml-canvas.toml` if present, otherwise a file of the same
/// name in the working directory.
pub(super) fn config_path() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home).join(".config").join(FILE_NAME);
        if path.exists() {
            return Some(path);
        }
    }
    let local = Path::new(FILE_NAME);
    local.exists().then(|| local.to_path_buf())
}

/// Engine settings from `path`, falling back to defaults on any error.
pub(super) fn load_config(path: Option<&Path>) -> EngineConfig {
    let Some(path) = path else {
        return EngineConfig::default();
    };
    match EngineConfig::load(path) {
        Ok(config) => {
            info!(path:% = path.display(); "Loaded settings");
            config
        }
        Err(err) => {
            warn!(path:% = path.display(), error:% = err; "Ignoring unreadable settings");
            EngineConfig::default()
        }
    }
}
