use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Error, Result};

pub const APP_NAME: &str = "image_to_3d";
pub const DEFAULT_API_BASE: &str = "https://api.synexa.ai";
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://api.synexa.ai/v1/uploads";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base: String,
    pub upload_endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.into(),
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.into(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_local_dir()
        .ok_or_else(|| Error::Config("Couldn't get config dir".into()))?
        .join(format!("{APP_NAME}.ron")))
}

/// Reads the config at `path`, falling back to defaults when it doesn't exist yet.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        Ok(Config::default())
    } else {
        load_ron_file(path)
    }
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    save_ron_file(path, cfg)
}

fn load_ron_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let src = fs::read_to_string(path)?;
    ron::from_str(&src).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

fn save_ron_file<T: Serialize>(path: &Path, x: &T) -> Result<()> {
    let src = ron::to_string(x).map_err(|e| Error::Config(e.to_string()))?;
    Ok(fs::write(path, src)?)
}
