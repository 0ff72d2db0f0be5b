use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::specific_fail;

pub static CONFIG_FILE: &str = "config.yaml";

/// Optional `config.yaml` in the data folder. Every field has a default.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// quiet period before an edit is written
    pub autosave_delay_secs: u64,
    /// contact address sent along with translation requests
    pub translation_email: String,
    pub default_source_lang: String,
    pub default_target_lang: String,
    /// dataset used to seed an empty store instead of the bundled one
    pub defaults_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            autosave_delay_secs: 3,
            translation_email: String::new(),
            default_source_lang: String::new(),
            default_target_lang: "ru".to_string(),
            defaults_path: None,
        }
    }
}

impl Config {
    /// Read `config.yaml` from `folder`; a missing file gives the defaults.
    pub fn load(folder: &Path) -> Result<Config> {
        let path = folder.join(CONFIG_FILE);
        if !path.is_file() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let mut contents = String::new();
        File::open(&path)?.read_to_string(&mut contents)?;
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        match serde_yaml::from_str(&contents) {
            Ok(c) => Ok(c),
            Err(e) => specific_fail!(format!("invalid YAML in {}: {}", path.display(), e)),
        }
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_secs(self.autosave_delay_secs)
    }
}
