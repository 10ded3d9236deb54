use std::{fs, io::ErrorKind, path::Path, path::PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const SETTINGS_FILE_NAME: &str = "settings.json";

const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub request_timeout_secs: u64,
    pub recent_deliveries_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: "gemini-3-pro-preview".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            request_timeout_secs: 60,
            recent_deliveries_limit: 5,
        }
    }
}

impl Settings {
    /// Loads `settings.json` from the data dir, writing defaults on first run.
    pub fn load(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let path = settings_path(data_dir);

        let settings = match fs::read(&path) {
            Ok(bytes) if !bytes.is_empty() => {
                serde_json::from_slice::<Settings>(&bytes).unwrap_or_else(|err| {
                    warn!("Ignoring unreadable {}: {}", path.display(), err);
                    Settings::default()
                })
            }
            Ok(_) => Settings::default().seeded(data_dir)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Settings::default().seeded(data_dir)?,
            Err(err) => return Err(err.into()),
        };

        Ok(settings.with_env_overrides(|name| std::env::var(name).ok()))
    }

    fn seeded(self, data_dir: &Path) -> Result<Self> {
        self.save(data_dir)?;
        Ok(self)
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(settings_path(data_dir), json)?;
        Ok(())
    }

    /// An API key from the environment wins over the file.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
        {
            self.gemini_api_key = Some(key);
        }
        self
    }
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE_NAME)
}
