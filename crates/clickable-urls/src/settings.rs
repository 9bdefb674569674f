use anyhow::{Context, Result};
use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::try_exists;

pub const DEFAULT_MAX_URLS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlSettings {
    /// Scan documents on load, focus and edit. `find_urls` ignores this.
    pub auto_find_urls: bool,
    pub highlight_urls: bool,
    /// Documents with more matches than this are ignored until closed.
    pub max_url_limit: usize,
    /// Supplementary pattern alternated with the built-in URL pattern.
    pub file_folder_regex: String,
    /// Browser to launch; the system default when unset.
    pub clickable_urls_browser: Option<String>,
}

impl Default for UrlSettings {
    fn default() -> Self {
        Self {
            auto_find_urls: true,
            highlight_urls: true,
            max_url_limit: DEFAULT_MAX_URLS,
            file_folder_regex: String::new(),
            clickable_urls_browser: None,
        }
    }
}

impl UrlSettings {
    /// Normalise blank values
    pub fn validate(&mut self) {
        if self.file_folder_regex.trim().is_empty() && !self.file_folder_regex.is_empty() {
            log::warn!("Blank file_folder_regex, ignoring it");
            self.file_folder_regex.clear();
        }

        if let Some(browser) = &self.clickable_urls_browser {
            if browser.trim().is_empty() {
                log::warn!("Blank clickable_urls_browser, using system default");
                self.clickable_urls_browser = None;
            }
        }
    }

    pub fn supplementary_pattern(&self) -> Option<&str> {
        if self.file_folder_regex.is_empty() {
            None
        } else {
            Some(&self.file_folder_regex)
        }
    }
}

/// Where settings come from. Read once per scan, so edits take effect on
/// the next scan without a reload hook.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn load(&self) -> Result<UrlSettings>;
}

#[async_trait]
impl SettingsSource for UrlSettings {
    async fn load(&self) -> Result<UrlSettings> {
        Ok(self.clone())
    }
}

/// JSON settings file on disk
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Settings file at the default location, see [`SettingsFile::default_path`].
    pub fn from_default_location() -> Result<Self> {
        let path = Self::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CLICKABLE_URLS_SETTINGS_PATH") {
            return Some(PathBuf::from(path));
        }

        if let Ok(dir) = std::env::var("CLICKABLE_URLS_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("settings.json"));
        }

        ProjectDirs::from("com", "clickable-urls", "clickable-urls")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    pub async fn save(&self, settings: &UrlSettings) -> Result<()> {
        let mut to_save = settings.clone();
        to_save.validate();

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(&to_save)
            .context("Failed to serialize settings")?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write settings file: {}", self.path.display()))?;

        log::info!("Saved settings to: {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SettingsSource for SettingsFile {
    async fn load(&self) -> Result<UrlSettings> {
        if !try_exists(&self.path).await? {
            log::debug!("Settings file does not exist, using defaults");
            return Ok(UrlSettings::default());
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read settings file: {}", self.path.display()))?;

        if content.trim().is_empty() {
            log::warn!("Settings file is empty, using defaults");
            return Ok(UrlSettings::default());
        }

        match serde_json::from_str::<UrlSettings>(&content) {
            Ok(mut settings) => {
                settings.validate();
                Ok(settings)
            }
            Err(json_err) => {
                log::warn!(
                    "Failed to parse settings file {}: {}, using defaults",
                    self.path.display(),
                    json_err
                );
                Ok(UrlSettings::default())
            }
        }
    }
}
