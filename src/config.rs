use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, OPENROUTER_MODEL_PRIORITY, SETTINGS_FILE_NAME,
};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Wire format a provider speaks.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// `/chat/completions` with a bearer token (OpenAI, OpenRouter, DeepSeek, ...).
    OpenAiCompatible,
    /// Google `generateContent` with an `x-goog-api-key` header.
    Gemini,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub name: String,
    pub kind: ProviderKind,
    pub base_url: String,
    pub default_model: String,
    /// Tried in declared order after the primary model answers 429.
    #[serde(default)]
    pub fallback_models: Vec<String>,
}

impl ProviderProfile {
    /// Primary model (user override first) followed by the fallbacks, deduplicated.
    pub fn candidates(&self, model_override: Option<&str>) -> Vec<String> {
        let primary = model_override
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model);

        let mut models = vec![primary.to_string()];
        for model in &self.fallback_models {
            if !models.iter().any(|m| m == model) {
                models.push(model.clone());
            }
        }
        models
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub active_provider: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub providers: Vec<ProviderProfile>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            active_provider: "OpenRouter".to_string(),
            log_level: default_log_level(),
            providers: vec![
                ProviderProfile {
                    name: "OpenRouter".to_string(),
                    kind: ProviderKind::OpenAiCompatible,
                    base_url: "https://openrouter.ai/api/v1".to_string(),
                    default_model: OPENROUTER_MODEL_PRIORITY[0].to_string(),
                    fallback_models: OPENROUTER_MODEL_PRIORITY[1..]
                        .iter()
                        .map(|m| m.to_string())
                        .collect(),
                },
                ProviderProfile {
                    name: "OpenAI".to_string(),
                    kind: ProviderKind::OpenAiCompatible,
                    base_url: "https://api.openai.com/v1".to_string(),
                    default_model: "gpt-4o-mini".to_string(),
                    fallback_models: Vec::new(),
                },
                ProviderProfile {
                    name: "Gemini".to_string(),
                    kind: ProviderKind::Gemini,
                    base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                    default_model: "gemini-2.0-flash".to_string(),
                    fallback_models: vec!["gemini-2.0-flash-lite".to_string()],
                },
            ],
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR_NAME);
        path
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE_NAME)
    }

    /// Loads the config file, writing defaults on first run.
    /// An unreadable or malformed file falls back to defaults.
    pub fn load() -> Self {
        let path = Self::config_file();
        if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring config at {:?}: {:#}", path, e),
            }
            return Self::default();
        }
        let default = Self::default();
        if let Err(e) = default.save() {
            tracing::warn!("Could not write default config: {:#}", e);
        }
        default
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_file())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get_active_provider(&self) -> Option<&ProviderProfile> {
        self.providers
            .iter()
            .find(|p| p.name == self.active_provider)
    }
}

/// User settings written by the options surface and read on every dispatch.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Settings {
    /// The key, if present and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Read-only view of the persisted settings. Implementations must not cache.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> anyhow::Result<Settings>;
}

/// Settings kept in a TOML file, re-read on every load.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `settings.toml` next to the app config.
    pub fn default_location() -> Self {
        Self::new(AppConfig::config_dir().join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(settings)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write settings: {:?}", self.path))?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> anyhow::Result<Settings> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("Failed to access settings: {:?}", self.path))?;
        if !exists {
            return Ok(Settings::default());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read settings: {:?}", self.path))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings: {:?}", self.path))?;
        Ok(settings)
    }
}

/// In-process store for embedders and tests.
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: RwLock<Settings>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    pub async fn set(&self, settings: Settings) {
        *self.settings.write().await = settings;
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> anyhow::Result<Settings> {
        Ok(self.settings.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ProviderProfile {
        ProviderProfile {
            name: "Test".into(),
            kind: ProviderKind::OpenAiCompatible,
            base_url: "http://localhost".into(),
            default_model: "a".into(),
            fallback_models: vec!["b".into(), "c".into()],
        }
    }

    #[test]
    fn test_candidates_use_override_then_fallbacks() {
        let p = profile();
        assert_eq!(p.candidates(None), vec!["a", "b", "c"]);
        assert_eq!(p.candidates(Some("x")), vec!["x", "b", "c"]);
        assert_eq!(p.candidates(Some("b")), vec!["b", "c"]);
        assert_eq!(p.candidates(Some("  ")), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_default_config_has_active_provider() {
        let config = AppConfig::default();
        let active = config.get_active_provider().unwrap();
        assert_eq!(active.kind, ProviderKind::OpenAiCompatible);
        assert!(active.candidates(None).len() > 1);
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.active_provider = "Gemini".into();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.active_provider, "Gemini");
        assert_eq!(loaded.providers, config.providers);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "active_provider = [").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let settings = Settings {
            api_key: Some("   ".into()),
            model: None,
        };
        assert_eq!(settings.api_key(), None);
    }

    #[tokio::test]
    async fn test_file_store_reads_fresh_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.toml"));
        assert_eq!(store.load().await.unwrap(), Settings::default());

        store
            .save(&Settings {
                api_key: Some("sk-one".into()),
                model: None,
            })
            .unwrap();
        assert_eq!(store.load().await.unwrap().api_key(), Some("sk-one"));

        fs::write(store.path(), "apiKey = \"sk-two\"\nmodel = \"m\"\n").unwrap();
        let settings = store.load().await.unwrap();
        assert_eq!(settings.api_key(), Some("sk-two"));
        assert_eq!(settings.model.as_deref(), Some("m"));
    }

    #[tokio::test]
    async fn test_file_store_unreadable_location_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let store = FileSettingsStore::new(blocker.join("settings.toml"));
        let err = store.load().await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to access settings"));
    }

    #[tokio::test]
    async fn test_memory_store_set() {
        let store = MemorySettingsStore::default();
        assert!(store.load().await.unwrap().api_key().is_none());
        store
            .set(Settings {
                api_key: Some("k".into()),
                model: None,
            })
            .await;
        assert_eq!(store.load().await.unwrap().api_key(), Some("k"));
    }
}
