use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::compose::ComposeMode;
use crate::extract::ExtractorId;
use crate::provider::ProviderId;

/// Configuration for a single weather provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Configuration for the text-generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub api_key: String,

    /// Optional model endpoint override; the default hosted model is used
    /// when absent.
    pub endpoint: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather" or "weatherstack".
    pub default_provider: Option<String>,

    /// Optional extraction strategy, e.g. "keyword", "inference" or "auto".
    pub extractor: Option<String>,

    /// Optional reply mode, "template" or "generative".
    pub compose: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// [inference]
    /// api_key = "..."
    pub inference: Option<InferenceConfig>,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No default provider configured.\n\
                 Hint: run `skychat configure <provider>` (e.g. `skychat configure openweather`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    /// Extraction strategy; keyword filtering unless configured otherwise.
    pub fn extractor_id(&self) -> Result<ExtractorId> {
        match self.extractor.as_ref() {
            Some(s) => ExtractorId::try_from(s.as_str()),
            None => Ok(ExtractorId::Keyword),
        }
    }

    /// Reply mode; the deterministic template unless configured otherwise.
    pub fn compose_mode(&self) -> Result<ComposeMode> {
        match self.compose.as_ref() {
            Some(s) => ComposeMode::try_from(s.as_str()),
            None => Ok(ComposeMode::Template),
        }
    }

    pub fn has_provider(&self, id: ProviderId) -> bool {
        self.providers.contains_key(id.as_str())
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk (or an empty default when no file exists yet)
    /// and apply environment overrides: WEATHER_API_KEY and
    /// INFERENCE_API_KEY take precedence over the file.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            // First run: no config file, start empty.
            Self::default()
        };

        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(key) = env_value("WEATHER_API_KEY") {
            for id in ProviderId::all() {
                self.upsert_provider_api_key(*id, key.clone());
            }
        }

        if let Some(key) = env_value("INFERENCE_API_KEY") {
            match self.inference.as_mut() {
                Some(inference) => inference.api_key = key,
                None => self.inference = Some(InferenceConfig { api_key: key, endpoint: None }),
            }
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skychat", "skychat")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Set/replace the inference API key, keeping any endpoint override.
    pub fn upsert_inference_api_key(&mut self, api_key: String) {
        match self.inference.as_mut() {
            Some(inference) => inference.api_key = api_key,
            None => self.inference = Some(InferenceConfig { api_key, endpoint: None }),
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<String> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.clone())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    /// Returns the inference API key, if present.
    pub fn inference_api_key(&self) -> Option<String> {
        self.inference.as_ref().map(|cfg| cfg.api_key.clone())
    }

    pub fn inference_endpoint(&self) -> Option<&str> {
        self.inference.as_ref().and_then(|cfg| cfg.endpoint.as_deref())
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn default_provider_id_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.default_provider_id().unwrap_err();

        assert!(err.to_string().contains("No default provider configured"));
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenWeather);

        let key = cfg.provider_api_key(ProviderId::OpenWeather);
        assert_eq!(key, Some("OPEN_KEY".to_string()));
        assert!(cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn upsert_does_not_override_existing_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());
        cfg.upsert_provider_api_key(ProviderId::Weatherstack, "STACK_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");

        assert_eq!(default, ProviderId::OpenWeather);
        assert!(cfg.is_provider_configured(ProviderId::OpenWeather));
        assert!(cfg.is_provider_configured(ProviderId::Weatherstack));
    }

    #[test]
    fn set_default_provider_overrides_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());
        cfg.upsert_provider_api_key(ProviderId::Weatherstack, "STACK_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenWeather);

        cfg.set_default_provider(ProviderId::Weatherstack);

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::Weatherstack);
    }

    #[test]
    fn extractor_defaults_to_keyword() {
        let cfg = Config::default();
        assert_eq!(cfg.extractor_id().unwrap(), crate::extract::ExtractorId::Keyword);
    }

    #[test]
    fn compose_defaults_to_template() {
        let cfg = Config::default();
        assert_eq!(cfg.compose_mode().unwrap(), crate::compose::ComposeMode::Template);
    }

    #[test]
    fn unknown_extractor_setting_errors() {
        let cfg = Config { extractor: Some("psychic".into()), ..Config::default() };
        let err = cfg.extractor_id().unwrap_err();
        assert!(err.to_string().contains("Unknown extractor"));
    }

    #[test]
    fn inference_key_upsert_keeps_endpoint() {
        let mut cfg = Config::default();
        cfg.inference = Some(InferenceConfig {
            api_key: "OLD".into(),
            endpoint: Some("http://localhost:8080".into()),
        });

        cfg.upsert_inference_api_key("NEW".into());

        assert_eq!(cfg.inference_api_key(), Some("NEW".to_string()));
        assert_eq!(cfg.inference_endpoint(), Some("http://localhost:8080"));
    }
}
