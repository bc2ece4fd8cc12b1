use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use kinochi_llm::{
    DEFAULT_GEMINI_MODEL, DEFAULT_TEMPERATURE, GEMINI_PROVIDER_ID, Model, ProviderConfig,
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu, ensure};

pub const SETTINGS_DIRECTORY_NAME: &str = "kinochi";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
/// Prefix for per-key environment overrides, e.g. `KINOCHI_MODEL`.
pub const ENV_PREFIX: &str = "KINOCHI_";
/// Credential variable read without prefix.
pub const API_KEY_ENV: &str = "API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(default = "default_provider_id")]
    pub provider_id: String,
    #[serde(default)]
    pub api_key: String,
    /// Optional base URL override; empty means the vendor default.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub max_tokens: Option<u64>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            provider_id: default_provider_id(),
            api_key: String::new(),
            endpoint: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

impl ChatSettings {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".kinochi"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    /// Layers defaults, the optional JSON file, `KINOCHI_*` variables and `API_KEY`.
    pub fn figment(config_path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(ChatSettings::default()))
            .merge(Json::file(config_path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Env::raw().only(&[API_KEY_ENV]))
    }

    pub fn load() -> SettingsResult<Self> {
        Self::load_from(Self::default_config_path())
    }

    pub fn load_from(config_path: impl AsRef<Path>) -> SettingsResult<Self> {
        Self::from_figment(Self::figment(config_path))
    }

    pub fn from_figment(figment: Figment) -> SettingsResult<Self> {
        let settings = figment
            .extract::<ChatSettings>()
            .map_err(Box::new)
            .context(ExtractSnafu {
                stage: "extract-settings",
            })?;
        Ok(settings.normalized())
    }

    pub fn normalized(mut self) -> Self {
        self.provider_id = if self.provider_id.trim().is_empty() {
            default_provider_id()
        } else {
            self.provider_id.trim().to_string()
        };
        self.api_key = self.api_key.trim().to_string();
        self.endpoint = self.endpoint.trim().to_string();
        self.model = if self.model.trim().is_empty() {
            default_model()
        } else {
            self.model.trim().to_string()
        };
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            self.temperature = default_temperature();
        }
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Fails when no credential is configured.
    pub fn to_provider_config(&self) -> SettingsResult<ProviderConfig> {
        ensure!(
            self.has_api_key(),
            MissingApiKeySnafu {
                stage: "to-provider-config",
            }
        );

        Ok(ProviderConfig::new(
            &self.provider_id,
            &self.api_key,
            &self.endpoint,
        ))
    }

    pub fn model_profile(&self) -> Model {
        Model::new(self.model.clone())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to read settings on `{stage}`: {source}"))]
    Extract {
        stage: &'static str,
        source: Box<figment::Error>,
    },
    #[snafu(display("API key is not configured; set the API_KEY environment variable"))]
    MissingApiKey { stage: &'static str },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

fn default_provider_id() -> String {
    GEMINI_PROVIDER_ID.to_string()
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_target_gemini_flash() {
        let settings = ChatSettings::default();
        assert_eq!(settings.provider_id, "gemini");
        assert_eq!(settings.model, "gemini-3-flash-preview");
        assert_eq!(settings.temperature, 0.7);
        assert!(!settings.has_api_key());
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let result = ChatSettings::default().to_provider_config();
        assert!(matches!(result, Err(SettingsError::MissingApiKey { .. })));
    }

    #[test]
    fn api_key_is_read_from_plain_environment_variable() {
        Jail::expect_with(|jail| {
            jail.set_env("API_KEY", "secret-key");

            let settings = ChatSettings::load_from("missing.json").expect("settings load");
            assert_eq!(settings.api_key, "secret-key");
            assert_eq!(settings.model, DEFAULT_GEMINI_MODEL);

            let config = settings.to_provider_config().expect("api key present");
            assert_eq!(config.provider_id, "gemini");
            assert_eq!(config.api_key, "secret-key");
            Ok(())
        });
    }

    #[test]
    fn file_and_prefixed_environment_are_layered() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "settings.json",
                r#"{ "model": "gemini-2.5-flash", "temperature": 0.2, "api_key": "from-file" }"#,
            )?;
            jail.set_env("KINOCHI_TEMPERATURE", "0.9");
            jail.set_env("KINOCHI_MAX_TOKENS", "512");
            jail.set_env("API_KEY", "from-env");

            let settings = ChatSettings::load_from("settings.json").expect("settings load");
            assert_eq!(settings.model, "gemini-2.5-flash");
            assert_eq!(settings.temperature, 0.9);
            assert_eq!(settings.max_tokens, Some(512));
            assert_eq!(settings.api_key, "from-env");

            let profile = settings.model_profile();
            assert_eq!(profile.id, "gemini-2.5-flash");
            assert_eq!(profile.max_tokens, Some(512));
            Ok(())
        });
    }

    #[test]
    fn normalization_restores_blank_fields() {
        let settings = ChatSettings {
            provider_id: "  ".to_string(),
            api_key: " key ".to_string(),
            endpoint: " ".to_string(),
            model: String::new(),
            temperature: -1.0,
            max_tokens: None,
        }
        .normalized();

        assert_eq!(settings.provider_id, "gemini");
        assert_eq!(settings.api_key, "key");
        assert!(settings.endpoint.is_empty());
        assert_eq!(settings.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(settings.temperature, DEFAULT_TEMPERATURE);
    }
}
