// src/config/provider.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::warn;

pub const ENV_PROVIDER_CONFIG_PATH: &str = "PROVIDER_CONFIG_PATH";
pub const DEFAULT_PROVIDER_CONFIG_JSON: &str = "config/provider.json";
pub const DEFAULT_PROVIDER_CONFIG_TOML: &str = "config/provider.toml";

/// Env vars consulted (in order) when `api_key` is `"ENV"`.
const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_image_model() -> String {
    "imagen-3.0-generate-002".to_string()
}
fn default_temperature() -> f32 {
    0.75
}
fn default_true() -> bool {
    true
}
fn default_language() -> String {
    "English".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Mock,
    Gemini,
}

impl<'de> Deserialize<'de> for ProviderKind {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(serde::de::Error::custom(format!(
                "unsupported provider: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    /// Literal key, or "ENV" to read GEMINI_API_KEY / API_KEY.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_true")]
    pub generate_thumbnails: bool,
    /// Language the model writes descriptive fields in.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Mock,
            api_key: String::new(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            temperature: default_temperature(),
            generate_thumbnails: true,
            language: default_language(),
        }
    }
}

impl ProviderConfig {
    /// Load from a JSON or TOML file (chosen by extension, JSON otherwise).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading provider config from {}", path.display()))?;
        let is_toml = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        let cfg: ProviderConfig = if is_toml {
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
        } else {
            serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
        };
        Ok(cfg.resolved())
    }

    /// Resolution order:
    /// 1) $PROVIDER_CONFIG_PATH (must exist)
    /// 2) config/provider.json
    /// 3) config/provider.toml
    /// 4) built-in defaults (mock provider)
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_PROVIDER_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_PROVIDER_CONFIG_PATH} points to non-existent path");
            }
            return Self::load_from_file(&pb);
        }
        for candidate in [DEFAULT_PROVIDER_CONFIG_JSON, DEFAULT_PROVIDER_CONFIG_TOML] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
        }
        Ok(Self::default())
    }

    fn resolved(mut self) -> Self {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = match api_key_from_env() {
                Ok(k) => k,
                Err(e) => {
                    if self.provider == ProviderKind::Gemini {
                        warn!(error = %e, "no API key in environment");
                    }
                    String::new()
                }
            };
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = default_temperature();
        }
        self
    }
}

fn api_key_from_env() -> Result<String> {
    API_KEY_VARS
        .iter()
        .find_map(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| anyhow!("missing {} env var", API_KEY_VARS.join(" / ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn clear_key_env() {
        for name in API_KEY_VARS {
            env::remove_var(name);
        }
    }

    #[serial_test::serial]
    #[test]
    fn json_config_resolves_env_key_and_clamps_temperature() {
        clear_key_env();
        env::set_var("GEMINI_API_KEY", "abc123");
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("provider.json");
        fs::write(
            &p,
            r#"{ "provider": "Gemini", "api_key": "env", "temperature": 9.0 }"#,
        )
        .unwrap();

        let cfg = ProviderConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.provider, ProviderKind::Gemini);
        assert_eq!(cfg.api_key, "abc123");
        assert_eq!(cfg.temperature, 0.75);
        assert_eq!(cfg.text_model, "gemini-2.5-flash");
        assert!(cfg.generate_thumbnails);
        clear_key_env();
    }

    #[serial_test::serial]
    #[test]
    fn toml_config_and_fallback_key_var() {
        clear_key_env();
        env::set_var("API_KEY", "fallback");
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("provider.toml");
        fs::write(
            &p,
            "provider = \"gemini\"\napi_key = \"ENV\"\ngenerate_thumbnails = false\n",
        )
        .unwrap();

        let cfg = ProviderConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.api_key, "fallback");
        assert!(!cfg.generate_thumbnails);
        clear_key_env();
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("provider.json");
        fs::write(&p, r#"{ "provider": "claude" }"#).unwrap();
        let err = ProviderConfig::load_from_file(&p).unwrap_err();
        assert!(format!("{err:#}").contains("unsupported provider"));
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_PROVIDER_CONFIG_PATH);

        // nothing on disk → defaults
        let cfg = ProviderConfig::load_default().unwrap();
        assert_eq!(cfg.provider, ProviderKind::Mock);

        // env path wins
        let p = tmp.path().join("custom.json");
        fs::write(&p, r#"{ "provider": "gemini", "api_key": "literal" }"#).unwrap();
        env::set_var(ENV_PROVIDER_CONFIG_PATH, p.display().to_string());
        let cfg = ProviderConfig::load_default().unwrap();
        assert_eq!(cfg.provider, ProviderKind::Gemini);
        assert_eq!(cfg.api_key, "literal");

        // missing env path is an error
        env::set_var(ENV_PROVIDER_CONFIG_PATH, tmp.path().join("nope.json"));
        assert!(ProviderConfig::load_default().is_err());
        env::remove_var(ENV_PROVIDER_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
