use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default = "default_exclude_target_id")]
    pub exclude_target_id: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            exclude_target_id: default_exclude_target_id(),
        }
    }
}

fn default_max_candidates() -> usize {
    10
}
fn default_exclude_target_id() -> bool {
    true
}

/// Model service settings.
///
/// The credential itself never lives in the config file: `api_key_env`
/// names the environment variable it is read from on every request.
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Where the client adapter sends match requests.
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:7340/api/match".to_string()
}

impl Config {
    /// Configuration with every default applied, used when no file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.matching.max_candidates == 0 {
        anyhow::bail!("matching.max_candidates must be >= 1");
    }

    match config.llm.provider.as_str() {
        "gemini" | "disabled" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be gemini or disabled.",
            other
        ),
    }

    if config.llm.is_enabled() {
        if config.llm.model.trim().is_empty() {
            anyhow::bail!("llm.model must be specified when provider is '{}'", config.llm.provider);
        }
        if config.llm.api_key_env.trim().is_empty() {
            anyhow::bail!("llm.api_key_env must name an environment variable");
        }
    }

    if config.llm.timeout_secs == 0 {
        anyhow::bail!("llm.timeout_secs must be > 0");
    }
    if config.client.timeout_secs == 0 {
        anyhow::bail!("client.timeout_secs must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(validate(&config).is_ok());
        assert_eq!(config.server.bind, "127.0.0.1:7340");
        assert_eq!(config.matching.max_candidates, 10);
        assert!(config.matching.exclude_target_id);
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.llm.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_overrides() {
        let config: Config = toml::from_str(
            r#"
[server]
bind = "0.0.0.0:9000"

[matching]
max_candidates = 4
exclude_target_id = false

[llm]
model = "gemini-2.0-flash"
api_key_env = "CAMPUS_GEMINI_KEY"
base_url = "http://localhost:8089"
"#,
        )
        .unwrap();
        assert!(validate(&config).is_ok());
        assert_eq!(config.matching.max_candidates, 4);
        assert!(!config.matching.exclude_target_id);
        assert_eq!(config.llm.base_url, "http://localhost:8089");
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn test_rejects_invalid() {
        let zero_cap: Config = toml::from_str("[matching]\nmax_candidates = 0").unwrap();
        assert!(validate(&zero_cap).is_err());

        let unknown: Config = toml::from_str("[llm]\nprovider = \"openai\"").unwrap();
        let err = validate(&unknown).unwrap_err();
        assert!(err.to_string().contains("Unknown llm provider"));

        let disabled: Config = toml::from_str("[llm]\nprovider = \"disabled\"").unwrap();
        assert!(validate(&disabled).is_ok());
        assert!(!disabled.llm.is_enabled());
    }

    #[test]
    fn test_load_config_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("lostfound.toml");
        std::fs::write(&path, "[matching]\nmax_candidates = 3\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.matching.max_candidates, 3);

        assert!(load_config(&tmp.path().join("missing.toml")).is_err());
    }
}
