use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::ai::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

/// Environment variable consulted when no key has been saved.
pub const CREDENTIAL_ENV_VAR: &str = "GEMINI_API_KEY";

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where preferences (and by default the log) live.
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub endpoint: String,
    pub model: String,
    /// Disable speech even if a synthesizer is installed.
    pub mute: bool,
}

impl Config {
    /// Fill anything not given explicitly with the defaults.
    pub fn resolve(
        data_dir: Option<PathBuf>,
        log_file: Option<PathBuf>,
        endpoint: Option<String>,
        model: Option<String>,
        mute: bool,
    ) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => Self::default_data_dir()?,
        };
        let log_file = log_file.unwrap_or_else(|| data_dir.join("nova.log"));

        Ok(Self {
            data_dir,
            log_file,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            mute,
        })
    }

    pub fn default_data_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("nova"))
    }
}

/// Credential from the environment, ignoring blank values.
pub fn env_credential() -> Option<String> {
    std::env::var(CREDENTIAL_ENV_VAR)
        .ok()
        .filter(|key| !key.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_values_win() {
        let config = Config::resolve(
            Some(PathBuf::from("/tmp/nova-test")),
            None,
            Some("http://localhost:9000".to_string()),
            Some("gemini-test".to_string()),
            true,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/nova-test"));
        assert_eq!(config.log_file, PathBuf::from("/tmp/nova-test/nova.log"));
        assert_eq!(config.endpoint, "http://localhost:9000");
        assert_eq!(config.model, "gemini-test");
        assert!(config.mute);
    }

    #[test]
    fn test_defaults_for_endpoint_and_model() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/x")), None, None, None, false).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.model, DEFAULT_MODEL);
    }
}
