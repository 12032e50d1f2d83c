use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

/// Settings from `~/.config/gifclip/config.toml`; CLI flags take priority.
///
/// Credentials never live here: `GEMINI_API_KEY` and `RAPIDAPI_KEY` come from
/// the environment.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_lang: Option<String>,
    pub default_provider: Option<String>,
    pub gemini_model: Option<String>,
    pub rapidapi_host: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
}

impl Config {
    /// Load config from ~/.config/gifclip/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn gemini_model(&self) -> &str {
        self.gemini_model.as_deref().unwrap_or(crate::analyze::DEFAULT_MODEL)
    }

    pub fn rapidapi_host(&self) -> &str {
        self.rapidapi_host.as_deref().unwrap_or(crate::rapidapi::DEFAULT_HOST)
    }

    /// Where rendered GIFs go
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| data_dir().join("output"))
    }

    /// Where yt-dlp downloads are kept for reuse
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("youtube_downloads"))
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("gifclip")
        .join("config.toml")
}

pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gifclip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
default_lang = "es"
default_provider = "rapidapi"
gemini_model = "gemini-2.0-flash"
rapidapi_host = "example.p.rapidapi.com"
output_dir = "/srv/gifs"
download_dir = "/srv/videos"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_lang.as_deref(), Some("es"));
        assert_eq!(config.default_provider.as_deref(), Some("rapidapi"));
        assert_eq!(config.gemini_model(), "gemini-2.0-flash");
        assert_eq!(config.rapidapi_host(), "example.p.rapidapi.com");
        assert_eq!(config.output_dir(), PathBuf::from("/srv/gifs"));
        assert_eq!(config.download_dir(), PathBuf::from("/srv/videos"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.default_lang.is_none());
        assert_eq!(config.gemini_model(), crate::analyze::DEFAULT_MODEL);
        assert_eq!(config.rapidapi_host(), crate::rapidapi::DEFAULT_HOST);
        assert!(config.output_dir().ends_with("gifclip/output"));
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(r#"default_lang = "fr""#).unwrap();
        assert_eq!(config.default_lang.as_deref(), Some("fr"));
        assert!(config.gemini_model.is_none());
    }
}
