use crate::format::DEFAULT_WRAP_WIDTH;
use crate::history::{HistoryStore, DEFAULT_MAX_ENTRIES};
use crate::logging::{LogCategory, LogContext};
use crate::{log_info, log_warning};
use anyhow::{anyhow, Result};
use colored::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Ollama,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    #[serde(default = "default_ai_timeout")]
    pub ai_timeout: u64,

    #[serde(default = "default_history_max_entries")]
    pub history_max_entries: usize,

    #[serde(default)]
    pub history_path: Option<PathBuf>,

    #[serde(default = "default_format_output")]
    pub format_output: bool,

    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ai_timeout() -> u64 {
    120000 // 2 minutes
}

fn default_history_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_format_output() -> bool {
    true
}

fn default_wrap_width() -> usize {
    DEFAULT_WRAP_WIDTH
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: default_model(),
            api_base_url: default_api_base_url(),
            ollama_url: default_ollama_url(),
            ai_timeout: default_ai_timeout(),
            history_max_entries: default_history_max_entries(),
            history_path: None,
            format_output: default_format_output(),
            wrap_width: default_wrap_width(),
        }
    }
}

impl Config {
    /// Load `<config_dir>/heycli/config.json`, writing defaults on first run.
    ///
    /// An unreadable or invalid file is reported and replaced by defaults in
    /// memory; the file itself is left alone so it can be fixed by hand.
    pub fn load() -> Self {
        match Self::get_config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            let config = Self::default();
            if let Err(e) = config.save_to(path) {
                log_warning!(
                    LogCategory::Configuration,
                    format!("Could not write default configuration: {}", e)
                );
            }
            return config;
        }

        let parsed = fs::read_to_string(path)
            .map_err(|e| anyhow!("could not read config: {}", e))
            .and_then(|content| {
                serde_json::from_str::<Config>(&content)
                    .map_err(|e| anyhow!("could not parse config: {}", e))
            })
            .and_then(|config| Self::validate_config(&config).map(|_| config));

        match parsed {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "{} Invalid configuration in {}: {}. Using defaults.",
                    "⚠️".yellow(),
                    path.display(),
                    e
                );
                log_warning!(
                    LogCategory::Configuration,
                    format!("Invalid configuration, using defaults: {}", e)
                );
                Self::default()
            }
        }
    }

    fn validate_config(config: &Config) -> Result<()> {
        if config.ai_timeout == 0 {
            return Err(anyhow!("ai_timeout must be greater than 0"));
        }

        if config.ai_timeout > 600000 {
            return Err(anyhow!("ai_timeout cannot exceed 10 minutes (600000ms)"));
        }

        if config.history_max_entries == 0 {
            return Err(anyhow!("history_max_entries must be greater than 0"));
        }

        if !(20..=200).contains(&config.wrap_width) {
            return Err(anyhow!("wrap_width must be between 20 and 200"));
        }

        for (name, url) in [("api_base_url", &config.api_base_url), ("ollama_url", &config.ollama_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow!("{} must be a valid HTTP/HTTPS URL", name));
            }
        }

        if config.model.trim().is_empty() {
            return Err(anyhow!("model name cannot be empty"));
        }

        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        Self::validate_config(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;

        log_info!(
            LogCategory::Configuration,
            "Configuration saved",
            LogContext::new().with_component("configuration").with_operation("save")
        );
        Ok(())
    }

    /// Where history lives: the configured override, else `~/.heycli_history`
    pub fn history_file(&self) -> Option<PathBuf> {
        self.history_path.clone().or_else(HistoryStore::default_path)
    }

    pub fn display(&self) {
        println!("{}", "🤖 heycli Configuration:".bold().cyan());
        println!(
            "Provider: {}",
            match self.provider {
                ProviderKind::OpenAi => "openai",
                ProviderKind::Ollama => "ollama",
            }
        );
        println!("Model: {}", self.model);
        match self.provider {
            ProviderKind::OpenAi => println!("API base URL: {}", self.api_base_url),
            ProviderKind::Ollama => println!("Ollama URL: {}", self.ollama_url),
        }
        println!("AI timeout: {}ms", self.ai_timeout);
        println!();
        println!("{}", "📜 History:".bold().cyan());
        println!(
            "File: {}",
            self.history_file()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "unavailable".to_string())
        );
        println!("Max entries: {}", self.history_max_entries);
        println!();
        println!("{}", "🖨️  Output:".bold().cyan());
        println!(
            "Formatting: {}",
            if self.format_output { "enabled" } else { "disabled" }
        );
        println!("Wrap width: {}", self.wrap_width);
        if let Some(path) = Self::get_config_path() {
            println!();
            println!("{} {}", "Config file:".dimmed(), path.display().to_string().dimmed());
        }
    }

    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("heycli");
            path.push("config.json");
            path
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.history_max_entries, 1000);
        assert_eq!(config.wrap_width, 70);
        assert!(config.format_output);
        assert!(config.history_path.is_none());
        assert!(Config::validate_config(&config).is_ok());
    }

    #[test]
    fn test_serde_defaults_for_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"provider": "ollama", "model": "mistral"}"#).unwrap();

        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.model, "mistral");
        assert_eq!(config.ai_timeout, 120000);
        assert_eq!(config.ollama_url, "http://localhost:11434");
    }

    #[test]
    fn test_provider_kind_serialization() {
        assert_eq!(serde_json::to_string(&ProviderKind::OpenAi).unwrap(), "\"openai\"");
        assert_eq!(serde_json::to_string(&ProviderKind::Ollama).unwrap(), "\"ollama\"");
    }

    #[test]
    fn test_validation_errors() {
        let cases: Vec<(fn(&mut Config), &str)> = vec![
            (|c: &mut Config| c.ai_timeout = 0, "ai_timeout must be greater than 0"),
            (|c: &mut Config| c.ai_timeout = 700000, "ai_timeout cannot exceed"),
            (|c: &mut Config| c.history_max_entries = 0, "history_max_entries"),
            (|c: &mut Config| c.wrap_width = 5, "wrap_width"),
            (|c: &mut Config| c.api_base_url = "api.openai.com".to_string(), "api_base_url must be"),
            (|c: &mut Config| c.ollama_url = "localhost".to_string(), "ollama_url must be"),
            (|c: &mut Config| c.model = "  ".to_string(), "model name cannot be empty"),
        ];

        for (mutate, expected) in cases {
            let mut config = Config::default();
            mutate(&mut config);
            let err = Config::validate_config(&config).unwrap_err();
            assert!(err.to_string().contains(expected), "{} vs {}", err, expected);
        }
    }

    #[test]
    fn test_load_from_missing_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("heycli").join("config.json");

        let config = Config::load_from(&path);

        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let config = Config {
            provider: ProviderKind::Ollama,
            model: "llama3".to_string(),
            history_path: Some(temp_dir.path().join("hist.json")),
            wrap_width: 100,
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"ai_timeout": 0}"#).unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
        // the broken file is kept for the user to fix
        assert!(fs::read_to_string(&path).unwrap().contains("\"ai_timeout\": 0"));
    }

    #[test]
    fn test_history_file_override() {
        let config = Config {
            history_path: Some(PathBuf::from("/tmp/custom_history.json")),
            ..Config::default()
        };
        assert_eq!(config.history_file(), Some(PathBuf::from("/tmp/custom_history.json")));
    }
}
