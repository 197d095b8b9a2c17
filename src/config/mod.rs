use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{Args, ProviderKind};
use crate::contact::DEFAULT_RECIPIENT;
use crate::errors::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    /// Falls back to a per-provider default when unset.
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub openai_api_base: String,
    pub anthropic_api_base: String,
    pub anthropic_api_version: String,
    pub ollama_url: String,
    pub data_dir: Option<PathBuf>,
    pub contact_email: String,
    /// Sent as the current location; the birth location is used when unset.
    pub current_location: Option<String>,
    pub log_level: String,
    pub save_exchanges: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            model: None,
            timeout_secs: 60,
            openai_api_base: "https://api.openai.com".into(),
            anthropic_api_base: "https://api.anthropic.com".into(),
            anthropic_api_version: "2023-06-01".into(),
            ollama_url: "http://localhost:11434".into(),
            data_dir: None,
            contact_email: DEFAULT_RECIPIENT.into(),
            current_location: None,
            log_level: "warn".into(),
            save_exchanges: false,
        }
    }
}

impl Config {
    /// Explicit path must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (Some(p.to_path_buf()), true),
            None => (Self::default_path(), false),
        };
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)?;
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("webastro").join("config.toml"))
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(p) = args.provider {
            if p != self.provider {
                // A model name rarely carries over between providers.
                self.model = None;
            }
            self.provider = p;
        }
        if let Some(m) = &args.model {
            self.model = Some(m.clone());
        }
        if let Some(t) = args.timeout_secs {
            self.timeout_secs = t;
        }
        if let Some(d) = &args.data_dir {
            self.data_dir = Some(d.clone());
        }
        if args.save_exchanges {
            self.save_exchanges = true;
        }
        if args.debug {
            self.log_level = "debug".into();
        }
    }

    pub fn model(&self) -> String {
        match &self.model {
            Some(m) if !m.trim().is_empty() => m.clone(),
            _ => match self.provider {
                ProviderKind::OpenAI => "gpt-4.1-mini".into(),
                ProviderKind::Anthropic => "claude-3-5-haiku-latest".into(),
                ProviderKind::Ollama => "llama3.2".into(),
            },
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf, StoreError> {
        match &self.data_dir {
            Some(d) => Ok(d.clone()),
            None => dirs::data_dir()
                .map(|d| d.join("webastro"))
                .ok_or(StoreError::NoDataDir),
        }
    }
}
