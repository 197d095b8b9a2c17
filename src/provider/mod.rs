use async_trait::async_trait;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::ProviderError;
use crate::wire::Instruction;

pub mod anthropic;
pub mod ollama;
pub mod openai;

/// A hosted text model: takes a prompt, returns the model's raw text.
///
/// Adapters do not interpret the text; decoding into the insight contract
/// happens in [`crate::flows`].
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, ins: &Instruction) -> Result<String, ProviderError>;
}

pub type DynProvider = Box<dyn Provider>;

#[async_trait]
impl<T: Provider + ?Sized> Provider for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn send(&self, ins: &Instruction) -> Result<String, ProviderError> {
        (**self).send(ins).await
    }
}

/// System prompt with developer notes folded in, for APIs that only take one system text.
pub(crate) fn system_text(ins: &Instruction) -> String {
    let mut system = ins.system.clone();
    if let Some(dev) = &ins.developer {
        system.push_str("\n\nOutput format:\n");
        system.push_str(dev);
    }
    system
}

fn env_key(var: &str) -> Result<String, ProviderError> {
    std::env::var(var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ProviderError::Config(format!("{var} env var is not set")))
}

pub fn make_provider(cfg: &Config) -> Result<DynProvider, ProviderError> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let model = cfg.model();
    match cfg.provider {
        ProviderKind::OpenAI => Ok(Box::new(openai::OpenAIProvider::new(
            model,
            env_key("OPENAI_API_KEY")?,
            cfg.openai_api_base.clone(),
            timeout,
        )?)),
        ProviderKind::Anthropic => Ok(Box::new(anthropic::Anthropic::new(
            model,
            env_key("ANTHROPIC_API_KEY")?,
            cfg.anthropic_api_base.clone(),
            cfg.anthropic_api_version.clone(),
            timeout,
        )?)),
        ProviderKind::Ollama => Ok(Box::new(ollama::Ollama::new(model, cfg.ollama_url.clone(), timeout)?)),
    }
}
