use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Install the stderr subscriber. `RUST_LOG` wins over `level`.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub struct SavedPaths {
    pub dir: PathBuf,
    pub request: PathBuf,
    pub response: PathBuf,
}

/// Writes each provider exchange to `<root>/tx/<uuid>/<stage>.{request,response}.json`.
#[derive(Debug, Clone)]
pub struct ExchangeRecorder {
    root: PathBuf,
}

fn tx_dir(root: &Path, tx: Uuid) -> PathBuf {
    root.join("tx").join(tx.to_string())
}

impl ExchangeRecorder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn save_stage<R: Serialize>(&self, stage: &str, req: &R, raw_response: &str) -> anyhow::Result<SavedPaths> {
        let dir = tx_dir(&self.root, Uuid::new_v4());
        fs::create_dir_all(&dir)?;

        let request = dir.join(format!("{stage}.request.json"));
        fs::write(&request, to_string_pretty(req)?)?;

        let response = dir.join(format!("{stage}.response.json"));
        fs::write(&response, raw_response)?;

        Ok(SavedPaths { dir, request, response })
    }

    /// Recording is best-effort; a failure is logged and otherwise ignored.
    pub fn record<R: Serialize>(&self, stage: &str, req: &R, raw_response: &str) {
        if let Err(e) = self.save_stage(stage, req, raw_response) {
            warn!(stage, error = %e, "could not save exchange artifacts");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::SuggestionsRequest;

    #[test]
    fn stage_files_land_under_tx() {
        let dir = tempfile::tempdir().unwrap();
        let rec = ExchangeRecorder::new(dir.path());
        let saved = rec
            .save_stage("suggestions", &SuggestionsRequest { topic: Some("love".into()) }, "{\"suggestions\":[]}")
            .unwrap();
        assert!(saved.dir.starts_with(dir.path().join("tx")));
        let req = std::fs::read_to_string(&saved.request).unwrap();
        assert!(req.contains("\"topic\": \"love\""));
        assert_eq!(std::fs::read_to_string(&saved.response).unwrap(), "{\"suggestions\":[]}");
    }
}
