use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider not configured: {0}")] Config(String),
    #[error("transport error: {0}")] Transport(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")] Status { status: u16, body: String },
    #[error("malformed provider output: {0}")] Malformed(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage io error: {0}")] Io(#[from] std::io::Error),
    #[error("stored profile is unreadable: {0}")] Corrupt(#[from] serde_json::Error),
    #[error("no data directory available on this platform")] NoDataDir,
}

/// One failed form field with the message shown next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("form validation failed: {}", describe(.0))]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten `validator` output, keeping field names sorted so messages print in a stable order.
    pub fn from_validation(errors: &validator::ValidationErrors) -> Self {
        let mut out = Vec::new();
        for (field, errs) in errors.field_errors() {
            for e in errs.iter() {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                out.push(FieldError { field: field.to_string(), message });
            }
        }
        out.sort_by(|a, b| a.field.cmp(&b.field));
        Self(out)
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError { field: field.to_string(), message: message.into() });
    }
}

fn describe(errs: &[FieldError]) -> String {
    errs.iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum OnboardingError {
    #[error(transparent)] Invalid(#[from] FormErrors),
    #[error("could not save birth details: {0}")] Store(#[from] StoreError),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("session has no birth profile")] MissingProfile,
    #[error("a request is already in flight")] Busy,
    #[error("message is empty")] EmptyMessage,
    #[error("no suggestion at position {0}")] NoSuchSuggestion(usize),
    #[error("session is closed")] Closed,
}
