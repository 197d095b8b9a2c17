/// Where a controller wants the user to go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    GetStarted,
    Chat,
}

impl Route {
    /// The subcommand that shows this screen.
    pub fn command(&self) -> &'static str {
        match self {
            Route::GetStarted => "webastro get-started",
            Route::Chat => "webastro chat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// Transient user-facing notification (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), variant: NoticeVariant::Default }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), variant: NoticeVariant::Destructive }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }
}
