// The central source of truth for your UI.
#[derive(Clone, Debug)]
pub enum AppState {
    Initialising,
    CheckingForUpdates,
    DownloadingUpdate,
    PreparingWorkspace,
    Ready { version: String },
    Error(String),
}

impl AppState {
    pub fn is_ready(&self) -> bool {
        matches!(self, AppState::Ready { .. })
    }
}

// Actions triggered by the user from the UI layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserAction {
    CheckForUpdates,
    StartService,
    StopService,
    RestartService,
}
