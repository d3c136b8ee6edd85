use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::config::PanelConfig;
use crate::engine::state::{AppState, UserAction};
use crate::env;
use crate::logview::LogLevel;
use crate::payload;
use crate::service::{ServiceController, ServiceLogSender};
use crate::updater::{UpdateStatus, Updater};

pub mod state;

pub struct PanelEngine {
    pub state: AppState,
    config: PanelConfig,
    updater: Updater,
    service: ServiceController,
}

impl PanelEngine {
    pub fn new(config: PanelConfig) -> Self {
        let updater = Updater::new(&config);
        Self {
            state: AppState::Initialising,
            config,
            updater,
            service: ServiceController::new(),
        }
    }

    pub fn service(&self) -> ServiceController {
        self.service.clone()
    }

    /// Swap in a freshly saved configuration. The updater is rebuilt since
    /// its endpoints and key come from the config.
    pub fn apply_config(&mut self, config: PanelConfig) {
        self.updater = Updater::new(&config);
        self.config = config;
    }

    /// Update check, payload download and workspace preparation, in order.
    /// Ends in `Ready` when a payload is available locally, `Error` when
    /// neither the network nor the cache can provide one.
    pub async fn bootstrap(
        &mut self,
        updates: &mpsc::UnboundedSender<AppState>,
        log: &ServiceLogSender,
    ) {
        info!("bootstrap: starting update check");
        let mut status_cb = |status: UpdateStatus| match status {
            UpdateStatus::Checking => {
                let _ = updates.send(AppState::CheckingForUpdates);
                let _ = log.send((LogLevel::Info, "Checking for workflow updates...".into()));
            }
            UpdateStatus::Downloading => {
                let _ = updates.send(AppState::DownloadingUpdate);
                let _ = log.send((LogLevel::Info, "Downloading workflow update...".into()));
            }
            UpdateStatus::UpToDate => {
                let _ = log.send((LogLevel::Success, "Workflows are up to date".into()));
            }
            UpdateStatus::Updated { version } => {
                let _ = log.send((
                    LogLevel::Success,
                    format!("Workflows updated to version {version}"),
                ));
            }
            UpdateStatus::Failed(message) => {
                let _ = log.send((LogLevel::Warning, format!("Update failed: {message}")));
            }
        };
        let outcome = self
            .updater
            .auto_update_if_needed(Some(&mut status_cb))
            .await;

        if !outcome.payload_ready {
            let err_state =
                AppState::Error("No workflow payload available; check your connection".into());
            self.state = err_state.clone();
            let _ = updates.send(err_state);
            error!("bootstrap: no payload available locally or remotely");
            return;
        }

        let _ = updates.send(AppState::PreparingWorkspace);
        let working_dir = env::working_dir();
        let result = payload::init_payload(
            self.updater.payload_path(),
            &working_dir,
            &self.config.key_bytes(),
        );
        match result {
            Ok(()) => {
                let version = self.updater.store().get_local_version();
                let ready = AppState::Ready {
                    version: version.clone(),
                };
                self.state = ready.clone();
                let _ = updates.send(ready);
                let _ = log.send((LogLevel::Success, "Workspace ready".into()));
                info!("bootstrap: workspace ready (version {version})");
            }
            Err(err) => {
                let message = format!("Failed to prepare workspace: {err}");
                let _ = log.send((LogLevel::Error, message.clone()));
                let err_state = AppState::Error(message);
                self.state = err_state.clone();
                let _ = updates.send(err_state);
                error!("bootstrap: workspace preparation failed: {err}");
            }
        }
    }

    pub async fn handle_action(
        &mut self,
        action: UserAction,
        updates: &mpsc::UnboundedSender<AppState>,
        log: &ServiceLogSender,
    ) {
        match action {
            UserAction::CheckForUpdates => {
                info!("action: CheckForUpdates");
                self.bootstrap(updates, log).await;
            }
            UserAction::StartService => {
                info!("action: StartService");
                match self.service.start(&self.config, log.clone()) {
                    Ok(pid) => {
                        let _ = log.send((
                            LogLevel::Success,
                            format!("Service started (pid {pid})"),
                        ));
                    }
                    Err(err) => {
                        warn!("start service failed: {err}");
                        let _ = log.send((LogLevel::Error, err));
                    }
                }
            }
            UserAction::StopService => {
                info!("action: StopService");
                match self.service.stop() {
                    Ok(()) => {
                        let _ = log.send((LogLevel::Success, "Service stopped".into()));
                    }
                    Err(err) => {
                        warn!("stop service failed: {err}");
                        let _ = log.send((LogLevel::Warning, err));
                    }
                }
            }
            UserAction::RestartService => {
                info!("action: RestartService");
                match self.service.restart(&self.config, log.clone()) {
                    Ok(pid) => {
                        let _ = log.send((
                            LogLevel::Success,
                            format!("Service restarted (pid {pid})"),
                        ));
                    }
                    Err(err) => {
                        warn!("restart service failed: {err}");
                        let _ = log.send((LogLevel::Error, err));
                    }
                }
            }
        }
    }
}
