use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{info, warn};
use sysinfo::{Pid, System};
use tokio::sync::mpsc::UnboundedSender;

use crate::config::PanelConfig;
use crate::logview::LogLevel;

/// Channel carrying captured service output into the panel log.
pub type ServiceLogSender = UnboundedSender<(LogLevel, String)>;

/// Owns the managed service process. Stopping actually terminates the
/// child and reaps it, so a stopped service releases its port and can be
/// restarted immediately.
#[derive(Clone, Default)]
pub struct ServiceController {
    child: Arc<Mutex<Option<Child>>>,
}

impl ServiceController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the configured service command with piped output. Errors if a
    /// service is already running.
    pub fn start(&self, config: &PanelConfig, log_tx: ServiceLogSender) -> Result<u32, String> {
        let mut guard = self
            .child
            .lock()
            .map_err(|_| "Service state lock poisoned".to_string())?;
        if let Some(child) = guard.as_mut() {
            match child.try_wait() {
                Ok(None) => return Err("Service is already running".to_string()),
                Ok(Some(_)) | Err(_) => {
                    *guard = None;
                }
            }
        }

        let mut command = Command::new(&config.service_command);
        command
            .args(&config.service_args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let mut child = command.spawn().map_err(|err| {
            format!(
                "Failed to start service `{}`: {err}",
                config.service_command
            )
        })?;
        let pid = child.id();

        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, LogLevel::Info, log_tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, LogLevel::Warning, log_tx);
        }

        info!("service: started `{}` (pid {pid})", config.service_command);
        *guard = Some(child);
        Ok(pid)
    }

    /// Kill the running service and reap it. No-op when nothing runs.
    pub fn stop(&self) -> Result<(), String> {
        let mut guard = self
            .child
            .lock()
            .map_err(|_| "Service state lock poisoned".to_string())?;
        let Some(mut child) = guard.take() else {
            return Err("Service is not running".to_string());
        };
        let pid = child.id();
        if let Err(err) = child.kill() {
            // Already exited on its own; still reap below.
            warn!("service: kill pid {pid} failed: {err}");
        }
        match child.wait() {
            Ok(status) => info!("service: pid {pid} stopped ({status})"),
            Err(err) => warn!("service: wait for pid {pid} failed: {err}"),
        }
        Ok(())
    }

    pub fn restart(&self, config: &PanelConfig, log_tx: ServiceLogSender) -> Result<u32, String> {
        if self.is_running() {
            self.stop()?;
        }
        self.start(config, log_tx)
    }

    /// Reaps the child if it has exited since the last call.
    pub fn is_running(&self) -> bool {
        let Ok(mut guard) = self.child.lock() else {
            return false;
        };
        match guard.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(_)) | Err(_) => {
                    *guard = None;
                    false
                }
            },
            None => false,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        let guard = self.child.lock().ok()?;
        guard.as_ref().map(|child| child.id())
    }

    /// Resident memory of the service process in MiB, if it is running.
    pub fn memory_usage_mb(&self) -> Option<u64> {
        let pid = Pid::from_u32(self.pid()?);
        let mut system = System::new();
        if !system.refresh_process(pid) {
            return None;
        }
        system.process(pid).map(|proc| proc.memory() / 1024 / 1024)
    }
}

fn spawn_reader<R: std::io::Read + Send + 'static>(
    stream: R,
    level: LogLevel,
    tx: ServiceLogSender,
) {
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.send((level, line)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wait_until_stopped(controller: &ServiceController) {
        for _ in 0..100 {
            if !controller.is_running() {
                return;
            }
            thread::sleep(Duration::from_millis(50));
        }
        panic!("service did not exit in time");
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_lines() {
        let controller = ServiceController::new();
        let config = PanelConfig {
            service_command: "echo".to_string(),
            service_args: vec!["hello panel".to_string()],
            ..PanelConfig::default()
        };
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        controller.start(&config, tx).unwrap();
        wait_until_stopped(&controller);

        // Reader threads may lag the process exit briefly.
        let mut lines = Vec::new();
        for _ in 0..100 {
            while let Ok((level, line)) = rx.try_recv() {
                lines.push((level, line));
            }
            if !lines.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        assert!(lines
            .iter()
            .any(|(level, line)| *level == LogLevel::Info && line == "hello panel"));
    }

    #[cfg(unix)]
    #[test]
    fn stop_terminates_long_running_service() {
        let controller = ServiceController::new();
        let config = PanelConfig {
            service_command: "sleep".to_string(),
            service_args: vec!["30".to_string()],
            ..PanelConfig::default()
        };
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let pid = controller.start(&config, tx).unwrap();
        assert!(pid > 0);
        assert!(controller.is_running());

        controller.stop().unwrap();
        assert!(!controller.is_running());
        assert!(controller.pid().is_none());
    }

    #[test]
    fn stop_without_service_errors() {
        let controller = ServiceController::new();
        assert!(controller.stop().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn double_start_is_rejected() {
        let controller = ServiceController::new();
        let config = PanelConfig {
            service_command: "sleep".to_string(),
            service_args: vec!["30".to_string()],
            ..PanelConfig::default()
        };
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        controller.start(&config, tx.clone()).unwrap();
        assert!(controller.start(&config, tx).is_err());
        controller.stop().unwrap();
    }
}
