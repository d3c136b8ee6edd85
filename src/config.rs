use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::env;
use crate::updater::VersionOrdering;

/// Panel settings, loaded once at startup and passed to the components
/// that need them. Stored as a flat JSON file; unknown or missing keys
/// fall back to defaults so old config files keep working.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub window_width: f32,
    pub window_height: f32,
    pub theme: String,
    pub font_size: f32,
    pub auto_save_logs: bool,
    /// Web UI served by the local service.
    pub web_url: String,
    /// Base URL hosting `version.txt` and `payload.b64`.
    pub update_base_url: String,
    /// Symmetric payload key. The built-in default matches the one baked
    /// into distributed builds; shipping a key this way is obfuscation,
    /// not confidentiality, which is why it stays overridable here.
    pub payload_key: String,
    pub version_ordering: VersionOrdering,
    pub service_command: String,
    pub service_args: Vec<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            window_width: 1200.0,
            window_height: 800.0,
            theme: "dark".into(),
            font_size: 13.0,
            auto_save_logs: true,
            web_url: "http://127.0.0.1:8188".into(),
            update_base_url:
                "https://pub-35bf041400df49f594c852a1ca8489db.r2.dev/hueying-workflows-update"
                    .into(),
            payload_key: "1234567890abcdef".into(),
            version_ordering: VersionOrdering::Lexical,
            service_command: "python".into(),
            service_args: vec!["comfyui/main.py".into()],
        }
    }
}

impl PanelConfig {
    /// Load the panel configuration, treating any read or parse failure
    /// as "no config yet".
    pub fn load() -> Self {
        Self::load_from(&env::config_file())
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!("config: failed to parse {} ({err}); using defaults", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist the configuration. Failures are reported to the caller,
    /// which treats them as non-fatal.
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&env::config_file())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("unable to create config dir: {e}"))?;
        }
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| format!("unable to serialize config: {e}"))?;
        fs::write(path, raw).map_err(|e| format!("unable to persist config: {e}"))
    }

    pub fn key_bytes(&self) -> Vec<u8> {
        self.payload_key.as_bytes().to_vec()
    }

    pub fn version_url(&self) -> String {
        format!("{}/version.txt", self.update_base_url.trim_end_matches('/'))
    }

    pub fn payload_url(&self) -> String {
        format!("{}/payload.b64", self.update_base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = PanelConfig::load_from(&tmp.path().join("panel_config.json"));
        assert_eq!(cfg.web_url, "http://127.0.0.1:8188");
        assert_eq!(cfg.version_ordering, VersionOrdering::Lexical);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("panel_config.json");
        std::fs::write(&path, r#"{"theme":"light","font_size":15.0}"#).unwrap();
        let cfg = PanelConfig::load_from(&path);
        assert_eq!(cfg.theme, "light");
        assert_eq!(cfg.font_size, 15.0);
        assert!(cfg.auto_save_logs);
        assert_eq!(cfg.payload_key, "1234567890abcdef");
    }

    #[test]
    fn save_then_load_roundtrips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("panel_config.json");
        let mut cfg = PanelConfig::default();
        cfg.version_ordering = VersionOrdering::Numeric;
        cfg.web_url = "http://127.0.0.1:8190".into();
        cfg.save_to(&path).unwrap();
        let loaded = PanelConfig::load_from(&path);
        assert_eq!(loaded.version_ordering, VersionOrdering::Numeric);
        assert_eq!(loaded.web_url, "http://127.0.0.1:8190");
    }

    #[test]
    fn url_helpers_handle_trailing_slash() {
        let mut cfg = PanelConfig::default();
        cfg.update_base_url = "https://updates.example/x/".into();
        assert_eq!(cfg.version_url(), "https://updates.example/x/version.txt");
        assert_eq!(cfg.payload_url(), "https://updates.example/x/payload.b64");
    }
}
