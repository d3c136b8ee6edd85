use std::cmp::Ordering;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::PanelConfig;
use crate::crypto;
use crate::env;

pub mod store;

pub use store::VersionStore;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Progress of a single update check, surfaced to the UI as status text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    Checking,
    UpToDate,
    Downloading,
    Updated { version: String },
    Failed(String),
}

/// Result of [`Updater::auto_update_if_needed`]. `payload_ready` is the
/// single external contract: a usable local payload file exists after the
/// check, whatever happened on the network.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub status: UpdateStatus,
    pub payload_ready: bool,
}

pub type StatusCallback<'a> = Option<&'a mut (dyn FnMut(UpdateStatus) + Send)>;

fn emit_status(cb: &mut StatusCallback<'_>, status: UpdateStatus) {
    if let Some(callback) = cb.as_deref_mut() {
        callback(status);
    }
}

/// How two version markers are ordered when deciding "is remote newer".
///
/// `Lexical` reproduces the historical plain string comparison, which
/// misorders multi-digit numeric segments ("9" sorts after "10").
/// `Numeric` compares dotted segments as numbers instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionOrdering {
    #[default]
    Lexical,
    Numeric,
}

impl VersionOrdering {
    pub fn is_newer(self, local: &str, remote: &str) -> bool {
        match self {
            VersionOrdering::Lexical => local < remote,
            VersionOrdering::Numeric => compare_numeric(local, remote) == Ordering::Less,
        }
    }
}

/// Parse a dotted version into numeric segments ("2024.01.1" -> [2024, 1, 1]).
fn version_parts(version: &str) -> Vec<u32> {
    version
        .split('.')
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .collect()
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let parts_a = version_parts(a);
    let parts_b = version_parts(b);
    let max_len = parts_a.len().max(parts_b.len());
    for i in 0..max_len {
        let a_part = parts_a.get(i).copied().unwrap_or(0);
        let b_part = parts_b.get(i).copied().unwrap_or(0);
        match a_part.cmp(&b_part) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

pub struct Updater {
    client: Client,
    store: VersionStore,
    payload_path: PathBuf,
    version_url: String,
    payload_url: String,
    key: Vec<u8>,
    ordering: VersionOrdering,
}

impl Updater {
    pub fn new(config: &PanelConfig) -> Self {
        Self::with_paths(config, VersionStore::default(), env::payload_file())
    }

    pub fn with_paths(config: &PanelConfig, store: VersionStore, payload_path: PathBuf) -> Self {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|err| {
                warn!("updater: falling back to default HTTP client configuration ({err})");
                Client::new()
            });
        Self {
            client,
            store,
            payload_path,
            version_url: config.version_url(),
            payload_url: config.payload_url(),
            key: config.key_bytes(),
            ordering: config.version_ordering,
        }
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    pub fn payload_path(&self) -> &std::path::Path {
        &self.payload_path
    }

    /// GET the remote version marker. Any failure (timeout, non-200,
    /// body error) is logged and reported as `None`, never raised.
    pub async fn fetch_remote_version(&self) -> Option<String> {
        match self.client.get(&self.version_url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => Some(body.trim().to_owned()),
                Err(err) => {
                    warn!("updater: failed to read remote version body: {err}");
                    None
                }
            },
            Ok(resp) => {
                warn!("updater: remote version returned status {}", resp.status());
                None
            }
            Err(err) => {
                warn!("updater: remote version request failed: {err}");
                None
            }
        }
    }

    /// Decrypt a candidate payload and check the embedded `version.txt`
    /// marker against `expected`. Returns false on any decode or format
    /// error rather than propagating; the caller just refuses the blob.
    pub fn verify_payload(&self, raw: &[u8], expected: &str) -> bool {
        match self.verify_payload_inner(raw, expected) {
            Ok(matched) => matched,
            Err(err) => {
                warn!("updater: payload verification failed: {err}");
                false
            }
        }
    }

    fn verify_payload_inner(
        &self,
        raw: &[u8],
        expected: &str,
    ) -> crate::error::Result<bool> {
        let blob = crypto::decode_blob(raw)?;
        let plaintext = crypto::decrypt(&blob, &self.key)?;
        let mut archive = crypto::open_archive(plaintext)?;
        for i in 0..archive.len() {
            let name_matches = archive
                .by_index(i)
                .map(|entry| entry.name().ends_with("version.txt"))?;
            if !name_matches {
                continue;
            }
            let mut entry = archive.by_index(i)?;
            let mut found = String::new();
            entry.read_to_string(&mut found)?;
            return Ok(found.trim() == expected);
        }
        Ok(false)
    }

    /// Download the payload blob for `expected_version`, verify it, and
    /// only then persist it together with the version marker. The local
    /// payload file is never overwritten by a blob that fails
    /// verification.
    pub async fn download_payload(&self, expected_version: &str) -> bool {
        let resp = match self.client.get(&self.payload_url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                warn!("updater: payload request failed: {err}");
                return false;
            }
        };
        if !resp.status().is_success() {
            warn!("updater: payload download returned status {}", resp.status());
            return false;
        }

        let total = resp.content_length();
        let mut raw: Vec<u8> = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => raw.extend_from_slice(&chunk),
                Err(err) => {
                    warn!("updater: payload stream error: {err}");
                    return false;
                }
            }
        }
        debug!(
            "updater: fetched payload blob ({} bytes, expected {:?})",
            raw.len(),
            total
        );

        if !self.verify_payload(&raw, expected_version) {
            warn!("updater: downloaded payload did not verify; keeping local copy");
            return false;
        }

        if let Some(parent) = self.payload_path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("updater: unable to create payload dir: {err}");
                return false;
            }
        }
        if let Err(err) = fs::write(&self.payload_path, &raw) {
            warn!("updater: unable to persist payload: {err}");
            return false;
        }
        self.store.write_local_version(expected_version);
        info!("updater: payload updated to version {expected_version}");
        true
    }

    /// Check the remote version and refresh the payload if needed.
    ///
    /// An unreachable update server is not fatal: when a local payload
    /// already exists the panel keeps running with it. A failed download
    /// likewise falls back to whatever is on disk.
    pub async fn auto_update_if_needed(
        &self,
        mut status: StatusCallback<'_>,
    ) -> UpdateOutcome {
        emit_status(&mut status, UpdateStatus::Checking);
        let local_version = self.store.get_local_version();
        info!(
            "updater: local version {:?}",
            if local_version.is_empty() {
                "<none>"
            } else {
                local_version.as_str()
            }
        );

        let remote_version = match self.fetch_remote_version().await {
            Some(version) => version,
            None => {
                let payload_ready = self.payload_path.exists();
                let failure = UpdateStatus::Failed("update server unreachable".into());
                emit_status(&mut status, failure.clone());
                return UpdateOutcome {
                    status: failure,
                    payload_ready,
                };
            }
        };

        let status_result =
            if local_version.is_empty() || self.ordering.is_newer(&local_version, &remote_version) {
                info!("updater: new version {remote_version} detected, downloading");
                emit_status(&mut status, UpdateStatus::Downloading);
                if self.download_payload(&remote_version).await {
                    UpdateStatus::Updated {
                        version: remote_version,
                    }
                } else {
                    warn!("updater: update failed, continuing with local payload");
                    UpdateStatus::Failed("payload download or verification failed".into())
                }
            } else {
                info!("updater: already on the latest version");
                UpdateStatus::UpToDate
            };

        emit_status(&mut status, status_result.clone());
        UpdateOutcome {
            status: status_result,
            payload_ready: self.payload_path.exists(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::*;

    const KEY: &[u8; 16] = b"1234567890abcdef";

    fn build_payload_text(version: Option<&str>) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.add_directory("workflows/", opts).unwrap();
        writer.start_file("workflows/basic.json", opts).unwrap();
        writer.write_all(b"{}").unwrap();
        if let Some(version) = version {
            writer.start_file("version.txt", opts).unwrap();
            writer.write_all(version.as_bytes()).unwrap();
        }
        let plaintext = writer.finish().unwrap().into_inner();
        let blob = crypto::encrypt(&plaintext, KEY, &[9u8; 16]).unwrap();
        BASE64.encode(blob).into_bytes()
    }

    fn test_updater() -> Updater {
        let tmp = std::env::temp_dir();
        Updater::with_paths(
            &PanelConfig::default(),
            VersionStore::new(tmp.join("hueying-updater-test-version.txt")),
            tmp.join("hueying-updater-test-payload.b64"),
        )
    }

    #[test]
    fn lexical_ordering_misorders_multi_digit_segments() {
        // Documented defect of the historical comparison: "9" sorts
        // after "10", so the update is skipped.
        assert!(!VersionOrdering::Lexical.is_newer("9", "10"));
        assert!(VersionOrdering::Numeric.is_newer("9", "10"));
    }

    #[test]
    fn lexical_ordering_matches_string_comparison() {
        assert!(VersionOrdering::Lexical.is_newer("2024.01.01", "2024.01.02"));
        assert!(!VersionOrdering::Lexical.is_newer("2024.01.02", "2024.01.02"));
        assert!(VersionOrdering::Lexical.is_newer("", "2024.01.01"));
    }

    #[test]
    fn numeric_ordering_compares_segments() {
        assert!(VersionOrdering::Numeric.is_newer("2024.1.9", "2024.1.10"));
        assert!(!VersionOrdering::Numeric.is_newer("2024.2", "2024.1.10"));
        assert!(!VersionOrdering::Numeric.is_newer("1.2", "1.2.0"));
        assert!(VersionOrdering::Numeric.is_newer("", "0.1"));
    }

    #[test]
    fn parses_version_segments() {
        assert_eq!(version_parts("2024.01.01"), vec![2024, 1, 1]);
        assert_eq!(version_parts("10.0"), vec![10, 0]);
        assert_eq!(version_parts("not-a-version"), Vec::<u32>::new());
    }

    #[test]
    fn verify_accepts_exact_version_match() {
        let updater = test_updater();
        let raw = build_payload_text(Some("2024.01.01"));
        assert!(updater.verify_payload(&raw, "2024.01.01"));
    }

    #[test]
    fn verify_rejects_version_mismatch() {
        let updater = test_updater();
        let raw = build_payload_text(Some("2024.01.01"));
        assert!(!updater.verify_payload(&raw, "2024.01.02"));
    }

    #[test]
    fn verify_rejects_archive_without_version_marker() {
        let updater = test_updater();
        let raw = build_payload_text(None);
        assert!(!updater.verify_payload(&raw, "2024.01.01"));
    }

    #[test]
    fn verify_rejects_garbage() {
        let updater = test_updater();
        assert!(!updater.verify_payload(b"definitely not base64!!", "1"));
        let truncated = BASE64.encode([0u8; 8]);
        assert!(!updater.verify_payload(truncated.as_bytes(), "1"));
    }
}
