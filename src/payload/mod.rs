use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use log::{debug, info, warn};
use zip::read::ZipArchive;

use crate::crypto;
use crate::error::{PayloadError, Result};

const STAGING_DIR_NAME: &str = ".payload_tmp";
const PAYLOAD_ROOT_ENTRY: &str = "payload";
const MARKER_NAMES: [&str; 2] = ["workflows", "workflow_mappings.json"];

// Staging directories queued for best-effort deletion when the process
// exits. Not guaranteed if the process is killed; stale staging dirs are
// cleared again on the next extraction.
static PENDING_CLEANUP: OnceLock<Mutex<Vec<PathBuf>>> = OnceLock::new();

fn schedule_cleanup(path: PathBuf) {
    let pending = PENDING_CLEANUP.get_or_init(|| Mutex::new(Vec::new()));
    if let Ok(mut list) = pending.lock() {
        list.push(path);
    }
}

/// Remove every staging directory scheduled during this run.
pub fn run_exit_cleanup() {
    let Some(pending) = PENDING_CLEANUP.get() else {
        return;
    };
    let Ok(mut list) = pending.lock() else {
        return;
    };
    for path in list.drain(..) {
        if let Err(err) = fs::remove_dir_all(&path) {
            if path.exists() {
                warn!("payload: failed to clean staging dir {}: {err}", path.display());
            }
        }
    }
}

/// Populate the working directory from the local payload file if it is
/// missing or empty. The working directory is a cache: once populated it
/// persists across runs until manually cleared.
pub fn init_payload(payload_file: &Path, working_dir: &Path, key: &[u8]) -> Result<()> {
    if working_dir.exists() && !dir_is_empty(working_dir) {
        debug!(
            "payload: working dir {} already populated",
            working_dir.display()
        );
        return Ok(());
    }
    if !payload_file.exists() {
        return Err(PayloadError::InvalidPayload(format!(
            "no local payload file at {}",
            payload_file.display()
        )));
    }
    info!("payload: first load, extracting {}", payload_file.display());
    extract_payload(payload_file, working_dir, key)
}

/// Decrypt and unpack the payload archive into `working_dir`.
///
/// Extraction goes through an isolated staging subdirectory so a failed
/// attempt can never be mistaken for a previous successful one. The
/// effective payload root is `payload/` when the archive carries that
/// wrapper, otherwise the archive root itself. The top-level listing must
/// contain one of the marker entries (`workflows`,
/// `workflow_mappings.json`) or extraction fails with a distinct
/// "no recognizable payload" error.
pub fn extract_payload(payload_file: &Path, working_dir: &Path, key: &[u8]) -> Result<()> {
    let raw = fs::read(payload_file)?;
    let blob = crypto::decode_blob(&raw)?;
    let plaintext = crypto::decrypt(&blob, key)?;
    let mut archive = crypto::open_archive(plaintext)?;
    debug!(
        "payload: archive entries: {:?}",
        archive.file_names().collect::<Vec<_>>()
    );

    let staging = working_dir.join(STAGING_DIR_NAME);
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    extract_zip(&mut archive, &staging)?;

    let top_level = top_level_names(&staging)?;
    let payload_root = if top_level.iter().any(|name| name == PAYLOAD_ROOT_ENTRY)
        && staging.join(PAYLOAD_ROOT_ENTRY).is_dir()
    {
        staging.join(PAYLOAD_ROOT_ENTRY)
    } else {
        info!("payload: no `payload` folder detected, using archive root");
        staging.clone()
    };

    if !top_level
        .iter()
        .any(|name| MARKER_NAMES.contains(&name.as_str()))
    {
        // Tear the staging dir down right away so the residue cannot be
        // mistaken for a populated workspace on the next launch.
        if let Err(err) = fs::remove_dir_all(&staging) {
            warn!(
                "payload: failed to remove staging dir {}: {err}",
                staging.display()
            );
        }
        return Err(PayloadError::MissingMarker);
    }

    fs::create_dir_all(working_dir)?;
    for entry in fs::read_dir(&payload_root)? {
        let entry = entry?;
        let src = entry.path();
        let dst = working_dir.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_over(&src, &dst)?;
        } else {
            fs::copy(&src, &dst)?;
        }
    }

    schedule_cleanup(staging);
    info!("payload: extracted into {}", working_dir.display());
    Ok(())
}

fn extract_zip<R: io::Read + io::Seek>(archive: &mut ZipArchive<R>, dest: &Path) -> Result<()> {
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("payload: skipping unsafe archive entry {:?}", entry.name());
            continue;
        };
        let out_path = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = fs::File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file)?;
    }
    Ok(())
}

/// Recursive overwrite-merge of `from` into `to`; existing files with the
/// same name are replaced, unrelated files in `to` are left alone.
fn copy_dir_over(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let src = entry.path();
        let dst = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_over(&src, &dst)?;
        } else {
            fs::copy(&src, &dst)?;
        }
    }
    Ok(())
}

fn top_level_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

// A staging dir left over from an interrupted extraction is not content.
fn dir_is_empty(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(entries) => !entries
            .flatten()
            .any(|entry| entry.file_name() != STAGING_DIR_NAME),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_missing_dirs_count_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(dir_is_empty(tmp.path()));
        assert!(dir_is_empty(&tmp.path().join("does-not-exist")));
        fs::write(tmp.path().join("file"), b"x").unwrap();
        assert!(!dir_is_empty(tmp.path()));
    }

    #[test]
    fn staging_leftovers_do_not_count_as_content() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(STAGING_DIR_NAME).join("sub")).unwrap();
        assert!(dir_is_empty(tmp.path()));
    }

    #[test]
    fn exit_cleanup_removes_scheduled_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = tmp.path().join(".payload_tmp");
        fs::create_dir_all(staging.join("sub")).unwrap();
        schedule_cleanup(staging.clone());
        run_exit_cleanup();
        assert!(!staging.exists());
    }

    #[test]
    fn overwrite_merge_replaces_and_preserves() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tmp.path().join("from");
        let to = tmp.path().join("to");
        fs::create_dir_all(from.join("nested")).unwrap();
        fs::create_dir_all(&to).unwrap();
        fs::write(from.join("nested").join("a.txt"), b"new").unwrap();
        fs::create_dir_all(to.join("nested")).unwrap();
        fs::write(to.join("nested").join("a.txt"), b"old").unwrap();
        fs::write(to.join("keep.txt"), b"keep").unwrap();

        copy_dir_over(&from, &to).unwrap();

        assert_eq!(fs::read(to.join("nested").join("a.txt")).unwrap(), b"new");
        assert_eq!(fs::read(to.join("keep.txt")).unwrap(), b"keep");
    }
}
