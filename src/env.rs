use std::env;
use std::fs;
use std::path::PathBuf;

/// Returns the root directory used by the panel for its own files
/// (config, logs, version cache, downloaded payload).
pub fn default_app_dir() -> PathBuf {
    let base = match env::consts::OS {
        "windows" => env::var_os("LOCALAPPDATA")
            .or_else(|| env::var_os("APPDATA"))
            .map(PathBuf::from),
        "macos" => env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join("Library").join("Application Support")),
        _ => env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join(".local").join("share")),
    }
    .unwrap_or_else(|| PathBuf::from("."));

    base.join("hueying-panel")
}

/// Working directory that receives the extracted payload contents.
/// Lives under the user temp dir and is treated as a cache: repopulated
/// whenever it is missing or empty.
pub fn working_dir() -> PathBuf {
    env::temp_dir().join("HueyingAI_temp_root")
}

pub fn version_file() -> PathBuf {
    default_app_dir().join("version.txt")
}

pub fn payload_file() -> PathBuf {
    default_app_dir().join("payload.b64")
}

pub fn config_file() -> PathBuf {
    default_app_dir().join("panel_config.json")
}

pub fn log_file() -> PathBuf {
    default_app_dir().join("panel_logs.txt")
}

/// Folder the service writes generated images into.
pub fn output_dir() -> PathBuf {
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("comfyui")
        .join("output")
}

/// Create the on-disk folder layout expected by the panel.
pub fn ensure_base_dirs() -> std::io::Result<()> {
    fs::create_dir_all(default_app_dir())
}

/// Delete generated images under the output folder. Returns how many
/// files were removed; individual failures are skipped.
pub fn clear_output_images() -> usize {
    let dir = output_dir();
    if !dir.exists() {
        return 0;
    }
    let mut removed = 0usize;
    for entry in walkdir::WalkDir::new(&dir).into_iter().flatten() {
        if entry.file_type().is_file() && fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_dir_lives_under_temp() {
        assert!(working_dir().starts_with(env::temp_dir()));
    }

    #[test]
    fn panel_files_live_under_app_dir() {
        let root = default_app_dir();
        assert!(version_file().starts_with(&root));
        assert!(payload_file().starts_with(&root));
        assert!(config_file().starts_with(&root));
        assert!(log_file().starts_with(&root));
    }
}
