//! Throwaway Chrome profile with download preferences baked in.
//!
//! Some file handling (opening PDFs externally instead of in the built-in
//! viewer) is a profile preference that the DevTools protocol cannot set,
//! so launched browsers start from a fresh profile directory whose
//! `Default/Preferences` already carries it.

use std::path::Path;

use serde_json::json;

/// Preferences written into a fresh profile.
pub fn download_preferences(download_dir: &Path) -> serde_json::Value {
    json!({
        "download": {
            "default_directory": download_dir.to_string_lossy(),
            "prompt_for_download": false,
            "directory_upgrade": true,
        },
        "plugins": {
            "always_open_pdf_externally": true,
        },
    })
}

/// Write `Default/Preferences` under `profile_dir`.
pub fn write_profile(profile_dir: &Path, download_dir: &Path) -> std::io::Result<()> {
    let default_dir = profile_dir.join("Default");
    std::fs::create_dir_all(&default_dir)?;
    let prefs = serde_json::to_vec_pretty(&download_preferences(download_dir))?;
    std::fs::write(default_dir.join("Preferences"), prefs)
}
