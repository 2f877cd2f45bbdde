//! Where camwatch keeps its files.
//!
//! `config.toml` goes under the config directory; the saved login
//! (`session.json`) and the default `frames/` output go under the data
//! directory. Both honour the `XDG_*_HOME` variables and otherwise default to
//! the dot directories in `$HOME` on every platform.

use std::path::PathBuf;

const APP_DIR: &str = "camwatch";

/// `$<var>/camwatch`, or `<home>/<fallback>/camwatch` when the variable is unset.
fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    let base = match std::env::var_os(var) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .as_deref()
            .map_or_else(|| PathBuf::from(fallback), |home| home.join(fallback)),
    };
    base.join(APP_DIR)
}

/// Directory holding `config.toml`.
///
/// ```
/// let config = camwatch_paths::config_dir().join("config.toml");
/// assert!(config.ends_with("camwatch/config.toml"));
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Directory holding the saved login and captured frames
/// (`$XDG_DATA_HOME/camwatch`, else `~/.local/share/camwatch`).
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

/// File holding the persisted bearer token.
pub fn session_file() -> PathBuf {
    data_dir().join("session.json")
}

/// Default directory the file sink writes camera frames into.
pub fn frames_dir() -> PathBuf {
    data_dir().join("frames")
}
