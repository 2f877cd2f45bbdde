use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::types::{
    CamwatchConfig, DEFAULT_REDIRECT_DELAY_MS, DEFAULT_SERVER_URL, OutputConfig, RawCamwatchConfig,
    RawOutputConfig, RawServerConfig, RawSessionSection, ServerConfig, SessionSection,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<CamwatchConfig> {
        Self::load_layers(&Self::user_config_path(), &Self::project_config_path())
    }

    /// Load and merge the given config files, skipping any that don't exist
    pub fn load_layers(user_path: &Path, project_path: &Path) -> Result<CamwatchConfig> {
        let mut raw = RawCamwatchConfig::default();

        // Layer 1: User config
        if let Some(user_config) = Self::read_raw(user_path)? {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read_raw(project_path)? {
            raw = Self::merge_raw(raw, project_config);
        }

        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<Option<RawCamwatchConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(Some(raw))
    }

    /// User config path (`$XDG_CONFIG_HOME/camwatch/config.toml`)
    pub fn user_config_path() -> PathBuf {
        camwatch_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with CAMWATCH_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("CAMWATCH_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".camwatch/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawCamwatchConfig, overlay: RawCamwatchConfig) -> RawCamwatchConfig {
        RawCamwatchConfig {
            server: RawServerConfig {
                url: overlay.server.url.or(base.server.url),
            },
            session: RawSessionSection {
                redirect_delay_ms: overlay
                    .session
                    .redirect_delay_ms
                    .or(base.session.redirect_delay_ms),
                reserved_cameras: overlay
                    .session
                    .reserved_cameras
                    .or(base.session.reserved_cameras),
                cancel_siblings_on_invalid: overlay
                    .session
                    .cancel_siblings_on_invalid
                    .or(base.session.cancel_siblings_on_invalid),
            },
            output: RawOutputConfig {
                dir: overlay.output.dir.or(base.output.dir),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawCamwatchConfig) -> CamwatchConfig {
        let session_defaults = SessionSection::default();
        CamwatchConfig {
            server: ServerConfig {
                url: raw
                    .server
                    .url
                    .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            },
            session: SessionSection {
                redirect_delay_ms: raw
                    .session
                    .redirect_delay_ms
                    .unwrap_or(DEFAULT_REDIRECT_DELAY_MS),
                reserved_cameras: raw
                    .session
                    .reserved_cameras
                    .unwrap_or(session_defaults.reserved_cameras),
                cancel_siblings_on_invalid: raw
                    .session
                    .cancel_siblings_on_invalid
                    .unwrap_or(session_defaults.cancel_siblings_on_invalid),
            },
            output: match raw.output.dir {
                Some(dir) => OutputConfig { dir },
                None => OutputConfig::default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();

        let config = ConfigLoader::load_layers(
            &temp_dir.path().join("user.toml"),
            &temp_dir.path().join("project.toml"),
        )
        .unwrap();

        assert_eq!(config.server.url, DEFAULT_SERVER_URL);
        assert_eq!(config.session.redirect_delay_ms, 3000);
    }

    #[test]
    fn test_project_overrides_user() {
        let temp_dir = TempDir::new().unwrap();
        let user = write(
            &temp_dir,
            "user.toml",
            r#"
[server]
url = "http://user:4000"

[session]
redirect_delay_ms = 1000
reserved_cameras = [5]
"#,
        );
        let project = write(
            &temp_dir,
            "project.toml",
            r#"
[server]
url = "http://project:4000"
"#,
        );

        let config = ConfigLoader::load_layers(&user, &project).unwrap();

        assert_eq!(config.server.url, "http://project:4000");
        // Values the project leaves unset fall through to the user layer
        assert_eq!(config.session.redirect_delay_ms, 1000);
        assert_eq!(config.session.reserved_cameras, vec![5]);
        assert!(config.session.cancel_siblings_on_invalid);
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let user = write(&temp_dir, "user.toml", "this is not valid toml {{{{");

        let result = ConfigLoader::load_layers(&user, &temp_dir.path().join("missing.toml"));

        assert!(result.is_err());
    }

    #[test]
    fn test_merge_raw_none_preserves_base() {
        let base = RawCamwatchConfig {
            server: RawServerConfig {
                url: Some("http://base".to_string()),
            },
            session: RawSessionSection {
                redirect_delay_ms: Some(10),
                reserved_cameras: Some(vec![3]),
                cancel_siblings_on_invalid: Some(false),
            },
            output: RawOutputConfig {
                dir: Some(PathBuf::from("/base")),
            },
        };

        let merged = ConfigLoader::merge_raw(base, RawCamwatchConfig::default());

        assert_eq!(merged.server.url, Some("http://base".to_string()));
        assert_eq!(merged.session.redirect_delay_ms, Some(10));
        assert_eq!(merged.session.reserved_cameras, Some(vec![3]));
        assert_eq!(merged.session.cancel_siblings_on_invalid, Some(false));
        assert_eq!(merged.output.dir, Some(PathBuf::from("/base")));
    }

    #[test]
    fn test_user_config_path() {
        let path = ConfigLoader::user_config_path();
        assert!(path.to_string_lossy().contains("camwatch"));
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn test_project_config_path() {
        // SAFETY: Test runs single-threaded for env var manipulation
        unsafe { std::env::remove_var("CAMWATCH_PROJECT_CONFIG_DIR") };
        let path = ConfigLoader::project_config_path();
        assert_eq!(path, PathBuf::from(".camwatch/config.toml"));
    }
}
