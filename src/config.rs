use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Deriv account credentials. Supplied by the caller (arguments or
/// environment); never stored, never defaulted.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OAuth application id appended to the authorize URL.
    pub app_id: String,
    /// Base of the OAuth authorize endpoint.
    pub oauth_base_url: String,
    /// The API-token management page.
    pub token_page_url: String,
    /// Host suffix that signals the OAuth redirect landed back on Deriv.
    pub redirect_host: String,
    /// Where the result file is written on success.
    pub output_path: PathBuf,
    pub viewport: ViewportConfig,
    pub timeouts: Timeouts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

/// Per-operation wait ceilings, in milliseconds.
///
/// These bound readiness polls; a page that settles early moves on early.
/// The values mirror what the live pages have needed in practice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub page_settle_ms: u64,
    pub email_wait_ms: u64,
    pub password_wait_ms: u64,
    pub submit_wait_ms: u64,
    pub redirect_wait_ms: u64,
    pub nav_settle_ms: u64,
    pub scope_pace_ms: u64,
    pub scope_settle_ms: u64,
    pub create_pace_ms: u64,
    pub create_settle_ms: u64,
    pub reveal_settle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: "36544".to_string(),
            oauth_base_url: "https://oauth.deriv.com/oauth2/authorize".to_string(),
            token_page_url: "https://app.deriv.com/account/api-token".to_string(),
            redirect_host: "deriv.com".to_string(),
            output_path: PathBuf::from("generated_token.txt"),
            viewport: ViewportConfig::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 900,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_settle_ms: 3_000,
            email_wait_ms: 10_000,
            password_wait_ms: 5_000,
            submit_wait_ms: 5_000,
            redirect_wait_ms: 30_000,
            nav_settle_ms: 5_000,
            scope_pace_ms: 500,
            scope_settle_ms: 1_000,
            create_pace_ms: 1_000,
            create_settle_ms: 3_000,
            reveal_settle_ms: 2_000,
        }
    }
}

impl Config {
    /// Load configuration. An explicit path must exist; otherwise the
    /// default location is used if present, and built-in defaults if not.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let (config_path, required) = match path {
            Some(p) => (p, true),
            None => (Self::default_path(), false),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", config_path.display()))?;
            Ok(config)
        } else if required {
            anyhow::bail!("config file not found: {}", config_path.display());
        } else {
            Ok(Config::default())
        }
    }

    fn default_path() -> PathBuf {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home_dir.join(".deriv-tokgen").join("config.toml")
    }

    /// The full OAuth authorize URL for this run.
    pub fn oauth_authorize_url(&self) -> String {
        format!("{}?app_id={}&l=en&route=%2F", self.oauth_base_url, self.app_id)
    }
}

impl Timeouts {
    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }
    pub fn email_wait(&self) -> Duration {
        Duration::from_millis(self.email_wait_ms)
    }
    pub fn password_wait(&self) -> Duration {
        Duration::from_millis(self.password_wait_ms)
    }
    pub fn submit_wait(&self) -> Duration {
        Duration::from_millis(self.submit_wait_ms)
    }
    pub fn redirect_wait(&self) -> Duration {
        Duration::from_millis(self.redirect_wait_ms)
    }
    pub fn nav_settle(&self) -> Duration {
        Duration::from_millis(self.nav_settle_ms)
    }
    pub fn scope_pace(&self) -> Duration {
        Duration::from_millis(self.scope_pace_ms)
    }
    pub fn scope_settle(&self) -> Duration {
        Duration::from_millis(self.scope_settle_ms)
    }
    pub fn create_pace(&self) -> Duration {
        Duration::from_millis(self.create_pace_ms)
    }
    pub fn create_settle(&self) -> Duration {
        Duration::from_millis(self.create_settle_ms)
    }
    pub fn reveal_settle(&self) -> Duration {
        Duration::from_millis(self.reveal_settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_point_at_deriv() {
        let config = Config::default();
        assert!(config.oauth_authorize_url().starts_with("https://oauth.deriv.com/"));
        assert!(config.oauth_authorize_url().contains("app_id=36544"));
        assert_eq!(config.output_path, PathBuf::from("generated_token.txt"));
        assert_eq!(config.viewport.width, 1280);
        assert_eq!(config.timeouts.redirect_wait(), Duration::from_secs(30));
    }

    #[test]
    fn partial_config_file_keeps_defaults_elsewhere() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "app_id = \"99999\"\n\n[timeouts]\nredirect_wait_ms = 1000").unwrap();

        let config = Config::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.app_id, "99999");
        assert_eq!(config.timeouts.redirect_wait_ms, 1_000);
        // Untouched sections fall back to defaults.
        assert_eq!(config.timeouts.email_wait_ms, 10_000);
        assert_eq!(config.token_page_url, "https://app.deriv.com/account/api-token");
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let err = Config::load(Some(PathBuf::from("/nonexistent/tokgen.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
