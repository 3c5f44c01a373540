use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Top-level configuration for the monitor, sourced from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sites_file: PathBuf,
    pub state_file: PathBuf,
    pub renderer: RendererConfig,
    pub telegram: TelegramConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let sites_file =
            PathBuf::from(env::var("SITES_FILE").unwrap_or_else(|_| "sites.json".to_string()));
        let state_file =
            PathBuf::from(env::var("STATE_FILE").unwrap_or_else(|_| "state.json".to_string()));

        let user_agent =
            env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        let wait_raw = env::var("WAIT_SEC").unwrap_or_else(|_| "20".to_string());
        // try_from rejects negative, non-finite, and Duration-overflowing
        // values in one place.
        let settle = wait_raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .ok_or(ConfigError::InvalidWaitSeconds { value: wait_raw })?;

        let nav_raw = env::var("NAV_TIMEOUT").unwrap_or_else(|_| "45000".to_string());
        let nav_timeout_ms = nav_raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|ms| ms.is_finite() && *ms > 0.0)
            .ok_or(ConfigError::InvalidNavTimeout { value: nav_raw })?;

        let bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());
        let chat_id = env::var("TELEGRAM_CHAT_ID")
            .ok()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            sites_file,
            state_file,
            renderer: RendererConfig {
                user_agent,
                settle,
                nav_timeout: Duration::from_millis(nav_timeout_ms as u64),
            },
            telegram: TelegramConfig { bot_token, chat_id },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Settings for the page-rendering collaborator.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub user_agent: String,
    /// Pause after navigation before text extraction. Script-executing
    /// renderer backends need this window for the page to settle; the plain
    /// HTTP renderer gains nothing from it, so set `WAIT_SEC=0` there to
    /// avoid idling between sites.
    pub settle: Duration,
    pub nav_timeout: Duration,
}

/// Telegram delivery credentials. Either field missing means delivery is
/// skipped, not that the run fails.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidWaitSeconds { value: String },
    InvalidNavTimeout { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidWaitSeconds { value } => {
                write!(f, "WAIT_SEC must be a non-negative number, got '{value}'")
            }
            ConfigError::InvalidNavTimeout { value } => {
                write!(f, "NAV_TIMEOUT must be a positive millisecond count, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// One watched page, sourced from the site-list file. The url doubles as the
/// stable identifier in the persisted state record.
#[derive(Debug, Clone, Deserialize)]
pub struct Site {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Site {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

#[derive(Debug)]
pub enum SiteListError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    NotAnArray,
    Entry(serde_json::Error),
    EmptyUrl {
        index: usize,
    },
    DuplicateUrl {
        url: String,
    },
}

impl fmt::Display for SiteListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteListError::Read { path, .. } => {
                write!(f, "failed to read site list {}", path.display())
            }
            SiteListError::NotAnArray => {
                write!(f, "site list must be a JSON array of {{url, name}} records")
            }
            SiteListError::Entry(err) => write!(f, "invalid site entry: {err}"),
            SiteListError::EmptyUrl { index } => {
                write!(f, "site entry {index} has an empty url")
            }
            SiteListError::DuplicateUrl { url } => {
                write!(f, "duplicate site url {url}")
            }
        }
    }
}

impl std::error::Error for SiteListError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SiteListError::Read { source, .. } => Some(source),
            SiteListError::Entry(source) => Some(source),
            _ => None,
        }
    }
}

/// Loads and validates the ordered site list. Any malformation is fatal
/// before a single page is rendered.
pub fn load_sites(path: &Path) -> Result<Vec<Site>, SiteListError> {
    let raw = fs::read_to_string(path).map_err(|source| SiteListError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_sites(&raw)
}

pub fn parse_sites(raw: &str) -> Result<Vec<Site>, SiteListError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(SiteListError::Entry)?;
    if !value.is_array() {
        return Err(SiteListError::NotAnArray);
    }

    let sites: Vec<Site> = serde_json::from_value(value).map_err(SiteListError::Entry)?;

    let mut seen = std::collections::HashSet::new();
    for (index, site) in sites.iter().enumerate() {
        if site.url.trim().is_empty() {
            return Err(SiteListError::EmptyUrl { index });
        }
        if !seen.insert(site.url.as_str()) {
            return Err(SiteListError::DuplicateUrl {
                url: site.url.clone(),
            });
        }
    }

    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("SITES_FILE");
        env::remove_var("STATE_FILE");
        env::remove_var("USER_AGENT");
        env::remove_var("WAIT_SEC");
        env::remove_var("NAV_TIMEOUT");
        env::remove_var("TELEGRAM_BOT_TOKEN");
        env::remove_var("TELEGRAM_CHAT_ID");
        env::remove_var("APP_LOG_LEVEL");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.sites_file, PathBuf::from("sites.json"));
        assert_eq!(config.state_file, PathBuf::from("state.json"));
        assert_eq!(config.renderer.settle, Duration::from_secs(20));
        assert_eq!(config.renderer.nav_timeout, Duration::from_millis(45000));
        assert!(config.telegram.bot_token.is_none());
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn rejects_non_numeric_wait() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WAIT_SEC", "soon");
        let err = AppConfig::load().expect_err("invalid WAIT_SEC rejected");
        assert!(matches!(err, ConfigError::InvalidWaitSeconds { .. }));
        reset_env();
    }

    #[test]
    fn rejects_wait_beyond_duration_range() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        for value in ["1e30", "-1", "inf", "NaN"] {
            env::set_var("WAIT_SEC", value);
            let err = AppConfig::load().expect_err("out-of-range WAIT_SEC rejected");
            assert!(matches!(err, ConfigError::InvalidWaitSeconds { .. }));
        }
        reset_env();
    }

    #[test]
    fn blank_telegram_credentials_count_as_unconfigured() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TELEGRAM_BOT_TOKEN", "   ");
        env::set_var("TELEGRAM_CHAT_ID", "12345");
        let config = AppConfig::load().expect("config loads");
        assert!(config.telegram.bot_token.is_none());
        assert_eq!(config.telegram.chat_id.as_deref(), Some("12345"));
        reset_env();
    }

    #[test]
    fn parses_sites_with_optional_names() {
        let sites = parse_sites(
            r#"[
                {"url": "https://example.com/rooms", "name": "Example"},
                {"url": "https://agoda.com/hotel"}
            ]"#,
        )
        .expect("valid site list parses");
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].display_name(), "Example");
        assert_eq!(sites[1].display_name(), "https://agoda.com/hotel");
    }

    #[test]
    fn rejects_non_array_site_list() {
        let err = parse_sites(r#"{"url": "https://example.com"}"#)
            .expect_err("object form rejected");
        assert!(matches!(err, SiteListError::NotAnArray));
    }

    #[test]
    fn rejects_entry_without_url() {
        let err = parse_sites(r#"[{"name": "No url"}]"#).expect_err("missing url rejected");
        assert!(matches!(err, SiteListError::Entry(_)));
    }

    #[test]
    fn rejects_duplicate_urls() {
        let err = parse_sites(
            r#"[
                {"url": "https://example.com"},
                {"url": "https://example.com", "name": "again"}
            ]"#,
        )
        .expect_err("duplicate url rejected");
        assert!(matches!(err, SiteListError::DuplicateUrl { .. }));
    }
}
