//! Connection and paging settings stored in `~/.worklog-pivot/config.json`
//!
//! A missing file yields defaults. Credentials may also come from
//! `WORKLOG_PIVOT_SITE`, `WORKLOG_PIVOT_EMAIL` and `WORKLOG_PIVOT_TOKEN`,
//! which take precedence over the file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::services::client::{RequestContext, RetryPolicy};
use crate::services::cursor::SearchMode;
use crate::services::fetcher::FetchOptions;
use crate::types::{Result, WorklogError};

pub const ENV_SITE: &str = "WORKLOG_PIVOT_SITE";
pub const ENV_EMAIL: &str = "WORKLOG_PIVOT_EMAIL";
pub const ENV_TOKEN: &str = "WORKLOG_PIVOT_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const RETRY_BASE_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site_url: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
    pub search_mode: SearchMode,
    pub search_page_size: u64,
    pub worklog_page_size: u64,
    pub embedded_worklog_limit: u64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        let fetch = FetchOptions::default();
        Self {
            site_url: None,
            email: None,
            api_token: None,
            search_mode: fetch.mode,
            search_page_size: fetch.search_page_size,
            worklog_page_size: fetch.worklog_page_size,
            embedded_worklog_limit: fetch.embedded_worklog_limit,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: RetryPolicy::default().max_retries,
        }
    }
}

impl Config {
    /// Override credentials from `lookup` (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(site) = non_empty(ENV_SITE) {
            self.site_url = Some(site);
        }
        if let Some(email) = non_empty(ENV_EMAIL) {
            self.email = Some(email);
        }
        if let Some(token) = non_empty(ENV_TOKEN) {
            self.api_token = Some(token);
        }
    }

    /// Credentials for the remote tracker; all three must be set
    pub fn request_context(&self) -> Result<RequestContext> {
        let require = |value: &Option<String>, what: &str, env: &str| {
            value.clone().ok_or_else(|| {
                WorklogError::Config(format!("{} is not configured (set {} or edit the config file)", what, env))
            })
        };
        Ok(RequestContext {
            site_url: require(&self.site_url, "site_url", ENV_SITE)?,
            email: require(&self.email, "email", ENV_EMAIL)?,
            api_token: require(&self.api_token, "api_token", ENV_TOKEN)?,
        })
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            mode: self.search_mode,
            search_page_size: self.search_page_size.max(1),
            worklog_page_size: self.worklog_page_size.max(1),
            embedded_worklog_limit: self.embedded_worklog_limit,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        }
    }
}

/// Prints every setting with the token masked
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unset = "(unset)";
        let token = match &self.api_token {
            Some(t) if t.chars().count() > 4 => {
                let tail: String = t.chars().skip(t.chars().count() - 4).collect();
                format!("****{}", tail)
            }
            Some(_) => "****".to_string(),
            None => unset.to_string(),
        };
        writeln!(f, "site_url:               {}", self.site_url.as_deref().unwrap_or(unset))?;
        writeln!(f, "email:                  {}", self.email.as_deref().unwrap_or(unset))?;
        writeln!(f, "api_token:              {}", token)?;
        writeln!(f, "search_mode:            {:?}", self.search_mode)?;
        writeln!(f, "search_page_size:       {}", self.search_page_size)?;
        writeln!(f, "worklog_page_size:      {}", self.worklog_page_size)?;
        writeln!(f, "embedded_worklog_limit: {}", self.embedded_worklog_limit)?;
        writeln!(f, "request_timeout_secs:   {}", self.request_timeout_secs)?;
        write!(f, "max_retries:            {}", self.max_retries)
    }
}

pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| WorklogError::Config("Cannot determine home directory".into()))?;
        let path = base_dirs
            .home_dir()
            .join(".worklog-pivot")
            .join("config.json");
        Ok(Self { path })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File settings (or defaults) with environment overrides applied
    pub fn load(&self) -> Result<Config> {
        let mut config = self.load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_file(&self) -> Result<Config> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| {
            WorklogError::Config(format!("invalid config {}: {}", self.path.display(), e))
        })
    }

    /// Apply `change` to the stored file (not the env overrides) and save it
    pub fn update<F>(&self, change: F) -> Result<Config>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load_file()?;
        change(&mut config);
        self.save(&config)?;
        tracing::info!(path = %self.path.display(), "config saved");
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> ConfigService {
        ConfigService::with_path(dir.path().join("nested").join("config.json"))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = service(&dir).load_file().unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.fetch_options(), FetchOptions::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        fs::create_dir_all(svc.path().parent().unwrap()).unwrap();
        fs::write(
            svc.path(),
            r#"{"site_url": "https://acme.atlassian.net", "search_mode": "offset"}"#,
        )
        .unwrap();

        let config = svc.load_file().unwrap();

        assert_eq!(config.site_url.as_deref(), Some("https://acme.atlassian.net"));
        assert_eq!(config.search_mode, SearchMode::Offset);
        assert_eq!(config.worklog_page_size, 50);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        fs::create_dir_all(svc.path().parent().unwrap()).unwrap();
        fs::write(svc.path(), "{ not json").unwrap();

        assert!(matches!(svc.load_file(), Err(WorklogError::Config(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        let config = Config {
            email: Some("ada@example.com".into()),
            max_retries: 1,
            ..Default::default()
        };

        svc.save(&config).unwrap();

        assert_eq!(svc.load_file().unwrap(), config);
    }

    #[test]
    fn test_update_creates_and_keeps_other_fields() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        svc.update(|c| c.site_url = Some("https://acme.atlassian.net".into()))
            .unwrap();
        let updated = svc
            .update(|c| c.email = Some("ada@example.com".into()))
            .unwrap();

        assert_eq!(updated.site_url.as_deref(), Some("https://acme.atlassian.net"));
        assert_eq!(svc.load_file().unwrap(), updated);
    }

    #[test]
    fn test_update_refuses_malformed_file() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        fs::create_dir_all(svc.path().parent().unwrap()).unwrap();
        fs::write(svc.path(), "{ not json").unwrap();

        assert!(svc.update(|c| c.max_retries = 1).is_err());
        assert_eq!(fs::read_to_string(svc.path()).unwrap(), "{ not json");
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            (ENV_SITE, "https://env.atlassian.net"),
            (ENV_TOKEN, "  "),
        ]
        .into_iter()
        .collect();
        let mut config = Config {
            site_url: Some("https://file.atlassian.net".into()),
            api_token: Some("file-token".into()),
            ..Default::default()
        };

        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.site_url.as_deref(), Some("https://env.atlassian.net"));
        // blank values do not override
        assert_eq!(config.api_token.as_deref(), Some("file-token"));
    }

    #[test]
    fn test_request_context_requires_credentials() {
        let config = Config {
            site_url: Some("https://acme.atlassian.net".into()),
            email: Some("ada@example.com".into()),
            ..Default::default()
        };
        let err = config.request_context().unwrap_err();
        assert!(err.to_string().contains(ENV_TOKEN));

        let complete = Config {
            api_token: Some("secret".into()),
            ..config
        };
        assert_eq!(complete.request_context().unwrap().email, "ada@example.com");
    }

    #[test]
    fn test_display_masks_token() {
        let config = Config {
            api_token: Some("abcdefgh1234".into()),
            ..Default::default()
        };
        let shown = config.to_string();
        assert!(shown.contains("****1234"));
        assert!(!shown.contains("abcdefgh"));
    }

    #[test]
    fn test_page_sizes_never_zero() {
        let config = Config {
            search_page_size: 0,
            worklog_page_size: 0,
            ..Default::default()
        };
        let options = config.fetch_options();
        assert_eq!(options.search_page_size, 1);
        assert_eq!(options.worklog_page_size, 1);
    }
}
