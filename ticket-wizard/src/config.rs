//! Configuration for the ticket wizard.
//!
//! Loaded from environment variables with defaults. Unparsable numbers fall
//! back to their default.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use wizard_runtime::RetryPolicy;

/// Default upload service
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://file-upload-as-a-service.onrender.com/api/upload";

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct WizardConfig {
    /// Directory holding the persisted ticket (`TICKET_STORE_DIR`)
    pub store_dir: PathBuf,
    /// Upload settings
    pub upload: UploadConfig,
}

/// Upload gateway settings
#[derive(Debug, Clone, PartialEq)]
pub struct UploadConfig {
    /// Multipart endpoint (`UPLOAD_ENDPOINT`)
    pub endpoint: String,
    /// Per-request timeout (`UPLOAD_TIMEOUT_SECS`, default 30)
    pub timeout: Duration,
    /// Retries after the first attempt (`UPLOAD_MAX_RETRIES`, default 2)
    pub max_retries: usize,
    /// Delay before the first retry (`UPLOAD_RETRY_BACKOFF_MS`, default 250)
    pub retry_backoff: Duration,
    /// Use the in-process mock instead of HTTP (`UPLOAD_OFFLINE`, default false)
    pub offline: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
            offline: false,
        }
    }
}

impl UploadConfig {
    /// Backoff policy for transient upload failures
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.max_retries)
            .initial_delay(self.retry_backoff)
            .build()
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(".ticket-wizard"),
            upload: UploadConfig::default(),
        }
    }
}

impl WizardConfig {
    /// Loads configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary lookup
    #[must_use]
    pub fn from_source<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let upload = UploadConfig {
            endpoint: lookup("UPLOAD_ENDPOINT").unwrap_or(defaults.upload.endpoint),
            // A zero timeout would fail every upload.
            timeout: lookup("UPLOAD_TIMEOUT_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map_or(defaults.upload.timeout, Duration::from_secs),
            max_retries: lookup("UPLOAD_MAX_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.upload.max_retries),
            retry_backoff: lookup("UPLOAD_RETRY_BACKOFF_MS")
                .and_then(|s| s.parse().ok())
                .map_or(defaults.upload.retry_backoff, Duration::from_millis),
            offline: lookup("UPLOAD_OFFLINE").map_or(defaults.upload.offline, |s| {
                matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
            }),
        };

        Self {
            store_dir: lookup("TICKET_STORE_DIR").map_or(defaults.store_dir, PathBuf::from),
            upload,
        }
    }
}
