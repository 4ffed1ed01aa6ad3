use crate::error::{Result, SyncError};
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
const DEFAULT_RENAME_DEBOUNCE_MS: u64 = 500;
const ENV_API_URL: &str = "KANBAN_API_URL";
const ENV_REQUEST_TIMEOUT_SECS: &str = "KANBAN_REQUEST_TIMEOUT_SECS";
const ENV_RENAME_DEBOUNCE_MS: &str = "KANBAN_RENAME_DEBOUNCE_MS";
const ENV_DISCARD_STALE_RESPONSES: &str = "KANBAN_DISCARD_STALE_RESPONSES";

/// What to do with an authoritative snapshot that arrives after a newer one
/// has already been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleResponsePolicy {
    /// Every response overwrites the board, in completion order
    #[default]
    Apply,
    /// Responses older than the local version are dropped; the local version
    /// is the newest applied response or optimistic edit
    DiscardStale,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub rename_debounce: Duration,
    pub stale_responses: StaleResponsePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            rename_debounce: Duration::from_millis(DEFAULT_RENAME_DEBOUNCE_MS),
            stale_responses: StaleResponsePolicy::Apply,
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_url = read(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_owned());

        let request_timeout = read(ENV_REQUEST_TIMEOUT_SECS)
            .map(|raw| parse_positive(ENV_REQUEST_TIMEOUT_SECS, &raw))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));

        let rename_debounce = read(ENV_RENAME_DEBOUNCE_MS)
            .map(|raw| parse_positive(ENV_RENAME_DEBOUNCE_MS, &raw))
            .transpose()?
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_RENAME_DEBOUNCE_MS));

        let stale_responses = match read(ENV_DISCARD_STALE_RESPONSES) {
            Some(raw) if matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes") => {
                StaleResponsePolicy::DiscardStale
            }
            _ => StaleResponsePolicy::Apply,
        };

        Ok(Self {
            api_url,
            request_timeout,
            rename_debounce,
            stale_responses,
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_stale_responses(mut self, policy: StaleResponsePolicy) -> Self {
        self.stale_responses = policy;
        self
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64> {
    let value = raw
        .parse::<u64>()
        .map_err(|_| SyncError::Config(format!("{key} must be a non-zero integer.")))?;
    if value == 0 {
        return Err(SyncError::Config(format!("{key} must be greater than zero.")));
    }
    Ok(value)
}
