//! Remote backend settings loaded from environment variables.
//!
//! The hosted backend exposes PostgREST tables, RPC functions and edge
//! functions under one base URL. `.env` files are honoured through dotenvy.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Environment variable names.
pub mod env_keys {
    pub const BACKEND_URL: &str = "HR_IMPORT_BACKEND_URL";
    pub const ANON_KEY: &str = "HR_IMPORT_ANON_KEY";
    pub const ACCESS_TOKEN: &str = "HR_IMPORT_ACCESS_TOKEN";
    pub const SUBMIT_FUNCTION: &str = "HR_IMPORT_SUBMIT_FUNCTION";
    pub const RETRY_FUNCTION: &str = "HR_IMPORT_RETRY_FUNCTION";
    pub const JOBS_TABLE: &str = "HR_IMPORT_JOBS_TABLE";
    pub const ROWS_TABLE: &str = "HR_IMPORT_ROWS_TABLE";
    pub const REQUEST_TIMEOUT_SECS: &str = "HR_IMPORT_REQUEST_TIMEOUT_SECS";
}

/// Default values for optional settings.
pub mod defaults {
    pub const SUBMIT_FUNCTION: &str = "process-import";
    pub const RETRY_FUNCTION: &str = "retry_import_job";
    pub const JOBS_TABLE: &str = "import_jobs";
    pub const ROWS_TABLE: &str = "import_rows";
    pub const CONNECT_TIMEOUT_SECS: u64 = 5;
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Connection settings for the hosted import backend.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Base URL, e.g. `https://project.supabase.co`
    pub base_url: String,
    /// Public anon key, sent as `apikey` header
    pub anon_key: String,
    /// User access token; the anon key is used as bearer when absent
    pub access_token: Option<String>,
    /// Edge function that accepts submissions
    pub submit_function: String,
    /// RPC function that resubmits a job
    pub retry_function: String,
    pub jobs_table: String,
    pub rows_table: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl BackendSettings {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: None,
            submit_function: defaults::SUBMIT_FUNCTION.to_string(),
            retry_function: defaults::RETRY_FUNCTION.to_string(),
            jobs_table: defaults::JOBS_TABLE.to_string(),
            rows_table: defaults::ROWS_TABLE.to_string(),
            connect_timeout: Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Load settings from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self, SettingsError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = get(env_keys::BACKEND_URL).ok_or(SettingsError::Missing(env_keys::BACKEND_URL))?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(SettingsError::Invalid {
                key: env_keys::BACKEND_URL,
                value: base_url,
            });
        }
        let anon_key = get(env_keys::ANON_KEY).ok_or(SettingsError::Missing(env_keys::ANON_KEY))?;

        let mut settings = Self::new(base_url, anon_key);
        settings.access_token = get(env_keys::ACCESS_TOKEN);

        if let Some(v) = get(env_keys::SUBMIT_FUNCTION) {
            settings.submit_function = v;
        }
        if let Some(v) = get(env_keys::RETRY_FUNCTION) {
            settings.retry_function = v;
        }
        if let Some(v) = get(env_keys::JOBS_TABLE) {
            settings.jobs_table = v;
        }
        if let Some(v) = get(env_keys::ROWS_TABLE) {
            settings.rows_table = v;
        }
        if let Some(v) = get(env_keys::REQUEST_TIMEOUT_SECS) {
            let secs = v.parse::<u64>().ok().filter(|s| *s > 0).ok_or(SettingsError::Invalid {
                key: env_keys::REQUEST_TIMEOUT_SECS,
                value: v,
            })?;
            settings.request_timeout = Duration::from_secs(secs);
        }

        Ok(settings)
    }

    /// Token sent in the `Authorization: Bearer` header.
    pub fn bearer_token(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_required_variables() {
        let err = BackendSettings::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, SettingsError::Missing(env_keys::BACKEND_URL));

        let err =
            BackendSettings::from_lookup(lookup(&[(env_keys::BACKEND_URL, "https://x.test")]))
                .unwrap_err();
        assert_eq!(err, SettingsError::Missing(env_keys::ANON_KEY));
    }

    #[test]
    fn test_defaults_and_overrides() {
        let settings = BackendSettings::from_lookup(lookup(&[
            (env_keys::BACKEND_URL, "https://x.test/"),
            (env_keys::ANON_KEY, "anon"),
            (env_keys::ROWS_TABLE, "hr_import_rows"),
            (env_keys::REQUEST_TIMEOUT_SECS, "12"),
        ]))
        .unwrap();

        assert_eq!(settings.base_url, "https://x.test");
        assert_eq!(settings.jobs_table, defaults::JOBS_TABLE);
        assert_eq!(settings.rows_table, "hr_import_rows");
        assert_eq!(settings.request_timeout, Duration::from_secs(12));
        assert_eq!(settings.bearer_token(), "anon");
        assert_eq!(
            settings.endpoint("/rest/v1/import_jobs"),
            "https://x.test/rest/v1/import_jobs"
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = BackendSettings::from_lookup(lookup(&[
            (env_keys::BACKEND_URL, "x.test"),
            (env_keys::ANON_KEY, "anon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { .. }));

        let err = BackendSettings::from_lookup(lookup(&[
            (env_keys::BACKEND_URL, "https://x.test"),
            (env_keys::ANON_KEY, "anon"),
            (env_keys::REQUEST_TIMEOUT_SECS, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { key, .. } if key == env_keys::REQUEST_TIMEOUT_SECS));
    }

    #[test]
    fn test_access_token_preferred() {
        let settings = BackendSettings::new("https://x.test", "anon").with_access_token("jwt");
        assert_eq!(settings.bearer_token(), "jwt");
    }
}
