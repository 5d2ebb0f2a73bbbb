//! Generator configuration
//!
//! Settings come from an INI file (`looker.ini` by default), then an
//! optional `.env`-style override file, then the process environment.
//! Override keys are `<PREFIX>_<KEY>` upper-cased, so `base_url` is read
//! from `LOOKERSDK_BASE_URL` with the default prefix.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use ini::Ini;
use url::Url;

use crate::core::error::{Error, Result};

/// Default environment variable prefix for overrides
pub const DEFAULT_ENV_PREFIX: &str = "LOOKERSDK";

/// INI section holding the API settings
pub const DEFAULT_SECTION: &str = "Looker";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection and version settings for one generator run
#[derive(Debug, Clone, PartialEq)]
pub struct SdkConfig {
    pub base_url: Option<Url>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_versions: Vec<String>,
    pub verify_ssl: bool,
    pub timeout: Duration,
    pub env_prefix: String,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            client_id: None,
            client_secret: None,
            api_versions: vec!["4.0".to_string()],
            verify_ssl: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }
}

impl SdkConfig {
    /// Load configuration from an INI file, an optional override file and
    /// the process environment.
    ///
    /// A missing INI file is tolerated so that environment-only setups work.
    pub fn load(ini_path: &Path, env_file: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let ini_text = if ini_path.exists() {
            Some(std::fs::read_to_string(ini_path)?)
        } else {
            tracing::debug!(path = %ini_path.display(), "Configuration file not found, using overrides only");
            None
        };

        let mut file_overrides = HashMap::new();
        if let Some(path) = env_file {
            for item in dotenvy::from_path_iter(path)? {
                let (key, value) = item?;
                file_overrides.insert(key, value);
            }
        }

        Self::from_sources(ini_text.as_deref(), env_prefix, |key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_overrides.get(key).cloned())
        })
    }

    /// Build configuration from INI text and an override lookup.
    ///
    /// `lookup` receives fully prefixed keys such as `LOOKERSDK_BASE_URL`.
    pub fn from_sources<F>(ini_text: Option<&str>, env_prefix: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values: HashMap<String, String> = HashMap::new();

        if let Some(text) = ini_text {
            let ini = Ini::load_from_str(text)?;
            if let Some(section) = ini.section(Some(DEFAULT_SECTION)) {
                for (key, value) in section.iter() {
                    values.insert(key.to_lowercase(), value.to_string());
                }
            }
        }

        for key in [
            "base_url",
            "client_id",
            "client_secret",
            "api_version",
            "api_versions",
            "verify_ssl",
            "timeout",
        ] {
            let env_key = format!("{}_{}", env_prefix, key.to_uppercase());
            if let Some(value) = lookup(&env_key) {
                values.insert(key.to_string(), value);
            }
        }

        let mut config = SdkConfig {
            env_prefix: env_prefix.to_string(),
            ..Default::default()
        };

        if let Some(raw) = values.get("base_url").filter(|v| !v.trim().is_empty()) {
            let url = Url::parse(raw.trim())
                .map_err(|e| Error::config(format!("Invalid base_url '{raw}': {e}")))?;
            config.base_url = Some(url);
        }
        config.client_id = values.get("client_id").cloned().filter(|v| !v.is_empty());
        config.client_secret = values
            .get("client_secret")
            .cloned()
            .filter(|v| !v.is_empty());

        if let Some(raw) = values.get("api_versions").or_else(|| values.get("api_version")) {
            let versions = parse_version_list(raw);
            if !versions.is_empty() {
                config.api_versions = versions;
            }
        }

        if let Some(raw) = values.get("verify_ssl") {
            config.verify_ssl = parse_bool(raw)
                .ok_or_else(|| Error::config(format!("Invalid verify_ssl value '{raw}'")))?;
        }

        if let Some(raw) = values.get("timeout") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("Invalid timeout value '{raw}'")))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// The API version used for login/logout calls
    pub fn auth_api_version(&self) -> &str {
        self.api_versions
            .last()
            .map(String::as_str)
            .unwrap_or("4.0")
    }

    /// Base URL or a configuration error naming the missing key
    pub fn require_base_url(&self) -> Result<&Url> {
        self.base_url.as_ref().ok_or_else(|| {
            Error::config(format!(
                "base_url is required (set it in [{DEFAULT_SECTION}] or {}_BASE_URL)",
                self.env_prefix
            ))
        })
    }
}

/// Split a comma-separated version list, dropping blanks
pub fn parse_version_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_INI: &str = "[Looker]\n\
        base_url=https://looker.example.com:19999\n\
        client_id=ini-id\n\
        client_secret=ini-secret\n\
        api_versions=3.1,4.0\n\
        verify_ssl=False\n\
        timeout=30\n";

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_from_ini_only() {
        let config = SdkConfig::from_sources(Some(SAMPLE_INI), DEFAULT_ENV_PREFIX, no_env).unwrap();

        assert_eq!(
            config.base_url.unwrap().as_str(),
            "https://looker.example.com:19999/"
        );
        assert_eq!(config.client_id.as_deref(), Some("ini-id"));
        assert_eq!(config.client_secret.as_deref(), Some("ini-secret"));
        assert_eq!(config.api_versions, vec!["3.1", "4.0"]);
        assert!(!config.verify_ssl);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        let env: HashMap<&str, &str> = [
            ("LOOKERSDK_CLIENT_ID", "env-id"),
            ("LOOKERSDK_API_VERSION", "4.0"),
            ("LOOKERSDK_VERIFY_SSL", "1"),
        ]
        .into_iter()
        .collect();

        let config = SdkConfig::from_sources(Some(SAMPLE_INI), DEFAULT_ENV_PREFIX, |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.client_id.as_deref(), Some("env-id"));
        // api_versions from the INI wins over api_version from env
        assert_eq!(config.api_versions, vec!["3.1", "4.0"]);
        assert!(config.verify_ssl);
    }

    #[test]
    fn test_custom_prefix() {
        let config = SdkConfig::from_sources(None, "MYSDK", |k| {
            (k == "MYSDK_BASE_URL").then(|| "https://api.example.com".to_string())
        })
        .unwrap();

        assert_eq!(config.env_prefix, "MYSDK");
        assert!(config.base_url.is_some());
        assert_eq!(config.api_versions, vec!["4.0"]);
        assert_eq!(config.auth_api_version(), "4.0");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_bool = "[Looker]\nverify_ssl=maybe\n";
        assert!(SdkConfig::from_sources(Some(bad_bool), DEFAULT_ENV_PREFIX, no_env).is_err());

        let bad_url = "[Looker]\nbase_url=not a url\n";
        assert!(SdkConfig::from_sources(Some(bad_url), DEFAULT_ENV_PREFIX, no_env).is_err());
    }

    #[test]
    fn test_require_base_url() {
        let config = SdkConfig::default();
        let err = config.require_base_url().unwrap_err();
        assert!(err.to_string().contains("LOOKERSDK_BASE_URL"));
    }

    #[test]
    fn test_load_with_override_file() {
        let mut ini = NamedTempFile::new().unwrap();
        ini.write_all(SAMPLE_INI.as_bytes()).unwrap();
        let mut env_file = NamedTempFile::new().unwrap();
        writeln!(env_file, "SDKCFGTEST_CLIENT_SECRET=file-secret").unwrap();

        let config = SdkConfig::load(ini.path(), Some(env_file.path()), "SDKCFGTEST").unwrap();

        assert_eq!(config.client_secret.as_deref(), Some("file-secret"));
        assert_eq!(config.client_id.as_deref(), Some("ini-id"));
    }

    #[test]
    fn test_load_missing_ini_is_tolerated() {
        let config = SdkConfig::load(Path::new("/nonexistent/looker.ini"), None, "SDKCFGNONE").unwrap();
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_parse_version_list() {
        assert_eq!(parse_version_list(" 3.1, ,4.0 "), vec!["3.1", "4.0"]);
        assert!(parse_version_list("").is_empty());
    }
}
