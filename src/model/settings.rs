use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that overrides the persisted API address.
pub const API_ADDRESS_ENV: &str = "FLEET_API_ADDRESS";

/// Persisted between runs through eframe storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// `host:port` of the server-manager API
    #[serde(default = "default_api_address")]
    pub api_address: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Where reports are written; the download directory when unset
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
}

fn default_api_address() -> String {
    "localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_address: default_api_address(),
            request_timeout_secs: default_timeout_secs(),
            report_dir: None,
        }
    }
}

impl AppSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Applies `FLEET_API_ADDRESS` when it is set and not blank.
    pub fn with_env_override(self) -> Self {
        self.with_api_override(std::env::var(API_ADDRESS_ENV).ok())
    }

    fn with_api_override(mut self, address: Option<String>) -> Self {
        if let Some(address) = address.map(|a| a.trim().to_string())
            && !address.is_empty()
        {
            self.api_address = address;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.api_address, "localhost:8080");
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert!(settings.report_dir.is_none());
    }

    #[test]
    fn test_serde_defaults_for_missing_fields() {
        let settings: AppSettings = serde_json::from_str(r#"{"api_address":"10.1.1.1:9000"}"#).unwrap();
        assert_eq!(settings.api_address, "10.1.1.1:9000");
        assert_eq!(settings.request_timeout_secs, 10);
    }

    #[test]
    fn test_serde_roundtrip() {
        let settings = AppSettings {
            api_address: "fleet.internal:8080".to_string(),
            request_timeout_secs: 3,
            report_dir: Some(PathBuf::from("/tmp/reports")),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        let restored: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, settings);
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let settings = AppSettings {
            request_timeout_secs: 0,
            ..AppSettings::default()
        };
        assert_eq!(settings.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_api_override() {
        let settings = AppSettings::default().with_api_override(Some(" 10.0.0.2:8080 ".to_string()));
        assert_eq!(settings.api_address, "10.0.0.2:8080");

        let settings = AppSettings::default().with_api_override(Some("   ".to_string()));
        assert_eq!(settings.api_address, "localhost:8080");

        let settings = AppSettings::default().with_api_override(None);
        assert_eq!(settings.api_address, "localhost:8080");
    }
}
