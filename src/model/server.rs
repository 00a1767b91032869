use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ServerStatus {
    #[serde(rename = "SERVER_UP")]
    Up,
    #[default]
    #[serde(rename = "SERVER_DOWN")]
    Down,
}

impl ServerStatus {
    /// Value used by the server-manager API.
    pub fn as_wire(&self) -> &'static str {
        match self {
            ServerStatus::Up => "SERVER_UP",
            ServerStatus::Down => "SERVER_DOWN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServerStatus::Up => "SERVER UP",
            ServerStatus::Down => "SERVER DOWN",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Status selection offered by the filter box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ServerStatus),
}

impl StatusFilter {
    pub const CHOICES: [StatusFilter; 3] = [
        StatusFilter::All,
        StatusFilter::Only(ServerStatus::Up),
        StatusFilter::Only(ServerStatus::Down),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "ALL",
            StatusFilter::Only(status) => status.label(),
        }
    }

    pub fn matches(&self, status: ServerStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    pub id: u64,
    #[serde(rename = "ipAddress")]
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub memory: String,
    #[serde(rename = "type", default)]
    pub server_type: String,
    #[serde(default)]
    pub status: ServerStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_ping: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 timestamps as well as the zone-less form the backend
/// emits for `LocalDateTime`, which is read as UTC. Anything else, including
/// non-string values such as Jackson's array form, is dropped.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::String(text) => parse_timestamp(&text),
        _ => None,
    })
}

pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .expect("hostname pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Invalid IP address or host name: {0}")]
    InvalidAddress(String),
    #[error("Server name is required")]
    EmptyName,
}

/// Contents of the "new server" form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDraft {
    #[serde(rename = "ipAddress")]
    pub address: String,
    pub name: String,
    pub memory: String,
    #[serde(rename = "type")]
    pub server_type: String,
    pub status: ServerStatus,
}

impl Default for ServerDraft {
    fn default() -> Self {
        Self {
            address: String::new(),
            name: String::new(),
            memory: String::new(),
            server_type: String::new(),
            status: ServerStatus::Down,
        }
    }
}

impl ServerDraft {
    /// Clears the text fields and puts the status back to `SERVER_DOWN`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Trims the text fields and checks the address and name.
    pub fn validate(&self) -> Result<ServerDraft, DraftError> {
        let draft = ServerDraft {
            address: self.address.trim().to_string(),
            name: self.name.trim().to_string(),
            memory: self.memory.trim().to_string(),
            server_type: self.server_type.trim().to_string(),
            status: self.status,
        };

        if !is_valid_address(&draft.address) {
            return Err(DraftError::InvalidAddress(draft.address));
        }
        if draft.name.is_empty() {
            return Err(DraftError::EmptyName);
        }
        Ok(draft)
    }
}

pub fn is_valid_address(address: &str) -> bool {
    if address.is_empty() {
        return false;
    }
    if address.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }
    // A dotted-quad that failed to parse is a bad IP, not a host name
    if address.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return false;
    }
    address.len() <= 253 && HOSTNAME.is_match(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&ServerStatus::Up).unwrap(),
            "\"SERVER_UP\""
        );
        let down: ServerStatus = serde_json::from_str("\"SERVER_DOWN\"").unwrap();
        assert_eq!(down, ServerStatus::Down);
        assert_eq!(ServerStatus::Up.label(), "SERVER UP");
    }

    #[test]
    fn test_filter_matches() {
        assert!(StatusFilter::All.matches(ServerStatus::Down));
        assert!(StatusFilter::Only(ServerStatus::Up).matches(ServerStatus::Up));
        assert!(!StatusFilter::Only(ServerStatus::Up).matches(ServerStatus::Down));
    }

    #[test]
    fn test_record_from_backend_json() {
        let json = r#"{
            "id": 7,
            "ipAddress": "192.168.1.160",
            "name": "Ubuntu Linux",
            "memory": "16 GB",
            "type": "Personal PC",
            "imageUrl": "http://localhost:8080/server/image/server1.png",
            "status": "SERVER_UP"
        }"#;
        let record: ServerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.address, "192.168.1.160");
        assert_eq!(record.server_type, "Personal PC");
        assert_eq!(record.status, ServerStatus::Up);
        assert!(record.last_ping.is_none());
    }

    #[test]
    fn test_record_minimal_json_uses_defaults() {
        let record: ServerRecord =
            serde_json::from_str(r#"{"id":1,"ipAddress":"10.0.0.1"}"#).unwrap();
        assert_eq!(record.status, ServerStatus::Down);
        assert_eq!(record.name, "");
    }

    #[test]
    fn test_last_ping_accepts_naive_and_rfc3339() {
        let naive: ServerRecord = serde_json::from_str(
            r#"{"id":1,"ipAddress":"10.0.0.1","lastPing":"2024-03-01T10:15:30.123"}"#,
        )
        .unwrap();
        assert_eq!(
            naive.last_ping.unwrap().to_rfc3339(),
            "2024-03-01T10:15:30.123+00:00"
        );

        let zoned: ServerRecord = serde_json::from_str(
            r#"{"id":1,"ipAddress":"10.0.0.1","lastPing":"2024-03-01T12:15:30+02:00"}"#,
        )
        .unwrap();
        assert_eq!(zoned.last_ping, naive.last_ping.map(|t| t - chrono::Duration::milliseconds(123)));

        let garbage: ServerRecord = serde_json::from_str(
            r#"{"id":1,"ipAddress":"10.0.0.1","lastPing":"yesterday"}"#,
        )
        .unwrap();
        assert!(garbage.last_ping.is_none());
    }

    #[test]
    fn test_last_ping_ignores_non_string_values() {
        for raw in ["[2024,3,1,10,15,30]", "1709288130000", "{\"epoch\":1}", "null"] {
            let json = format!(r#"{{"id":3,"ipAddress":"10.0.0.3","lastPing":{raw}}}"#);
            let record: ServerRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(record.id, 3);
            assert!(record.last_ping.is_none(), "{raw} should be dropped");
        }
    }

    #[test]
    fn test_draft_serializes_backend_field_names() {
        let draft = ServerDraft {
            address: "10.0.0.9".to_string(),
            name: "Build box".to_string(),
            memory: "64 GB".to_string(),
            server_type: "Dell Tower".to_string(),
            status: ServerStatus::Up,
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["ipAddress"], "10.0.0.9");
        assert_eq!(value["type"], "Dell Tower");
        assert_eq!(value["status"], "SERVER_UP");
    }

    #[test]
    fn test_draft_reset_restores_down_status() {
        let mut draft = ServerDraft {
            address: "10.0.0.9".to_string(),
            name: "x".to_string(),
            memory: "1 GB".to_string(),
            server_type: "VM".to_string(),
            status: ServerStatus::Up,
        };
        draft.reset();
        assert_eq!(draft, ServerDraft::default());
        assert_eq!(draft.status, ServerStatus::Down);
    }

    #[test]
    fn test_draft_validation() {
        let mut draft = ServerDraft {
            address: "  10.0.0.9 ".to_string(),
            name: " Mail ".to_string(),
            ..ServerDraft::default()
        };
        let clean = draft.validate().unwrap();
        assert_eq!(clean.address, "10.0.0.9");
        assert_eq!(clean.name, "Mail");

        draft.name = "   ".to_string();
        assert_eq!(draft.validate(), Err(DraftError::EmptyName));

        draft.address = "300.1.1.1".to_string();
        assert!(matches!(draft.validate(), Err(DraftError::InvalidAddress(_))));
    }

    #[test]
    fn test_address_validation() {
        assert!(is_valid_address("192.168.1.1"));
        assert!(is_valid_address("::1"));
        assert!(is_valid_address("mail.example.com"));
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("999.1.1.1"));
        assert!(!is_valid_address("bad host!"));
        assert!(!is_valid_address("-leading.example.com"));
    }
}
