use super::server::{ServerRecord, lenient_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Uniform wrapper every server-manager endpoint answers with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseEnvelope {
    #[serde(alias = "timerStamp", deserialize_with = "lenient_timestamp")]
    pub time_stamp: Option<DateTime<Utc>>,
    pub status_code: u16,
    pub status: String,
    pub reason: String,
    pub message: String,
    pub developer_message: String,
    pub data: ResponseData,
}

/// Payload of an envelope: a collection for list/filter, a single record
/// for ping/save, nothing for delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<ServerRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerRecord>,
}

impl ResponseEnvelope {
    pub fn servers(&self) -> &[ServerRecord] {
        self.data.servers.as_deref().unwrap_or(&[])
    }

    pub fn server(&self) -> Option<&ServerRecord> {
        self.data.server.as_ref()
    }

    /// Same metadata, payload replaced by `servers`.
    pub fn with_servers(&self, servers: Vec<ServerRecord>) -> ResponseEnvelope {
        ResponseEnvelope {
            data: ResponseData {
                servers: Some(servers),
                server: None,
            },
            ..self.without_data()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> ResponseEnvelope {
        self.message = message.into();
        self
    }

    fn without_data(&self) -> ResponseEnvelope {
        ResponseEnvelope {
            time_stamp: self.time_stamp,
            status_code: self.status_code,
            status: self.status.clone(),
            reason: self.reason.clone(),
            message: self.message.clone(),
            developer_message: self.developer_message.clone(),
            data: ResponseData::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServerStatus;

    const LIST_RESPONSE: &str = r#"{
        "timeStamp": "2024-05-02T08:30:00.5",
        "statusCode": 200,
        "status": "OK",
        "message": "Servers retrieved",
        "data": {
            "servers": [
                {"id": 1, "ipAddress": "192.168.1.160", "name": "Ubuntu Linux", "memory": "16 GB", "type": "Personal PC", "status": "SERVER_UP"},
                {"id": 2, "ipAddress": "192.168.1.58", "name": "Fedora Linux", "memory": "16 GB", "type": "Dell Tower", "status": "SERVER_DOWN"}
            ]
        }
    }"#;

    #[test]
    fn test_parse_list_envelope() {
        let envelope: ResponseEnvelope = serde_json::from_str(LIST_RESPONSE).unwrap();
        assert_eq!(envelope.status_code, 200);
        assert_eq!(envelope.message, "Servers retrieved");
        assert_eq!(envelope.reason, "");
        assert!(envelope.time_stamp.is_some());
        assert_eq!(envelope.servers().len(), 2);
        assert_eq!(envelope.servers()[1].status, ServerStatus::Down);
        assert!(envelope.server().is_none());
    }

    #[test]
    fn test_parse_single_record_with_legacy_timestamp_key() {
        let json = r#"{
            "timerStamp": "2024-05-02T08:30:00",
            "statusCode": 200,
            "message": "Ping success",
            "data": {"server": {"id": 4, "ipAddress": "10.0.0.4", "status": "SERVER_UP"}}
        }"#;
        let envelope: ResponseEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.time_stamp.is_some());
        assert_eq!(envelope.server().map(|s| s.id), Some(4));
        assert!(envelope.servers().is_empty());
    }

    #[test]
    fn test_array_timestamps_do_not_reject_envelope() {
        let json = r#"{
            "timeStamp": [2024, 5, 2, 8, 30, 0],
            "statusCode": 200,
            "message": "Servers retrieved",
            "data": {"servers": [
                {"id": 1, "ipAddress": "10.0.0.1", "status": "SERVER_UP", "lastPing": [2024, 5, 2, 8, 29, 0]},
                {"id": 2, "ipAddress": "10.0.0.2", "status": "SERVER_DOWN", "lastPing": 1714638540}
            ]}
        }"#;
        let envelope: ResponseEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.time_stamp.is_none());
        assert_eq!(envelope.servers().len(), 2);
        assert!(envelope.servers().iter().all(|s| s.last_ping.is_none()));
    }

    #[test]
    fn test_empty_delete_envelope() {
        let json = r#"{"statusCode": 200, "message": "Server deleted", "data": {"deleted": true}}"#;
        let envelope: ResponseEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.message, "Server deleted");
        assert_eq!(envelope.data, ResponseData::default());
    }

    #[test]
    fn test_with_servers_keeps_metadata() {
        let envelope: ResponseEnvelope = serde_json::from_str(LIST_RESPONSE).unwrap();
        let trimmed = envelope.with_servers(envelope.servers()[..1].to_vec());
        assert_eq!(trimmed.message, envelope.message);
        assert_eq!(trimmed.status_code, 200);
        assert_eq!(trimmed.servers().len(), 1);
    }
}
