use super::response::ResponseEnvelope;
use super::server::{ServerRecord, StatusFilter};
use std::sync::Arc;

/// Last accepted server collection.
///
/// A snapshot is never mutated in place: every patch returns a new value,
/// so a copy handed to the UI stays valid while later operations settle.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    envelope: Arc<ResponseEnvelope>,
}

impl Snapshot {
    /// Takes the collection of a list response. A missing collection is
    /// treated as empty.
    pub fn from_envelope(envelope: ResponseEnvelope) -> Self {
        let servers = envelope.data.servers.clone().unwrap_or_default();
        Self {
            envelope: Arc::new(envelope.with_servers(servers)),
        }
    }

    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    pub fn servers(&self) -> &[ServerRecord] {
        self.envelope.servers()
    }

    pub fn len(&self) -> usize {
        self.servers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers().is_empty()
    }

    pub fn find(&self, id: u64) -> Option<&ServerRecord> {
        self.servers().iter().find(|s| s.id == id)
    }

    /// Most-recent-first order for display.
    pub fn reversed(&self) -> Snapshot {
        let mut servers = self.servers().to_vec();
        servers.reverse();
        self.with_collection(servers)
    }

    /// Replaces the record with the same id. Unknown ids leave the
    /// collection as it was.
    pub fn with_replaced(&self, record: ServerRecord) -> Snapshot {
        let servers = self
            .servers()
            .iter()
            .map(|s| if s.id == record.id { record.clone() } else { s.clone() })
            .collect();
        self.with_collection(servers)
    }

    pub fn with_prepended(&self, record: ServerRecord) -> Snapshot {
        let mut servers = Vec::with_capacity(self.len() + 1);
        servers.push(record);
        servers.extend_from_slice(self.servers());
        self.with_collection(servers)
    }

    pub fn without(&self, id: u64) -> Snapshot {
        let servers = self
            .servers()
            .iter()
            .filter(|s| s.id != id)
            .cloned()
            .collect();
        self.with_collection(servers)
    }

    pub fn filtered(&self, filter: StatusFilter) -> Vec<ServerRecord> {
        self.servers()
            .iter()
            .filter(|s| filter.matches(s.status))
            .cloned()
            .collect()
    }

    /// Keeps the collection and takes the metadata (message, status code,
    /// timestamp) of `envelope`.
    pub fn retagged(&self, envelope: &ResponseEnvelope) -> Snapshot {
        Snapshot {
            envelope: Arc::new(envelope.with_servers(self.servers().to_vec())),
        }
    }

    fn with_collection(&self, servers: Vec<ServerRecord>) -> Snapshot {
        Snapshot {
            envelope: Arc::new(self.envelope.with_servers(servers)),
        }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
