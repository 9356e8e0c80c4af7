use std::net::IpAddr;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

/// A service registered by this process.
/// Entries are immutable snapshots taken at registration time; the registry
/// replaces them wholesale when the same id is registered again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Caller-chosen unique id, e.g. "svc1"
    pub id: String,

    /// Service type, e.g. "_myService._tcp"
    pub service_type: String,

    /// Full DNS-SD instance name, e.g. "host1._myService._tcp.local."
    pub instance_name: String,

    /// Hostname as reported by the service, e.g. "host1"
    pub hostname: String,

    /// Service port
    pub port: u16,

    /// TXT records as "key=value" strings
    pub txt: Vec<String>,

    /// When this entry was stored
    pub registered_at: DateTime<Utc>,
}

/// A remote service instance observed while browsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredService {
    pub service_type: String,
    pub instance_name: String,
    pub hostname: String,
    pub addresses: Vec<IpAddr>,
    pub port: u16,
    pub txt: Vec<String>,
}
