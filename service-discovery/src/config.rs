use serde::Deserialize;
use shared::protocol::DEFAULT_DOMAIN;

/// Settings for a `Discovery` instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Service type this instance browses, e.g. "_myService._tcp"
    pub service_type: String,
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Restrict the mDNS daemon to one interface
    #[serde(default)]
    pub interface: Option<String>,
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

impl DiscoveryConfig {
    pub fn new(service_type: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            domain: default_domain(),
            interface: None,
        }
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }
}
