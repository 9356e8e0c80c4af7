//! The capability contract a service implements to be announced.

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use crate::error::StartError;
use crate::mdns::engine::instance_label;

/// A service that can be registered with [`crate::Discovery`].
///
/// Starting and registering are separate: the façade only reads the
/// descriptive accessors and never calls [`Service::start`].
#[async_trait]
pub trait Service: Send + Sync {
    /// Host name of the service.
    fn hostname(&self) -> &str;

    /// mDNS instance name. Defaults to the first label of the hostname.
    fn instance_name(&self) -> String {
        instance_label(self.hostname()).to_string()
    }

    /// Port the service listens on.
    fn port(&self) -> u16;

    /// Service type, e.g. "_myService._tcp".
    fn service_type(&self) -> &str;

    /// Unique identifier, the registry key.
    fn id(&self) -> &str;

    /// Configuration attributes. A JSON object of strings becomes TXT
    /// records; any other shape is announced without attributes.
    fn config(&self) -> Value;

    /// Run the service until it fails or `cancel` fires.
    async fn start(&self, cancel: CancellationToken) -> Result<(), StartError>;
}
