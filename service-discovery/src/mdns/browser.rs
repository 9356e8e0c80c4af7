use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use mdns_sd::{ServiceEvent, ServiceInfo};
use shared::protocol::TXT_SEPARATOR;
use shared::types::DiscoveredService;
use crate::error::DiscoveryError;
use super::engine::MdnsEngine;

/// Something observed on the network for the browsed type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    Resolved(DiscoveredService),
    /// Full instance name of a service that went away
    Removed(String),
}

/// Start browsing `ty_domain` and forward events until `cancel` fires.
///
/// The browse request is issued before this returns, so no announcement made
/// afterwards can be missed. Events are delivered on the returned channel.
pub fn start_browser(
    engine: Arc<dyn MdnsEngine>,
    ty_domain: String,
    cancel: CancellationToken,
) -> Result<mpsc::Receiver<BrowserEvent>, DiscoveryError> {
    let receiver = engine.browse(&ty_domain)?;
    let (tx, rx) = mpsc::channel(256);

    tokio::spawn(async move {
        run_browser(receiver, &ty_domain, &tx, cancel).await;
        if let Err(e) = engine.stop_browse(&ty_domain) {
            tracing::warn!("Failed to stop browsing {}: {}", ty_domain, e);
        }
    });

    Ok(rx)
}

async fn run_browser(
    receiver: flume::Receiver<ServiceEvent>,
    ty_domain: &str,
    tx: &mpsc::Sender<BrowserEvent>,
    cancel: CancellationToken,
) {
    tracing::info!("Starting mDNS browser for {}", ty_domain);

    loop {
        tokio::select! {
            event = receiver.recv_async() => {
                let forwarded = match event {
                    Ok(ServiceEvent::ServiceResolved(info)) => {
                        let service = convert_service_info(&info);
                        tracing::debug!("Resolved service: {}", service.instance_name);
                        Some(BrowserEvent::Resolved(service))
                    }
                    Ok(ServiceEvent::ServiceRemoved(_typ, fullname)) => {
                        tracing::debug!("Service removed: {}", fullname);
                        Some(BrowserEvent::Removed(fullname))
                    }
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!("Browser for {} disconnected: {}", ty_domain, e);
                        break;
                    }
                };

                if let Some(event) = forwarded {
                    if tx.send(event).await.is_err() {
                        tracing::debug!("Browse listener dropped, stopping");
                        break;
                    }
                }
            }

            _ = cancel.cancelled() => {
                tracing::info!("mDNS browser for {} shutting down", ty_domain);
                break;
            }
        }
    }
}

/// Convert an mdns-sd ServiceInfo to our DiscoveredService
fn convert_service_info(info: &ServiceInfo) -> DiscoveredService {
    let mut addresses: Vec<_> = info.get_addresses().iter().copied().collect();
    addresses.sort();

    let txt = info
        .get_properties()
        .iter()
        .map(|prop| format!("{}{}{}", prop.key(), TXT_SEPARATOR, prop.val_str()))
        .collect();

    DiscoveredService {
        service_type: info.get_type().to_string(),
        instance_name: info.get_fullname().to_string(),
        hostname: info.get_hostname().to_string(),
        addresses,
        port: info.get_port(),
        txt,
    }
}
