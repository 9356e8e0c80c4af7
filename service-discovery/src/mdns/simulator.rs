//! In-memory `MdnsEngine` that never touches the network.

use std::collections::HashMap;
use std::sync::Mutex;
use mdns_sd::ServiceEvent;
use crate::error::DiscoveryError;
use super::engine::{Announcement, MdnsEngine};

/// Records every call and lets tests inject browse events.
#[derive(Default)]
pub struct SimulatorEngine {
    state: Mutex<SimulatorState>,
}

#[derive(Default)]
struct SimulatorState {
    announced: HashMap<String, Announcement>,
    withdrawn: Vec<String>,
    browsers: HashMap<String, flume::Sender<ServiceEvent>>,
    fail_register: bool,
    fail_unregister: bool,
    shut_down: bool,
}

impl SimulatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `register` fail
    pub fn fail_registrations(&self) {
        self.lock().fail_register = true;
    }

    /// Make every subsequent `unregister` fail
    pub fn fail_unregistrations(&self) {
        self.lock().fail_unregister = true;
    }

    /// Announcements currently live, keyed by full name
    pub fn announced(&self) -> HashMap<String, Announcement> {
        self.lock().announced.clone()
    }

    /// Full names passed to `unregister`, in call order
    pub fn withdrawn(&self) -> Vec<String> {
        self.lock().withdrawn.clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock().shut_down
    }

    /// Deliver an event to the browser of `ty_domain`. Returns false when
    /// nobody is browsing that type.
    pub fn emit(&self, ty_domain: &str, event: ServiceEvent) -> bool {
        match self.lock().browsers.get(ty_domain) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimulatorState> {
        // A panic while holding the lock only happens inside a failing test
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MdnsEngine for SimulatorEngine {
    fn register(&self, announcement: &Announcement) -> Result<String, DiscoveryError> {
        let mut state = self.lock();
        if state.fail_register {
            return Err(DiscoveryError::ServiceInfo("simulated registration failure".to_string()));
        }
        let fullname = announcement.fullname();
        state.announced.insert(fullname.clone(), announcement.clone());
        Ok(fullname)
    }

    fn unregister(&self, fullname: &str) -> Result<(), DiscoveryError> {
        let mut state = self.lock();
        if state.fail_unregister {
            return Err(DiscoveryError::ServiceInfo("simulated unregister failure".to_string()));
        }
        state.announced.remove(fullname);
        state.withdrawn.push(fullname.to_string());
        Ok(())
    }

    fn browse(&self, ty_domain: &str) -> Result<flume::Receiver<ServiceEvent>, DiscoveryError> {
        let (tx, rx) = flume::unbounded();
        self.lock().browsers.insert(ty_domain.to_string(), tx);
        Ok(rx)
    }

    fn stop_browse(&self, ty_domain: &str) -> Result<(), DiscoveryError> {
        self.lock().browsers.remove(ty_domain);
        Ok(())
    }

    fn shutdown(&self) -> Result<(), DiscoveryError> {
        let mut state = self.lock();
        state.browsers.clear();
        state.shut_down = true;
        Ok(())
    }
}
