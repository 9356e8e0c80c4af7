use std::collections::HashMap;
use shared::types::ServiceEntry;

/// In-process map from service id to the last entry registered under it.
/// Not synchronized; `RegistryHandle` owns one on a dedicated thread.
#[derive(Debug, Default)]
pub struct Registry {
    services: HashMap<String, ServiceEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `entry.id`. Returns true if data changed.
    pub fn upsert(&mut self, entry: ServiceEntry) -> bool {
        let changed = match self.services.get(&entry.id) {
            Some(old) => service_data_changed(old, &entry),
            None => true,
        };
        self.services.insert(entry.id.clone(), entry);
        changed
    }

    pub fn remove(&mut self, id: &str) -> Option<ServiceEntry> {
        self.services.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&ServiceEntry> {
        self.services.get(id)
    }

    /// All known ids, in no particular order
    pub fn ids(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<ServiceEntry> {
        self.services.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn clear(&mut self) {
        self.services.clear();
    }
}

/// Compare the announced fields; `registered_at` moves on every upsert.
fn service_data_changed(old: &ServiceEntry, new: &ServiceEntry) -> bool {
    old.hostname != new.hostname
        || old.port != new.port
        || old.txt != new.txt
        || old.service_type != new.service_type
        || old.instance_name != new.instance_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_entry(id: &str, hostname: &str, port: u16) -> ServiceEntry {
        ServiceEntry {
            id: id.to_string(),
            service_type: "_myService._tcp".to_string(),
            instance_name: format!("{hostname}._myService._tcp.local."),
            hostname: hostname.to_string(),
            port,
            txt: vec!["v=1".to_string()],
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut registry = Registry::new();
        let changed = registry.upsert(test_entry("svc1", "host1", 8080));
        assert!(changed, "First insert should report change");

        let entry = registry.get("svc1").unwrap();
        assert_eq!(entry.hostname, "host1");
        assert_eq!(entry.port, 8080);
    }

    #[test]
    fn test_last_write_wins() {
        let mut registry = Registry::new();
        registry.upsert(test_entry("svc1", "host1", 8080));
        registry.upsert(test_entry("svc1", "host2", 9090));

        assert_eq!(registry.len(), 1);
        let entry = registry.get("svc1").unwrap();
        assert_eq!(entry.hostname, "host2");
        assert_eq!(entry.port, 9090);
    }

    #[test]
    fn test_upsert_detects_changes() {
        let mut registry = Registry::new();
        let mut entry = test_entry("svc1", "host1", 8080);
        registry.upsert(entry.clone());

        // Only the timestamp moved
        entry.registered_at = Utc::now() + chrono::Duration::seconds(5);
        assert!(!registry.upsert(entry.clone()), "Identical data should not report change");

        entry.txt.push("env=prod".to_string());
        assert!(registry.upsert(entry), "Modified TXT should report change");
    }

    #[test]
    fn test_ids_are_distinct() {
        let mut registry = Registry::new();
        for i in 0..5 {
            registry.upsert(test_entry(&format!("svc{i}"), "host", 8000 + i));
        }

        let mut ids = registry.ids();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_unknown_id_is_absent() {
        let registry = Registry::new();
        assert!(registry.get("missing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut registry = Registry::new();
        registry.upsert(test_entry("svc1", "host1", 8080));
        registry.upsert(test_entry("svc2", "host2", 8081));

        let removed = registry.remove("svc1").unwrap();
        assert_eq!(removed.hostname, "host1");
        assert!(registry.remove("svc1").is_none());

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.entries().is_empty());
    }
}
