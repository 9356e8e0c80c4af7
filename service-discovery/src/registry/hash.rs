use serde::Serialize;
use sha2::{Sha256, Digest};
use shared::types::ServiceEntry;

/// Stable fields only; `registered_at` changes on every re-registration.
#[derive(Serialize)]
struct HashView<'a> {
    id: &'a str,
    service_type: &'a str,
    instance_name: &'a str,
    hostname: &'a str,
    port: u16,
    txt: &'a [String],
}

/// Computes a SHA-256 hash of the registry contents.
/// Entries are sorted by id for deterministic output.
pub fn compute_hash(services: &[ServiceEntry]) -> String {
    let mut indices: Vec<usize> = (0..services.len()).collect();
    indices.sort_by(|&a, &b| services[a].id.cmp(&services[b].id));

    let views: Vec<HashView<'_>> = indices
        .iter()
        .map(|&i| {
            let s = &services[i];
            HashView {
                id: &s.id,
                service_type: &s.service_type,
                instance_name: &s.instance_name,
                hostname: &s.hostname,
                port: s.port,
                txt: &s.txt,
            }
        })
        .collect();

    let json = serde_json::to_string(&views)
        .expect("Failed to serialize registry for hashing");

    hex::encode(Sha256::digest(json.as_bytes()))
}
