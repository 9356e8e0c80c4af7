use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use service_discovery::Discovery;
use shared::protocol::API_PREFIX;
use shared::types::ServiceEntry;

#[derive(Clone)]
pub struct AppState {
    pub discovery: Arc<Discovery>,
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub service_type: String,
    pub domain: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(&format!("{API_PREFIX}/config"), get(get_config))
        .route(&format!("{API_PREFIX}/services"), get(get_services))
        // Takes precedence over `:id`; config validation reserves the id "hash"
        .route(&format!("{API_PREFIX}/services/hash"), get(get_hash))
        .route(&format!("{API_PREFIX}/services/:id"), get(get_service))
        .with_state(state)
}

async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let config = state.discovery.config();
    Json(ConfigResponse {
        service_type: config.service_type.clone(),
        domain: config.domain.clone(),
    })
}

async fn get_services(State(state): State<AppState>) -> Result<Json<Vec<String>>, StatusCode> {
    state
        .discovery
        .services()
        .await
        .map(|mut ids| {
            ids.sort();
            Json(ids)
        })
        .map_err(|e| {
            tracing::error!("Failed to list services: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

async fn get_hash(State(state): State<AppState>) -> String {
    let hash_rx = state.discovery.hash_watch();
    let hash = hash_rx.borrow().clone();
    hash
}

async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServiceEntry>, StatusCode> {
    state
        .discovery
        .service_by_id(&id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to query service: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use service_discovery::mdns::simulator::SimulatorEngine;
    use service_discovery::DiscoveryConfig;
    use tower::ServiceExt;
    use crate::config::ServiceConfig;
    use crate::service::StaticService;

    async fn app() -> Router {
        let discovery = Discovery::with_engine(
            DiscoveryConfig::new("_myService._tcp"),
            Arc::new(SimulatorEngine::new()),
        );
        let service = StaticService::from_config(
            &ServiceConfig {
                id: "svc1".to_string(),
                hostname: Some("host1".to_string()),
                instance_name: None,
                bind: None,
                port: 8080,
                service_type: None,
                config: json!({"v": "1", "env": "prod"}),
            },
            "_myService._tcp",
        )
        .unwrap();
        discovery.register(&service).await.unwrap();

        router(AppState {
            discovery: Arc::new(discovery),
        })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_list_services() {
        let (status, body) = get(app().await, "/v1/services").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(ids, vec!["svc1".to_string()]);
    }

    #[tokio::test]
    async fn test_get_service() {
        let (status, body) = get(app().await, "/v1/services/svc1").await;
        assert_eq!(status, StatusCode::OK);
        let entry: ServiceEntry = serde_json::from_slice(&body).unwrap();
        assert_eq!(entry.hostname, "host1");
        assert_eq!(entry.port, 8080);
        assert!(entry.txt.contains(&"env=prod".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_service_is_not_found() {
        let (status, _) = get(app().await, "/v1/services/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_hash_is_hex() {
        let (status, body) = get(app().await, "/v1/services/hash").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.len(), 64);
    }

    #[tokio::test]
    async fn test_config() {
        let (_, body) = get(app().await, "/v1/config").await;
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["service_type"], "_myService._tcp");
        assert_eq!(value["domain"], "local.");
    }
}
