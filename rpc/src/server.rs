//! Axum-based API server.

use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;

use vigil_store::Stores;

use crate::error::RpcError;
use crate::handlers;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct RpcState {
    pub stores: Stores,
    /// Served at `/metrics` when present.
    pub metrics: Option<prometheus::Registry>,
}

pub struct RpcServer {
    pub port: u16,
    state: RpcState,
}

/// All routes over `state`.
pub fn router(state: RpcState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/proposals", get(handlers::list_proposals))
        .route("/proposals/:network", get(handlers::network_proposals))
        .route("/rewards", get(handlers::list_rewards))
        .route("/metrics", get(handlers::metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl RpcServer {
    pub fn new(port: u16, state: RpcState) -> Self {
        Self { port, state }
    }

    /// Bind and serve until the task is dropped.
    pub async fn start(&self) -> Result<(), RpcError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| RpcError::Server(format!("cannot bind {addr}: {e}")))?;
        tracing::info!(%addr, "API listening");
        axum::serve(listener, router(self.state.clone()))
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;
    use vigil_nullables::NullStore;
    use vigil_store::{ProposalLogStore, RewardStore};
    use vigil_types::{Coins, RewardRecord, Timestamp, WithdrawStatus};

    /// 2024-05-01T00:00:00Z
    const MAY_FIRST: u64 = 1_714_521_600;

    fn api_state(metrics: Option<prometheus::Registry>) -> (Arc<NullStore>, RpcState) {
        let store = Arc::new(NullStore::new());
        let state = RpcState {
            stores: Stores::from_shared(store.clone()),
            metrics,
        };
        (store, state)
    }

    async fn get_json(state: RpcState, uri: &str) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (_, state) = api_state(None);
        let (status, body) = get_json(state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn proposals_are_filtered_by_date_and_network() {
        let (store, state) = api_state(None);
        store
            .upsert_proposal_log("cosmoshub", 1, "Upgrade", Timestamp::new(MAY_FIRST))
            .unwrap();
        store
            .upsert_proposal_log("osmosis", 2, "Incentives", Timestamp::new(MAY_FIRST + 86_400))
            .unwrap();

        let (status, body) =
            get_json(state.clone(), "/proposals?start=2024-05-01&end=2024-05-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["proposals"].as_array().unwrap().len(), 1);

        let (_, body) = get_json(state.clone(), "/proposals").await;
        assert_eq!(body["proposals"].as_array().unwrap().len(), 2);

        let (_, body) = get_json(state, "/proposals/osmosis").await;
        let rows = body["proposals"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Incentives");
    }

    #[tokio::test]
    async fn malformed_date_is_bad_request() {
        let (_, state) = api_state(None);
        let (status, body) = get_json(state, "/proposals?start=May").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("YYYY-MM-DD"));
    }

    #[tokio::test]
    async fn rewards_by_chain_and_period() {
        let (store, state) = api_state(None);
        let mut rewards = Coins::new();
        rewards.add(vigil_types::Coin::new("uatom", 2000)).unwrap();
        store
            .record_reward(&RewardRecord {
                chain_id: "cosmoshub-4".into(),
                network: "cosmoshub".into(),
                denom: "uatom".into(),
                validator_address: "cosmosvaloper1x".into(),
                rewards,
                commission: Coins::new(),
                period: "2024-05-01".into(),
                txhash: "AB".into(),
                status: WithdrawStatus::Confirmed,
                recorded_at: Timestamp::new(MAY_FIRST),
            })
            .unwrap();

        let (status, body) =
            get_json(state.clone(), "/rewards?chain_id=cosmoshub-4&date=2024-05-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rewards"].as_array().unwrap().len(), 1);

        let (_, body) =
            get_json(state.clone(), "/rewards?chain_id=cosmoshub-4&date=2024-06-01").await;
        assert!(body["rewards"].as_array().unwrap().is_empty());

        let (status, _) = get_json(state, "/rewards").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn metrics_need_a_registry() {
        let (_, state) = api_state(None);
        let (status, _) = get_json(state, "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let registry = prometheus::Registry::new();
        let counter = prometheus::IntCounter::new("vigil_test_total", "test").unwrap();
        registry.register(Box::new(counter.clone())).unwrap();
        counter.inc();
        let (_, state) = api_state(Some(registry));
        let response = router(state)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("vigil_test_total 1"));
    }
}
