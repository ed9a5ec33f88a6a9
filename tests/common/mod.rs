//! Shared helpers for HTTP-level tests: boots the full app on an ephemeral
//! port over the in-memory store.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};

use trailpass::api;
use trailpass::app_state::AppState;
use trailpass::config::Config;
use trailpass::domain::badge::default_catalog;
use trailpass::domain::{User, UserId};
use trailpass::persistence::{MemoryStore, Store};
use trailpass::service::SystemClock;

/// A running server plus a handle on its state.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Self {
        let config = Config {
            expiry_sweep_interval_secs: 0,
            ..Config::default()
        };
        let store = Store::Memory(MemoryStore::new());
        let Ok(_) = store.ensure_badges(&default_catalog()).await else {
            panic!("seeding badges failed");
        };
        let state = AppState::new(store, Arc::new(SystemClock), &config);
        let app = api::build_app(state.clone(), &config);

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn user(&self) -> UserId {
        let user = User::new("traveller", Utc::now());
        let id = user.id;
        let Ok(()) = self.state.store.insert_user(user).await else {
            panic!("inserting user failed");
        };
        id
    }

    /// Sends a request as `user` (or anonymously) and returns status and body.
    pub async fn call(
        &self,
        method: reqwest::Method,
        path: &str,
        user: Option<UserId>,
        body: Option<Value>,
    ) -> (reqwest::StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(user_id) = user {
            request = request.header("x-user-id", user_id.to_string());
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let Ok(response) = request.send().await else {
            panic!("request to {path} failed");
        };
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn post(&self, path: &str, user: Option<UserId>, body: Value) -> (reqwest::StatusCode, Value) {
        self.call(reqwest::Method::POST, path, user, Some(body)).await
    }

    pub async fn get(&self, path: &str, user: Option<UserId>) -> (reqwest::StatusCode, Value) {
        self.call(reqwest::Method::GET, path, user, None).await
    }

    /// Creates a destination through the admin endpoint and returns its body.
    pub async fn destination(&self, code: &str, lat: f64, lon: f64, points: i64) -> Value {
        let (status, body) = self
            .post(
                "/api/v1/admin/destinations",
                None,
                json!({
                    "name": code,
                    "category": "Museum",
                    "latitude": lat,
                    "longitude": lon,
                    "points_reward": points,
                    "qr_code": code,
                }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::CREATED, "{body}");
        body
    }

    /// Creates a reward through the admin endpoint and returns its id.
    pub async fn reward(&self, points: i64, stock: Option<i64>) -> String {
        let (status, body) = self
            .post(
                "/api/v1/admin/rewards",
                None,
                json!({
                    "name": format!("reward-{points}"),
                    "points_required": points,
                    "stock_quantity": stock,
                }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::CREATED, "{body}");
        let Some(id) = body.get("reward_id").and_then(Value::as_str) else {
            panic!("no reward_id in {body}");
        };
        id.to_string()
    }

    /// Checks `user` in exactly at the destination's coordinates.
    pub async fn check_in(&self, user: UserId, destination: &Value) -> (reqwest::StatusCode, Value) {
        self.post(
            "/api/v1/check-ins",
            Some(user),
            json!({
                "destination_code": destination["qr_code"],
                "latitude": destination["latitude"],
                "longitude": destination["longitude"],
            }),
        )
        .await
    }

    /// The ledger invariant: stored balance == sum of ledger deltas, checked
    /// through the public API and against the store.
    pub async fn assert_ledger_matches(&self, user: UserId) {
        let (_, profile) = self.get("/api/v1/me", Some(user)).await;
        let (_, history) = self.get("/api/v1/me/transactions?limit=200", Some(user)).await;
        let Some(rows) = history.as_array() else {
            panic!("history is not an array: {history}");
        };
        let sum: i64 = rows.iter().filter_map(|r| r["points"].as_i64()).sum();
        assert_eq!(Some(sum), profile["total_points"].as_i64());
        let Ok(stored) = self.state.store.ledger_sum(user).await else {
            panic!("ledger_sum failed");
        };
        assert_eq!(stored, sum);
    }
}
