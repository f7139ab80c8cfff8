//! A2A HTTP server
//!
//! Exposes the task handler over JSON-RPC (`POST /`) next to discovery and
//! monitoring endpoints:
//!
//! - `GET /.well-known/agent.json` - agent card
//! - `GET /health` - liveness plus stored task count
//! - `GET /metrics` - metrics snapshot
//! - `GET /` - service info

pub mod rpc;

pub use rpc::{dispatch, handle_body};

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::observability::metrics;
use crate::protocol::AgentCard;
use crate::task::TaskHandler;
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use warp::{Filter, Rejection, Reply};

/// Largest JSON-RPC body accepted
const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Protocol name reported by `/health` and `/`
pub const PROTOCOL: &str = "A2A";

/// HTTP front end for one task handler
#[derive(Debug, Clone)]
pub struct A2aServer {
    handler: TaskHandler,
    card: Arc<AgentCard>,
}

impl A2aServer {
    pub fn new(config: &AgentConfig, handler: TaskHandler) -> Self {
        Self {
            handler,
            card: Arc::new(AgentCard::from_config(config)),
        }
    }

    pub fn agent_card(&self) -> &AgentCard {
        &self.card
    }

    pub fn handler(&self) -> &TaskHandler {
        &self.handler
    }

    /// All routes with permissive CORS
    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let rpc_handler = self.handler.clone();
        let rpc_route = warp::path::end()
            .and(warp::post())
            .and(warp::body::content_length_limit(MAX_BODY_BYTES))
            .and(warp::body::bytes())
            .and(warp::any().map(move || rpc_handler.clone()))
            .and_then(rpc_reply);

        let card = Arc::clone(&self.card);
        let card_route = warp::path!(".well-known" / "agent.json")
            .and(warp::get())
            .map(move || warp::reply::json(card.as_ref()));

        let health_handler = self.handler.clone();
        let health_card = Arc::clone(&self.card);
        let health_route = warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .map(move || {
                warp::reply::json(&HealthResponse {
                    status: "healthy",
                    service: health_card.name.clone(),
                    version: health_card.version.clone(),
                    protocol: PROTOCOL,
                    tasks: health_handler.store().len(),
                })
            });

        let metrics_route = warp::path("metrics")
            .and(warp::path::end())
            .and(warp::get())
            .map(|| warp::reply::json(&metrics().get_metrics()));

        let info_card = Arc::clone(&self.card);
        let info_route = warp::path::end().and(warp::get()).map(move || {
            let mut endpoints = HashMap::new();
            endpoints.insert("POST /", "JSON-RPC 2.0: tasks/send, tasks/get, tasks/cancel");
            endpoints.insert("GET /.well-known/agent.json", "Agent card");
            endpoints.insert("GET /health", "Service health and stored task count");
            endpoints.insert("GET /metrics", "Task, pipeline, and RPC metrics");

            warp::reply::json(&ServiceInfo {
                service: info_card.name.clone(),
                description: info_card.description.clone(),
                version: info_card.version.clone(),
                protocol: PROTOCOL,
                agent_card: "/.well-known/agent.json",
                endpoints,
            })
        });

        rpc_route
            .or(card_route)
            .or(health_route)
            .or(metrics_route)
            .or(info_route)
            .with(
                warp::cors()
                    .allow_any_origin()
                    .allow_methods(vec!["GET", "POST", "OPTIONS"])
                    .allow_headers(vec![
                        "content-type",
                        "authorization",
                        "x-api-key",
                        "accept",
                    ]),
            )
    }

    /// Bind to `addr` and serve until `shutdown` resolves
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> AgentResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (bound, server) = warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .map_err(|e| AgentError::internal_error(format!("Failed to bind {addr}: {e}")))?;

        info!(
            address = %bound,
            agent = %self.card.name,
            "A2A server listening"
        );
        server.await;
        info!("A2A server stopped");

        Ok(())
    }
}

async fn rpc_reply(body: Bytes, handler: TaskHandler) -> Result<impl Reply, Infallible> {
    let response = handle_body(&handler, &body).await;
    Ok(warp::reply::json(&response))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: String,
    version: String,
    protocol: &'static str,
    tasks: usize,
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    service: String,
    description: String,
    version: String,
    protocol: &'static str,
    agent_card: &'static str,
    endpoints: HashMap<&'static str, &'static str>,
}
