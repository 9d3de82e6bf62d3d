use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::{aggregator::Aggregator, config::Config, error::AppError, kind::ResourceKind};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
    pub default_namespace: String,
}

#[derive(Debug, Deserialize)]
pub struct NamespaceQuery {
    namespace: Option<String>,
}

impl NamespaceQuery {
    fn resolve<'a>(&'a self, state: &'a AppState) -> &'a str {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ns,
            _ => &state.default_namespace,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/cluster-context", get(cluster_context))
        .route("/pods", get(pods))
        .route("/nodes", get(nodes))
        .route("/deployments", get(deployments))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

pub async fn serve(config: &Config, aggregator: Aggregator) -> anyhow::Result<()> {
    let state = AppState {
        aggregator,
        default_namespace: config.default_namespace.clone(),
    };

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// Per-kind failures are part of the document, so this is always a 200.
async fn cluster_context(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NamespaceQuery>,
) -> Response {
    let snapshot = state.aggregator.collect(query.resolve(&state)).await;
    Json(snapshot).into_response()
}

async fn pods(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NamespaceQuery>,
) -> Result<Response, AppError> {
    names(&state, ResourceKind::Pods, query.resolve(&state)).await
}

async fn nodes(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    names(&state, ResourceKind::Nodes, &state.default_namespace).await
}

async fn deployments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NamespaceQuery>,
) -> Result<Response, AppError> {
    names(&state, ResourceKind::Deployments, query.resolve(&state)).await
}

async fn names(state: &AppState, kind: ResourceKind, namespace: &str) -> Result<Response, AppError> {
    let names = state.aggregator.names(kind, namespace).await.map_err(|e| {
        warn!("Can't list {kind} in {namespace}: {e}");
        AppError::from(e)
    })?;
    Ok(Json(json!({ (kind.key()): names })).into_response())
}
