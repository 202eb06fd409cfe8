//! Decision service.
//!
//! # Responsibilities
//! - Create Axum Router with the decision handler
//! - Wire up middleware (tracing, timeout, auto-respond lookup)
//! - Serve until the shutdown signal fires
//!
//! Every request path is answered with the substitution decision:
//! `200` with the target in `x-autoresponder-target` (and the body), or
//! `404` when no rule applies.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header::HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::autoresp::RuleStore;
use crate::config::ResponderConfig;
use crate::http::layer::{AutoRespondLayer, LocalSubstitute};
use crate::lifecycle::ShutdownSignal;

/// Response header carrying the matched local file pattern.
pub const X_AUTORESPONDER_TARGET: &str = "x-autoresponder-target";

/// HTTP server answering substitution lookups.
pub struct DecisionServer {
    router: Router,
}

impl DecisionServer {
    /// Create a new server over `store`.
    pub fn new(config: &ResponderConfig, store: Arc<RuleStore>) -> Self {
        Self {
            router: Self::build_router(config, store),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ResponderConfig, store: Arc<RuleStore>) -> Router {
        Router::new()
            .fallback(decide)
            .layer(AutoRespondLayer::new(store))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The configured router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Decision server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let reason = shutdown.recv().await;
                tracing::info!(?reason, "Shutdown signal received");
            })
            .await?;

        tracing::info!("Decision server stopped");
        Ok(())
    }
}

async fn decide(request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();

    let Some(LocalSubstitute(target)) = request.extensions().get::<LocalSubstitute>().cloned()
    else {
        tracing::debug!(path = %path, "No local substitute");
        return (StatusCode::NOT_FOUND, "no match").into_response();
    };

    let mut response = (StatusCode::OK, target.to_string()).into_response();
    match HeaderValue::from_str(&target) {
        Ok(value) => {
            response.headers_mut().insert(X_AUTORESPONDER_TARGET, value);
        }
        Err(_) => {
            tracing::warn!(path = %path, "Target is not a valid header value, sent in body only");
        }
    }
    response
}
