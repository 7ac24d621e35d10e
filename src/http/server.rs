//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single fallback handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Buffer the body, match the site grammar, run the route's handler
//! - Record request metrics
//! - Serve until shutdown
//!
//! # Design Decisions
//! - Axum does no routing of its own: the site grammar is the only router
//! - A routing miss is a plain 404, never an error

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app::AppContext;
use crate::config::ServerConfig;
use crate::db::Database;
use crate::http::request::{routing_request, scope};
use crate::http::response::AxumInterpreter;
use crate::interpreter::Environment;
use crate::lifecycle::signals::wait_for_shutdown;
use crate::observability::metrics;
use crate::site;

/// State injected into the fallback handler.
pub struct ServerState<D: Database> {
    pub app: Arc<AppContext<D>>,
    pub max_body_size: usize,
}

impl<D: Database> Clone for ServerState<D> {
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            max_body_size: self.max_body_size,
        }
    }
}

/// HTTP server for the site.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new<D: Database>(app: Arc<AppContext<D>>, config: &ServerConfig) -> Self {
        let state = ServerState {
            app,
            max_body_size: config.security.max_body_size,
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<D: Database>(config: &ServerConfig, state: ServerState<D>) -> Router {
        Router::new()
            .fallback(site_handler::<D>)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server until a shutdown is triggered or Ctrl+C arrives.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Match the site grammar and run the route's handler.
async fn site_handler<D: Database>(State(state): State<ServerState<D>>, request: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Request body rejected");
            metrics::record_request(method.as_str(), 413, "none", start);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let request = routing_request(&parts, body);
    let scope = scope(&parts, &request, &state.app.session_cookie);

    let Some(route) = state.app.site.match_request(&request) else {
        tracing::debug!(request_id = %scope.request_id, method = %method, path = %parts.uri.path(), "No route matched");
        metrics::record_routing_miss();
        metrics::record_request(method.as_str(), 404, "none", start);
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    let route_name = route.name();
    tracing::debug!(request_id = %scope.request_id, route = route_name, "Dispatching");

    let interpreter = AxumInterpreter::new(Environment::new(Arc::clone(&state.app), scope));
    let response = site::serve(interpreter, route).await;

    metrics::record_request(method.as_str(), response.status().as_u16(), route_name, start);
    response
}
