//! Single-listener gateway serving gRPC, gRPC-Web and the JSON fallback.
//!
//! Every exchange goes through one fallback handler that classifies it into a
//! [`Lane`] and dispatches. The CORS middleware wraps all lanes, so every
//! response carries the same CORS header set.

pub mod cors;
pub mod lane;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use comment_relay_sdk::{GET_POST_COMMENTS_METHOD, RedditServiceServer, SERVICE_NAME};
use http::StatusCode;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tonic::service::Routes;
use tonic_web::{GrpcWebLayer, GrpcWebService};
use tower::{Layer, ServiceExt};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::api::grpc::RedditServiceImpl;
use crate::api::rest;
use crate::config::GatewayConfig;
use crate::domain::{FetchService, PublishPipeline};

pub use cors::{CorsConfigError, CorsPolicy};
pub use lane::{Lane, ServicePaths};

type RpcService = GrpcWebService<Routes>;

#[derive(Clone)]
struct GatewayState {
    paths: Arc<ServicePaths>,
    fetch: Arc<FetchService>,
    rpc: RpcService,
    banner: Arc<str>,
    body_limit: usize,
}

/// Assembled gateway: lane classifier, JSON handler and gRPC stack behind one router.
pub struct Gateway {
    state: GatewayState,
    cors: CorsPolicy,
}

impl Gateway {
    /// Wire the gateway around the shared domain services.
    ///
    /// # Errors
    /// Returns [`CorsConfigError`] when the CORS configuration cannot be rendered as headers.
    pub fn new(
        cfg: &GatewayConfig,
        fetch: Arc<FetchService>,
        publisher: Arc<PublishPipeline>,
    ) -> Result<Self, CorsConfigError> {
        let cors = CorsPolicy::from_config(&cfg.cors)?;

        let service = RedditServiceServer::new(RedditServiceImpl::new(fetch.clone(), publisher));
        let rpc = GrpcWebLayer::new().layer(Routes::new(service));

        Ok(Self {
            state: GatewayState {
                paths: Arc::new(ServicePaths::new(SERVICE_NAME, GET_POST_COMMENTS_METHOD)),
                fetch,
                rpc,
                banner: Arc::from(cfg.banner.as_str()),
                body_limit: cfg.body_limit_bytes,
            },
            cors,
        })
    }

    /// Build the axum router. Every path goes to the lane dispatcher.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(self.state.clone())
            .layer(middleware::from_fn_with_state(
                self.cors.clone(),
                cors::apply_cors_headers,
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve HTTP/1.1 and HTTP/2 (prior knowledge) on `listener` until `cancel` fires,
    /// then drain open connections.
    ///
    /// # Errors
    /// Returns an error when the listener fails.
    pub async fn serve(self, listener: TcpListener, cancel: CancellationToken) -> anyhow::Result<()> {
        let bound_addr = listener.local_addr()?;
        info!(%bound_addr, service = SERVICE_NAME, "gateway listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
            })
            .await?;

        info!("gateway stopped");
        Ok(())
    }
}

async fn dispatch(State(state): State<GatewayState>, req: Request) -> Response {
    let lane = state
        .paths
        .classify(req.method(), req.uri().path(), req.headers());
    debug!(lane = lane.as_str(), method = %req.method(), path = %req.uri().path(), "dispatching");

    match lane {
        Lane::Preflight => StatusCode::OK.into_response(),
        Lane::JsonFallback => {
            rest::get_post_comments(&state.fetch, req.into_body(), state.body_limit).await
        }
        Lane::Rpc => call_rpc(state.rpc, req).await,
        Lane::Unroutable { in_service: true } => (
            StatusCode::BAD_REQUEST,
            format!(
                "unsupported request to {}: send gRPC or gRPC-Web, or JSON to {}",
                req.uri().path(),
                state.paths.json_endpoint()
            ),
        )
            .into_response(),
        Lane::Unroutable { in_service: false } => {
            (StatusCode::OK, state.banner.to_string()).into_response()
        }
    }
}

async fn call_rpc(rpc: RpcService, req: Request) -> Response {
    match rpc.oneshot(req).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
