use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use carebook_core::PremiumModel;
use carebook_storage::{DynStore, StorageError, create_store};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::AppConfig, handlers, middleware as app_middleware, registry::PatientRegistry};

/// Shared handler state. Nothing in here caches patient data; every request
/// goes through the registry to the store.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PatientRegistry>,
    pub premium_model: Option<Arc<dyn PremiumModel>>,
}

impl AppState {
    pub fn new(store: DynStore) -> Self {
        Self {
            registry: Arc::new(PatientRegistry::new(store)),
            premium_model: None,
        }
    }

    pub fn with_premium_model(mut self, model: Arc<dyn PremiumModel>) -> Self {
        self.premium_model = Some(model);
        self
    }
}

pub struct CarebookServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the router with the store described by `cfg`.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StorageError> {
    let store = create_store(&cfg.storage).await?;
    Ok(router(AppState::new(store), cfg.server.body_limit_bytes))
}

pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        // Info endpoints
        .route("/", get(handlers::root))
        .route("/about", get(handlers::about))
        .route("/healthz", get(handlers::healthz))
        // Patient records
        .route("/view", get(handlers::view))
        .route("/patient/{patient_id}", get(handlers::view_patient))
        .route("/sort", get(handlers::sort_patients))
        .route("/create", post(handlers::create_patient))
        .route("/edit/{patient_id}", put(handlers::edit_patient))
        .route("/delete/{patient_id}", delete(handlers::delete_patient))
        // Premium prediction
        .route("/predict", post(handlers::predict_premium))
        .with_state(state)
        // Middleware stack, outermost last: request id -> trace -> cors/compression -> content negotiation -> body limit
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(app_middleware::content_negotiation))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
}

pub struct ServerBuilder {
    config: AppConfig,
    premium_model: Option<Arc<dyn PremiumModel>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            premium_model: None,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    pub fn with_premium_model(mut self, model: Arc<dyn PremiumModel>) -> Self {
        self.premium_model = Some(model);
        self
    }

    pub async fn build(self) -> Result<CarebookServer, StorageError> {
        let store = create_store(&self.config.storage).await?;
        tracing::info!(
            backend = store.backend_name(),
            path = %self.config.storage.path.display(),
            "patient store ready"
        );

        let mut state = AppState::new(store);
        match self.premium_model {
            Some(model) => state = state.with_premium_model(model),
            None => tracing::warn!("no premium model configured; /predict will answer 503"),
        }

        Ok(CarebookServer {
            addr: self.config.addr(),
            app: router(state, self.config.server.body_limit_bytes),
        })
    }
}

impl CarebookServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("cannot listen on {}", self.addr))?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
