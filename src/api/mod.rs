use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::net::IpAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use anyhow::Context;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::state::SharedState;

mod audit;
pub mod auth;
pub mod client_address;
mod dashboard;
mod error;
mod observability;
mod reports;
mod system;
pub mod types;
mod users;
mod validation;
mod visitors;
mod visits;

pub use client_address::ClientAddress;
pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub session_store: SqliteStore,

    /// Peers whose `X-Forwarded-For` header is believed.
    pub trusted_proxies: Vec<IpAddr>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn crate::services::UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn visitor_service(&self) -> &Arc<dyn crate::services::VisitorService> {
        &self.shared.visitor_service
    }

    #[must_use]
    pub fn visit_service(&self) -> &Arc<dyn crate::services::VisitService> {
        &self.shared.visit_service
    }

    #[must_use]
    pub fn report_service(&self) -> &Arc<dyn crate::services::ReportService> {
        &self.shared.report_service
    }

    #[must_use]
    pub fn audit_service(&self) -> &Arc<dyn crate::services::AuditService> {
        &self.shared.audit_service
    }

    #[must_use]
    pub fn dashboard_service(&self) -> &Arc<dyn crate::services::DashboardService> {
        &self.shared.dashboard_service
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let session_store = SqliteStore::new(shared.store.sqlite_pool().clone());
    session_store
        .migrate()
        .await
        .context("Failed to create the session table")?;

    let trusted_proxies = {
        let config = shared.config.read().await;
        client_address::parse_trusted_proxies(&config.server.trusted_proxy_ips)
    };

    Ok(Arc::new(AppState {
        shared,
        session_store,
        trusted_proxies,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, inactivity_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_inactivity_minutes,
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let session_layer = SessionManagerLayer::new(state.session_store.clone())
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            inactivity_minutes,
        )));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(protected_routes)
        .route("/", get(auth::session_status).post(auth::login))
        .route("/health/live", get(system::health_live))
        .route("/health/ready", get(system::health_ready))
        .layer(session_layer)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            client_address::client_address_middleware,
        ))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(observability::security_headers_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/logout/", get(auth::logout))
        .route("/dashboard/", get(dashboard::get_dashboard))
        .route("/usuarios/crear/", post(users::create_user))
        .route("/usuarios/listar/", get(users::list_users))
        .route(
            "/usuarios/{id}/editar/",
            get(users::get_user).post(users::update_user),
        )
        .route(
            "/usuarios/{id}/eliminar/",
            get(users::confirm_delete_user).post(users::delete_user),
        )
        .route(
            "/visitantes/registrar/",
            get(visitors::document_types).post(visitors::create_visitor),
        )
        .route("/visitantes/listar/", get(visitors::list_visitors))
        .route(
            "/visitantes/{id}/editar/",
            get(visitors::get_visitor).post(visitors::update_visitor),
        )
        .route("/visitantes/{id}/estado/", get(visits::presence))
        .route(
            "/registros/entrada/",
            get(visits::check_in_candidates).post(visits::check_in),
        )
        .route(
            "/registros/salida/",
            get(visits::check_out_candidates).post(visits::check_out),
        )
        .route("/registros/recientes/", get(visits::recent_visits))
        .route(
            "/registros/consultar/",
            get(visits::query_visits).post(visits::query_visits_form),
        )
        .route(
            "/registros/reporte/",
            get(reports::report).post(reports::report_form),
        )
        .route("/auditoria/", get(audit::list_audit_entries))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
