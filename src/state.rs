use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuditService, DashboardService, ReportService, SeaOrmAuditService, SeaOrmDashboardService,
    SeaOrmReportService, SeaOrmUserService, SeaOrmVisitService, SeaOrmVisitorService, UserService,
    VisitService, VisitorService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub user_service: Arc<dyn UserService>,

    pub visitor_service: Arc<dyn VisitorService>,

    pub visit_service: Arc<dyn VisitService>,

    pub report_service: Arc<dyn ReportService>,

    pub audit_service: Arc<dyn AuditService>,

    pub dashboard_service: Arc<dyn DashboardService>,
}

impl SharedState {
    /// Opens the store, applies migrations and creates the bootstrap
    /// administrator when no account exists yet.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        store
            .ensure_bootstrap_admin(&config.bootstrap, &config.security)
            .await?;

        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn UserService + Send + Sync + 'static>;

        let visitor_service = Arc::new(SeaOrmVisitorService::new(store.clone()))
            as Arc<dyn VisitorService + Send + Sync + 'static>;

        let visit_service = Arc::new(SeaOrmVisitService::new(store.clone()))
            as Arc<dyn VisitService + Send + Sync + 'static>;

        let report_service = Arc::new(SeaOrmReportService::new(store.clone()))
            as Arc<dyn ReportService + Send + Sync + 'static>;

        let audit_service = Arc::new(SeaOrmAuditService::new(store.clone()))
            as Arc<dyn AuditService + Send + Sync + 'static>;

        let dashboard_service = Arc::new(SeaOrmDashboardService::new(store.clone()))
            as Arc<dyn DashboardService + Send + Sync + 'static>;

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            user_service,
            visitor_service,
            visit_service,
            report_service,
            audit_service,
            dashboard_service,
        }
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
