//! Daily overview shown to every signed-in account.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::constants::limits::DASHBOARD_RECENT_VISITS;
use crate::db::{Store, VisitRow, clock};
use crate::domain::ActorContext;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for DashboardError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_visitors: u64,
    pub entries_today: u64,
    pub exits_today: u64,
    pub active_accounts: u64,
    pub currently_inside: u64,
    pub recent_visits: Vec<VisitRow>,
}

#[async_trait]
pub trait DashboardService: Send + Sync {
    async fn stats(&self, actor: &ActorContext) -> Result<DashboardStats, DashboardError>;
}

pub struct SeaOrmDashboardService {
    store: Store,
}

impl SeaOrmDashboardService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DashboardService for SeaOrmDashboardService {
    async fn stats(&self, actor: &ActorContext) -> Result<DashboardStats, DashboardError> {
        let today = clock::today();
        let (start, end) = (clock::start_of_day(today), clock::start_of_next_day(today));
        let visitors = self.store.visitors();
        let visits = self.store.visits();
        let users = self.store.users();

        let (total_visitors, entries_today, exits_today, active_accounts, currently_inside) =
            tokio::try_join!(
                visitors.count(),
                visits.count_entered_between(&start, &end),
                visits.count_exited_between(&start, &end),
                users.count_active(),
                visits.count_inside(),
            )?;

        let recent_visits = visits.recent(DASHBOARD_RECENT_VISITS).await?;

        tracing::debug!(actor_id = %actor.id, "Dashboard stats computed");

        Ok(DashboardStats {
            total_visitors,
            entries_today,
            exits_today,
            active_accounts,
            currently_inside,
            recent_visits,
        })
    }
}
