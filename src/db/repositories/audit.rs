use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::db::clock;
use crate::domain::{ActorId, AuditAction, EntityKind};
use crate::entities::{audit_entries, prelude::*};

/// One administrative action about to be recorded.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    /// `None` for actions taken by the system itself.
    pub actor_id: Option<ActorId>,
    pub action: AuditAction,
    pub entity: EntityKind,
    pub entity_id: i32,
    pub description: String,
    pub source_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuditQuery {
    pub actor_id: Option<ActorId>,
    pub action: Option<AuditAction>,
    /// Inclusive lower bound on `created_at`.
    pub from: Option<String>,
    /// Exclusive upper bound on `created_at`.
    pub before: Option<String>,
    pub page: u64,
    pub page_size: u64,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            actor_id: None,
            action: None,
            from: None,
            before: None,
            page: 1,
            page_size: 50,
        }
    }
}

/// Append-only store; entries are never updated or removed through here.
pub struct AuditRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> AuditRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn add(&self, entry: NewAuditEntry) -> Result<audit_entries::Model, DbErr> {
        audit_entries::ActiveModel {
            actor_id: Set(entry.actor_id.map(i32::from)),
            action: Set(entry.action.as_str().to_string()),
            entity_type: Set(entry.entity.as_str().to_string()),
            entity_id: Set(entry.entity_id),
            description: Set(entry.description),
            created_at: Set(clock::now()),
            source_address: Set(entry.source_address),
            ..Default::default()
        }
        .insert(self.conn)
        .await
    }

    /// Returns one page of entries, newest first, with the total page count.
    pub async fn query(&self, filter: &AuditQuery) -> Result<(Vec<audit_entries::Model>, u64), DbErr> {
        let mut query = AuditEntries::find()
            .order_by_desc(audit_entries::Column::CreatedAt)
            .order_by_desc(audit_entries::Column::Id);

        if let Some(actor_id) = filter.actor_id {
            query = query.filter(audit_entries::Column::ActorId.eq(actor_id.value()));
        }

        if let Some(action) = filter.action {
            query = query.filter(audit_entries::Column::Action.eq(action.as_str()));
        }

        if let Some(from) = &filter.from {
            query = query.filter(audit_entries::Column::CreatedAt.gte(from.as_str()));
        }

        if let Some(before) = &filter.before {
            query = query.filter(audit_entries::Column::CreatedAt.lt(before.as_str()));
        }

        let paginator = query.paginate(self.conn, filter.page_size.max(1));
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(filter.page.max(1) - 1).await?;

        Ok((items, total_pages))
    }

    /// Entries about one entity, oldest first.
    pub async fn for_entity(
        &self,
        entity: EntityKind,
        entity_id: i32,
    ) -> Result<Vec<audit_entries::Model>, DbErr> {
        AuditEntries::find()
            .filter(audit_entries::Column::EntityType.eq(entity.as_str()))
            .filter(audit_entries::Column::EntityId.eq(entity_id))
            .order_by_asc(audit_entries::Column::CreatedAt)
            .order_by_asc(audit_entries::Column::Id)
            .all(self.conn)
            .await
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        AuditEntries::find().count(self.conn).await
    }
}
