use crate::entities::{audit_entries, visit_events};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_visit_events_entered_at")
                    .table(visit_events::Entity)
                    .col((visit_events::Column::EnteredAt, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_visit_events_visitor_entered_at")
                    .table(visit_events::Entity)
                    .col(visit_events::Column::VisitorId)
                    .col((visit_events::Column::EnteredAt, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_entries_created_at")
                    .table(audit_entries::Entity)
                    .col((audit_entries::Column::CreatedAt, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_entries_actor_created_at")
                    .table(audit_entries::Entity)
                    .col(audit_entries::Column::ActorId)
                    .col((audit_entries::Column::CreatedAt, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // At most one open visit per visitor; sea-query cannot express the
        // partial predicate, so this one is raw SQL.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_visit_events_one_open \
                 ON visit_events (visitor_id) WHERE exited_at IS NULL",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS idx_visit_events_one_open")
            .await?;

        for (name, table) in [
            ("idx_audit_entries_actor_created_at", "audit_entries"),
            ("idx_audit_entries_created_at", "audit_entries"),
            ("idx_visit_events_visitor_entered_at", "visit_events"),
            ("idx_visit_events_entered_at", "visit_events"),
        ] {
            manager
                .drop_index(Index::drop().name(name).table(Alias::new(table)).to_owned())
                .await?;
        }

        Ok(())
    }
}
