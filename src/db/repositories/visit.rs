use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, SelectTwo, Set,
};
use serde::Serialize;

use super::visitor::VisitorRecord;
use crate::db::clock;
use crate::domain::{ActorId, VisitEventId, VisitorId};
use crate::entities::{prelude::*, visit_events, visitors};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitEvent {
    pub id: VisitEventId,
    pub visitor_id: VisitorId,
    pub entered_at: String,
    pub exited_at: Option<String>,
    pub notes: String,
    pub recorded_by: Option<ActorId>,
}

impl VisitEvent {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.exited_at.is_none()
    }
}

impl From<visit_events::Model> for VisitEvent {
    fn from(model: visit_events::Model) -> Self {
        Self {
            id: VisitEventId::new(model.id),
            visitor_id: VisitorId::new(model.visitor_id),
            entered_at: model.entered_at,
            exited_at: model.exited_at,
            notes: model.notes,
            recorded_by: model.recorded_by.map(ActorId::new),
        }
    }
}

/// A visit joined with the visitor it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitRow {
    #[serde(flatten)]
    pub event: VisitEvent,
    pub visitor: VisitorRecord,
}

/// Storage-level filter; bounds are formatted timestamps (see [`clock`]).
#[derive(Debug, Clone, Default)]
pub struct VisitQuery {
    /// Inclusive lower bound on the entry timestamp.
    pub entered_from: Option<String>,
    /// Exclusive upper bound on the entry timestamp.
    pub entered_before: Option<String>,
    pub visitor_id: Option<VisitorId>,
}

pub struct VisitRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> VisitRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    fn newest_first(query: Select<VisitEvents>) -> Select<VisitEvents> {
        query
            .order_by_desc(visit_events::Column::EnteredAt)
            .order_by_desc(visit_events::Column::Id)
    }

    async fn fetch_rows(
        &self,
        query: SelectTwo<VisitEvents, Visitors>,
    ) -> Result<Vec<VisitRow>, DbErr> {
        query
            .all(self.conn)
            .await?
            .into_iter()
            .map(|(event, visitor)| {
                let visitor = visitor.ok_or_else(|| {
                    DbErr::RecordNotFound(format!("visitor {} of visit {}", event.visitor_id, event.id))
                })?;
                Ok(VisitRow {
                    event: VisitEvent::from(event),
                    visitor: VisitorRecord::try_from(visitor)?,
                })
            })
            .collect()
    }

    /// The open visit with the most recent entry, if any.
    pub async fn latest_open(&self, visitor_id: VisitorId) -> Result<Option<visit_events::Model>, DbErr> {
        Self::newest_first(
            VisitEvents::find()
                .filter(visit_events::Column::VisitorId.eq(visitor_id.value()))
                .filter(visit_events::Column::ExitedAt.is_null()),
        )
        .one(self.conn)
        .await
    }

    pub async fn has_open(&self, visitor_id: VisitorId) -> Result<bool, DbErr> {
        let count = VisitEvents::find()
            .filter(visit_events::Column::VisitorId.eq(visitor_id.value()))
            .filter(visit_events::Column::ExitedAt.is_null())
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn for_visitor(&self, visitor_id: VisitorId) -> Result<Vec<VisitEvent>, DbErr> {
        Ok(Self::newest_first(
            VisitEvents::find().filter(visit_events::Column::VisitorId.eq(visitor_id.value())),
        )
        .all(self.conn)
        .await?
        .into_iter()
        .map(VisitEvent::from)
        .collect())
    }

    pub async fn open(
        &self,
        visitor_id: VisitorId,
        recorded_by: Option<ActorId>,
        notes: String,
    ) -> Result<VisitEvent, DbErr> {
        let model = visit_events::ActiveModel {
            visitor_id: Set(visitor_id.value()),
            entered_at: Set(clock::now()),
            exited_at: Set(None),
            notes: Set(notes),
            recorded_by: Set(recorded_by.map(i32::from)),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        Ok(VisitEvent::from(model))
    }

    /// Stamps the exit time on `event`; checkout notes are appended to the
    /// notes taken at entry.
    ///
    /// `None` when the visit was closed by someone else in the meantime.
    pub async fn close(
        &self,
        event: visit_events::Model,
        checkout_notes: &str,
    ) -> Result<Option<VisitEvent>, DbErr> {
        let notes = match (event.notes.trim(), checkout_notes.trim()) {
            (entry, "") => entry.to_string(),
            ("", exit) => exit.to_string(),
            (entry, exit) => format!("{entry}\n{exit}"),
        };
        let exited_at = clock::now();

        let result = VisitEvents::update_many()
            .col_expr(visit_events::Column::ExitedAt, Expr::value(exited_at.clone()))
            .col_expr(visit_events::Column::Notes, Expr::value(notes.clone()))
            .filter(visit_events::Column::Id.eq(event.id))
            .filter(visit_events::Column::ExitedAt.is_null())
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        Ok(Some(VisitEvent::from(visit_events::Model {
            exited_at: Some(exited_at),
            notes,
            ..event
        })))
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<VisitRow>, DbErr> {
        self.fetch_rows(
            Self::newest_first(VisitEvents::find())
                .limit(limit)
                .find_also_related(Visitors),
        )
        .await
    }

    pub async fn query(&self, filter: &VisitQuery) -> Result<Vec<VisitRow>, DbErr> {
        let mut query = VisitEvents::find();

        if let Some(from) = &filter.entered_from {
            query = query.filter(visit_events::Column::EnteredAt.gte(from.as_str()));
        }

        if let Some(before) = &filter.entered_before {
            query = query.filter(visit_events::Column::EnteredAt.lt(before.as_str()));
        }

        if let Some(visitor_id) = filter.visitor_id {
            query = query.filter(visit_events::Column::VisitorId.eq(visitor_id.value()));
        }

        self.fetch_rows(Self::newest_first(query).find_also_related(Visitors))
            .await
    }

    pub async fn count_entered_between(&self, from: &str, before: &str) -> Result<u64, DbErr> {
        VisitEvents::find()
            .filter(visit_events::Column::EnteredAt.gte(from))
            .filter(visit_events::Column::EnteredAt.lt(before))
            .count(self.conn)
            .await
    }

    pub async fn count_exited_between(&self, from: &str, before: &str) -> Result<u64, DbErr> {
        VisitEvents::find()
            .filter(visit_events::Column::ExitedAt.gte(from))
            .filter(visit_events::Column::ExitedAt.lt(before))
            .count(self.conn)
            .await
    }

    pub async fn count_inside(&self) -> Result<u64, DbErr> {
        VisitEvents::find()
            .filter(visit_events::Column::ExitedAt.is_null())
            .select_only()
            .column(visit_events::Column::VisitorId)
            .distinct()
            .count(self.conn)
            .await
    }

    /// Visitors with an open visit, by name.
    pub async fn visitors_inside(&self) -> Result<Vec<VisitorRecord>, DbErr> {
        Visitors::find()
            .filter(visitors::Column::Id.in_subquery(Self::open_visitor_ids()))
            .order_by_asc(visitors::Column::Name)
            .all(self.conn)
            .await?
            .into_iter()
            .map(VisitorRecord::try_from)
            .collect()
    }

    /// Visitors without an open visit, by name.
    pub async fn visitors_outside(&self) -> Result<Vec<VisitorRecord>, DbErr> {
        Visitors::find()
            .filter(visitors::Column::Id.not_in_subquery(Self::open_visitor_ids()))
            .order_by_asc(visitors::Column::Name)
            .all(self.conn)
            .await?
            .into_iter()
            .map(VisitorRecord::try_from)
            .collect()
    }

    fn open_visitor_ids() -> sea_orm::sea_query::SelectStatement {
        Query::select()
            .column(visit_events::Column::VisitorId)
            .from(VisitEvents)
            .and_where(visit_events::Column::ExitedAt.is_null())
            .to_owned()
    }
}
