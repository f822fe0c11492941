//! `SeaORM` implementation of the `VisitService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::constants::limits::MAX_RECENT_VISITS;
use crate::db::{Store, VisitEvent, VisitRow, VisitorRecord};
use crate::domain::{ActorContext, Capability, VisitorId};
use crate::services::visit_service::{VisitError, VisitService};

pub struct SeaOrmVisitService {
    store: Store,
}

impl SeaOrmVisitService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn ensure_visitor_exists(&self, visitor_id: VisitorId) -> Result<(), VisitError> {
        if self.store.visitors().get(visitor_id).await?.is_none() {
            return Err(VisitError::VisitorNotFound(visitor_id));
        }
        Ok(())
    }
}

#[async_trait]
impl VisitService for SeaOrmVisitService {
    async fn check_in(
        &self,
        actor: &ActorContext,
        visitor_id: VisitorId,
        notes: &str,
    ) -> Result<VisitEvent, VisitError> {
        actor.require(Capability::FrontDesk)?;
        self.ensure_visitor_exists(visitor_id).await?;

        let visits = self.store.visits();
        if visits.has_open(visitor_id).await? {
            return Err(VisitError::AlreadyInside(visitor_id));
        }

        // Single-statement insert; a concurrent check-in that passed the
        // check above trips the partial unique index on open visits.
        let event = visits
            .open(visitor_id, Some(actor.id), notes.trim().to_string())
            .await
            .map_err(|e| {
                if crate::db::unique_violation(&e).is_some() {
                    VisitError::AlreadyInside(visitor_id)
                } else {
                    VisitError::from(e)
                }
            })?;

        info!(
            visit_id = %event.id,
            visitor_id = %visitor_id,
            actor_id = %actor.id,
            "Visitor checked in"
        );
        metrics::counter!("visit_check_ins_total").increment(1);

        Ok(event)
    }

    async fn check_out(
        &self,
        actor: &ActorContext,
        visitor_id: VisitorId,
        notes: &str,
    ) -> Result<VisitEvent, VisitError> {
        actor.require(Capability::FrontDesk)?;
        self.ensure_visitor_exists(visitor_id).await?;

        let visits = self.store.visits();
        let open = visits
            .latest_open(visitor_id)
            .await?
            .ok_or(VisitError::NoOpenEntry(visitor_id))?;

        let event = visits
            .close(open, notes)
            .await?
            .ok_or(VisitError::NoOpenEntry(visitor_id))?;

        info!(
            visit_id = %event.id,
            visitor_id = %visitor_id,
            actor_id = %actor.id,
            "Visitor checked out"
        );
        metrics::counter!("visit_check_outs_total").increment(1);

        Ok(event)
    }

    async fn is_inside(
        &self,
        actor: &ActorContext,
        visitor_id: VisitorId,
    ) -> Result<bool, VisitError> {
        actor.require(Capability::FrontDesk)?;
        self.ensure_visitor_exists(visitor_id).await?;
        Ok(self.store.visits().has_open(visitor_id).await?)
    }

    async fn list_recent(
        &self,
        actor: &ActorContext,
        limit: u64,
    ) -> Result<Vec<VisitRow>, VisitError> {
        actor.require(Capability::FrontDesk)?;

        if limit == 0 || limit > MAX_RECENT_VISITS {
            return Err(VisitError::Validation(format!(
                "Invalid limit: {limit}. Limit must be between 1 and {MAX_RECENT_VISITS}"
            )));
        }

        Ok(self.store.visits().recent(limit).await?)
    }

    async fn list_inside(&self, actor: &ActorContext) -> Result<Vec<VisitorRecord>, VisitError> {
        actor.require(Capability::FrontDesk)?;
        Ok(self.store.visits().visitors_inside().await?)
    }

    async fn list_outside(&self, actor: &ActorContext) -> Result<Vec<VisitorRecord>, VisitError> {
        actor.require(Capability::FrontDesk)?;
        Ok(self.store.visits().visitors_outside().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, VisitorFields};
    use crate::domain::{DocumentType, Role};

    async fn store() -> Store {
        let path = std::env::temp_dir().join(format!("visitrack-visits-{}.db", uuid::Uuid::new_v4()));
        Store::new(&format!("sqlite:{}", path.display())).await.unwrap()
    }

    async fn account(store: &Store, username: &str, role: Role) -> ActorContext {
        let user = store
            .users()
            .insert(NewUser {
                username: username.to_string(),
                password_hash: "unused".to_string(),
                role,
                first_name: "Front".to_string(),
                last_name: "Desk".to_string(),
                email: String::new(),
                phone: String::new(),
                document: None,
            })
            .await
            .unwrap();
        ActorContext::new(user.id, user.username, user.role, None)
    }

    async fn visitor(store: &Store, document: &str) -> VisitorId {
        store
            .visitors()
            .insert(VisitorFields {
                name: "Ana".to_string(),
                document_type: DocumentType::NationalId,
                document: document.to_string(),
                email: String::new(),
                phone: String::new(),
                visit_purpose: "Entrega".to_string(),
                unit_visited: "301".to_string(),
                host_name: "Luis".to_string(),
                notes: String::new(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn check_in_then_out_toggles_inside() {
        let store = store().await;
        let service = SeaOrmVisitService::new(store.clone());
        let actor = account(&store, "front", Role::Receptionist).await;
        let id = visitor(&store, "CC-1").await;

        assert!(!service.is_inside(&actor, id).await.unwrap());

        let event = service.check_in(&actor, id, "con paquete").await.unwrap();
        assert!(event.is_open());
        assert_eq!(event.recorded_by, Some(actor.id));
        assert!(service.is_inside(&actor, id).await.unwrap());

        let closed = service.check_out(&actor, id, "salió sin paquete").await.unwrap();
        assert_eq!(closed.id, event.id);
        assert!(closed.exited_at.is_some());
        assert_eq!(closed.notes, "con paquete\nsalió sin paquete");
        assert!(!service.is_inside(&actor, id).await.unwrap());
    }

    #[tokio::test]
    async fn second_check_in_conflicts() {
        let store = store().await;
        let service = SeaOrmVisitService::new(store.clone());
        let actor = account(&store, "front", Role::Receptionist).await;
        let id = visitor(&store, "CC-2").await;

        service.check_in(&actor, id, "").await.unwrap();
        let err = service.check_in(&actor, id, "").await.unwrap_err();
        assert!(matches!(err, VisitError::AlreadyInside(v) if v == id));
        assert_eq!(store.visits().for_visitor(id).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_check_ins_open_one_visit() {
        let store = store().await;
        let service = std::sync::Arc::new(SeaOrmVisitService::new(store.clone()));
        let actor = account(&store, "front", Role::Receptionist).await;
        let id = visitor(&store, "CC-7").await;

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let service = service.clone();
                let actor = actor.clone();
                tokio::spawn(async move { service.check_in(&actor, id, "").await })
            })
            .collect();

        let mut opened = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => opened += 1,
                Err(VisitError::AlreadyInside(v)) => assert_eq!(v, id),
                Err(other) => panic!("unexpected check-in error: {other}"),
            }
        }

        assert_eq!(opened, 1);
        assert_eq!(store.visits().for_visitor(id).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_check_outs_close_once() {
        let store = store().await;
        let service = std::sync::Arc::new(SeaOrmVisitService::new(store.clone()));
        let actor = account(&store, "front", Role::Receptionist).await;
        let id = visitor(&store, "CC-8").await;
        service.check_in(&actor, id, "").await.unwrap();

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let service = service.clone();
                let actor = actor.clone();
                tokio::spawn(async move { service.check_out(&actor, id, "").await })
            })
            .collect();

        let mut closed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => closed += 1,
                Err(VisitError::NoOpenEntry(v)) => assert_eq!(v, id),
                Err(other) => panic!("unexpected check-out error: {other}"),
            }
        }

        assert_eq!(closed, 1);
        assert!(!store.visits().has_open(id).await.unwrap());
    }

    #[tokio::test]
    async fn check_out_without_entry_leaves_no_record() {
        let store = store().await;
        let service = SeaOrmVisitService::new(store.clone());
        let actor = account(&store, "front", Role::Receptionist).await;
        let id = visitor(&store, "CC-3").await;

        let err = service.check_out(&actor, id, "").await.unwrap_err();
        assert!(matches!(err, VisitError::NoOpenEntry(v) if v == id));
        assert!(store.visits().for_visitor(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_visitor_is_not_found() {
        let store = store().await;
        let service = SeaOrmVisitService::new(store.clone());
        let actor = account(&store, "front", Role::Receptionist).await;
        let missing = VisitorId::new(999);

        let err = service.check_in(&actor, missing, "").await.unwrap_err();
        assert!(matches!(err, VisitError::VisitorNotFound(_)));
    }

    #[tokio::test]
    async fn inside_and_outside_lists_partition_visitors() {
        let store = store().await;
        let service = SeaOrmVisitService::new(store.clone());
        let actor = account(&store, "front", Role::Receptionist).await;
        let inside = visitor(&store, "CC-4").await;
        let outside = visitor(&store, "CC-5").await;

        service.check_in(&actor, inside, "").await.unwrap();

        let in_ids: Vec<_> = service.list_inside(&actor).await.unwrap().into_iter().map(|v| v.id).collect();
        let out_ids: Vec<_> = service.list_outside(&actor).await.unwrap().into_iter().map(|v| v.id).collect();
        assert_eq!(in_ids, vec![inside]);
        assert_eq!(out_ids, vec![outside]);
    }

    #[tokio::test]
    async fn visitor_role_is_rejected() {
        let store = store().await;
        let service = SeaOrmVisitService::new(store.clone());
        let id = visitor(&store, "CC-6").await;
        let actor = account(&store, "guest", Role::Visitor).await;

        let err = service.check_in(&actor, id, "").await.unwrap_err();
        assert!(matches!(err, VisitError::Forbidden(_)));
        assert!(store.visits().for_visitor(id).await.unwrap().is_empty());
    }
}
