//! `SeaORM` implementation of the `VisitorService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{Store, VisitorFields, VisitorRecord};
use crate::domain::{ActorContext, Capability, VisitorId, validation};
use crate::services::visitor_service::{VisitorError, VisitorService};

pub struct SeaOrmVisitorService {
    store: Store,
}

impl SeaOrmVisitorService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn normalize(fields: VisitorFields) -> VisitorFields {
        VisitorFields {
            name: fields.name.trim().to_string(),
            document_type: fields.document_type,
            document: fields.document.trim().to_string(),
            email: fields.email.trim().to_string(),
            phone: fields.phone.trim().to_string(),
            visit_purpose: fields.visit_purpose.trim().to_string(),
            unit_visited: fields.unit_visited.trim().to_string(),
            host_name: fields.host_name.trim().to_string(),
            notes: fields.notes.trim().to_string(),
        }
    }

    fn validate(fields: &VisitorFields) -> Result<(), VisitorError> {
        validation::required("name", &fields.name)
            .and_then(|()| validation::max_length("name", &fields.name, 200))
            .and_then(|()| validation::required("document", &fields.document))
            .and_then(|()| validation::max_length("document", &fields.document, 20))
            .and_then(|()| validation::required("visit_purpose", &fields.visit_purpose))
            .and_then(|()| validation::required("unit_visited", &fields.unit_visited))
            .and_then(|()| validation::required("host_name", &fields.host_name))
            .and_then(|()| validation::email(&fields.email))
            .map_err(VisitorError::Validation)
    }

    fn duplicate_document(document: &str) -> VisitorError {
        VisitorError::Conflict(format!(
            "A visitor with document number {document} already exists"
        ))
    }
}

#[async_trait]
impl VisitorService for SeaOrmVisitorService {
    async fn create(
        &self,
        actor: &ActorContext,
        fields: VisitorFields,
    ) -> Result<VisitorRecord, VisitorError> {
        actor.require(Capability::FrontDesk)?;

        let fields = Self::normalize(fields);
        Self::validate(&fields)?;

        if self
            .store
            .visitors()
            .find_by_document(&fields.document)
            .await?
            .is_some()
        {
            return Err(Self::duplicate_document(&fields.document));
        }

        let visitor = self.store.visitors().insert(fields).await?;

        info!(
            visitor_id = %visitor.id,
            actor_id = %actor.id,
            "Visitor registered"
        );
        metrics::counter!("visitors_registered_total").increment(1);

        Ok(visitor)
    }

    async fn list(
        &self,
        actor: &ActorContext,
        search: Option<&str>,
    ) -> Result<Vec<VisitorRecord>, VisitorError> {
        actor.require(Capability::FrontDesk)?;
        Ok(self.store.visitors().list(search).await?)
    }

    async fn get(&self, actor: &ActorContext, id: VisitorId) -> Result<VisitorRecord, VisitorError> {
        actor.require(Capability::FrontDesk)?;
        self.store
            .visitors()
            .get(id)
            .await?
            .ok_or(VisitorError::NotFound(id))
    }

    async fn update(
        &self,
        actor: &ActorContext,
        id: VisitorId,
        fields: VisitorFields,
    ) -> Result<VisitorRecord, VisitorError> {
        actor.require(Capability::FrontDesk)?;

        let fields = Self::normalize(fields);
        Self::validate(&fields)?;

        let repo = self.store.visitors();

        if repo.get(id).await?.is_none() {
            return Err(VisitorError::NotFound(id));
        }

        if let Some(other) = repo.find_by_document(&fields.document).await?
            && other.id != id
        {
            return Err(Self::duplicate_document(&fields.document));
        }

        let visitor = repo
            .update(id, fields)
            .await?
            .ok_or(VisitorError::NotFound(id))?;

        info!(visitor_id = %visitor.id, actor_id = %actor.id, "Visitor updated");

        Ok(visitor)
    }
}
