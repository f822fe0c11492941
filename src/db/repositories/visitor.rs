use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::db::clock;
use crate::domain::{DocumentType, VisitorId};
use crate::entities::{prelude::*, visitors};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitorRecord {
    pub id: VisitorId,
    pub name: String,
    pub document_type: DocumentType,
    pub document: String,
    pub email: String,
    pub phone: String,
    pub visit_purpose: String,
    pub unit_visited: String,
    pub host_name: String,
    pub notes: String,
    pub registered_at: String,
    pub updated_at: String,
}

impl TryFrom<visitors::Model> for VisitorRecord {
    type Error = DbErr;

    fn try_from(model: visitors::Model) -> Result<Self, Self::Error> {
        let document_type = model
            .document_type
            .parse::<DocumentType>()
            .map_err(|e| DbErr::Custom(format!("visitor {}: {e}", model.id)))?;

        Ok(Self {
            id: VisitorId::new(model.id),
            name: model.name,
            document_type,
            document: model.document,
            email: model.email,
            phone: model.phone,
            visit_purpose: model.visit_purpose,
            unit_visited: model.unit_visited,
            host_name: model.host_name,
            notes: model.notes,
            registered_at: model.registered_at,
            updated_at: model.updated_at,
        })
    }
}

/// Editable visitor data, as submitted by the front desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorFields {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "tipo_documento")]
    pub document_type: DocumentType,
    #[serde(alias = "documento")]
    pub document: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "telefono")]
    pub phone: String,
    #[serde(alias = "motivo_visita")]
    pub visit_purpose: String,
    #[serde(alias = "apartamento_visitado")]
    pub unit_visited: String,
    #[serde(alias = "persona_a_visitar")]
    pub host_name: String,
    #[serde(default, alias = "descripcion")]
    pub notes: String,
}

const LIKE_ESCAPE: char = '!';

/// `LIKE` pattern matching `term` anywhere, with its wildcards taken literally.
fn contains_pattern(term: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}

pub struct VisitorRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> VisitorRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: VisitorId) -> Result<Option<VisitorRecord>, DbErr> {
        Visitors::find_by_id(id.value())
            .one(self.conn)
            .await?
            .map(VisitorRecord::try_from)
            .transpose()
    }

    pub async fn find_by_document(&self, document: &str) -> Result<Option<VisitorRecord>, DbErr> {
        Visitors::find()
            .filter(visitors::Column::Document.eq(document))
            .one(self.conn)
            .await?
            .map(VisitorRecord::try_from)
            .transpose()
    }

    /// Newest registrations first. `search` matches a literal substring of the
    /// name or the document number; SQLite `LIKE` ignores ASCII case.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<VisitorRecord>, DbErr> {
        let mut query = Visitors::find()
            .order_by_desc(visitors::Column::RegisteredAt)
            .order_by_desc(visitors::Column::Id);

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = contains_pattern(term);
            query = query.filter(
                Condition::any()
                    .add(visitors::Column::Name.like(pattern.clone()))
                    .add(visitors::Column::Document.like(pattern)),
            );
        }

        query
            .all(self.conn)
            .await?
            .into_iter()
            .map(VisitorRecord::try_from)
            .collect()
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        Visitors::find().count(self.conn).await
    }

    pub async fn insert(&self, fields: VisitorFields) -> Result<VisitorRecord, DbErr> {
        let now = clock::now();

        let model = visitors::ActiveModel {
            name: Set(fields.name),
            document_type: Set(fields.document_type.code().to_string()),
            document: Set(fields.document),
            email: Set(fields.email),
            phone: Set(fields.phone),
            visit_purpose: Set(fields.visit_purpose),
            unit_visited: Set(fields.unit_visited),
            host_name: Set(fields.host_name),
            notes: Set(fields.notes),
            registered_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        VisitorRecord::try_from(model)
    }

    /// Replaces every editable field; `None` when no visitor has that id.
    pub async fn update(
        &self,
        id: VisitorId,
        fields: VisitorFields,
    ) -> Result<Option<VisitorRecord>, DbErr> {
        let Some(model) = Visitors::find_by_id(id.value()).one(self.conn).await? else {
            return Ok(None);
        };

        let mut active: visitors::ActiveModel = model.into();
        active.name = Set(fields.name);
        active.document_type = Set(fields.document_type.code().to_string());
        active.document = Set(fields.document);
        active.email = Set(fields.email);
        active.phone = Set(fields.phone);
        active.visit_purpose = Set(fields.visit_purpose);
        active.unit_visited = Set(fields.unit_visited);
        active.host_name = Set(fields.host_name);
        active.notes = Set(fields.notes);
        active.updated_at = Set(clock::now());

        let model = active.update(self.conn).await?;
        VisitorRecord::try_from(model).map(Some)
    }
}
