use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// One of `administrator`, `receptionist`, `visitor`
    pub role: String,

    pub first_name: String,

    pub last_name: String,

    pub email: String,

    pub phone: String,

    /// Personal identity document, unique when present.
    #[sea_orm(unique)]
    pub document: Option<String>,

    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::visit_events::Entity")]
    VisitEvents,
    #[sea_orm(has_many = "super::audit_entries::Entity")]
    AuditEntries,
}

impl Related<super::visit_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VisitEvents.def()
    }
}

impl Related<super::audit_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuditEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
