use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "visitors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// `CC`, `TI`, `PP` or `CE`
    pub document_type: String,

    #[sea_orm(unique)]
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

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::visit_events::Entity")]
    VisitEvents,
}

impl Related<super::visit_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VisitEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
