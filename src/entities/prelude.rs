pub use super::audit_entries::Entity as AuditEntries;
pub use super::users::Entity as Users;
pub use super::visit_events::Entity as VisitEvents;
pub use super::visitors::Entity as Visitors;
