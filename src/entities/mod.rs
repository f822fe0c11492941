pub mod prelude;

pub mod audit_entries;
pub mod users;
pub mod visit_events;
pub mod visitors;
