//! Role-based access control.
//!
//! Every service operation receives the acting account explicitly as an
//! [`ActorContext`] and checks it with [`ActorContext::require`] before it
//! touches the store.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::{ActorId, Role};

/// Capability levels derived from an account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Account management and audit review.
    Administration,
    /// Visitor registry, entry/exit log and reports.
    FrontDesk,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Administration => f.write_str("administration"),
            Self::FrontDesk => f.write_str("front desk"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{role} accounts are not allowed to perform {capability} operations")]
pub struct AccessDenied {
    pub role: Role,
    pub capability: Capability,
}

/// The authenticated account on whose behalf an operation runs.
#[derive(Debug, Clone, Serialize)]
pub struct ActorContext {
    pub id: ActorId,
    pub username: String,
    pub role: Role,
    /// Client network address the request originated from, when known.
    pub source_address: Option<String>,
}

impl ActorContext {
    #[must_use]
    pub const fn new(
        id: ActorId,
        username: String,
        role: Role,
        source_address: Option<String>,
    ) -> Self {
        Self {
            id,
            username,
            role,
            source_address,
        }
    }

    #[must_use]
    pub const fn is_administrator(&self) -> bool {
        matches!(self.role, Role::Administrator)
    }

    #[must_use]
    pub const fn can_operate_front_desk(&self) -> bool {
        matches!(self.role, Role::Administrator | Role::Receptionist)
    }

    #[must_use]
    pub const fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Administration => self.is_administrator(),
            Capability::FrontDesk => self.can_operate_front_desk(),
        }
    }

    pub fn require(&self, capability: Capability) -> Result<(), AccessDenied> {
        if self.has(capability) {
            Ok(())
        } else {
            tracing::warn!(
                actor_id = %self.id,
                role = %self.role,
                %capability,
                "Access denied"
            );
            Err(AccessDenied {
                role: self.role,
                capability,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> ActorContext {
        ActorContext::new(ActorId::new(1), "someone".to_string(), role, None)
    }

    #[test]
    fn administrator_has_every_capability() {
        let admin = actor(Role::Administrator);
        assert!(admin.require(Capability::Administration).is_ok());
        assert!(admin.require(Capability::FrontDesk).is_ok());
    }

    #[test]
    fn receptionist_is_front_desk_only() {
        let receptionist = actor(Role::Receptionist);
        assert!(receptionist.can_operate_front_desk());
        let denied = receptionist
            .require(Capability::Administration)
            .unwrap_err();
        assert_eq!(denied.role, Role::Receptionist);
        assert_eq!(denied.capability, Capability::Administration);
    }

    #[test]
    fn visitor_role_has_no_capability() {
        let visitor = actor(Role::Visitor);
        assert!(!visitor.has(Capability::FrontDesk));
        assert!(!visitor.has(Capability::Administration));
    }
}
