//! Domain types for visitor management with strong typing.
//!
//! Identifiers follow the newtype pattern so an actor id can never be passed
//! where a visitor id is expected. Enumerations that are persisted as text
//! expose `as_str`/`FromStr` pairs used by the repositories.

pub mod access;
pub mod audit;
pub mod form;
pub mod validation;

pub use access::{AccessDenied, ActorContext, Capability};
pub use audit::{AuditAction, EntityKind};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a staff account.
    ActorId
);
id_newtype!(
    /// Identifier of a registered visitor.
    VisitorId
);
id_newtype!(
    /// Identifier of a single entry/exit record.
    VisitEventId
);

/// Raised when a persisted enumeration holds a value this build does not know.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Role of a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "administrador")]
    Administrator,
    #[serde(alias = "recepcionista")]
    Receptionist,
    /// Can sign in and read the dashboard, nothing else.
    #[serde(alias = "visitante")]
    Visitor,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Receptionist => "receptionist",
            Self::Visitor => "visitor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "administrator" | "administrador" => Ok(Self::Administrator),
            "receptionist" | "recepcionista" => Ok(Self::Receptionist),
            "visitor" | "visitante" => Ok(Self::Visitor),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Identity document presented by a visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Cédula de ciudadanía.
    #[serde(rename = "CC")]
    NationalId,
    /// Tarjeta de identidad.
    #[serde(rename = "TI")]
    MinorId,
    #[serde(rename = "PP")]
    Passport,
    /// Cédula de extranjería.
    #[serde(rename = "CE")]
    ForeignId,
}

impl DocumentType {
    pub const ALL: [Self; 4] = [
        Self::NationalId,
        Self::MinorId,
        Self::Passport,
        Self::ForeignId,
    ];

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NationalId => "CC",
            Self::MinorId => "TI",
            Self::Passport => "PP",
            Self::ForeignId => "CE",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NationalId => "Cédula de Ciudadanía",
            Self::MinorId => "Tarjeta de Identidad",
            Self::Passport => "Pasaporte",
            Self::ForeignId => "Cédula de Extranjería",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DocumentType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant {
                kind: "document type",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_newtypes_convert_and_display() {
        let id = VisitorId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
        assert_eq!(VisitorId::from(42), id);
        assert_eq!(serde_json::to_string(&ActorId::new(7)).unwrap(), "7");
    }

    #[test]
    fn role_round_trips_and_accepts_spanish_names() {
        for role in [Role::Administrator, Role::Receptionist, Role::Visitor] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("recepcionista".parse::<Role>().unwrap(), Role::Receptionist);
        let parsed: Role = serde_json::from_str("\"administrador\"").unwrap();
        assert_eq!(parsed, Role::Administrator);
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn document_type_codes() {
        assert_eq!("cc".parse::<DocumentType>().unwrap(), DocumentType::NationalId);
        assert_eq!(DocumentType::Passport.code(), "PP");
        assert_eq!(
            serde_json::to_string(&DocumentType::ForeignId).unwrap(),
            "\"CE\""
        );
        assert!("XX".parse::<DocumentType>().is_err());
    }
}
