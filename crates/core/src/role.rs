// Account roles
//
// The wire names ("ADMIN", "TEACHER", "STUDENT") are part of the public contract:
// they appear in request bodies, responses and signed token claims.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role held by an account. The set is closed; there is no hierarchy between roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Administrator,
    #[serde(rename = "TEACHER")]
    Instructor,
    #[serde(rename = "STUDENT")]
    Student,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Administrator, Role::Instructor, Role::Student];

    /// Wire/storage name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "ADMIN",
            Role::Instructor => "TEACHER",
            Role::Student => "STUDENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name one of the three roles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    // Exact match only: stored and signed values are always upper-case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Administrator),
            "TEACHER" => Ok(Role::Instructor),
            "STUDENT" => Ok(Role::Student),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}
