use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Privilege tier of a marketplace subject.
///
/// Roles form a closed, strictly ordered set. Every role value used at
/// runtime must belong to this set; unknown labels are rejected at the parse
/// boundary, never coerced.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Client,
    Artist,
    Admin,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleParseError {
    #[error("unknown role: '{0}'")]
    Unknown(String),
}

impl Role {
    /// All roles, in ascending rank order.
    pub const ALL: [Role; 4] = [Role::Guest, Role::Client, Role::Artist, Role::Admin];

    /// Position in the hierarchy (0 = least privileged).
    pub fn rank(self) -> u8 {
        match self {
            Role::Guest => 0,
            Role::Client => 1,
            Role::Artist => 2,
            Role::Admin => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Client => "client",
            Role::Artist => "artist",
            Role::Admin => "admin",
        }
    }

    /// "At least as privileged as": `rank(self) >= rank(other)`.
    pub fn is_at_least(self, other: Role) -> bool {
        self.rank() >= other.rank()
    }

    /// Strictly more privileged than `other`.
    pub fn is_above(self, other: Role) -> bool {
        self.rank() > other.rank()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Role::Guest),
            "client" => Ok(Role::Client),
            "artist" => Ok(Role::Artist),
            "admin" => Ok(Role::Admin),
            other => Err(RoleParseError::Unknown(other.to_string())),
        }
    }
}
