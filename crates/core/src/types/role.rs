//! User roles.

use serde::{Deserialize, Serialize};

/// Role attached to a user account.
///
/// Owners see the inventory management surface (add/edit/delete products);
/// everyone else is a client. Parsed leniently because the role field is
/// free-form text in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Client,
    Owner,
}

impl UserRole {
    /// Parse a raw role string, trimmed and case-insensitive.
    ///
    /// Anything that is not recognisably "owner" degrades to `Client`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("owner") {
            Self::Owner
        } else {
            Self::Client
        }
    }

    /// Whether this role may manage inventory.
    #[must_use]
    pub const fn is_owner(&self) -> bool {
        matches!(self, Self::Owner)
    }
}
