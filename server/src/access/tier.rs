//! Ordinal permission tiers and the ranked access level.

use serde::{Deserialize, Serialize};

/// Permission tier stored on a post for one audience relation.
///
/// Ordered: `None < ReadOnly < ReadWrite`. Stored as SMALLINT 0/1/2.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum PermissionTier {
    /// No access for this audience.
    None = 0,
    /// Read-only access.
    ReadOnly = 1,
    /// Read and write access.
    ReadWrite = 2,
}

impl PermissionTier {
    /// Whether this tier grants read access.
    #[must_use]
    pub fn grants_read(self) -> bool {
        self > Self::None
    }

    /// Whether this tier grants write access.
    #[must_use]
    pub fn grants_write(self) -> bool {
        self == Self::ReadWrite
    }
}

/// Ranked access level of a requester for a specific post.
///
/// Ordered by privilege: `None < Public < Authenticated < Team < Owner`.
/// This is the value serialized for clients so a UI can decide which
/// controls to show; it is strictly consistent with the read/write gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// No access at all.
    None,
    /// Readable because the post is public.
    Public,
    /// Granted through the authenticated-users tier.
    Authenticated,
    /// Granted through team membership.
    Team,
    /// The author or a superuser.
    Owner,
}
