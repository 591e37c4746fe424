//! Post access control.
//!
//! Visibility of a post is tiered per audience relation:
//! - Owner: the post's author (and superusers), always read/write
//! - Team: members of the post's team, gated by `group_permission`
//! - Authenticated: any logged-in user, gated by `authenticated_permission`
//! - Public: everyone, read-only when the post is public
//!
//! The evaluator is pure: handlers build a [`Requester`] from the
//! authenticated identity (or lack of one) and pass the post's
//! [`Visibility`] snapshot. It never touches the database and never
//! fails; denials are mapped to HTTP errors at the handler layer.

mod evaluator;
mod tier;

pub use evaluator::{
    owns_record, permission_level, read_allowed, write_allowed, Identity, Requester, Visibility,
};
pub use tier::{AccessLevel, PermissionTier};
