//! Access evaluation logic.
//!
//! Computes the effective access a requester has on a post from an
//! explicit rule table: each audience [`Relation`] pairs a membership
//! test with the post field holding the tier granted to that audience.

use uuid::Uuid;

use super::tier::{AccessLevel, PermissionTier};

/// Identity of an authenticated user, as seen by the evaluator.
///
/// Built by the auth middleware; the evaluator performs no lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User ID.
    pub id: Uuid,
    /// Team the user belongs to.
    pub team: String,
    /// Superusers bypass all post checks.
    pub is_superuser: bool,
}

/// The party requesting access to a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    /// No credentials presented.
    Anonymous,
    /// An authenticated user.
    User(Identity),
}

impl Requester {
    /// User ID, if authenticated.
    #[must_use]
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Self::Anonymous => None,
            Self::User(identity) => Some(identity.id),
        }
    }

    fn is_superuser(&self) -> bool {
        matches!(self, Self::User(identity) if identity.is_superuser)
    }
}

/// Visibility snapshot of a post: the fields access evaluation needs.
#[derive(Debug, Clone, Copy)]
pub struct Visibility<'a> {
    /// The post's author.
    pub author_id: Uuid,
    /// Team the post was shared with (the author's team at creation).
    pub team: &'a str,
    /// Whether anonymous readers may see the post.
    pub is_public: bool,
    /// Tier granted to any authenticated user.
    pub authenticated: PermissionTier,
    /// Tier granted to same-team users.
    pub group: PermissionTier,
}

/// Audience relations a requester can hold on a post, in rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Author of the post, or a superuser.
    Owner,
    /// Authenticated user on the post's team.
    Team,
    /// Any authenticated user.
    Authenticated,
    /// Anyone, including anonymous requesters.
    Public,
}

/// Rule table: relations evaluated highest rank first.
///
/// Rank order doubles as the tie-break for [`permission_level`]: the
/// first held relation whose tier grants read determines the level.
const RANKED: [Relation; 4] = [
    Relation::Owner,
    Relation::Team,
    Relation::Authenticated,
    Relation::Public,
];

impl Relation {
    /// Whether the requester stands in this relation to the post.
    fn held_by(self, requester: &Requester, post: &Visibility<'_>) -> bool {
        match self {
            Self::Owner => {
                requester.is_superuser() || requester.id() == Some(post.author_id)
            }
            Self::Team => {
                matches!(requester, Requester::User(identity) if identity.team == post.team)
            }
            Self::Authenticated => matches!(requester, Requester::User(_)),
            Self::Public => true,
        }
    }

    /// The tier the post grants to this relation's audience.
    ///
    /// Ownership is implicit read/write and is never stored; the public
    /// audience caps out at read-only.
    fn granted_tier(self, post: &Visibility<'_>) -> PermissionTier {
        match self {
            Self::Owner => PermissionTier::ReadWrite,
            Self::Team => post.group,
            Self::Authenticated => post.authenticated,
            Self::Public => {
                if post.is_public {
                    PermissionTier::ReadOnly
                } else {
                    PermissionTier::None
                }
            }
        }
    }

    const fn level(self) -> AccessLevel {
        match self {
            Self::Owner => AccessLevel::Owner,
            Self::Team => AccessLevel::Team,
            Self::Authenticated => AccessLevel::Authenticated,
            Self::Public => AccessLevel::Public,
        }
    }
}

/// Ranked access level of the requester for this post.
///
/// The first relation in rank order (owner > team > authenticated >
/// public) that the requester holds with a readable tier wins; a team
/// member whose team tier is `none` still falls through to the
/// authenticated and public tiers.
#[must_use]
pub fn permission_level(requester: &Requester, post: &Visibility<'_>) -> AccessLevel {
    RANKED
        .iter()
        .find(|relation| {
            relation.held_by(requester, post) && relation.granted_tier(post).grants_read()
        })
        .map_or(AccessLevel::None, |relation| relation.level())
}

/// Whether the requester may read the post (and its comments/likes).
#[must_use]
pub fn read_allowed(requester: &Requester, post: &Visibility<'_>) -> bool {
    permission_level(requester, post) > AccessLevel::None
}

/// Whether the requester may modify or delete the post.
///
/// A relation grants write only at the `read_write` tier; the public
/// audience never does.
#[must_use]
pub fn write_allowed(requester: &Requester, post: &Visibility<'_>) -> bool {
    RANKED.iter().any(|relation| {
        relation.held_by(requester, post) && relation.granted_tier(post).grants_write()
    })
}

/// Whether the requester authored a comment or like.
///
/// Comment/like mutation is restricted to the record's own author; the
/// post's tiers (and the superuser bypass) do not apply here.
#[must_use]
pub fn owns_record(requester: &Requester, author_id: Uuid) -> bool {
    requester.id() == Some(author_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(team: &str) -> Requester {
        Requester::User(Identity {
            id: Uuid::now_v7(),
            team: team.to_string(),
            is_superuser: false,
        })
    }

    fn superuser() -> Requester {
        Requester::User(Identity {
            id: Uuid::now_v7(),
            team: "ops".to_string(),
            is_superuser: true,
        })
    }

    fn post(
        author_id: Uuid,
        is_public: bool,
        authenticated: PermissionTier,
        group: PermissionTier,
    ) -> Visibility<'static> {
        Visibility {
            author_id,
            team: "writers",
            is_public,
            authenticated,
            group,
        }
    }

    #[test]
    fn author_always_reads_and_writes() {
        let author = user("writers");
        let tiers = [
            PermissionTier::None,
            PermissionTier::ReadOnly,
            PermissionTier::ReadWrite,
        ];

        for authenticated in tiers {
            for group in tiers {
                for is_public in [false, true] {
                    let p = post(author.id().unwrap(), is_public, authenticated, group);
                    assert!(read_allowed(&author, &p));
                    assert!(write_allowed(&author, &p));
                    assert_eq!(permission_level(&author, &p), AccessLevel::Owner);
                }
            }
        }
    }

    #[test]
    fn superuser_bypasses_all_tiers() {
        let p = post(
            Uuid::now_v7(),
            false,
            PermissionTier::None,
            PermissionTier::None,
        );
        let root = superuser();

        assert!(read_allowed(&root, &p));
        assert!(write_allowed(&root, &p));
        assert_eq!(permission_level(&root, &p), AccessLevel::Owner);
    }

    #[test]
    fn team_member_gated_by_group_tier() {
        let teammate = user("writers");

        let hidden = post(
            Uuid::now_v7(),
            false,
            PermissionTier::None,
            PermissionTier::None,
        );
        assert!(!read_allowed(&teammate, &hidden));
        assert!(!write_allowed(&teammate, &hidden));

        let readable = post(
            Uuid::now_v7(),
            false,
            PermissionTier::None,
            PermissionTier::ReadOnly,
        );
        assert!(read_allowed(&teammate, &readable));
        assert!(!write_allowed(&teammate, &readable));
        assert_eq!(permission_level(&teammate, &readable), AccessLevel::Team);

        let writable = post(
            Uuid::now_v7(),
            false,
            PermissionTier::None,
            PermissionTier::ReadWrite,
        );
        assert!(write_allowed(&teammate, &writable));
    }

    #[test]
    fn outsider_gated_by_authenticated_tier_only() {
        let outsider = user("marketing");

        // group_permission must not leak to non-team users
        let team_only = post(
            Uuid::now_v7(),
            false,
            PermissionTier::None,
            PermissionTier::ReadWrite,
        );
        assert!(!read_allowed(&outsider, &team_only));
        assert!(!write_allowed(&outsider, &team_only));

        let readable = post(
            Uuid::now_v7(),
            false,
            PermissionTier::ReadOnly,
            PermissionTier::None,
        );
        assert!(read_allowed(&outsider, &readable));
        assert!(!write_allowed(&outsider, &readable));
        assert_eq!(
            permission_level(&outsider, &readable),
            AccessLevel::Authenticated
        );

        let writable = post(
            Uuid::now_v7(),
            false,
            PermissionTier::ReadWrite,
            PermissionTier::None,
        );
        assert!(write_allowed(&outsider, &writable));
    }

    #[test]
    fn team_member_falls_through_to_authenticated_tier() {
        // Team tier is none but the authenticated tier grants write:
        // the member is treated as any authenticated user.
        let teammate = user("writers");
        let p = post(
            Uuid::now_v7(),
            false,
            PermissionTier::ReadWrite,
            PermissionTier::None,
        );

        assert!(read_allowed(&teammate, &p));
        assert!(write_allowed(&teammate, &p));
        assert_eq!(permission_level(&teammate, &p), AccessLevel::Authenticated);
    }

    #[test]
    fn team_read_only_still_writes_through_authenticated_tier() {
        // group=read_only fails the write gate, but authenticated=read_write
        // grants it; mirrors the rule table's independent relations.
        let teammate = user("writers");
        let p = post(
            Uuid::now_v7(),
            false,
            PermissionTier::ReadWrite,
            PermissionTier::ReadOnly,
        );

        assert!(write_allowed(&teammate, &p));
        // Level reports the highest-ranked readable relation
        assert_eq!(permission_level(&teammate, &p), AccessLevel::Team);
    }

    #[test]
    fn anonymous_reads_iff_public_and_never_writes() {
        let anon = Requester::Anonymous;

        let public = post(
            Uuid::now_v7(),
            true,
            PermissionTier::ReadWrite,
            PermissionTier::ReadWrite,
        );
        assert!(read_allowed(&anon, &public));
        assert!(!write_allowed(&anon, &public));
        assert_eq!(permission_level(&anon, &public), AccessLevel::Public);

        let private = post(
            Uuid::now_v7(),
            false,
            PermissionTier::ReadWrite,
            PermissionTier::ReadWrite,
        );
        assert!(!read_allowed(&anon, &private));
        assert_eq!(permission_level(&anon, &private), AccessLevel::None);
    }

    #[test]
    fn public_only_reader_never_writes() {
        let outsider = user("marketing");
        let p = post(
            Uuid::now_v7(),
            true,
            PermissionTier::None,
            PermissionTier::ReadWrite,
        );

        assert!(read_allowed(&outsider, &p));
        assert!(!write_allowed(&outsider, &p));
        assert_eq!(permission_level(&outsider, &p), AccessLevel::Public);
    }

    #[test]
    fn level_is_consistent_with_boolean_gates() {
        let requesters = [
            Requester::Anonymous,
            user("writers"),
            user("marketing"),
            superuser(),
        ];
        let tiers = [
            PermissionTier::None,
            PermissionTier::ReadOnly,
            PermissionTier::ReadWrite,
        ];

        for requester in &requesters {
            for authenticated in tiers {
                for group in tiers {
                    for is_public in [false, true] {
                        let p = post(Uuid::now_v7(), is_public, authenticated, group);
                        let level = permission_level(requester, &p);

                        assert_eq!(read_allowed(requester, &p), level > AccessLevel::None);
                        if write_allowed(requester, &p) {
                            assert!(read_allowed(requester, &p));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn owns_record_is_author_only() {
        let author_id = Uuid::now_v7();
        let author = Requester::User(Identity {
            id: author_id,
            team: "writers".to_string(),
            is_superuser: false,
        });

        assert!(owns_record(&author, author_id));
        assert!(!owns_record(&superuser(), author_id));
        assert!(!owns_record(&Requester::Anonymous, author_id));
    }
}
