//! Role configuration source: the immutable role → policy table.
//!
//! Constructed once at process start and passed explicitly into every
//! consumer (engine, guards). Nothing here reads ambient state.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{Permission, Role};

/// A page-access rule: exact path or path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageRule {
    Exact(Cow<'static, str>),
    Prefix(Cow<'static, str>),
}

impl PageRule {
    pub fn exact(path: impl Into<Cow<'static, str>>) -> Self {
        Self::Exact(path.into())
    }

    pub fn prefix(path: impl Into<Cow<'static, str>>) -> Self {
        Self::Prefix(path.into())
    }

    /// Match `path` against this rule. Any query string on `path` is ignored.
    ///
    /// A prefix rule matches the prefix itself and any deeper segment, but
    /// not an unrelated path that merely shares leading characters
    /// (`/gallery` matches `/gallery/item-1`, not `/galleryx`).
    pub fn matches(&self, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        match self {
            PageRule::Exact(p) => path == p.as_ref(),
            PageRule::Prefix(p) => {
                path == p.as_ref()
                    || (path.starts_with(p.as_ref()) && path[p.len()..].starts_with('/'))
            }
        }
    }
}

/// Cosmetic theme descriptor attached to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTheme {
    pub name: Cow<'static, str>,
    pub primary_color: Cow<'static, str>,
}

impl RoleTheme {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        primary_color: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            primary_color: primary_color.into(),
        }
    }
}

/// Immutable per-role policy record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleConfig {
    pub rank: u8,
    pub display_name: Cow<'static, str>,
    pub description: Cow<'static, str>,
    pub permissions: BTreeSet<Permission>,
    pub features: BTreeSet<Cow<'static, str>>,
    pub components: BTreeSet<Cow<'static, str>>,
    pub pages: Vec<PageRule>,
    pub upgrade_targets: Vec<Role>,
    pub theme: RoleTheme,
}

impl RoleConfig {
    /// A zero-access record: no grants, no features, no pages.
    pub fn empty(role: Role) -> Self {
        Self {
            rank: role.rank(),
            display_name: Cow::from(role.as_str()),
            description: Cow::from(""),
            permissions: BTreeSet::new(),
            features: BTreeSet::new(),
            components: BTreeSet::new(),
            pages: Vec::new(),
            upgrade_targets: Vec::new(),
            theme: RoleTheme::new(role.as_str(), "#6b7280"),
        }
    }
}

/// The complete role → policy table, plus the per-resource action universe
/// derived from it (used for full-resource-access checks).
///
/// Every query on this type is a pure, deterministic function of
/// `(role, arguments)`. Unknown resources, actions, features, components and
/// pages all evaluate to "no access" rather than failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    roles: BTreeMap<Role, RoleConfig>,
    resource_actions: BTreeMap<String, BTreeSet<String>>,
}

impl PolicyConfig {
    /// Build a table from per-role records.
    ///
    /// Roles missing from `roles` get a zero-access record, keeping lookups
    /// total over the closed role set. The action universe of each resource
    /// is the union of all roles' grants for it.
    pub fn new(mut roles: BTreeMap<Role, RoleConfig>) -> Self {
        for role in Role::ALL {
            roles.entry(role).or_insert_with(|| RoleConfig::empty(role));
        }
        let mut resource_actions: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for config in roles.values() {
            for perm in &config.permissions {
                resource_actions
                    .entry(perm.resource().to_string())
                    .or_default()
                    .insert(perm.action().to_string());
            }
        }
        Self {
            roles,
            resource_actions,
        }
    }

    /// The static marketplace table: guest < client < artist < admin.
    pub fn marketplace() -> Self {
        let mut roles = BTreeMap::new();

        let guest_permissions: BTreeSet<Permission> = [
            Permission::new("artwork", "read"),
            Permission::new("artist", "read"),
        ]
        .into();
        let guest_features: BTreeSet<Cow<'static, str>> =
            [Cow::from("browse-gallery"), Cow::from("view-artist-profile")].into();
        let guest_components: BTreeSet<Cow<'static, str>> =
            [Cow::from("ArtworkCard"), Cow::from("GalleryFilter")].into();
        let guest_pages = vec![
            PageRule::exact("/"),
            PageRule::prefix("/gallery"),
            PageRule::prefix("/artists"),
            PageRule::prefix("/auth"),
            PageRule::exact("/contact"),
        ];

        roles.insert(
            Role::Guest,
            RoleConfig {
                rank: Role::Guest.rank(),
                display_name: "Visitor".into(),
                description: "Anonymous visitor browsing the public gallery".into(),
                permissions: guest_permissions.clone(),
                features: guest_features.clone(),
                components: guest_components.clone(),
                pages: guest_pages.clone(),
                upgrade_targets: vec![Role::Client],
                theme: RoleTheme::new("guest", "#6b7280"),
            },
        );

        let mut client_permissions = guest_permissions;
        client_permissions.extend([
            Permission::new("order", "create"),
            Permission::new("order", "read"),
            Permission::new("cart", "read"),
            Permission::new("cart", "update"),
            Permission::new("profile", "read"),
            Permission::new("profile", "update"),
            Permission::new("review", "create"),
        ]);
        let mut client_features = guest_features;
        client_features.extend([
            Cow::from("place-order"),
            Cow::from("cart"),
            Cow::from("favorites"),
            Cow::from("reviews"),
        ]);
        let mut client_components = guest_components;
        client_components.extend([
            Cow::from("OrderActions"),
            Cow::from("CartWidget"),
            Cow::from("ReviewForm"),
        ]);
        let mut client_pages = guest_pages;
        client_pages.extend([
            PageRule::exact("/dashboard"),
            PageRule::prefix("/orders"),
            PageRule::exact("/cart"),
            PageRule::prefix("/profile"),
        ]);

        roles.insert(
            Role::Client,
            RoleConfig {
                rank: Role::Client.rank(),
                display_name: "Client".into(),
                description: "Registered client who commissions and buys artwork".into(),
                permissions: client_permissions.clone(),
                features: client_features.clone(),
                components: client_components.clone(),
                pages: client_pages.clone(),
                upgrade_targets: vec![Role::Artist],
                theme: RoleTheme::new("client", "#3b82f6"),
            },
        );

        let mut artist_permissions = client_permissions;
        artist_permissions.extend([
            Permission::new("artwork", "create"),
            Permission::new("artwork", "update"),
            Permission::new("artwork", "delete"),
            Permission::new("order", "update"),
            Permission::new("commission", "read"),
            Permission::new("commission", "update"),
        ]);
        let mut artist_features = client_features;
        artist_features.extend([
            Cow::from("artwork-studio"),
            Cow::from("commission-inbox"),
            Cow::from("sales-analytics"),
        ]);
        let mut artist_components = client_components;
        artist_components.extend([Cow::from("ArtworkUpload"), Cow::from("CommissionBoard")]);
        let mut artist_pages = client_pages;
        artist_pages.extend([PageRule::prefix("/studio"), PageRule::prefix("/commissions")]);

        roles.insert(
            Role::Artist,
            RoleConfig {
                rank: Role::Artist.rank(),
                display_name: "Artist".into(),
                description: "Verified artist selling work and taking commissions".into(),
                permissions: artist_permissions.clone(),
                features: artist_features.clone(),
                components: artist_components.clone(),
                pages: artist_pages.clone(),
                upgrade_targets: Vec::new(),
                theme: RoleTheme::new("artist", "#8b5cf6"),
            },
        );

        let mut admin_permissions = artist_permissions;
        admin_permissions.extend([
            Permission::new("user", "read"),
            Permission::new("user", "update"),
            Permission::new("user", "suspend"),
            Permission::new("order", "delete"),
            Permission::new("artwork", "moderate"),
            Permission::new("review", "moderate"),
        ]);
        let mut admin_features = artist_features;
        admin_features.extend([
            Cow::from("user-management"),
            Cow::from("content-moderation"),
            Cow::from("site-settings"),
        ]);
        let mut admin_components = artist_components;
        admin_components.extend([Cow::from("AdminPanel"), Cow::from("ModerationQueue")]);
        let mut admin_pages = artist_pages;
        admin_pages.push(PageRule::prefix("/admin"));

        roles.insert(
            Role::Admin,
            RoleConfig {
                rank: Role::Admin.rank(),
                display_name: "Administrator".into(),
                description: "Marketplace operator with moderation access".into(),
                permissions: admin_permissions,
                features: admin_features,
                components: admin_components,
                pages: admin_pages,
                upgrade_targets: Vec::new(),
                theme: RoleTheme::new("admin", "#ef4444"),
            },
        );

        Self::new(roles)
    }

    pub fn role(&self, role: Role) -> &RoleConfig {
        // The closed Role set and construction invariant guarantee presence.
        &self.roles[&role]
    }

    /// Actions defined for `resource` across the whole table.
    pub fn actions_for_resource(&self, resource: &str) -> Option<&BTreeSet<String>> {
        self.resource_actions.get(resource)
    }

    pub fn has_permission(&self, role: Role, resource: &str, action: &str) -> bool {
        self.role(role)
            .permissions
            .iter()
            .any(|p| p.resource() == resource && p.action() == action)
    }

    /// OR over `has_permission`. An empty list is `false` (nothing can be
    /// satisfied).
    pub fn has_any_permission(&self, role: Role, permissions: &[Permission]) -> bool {
        permissions
            .iter()
            .any(|p| self.has_permission(role, p.resource(), p.action()))
    }

    /// AND over `has_permission`. An empty list is vacuously `true`.
    pub fn has_all_permissions(&self, role: Role, permissions: &[Permission]) -> bool {
        permissions
            .iter()
            .all(|p| self.has_permission(role, p.resource(), p.action()))
    }

    /// True iff `role` holds every action defined for `resource`.
    pub fn has_full_resource_access(&self, role: Role, resource: &str) -> bool {
        match self.actions_for_resource(resource) {
            Some(actions) => actions
                .iter()
                .all(|action| self.has_permission(role, resource, action)),
            None => false,
        }
    }

    /// True iff `role` holds both `read` and `update` on `resource`.
    pub fn has_read_write_access(&self, role: Role, resource: &str) -> bool {
        self.has_permission(role, resource, "read") && self.has_permission(role, resource, "update")
    }

    pub fn can_access_page(&self, role: Role, path: &str) -> bool {
        self.role(role).pages.iter().any(|rule| rule.matches(path))
    }

    pub fn can_access_component(&self, role: Role, name: &str) -> bool {
        self.role(role).components.contains(name)
    }

    pub fn can_access_feature(&self, role: Role, name: &str) -> bool {
        self.role(role).features.contains(name)
    }

    pub fn can_access_any_feature(&self, role: Role, names: &[String]) -> bool {
        names.iter().any(|n| self.can_access_feature(role, n))
    }

    pub fn can_access_all_features(&self, role: Role, names: &[String]) -> bool {
        names.iter().all(|n| self.can_access_feature(role, n))
    }

    /// True iff `target` outranks `from` and an upgrade path is configured.
    pub fn upgrade_eligible(&self, from: Role, target: Role) -> bool {
        target.is_above(from) && self.role(from).upgrade_targets.contains(&target)
    }
}
