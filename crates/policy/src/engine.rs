//! The permission engine: single authority translating `(role, query)` into
//! a verdict, with memoization and role-hierarchy arithmetic.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, warn};

use crate::{Permission, PolicyConfig, Predicate, Role, RoleConfig, RoleTheme};

/// Evaluates permission, page, component and feature queries for a current
/// role against an immutable [`PolicyConfig`].
///
/// Verdicts are memoized per `(role, query kind, arguments)`; the cache is
/// invalidated in full whenever the role changes. List-shaped arguments are
/// normalized (sorted, deduplicated) before key construction, so
/// semantically identical compound queries share one entry.
///
/// The engine is safe to share across threads: the role sits behind a
/// read/write lock and the cache behind a mutex.
pub struct PermissionEngine {
    config: Arc<PolicyConfig>,
    role: RwLock<Role>,
    cache: Option<Mutex<HashMap<String, bool>>>,
}

impl PermissionEngine {
    /// Engine with memoization enabled, starting as guest.
    pub fn new(config: Arc<PolicyConfig>) -> Self {
        Self {
            config,
            role: RwLock::new(Role::Guest),
            cache: Some(Mutex::new(HashMap::new())),
        }
    }

    /// Engine that recomputes every query.
    pub fn uncached(config: Arc<PolicyConfig>) -> Self {
        Self {
            config,
            role: RwLock::new(Role::Guest),
            cache: None,
        }
    }

    /// Set the starting role (builder form).
    pub fn with_role(self, role: Role) -> Self {
        *self.role.write().unwrap() = role;
        self
    }

    pub fn config(&self) -> &Arc<PolicyConfig> {
        &self.config
    }

    pub fn current_role(&self) -> Role {
        *self.role.read().unwrap()
    }

    /// Replace the current role.
    ///
    /// Unknown labels are rejected: a warning is logged and both the role and
    /// the cache stay untouched. On success the cache is invalidated in full
    /// so no verdict computed for the previous role can be served.
    pub fn set_role(&self, role: &str) {
        match Role::from_str(role) {
            Ok(parsed) => {
                *self.role.write().unwrap() = parsed;
                self.clear_cache();
            }
            Err(err) => {
                warn!(role, %err, "rejected role change");
            }
        }
    }

    fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().unwrap().clear();
        }
    }

    /// Memoize `compute` under `key`, or run it directly when caching is off.
    fn cached(&self, key: String, compute: impl FnOnce() -> bool) -> bool {
        let Some(cache) = &self.cache else {
            return compute();
        };
        let mut map = cache.lock().unwrap();
        if let Some(verdict) = map.get(&key) {
            debug!(key = %key, verdict = *verdict, "permission cache hit");
            return *verdict;
        }
        let verdict = compute();
        map.insert(key, verdict);
        verdict
    }

    fn key(&self, kind: &str, args: &str) -> String {
        format!("{}:{}:{}", self.current_role(), kind, args)
    }

    /// Order-independent serialization for list-shaped arguments.
    fn normalized(mut parts: Vec<String>) -> String {
        parts.sort();
        parts.dedup();
        parts.join(",")
    }

    // Permission queries -----------------------------------------------------

    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        let role = self.current_role();
        self.cached(self.key("permission", &format!("{resource}:{action}")), || {
            self.config.has_permission(role, resource, action)
        })
    }

    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        let role = self.current_role();
        let args = Self::normalized(permissions.iter().map(ToString::to_string).collect());
        self.cached(self.key("any-permission", &args), || {
            self.config.has_any_permission(role, permissions)
        })
    }

    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        let role = self.current_role();
        let args = Self::normalized(permissions.iter().map(ToString::to_string).collect());
        self.cached(self.key("all-permissions", &args), || {
            self.config.has_all_permissions(role, permissions)
        })
    }

    pub fn has_full_resource_access(&self, resource: &str) -> bool {
        let role = self.current_role();
        self.cached(self.key("full-resource", resource), || {
            self.config.has_full_resource_access(role, resource)
        })
    }

    pub fn has_read_write_access(&self, resource: &str) -> bool {
        let role = self.current_role();
        self.cached(self.key("read-write", resource), || {
            self.config.has_read_write_access(role, resource)
        })
    }

    // Page / component / feature queries -------------------------------------

    pub fn can_access_page(&self, path: &str) -> bool {
        let role = self.current_role();
        self.cached(self.key("page", path), || {
            self.config.can_access_page(role, path)
        })
    }

    pub fn can_access_component(&self, name: &str) -> bool {
        let role = self.current_role();
        self.cached(self.key("component", name), || {
            self.config.can_access_component(role, name)
        })
    }

    pub fn can_access_feature(&self, name: &str) -> bool {
        let role = self.current_role();
        self.cached(self.key("feature", name), || {
            self.config.can_access_feature(role, name)
        })
    }

    pub fn can_access_any_feature(&self, names: &[String]) -> bool {
        let role = self.current_role();
        let args = Self::normalized(names.to_vec());
        self.cached(self.key("any-feature", &args), || {
            self.config.can_access_any_feature(role, names)
        })
    }

    pub fn can_access_all_features(&self, names: &[String]) -> bool {
        let role = self.current_role();
        let args = Self::normalized(names.to_vec());
        self.cached(self.key("all-features", &args), || {
            self.config.can_access_all_features(role, names)
        })
    }

    // Role arithmetic (uncached: pure rank comparisons) ----------------------

    pub fn current_role_at_least(&self, role: Role) -> bool {
        self.current_role().is_at_least(role)
    }

    pub fn has_higher_role(&self, role: Role) -> bool {
        self.current_role().is_above(role)
    }

    pub fn upgrade_eligible(&self, target: Role) -> bool {
        self.config.upgrade_eligible(self.current_role(), target)
    }

    // Predicate interpreter ---------------------------------------------------

    /// Evaluate a composed predicate for the current role.
    pub fn evaluate(&self, predicate: &Predicate) -> bool {
        predicate.eval(&self.config, self.current_role())
    }

    // Role metadata -----------------------------------------------------------

    pub fn role_config(&self) -> &RoleConfig {
        self.config.role(self.current_role())
    }

    pub fn theme(&self) -> &RoleTheme {
        &self.role_config().theme
    }

    pub fn role_display_name(&self) -> &str {
        &self.role_config().display_name
    }

    pub fn role_description(&self) -> &str {
        &self.role_config().description
    }

    pub fn permissions(&self) -> Vec<Permission> {
        self.role_config().permissions.iter().cloned().collect()
    }

    pub fn accessible_features(&self) -> Vec<String> {
        self.role_config()
            .features
            .iter()
            .map(|f| f.to_string())
            .collect()
    }

    #[cfg(test)]
    fn cache_len(&self) -> usize {
        self.cache
            .as_ref()
            .map(|c| c.lock().unwrap().len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn engine_as(role: Role) -> PermissionEngine {
        PermissionEngine::new(Arc::new(PolicyConfig::marketplace())).with_role(role)
    }

    #[test]
    fn verdicts_match_direct_configuration_lookup() {
        let engine = engine_as(Role::Client);
        assert!(engine.has_permission("order", "create"));
        assert!(!engine.has_permission("artwork", "create"));
        assert!(engine.can_access_feature("cart"));
        assert!(engine.can_access_component("CartWidget"));
        assert!(engine.can_access_page("/dashboard"));
        assert!(!engine.can_access_page("/admin/users"));
    }

    #[test]
    fn empty_compound_queries_keep_the_asymmetry() {
        let engine = engine_as(Role::Admin);
        assert!(engine.has_all_permissions(&[]));
        assert!(!engine.has_any_permission(&[]));
        assert!(engine.can_access_all_features(&[]));
        assert!(!engine.can_access_any_feature(&[]));
    }

    #[test]
    fn set_role_invalidates_the_cache_in_full() {
        let engine = engine_as(Role::Client);
        // Populate the cache with client verdicts.
        assert!(engine.has_permission("order", "create"));
        assert!(engine.can_access_page("/dashboard"));
        assert!(engine.cache_len() > 0);

        engine.set_role("guest");
        assert_eq!(engine.cache_len(), 0);
        // The same queries recompute under the new role.
        assert!(!engine.has_permission("order", "create"));
        assert!(!engine.can_access_page("/dashboard"));
    }

    #[test]
    fn set_role_rejects_unknown_labels_and_keeps_state() {
        let engine = engine_as(Role::Artist);
        assert!(engine.has_permission("artwork", "create"));
        let cached = engine.cache_len();

        engine.set_role("bogus");
        assert_eq!(engine.current_role(), Role::Artist);
        assert_eq!(engine.cache_len(), cached);
    }

    #[test]
    fn list_arguments_share_one_cache_entry_regardless_of_order() {
        let engine = engine_as(Role::Client);
        let a = Permission::new("order", "create");
        let b = Permission::new("order", "update");

        assert!(engine.has_any_permission(&[a.clone(), b.clone()]));
        assert!(engine.has_any_permission(&[b.clone(), a.clone(), b]));
        assert_eq!(engine.cache_len(), 1);
    }

    #[test]
    fn uncached_engine_recomputes_every_query() {
        let engine = PermissionEngine::uncached(Arc::new(PolicyConfig::marketplace()))
            .with_role(Role::Admin);
        assert!(engine.has_permission("user", "suspend"));
        assert!(engine.has_permission("user", "suspend"));
        assert_eq!(engine.cache_len(), 0);
    }

    #[test]
    fn role_arithmetic_uses_the_hierarchy() {
        let engine = engine_as(Role::Artist);
        assert!(engine.current_role_at_least(Role::Client));
        assert!(engine.current_role_at_least(Role::Artist));
        assert!(!engine.current_role_at_least(Role::Admin));
        assert!(engine.has_higher_role(Role::Client));
        assert!(!engine.has_higher_role(Role::Artist));
    }

    #[test]
    fn upgrade_paths_are_checked_against_configuration() {
        assert!(engine_as(Role::Guest).upgrade_eligible(Role::Client));
        assert!(!engine_as(Role::Guest).upgrade_eligible(Role::Admin));
        assert!(!engine_as(Role::Admin).upgrade_eligible(Role::Client));
    }

    #[test]
    fn predicate_evaluation_uses_the_current_role() {
        let engine = engine_as(Role::Client);
        let tree = Predicate::all_of([
            Predicate::RoleAtLeast(Role::Client),
            Predicate::Has(Permission::new("order", "create")),
        ]);
        assert!(engine.evaluate(&tree));

        engine.set_role("guest");
        assert!(!engine.evaluate(&tree));
    }

    #[test]
    fn metadata_accessors_follow_the_role() {
        let engine = engine_as(Role::Artist);
        assert_eq!(engine.role_display_name(), "Artist");
        assert_eq!(engine.theme().primary_color, "#8b5cf6");
        assert!(engine
            .permissions()
            .contains(&Permission::new("artwork", "create")));
        assert!(engine
            .accessible_features()
            .contains(&"artwork-studio".to_string()));
    }

    fn known_queries() -> Vec<(&'static str, &'static str)> {
        vec![
            ("artwork", "read"),
            ("artwork", "create"),
            ("order", "create"),
            ("order", "update"),
            ("order", "delete"),
            ("cart", "update"),
            ("user", "suspend"),
            ("nonexistent", "read"),
            ("order", "frobnicate"),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: verdicts are deterministic and equal direct membership
        /// in the configured grant set, cached or not.
        #[test]
        fn has_permission_is_deterministic_membership(
            role in prop::sample::select(Role::ALL.to_vec()),
            query in prop::sample::select(known_queries()),
        ) {
            let config = Arc::new(PolicyConfig::marketplace());
            let cached = PermissionEngine::new(config.clone()).with_role(role);
            let direct = config.has_permission(role, query.0, query.1);

            prop_assert_eq!(cached.has_permission(query.0, query.1), direct);
            // Second evaluation serves the memoized verdict.
            prop_assert_eq!(cached.has_permission(query.0, query.1), direct);

            let uncached = PermissionEngine::uncached(config).with_role(role);
            prop_assert_eq!(uncached.has_permission(query.0, query.1), direct);
        }

        /// Property: any-of is OR and all-of is AND over atomic verdicts.
        #[test]
        fn compound_queries_agree_with_atomic_verdicts(
            role in prop::sample::select(Role::ALL.to_vec()),
            picks in prop::collection::vec(prop::sample::select(known_queries()), 0..5),
        ) {
            let config = Arc::new(PolicyConfig::marketplace());
            let engine = PermissionEngine::new(config.clone()).with_role(role);
            let permissions: Vec<Permission> = picks
                .iter()
                .map(|(r, a)| Permission::new(*r, *a))
                .collect();

            let atomic: Vec<bool> = picks
                .iter()
                .map(|(r, a)| config.has_permission(role, r, a))
                .collect();

            prop_assert_eq!(
                engine.has_any_permission(&permissions),
                atomic.iter().any(|v| *v)
            );
            prop_assert_eq!(
                engine.has_all_permissions(&permissions),
                atomic.iter().all(|v| *v)
            );
        }
    }
}
