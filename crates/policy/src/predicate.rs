//! Declarative access predicates.
//!
//! Guards compose atomic checks into one expression tree; a single
//! interpreter evaluates the tree against `(config, role)`. Combinator
//! semantics match the compound permission queries: `AllOf([])` is vacuously
//! true, `AnyOf([])` is false.

use crate::{Permission, PolicyConfig, Role};

/// An access-control expression over atomic checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Subject's role ranks at least as high as the given role.
    RoleAtLeast(Role),
    /// Subject's role holds the given (resource, action) grant.
    Has(Permission),
    /// Subject's role can access the named feature.
    Feature(String),
    /// At least one branch holds.
    AnyOf(Vec<Predicate>),
    /// Every branch holds.
    AllOf(Vec<Predicate>),
    /// Negation.
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn any_of(branches: impl IntoIterator<Item = Predicate>) -> Self {
        Self::AnyOf(branches.into_iter().collect())
    }

    pub fn all_of(branches: impl IntoIterator<Item = Predicate>) -> Self {
        Self::AllOf(branches.into_iter().collect())
    }

    pub fn not(inner: Predicate) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Evaluate the tree for `role` against `config`.
    ///
    /// Pure and deterministic; unknown tokens in the leaves evaluate to
    /// `false` like every other policy query.
    pub fn eval(&self, config: &PolicyConfig, role: Role) -> bool {
        match self {
            Predicate::RoleAtLeast(min) => role.is_at_least(*min),
            Predicate::Has(permission) => {
                config.has_permission(role, permission.resource(), permission.action())
            }
            Predicate::Feature(name) => config.can_access_feature(role, name),
            Predicate::AnyOf(branches) => branches.iter().any(|p| p.eval(config, role)),
            Predicate::AllOf(branches) => branches.iter().all(|p| p.eval(config, role)),
            Predicate::Not(inner) => !inner.eval(config, role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PolicyConfig {
        PolicyConfig::marketplace()
    }

    #[test]
    fn leaves_delegate_to_policy_queries() {
        let config = config();
        assert!(Predicate::RoleAtLeast(Role::Client).eval(&config, Role::Artist));
        assert!(!Predicate::RoleAtLeast(Role::Admin).eval(&config, Role::Artist));
        assert!(Predicate::Has(Permission::new("order", "create")).eval(&config, Role::Client));
        assert!(!Predicate::Has(Permission::new("order", "create")).eval(&config, Role::Guest));
        assert!(Predicate::Feature("cart".to_string()).eval(&config, Role::Client));
    }

    #[test]
    fn empty_combinators_keep_the_documented_asymmetry() {
        let config = config();
        assert!(Predicate::all_of([]).eval(&config, Role::Guest));
        assert!(!Predicate::any_of([]).eval(&config, Role::Admin));
    }

    #[test]
    fn mixed_tree_evaluates_recursively() {
        let config = config();
        // Artist, or any client who can place orders.
        let tree = Predicate::any_of([
            Predicate::RoleAtLeast(Role::Artist),
            Predicate::all_of([
                Predicate::RoleAtLeast(Role::Client),
                Predicate::Has(Permission::new("order", "create")),
            ]),
        ]);

        assert!(tree.eval(&config, Role::Artist));
        assert!(tree.eval(&config, Role::Client));
        assert!(!tree.eval(&config, Role::Guest));
    }

    #[test]
    fn not_inverts_its_branch() {
        let config = config();
        let guests_only = Predicate::not(Predicate::RoleAtLeast(Role::Client));
        assert!(guests_only.eval(&config, Role::Guest));
        assert!(!guests_only.eval(&config, Role::Client));
    }
}
