//! Route-entry guards built from declarative options.
//!
//! A [`GuardOptions`] bundle compiles into one [`Predicate`] tree evaluated
//! before the route renders. Denials either redirect (login for guests, the
//! forbidden page otherwise, with the requested path preserved) or surface
//! the structured [`Forbidden`] condition as a 403 response.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use artmarket_navigation::urls;
use artmarket_policy::{Permission, PolicyConfig, Predicate, Role};

use crate::context::SessionContext;

/// Declarative guard attached to a route. Read-only at evaluation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuardOptions {
    /// Minimum role (hierarchy comparison, not exact match).
    pub role: Option<Role>,
    pub permission: Option<Permission>,
    pub feature: Option<String>,
    pub any_permissions: Vec<Permission>,
    pub all_permissions: Vec<Permission>,
    pub any_features: Vec<String>,
    pub all_features: Vec<String>,
    /// Overrides the computed redirect target on denial.
    pub redirect_to: Option<String>,
    /// Surface the structured forbidden condition instead of redirecting.
    pub show_error_page: bool,
}

/// Verdict of evaluating a guard for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
    Forbid(Forbidden),
}

/// Classification carried by the forbidden condition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForbiddenKind {
    LoginRequired,
    InsufficientPermission,
}

impl core::fmt::Display for ForbiddenKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ForbiddenKind::LoginRequired => f.write_str("login-required"),
            ForbiddenKind::InsufficientPermission => f.write_str("insufficient-permission"),
        }
    }
}

/// Structured "forbidden" condition, rendered as an HTTP 403.
///
/// Field names and values are an interop contract with the error page.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("forbidden: {error_type} (current role: {current_role})")]
pub struct Forbidden {
    pub status_code: u16,
    pub error_type: ForbiddenKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_permission: Option<Permission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_feature: Option<String>,
    pub current_role: Role,
}

impl Forbidden {
    fn from_options(options: &GuardOptions, current_role: Role) -> Self {
        Self {
            status_code: StatusCode::FORBIDDEN.as_u16(),
            error_type: if current_role == Role::Guest {
                ForbiddenKind::LoginRequired
            } else {
                ForbiddenKind::InsufficientPermission
            },
            required_role: options.role,
            required_permission: options.permission.clone(),
            required_feature: options.feature.clone(),
            current_role,
        }
    }
}

impl IntoResponse for Forbidden {
    fn into_response(self) -> Response {
        (StatusCode::FORBIDDEN, Json(self)).into_response()
    }
}

impl GuardOptions {
    /// Compile the declared constraints into one predicate tree.
    ///
    /// Each present field contributes a node; the nodes are joined under a
    /// single `AllOf`. `None` means the guard declares no constraints at
    /// all, which is a no-op (default allow), not a failure.
    pub fn predicate(&self) -> Option<Predicate> {
        let mut checks = Vec::new();

        if let Some(role) = self.role {
            checks.push(Predicate::RoleAtLeast(role));
        }
        if let Some(permission) = &self.permission {
            checks.push(Predicate::Has(permission.clone()));
        }
        if let Some(feature) = &self.feature {
            checks.push(Predicate::Feature(feature.clone()));
        }
        if !self.any_permissions.is_empty() {
            checks.push(Predicate::any_of(
                self.any_permissions.iter().cloned().map(Predicate::Has),
            ));
        }
        if !self.all_permissions.is_empty() {
            checks.push(Predicate::all_of(
                self.all_permissions.iter().cloned().map(Predicate::Has),
            ));
        }
        if !self.any_features.is_empty() {
            checks.push(Predicate::any_of(
                self.any_features.iter().cloned().map(Predicate::Feature),
            ));
        }
        if !self.all_features.is_empty() {
            checks.push(Predicate::all_of(
                self.all_features.iter().cloned().map(Predicate::Feature),
            ));
        }

        if checks.is_empty() {
            None
        } else {
            Some(Predicate::AllOf(checks))
        }
    }

    /// Evaluate this guard for `role` requesting `requested` (path and
    /// query, preserved for post-login resumption).
    pub fn decide(&self, config: &PolicyConfig, role: Role, requested: &str) -> GuardDecision {
        let Some(predicate) = self.predicate() else {
            return GuardDecision::Allow;
        };
        if predicate.eval(config, role) {
            return GuardDecision::Allow;
        }

        if self.show_error_page {
            GuardDecision::Forbid(Forbidden::from_options(self, role))
        } else {
            GuardDecision::Redirect(self.redirect_target(role, requested))
        }
    }

    fn redirect_target(&self, role: Role, requested: &str) -> String {
        let base = self.redirect_to.clone().unwrap_or_else(|| {
            if role == Role::Guest {
                urls::LOGIN_PATH.to_string()
            } else {
                urls::FORBIDDEN_PATH.to_string()
            }
        });

        // Guests get the requested path preserved for post-login resumption.
        if role == Role::Guest {
            urls::with_return_path(&base, requested)
        } else {
            base
        }
    }
}

/// One configured guard: the policy table plus a route's options.
#[derive(Clone)]
pub struct Guard {
    config: Arc<PolicyConfig>,
    options: Arc<GuardOptions>,
}

impl Guard {
    pub fn new(config: Arc<PolicyConfig>, options: GuardOptions) -> Self {
        Self {
            config,
            options: Arc::new(options),
        }
    }

    /// axum middleware entry point; layer with
    /// `middleware::from_fn_with_state(guard, Guard::enforce)`.
    pub async fn enforce(
        State(guard): State<Guard>,
        Extension(session): Extension<SessionContext>,
        req: Request,
        next: Next,
    ) -> Response {
        let requested = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());

        match guard.options.decide(&guard.config, session.role(), &requested) {
            GuardDecision::Allow => next.run(req).await,
            GuardDecision::Redirect(target) => {
                debug!(%requested, role = %session.role(), %target, "route denied; redirecting");
                Redirect::to(&target).into_response()
            }
            GuardDecision::Forbid(forbidden) => {
                debug!(%requested, role = %session.role(), error_type = %forbidden.error_type, "route denied");
                forbidden.into_response()
            }
        }
    }
}

// Predefined guards for the common cases. Fixed options values, no new
// logic.

/// Any authenticated role; guests go to login.
pub fn require_auth() -> GuardOptions {
    GuardOptions {
        role: Some(Role::Client),
        redirect_to: Some(urls::LOGIN_PATH.to_string()),
        ..Default::default()
    }
}

pub fn require_client() -> GuardOptions {
    GuardOptions {
        role: Some(Role::Client),
        show_error_page: true,
        ..Default::default()
    }
}

pub fn require_artist() -> GuardOptions {
    GuardOptions {
        role: Some(Role::Artist),
        show_error_page: true,
        ..Default::default()
    }
}

pub fn require_admin() -> GuardOptions {
    GuardOptions {
        role: Some(Role::Admin),
        show_error_page: true,
        ..Default::default()
    }
}

pub fn require_artwork_create() -> GuardOptions {
    GuardOptions {
        permission: Some(Permission::new("artwork", "create")),
        show_error_page: true,
        ..Default::default()
    }
}

pub fn require_order_management() -> GuardOptions {
    GuardOptions {
        any_permissions: vec![
            Permission::new("order", "create"),
            Permission::new("order", "update"),
        ],
        show_error_page: true,
        ..Default::default()
    }
}

pub fn require_user_management() -> GuardOptions {
    GuardOptions {
        all_permissions: vec![
            Permission::new("user", "read"),
            Permission::new("user", "update"),
        ],
        show_error_page: true,
        ..Default::default()
    }
}
