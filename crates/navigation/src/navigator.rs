//! Permission-gated navigation.
//!
//! The navigator wraps the routing primitive: it evaluates policy before a
//! transition, exposes the denial destinations, and reports each attempt as
//! its own result object. An atomic gauge tracks how many attempts are in
//! flight, so overlapping calls never race on shared flags.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use tracing::{debug, warn};

use artmarket_policy::{Permission, PermissionEngine, Role};

use crate::route::RoutePrimitive;
use crate::urls;

/// Invoked with the denial reason when a gated navigation is refused.
pub type UnauthorizedCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Per-call navigation options.
#[derive(Default)]
pub struct NavigationOptions {
    /// Gate the transition behind policy evaluation. Off by default: an
    /// ungated call transitions unconditionally.
    pub check_permission: bool,
    pub required_role: Option<Role>,
    pub required_permission: Option<Permission>,
    pub required_feature: Option<String>,
    /// Overrides the recorded denial reason.
    pub custom_error_message: Option<String>,
    pub on_unauthorized: Option<UnauthorizedCallback>,
}

impl fmt::Debug for NavigationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationOptions")
            .field("check_permission", &self.check_permission)
            .field("required_role", &self.required_role)
            .field("required_permission", &self.required_permission)
            .field("required_feature", &self.required_feature)
            .field("custom_error_message", &self.custom_error_message)
            .field("on_unauthorized", &self.on_unauthorized.is_some())
            .finish()
    }
}

/// How one navigation attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "detail")]
pub enum NavigationOutcome {
    /// The routing primitive settled successfully.
    Completed,
    /// Policy refused the transition; it never started.
    Denied(String),
    /// The transition itself failed.
    Failed(String),
}

/// Result object for a single navigation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationAttempt {
    path: String,
    outcome: NavigationOutcome,
}

impl NavigationAttempt {
    fn completed(path: &str) -> Self {
        Self {
            path: path.to_string(),
            outcome: NavigationOutcome::Completed,
        }
    }

    fn denied(path: &str, reason: String) -> Self {
        Self {
            path: path.to_string(),
            outcome: NavigationOutcome::Denied(reason),
        }
    }

    fn failed(path: &str, error: String) -> Self {
        Self {
            path: path.to_string(),
            outcome: NavigationOutcome::Failed(error),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn outcome(&self) -> &NavigationOutcome {
        &self.outcome
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == NavigationOutcome::Completed
    }

    /// The denial reason or transition error, if any.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            NavigationOutcome::Completed => None,
            NavigationOutcome::Denied(reason) => Some(reason),
            NavigationOutcome::Failed(error) => Some(error),
        }
    }
}

/// Gates client-initiated transitions behind the permission engine.
pub struct Navigator<R> {
    engine: Arc<PermissionEngine>,
    router: R,
    in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(gauge: &'a AtomicUsize) -> Self {
        gauge.fetch_add(1, Ordering::SeqCst);
        Self(gauge)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<R: RoutePrimitive> Navigator<R> {
    pub fn new(engine: Arc<PermissionEngine>, router: R) -> Self {
        Self {
            engine,
            router,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn engine(&self) -> &PermissionEngine {
        &self.engine
    }

    /// True while any navigation attempt is in flight.
    pub fn is_navigating(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Navigate to `path`, optionally gated by policy.
    ///
    /// A denied attempt never reaches the routing primitive; a transition
    /// failure is caught and recorded on the attempt. The in-flight gauge is
    /// released on every exit path.
    pub async fn navigate_with_permission(
        &self,
        path: &str,
        options: NavigationOptions,
    ) -> NavigationAttempt {
        let _gauge = InFlight::enter(&self.in_flight);

        if !options.check_permission {
            return self.transition(path).await;
        }

        if !self.engine.can_access_page(path) {
            return self.deny(path, format!("no access to page: {path}"), &options);
        }

        if let Some(reason) = self.unmet_requirement(&options) {
            return self.deny(path, reason, &options);
        }

        self.transition(path).await
    }

    /// Navigate to the login page, preserving the originally requested path.
    ///
    /// Denial destinations are never permission-gated.
    pub async fn navigate_to_login(&self, redirect_to: Option<&str>) -> NavigationAttempt {
        let _gauge = InFlight::enter(&self.in_flight);
        self.transition(&urls::login_url(redirect_to)).await
    }

    /// Navigate to the role-upgrade page.
    pub async fn navigate_to_upgrade(&self, target: Option<Role>) -> NavigationAttempt {
        let _gauge = InFlight::enter(&self.in_flight);
        self.transition(&urls::upgrade_url(target)).await
    }

    /// Navigate to the contact-admin page with a permission-request subject.
    pub async fn navigate_to_contact_admin(&self, reason: Option<&str>) -> NavigationAttempt {
        let _gauge = InFlight::enter(&self.in_flight);
        self.transition(&urls::contact_admin_url(reason)).await
    }

    /// The same evaluation as [`Self::navigate_with_permission`], without a
    /// transition. For conditional rendering of links and buttons.
    pub fn can_navigate_to(&self, path: &str, options: &NavigationOptions) -> bool {
        self.engine.can_access_page(path) && self.unmet_requirement(options).is_none()
    }

    /// Page-access check alone, without the compound requirements.
    pub fn check_page_permission(&self, path: &str) -> bool {
        self.engine.can_access_page(path)
    }

    fn unmet_requirement(&self, options: &NavigationOptions) -> Option<String> {
        if let Some(role) = options.required_role {
            if !self.engine.current_role_at_least(role) {
                return Some(format!("requires role {role} or higher"));
            }
        }
        if let Some(permission) = &options.required_permission {
            if !self
                .engine
                .has_permission(permission.resource(), permission.action())
            {
                return Some(format!("requires permission {permission}"));
            }
        }
        if let Some(feature) = &options.required_feature {
            if !self.engine.can_access_feature(feature) {
                return Some(format!("requires feature {feature}"));
            }
        }
        None
    }

    fn deny(&self, path: &str, reason: String, options: &NavigationOptions) -> NavigationAttempt {
        let message = options.custom_error_message.clone().unwrap_or(reason);
        debug!(path, %message, role = %self.engine.current_role(), "navigation denied");
        if let Some(callback) = &options.on_unauthorized {
            callback(&message);
        }
        NavigationAttempt::denied(path, message)
    }

    async fn transition(&self, path: &str) -> NavigationAttempt {
        match self.router.navigate(path).await {
            Ok(()) => NavigationAttempt::completed(path),
            Err(err) => {
                warn!(path, %err, "route transition failed");
                NavigationAttempt::failed(path, err.to_string())
            }
        }
    }
}
