//! Canonical denial destinations.
//!
//! These URL shapes are an interop contract with the login, upgrade and
//! contact pages; change them only together with those consumers.

use artmarket_policy::Role;

pub const LOGIN_PATH: &str = "/auth/login";
pub const UPGRADE_PATH: &str = "/profile/upgrade";
pub const CONTACT_PATH: &str = "/contact";
pub const FORBIDDEN_PATH: &str = "/403";

/// Login URL, optionally carrying the originally requested path for
/// post-login resumption.
pub fn login_url(redirect_to: Option<&str>) -> String {
    match redirect_to {
        Some(path) => format!("{LOGIN_PATH}?redirect={}", urlencoding::encode(path)),
        None => LOGIN_PATH.to_string(),
    }
}

/// Role-upgrade URL, optionally naming the desired target role.
pub fn upgrade_url(target: Option<Role>) -> String {
    match target {
        Some(role) => format!("{UPGRADE_PATH}?target={role}"),
        None => UPGRADE_PATH.to_string(),
    }
}

/// Contact-admin URL with the permission-request subject preset.
pub fn contact_admin_url(reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!(
            "{CONTACT_PATH}?subject=permission-request&reason={}",
            urlencoding::encode(reason)
        ),
        None => format!("{CONTACT_PATH}?subject=permission-request"),
    }
}

/// Append the originally requested path as a `redirect` query parameter to
/// an arbitrary base destination.
pub fn with_return_path(base: &str, return_path: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!(
        "{base}{separator}redirect={}",
        urlencoding::encode(return_path)
    )
}
