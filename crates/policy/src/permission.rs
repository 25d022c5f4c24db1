use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// An atomic (resource, action) grant.
///
/// Both tokens are case-sensitive exact-match identifiers (e.g. `order` /
/// `update`). There is no wildcard matching at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permission {
    resource: Cow<'static, str>,
    action: Cow<'static, str>,
}

impl Permission {
    pub fn new(
        resource: impl Into<Cow<'static, str>>,
        action: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}
