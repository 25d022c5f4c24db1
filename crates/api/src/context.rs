use uuid::Uuid;

use artmarket_policy::Role;

/// Identity context for a request: the authenticated subject (if any) and
/// their role.
///
/// Inserted once by the session middleware and read-only afterwards. An
/// anonymous request carries the guest context.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionContext {
    subject: Option<Uuid>,
    role: Role,
}

impl SessionContext {
    pub fn guest() -> Self {
        Self {
            subject: None,
            role: Role::Guest,
        }
    }

    pub fn authenticated(subject: Uuid, role: Role) -> Self {
        Self {
            subject: Some(subject),
            role,
        }
    }

    pub fn subject(&self) -> Option<Uuid> {
        self.subject
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_authenticated(&self) -> bool {
        self.subject.is_some()
    }
}
