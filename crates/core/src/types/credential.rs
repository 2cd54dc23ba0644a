use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Caller identity passed explicitly into every store operation.
///
/// `elevated` corresponds to the store's administrative (master key) scope,
/// which destructive schema operations and unrestricted counts require.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credential {
    /// Authenticated user, `None` for anonymous callers.
    pub user_id: Option<String>,
    /// Whether the caller holds an administrator role.
    pub is_admin: bool,
    /// Whether store calls run with elevated privileges.
    pub elevated: bool,
}

impl Credential {
    /// Credential for an unauthenticated caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Credential for an authenticated user.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            is_admin: false,
            elevated: false,
        }
    }

    /// Credential for an authenticated administrator.
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::user(user_id)
        }
    }

    /// Same identity with elevated store privileges.
    pub fn elevate(&self) -> Self {
        Self {
            elevated: true,
            ..self.clone()
        }
    }

    /// Fail unless the caller is authenticated, returning the user id.
    pub fn require_authenticated(&self) -> Result<&str> {
        match self.user_id.as_deref() {
            Some(user) if !user.is_empty() => Ok(user),
            _ => Err(Error::unauthenticated("a signed-in user is required")),
        }
    }

    /// Fail unless the credential carries elevated privileges.
    pub fn require_elevated(&self) -> Result<()> {
        self.require_authenticated()?;
        if self.elevated {
            Ok(())
        } else {
            Err(Error::unauthenticated("operation requires elevated privileges"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_is_rejected() {
        let anon = Credential::anonymous();
        assert!(matches!(anon.require_authenticated(), Err(Error::Unauthenticated(_))));
        assert!(anon.elevate().require_elevated().is_err());
        assert!(Credential::user("").require_authenticated().is_err());
    }

    #[test]
    fn test_elevation() {
        let user = Credential::user("alice");
        assert_eq!(user.require_authenticated().unwrap(), "alice");
        assert!(user.require_elevated().is_err());
        assert!(user.elevate().require_elevated().is_ok());
        assert!(!user.elevate().is_admin);
    }
}
