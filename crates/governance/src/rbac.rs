//! RBAC connector trait for resolving bearer tokens into credentials.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use subtle::ConstantTimeEq;

use recordops_core::{types::Credential, Error, Result};

/// User roles returned from token validation.
#[derive(Debug, Clone, Default)]
pub struct UserRoles {
    /// User identifier.
    pub user_id: String,
    /// List of role names assigned to the user.
    pub roles: Vec<String>,
    /// Whether the user is an admin.
    pub is_admin: bool,
}

impl UserRoles {
    /// Credential to pass into store operations.
    pub fn credential(&self) -> Credential {
        if self.is_admin {
            Credential::admin(self.user_id.clone())
        } else {
            Credential::user(self.user_id.clone())
        }
    }
}

/// Connector for external identity systems.
#[async_trait]
pub trait RbacConnector: Send + Sync {
    /// Validate a token and return user roles.
    async fn validate(&self, token: &str) -> Result<UserRoles>;
}

/// Development connector: the token `admin` is an administrator, anything
/// else is an ordinary user named after the token.
pub struct NoOpRbacConnector;

#[async_trait]
impl RbacConnector for NoOpRbacConnector {
    async fn validate(&self, token: &str) -> Result<UserRoles> {
        if token.is_empty() {
            return Err(Error::unauthenticated("empty token"));
        }
        let is_admin = token == "admin";
        Ok(UserRoles {
            user_id: token.to_string(),
            roles: if is_admin { vec!["admin".to_string()] } else { vec!["user".to_string()] },
            is_admin,
        })
    }
}

/// Connector accepting a single configured administrator token.
pub struct StaticTokenRbacConnector {
    admin_token: Secret<String>,
}

impl StaticTokenRbacConnector {
    pub fn new(admin_token: Secret<String>) -> Self {
        Self { admin_token }
    }
}

#[async_trait]
impl RbacConnector for StaticTokenRbacConnector {
    async fn validate(&self, token: &str) -> Result<UserRoles> {
        let matches: bool = token
            .as_bytes()
            .ct_eq(self.admin_token.expose_secret().as_bytes())
            .into();

        if matches {
            Ok(UserRoles {
                user_id: "admin".to_string(),
                roles: vec!["admin".to_string()],
                is_admin: true,
            })
        } else {
            Err(Error::unauthenticated("invalid token"))
        }
    }
}
