//! Credential collaborator port.

use uuid::Uuid;

use crate::domain::Role;

/// Claims carried by a validated bearer token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    /// Role at issue time. The stored account's role takes precedence.
    pub role: Role,
}

/// Token service trait for signed bearer tokens.
pub trait TokenService: Send + Sync {
    /// Issue an access token for a user.
    fn generate_token(&self, user_id: Uuid, role: Role) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingAuth,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token is not valid: {0}")]
    InvalidToken(String),

    #[error("Token subject {0} has no account")]
    UnknownAccount(Uuid),

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Token signing failed: {0}")]
    Signing(String),
}
