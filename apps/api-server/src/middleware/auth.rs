//! Bearer token extractor.

use std::sync::Arc;

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use quill_core::DomainError;
use quill_core::domain::{Requester, Role};
use quill_core::ports::{AuthError, BaseRepository, TokenClaims, TokenService};

use super::error::AppError;
use crate::state::AppState;

/// Authenticated caller, resolved against the stored account.
///
/// Handlers that take an `Identity` reject unauthenticated requests with 401:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn requester(&self) -> Requester {
        Requester::new(self.user_id, self.role)
    }

    /// Look up the token's account. Missing and deactivated accounts are
    /// rejected; the stored role wins over the role in the token.
    async fn resolve(state: &AppState, claims: TokenClaims) -> Result<Self, AppError> {
        let user = state
            .users
            .find_by_id(claims.user_id)
            .await
            .map_err(|err| AppError::from(DomainError::from(err)))?
            .ok_or(AuthError::UnknownAccount(claims.user_id))?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated.into());
        }
        if user.role != claims.role {
            tracing::debug!(user_id = %user.id, token_role = %claims.role, role = %user.role, "Token role is stale");
        }

        Ok(Self {
            user_id: user.id,
            role: user.role,
        })
    }
}

/// Pull the bearer token out of the `Authorization` header.
///
/// The scheme is matched case-insensitively and must be followed by whitespace.
fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("header is not ASCII".to_string()))?;

    let (scheme, token) = value
        .split_once(char::is_whitespace)
        .unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidToken("expected Bearer scheme".to_string()));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingAuth);
    }
    Ok(token)
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(token_service) = req.app_data::<web::Data<Arc<dyn TokenService>>>() else {
            tracing::error!("TokenService not found in app data");
            let err: Result<Self, AppError> =
                Err(AppError::Internal("Server configuration error".to_string()));
            return Box::pin(async move { err });
        };

        let claims = bearer_token(req).and_then(|token| token_service.validate_token(token));
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let claims = claims?;
            let Some(state) = state else {
                tracing::error!("AppState not found in app data");
                return Err(AppError::Internal("Server configuration error".to_string()));
            };
            Self::resolve(&state, claims).await
        })
    }
}
