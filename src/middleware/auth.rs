use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, state::AppState};

pub const ADMIN_ROLE: &str = "admin";

/// Caller identity taken from a bearer JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

pub fn ensure_role(user: &AuthUser, role: &str) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, ADMIN_ROLE)
}

/// Decodes and checks a token issued by [`crate::services::auth_service::issue_token`].
pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected token");
        AppError::Unauthorized
    })?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_str = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?
            .to_str()
            .map_err(|_| AppError::Unauthorized)?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::Unauthorized);
        }

        verify_token(auth_str, &state.config.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::{models::AdminUser, services::auth_service::issue_token};

    fn admin_user() -> AdminUser {
        AdminUser {
            id: Uuid::new_v4(),
            email: "admin@example.com".into(),
            password_hash: String::new(),
            role: ADMIN_ROLE.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies_with_same_secret_only() {
        let user = admin_user();
        let (token, expires_at) = issue_token(&user, "s3cret").unwrap();
        assert!(token.starts_with("Bearer "));
        assert!(expires_at > Utc::now());

        let caller = verify_token(&token, "s3cret").unwrap();
        assert_eq!(caller.user_id, user.id);
        assert!(ensure_admin(&caller).is_ok());

        assert!(matches!(
            verify_token(&token, "other"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn non_admin_role_is_forbidden() {
        let caller = AuthUser {
            user_id: Uuid::new_v4(),
            role: "viewer".into(),
        };
        assert!(matches!(ensure_admin(&caller), Err(AppError::Forbidden)));
    }
}
