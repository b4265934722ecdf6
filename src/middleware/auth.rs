use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::modules::auth::model::Claims;
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::verify_token;

/// Extractor that validates the bearer JWT and exposes the actor's claims.
///
/// Services receive the pieces they authorize on (id, role), never the raw
/// token; authentication stops here.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    /// Admin or department head.
    pub fn is_staff(&self) -> bool {
        self.0.role.is_staff()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_with_role(role: UserRole) -> Claims {
        Claims {
            sub: Uuid::new_v4().to_string(),
            email: "test@oets.test".to_string(),
            role,
            department: None,
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_is_staff() {
        assert!(AuthUser(claims_with_role(UserRole::Admin)).is_staff());
        assert!(AuthUser(claims_with_role(UserRole::Responsable)).is_staff());
        assert!(!AuthUser(claims_with_role(UserRole::Formateur)).is_staff());
        assert!(!AuthUser(claims_with_role(UserRole::Learner)).is_staff());
    }

    #[test]
    fn test_user_id_parses_sub() {
        let id = Uuid::new_v4();
        let mut claims = claims_with_role(UserRole::Learner);
        claims.sub = id.to_string();
        assert_eq!(AuthUser(claims).user_id().unwrap(), id);
    }

    #[test]
    fn test_user_id_rejects_malformed_sub() {
        let mut claims = claims_with_role(UserRole::Learner);
        claims.sub = "not-a-uuid".to_string();
        assert!(AuthUser(claims).user_id().is_err());
    }
}
