use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{error::AppError, models::Role, token::Claims};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

pub fn ensure_store(user: &AuthUser) -> Result<(), AppError> {
    match user.role {
        Role::Store | Role::Admin => Ok(()),
        Role::Normal | Role::Restaurant => Err(AppError::Forbidden),
    }
}

pub fn ensure_restaurant(user: &AuthUser) -> Result<(), AppError> {
    match user.role {
        Role::Restaurant | Role::Admin => Ok(()),
        Role::Normal | Role::Store => Err(AppError::Forbidden),
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Authentication("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Authentication("Invalid Authorization header".into()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::Authentication("Invalid Authorization scheme".into()));
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = crate::token::jwt_secret()?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Authentication("Invalid or expired token".into()))?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::Authentication("Invalid user id in token".into()))?;

        Ok(AuthUser {
            user_id,
            role: Role::parse(&decoded.claims.role)
                .map_err(|_| AppError::Authentication("Invalid role in token".into()))?,
        })
    }
}
