use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Role,
};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// Claims for the short-lived password-reset capability token handed out by
/// the verify-reset-otp step. Scoped by `purpose` so an access token can
/// never be replayed as a reset capability.
#[derive(Debug, Deserialize, Serialize)]
pub struct ResetClaims {
    pub sub: String,
    pub purpose: String,
    pub exp: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

const RESET_PURPOSE: &str = "password_reset";

pub fn jwt_secret() -> AppResult<String> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))
}

fn encode_claims<T: Serialize>(claims: &T, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn expiry(from_now: Duration) -> AppResult<usize> {
    let at = Utc::now()
        .checked_add_signed(from_now)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;
    Ok(at.timestamp() as usize)
}

/// Mint an access/refresh pair for an authenticated principal.
pub fn issue_token_pair(user_id: Uuid, role: Role) -> AppResult<TokenPair> {
    let secret = jwt_secret()?;

    let access = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: expiry(Duration::hours(24))?,
    };
    let refresh = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: expiry(Duration::days(7))?,
    };

    Ok(TokenPair {
        access_token: encode_claims(&access, &secret)?,
        refresh_token: encode_claims(&refresh, &secret)?,
    })
}

pub fn issue_reset_token(user_id: Uuid) -> AppResult<String> {
    let secret = jwt_secret()?;
    let claims = ResetClaims {
        sub: user_id.to_string(),
        purpose: RESET_PURPOSE.to_string(),
        exp: expiry(Duration::minutes(10))?,
    };
    encode_claims(&claims, &secret)
}

/// Verify a reset capability token and return the principal it is scoped to.
pub fn verify_reset_token(token: &str) -> AppResult<Uuid> {
    let secret = jwt_secret()?;
    let decoded = decode::<ResetClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Authentication("Invalid or expired reset token".into()))?;

    if decoded.claims.purpose != RESET_PURPOSE {
        return Err(AppError::Authentication("Invalid or expired reset token".into()));
    }

    Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Authentication("Invalid or expired reset token".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_secret() {
        // Safety: tests run single-threaded over this var.
        unsafe { std::env::set_var("JWT_SECRET", "test-secret") };
    }

    #[test]
    fn reset_token_round_trips() {
        with_secret();
        let user_id = Uuid::new_v4();
        let token = issue_reset_token(user_id).unwrap();
        assert_eq!(verify_reset_token(&token).unwrap(), user_id);
    }

    #[test]
    fn access_token_is_not_a_reset_capability() {
        with_secret();
        let pair = issue_token_pair(Uuid::new_v4(), Role::Normal).unwrap();
        assert!(verify_reset_token(&pair.access_token).is_err());
    }
}
