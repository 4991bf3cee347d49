use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::auth::{
        ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
        ResetPasswordRequest, VerifyEmailRequest, VerifyResetOtpRequest, VerifyResetOtpResponse,
    },
    entity::{
        restaurant_profiles::ActiveModel as RestaurantProfileActive,
        store_profiles::ActiveModel as StoreProfileActive,
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{OtpPurpose, Role, User},
    notifier,
    response::{ApiResponse, Meta},
    services::otp_service,
    state::AppState,
    token,
};

pub async fn register(state: &AppState, payload: RegisterRequest) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        email,
        password,
        confirm_password,
        role,
    } = payload;
    let email = email.trim().to_lowercase();

    if password != confirm_password {
        return Err(AppError::Validation("Passwords don't match".into()));
    }
    validate_password_strength(&password)?;

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let password_hash = hash_password(&password)?;
    let user_id = Uuid::new_v4();

    let txn = state.orm.begin().await?;

    let user = UserActive {
        id: Set(user_id),
        email: Set(email.clone()),
        password_hash: Set(password_hash),
        role: Set(role.as_str().to_string()),
        email_verified: Set(false),
        full_name: NotSet,
        phone: NotSet,
        address: NotSet,
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    // Role-specific profile shell; required fields are completed later.
    match role {
        Role::Store => {
            StoreProfileActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                store_name: Set(String::new()),
                address: Set(String::new()),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
        Role::Restaurant => {
            RestaurantProfileActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                restaurant_name: Set(String::new()),
                address: Set(String::new()),
                cuisine: NotSet,
                latitude: NotSet,
                longitude: NotSet,
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
        Role::Normal | Role::Admin => {}
    }

    let otp = otp_service::issue(&txn, user_id, OtpPurpose::EmailVerification).await?;
    txn.commit().await?;

    // Mail failure must not undo the registration.
    if let Err(err) = notifier::send_verification_code(&user.email, &otp.code).await {
        tracing::warn!(error = %err, "verification mail dispatch failed");
    }

    Ok(ApiResponse::success(
        "User registered, verification code sent",
        user_to_api(user)?,
        Some(Meta::empty()),
    ))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;

    let user = find_by_email(&state.orm, &email).await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Authentication("Invalid email or password".into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Authentication("Invalid email or password".into()));
    }

    // Policy: unverified principals cannot log in; the client is pointed at
    // the verify-email flow with a distinct message.
    if !user.email_verified {
        return Err(AppError::Authentication(
            "Email not verified. Please verify your email first".into(),
        ));
    }

    let role = Role::parse(&user.role)?;
    let tokens = token::issue_token_pair(user.id, role)?;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            user: user_to_api(user)?,
            tokens,
        },
        Some(Meta::empty()),
    ))
}

pub async fn verify_email(
    state: &AppState,
    payload: VerifyEmailRequest,
) -> AppResult<ApiResponse<User>> {
    let user = require_by_email(&state.orm, &payload.email).await?;

    let txn = state.orm.begin().await?;
    let otp = otp_service::validate(&txn, user.id, OtpPurpose::EmailVerification, &payload.code)
        .await?;
    otp_service::consume(&txn, otp).await?;

    let mut active: UserActive = user.into();
    active.email_verified = Set(true);
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Email verified",
        user_to_api(user)?,
        Some(Meta::empty()),
    ))
}

pub async fn resend_verification_otp(state: &AppState, email: &str) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = require_by_email(&state.orm, email).await?;
    if user.email_verified {
        return Err(AppError::Validation("Email is already verified".into()));
    }

    let txn = state.orm.begin().await?;
    let otp = otp_service::issue(&txn, user.id, OtpPurpose::EmailVerification).await?;
    txn.commit().await?;

    if let Err(err) = notifier::send_verification_code(&user.email, &otp.code).await {
        tracing::warn!(error = %err, "verification mail dispatch failed");
    }

    Ok(ApiResponse::success(
        "Verification code sent",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn forgot_password(state: &AppState, email: &str) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = require_by_email(&state.orm, email).await?;

    let txn = state.orm.begin().await?;
    let otp = otp_service::issue(&txn, user.id, OtpPurpose::PasswordReset).await?;
    txn.commit().await?;

    if let Err(err) = notifier::send_password_reset_code(&user.email, &otp.code).await {
        tracing::warn!(error = %err, "reset mail dispatch failed");
    }

    Ok(ApiResponse::success(
        "Password reset code sent",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Check the code without consuming it and hand back a short-lived capability
/// token scoped to the reset operation. The code stays live until the reset
/// actually happens, so an abandoned verify step leaves no dangling "may
/// reset" state once the code expires.
pub async fn verify_password_reset_otp(
    state: &AppState,
    payload: VerifyResetOtpRequest,
) -> AppResult<ApiResponse<VerifyResetOtpResponse>> {
    let user = require_by_email(&state.orm, &payload.email).await?;
    otp_service::validate(&state.orm, user.id, OtpPurpose::PasswordReset, &payload.code).await?;

    let reset_token = token::issue_reset_token(user.id)?;
    Ok(ApiResponse::success(
        "Code verified",
        VerifyResetOtpResponse { reset_token },
        Some(Meta::empty()),
    ))
}

pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = require_by_email(&state.orm, &payload.email).await?;
    validate_password_strength(&payload.new_password)?;

    let txn = state.orm.begin().await?;

    match (&payload.code, &payload.reset_token) {
        (Some(code), _) => {
            let otp =
                otp_service::validate(&txn, user.id, OtpPurpose::PasswordReset, code).await?;
            otp_service::consume(&txn, otp).await?;
        }
        (None, Some(reset_token)) => {
            let token_user = token::verify_reset_token(reset_token)?;
            if token_user != user.id {
                return Err(AppError::Authentication("Invalid or expired reset token".into()));
            }
            // The capability replaces the code, so retire outstanding codes.
            otp_service::invalidate_unused(&txn, user.id, OtpPurpose::PasswordReset).await?;
        }
        (None, None) => {
            return Err(AppError::Validation(
                "Provide a reset code or reset token".into(),
            ));
        }
    }

    let password_hash = hash_password(&payload.new_password)?;
    let mut active: UserActive = user.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Password reset successful",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn change_password(
    state: &AppState,
    auth: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = Users::find_by_id(auth.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if !verify_password(&payload.old_password, &user.password_hash)? {
        return Err(AppError::Authentication("Old password is incorrect".into()));
    }
    validate_password_strength(&payload.new_password)?;

    let password_hash = hash_password(&payload.new_password)?;
    let mut active: UserActive = user.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Password changed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn current_user(state: &AppState, auth: &AuthUser) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(auth.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", user_to_api(user)?, None))
}

async fn find_by_email<C: ConnectionTrait>(conn: &C, email: &str) -> AppResult<Option<UserModel>> {
    let user = Users::find()
        .filter(UserCol::Email.eq(email.trim().to_lowercase()))
        .one(conn)
        .await?;
    Ok(user)
}

async fn require_by_email<C: ConnectionTrait>(conn: &C, email: &str) -> AppResult<UserModel> {
    find_by_email(conn, email).await?.ok_or(AppError::NotFound)
}

pub fn user_to_api(model: UserModel) -> AppResult<User> {
    Ok(User {
        id: model.id,
        email: model.email,
        role: Role::parse(&model.role)?,
        email_verified: model.email_verified,
        full_name: model.full_name,
        phone: model.phone,
        address: model.address,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Minimum length 8 with at least one uppercase letter, one lowercase letter
/// and one digit.
pub fn validate_password_strength(password: &str) -> AppResult<()> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::Validation(
            "Password must contain an uppercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::Validation(
            "Password must contain a lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("Password must contain a digit".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_compliant_password() {
        assert!(validate_password_strength("Abcd1234").is_ok());
    }

    #[test]
    fn rejects_short_passwords() {
        assert!(validate_password_strength("Ab1x").is_err());
    }

    #[test]
    fn rejects_missing_character_classes() {
        assert!(validate_password_strength("abcd1234").is_err()); // no uppercase
        assert!(validate_password_strength("ABCD1234").is_err()); // no lowercase
        assert!(validate_password_strength("Abcdefgh").is_err()); // no digit
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("Abcd1234").unwrap();
        assert!(verify_password("Abcd1234", &hash).unwrap());
        assert!(!verify_password("Abcd1235", &hash).unwrap());
    }
}
