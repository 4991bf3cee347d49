use chrono::{Duration, Utc};
use geotaste_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::auth::{
        LoginRequest, RegisterRequest, ResetPasswordRequest, VerifyEmailRequest,
        VerifyResetOtpRequest,
    },
    entity::otps::{self, Entity as Otps},
    error::AppError,
    models::{OtpPurpose, Role},
    services::{auth_service, otp_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

// Integration flow: register -> unverified login rejected -> resend supersedes
// the first code -> verify -> login; then the full password reset round trip.
#[tokio::test]
async fn registration_verification_and_reset_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };
    unsafe { std::env::set_var("JWT_SECRET", "test-secret") };

    let state = setup_state(&database_url).await?;

    // Unique address per run so reruns and parallel suites never collide.
    let email = format!("flow.user+{}@example.com", Uuid::new_v4().simple());
    let email = email.as_str();
    let password = "Sup3rSecret";

    let registered = auth_service::register(
        &state,
        RegisterRequest {
            email: email.into(),
            password: password.into(),
            confirm_password: password.into(),
            role: Role::Normal,
        },
    )
    .await?;
    let user = registered.data.expect("registered user");
    assert!(!user.email_verified);

    // Same email again must conflict, regardless of the requested role.
    let duplicate = auth_service::register(
        &state,
        RegisterRequest {
            email: email.into(),
            password: password.into(),
            confirm_password: password.into(),
            role: Role::Store,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    // Login is refused until the email is verified.
    let early_login = auth_service::login(
        &state,
        LoginRequest {
            email: email.into(),
            password: password.into(),
        },
    )
    .await;
    assert!(matches!(early_login, Err(AppError::Authentication(_))));

    let first_otp = latest_otp(&state, user.id, OtpPurpose::EmailVerification).await?;
    assert_eq!(first_otp.code.len(), 6);
    assert!(first_otp.code.chars().all(|c| c.is_ascii_digit()));

    // Resending retires the first code.
    auth_service::resend_verification_otp(&state, email).await?;
    let first_otp_after = Otps::find_by_id(first_otp.id)
        .one(&state.orm)
        .await?
        .expect("first otp row");
    assert!(first_otp_after.used);

    let second_otp = latest_otp(&state, user.id, OtpPurpose::EmailVerification).await?;
    assert_ne!(second_otp.id, first_otp.id);

    let verified = auth_service::verify_email(
        &state,
        VerifyEmailRequest {
            email: email.into(),
            code: second_otp.code.clone(),
        },
    )
    .await?;
    assert!(verified.data.expect("verified user").email_verified);

    let login = auth_service::login(
        &state,
        LoginRequest {
            email: email.into(),
            password: password.into(),
        },
    )
    .await?;
    let login = login.data.expect("login data");
    assert!(!login.tokens.access_token.is_empty());
    assert!(!login.tokens.refresh_token.is_empty());

    // Password reset: verify step hands out a capability token without
    // consuming the code.
    auth_service::forgot_password(&state, email).await?;
    let reset_otp = latest_otp(&state, user.id, OtpPurpose::PasswordReset).await?;

    let verify_resp = auth_service::verify_password_reset_otp(
        &state,
        VerifyResetOtpRequest {
            email: email.into(),
            code: reset_otp.code.clone(),
        },
    )
    .await?;
    let reset_token = verify_resp.data.expect("verify data").reset_token;

    let otp_after_verify = Otps::find_by_id(reset_otp.id)
        .one(&state.orm)
        .await?
        .expect("reset otp row");
    assert!(!otp_after_verify.used);

    let new_password = "An0therSecret";
    auth_service::reset_password(
        &state,
        ResetPasswordRequest {
            email: email.into(),
            code: None,
            reset_token: Some(reset_token),
            new_password: new_password.into(),
        },
    )
    .await?;

    // The token path retires outstanding codes.
    let otp_after_reset = Otps::find_by_id(reset_otp.id)
        .one(&state.orm)
        .await?
        .expect("reset otp row");
    assert!(otp_after_reset.used);

    let old_login = auth_service::login(
        &state,
        LoginRequest {
            email: email.into(),
            password: password.into(),
        },
    )
    .await;
    assert!(matches!(old_login, Err(AppError::Authentication(_))));

    auth_service::login(
        &state,
        LoginRequest {
            email: email.into(),
            password: new_password.into(),
        },
    )
    .await?;

    // Expired codes are rejected even when otherwise untouched.
    auth_service::forgot_password(&state, email).await?;
    let stale_otp = latest_otp(&state, user.id, OtpPurpose::PasswordReset).await?;
    let mut stale: otps::ActiveModel = stale_otp.clone().into();
    stale.expires_at = Set((Utc::now() - Duration::minutes(1)).into());
    stale.update(&state.orm).await?;

    let expired = otp_service::validate(
        &state.orm,
        user.id,
        OtpPurpose::PasswordReset,
        &stale_otp.code,
    )
    .await;
    match expired {
        Err(AppError::Validation(msg)) => assert!(msg.contains("expired")),
        other => panic!("expected expired-code rejection, got {other:?}"),
    }

    Ok(())
}

async fn latest_otp(
    state: &AppState,
    user_id: Uuid,
    purpose: OtpPurpose,
) -> anyhow::Result<otps::Model> {
    let otp = Otps::find()
        .filter(otps::Column::UserId.eq(user_id))
        .filter(otps::Column::Purpose.eq(purpose.as_str()))
        .order_by_desc(otps::Column::ExpiresAt)
        .one(&state.orm)
        .await?
        .expect("an issued otp");
    Ok(otp)
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(pool, orm))
}
