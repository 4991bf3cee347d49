//! Outbound email dispatch for one-time codes.
//!
//! The delivery transport lives outside this service; here the dispatch is
//! logged so flows stay observable in development. Callers treat failure as
//! non-fatal: a lost verification mail must never roll back the signup.

use crate::error::AppResult;

pub async fn send_verification_code(email: &str, code: &str) -> AppResult<()> {
    tracing::info!(
        email = %email,
        "dispatching verification mail: Your GeoTaste verification code is {code}. It expires in 10 minutes."
    );
    Ok(())
}

pub async fn send_password_reset_code(email: &str, code: &str) -> AppResult<()> {
    tracing::info!(
        email = %email,
        "dispatching reset mail: Your GeoTaste password reset code is {code}. It expires in 10 minutes."
    );
    Ok(())
}
