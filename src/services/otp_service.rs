//! One-time codes for email verification and password reset.
//!
//! A code is valid iff `now < expires_at && !used`. Several codes may exist
//! per (user, purpose); only the latest unused one is canonical because
//! `issue` retires the older ones before inserting.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    entity::otps::{ActiveModel as OtpActive, Column as OtpCol, Entity as Otps, Model as OtpModel},
    error::{AppError, AppResult},
    models::OtpPurpose,
};

const OTP_TTL_MINUTES: i64 = 10;

/// Retire any unused codes for this (user, purpose), then insert a fresh one.
/// Callers run this inside a transaction so concurrent issuers cannot leave
/// two active codes behind.
pub async fn issue<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    purpose: OtpPurpose,
) -> AppResult<OtpModel> {
    invalidate_unused(conn, user_id, purpose).await?;

    let now = Utc::now();
    let otp = OtpActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        code: Set(generate_code()),
        purpose: Set(purpose.as_str().to_string()),
        used: Set(false),
        created_at: NotSet,
        expires_at: Set((now + Duration::minutes(OTP_TTL_MINUTES)).into()),
    }
    .insert(conn)
    .await?;

    Ok(otp)
}

/// Mark every unused code for (user, purpose) as used. The `used = false`
/// guard makes concurrent invalidations converge instead of racing.
pub async fn invalidate_unused<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    purpose: OtpPurpose,
) -> AppResult<()> {
    Otps::update_many()
        .col_expr(OtpCol::Used, Expr::value(true))
        .filter(OtpCol::UserId.eq(user_id))
        .filter(OtpCol::Purpose.eq(purpose.as_str()))
        .filter(OtpCol::Used.eq(false))
        .exec(conn)
        .await?;
    Ok(())
}

/// Look up a submitted code without consuming it. The caller decides when
/// consumption happens.
pub async fn validate<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    purpose: OtpPurpose,
    submitted_code: &str,
) -> AppResult<OtpModel> {
    let otp = Otps::find()
        .filter(OtpCol::UserId.eq(user_id))
        .filter(OtpCol::Purpose.eq(purpose.as_str()))
        .filter(OtpCol::Code.eq(submitted_code))
        .one(conn)
        .await?;

    let otp = match otp {
        Some(o) => o,
        None => return Err(AppError::Validation("Invalid code".into())),
    };

    if otp.used {
        return Err(AppError::Validation("Code has already been used".into()));
    }
    if !is_valid(&otp, Utc::now()) {
        return Err(AppError::Validation("Code has expired".into()));
    }

    Ok(otp)
}

/// Mark a code as used. Setting `used` twice is harmless.
pub async fn consume<C: ConnectionTrait>(conn: &C, otp: OtpModel) -> AppResult<()> {
    let mut active: OtpActive = otp.into();
    active.used = Set(true);
    active.update(conn).await?;
    Ok(())
}

pub fn is_valid(otp: &OtpModel, now: DateTime<Utc>) -> bool {
    !otp.used && now < otp.expires_at
}

/// Uniform random 6-digit numeric string, zero-padded ("000451" is valid).
/// Collisions across users/purposes are fine; the lookup is keyed by all three.
pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn otp_at(used: bool, expires_at: DateTime<Utc>) -> OtpModel {
        let now = Utc::now();
        OtpModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            code: "123456".into(),
            purpose: OtpPurpose::EmailVerification.as_str().into(),
            used,
            created_at: now.into(),
            expires_at: expires_at.into(),
        }
    }

    #[test]
    fn code_is_six_zero_padded_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()), "bad code {code}");
        }
    }

    #[test]
    fn fresh_code_is_valid() {
        let otp = otp_at(false, Utc::now() + Duration::minutes(10));
        assert!(is_valid(&otp, Utc::now()));
    }

    #[test]
    fn expired_code_is_invalid() {
        let issued = Utc::now();
        let otp = otp_at(false, issued + Duration::minutes(10));
        // 11 minutes after issue the code must be dead.
        assert!(!is_valid(&otp, issued + Duration::minutes(11)));
    }

    #[test]
    fn used_code_is_invalid_even_before_expiry() {
        let otp = otp_at(true, Utc::now() + Duration::minutes(10));
        assert!(!is_valid(&otp, Utc::now()));
    }
}
