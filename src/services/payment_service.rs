use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::payments::ProcessPaymentRequest,
    entity::{
        orders::{ActiveModel as OrderActive, Entity as Orders},
        payments::{
            ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments,
            Model as PaymentModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{OrderStatus, Payment, PaymentMethod, PaymentStatus},
    response::{ApiResponse, Meta},
    services::order_service,
    state::AppState,
};

/// Create and settle a payment for an order. The order row is locked for the
/// duration, so the existence check and the insert are atomic with respect to
/// concurrent attempts on the same order; the unique index on
/// `payments.order_id` is the backstop.
pub async fn process_payment(
    state: &AppState,
    user: &AuthUser,
    payload: ProcessPaymentRequest,
) -> AppResult<ApiResponse<Payment>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(payload.order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    // Only the order's customer may pay for it.
    if order.customer_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    if let Some(existing) = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(&txn)
        .await?
    {
        // Answer the retry with the original record instead of charging twice.
        let payment = payment_to_api(existing)?;
        let body = serde_json::to_value(&payment)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        return Err(AppError::AlreadyPaid(body));
    }

    match OrderStatus::parse(&order.status)? {
        OrderStatus::PaymentPending => {}
        OrderStatus::Pending
        | OrderStatus::Paid
        | OrderStatus::Processing
        | OrderStatus::Completed
        | OrderStatus::Cancelled => {
            return Err(AppError::Conflict("Order is not awaiting payment".into()));
        }
    }

    let payment_id = Uuid::new_v4();
    let payment = PaymentActive {
        id: Set(payment_id),
        payment_number: Set(build_payment_number(payment_id)),
        order_id: Set(order.id),
        amount: Set(order.total),
        method: Set(payload.method.as_str().into()),
        status: Set(PaymentStatus::Pending.as_str().into()),
        transaction_ref: NotSet,
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    // Simulated settlement: completes synchronously. A real gateway would
    // leave the payment in `processing` and finish via callback.
    let mut active: PaymentActive = payment.into();
    active.status = Set(PaymentStatus::Completed.as_str().into());
    active.transaction_ref = Set(Some(build_transaction_ref()));
    active.updated_at = Set(Utc::now().into());
    let payment = active.update(&txn).await?;

    let mut order_active: OrderActive = order.into();
    order_active.status = Set(OrderStatus::Paid.as_str().into());
    order_active.updated_at = Set(Utc::now().into());
    order_active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(payment_id = %payment.id, order_id = %payment.order_id, "payment settled");

    Ok(ApiResponse::success(
        "Payment completed",
        payment_to_api(payment)?,
        Some(Meta::empty()),
    ))
}

pub async fn get_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Payment>> {
    let payment = Payments::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let order = Orders::find_by_id(payment.order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    order_service::ensure_order_access(&state.orm, user, &order).await?;

    Ok(ApiResponse::success("OK", payment_to_api(payment)?, None))
}

pub fn payment_to_api(model: PaymentModel) -> AppResult<Payment> {
    Ok(Payment {
        id: model.id,
        payment_number: model.payment_number,
        order_id: model.order_id,
        amount: model.amount,
        method: PaymentMethod::parse(&model.method)?,
        status: PaymentStatus::parse(&model.status)?,
        transaction_ref: model.transaction_ref,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn build_payment_number(payment_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = payment_id.to_string();
    let short = &suffix[..8];
    format!("PAY-{date}-{short}")
}

fn build_transaction_ref() -> String {
    format!("TXN-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_number_shape() {
        let id = Uuid::new_v4();
        let number = build_payment_number(id);
        assert!(number.starts_with("PAY-"));
        assert!(number.ends_with(&id.to_string()[..8]));
    }

    #[test]
    fn transaction_refs_are_unique_and_opaque() {
        let a = build_transaction_ref();
        let b = build_transaction_ref();
        assert!(a.starts_with("TXN-"));
        assert_ne!(a, b);
    }
}
