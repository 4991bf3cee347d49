use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::PaymentMethod;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessPaymentRequest {
    pub order_id: Uuid,
    pub method: PaymentMethod,
}
