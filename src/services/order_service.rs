use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderRequest},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::Entity as Products,
        store_profiles::{Column as StoreCol, Entity as StoreProfiles, Model as StoreProfileModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus, Role},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// Tax is 10% of the subtotal, rounded half-up to whole cents.
pub const TAX_RATE_PERCENT: i64 = 10;

pub fn tax_for_subtotal(subtotal: i64) -> i64 {
    (subtotal * TAX_RATE_PERCENT + 50) / 100
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(AppError::Validation("Order has no items".into()));
    }

    // Everything happens in one transaction: if any line fails, the order and
    // the lines written so far roll back together.
    let txn = state.orm.begin().await?;

    let store = StoreProfiles::find_by_id(payload.store_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut priced_lines: Vec<(Uuid, i32, i64)> = Vec::with_capacity(payload.items.len());
    let mut subtotal: i64 = 0;

    for line in &payload.items {
        if line.quantity <= 0 {
            return Err(AppError::Validation("Quantity must be positive".into()));
        }
        let product = Products::find_by_id(line.product_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        if product.store_id != store.id {
            return Err(AppError::Validation(
                "Product does not belong to this store".into(),
            ));
        }
        // Stock is checked but not decremented here; the window between this
        // check and fulfillment is a known gap of the flow.
        if product.stock < line.quantity {
            return Err(AppError::Validation(format!(
                "Insufficient stock for product {}",
                product.id
            )));
        }

        subtotal += product.price * i64::from(line.quantity);
        priced_lines.push((product.id, line.quantity, product.price));
    }

    let tax = tax_for_subtotal(subtotal);
    let total = subtotal + tax;

    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        order_number: Set(build_order_number(order_id)),
        customer_id: Set(user.user_id),
        store_id: Set(store.id),
        status: Set(OrderStatus::Pending.as_str().into()),
        subtotal: Set(subtotal),
        tax: Set(tax),
        total: Set(total),
        delivery_address: Set(payload.delivery_address),
        notes: Set(payload.notes),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(priced_lines.len());
    for (product_id, quantity, price) in priced_lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            price: Set(price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_to_api(item));
    }

    // Lines are priced and stock-checked, so the order moves straight on to
    // awaiting payment.
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::PaymentPending.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, order_number = %order.order_number, "order created");

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: order_to_api(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    condition = match user.role {
        Role::Store => {
            let store = own_store_profile(&state.orm, user.user_id).await?;
            condition.add(OrderCol::StoreId.eq(store.id))
        }
        Role::Normal | Role::Restaurant => {
            condition.add(OrderCol::CustomerId.eq(user.user_id))
        }
        // Admins see every order.
        Role::Admin => condition,
    };
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_to_api)
        .collect::<AppResult<Vec<Order>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items: orders }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_order_access(&state.orm, user, &order).await?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_to_api)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_to_api(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_order_access(&state.orm, user, &order).await?;

    // Status and monetary fields are never client-writable after creation.
    let mut active: OrderActive = order.into();
    if let Some(delivery_address) = payload.delivery_address {
        active.delivery_address = Set(delivery_address);
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(Some(notes));
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Order updated",
        order_to_api(order)?,
        Some(Meta::empty()),
    ))
}

/// An order is visible to its customer, to the owning store's principal and
/// to admins.
pub async fn ensure_order_access<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    order: &OrderModel,
) -> AppResult<()> {
    if order.customer_id == user.user_id {
        return Ok(());
    }
    match user.role {
        Role::Admin => Ok(()),
        Role::Store => {
            let store = own_store_profile(conn, user.user_id).await?;
            if store.id == order.store_id {
                Ok(())
            } else {
                Err(AppError::Forbidden)
            }
        }
        Role::Normal | Role::Restaurant => Err(AppError::Forbidden),
    }
}

pub async fn own_store_profile<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<StoreProfileModel> {
    StoreProfiles::find()
        .filter(StoreCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub fn order_to_api(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        order_number: model.order_number,
        customer_id: model.customer_id,
        store_id: model.store_id,
        status: OrderStatus::parse(&model.status)?,
        subtotal: model.subtotal,
        tax: model.tax,
        total: model.total,
        delivery_address: model.delivery_address,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn order_item_to_api(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn build_order_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.to_string();
    let short = &suffix[..8];
    format!("ORD-{date}-{short}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_is_ten_percent_rounded_half_up() {
        assert_eq!(tax_for_subtotal(1000), 100); // 10.00 -> 1.00
        assert_eq!(tax_for_subtotal(995), 100); // 99.5c rounds up
        assert_eq!(tax_for_subtotal(994), 99); // 99.4c rounds down
        assert_eq!(tax_for_subtotal(0), 0);
    }

    #[test]
    fn integer_tax_matches_decimal_rounding() {
        for subtotal in [1_i64, 5, 99, 994, 995, 1000, 12345, 999_999] {
            let expected = (subtotal as f64 * 0.10).round() as i64;
            assert_eq!(tax_for_subtotal(subtotal), expected, "subtotal {subtotal}");
        }
    }

    #[test]
    fn order_number_shape() {
        let id = Uuid::new_v4();
        let number = build_order_number(id);
        assert!(number.starts_with("ORD-"));
        assert!(number.ends_with(&id.to_string()[..8]));
    }
}
