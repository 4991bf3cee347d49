use geotaste_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        orders::{CreateOrderRequest, OrderItemRequest},
        payments::ProcessPaymentRequest,
    },
    entity::{
        orders::{self, Entity as Orders},
        products::{ActiveModel as ProductActive, Entity as Products},
        store_profiles::ActiveModel as StoreProfileActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{OrderStatus, PaymentMethod, PaymentStatus, Role},
    routes::params::{OrderListQuery, Pagination},
    services::{order_service, payment_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

// Integration flow: customer orders from a store -> totals carry 10% tax ->
// payment settles once and only once.
#[tokio::test]
async fn order_totals_and_single_payment_flow() -> anyhow::Result<()> {
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

    let state = setup_state(&database_url).await?;

    // Unique addresses per run so reruns and parallel suites never collide.
    let run = Uuid::new_v4().simple().to_string();
    let customer_id =
        create_user(&state, &format!("customer+{run}@example.com"), Role::Normal).await?;
    let store_user_id =
        create_user(&state, &format!("store+{run}@example.com"), Role::Store).await?;
    let stranger_id =
        create_user(&state, &format!("stranger+{run}@example.com"), Role::Normal).await?;

    let store = StoreProfileActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(store_user_id),
        store_name: Set("Test Grocer".into()),
        address: Set("1 Test Lane".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    // Prices are integer cents.
    let widget = ProductActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(store.id),
        name: Set("Widget".into()),
        description: Set(None),
        price: Set(500),
        stock: Set(10),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let scarce = ProductActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(store.id),
        name: Set("Scarce Item".into()),
        description: Set(None),
        price: Set(300),
        stock: Set(2),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let customer = AuthUser {
        user_id: customer_id,
        role: Role::Normal,
    };

    let created = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            store_id: store.id,
            items: vec![OrderItemRequest {
                product_id: widget.id,
                quantity: 2,
            }],
            delivery_address: "1 Delivery Way".into(),
            notes: None,
        },
    )
    .await?;
    let created = created.data.expect("order data");
    assert_eq!(created.order.subtotal, 1000);
    assert_eq!(created.order.tax, 100);
    assert_eq!(created.order.total, 1100);
    assert_eq!(created.order.status, OrderStatus::PaymentPending);
    assert_eq!(created.items.len(), 1);
    assert_eq!(created.items[0].price, 500);

    // Stock is only checked at creation, never decremented.
    let widget_after = Products::find_by_id(widget.id)
        .one(&state.orm)
        .await?
        .expect("widget row");
    assert_eq!(widget_after.stock, 10);

    // A failed stock check rolls the whole order back.
    let rejected = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            store_id: store.id,
            items: vec![
                OrderItemRequest {
                    product_id: widget.id,
                    quantity: 1,
                },
                OrderItemRequest {
                    product_id: scarce.id,
                    quantity: 5,
                },
            ],
            delivery_address: "1 Delivery Way".into(),
            notes: None,
        },
    )
    .await;
    assert!(matches!(rejected, Err(AppError::Validation(_))));
    let customer_order_count = Orders::find()
        .filter(orders::Column::CustomerId.eq(customer_id))
        .count(&state.orm)
        .await?;
    assert_eq!(customer_order_count, 1);

    let payment = payment_service::process_payment(
        &state,
        &customer,
        ProcessPaymentRequest {
            order_id: created.order.id,
            method: PaymentMethod::Demo,
        },
    )
    .await?;
    let payment = payment.data.expect("payment data");
    assert_eq!(payment.amount, 1100);
    assert_eq!(payment.status, PaymentStatus::Completed);
    let reference = payment.transaction_ref.as_deref().expect("transaction ref");
    assert!(reference.starts_with("TXN-"));

    let order_after = Orders::find_by_id(created.order.id)
        .one(&state.orm)
        .await?
        .expect("order row");
    assert_eq!(order_after.status, OrderStatus::Paid.as_str());

    // Paying again surfaces the original payment instead of charging twice.
    let retry = payment_service::process_payment(
        &state,
        &customer,
        ProcessPaymentRequest {
            order_id: created.order.id,
            method: PaymentMethod::Card,
        },
    )
    .await;
    match retry {
        Err(AppError::AlreadyPaid(body)) => {
            assert_eq!(
                body.get("payment_number").and_then(|v| v.as_str()),
                Some(payment.payment_number.as_str())
            );
        }
        other => panic!("expected already-paid rejection, got {other:?}"),
    }

    // The owning store may read the payment; an unrelated user may not.
    let store_principal = AuthUser {
        user_id: store_user_id,
        role: Role::Store,
    };
    payment_service::get_payment(&state, &store_principal, payment.id).await?;

    let stranger = AuthUser {
        user_id: stranger_id,
        role: Role::Normal,
    };
    let denied = payment_service::get_payment(&state, &stranger, payment.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    // Both sides of the order see it in their listings.
    let query = OrderListQuery {
        pagination: Pagination {
            page: None,
            per_page: None,
        },
        status: None,
        sort_order: None,
    };
    let customer_orders = order_service::list_orders(&state, &customer, query).await?;
    assert_eq!(customer_orders.data.expect("customer orders").items.len(), 1);

    let query = OrderListQuery {
        pagination: Pagination {
            page: None,
            per_page: None,
        },
        status: None,
        sort_order: None,
    };
    let store_orders = order_service::list_orders(&state, &store_principal, query).await?;
    assert_eq!(store_orders.data.expect("store orders").items.len(), 1);

    Ok(())
}

async fn create_user(state: &AppState, email: &str, role: Role) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.into()),
        password_hash: Set("not-a-real-hash".into()),
        role: Set(role.as_str().into()),
        email_verified: Set(true),
        full_name: Set(None),
        phone: Set(None),
        address: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(pool, orm))
}
