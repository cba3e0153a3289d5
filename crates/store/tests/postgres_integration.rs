//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use domain::{
    Address, Money, Notification, NotificationKind, Order, OrderItem, PaymentMethod,
    PaymentResult, PricingPolicy, Product, ProductId, UserId,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    NotificationStore, OrderStore, PostgresStore, ProductStore, StockUpdate, StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_store_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE products, orders, notifications")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn address() -> Address {
    Address {
        address: "1 Timber Lane".into(),
        city: "Portland".into(),
        postal_code: "97201".into(),
        state: "OR".into(),
        country: "US".into(),
    }
}

fn order_for(user: UserId) -> Order {
    let items = vec![OrderItem::new("DESK-1", "Walnut Desk", 2, Money::from_dollars(250))];
    let totals = PricingPolicy::default().totals(Money::from_dollars(500), Money::zero());
    Order::place(
        user,
        items,
        address(),
        Some(address()),
        PaymentMethod::OnlinePayment,
        totals,
    )
    .unwrap()
}

#[tokio::test]
#[serial]
async fn test_product_round_trip() {
    let store = get_test_store().await;
    let desk = Product::new("DESK-1", "Walnut Desk", Money::from_cents(25_050), 7);

    store.save_product(&desk).await.unwrap();

    let loaded = store
        .find_product(&ProductId::new("DESK-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.name, "Walnut Desk");
    assert_eq!(loaded.price, Money::from_cents(25_050));
    assert_eq!(loaded.stock, 7);
    assert_eq!(store.count_products().await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn test_conditional_decrement() {
    let store = get_test_store().await;
    let id = ProductId::new("DESK-1");
    store
        .save_product(&Product::new("DESK-1", "Walnut Desk", Money::from_dollars(250), 3))
        .await
        .unwrap();

    let applied = store.decrement_stock(&id, 2).await.unwrap();
    assert!(matches!(applied, StockUpdate::Applied(ref p) if p.stock == 1));

    let refused = store.decrement_stock(&id, 2).await.unwrap();
    assert_eq!(refused, StockUpdate::Insufficient { available: 1 });

    let missing = store
        .decrement_stock(&ProductId::new("NOPE"), 1)
        .await
        .unwrap();
    assert_eq!(missing, StockUpdate::NotFound);

    let restored = store.increment_stock(&id, 2).await.unwrap().unwrap();
    assert_eq!(restored.stock, 3);
}

#[tokio::test]
#[serial]
async fn test_increment_refuses_stock_overflow() {
    let store = get_test_store().await;
    let id = ProductId::new("DESK-1");
    store
        .save_product(&Product::new(
            "DESK-1",
            "Walnut Desk",
            Money::from_dollars(250),
            u32::MAX - 1,
        ))
        .await
        .unwrap();

    let result = store.increment_stock(&id, 2).await;
    assert!(matches!(result, Err(StoreError::StockOverflow(ref p)) if *p == id));

    let product = store.find_product(&id).await.unwrap().unwrap();
    assert_eq!(product.stock, u32::MAX - 1);

    let topped_up = store.increment_stock(&id, 1).await.unwrap().unwrap();
    assert_eq!(topped_up.stock, u32::MAX);

    let missing = store
        .increment_stock(&ProductId::new("NOPE"), 1)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[serial]
async fn test_save_product_keeps_existing_stock() {
    let store = get_test_store().await;
    let id = ProductId::new("DESK-1");
    store
        .save_product(&Product::new("DESK-1", "Walnut Desk", Money::from_dollars(250), 1))
        .await
        .unwrap();
    store.decrement_stock(&id, 1).await.unwrap();

    store
        .save_product(&Product::new(
            "DESK-1",
            "Walnut Desk, oiled",
            Money::from_dollars(275),
            1,
        ))
        .await
        .unwrap();

    let product = store.find_product(&id).await.unwrap().unwrap();
    assert_eq!(product.stock, 0);
    assert_eq!(product.name, "Walnut Desk, oiled");
    assert_eq!(product.price, Money::from_dollars(275));
}

#[tokio::test]
#[serial]
async fn test_concurrent_decrements_never_oversell() {
    let store = get_test_store().await;
    let id = ProductId::new("DESK-1");
    store
        .save_product(&Product::new("DESK-1", "Walnut Desk", Money::from_dollars(250), 5))
        .await
        .unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let store = store.clone();
            let id = id.clone();
            tokio::spawn(async move { store.decrement_stock(&id, 1).await.unwrap() })
        })
        .collect();

    let results = futures_util::future::join_all(handles).await;
    let applied = results
        .into_iter()
        .filter(|r| matches!(r.as_ref().unwrap(), StockUpdate::Applied(_)))
        .count();

    assert_eq!(applied, 5);
    let product = store.find_product(&id).await.unwrap().unwrap();
    assert_eq!(product.stock, 0);
}

#[tokio::test]
#[serial]
async fn test_order_documents() {
    let store = get_test_store().await;
    let user = UserId::new();
    let mut first = order_for(user);
    let second = order_for(user);
    let other = order_for(UserId::new());

    first
        .mark_paid(
            PaymentResult {
                id: "pay_1".into(),
                status: "COMPLETED".into(),
                update_time: chrono::Utc::now(),
            },
            chrono::Utc::now(),
        )
        .unwrap();

    for order in [&first, &second, &other] {
        store.save_order(order).await.unwrap();
    }

    let loaded = store.find_order(first.id()).await.unwrap().unwrap();
    assert_eq!(loaded, first);
    assert!(loaded.is_paid());

    let mine = store.orders_for_user(user).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine[0].created_at() >= mine[1].created_at());

    assert_eq!(store.all_orders().await.unwrap().len(), 3);

    let deleted = store.find_one_and_delete(other.id()).await.unwrap();
    assert_eq!(deleted.map(|o| o.id()), Some(other.id()));
    assert!(store.find_order(other.id()).await.unwrap().is_none());
    assert_eq!(store.count_orders().await.unwrap(), 2);
}

#[tokio::test]
#[serial]
async fn test_order_update_replaces_document() {
    let store = get_test_store().await;
    let mut order = order_for(UserId::new());
    store.save_order(&order).await.unwrap();

    order.ship(chrono::Utc::now()).unwrap();
    store.save_order(&order).await.unwrap();

    let loaded = store.find_order(order.id()).await.unwrap().unwrap();
    assert!(loaded.status().is_shipped());
    assert_eq!(store.count_orders().await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn test_notifications() {
    let store = get_test_store().await;
    let first = Notification::new(NotificationKind::Order, "Order placed");
    store.insert_notification(&first).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = Notification::new(NotificationKind::LowStock, "Desk running low");
    store.insert_notification(&second).await.unwrap();

    let listed = store.list_notifications().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].kind, NotificationKind::LowStock);
    assert_eq!(store.count_unread().await.unwrap(), 2);

    let read = store.mark_notification_read(first.id).await.unwrap().unwrap();
    assert!(read.read);
    assert_eq!(store.count_unread().await.unwrap(), 1);
}
