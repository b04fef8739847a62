//! Raw-SQL seeding helpers for integration tests. Orders are created the way the (out-of-scope) checkout flow
//! would create them: pending, with the platform fee and fee rate already recorded.
use settlement_engine::{db_types::Money, SqliteDatabase};

pub async fn seed_shop(db: &SqliteDatabase, shop_id: &str, owner_id: &str) {
    sqlx::query("INSERT INTO shops (shop_id, owner_id, name) VALUES ($1, $2, $3)")
        .bind(shop_id)
        .bind(owner_id)
        .bind(format!("Shop {shop_id}"))
        .execute(db.pool())
        .await
        .expect("Error seeding shop");
}

pub async fn seed_product(db: &SqliteDatabase, product_id: &str, shop_id: &str, stock: i64) {
    sqlx::query("INSERT INTO products (product_id, shop_id, name, stock, sold) VALUES ($1, $2, $3, $4, 0)")
        .bind(product_id)
        .bind(shop_id)
        .bind(format!("Product {product_id}"))
        .bind(stock)
        .execute(db.pool())
        .await
        .expect("Error seeding product");
}

pub async fn seed_order(db: &SqliteDatabase, order_id: &str, buyer_id: &str, total: i64, fee_bps: i64) {
    seed_sub_order(db, order_id, buyer_id, total, fee_bps, None).await;
}

pub async fn seed_sub_order(
    db: &SqliteDatabase,
    order_id: &str,
    buyer_id: &str,
    total: i64,
    fee_bps: i64,
    parent_order_id: Option<&str>,
) {
    let platform_fee = Money::from(total).basis_points(fee_bps);
    sqlx::query(
        r#"
            INSERT INTO orders (order_id, buyer_id, parent_order_id, total_amount, platform_fee, fee_bps)
            VALUES ($1, $2, $3, $4, $5, $6);
        "#,
    )
    .bind(order_id)
    .bind(buyer_id)
    .bind(parent_order_id)
    .bind(total)
    .bind(platform_fee.value())
    .bind(fee_bps)
    .execute(db.pool())
    .await
    .expect("Error seeding order");
}

pub async fn seed_order_item(
    db: &SqliteDatabase,
    order_id: &str,
    shop_id: &str,
    product_id: &str,
    quantity: i64,
    unit_price: i64,
) {
    sqlx::query("INSERT INTO order_items (order_id, shop_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4, $5)")
        .bind(order_id)
        .bind(shop_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .execute(db.pool())
        .await
        .expect("Error seeding order item");
}

pub async fn seed_cart_item(db: &SqliteDatabase, id: &str, buyer_id: &str, product_id: &str) {
    sqlx::query("INSERT INTO cart_items (id, buyer_id, product_id, quantity) VALUES ($1, $2, $3, 1)")
        .bind(id)
        .bind(buyer_id)
        .bind(product_id)
        .execute(db.pool())
        .await
        .expect("Error seeding cart item");
}

pub async fn seed_order_cart_ref(db: &SqliteDatabase, order_id: &str, cart_item_id: &str) {
    sqlx::query("INSERT INTO order_cart_items (order_id, cart_item_id) VALUES ($1, $2)")
        .bind(order_id)
        .bind(cart_item_id)
        .execute(db.pool())
        .await
        .expect("Error seeding order cart reference");
}
