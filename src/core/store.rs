//! Store business logic - Product catalogue and JestCoin checkout.
//!
//! [`checkout`] writes the order, its lines, the stock decrements and the wallet debit in
//! one database transaction. Stock and balance are both decremented with guarded
//! `UPDATE`s, so concurrent buyers can neither oversell a product nor overdraw a wallet.

use crate::{
    config::database::retry_on_busy,
    core::{
        activity, report,
        wallet::{self, NewEntry},
    },
    entities::{Order, OrderItem, Product, TransactionKind, order, order_item, product},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
    prelude::*,
    sea_query::Expr,
};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Retrieves all active (non-deleted) products, ordered alphabetically by name.
pub async fn get_all_active_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::IsDeleted.eq(false))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an active product by name, returning `None` if not found or deleted.
pub async fn get_product_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Name.eq(name.trim()))
        .filter(product::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by ID, including deleted ones.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }
    Ok(name.to_string())
}

fn validate_price(price: i64) -> Result<i64> {
    if price < 0 {
        return Err(Error::InvalidAmount { amount: price });
    }
    Ok(price)
}

fn validate_stock(stock: Option<i32>) -> Result<Option<i32>> {
    if stock.is_some_and(|s| s < 0) {
        return Err(Error::validation("Stock cannot be negative"));
    }
    Ok(stock)
}

fn map_duplicate_name(err: DbErr, name: &str) -> Error {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        Error::validation(format!("A product named '{name}' already exists"))
    } else {
        err.into()
    }
}

/// Creates a product. `stock` of `None` means unlimited.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only, or already used
/// - The price is negative
/// - The stock is negative
pub async fn create_product(
    db: &DatabaseConnection,
    name: &str,
    description: Option<String>,
    price: i64,
    stock: Option<i32>,
) -> Result<product::Model> {
    let name = validate_name(name)?;
    let price = validate_price(price)?;
    let stock = validate_stock(stock)?;

    let now = Utc::now();
    let product = product::ActiveModel {
        name: Set(name.clone()),
        description: Set(description.filter(|d| !d.trim().is_empty())),
        price: Set(price),
        stock: Set(stock),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = product
        .insert(db)
        .await
        .map_err(|err| map_duplicate_name(err, &name))?;

    info!(product_id = created.id, name = %created.name, price, "Created product");
    Ok(created)
}

/// Changes to apply to a product. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    /// New unique name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New unit price in minor units
    pub price: Option<i64>,
    /// `Some(None)` makes the product unlimited
    pub stock: Option<Option<i32>>,
}

async fn find_active(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| Error::ProductNotFound {
            name: product_id.to_string(),
        })
}

/// Updates an active product.
///
/// # Errors
/// Returns an error if a new value is invalid or the product does not exist or is
/// deleted.
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    changes: ProductUpdate,
) -> Result<product::Model> {
    let name = changes.name.as_deref().map(validate_name).transpose()?;
    let price = changes.price.map(validate_price).transpose()?;
    let stock = changes.stock.map(validate_stock).transpose()?;

    let mut product: product::ActiveModel = find_active(db, product_id).await?.into();

    if let Some(name) = &name {
        product.name = Set(name.clone());
    }
    if let Some(description) = changes.description {
        let description = description.trim().to_string();
        product.description = Set((!description.is_empty()).then_some(description));
    }
    if let Some(price) = price {
        product.price = Set(price);
    }
    if let Some(stock) = stock {
        product.stock = Set(stock);
    }
    product.updated_at = Set(Utc::now());

    product
        .update(db)
        .await
        .map_err(|err| map_duplicate_name(err, name.as_deref().unwrap_or_default()))
}

/// Soft deletes a product, preserving order history.
///
/// # Errors
/// Returns an error if the product does not exist or is already deleted.
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let mut product: product::ActiveModel = find_active(db, product_id).await?.into();

    product.is_deleted = Set(true);
    product.updated_at = Set(Utc::now());

    let deleted = product.update(db).await?;
    info!(product_id, "Deleted product");
    Ok(deleted)
}

/// One line of a checkout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItem {
    /// Product to buy
    pub product_id: i64,
    /// Units to buy, at least 1
    pub quantity: i32,
}

/// Result of a checkout.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    /// The placed (or replayed) order
    pub order: order::Model,
    /// Its lines, one per product
    pub items: Vec<order_item::Model>,
    /// Wallet balance after the debit
    pub new_balance: i64,
    /// `true` when the idempotency key had already been used and nothing was charged
    pub replayed: bool,
}

/// Buys `items` with the user's JestCoins.
///
/// Everything is validated before the first write: quantities must be positive,
/// products active and in stock, and the wallet must cover the total. Any failure
/// leaves the wallet, the stock and the order tables untouched. Repeating a checkout
/// with the same `idempotency_key` returns the original order.
#[instrument(skip(db, items))]
pub async fn checkout(
    db: &DatabaseConnection,
    user_id: &str,
    items: &[CartItem],
    idempotency_key: Option<String>,
) -> Result<CheckoutReceipt> {
    if items.is_empty() {
        return Err(Error::validation("Your cart is empty"));
    }

    // Merge repeated products into one line each
    let mut quantities: BTreeMap<i64, i32> = BTreeMap::new();
    for item in items {
        if item.quantity <= 0 {
            return Err(Error::validation("Quantities must be at least 1"));
        }
        let quantity = quantities.entry(item.product_id).or_insert(0);
        *quantity = quantity
            .checked_add(item.quantity)
            .ok_or_else(|| Error::validation("Quantity is too large"))?;
    }

    let quantities = &quantities;
    let idempotency_key = idempotency_key.as_deref();
    retry_on_busy(move || checkout_once(db, user_id, quantities, idempotency_key)).await
}

async fn checkout_once(
    db: &DatabaseConnection,
    user_id: &str,
    quantities: &BTreeMap<i64, i32>,
    idempotency_key: Option<&str>,
) -> Result<CheckoutReceipt> {
    let txn = db.begin().await?;

    if let Some(key) = idempotency_key {
        if let Some(existing) = find_order_by_key(&txn, key).await? {
            let receipt = replay(&txn, user_id, existing).await?;
            txn.commit().await?;
            return Ok(receipt);
        }
    }

    match place_order(&txn, user_id, quantities, idempotency_key.map(str::to_string)).await {
        Ok(receipt) => {
            txn.commit().await?;
            info!(
                order_id = receipt.order.id,
                total = receipt.order.total,
                "Checkout completed"
            );
            Ok(receipt)
        }
        Err(Error::Database(err))
            if idempotency_key.is_some()
                && matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
        {
            // A concurrent retry with the same key committed first
            txn.rollback().await?;
            let key = idempotency_key.unwrap_or_default();
            let existing = find_order_by_key(db, key)
                .await?
                .ok_or(Error::Database(err))?;
            let replay_txn = db.begin().await?;
            let receipt = replay(&replay_txn, user_id, existing).await?;
            replay_txn.commit().await?;
            Ok(receipt)
        }
        Err(err) => Err(err),
    }
}

async fn find_order_by_key<C>(db: &C, key: &str) -> Result<Option<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::IdempotencyKey.eq(key))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn replay(
    txn: &DatabaseTransaction,
    user_id: &str,
    existing: order::Model,
) -> Result<CheckoutReceipt> {
    if existing.user_id != user_id {
        return Err(Error::validation("Idempotency key already used"));
    }

    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(existing.id))
        .all(txn)
        .await?;
    let new_balance = wallet::get_or_create_wallet(txn, user_id).await?.balance;
    info!(order_id = existing.id, "Replaying checkout for reused idempotency key");

    Ok(CheckoutReceipt {
        order: existing,
        items,
        new_balance,
        replayed: true,
    })
}

async fn place_order(
    txn: &DatabaseTransaction,
    user_id: &str,
    quantities: &BTreeMap<i64, i32>,
    idempotency_key: Option<String>,
) -> Result<CheckoutReceipt> {
    let mut lines = Vec::with_capacity(quantities.len());
    let mut total: i64 = 0;

    for (&product_id, &quantity) in quantities {
        let product = Product::find_by_id(product_id)
            .one(txn)
            .await?
            .filter(|p| !p.is_deleted)
            .ok_or_else(|| Error::ProductNotFound {
                name: product_id.to_string(),
            })?;

        if let Some(available) = product.stock {
            if available < quantity {
                return Err(Error::OutOfStock {
                    name: product.name,
                    available,
                });
            }
        }

        let line_total = product
            .price
            .checked_mul(i64::from(quantity))
            .ok_or_else(|| Error::validation("Order total is too large"))?;
        total = total
            .checked_add(line_total)
            .ok_or_else(|| Error::validation("Order total is too large"))?;
        lines.push((product, quantity));
    }

    let wallet = wallet::get_or_create_wallet(txn, user_id).await?;
    if wallet.balance < total {
        return Err(Error::InsufficientFunds {
            current: wallet.balance,
            required: total,
        });
    }

    let new_order = order::ActiveModel {
        user_id: Set(user_id.to_string()),
        total: Set(total),
        idempotency_key: Set(idempotency_key),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let order = new_order.insert(txn).await?;

    let mut items = Vec::with_capacity(lines.len());
    for (product, quantity) in lines {
        if product.stock.is_some() {
            decrement_stock(txn, &product, quantity).await?;
        }

        let line = order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(product.id),
            quantity: Set(quantity),
            unit_price: Set(product.price),
            ..Default::default()
        };
        items.push(line.insert(txn).await?);
    }

    if total > 0 {
        let entry = NewEntry::new(TransactionKind::Purchase, total)
            .with_reference(format!("order:{}", order.id))
            .with_description(Some(format!("Order #{}", order.id)));
        wallet::apply_entry(txn, &wallet, entry).await?;
    }

    activity::log_activity(
        txn,
        user_id,
        "store.checkout",
        Some(format!("order #{} {}", order.id, report::format_coins(total))),
    )
    .await?;

    let new_balance = wallet::refresh_wallet(txn, &wallet).await?.balance;
    Ok(CheckoutReceipt {
        order,
        items,
        new_balance,
        replayed: false,
    })
}

async fn decrement_stock(
    txn: &DatabaseTransaction,
    product: &product::Model,
    quantity: i32,
) -> Result<()> {
    // Guarded decrement: matches no row when another checkout took the last units
    let update = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .filter(product::Column::Id.eq(product.id))
        .filter(product::Column::Stock.gte(quantity))
        .exec(txn)
        .await?;

    if update.rows_affected == 0 {
        let available = Product::find_by_id(product.id)
            .one(txn)
            .await?
            .and_then(|p| p.stock)
            .unwrap_or(0);
        warn!(product_id = product.id, available, "Stock ran out during checkout");
        return Err(Error::OutOfStock {
            name: product.name.clone(),
            available,
        });
    }
    Ok(())
}

/// Orders of a user, newest first.
pub async fn get_orders_for_user(
    db: &DatabaseConnection,
    user_id: &str,
    limit: u64,
) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lines of an order with the product each refers to.
pub async fn get_order_items(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Vec<(order_item::Model, Option<product::Model>)>> {
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .find_also_related(Product)
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of orders and their summed totals.
pub async fn sales_summary(db: &DatabaseConnection) -> Result<(u64, i64)> {
    let count = Order::find().count(db).await?;
    let revenue: Option<Option<i64>> = Order::find()
        .select_only()
        .column_as(order::Column::Total.sum(), "revenue")
        .into_tuple()
        .one(db)
        .await?;
    Ok((count, revenue.flatten().unwrap_or(0)))
}
