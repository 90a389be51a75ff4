use chrono::{DateTime, Utc};
use log::{debug, trace};
use lpg_common::Amount;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType},
    traits::{InsertOrderResult, LedgerError},
};

/// Inserts a new order with status `NEW`.
///
/// If the number is already taken, the existing row is fetched on the same connection and returned as
/// [`InsertOrderResult::AlreadyExists`]. This is not atomic by itself. Embed it in a transaction if you need it to be.
///
/// Every query in this module drains its statement with `fetch_all`. A statement that is dropped half-read keeps the
/// pooled connection's read snapshot open, and later reads on that connection miss newer commits.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<InsertOrderResult, LedgerError> {
    let number = order.number.clone();
    let result = sqlx::query_as::<_, Order>(
        r#"
            INSERT INTO orders (number, user_id, status, uploaded_at, updated_at)
            VALUES ($1, $2, 'NEW', $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order.number)
    .bind(order.user_id)
    .bind(order.uploaded_at)
    .bind(order.uploaded_at)
    .fetch_all(&mut *conn)
    .await
    .and_then(|rows| rows.into_iter().next().ok_or(sqlx::Error::RowNotFound));
    match result {
        Ok(order) => {
            debug!("🗃️ Order [{}] inserted with id {} for user #{}", order.number, order.id, order.user_id);
            Ok(InsertOrderResult::Inserted(order))
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            trace!("🗃️ Order [{number}] already exists. Fetching the existing record");
            let existing = fetch_order_by_number(&number, conn).await?.ok_or(LedgerError::OrderNotFound(number))?;
            Ok(InsertOrderResult::AlreadyExists(existing))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let orders: Vec<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number).fetch_all(conn).await?;
    Ok(orders.into_iter().next())
}

/// Fetches all orders in the given status, ordered by submission time (oldest first).
pub async fn fetch_orders_by_status(
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE status = $1 ORDER BY uploaded_at ASC, id ASC")
        .bind(status)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Fetches all orders for the user, ordered by submission time (oldest first).
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY uploaded_at ASC, id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Sets the status of the order to `status`, but only if its current status is one of `from`.
///
/// Returns the updated order, or `None` if the order does not exist or is not in one of the `from` states.
pub async fn update_status_from(
    number: &OrderNumber,
    from: &[OrderStatusType],
    status: OrderStatusType,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    if from.is_empty() {
        return Ok(None);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET status = ");
    builder.push_bind(status);
    builder.push(", updated_at = ");
    builder.push_bind(at);
    builder.push(" WHERE number = ");
    builder.push_bind(number.clone());
    builder.push(" AND status IN (");
    let mut statuses = builder.separated(", ");
    for s in from {
        statuses.push_bind(*s);
    }
    statuses.push_unseparated(") RETURNING *");
    let order = builder.build_query_as::<Order>().fetch_all(conn).await?.into_iter().next();
    if let Some(o) = &order {
        trace!("🗃️ Order [{}] moved to {}", o.number, o.status);
    }
    Ok(order)
}

/// Marks a pending order as `PROCESSED` and stores its accrual.
///
/// Returns `None` (and changes nothing) if the order is not currently `NEW` or `PROCESSING`.
pub async fn mark_processed(
    number: &OrderNumber,
    accrual: Amount,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let orders: Vec<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET status = 'PROCESSED', accrual = $1, updated_at = $2
            WHERE number = $3 AND status IN ('NEW', 'PROCESSING')
            RETURNING *;
        "#,
    )
    .bind(accrual)
    .bind(at)
    .bind(number)
    .fetch_all(conn)
    .await?;
    Ok(orders.into_iter().next())
}
