use chrono::{DateTime, Utc};
use log::trace;
use lpg_common::Amount;
use sqlx::SqliteConnection;

use crate::db_types::UserAccount;

const USER_ACCOUNT_COLUMNS: &str = "id, login, current_balance, total_withdrawn, created_at, updated_at";

pub async fn user_account_by_id(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let q = format!("SELECT {USER_ACCOUNT_COLUMNS} FROM users WHERE id = $1");
    let accounts: Vec<UserAccount> = sqlx::query_as(&q).bind(user_id).fetch_all(conn).await?;
    Ok(accounts.into_iter().next())
}

/// Adds `amount` to the user's current balance. The increment happens in the database, so concurrent credits and
/// debits do not lose updates. Returns `false` if the user does not exist.
pub async fn credit_balance(
    user_id: i64,
    amount: Amount,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET current_balance = current_balance + $1, updated_at = $2 WHERE id = $3",
    )
    .bind(amount)
    .bind(at)
    .bind(user_id)
    .execute(conn)
    .await?;
    trace!("🗃️ Credited {amount} to user #{user_id}. {} rows affected", result.rows_affected());
    Ok(result.rows_affected() == 1)
}

/// Moves `amount` from the user's current balance to their withdrawn total, provided the balance covers it.
///
/// The balance check is part of the `UPDATE` statement itself, so two concurrent debits can never both pass it on
/// the same funds. Returns `false` if nothing was debited (the user does not exist, or has insufficient funds).
pub async fn debit_balance(
    user_id: i64,
    amount: Amount,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE users SET
                current_balance = current_balance - $1,
                total_withdrawn = total_withdrawn + $2,
                updated_at = $3
            WHERE id = $4 AND current_balance >= $5
        "#,
    )
    .bind(amount)
    .bind(amount)
    .bind(at)
    .bind(user_id)
    .bind(amount)
    .execute(conn)
    .await?;
    trace!("🗃️ Debit of {amount} from user #{user_id}. {} rows affected", result.rows_affected());
    Ok(result.rows_affected() == 1)
}
