use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewWithdrawal, Withdrawal};

/// Records a withdrawal. This does not touch the user's balance. Use it inside the same transaction as
/// [`super::user_accounts::debit_balance`].
pub async fn insert_withdrawal(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, sqlx::Error> {
    let withdrawal = sqlx::query_as::<_, Withdrawal>(
        r#"
            INSERT INTO withdrawals (user_id, reference, amount, processed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(withdrawal.user_id)
    .bind(withdrawal.reference)
    .bind(withdrawal.amount)
    .bind(withdrawal.processed_at)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    debug!("🗃️ Withdrawal #{} of {} recorded for user #{}", withdrawal.id, withdrawal.amount, withdrawal.user_id);
    Ok(withdrawal)
}

/// All withdrawals for the user, oldest first.
pub async fn fetch_withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals =
        sqlx::query_as("SELECT * FROM withdrawals WHERE user_id = $1 ORDER BY processed_at ASC, id ASC")
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(withdrawals)
}
