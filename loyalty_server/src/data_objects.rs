use chrono::{DateTime, SecondsFormat, Utc};
use loyalty_engine::db_types::{Amount, Order, OrderStatusType, UserAccount, Withdrawal};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: i64,
    pub login: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// The reference number the points are spent against.
    pub order: String,
    pub sum: Amount,
}

/// An order as shown to its owner.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub number: String,
    pub status: OrderStatusType,
    /// Only present once the order has been processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Amount>,
    #[serde(serialize_with = "rfc3339")]
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let accrual = match order.status {
            OrderStatusType::Processed => order.accrual,
            _ => None,
        };
        Self { number: order.number.to_string(), status: order.status, accrual, uploaded_at: order.uploaded_at }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub current: Amount,
    pub withdrawn: Amount,
}

impl From<UserAccount> for BalanceResponse {
    fn from(account: UserAccount) -> Self {
        Self { current: account.current_balance, withdrawn: account.total_withdrawn }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalResponse {
    pub order: String,
    pub sum: Amount,
    #[serde(serialize_with = "rfc3339")]
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResponse {
    fn from(w: Withdrawal) -> Self {
        Self { order: w.reference.to_string(), sum: w.amount, processed_at: w.processed_at }
    }
}

fn rfc3339<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
}
