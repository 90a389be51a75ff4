#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chrono::{TimeZone, Utc};
use loyalty_engine::{
    db_types::{Amount, NewUser, OrderNumber},
    helpers::is_valid_luhn,
    test_utils::{prepare_test_env, random_db_path, MutableClock},
    AccountApi,
    AuthManagement,
    LedgerDatabase,
    OrderFlowApi,
    SqliteDatabase,
    WithdrawalApi,
};
use mockable::Clock;
use sqlx::{migrate::MigrateDatabase, Sqlite};

static NEXT_NUMBER: AtomicU64 = AtomicU64::new(1_000_000);

pub struct TestSystem {
    pub url: String,
    pub db: SqliteDatabase,
    pub clock: Arc<MutableClock>,
}

pub async fn setup() -> TestSystem {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let clock = Arc::new(MutableClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()));
    TestSystem { url, db, clock }
}

impl TestSystem {
    pub fn order_flow(&self) -> OrderFlowApi<SqliteDatabase> {
        OrderFlowApi::new(self.db.clone()).with_clock(self.clock.clone())
    }

    pub fn withdrawals(&self) -> WithdrawalApi<SqliteDatabase> {
        WithdrawalApi::new(self.db.clone()).with_clock(self.clock.clone())
    }

    pub fn accounts(&self) -> AccountApi<SqliteDatabase> {
        AccountApi::new(self.db.clone())
    }

    /// Creates a user directly, skipping password hashing.
    pub async fn create_user(&self, login: &str) -> i64 {
        let user = NewUser { login: login.to_string(), password_hash: "not-a-hash".into(), created_at: Utc::now() };
        self.db.create_user(user).await.expect("Error creating user").id
    }

    /// Gives the user `cents` of balance through a freshly processed order, returning the order number.
    pub async fn fund(&self, user_id: i64, cents: i64) -> OrderNumber {
        let number = next_order_number();
        self.order_flow().submit_order(user_id, &number).await.expect("Error submitting order");
        let number = number.parse::<OrderNumber>().unwrap();
        self.db
            .credit_processed_order(&number, Amount::from_cents(cents), self.clock.utc())
            .await
            .expect("Error crediting order")
            .expect("Order was already settled");
        number
    }

    pub async fn balance(&self, user_id: i64) -> (Amount, Amount) {
        let account = self.accounts().balance(user_id).await.expect("Error fetching balance");
        (account.current_balance, account.total_withdrawn)
    }

    pub async fn teardown(self) {
        self.db.pool().close().await;
        let _ = Sqlite::drop_database(&self.url).await;
    }
}

/// Appends the Luhn check digit to `prefix`.
pub fn luhn_number(prefix: u64) -> String {
    (0..10)
        .map(|d| format!("{prefix}{d}"))
        .find(|n| is_valid_luhn(n))
        .expect("one check digit always works")
}

/// A valid order number that no other test in this process has used.
pub fn next_order_number() -> String {
    luhn_number(NEXT_NUMBER.fetch_add(1, Ordering::Relaxed))
}
