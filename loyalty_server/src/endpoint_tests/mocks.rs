use chrono::{DateTime, Utc};
use loyalty_engine::{
    db_types::{
        Amount,
        NewOrder,
        NewUser,
        NewWithdrawal,
        Order,
        OrderNumber,
        OrderStatusType,
        UserAccount,
        UserCredentials,
        Withdrawal,
    },
    traits::{
        AccountApiError,
        AccountManagement,
        AuthApiError,
        AuthManagement,
        InsertOrderResult,
        LedgerDatabase,
        LedgerError,
    },
};
use mockall::mock;

mock! {
    pub Ledger {}
    impl LedgerDatabase for Ledger {
        fn url(&self) -> &str;
        async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError>;
        async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, LedgerError>;
        async fn fetch_orders_by_status(&self, status: OrderStatusType) -> Result<Vec<Order>, LedgerError>;
        async fn update_order_status(&self, number: &OrderNumber, status: OrderStatusType, at: DateTime<Utc>) -> Result<Option<Order>, LedgerError>;
        async fn credit_processed_order(&self, number: &OrderNumber, accrual: Amount, at: DateTime<Utc>) -> Result<Option<Order>, LedgerError>;
        async fn debit_for_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;
    }
    impl AccountManagement for Ledger {
        async fn fetch_user_account(&self, user_id: i64) -> Result<Option<UserAccount>, AccountApiError>;
        async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, AccountApiError>;
        async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError>;
    }
}

mock! {
    pub AuthManager {}
    impl AuthManagement for AuthManager {
        async fn create_user(&self, user: NewUser) -> Result<UserAccount, AuthApiError>;
        async fn fetch_credentials(&self, login: &str) -> Result<Option<UserCredentials>, AuthApiError>;
    }
}
