use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use loyalty_engine::{
    db_types::{Amount, Withdrawal},
    traits::LedgerError,
    AccountApi,
    WithdrawalApi,
};

use super::{
    helpers::{account, bearer, send, withdrawal},
    mocks::MockLedger,
};
use crate::routes::{BalanceRoute, MyWithdrawalsRoute, WithdrawAliasRoute, WithdrawRoute};

fn configure(ledger: MockLedger, accounts: MockLedger) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(WithdrawalApi::new(ledger)))
            .app_data(web::Data::new(AccountApi::new(accounts)))
            .service(
                web::scope("/api/user")
                    .service(BalanceRoute::<MockLedger>::new())
                    .service(WithdrawRoute::<MockLedger>::new())
                    .service(WithdrawAliasRoute::<MockLedger>::new())
                    .service(MyWithdrawalsRoute::<MockLedger>::new()),
            );
    }
}

fn withdraw(path: &str, body: &str) -> TestRequest {
    TestRequest::post()
        .uri(path)
        .insert_header(bearer(1, "alice"))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string())
}

/// A ledger holding `cents` that accepts any debit it can cover.
fn funded_ledger(cents: i64) -> MockLedger {
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_user_account().returning(move |_| Ok(Some(account(Amount::from_cents(cents), Amount::zero()))));
    ledger.expect_debit_for_withdrawal().returning(|w| {
        Ok(Withdrawal { id: 7, user_id: w.user_id, reference: w.reference, amount: w.amount, processed_at: w.processed_at })
    });
    ledger
}

#[actix_web::test]
async fn balance() {
    let mut accounts = MockLedger::new();
    accounts
        .expect_fetch_user_account()
        .withf(|id| *id == 1)
        .returning(|_| Ok(Some(account(Amount::from_cents(50050), Amount::from_units(42)))));
    let req = TestRequest::get().uri("/api/user/balance").insert_header(bearer(1, "alice"));
    let res = send(req, configure(MockLedger::new(), accounts)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, r#"{"current":500.5,"withdrawn":42}"#);
}

#[actix_web::test]
async fn balance_requires_a_session() {
    let req = TestRequest::get().uri("/api/user/balance");
    let res = send(req, configure(MockLedger::new(), MockLedger::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn successful_withdrawal() {
    let body = r#"{"order":"2377225624","sum":751}"#;
    let res = send(withdraw("/api/user/balance/withdraw", body), configure(funded_ledger(100000), MockLedger::new())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains(r#""order":"2377225624","sum":751"#), "was: {}", res.body);
}

#[actix_web::test]
async fn withdrawal_alias_route() {
    let body = r#"{"order":"2377225624","sum":0.5}"#;
    let res = send(withdraw("/api/user/withdraw", body), configure(funded_ledger(100), MockLedger::new())).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn insufficient_funds() {
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_user_account().returning(|_| Ok(Some(account(Amount::from_units(700), Amount::zero()))));
    ledger.expect_debit_for_withdrawal().times(0);
    let body = r#"{"order":"2377225624","sum":751}"#;
    let res = send(withdraw("/api/user/balance/withdraw", body), configure(ledger, MockLedger::new())).await;
    assert_eq!(res.status, StatusCode::PAYMENT_REQUIRED);
    assert!(res.body.contains("Insufficient funds"), "was: {}", res.body);
}

#[actix_web::test]
async fn losing_a_race_for_the_balance_is_insufficient_funds() {
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_user_account().returning(|_| Ok(Some(account(Amount::from_units(800), Amount::zero()))));
    ledger.expect_debit_for_withdrawal().returning(|w| {
        Err(LedgerError::InsufficientFunds { requested: w.amount, available: Amount::from_units(10) })
    });
    let body = r#"{"order":"2377225624","sum":751}"#;
    let res = send(withdraw("/api/user/balance/withdraw", body), configure(ledger, MockLedger::new())).await;
    assert_eq!(res.status, StatusCode::PAYMENT_REQUIRED);
}

#[actix_web::test]
async fn invalid_withdrawals() {
    let cases = [
        (r#"{"order":"2377225623","sum":1}"#, StatusCode::UNPROCESSABLE_ENTITY),
        (r#"{"order":"2377225624","sum":0}"#, StatusCode::BAD_REQUEST),
        (r#"{"order":"2377225624","sum":-5}"#, StatusCode::BAD_REQUEST),
        (r#"{"order":"2377225624"}"#, StatusCode::BAD_REQUEST),
        (r#"not json"#, StatusCode::BAD_REQUEST),
    ];
    for (body, expected) in cases {
        let mut ledger = MockLedger::new();
        ledger.expect_debit_for_withdrawal().times(0);
        ledger.expect_fetch_user_account().times(0);
        let res = send(withdraw("/api/user/balance/withdraw", body), configure(ledger, MockLedger::new())).await;
        assert_eq!(res.status, expected, "body: {body}");
        assert!(res.body.starts_with(r#"{"error":"#), "was: {}", res.body);
    }
}

#[actix_web::test]
async fn withdrawals_are_listed() {
    let mut accounts = MockLedger::new();
    accounts.expect_fetch_withdrawals_for_user().returning(|_| {
        Ok(vec![
            withdrawal(1, "2377225624", Amount::from_units(500), 1),
            withdrawal(2, "79927398713", Amount::from_cents(1234), 2),
        ])
    });
    let req = TestRequest::get().uri("/api/user/withdrawals").insert_header(bearer(1, "alice"));
    let res = send(req, configure(MockLedger::new(), accounts)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body,
        r#"[{"order":"2377225624","sum":500,"processed_at":"2024-06-01T15:00:00Z"},{"order":"79927398713","sum":12.34,"processed_at":"2024-06-02T15:00:00Z"}]"#
    );
}

#[actix_web::test]
async fn no_withdrawals_is_no_content() {
    let mut accounts = MockLedger::new();
    accounts.expect_fetch_withdrawals_for_user().returning(|_| Ok(vec![]));
    let req = TestRequest::get().uri("/api/user/withdrawals").insert_header(bearer(1, "alice"));
    let res = send(req, configure(MockLedger::new(), accounts)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}
