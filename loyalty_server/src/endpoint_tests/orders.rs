use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use loyalty_engine::{
    db_types::{Amount, OrderStatusType},
    traits::InsertOrderResult,
    AccountApi,
    OrderFlowApi,
};

use super::{
    helpers::{bearer, issue_token, order, send},
    mocks::MockLedger,
};
use crate::routes::{MyOrdersRoute, SubmitOrderRoute};

fn configure(ledger: MockLedger, accounts: MockLedger) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(ledger)))
            .app_data(web::Data::new(AccountApi::new(accounts)))
            .service(
                web::scope("/api/user")
                    .service(SubmitOrderRoute::<MockLedger>::new())
                    .service(MyOrdersRoute::<MockLedger>::new()),
            );
    }
}

fn submit(number: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/user/orders")
        .insert_header(bearer(1, "alice"))
        .insert_header(("Content-Type", "text/plain"))
        .set_payload(number.to_string())
}

#[actix_web::test]
async fn submitting_without_a_token_is_unauthorized() {
    let req = TestRequest::post().uri("/api/user/orders").set_payload("79927398713");
    let res = send(req, configure(MockLedger::new(), MockLedger::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.body.contains("No access token was provided"), "was: {}", res.body);
}

#[actix_web::test]
async fn tampered_tokens_are_unauthorized() {
    let mut token = issue_token(1, "alice");
    token.replace_range(token.len() - 10..token.len() - 5, "AAAAA");
    let req = TestRequest::get().uri("/api/user/orders").insert_header(("Authorization", format!("Bearer {token}")));
    let res = send(req, configure(MockLedger::new(), MockLedger::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn new_order_is_accepted() {
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_order_by_number().times(1).returning(|_| Ok(None));
    ledger.expect_insert_order().times(1).returning(|o| {
        assert_eq!(o.user_id, 1);
        assert_eq!(o.number.as_str(), "79927398713");
        Ok(InsertOrderResult::Inserted(order(1, "79927398713", OrderStatusType::New, None, 1)))
    });
    let res = send(submit("79927398713\n"), configure(ledger, MockLedger::new())).await;
    assert_eq!(res.status, StatusCode::ACCEPTED);
    assert_eq!(res.body, r#"{"number":"79927398713","status":"NEW","uploaded_at":"2024-06-01T12:00:00Z"}"#);
}

#[actix_web::test]
async fn resubmitting_own_order_is_ok() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_fetch_order_by_number()
        .returning(|_| Ok(Some(order(1, "79927398713", OrderStatusType::Processing, None, 1))));
    ledger.expect_insert_order().times(0);
    let res = send(submit("79927398713"), configure(ledger, MockLedger::new())).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn another_users_order_is_a_conflict() {
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_order_by_number().returning(|_| {
        let mut o = order(1, "79927398713", OrderStatusType::New, None, 1);
        o.user_id = 2;
        Ok(Some(o))
    });
    let res = send(submit("79927398713"), configure(ledger, MockLedger::new())).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert!(res.body.contains("already been submitted by another user"), "was: {}", res.body);
}

#[actix_web::test]
async fn invalid_numbers_are_rejected_before_the_database() {
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_order_by_number().times(0);
    ledger.expect_insert_order().times(0);
    let res = send(submit("79927398710"), configure(ledger, MockLedger::new())).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut ledger = MockLedger::new();
    ledger.expect_fetch_order_by_number().times(0);
    let res = send(submit("not a number"), configure(ledger, MockLedger::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body.starts_with(r#"{"error":"#), "was: {}", res.body);
}

#[actix_web::test]
async fn my_orders_are_listed() {
    let mut accounts = MockLedger::new();
    accounts.expect_fetch_orders_for_user().withf(|id| *id == 1).returning(|_| {
        Ok(vec![
            order(1, "79927398713", OrderStatusType::Processed, Some(Amount::from_units(500)), 1),
            order(2, "12345678903", OrderStatusType::Processing, None, 2),
            order(3, "92789234702", OrderStatusType::Invalid, None, 3),
        ])
    });
    let req = TestRequest::get().uri("/api/user/orders").insert_header(bearer(1, "alice"));
    let res = send(req, configure(MockLedger::new(), accounts)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, ORDERS_JSON);
}

#[actix_web::test]
async fn no_orders_is_no_content() {
    let mut accounts = MockLedger::new();
    accounts.expect_fetch_orders_for_user().returning(|_| Ok(vec![]));
    let cookie = format!("token={}", issue_token(1, "alice"));
    let req = TestRequest::get().uri("/api/user/orders").insert_header(("Cookie", cookie));
    let res = send(req, configure(MockLedger::new(), accounts)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_empty());
}

const ORDERS_JSON: &str = r#"[{"number":"79927398713","status":"PROCESSED","accrual":500,"uploaded_at":"2024-06-01T12:00:00Z"},{"number":"12345678903","status":"PROCESSING","uploaded_at":"2024-06-02T12:00:00Z"},{"number":"92789234702","status":"INVALID","uploaded_at":"2024-06-03T12:00:00Z"}]"#;
