use cucumber::{then, when};
use loyalty_engine::{
    accrual::ResolverError,
    db_types::{AccrualReport, Amount, OrderNumber, OrderStatusType},
    LedgerDatabase,
    OrderFlowError,
    SubmitOrderResult,
    WithdrawalError,
};

use crate::cucumber::LoyaltyWorld;

fn amount(s: &str) -> Amount {
    s.parse().unwrap_or_else(|e| panic!("Not a valid amount: {s}. {e}"))
}

fn order_number(s: &str) -> OrderNumber {
    s.parse().unwrap_or_else(|e| panic!("Not a valid order number: {s}. {e}"))
}

#[when(expr = "'{word}' submits order {word}")]
async fn submit_order(world: &mut LoyaltyWorld, login: String, number: String) {
    let sys = world.system_mut();
    let user_id = sys.user_id(&login);
    let outcome = match sys.order_flow().submit_order(user_id, &number).await {
        Ok(SubmitOrderResult::Accepted(_)) => "accepted",
        Ok(SubmitOrderResult::AlreadySubmitted(_)) => "already submitted",
        Err(OrderFlowError::OwnedByAnotherUser(_)) => "a conflict",
        Err(OrderFlowError::InvalidOrderNumber(_)) => "invalid",
        Err(e) => panic!("Unexpected error submitting order: {e}"),
    };
    sys.last_outcome = Some(outcome.to_string());
    sys.clock.advance_seconds(1);
}

#[when(expr = "'{word}' withdraws {word} against {word}")]
async fn withdraw(world: &mut LoyaltyWorld, login: String, sum: String, reference: String) {
    let sys = world.system_mut();
    let user_id = sys.user_id(&login);
    let outcome = match sys.withdrawals().withdraw(user_id, &reference, amount(&sum)).await {
        Ok(_) => "accepted",
        Err(WithdrawalError::InsufficientFunds { .. }) => "refused for insufficient funds",
        Err(WithdrawalError::InvalidReference(_)) => "refused for an invalid reference",
        Err(WithdrawalError::InvalidAmount(_)) => "refused for an invalid amount",
        Err(e) => panic!("Unexpected error withdrawing: {e}"),
    };
    sys.last_outcome = Some(outcome.to_string());
    sys.clock.advance_seconds(1);
}

#[when(expr = "the resolver reports order {word} as REGISTERED")]
async fn resolver_registered(world: &mut LoyaltyWorld, number: String) {
    let number = order_number(&number);
    world.system().resolver.push(number.as_str(), Ok(AccrualReport::registered(&number)));
}

#[when(expr = "the resolver reports order {word} as PROCESSING")]
async fn resolver_processing(world: &mut LoyaltyWorld, number: String) {
    let number = order_number(&number);
    world.system().resolver.push(number.as_str(), Ok(AccrualReport::processing(&number)));
}

#[when(expr = "the resolver reports order {word} as INVALID")]
async fn resolver_invalid(world: &mut LoyaltyWorld, number: String) {
    let number = order_number(&number);
    world.system().resolver.push(number.as_str(), Ok(AccrualReport::invalid(&number)));
}

#[when(expr = "the resolver reports order {word} as PROCESSED with {word} points")]
async fn resolver_processed(world: &mut LoyaltyWorld, number: String, accrual: String) {
    let number = order_number(&number);
    world.system().resolver.push(number.as_str(), Ok(AccrualReport::processed(&number, amount(&accrual))));
}

#[when(expr = "the resolver times out for order {word}")]
async fn resolver_timeout(world: &mut LoyaltyWorld, number: String) {
    world.system().resolver.push(&number, Err(ResolverError::Transport("operation timed out".into())));
}

#[when("the reconciler runs")]
async fn reconciler_runs(world: &mut LoyaltyWorld) {
    let sys = world.system();
    let summary = sys.reconciler().run_tick().await;
    log::debug!("🚀️ Tick summary: {summary:?}");
    sys.clock.advance_seconds(1);
}

#[then(expr = "the submission is {}")]
async fn check_submission(world: &mut LoyaltyWorld, expected: String) {
    assert_eq!(world.system().last_outcome.as_deref(), Some(expected.as_str()));
}

#[then(expr = "the withdrawal is {}")]
async fn check_withdrawal(world: &mut LoyaltyWorld, expected: String) {
    assert_eq!(world.system().last_outcome.as_deref(), Some(expected.as_str()));
}

#[then(expr = "order {word} has status {word}")]
async fn check_order_status(world: &mut LoyaltyWorld, number: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    let order = world
        .system()
        .db
        .fetch_order_by_number(&order_number(&number))
        .await
        .expect("Error fetching order")
        .expect("Order does not exist");
    assert_eq!(order.status, expected);
}

#[then(expr = "order {word} has an accrual of {word}")]
async fn check_order_accrual(world: &mut LoyaltyWorld, number: String, accrual: String) {
    let order = world
        .system()
        .db
        .fetch_order_by_number(&order_number(&number))
        .await
        .expect("Error fetching order")
        .expect("Order does not exist");
    assert_eq!(order.accrual, Some(amount(&accrual)));
}

#[then(expr = "'{word}' has a current balance of {word}")]
async fn check_current_balance(world: &mut LoyaltyWorld, login: String, expected: String) {
    let sys = world.system();
    let account = sys.accounts().balance(sys.user_id(&login)).await.expect("Error fetching balance");
    assert_eq!(account.current_balance, amount(&expected), "Current balance is incorrect");
}

#[then(expr = "'{word}' has withdrawn {word} in total")]
async fn check_total_withdrawn(world: &mut LoyaltyWorld, login: String, expected: String) {
    let sys = world.system();
    let account = sys.accounts().balance(sys.user_id(&login)).await.expect("Error fetching balance");
    assert_eq!(account.total_withdrawn, amount(&expected), "Total withdrawn is incorrect");
}

#[then(expr = "'{word}' has {int} order(s)")]
async fn check_order_count(world: &mut LoyaltyWorld, login: String, count: usize) {
    let sys = world.system();
    let orders = sys.accounts().orders_for_user(sys.user_id(&login)).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count);
}
