use std::{fmt::Debug, sync::Arc};

use log::*;
use lpg_common::Amount;
use mockable::{Clock, DefaultClock};

use crate::{
    db_types::{AccrualReport, AccrualStatus, NewOrder, Order, OrderNumber, OrderStatusType},
    ledger_api::errors::OrderFlowError,
    traits::{InsertOrderResult, LedgerDatabase, LedgerError},
};

/// The result of a user submitting an order number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOrderResult {
    /// The order is new and has been queued for accrual.
    Accepted(Order),
    /// The same user had already submitted this order. Nothing changed.
    AlreadySubmitted(Order),
}

impl SubmitOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            SubmitOrderResult::Accepted(o) | SubmitOrderResult::AlreadySubmitted(o) => o,
        }
    }
}

/// What applying a resolver answer did to a local order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualOutcome {
    /// The resolver has nothing new to say. The order stays pending and will be asked about again.
    Unchanged,
    MovedToProcessing,
    Invalidated,
    /// The order was completed and its owner credited with the given amount.
    Credited(Amount),
    /// The order had already reached a terminal state. Nothing changed and nothing was credited.
    AlreadySettled,
}

/// `OrderFlowApi` drives orders through their lifecycle: submission by users, and the transitions that follow from
/// the accrual resolver's answers.
pub struct OrderFlowApi<B> {
    db: B,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<B: Debug> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.db)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, clock: Arc::new(DefaultClock) }
    }

    /// Replaces the wall clock used to timestamp submissions and transitions.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: LedgerDatabase
{
    /// Submits `number` on behalf of `user_id`.
    ///
    /// * An invalid number is rejected without touching the database.
    /// * Re-submitting one's own order is a no-op and reports [`SubmitOrderResult::AlreadySubmitted`].
    /// * Submitting someone else's order fails with [`OrderFlowError::OwnedByAnotherUser`].
    ///
    /// Two concurrent submissions of the same number can both pass the initial lookup. The database's uniqueness
    /// constraint decides the winner, and the loser is classified against the winning row.
    pub async fn submit_order(&self, user_id: i64, number: &str) -> Result<SubmitOrderResult, OrderFlowError> {
        let number = number.parse::<OrderNumber>()?;
        if let Some(existing) = self.db.fetch_order_by_number(&number).await? {
            return classify_existing(user_id, existing);
        }
        let order = NewOrder::new(number, user_id, self.clock.utc());
        match self.db.insert_order(order).await? {
            InsertOrderResult::Inserted(order) => {
                info!("🔄️📦️ Order [{}] accepted for user #{user_id}", order.number);
                Ok(SubmitOrderResult::Accepted(order))
            },
            InsertOrderResult::AlreadyExists(existing) => {
                debug!("🔄️📦️ Lost the race to insert order [{}]. Using the existing record", existing.number);
                classify_existing(user_id, existing)
            },
        }
    }

    /// Fetches every order that the accrual resolver still needs to be asked about, in the given status.
    pub async fn pending_orders(&self, status: OrderStatusType) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_by_status(status).await?;
        Ok(orders)
    }

    /// Applies the resolver's answer for `order`.
    ///
    /// | Resolver says | Effect                                                              |
    /// |---------------|---------------------------------------------------------------------|
    /// | REGISTERED    | nothing                                                             |
    /// | PROCESSING    | `NEW` moves to `PROCESSING`                                         |
    /// | INVALID       | order becomes `INVALID`                                             |
    /// | PROCESSED     | order becomes `PROCESSED` and the owner is credited, atomically     |
    ///
    /// A missing accrual on a `PROCESSED` answer counts as zero. A negative one is rejected.
    pub async fn apply_accrual_report(
        &self,
        order: &Order,
        report: &AccrualReport,
    ) -> Result<AccrualOutcome, OrderFlowError> {
        let number = &order.number;
        if report.order != number.as_str() {
            return Err(OrderFlowError::InvalidAccrualReport(
                number.clone(),
                format!("the report is for order '{}'", report.order),
            ));
        }
        let now = self.clock.utc();
        let outcome = match report.status {
            AccrualStatus::Registered => AccrualOutcome::Unchanged,
            AccrualStatus::Processing if order.status == OrderStatusType::Processing => AccrualOutcome::Unchanged,
            AccrualStatus::Processing => {
                match self.db.update_order_status(number, OrderStatusType::Processing, now).await? {
                    Some(_) => AccrualOutcome::MovedToProcessing,
                    None => AccrualOutcome::Unchanged,
                }
            },
            AccrualStatus::Invalid => match self.db.update_order_status(number, OrderStatusType::Invalid, now).await? {
                Some(_) => AccrualOutcome::Invalidated,
                None => AccrualOutcome::AlreadySettled,
            },
            AccrualStatus::Processed => {
                let accrual = report.accrual.unwrap_or_default();
                if accrual.is_negative() {
                    return Err(OrderFlowError::InvalidAccrualReport(
                        number.clone(),
                        format!("negative accrual {accrual}"),
                    ));
                }
                match self.db.credit_processed_order(number, accrual, now).await {
                    Ok(Some(_)) => AccrualOutcome::Credited(accrual),
                    Ok(None) => AccrualOutcome::AlreadySettled,
                    Err(LedgerError::InvalidAmount(a)) => {
                        return Err(OrderFlowError::InvalidAccrualReport(number.clone(), format!("invalid accrual {a}")))
                    },
                    Err(e) => return Err(e.into()),
                }
            },
        };
        trace!("🔄️📦️ Order [{number}] ({}) + resolver {} => {outcome:?}", order.status, report.status);
        Ok(outcome)
    }
}

fn classify_existing(user_id: i64, existing: Order) -> Result<SubmitOrderResult, OrderFlowError> {
    if existing.user_id == user_id {
        debug!("🔄️📦️ Order [{}] was already submitted by user #{user_id}", existing.number);
        Ok(SubmitOrderResult::AlreadySubmitted(existing))
    } else {
        info!(
            "🔄️📦️ User #{user_id} tried to submit order [{}], which belongs to user #{}",
            existing.number, existing.user_id
        );
        Err(OrderFlowError::OwnedByAnotherUser(existing.number))
    }
}
