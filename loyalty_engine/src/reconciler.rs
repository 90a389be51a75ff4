//! The reconciliation pass that moves pending orders towards a terminal state.
//!
//! One call to [`AccrualReconciler::run_tick`] is one *tick*: every `NEW` order is looked up with the accrual resolver,
//! then every `PROCESSING` order, each oldest first. An order is looked up at most once per tick, so one that moves
//! from `NEW` to `PROCESSING` waits for the next tick. The answers are applied through
//! [`OrderFlowApi::apply_accrual_report`], so each order's transition (and credit, if any) is its own transaction.
//!
//! Failures are isolated per order. A resolver timeout for one order is logged and the rest of the tick carries on;
//! the failed order is simply still pending on the next tick. No transaction is ever held open across a resolver call.
//!
//! Ticks must not overlap. The reconciler itself does not enforce this; the caller drives ticks sequentially.
use std::collections::HashSet;

use log::*;
use lpg_common::Amount;
use thiserror::Error;
use tokio::sync::watch;

use crate::{
    accrual::{AccrualResolver, ResolverError},
    db_types::{Order, OrderStatusType},
    ledger_api::{
        errors::OrderFlowError,
        order_flow_api::{AccrualOutcome, OrderFlowApi},
    },
    traits::LedgerDatabase,
};

/// Statuses polled on each tick, in order. Fresh submissions go first.
const POLLED_STATUSES: [OrderStatusType; 2] = [OrderStatusType::New, OrderStatusType::Processing];

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Resolver lookup failed. {0}")]
    Resolver(#[from] ResolverError),
    #[error("Could not apply the resolver's answer. {0}")]
    OrderFlow(#[from] OrderFlowError),
}

/// What happened during a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub examined: usize,
    pub unchanged: usize,
    pub moved_to_processing: usize,
    pub invalidated: usize,
    pub credited: usize,
    pub already_settled: usize,
    pub failed: usize,
    pub credited_total: Amount,
    /// True if a shutdown request cut the tick short.
    pub interrupted: bool,
}

impl TickSummary {
    fn record(&mut self, outcome: AccrualOutcome) {
        match outcome {
            AccrualOutcome::Unchanged => self.unchanged += 1,
            AccrualOutcome::MovedToProcessing => self.moved_to_processing += 1,
            AccrualOutcome::Invalidated => self.invalidated += 1,
            AccrualOutcome::Credited(amount) => {
                self.credited += 1;
                self.credited_total = self.credited_total.checked_add(amount).unwrap_or_else(|| {
                    warn!("🕰️ Credited total for this tick overflowed. Reporting it as the maximum");
                    Amount::from_cents(i64::MAX)
                });
            },
            AccrualOutcome::AlreadySettled => self.already_settled += 1,
        }
    }

    /// The number of orders whose state changed on this tick.
    pub fn changed(&self) -> usize {
        self.moved_to_processing + self.invalidated + self.credited
    }
}

pub struct AccrualReconciler<B, R> {
    orders: OrderFlowApi<B>,
    resolver: R,
}

impl<B, R> AccrualReconciler<B, R>
where
    B: LedgerDatabase,
    R: AccrualResolver,
{
    pub fn new(orders: OrderFlowApi<B>, resolver: R) -> Self {
        Self { orders, resolver }
    }

    /// Runs one full tick.
    pub async fn run_tick(&self) -> TickSummary {
        self.tick(None).await
    }

    /// Runs one tick, checking `shutdown` between orders. If it reads `true`, the rest of the tick is abandoned. The
    /// order in flight always completes its own transaction first.
    pub async fn run_tick_with_shutdown(&self, shutdown: &watch::Receiver<bool>) -> TickSummary {
        self.tick(Some(shutdown)).await
    }

    /// Looks up a single order and applies the answer.
    pub async fn reconcile_order(&self, order: &Order) -> Result<AccrualOutcome, ReconcileError> {
        let report = self.resolver.resolve(&order.number).await?;
        let outcome = self.orders.apply_accrual_report(order, &report).await?;
        Ok(outcome)
    }

    async fn tick(&self, shutdown: Option<&watch::Receiver<bool>>) -> TickSummary {
        let mut summary = TickSummary::default();
        let mut seen = HashSet::new();
        for status in POLLED_STATUSES {
            let orders = match self.orders.pending_orders(status).await {
                Ok(orders) => orders,
                Err(e) => {
                    error!("🕰️ Could not fetch {status} orders. They will be retried on the next tick. {e}");
                    continue;
                },
            };
            trace!("🕰️ {} {status} orders to reconcile", orders.len());
            for order in orders.into_iter().filter(|o| seen.insert(o.id)) {
                if shutdown.is_some_and(|rx| *rx.borrow()) {
                    info!("🕰️ Shutdown requested. Abandoning the rest of this reconciliation tick");
                    summary.interrupted = true;
                    return summary;
                }
                summary.examined += 1;
                match self.reconcile_order(&order).await {
                    Ok(outcome) => summary.record(outcome),
                    Err(ReconcileError::Resolver(e)) if !e.is_transient() => {
                        summary.failed += 1;
                        let number = &order.number;
                        error!("🕰️ Order [{number}] cannot be looked up until the resolver is reconfigured. {e}");
                    },
                    Err(e) => {
                        summary.failed += 1;
                        warn!("🕰️ Order [{}] could not be reconciled on this tick. {e}", order.number);
                    },
                }
            }
        }
        summary
    }
}
