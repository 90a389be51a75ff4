use std::time::Duration;

use log::*;
use loyalty_engine::{accrual::HttpAccrualResolver, AccrualReconciler, OrderFlowApi, SqliteDatabase, TickSummary};
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

/// Starts the accrual worker, which runs one reconciliation tick every `interval` until `shutdown` reads `true`.
///
/// Ticks never overlap: a tick that overruns the interval delays the next one rather than queueing extra ticks. On
/// shutdown the current order is allowed to finish, and the rest of the tick is abandoned.
pub fn start_accrual_worker(
    db: SqliteDatabase,
    resolver: HttpAccrualResolver,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reconciler = AccrualReconciler::new(OrderFlowApi::new(db), resolver);
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("🕰️ Accrual worker started. Polling every {} ms", interval.as_millis());
        loop {
            tokio::select! {
                _ = timer.tick() => {},
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("🕰️ Shutdown signal was dropped");
                        break;
                    }
                },
            }
            if *shutdown.borrow() {
                break;
            }
            let summary = reconciler.run_tick_with_shutdown(&shutdown).await;
            log_summary(&summary);
            if summary.interrupted {
                break;
            }
        }
        info!("🕰️ Accrual worker stopped");
    })
}

fn log_summary(summary: &TickSummary) {
    if summary.examined == 0 {
        trace!("🕰️ No pending orders");
        return;
    }
    if summary.changed() > 0 || summary.failed > 0 {
        info!(
            "🕰️ Reconciled {} orders: {} now processing, {} invalid, {} credited ({} points), {} failed",
            summary.examined,
            summary.moved_to_processing,
            summary.invalidated,
            summary.credited,
            summary.credited_total,
            summary.failed
        );
    }
    debug!("🕰️ {} orders unchanged, {} already settled", summary.unchanged, summary.already_settled);
}
