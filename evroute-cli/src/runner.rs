use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use evroute_engine::{OptimizeRequest, Optimizer, PlanError, PlanOutcome, SearchControl};
use serde::Deserialize;

/// Extra time the outer timeout allows before raising the cancel flag. The
/// search checks its own deadline only every few hundred expansions.
const TIMEOUT_GRACE: Duration = Duration::from_millis(250);

/// One entry of a batch file: a request with an optional label.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchItem {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub request: OptimizeRequest,
}

#[derive(Debug, Clone)]
pub struct RequestResult {
    pub label: String,
    pub outcome: Result<PlanOutcome, PlanError>,
    pub elapsed: Duration,
}

impl RequestResult {
    pub const fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Run one request on the blocking pool under its own time budget.
pub async fn run_request(
    optimizer: Optimizer,
    label: String,
    request: OptimizeRequest,
    budget: Duration,
) -> RequestResult {
    let cancel = Arc::new(AtomicBool::new(false));
    let control = SearchControl::new()
        .with_cancel_flag(Arc::clone(&cancel))
        .with_timeout(budget);
    let started = Instant::now();
    let handle =
        tokio::task::spawn_blocking(move || optimizer.optimize_with(&request, &control));

    let outcome = match tokio::time::timeout(budget + TIMEOUT_GRACE, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(PlanError::Cancelled(format!("worker stopped: {join_err}"))),
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            log::warn!("{label}: time budget of {budget:?} exhausted, cancelling");
            Err(PlanError::Cancelled(format!(
                "time budget of {} ms exhausted",
                budget.as_millis()
            )))
        }
    };

    RequestResult {
        label,
        outcome,
        elapsed: started.elapsed(),
    }
}

/// Run every item concurrently; results come back in input order.
pub async fn run_batch(
    optimizer: &Optimizer,
    items: Vec<BatchItem>,
    budget: Duration,
) -> Vec<RequestResult> {
    let handles: Vec<_> = items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let label = item
                .label
                .unwrap_or_else(|| format!("#{} {}", idx + 1, item.request.pokemon_name));
            let optimizer = optimizer.clone();
            let fallback = label.clone();
            (
                fallback,
                tokio::spawn(run_request(optimizer, label, item.request, budget)),
            )
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (label, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(join_err) => RequestResult {
                label,
                outcome: Err(PlanError::Cancelled(format!("task stopped: {join_err}"))),
                elapsed: Duration::ZERO,
            },
        };
        results.push(result);
    }
    results
}
