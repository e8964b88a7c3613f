//! Auto-resolve scheduler for autonomous wars
//!
//! Time is cut into slots of each war's interval. A war resolves at most once
//! per slot, so a restarted or doubled scheduler never resolves twice.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;

use crate::core::error::Result;
use crate::core::types::WarId;
use crate::persistence::WarStore;
use crate::service::WarService;
use crate::war::resolver::TurnResult;
use crate::war::state::{ResolutionMode, WarStatus};

/// Slot index of `now_secs` for a given interval
pub fn slot_for(now_secs: u64, interval_secs: u64) -> u64 {
    now_secs / interval_secs.max(1)
}

fn unix_secs(now: SystemTime) -> u64 {
    now.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
}

/// Resolve every autonomous war whose current slot has not run yet
pub fn run_due<S: WarStore>(
    service: &WarService<S>,
    now: SystemTime,
) -> Result<Vec<(WarId, Result<Option<TurnResult>>)>> {
    let now_secs = unix_secs(now);
    let mut outcomes = Vec::new();

    for summary in service.list_wars()? {
        if !summary.auto_resolve
            || summary.mode != ResolutionMode::Autonomous
            || summary.status != WarStatus::Active
        {
            continue;
        }
        let slot = slot_for(now_secs, summary.interval_secs);
        let outcome = service.resolve_scheduled(summary.id, slot);

        match &outcome {
            Ok(Some(result)) => tracing::info!(
                "Auto-resolved war {} turn {} (slot {})",
                summary.id,
                result.turn,
                slot
            ),
            Ok(None) => {}
            Err(e) => tracing::warn!("Auto-resolve of war {} failed: {}", summary.id, e),
        }
        outcomes.push((summary.id, outcome));
    }

    Ok(outcomes)
}

/// Poll for due wars every `tick` until `shutdown` flips to true
pub async fn run<S: WarStore + 'static>(
    service: Arc<WarService<S>>,
    tick: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(tick);
    tracing::info!("Auto-resolve scheduler started (tick {:?})", tick);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let service = Arc::clone(&service);
                let joined = tokio::task::spawn_blocking(move || run_due(&service, SystemTime::now())).await;
                match joined {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => tracing::error!("Scheduler pass failed: {}", e),
                    Err(e) => tracing::error!("Scheduler task panicked: {}", e),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Auto-resolve scheduler stopped");
}
