// src/pipeline/scheduler.rs

//! Fixed-interval driver for the refresh cycle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use crate::models::ScheduleConfig;
use crate::pipeline::Pipeline;

/// Run cycles until `shutdown` resolves.
///
/// The first cycle starts after `initial_delay_secs`, later ones every
/// `interval_secs`. Each cycle finishes before the next tick is awaited,
/// so cycles never overlap; a slow cycle delays the schedule instead of
/// bursting.
pub async fn run_scheduler<F>(pipeline: Arc<Pipeline>, schedule: &ScheduleConfig, shutdown: F)
where
    F: Future<Output = ()>,
{
    let period = Duration::from_secs(schedule.interval_secs.max(1));
    let start = time::Instant::now() + Duration::from_secs(schedule.initial_delay_secs);
    let mut ticker = time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log::info!(
        "Scheduler started: first run in {}s, then every {}s",
        schedule.initial_delay_secs,
        period.as_secs()
    );

    tokio::pin!(shutdown);
    let mut cycle = 0u64;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("Scheduler stopping after {} cycle(s)", cycle);
                return;
            }
            _ = ticker.tick() => {}
        }

        cycle += 1;
        match pipeline.run_cycle().await {
            Ok(report) => log::info!(
                "Cycle {} done: {} extracted, {} new, {} skipped",
                cycle,
                report.extracted,
                report.new_events,
                report.parse_failures
            ),
            Err(e) if e.is_fetch() => {
                log::warn!("Cycle {} skipped, listing unavailable: {}", cycle, e)
            }
            Err(e) => log::error!("Cycle {} aborted: {}", cycle, e),
        }
    }
}
