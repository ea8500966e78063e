use std::time::Duration as StdDuration;

use time::{Duration, OffsetDateTime};
use tokio::time as tokio_time;

use sref_service::{RecomputeReport, SrefService};

use crate::Result;

pub struct WorkerState {
	pub service: SrefService,
	pub recompute_interval: Duration,
	pub poll_interval: StdDuration,
}
impl WorkerState {
	pub fn new(service: SrefService) -> Self {
		let worker_cfg = &service.cfg.worker;
		let recompute_interval = Duration::seconds(worker_cfg.recompute_interval_seconds);
		let poll_interval = StdDuration::from_millis(worker_cfg.poll_interval_ms);

		Self { service, recompute_interval, poll_interval }
	}
}

/// Polls forever, recomputing counters and purging the search cache once per interval.
/// Failures are logged and retried on the next tick.
pub async fn run_worker(state: WorkerState) -> Result<()> {
	let mut last_recompute: Option<OffsetDateTime> = None;

	tracing::info!(
		interval_seconds = state.recompute_interval.whole_seconds(),
		"Maintenance worker started."
	);

	loop {
		let now = OffsetDateTime::now_utc();

		if is_due(last_recompute, now, state.recompute_interval) {
			match recompute_once(&state).await {
				Ok(_) => last_recompute = Some(now),
				Err(err) => tracing::error!(error = %err, "Counter recompute failed."),
			}
		}

		tokio_time::sleep(state.poll_interval).await;
	}
}

pub async fn recompute_once(state: &WorkerState) -> Result<RecomputeReport> {
	Ok(state.service.recompute().await?)
}

fn is_due(last: Option<OffsetDateTime>, now: OffsetDateTime, interval: Duration) -> bool {
	match last {
		None => true,
		Some(last) => now - last >= interval,
	}
}
