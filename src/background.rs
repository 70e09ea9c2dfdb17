use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;
use crate::state::AppState;

/// Runs a scheduler pass right away and then on every interval tick.
pub async fn start_scheduler(state: Arc<AppState>) {
    let interval = Duration::from_secs(state.config.scheduler_interval_secs.max(1));
    info!("Starting scheduler, interval {}s", interval.as_secs());

    loop {
        let pass_id = Uuid::new_v4().to_string();
        let span = info_span!("scheduler_pass", pass_id = %pass_id);

        async {
            let report = state.scheduler.run_pass(Utc::now()).await;
            if report.failures > 0 {
                warn!(?report, "Scheduler pass finished with failures");
            } else {
                info!(?report, "Scheduler pass finished");
            }
        }
            .instrument(span)
            .await;

        sleep(interval).await;
    }
}
