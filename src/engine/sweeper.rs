use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};
use tokio::{select, spawn};
use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::storage::Storage;
use crate::tracker::{ActivityEnrichmentService, SweepReport};

pub struct TimeoutSweeper;

impl TimeoutSweeper {
    /// Sweeps immediately and then once per `every` until the returned handle is stopped.
    pub fn spawn<S: Storage>(service: Arc<ActivityEnrichmentService<S>>, every: Duration) -> SweeperHandle {
        let (shutdown, mut stopped) = oneshot::channel::<()>();

        let handle = spawn(async move {
            let mut ticker = interval(every.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut total = SweepReport::default();

            loop {
                select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        let report = service.sweep_timeouts().await;

                        if !report.is_empty() {
                            info!("Sweep timed out [{}] activities, [{}] degraded", report.timed_out + report.degraded, report.degraded);
                        }

                        total = total.merge(report);
                    }
                }
            }

            debug!("Timeout sweeper stopped");
            total
        });

        SweeperHandle { shutdown, handle }
    }

    pub fn spawn_with_config<S: Storage>(service: Arc<ActivityEnrichmentService<S>>, config: &TrackerConfig) -> SweeperHandle {
        Self::spawn(service, config.sweep_interval)
    }
}

pub struct SweeperHandle {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<SweepReport>
}

impl SweeperHandle {
    /// Stops the sweeper after its current pass and returns the totals of every pass it ran.
    pub async fn stop(self) -> Result<SweepReport, JoinError> {
        let _ = self.shutdown.send(());
        self.handle.await
    }
}
