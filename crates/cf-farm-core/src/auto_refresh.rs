use std::sync::Weak;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::StakingFarm;

/// Periodic refresh loop. Each tick runs one refresh cycle and re-arms,
/// whether or not tokens failed. Stopped by [`AutoRefresh::stop`], by
/// dropping the handle, or once the farm itself is gone.
pub struct AutoRefresh {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl AutoRefresh {
    pub fn start(farm: Weak<StakingFarm>, period: Duration) -> Self {
        let (stop, mut stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            info!(period_secs = period.as_secs(), "auto refresh started");
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = tokio::time::sleep(period) => {}
                }
                let Some(farm) = farm.upgrade() else {
                    break;
                };
                let summary = farm.refresh().await;
                debug!(
                    refreshed = summary.refreshed.len(),
                    failed = summary.failed.len(),
                    "auto refresh tick"
                );
            }
            info!("auto refresh stopped");
        });

        Self {
            stop: Some(stop),
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}
