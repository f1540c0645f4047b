// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::PortalClient;
use crate::transport::Transport;
use crate::url_builder::Resource;

impl<T: Transport> PortalClient<T> {
    /// Watchdog ping keeping the portal session from idling out. Failures are
    /// logged and swallowed.
    pub async fn ping(&self) {
        match self.call(Resource::Watchdog, "watchdog", &[]).await {
            Ok(_) => debug!("Watchdog ping sent"),
            Err(e) => debug!("Watchdog error: {}", e),
        }
    }
}

/// Pings every `period` until `cancel` fires. The first ping goes out one
/// period after spawning.
pub fn spawn_keepalive<T>(
    client: Arc<PortalClient<T>>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    T: Transport + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Keepalive stopped");
                    break;
                }
                _ = ticker.tick() => client.ping().await,
            }
        }
    })
}
