use std::time::Duration;

use clap::Parser;
use reqwest::{Client, Url};

use crate::prelude::*;

/// Optional dead-man's-switch ping, sent after a successful run so that a
/// silently broken cron job gets noticed.
#[derive(Parser)]
pub struct HeartbeatArgs {
    #[clap(long = "heartbeat-url", env = "HEARTBEAT_URL")]
    pub heartbeat_url: Option<Url>,
}

impl HeartbeatArgs {
    /// Best effort: a failed ping is logged, never propagated.
    pub async fn send(&self) {
        let Some(url) = self.heartbeat_url.clone() else {
            return;
        };
        if let Err(error) = Self::ping(url).await {
            warn!("failed to send the heartbeat: {error:#}");
        }
    }

    #[instrument(skip_all)]
    async fn ping(url: Url) -> Result {
        info!("sending a heartbeat…");
        Client::builder()
            .timeout(Duration::from_secs(3))
            .build()?
            .get(url)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
