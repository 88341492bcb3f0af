//! A background job that periodically requests the API's own URL.
//!
//! Hosting platforms that idle inactive instances count these requests as activity.
//! The job shares nothing with the request handlers.

use std::time::Duration;

use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Periodically sends a GET request to a URL and logs the outcome.
#[derive(Debug, Clone)]
pub struct KeepAliveJob {
    client: reqwest::Client,
    url: String,
    interval: Duration,
}

impl KeepAliveJob {
    /// Create a job that requests `url` every `interval`.
    pub fn new(url: impl Into<String>, interval: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            interval,
        }
    }

    /// Send one request and report whether the server answered with a success status.
    ///
    /// Errors are logged rather than returned since there is nobody to report them to.
    pub async fn run_once(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Keep-alive request to {} succeeded", self.url);
                true
            }
            Ok(response) => {
                tracing::warn!(
                    "Keep-alive request to {} failed with status {}",
                    self.url,
                    response.status()
                );
                false
            }
            Err(error) => {
                tracing::error!("Keep-alive request to {} failed: {error}", self.url);
                false
            }
        }
    }

    /// Spawn the job onto the tokio runtime.
    ///
    /// The first request is sent one full interval after starting.
    pub fn start(self) -> JoinHandle<()> {
        tracing::info!(
            "Registered keep-alive job for {} to run every {} seconds",
            self.url,
            self.interval.as_secs()
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(
                tokio::time::Instant::now() + self.interval,
                self.interval,
            );
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }
}
