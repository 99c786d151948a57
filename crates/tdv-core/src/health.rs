//! Readiness probing against HTTP health endpoints.
//!
//! The backend exposes `GET /health`; progression past the backend is gated
//! on it. The stock policy is one fixed warm-up delay followed by a single
//! probe; `ProbeConfig::attempts` turns that into a bounded retry loop.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ProbeConfig;
use crate::error::{Error, Result};

/// Outcome of a single probe attempt. Ephemeral: produced per attempt,
/// consumed immediately by the readiness decision, never persisted.
#[derive(Debug, Clone)]
pub struct HealthProbeResult {
    /// Name of the managed process the probe targeted
    pub service: String,
    pub attempt: u32,
    pub success: bool,
    pub checked_at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Probe a health endpoint once. Success is any 2xx response.
pub async fn probe(
    client: &reqwest::Client,
    service: &str,
    url: &str,
    attempt: u32,
) -> HealthProbeResult {
    let checked_at = Utc::now();
    let (success, reason) = match client.get(url).send().await {
        Ok(response) if response.status().is_success() => (true, None),
        Ok(response) => (false, Some(format!("status {}", response.status()))),
        Err(e) => (false, Some(e.to_string())),
    };
    HealthProbeResult {
        service: service.to_string(),
        attempt,
        success,
        checked_at,
        reason,
    }
}

/// Wait for a service to become ready.
///
/// Sleeps for the warm-up delay, then issues up to `attempts` probes spaced
/// `interval_secs` apart. Returns the successful probe result, or a fatal
/// `HealthCheck` error carrying the last failure reason.
pub async fn await_ready(service: &str, url: &str, config: &ProbeConfig) -> Result<HealthProbeResult> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| Error::HealthCheck {
            service: service.to_string(),
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if config.warmup_secs > 0 {
        debug!("{}: warm-up {}s before first probe", service, config.warmup_secs);
        tokio::time::sleep(Duration::from_secs(config.warmup_secs)).await;
    }

    let attempts = config.attempts.max(1);
    let mut last_reason = String::from("no probe attempted");

    for attempt in 1..=attempts {
        let result = probe(&client, service, url, attempt).await;
        if result.success {
            debug!("{} ready after {} attempt(s)", service, attempt);
            return Ok(result);
        }
        last_reason = result
            .reason
            .clone()
            .unwrap_or_else(|| "unknown failure".to_string());
        warn!(
            "probe {}/{} for {} failed: {}",
            attempt, attempts, service, last_reason
        );
        if attempt < attempts {
            tokio::time::sleep(Duration::from_secs(config.interval_secs)).await;
        }
    }

    Err(Error::HealthCheck {
        service: service.to_string(),
        url: url.to_string(),
        reason: last_reason,
    })
}
