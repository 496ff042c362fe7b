//! Sliding-window request limiter.
//!
//! Each [`RateLimiter`] owns one table mapping an opaque client identifier
//! to the millisecond timestamps of its recent requests. A timestamp `t`
//! counts against the quota while `now - t < window`.
//!
//! Tables are never shared between call sites: the login endpoint and the
//! status endpoint each get their own [`PolicyLimiter`]. Memory is bounded by
//! a periodic [`Sweeper`] and by a lazy sweep that runs inside
//! [`RateLimiter::check_and_record`] once the table grows past a threshold.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::clock::{ceil_secs, Clock, SystemClock};
use crate::error::{CoreError, CoreResult};

/// Default number of tracked identifiers above which a check sweeps first.
pub const DEFAULT_LAZY_SWEEP_THRESHOLD: usize = 1000;

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request was recorded. `remaining` more fit in the current window.
    Allowed { remaining: u32 },
    /// The quota is exhausted until the oldest recorded request ages out.
    Limited { retry_after_secs: u64 },
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    /// Converts a refusal into [`CoreError::RateLimited`].
    pub fn into_result(self) -> CoreResult<u32> {
        match self {
            Decision::Allowed { remaining } => Ok(remaining),
            Decision::Limited { retry_after_secs } => {
                Err(CoreError::RateLimited { retry_after_secs })
            }
        }
    }
}

/// Window length and request count for one call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_requests: u32,
}

impl RateLimitPolicy {
    #[must_use]
    pub const fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
        }
    }
}

/// A table of per-identifier request timestamps.
///
/// The filter, compare and append steps of a check run while holding the
/// identifier's map entry, so two concurrent requests for the same key
/// cannot both slip under the quota.
pub struct RateLimiter {
    entries: DashMap<String, Vec<u64>>,
    clock: Arc<dyn Clock>,
    lazy_sweep_threshold: usize,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            lazy_sweep_threshold: DEFAULT_LAZY_SWEEP_THRESHOLD,
        }
    }

    #[must_use]
    pub fn lazy_sweep_threshold(mut self, threshold: usize) -> Self {
        self.lazy_sweep_threshold = threshold;
        self
    }

    /// Checks `identifier` against the quota and records the request if it fits.
    pub fn check_and_record(
        &self,
        identifier: &str,
        window: Duration,
        max_requests: u32,
    ) -> Decision {
        let now = self.clock.now_millis();
        let window_ms = window.as_millis() as u64;

        // Must run before taking the entry below: retain() locks every shard.
        if self.entries.len() > self.lazy_sweep_threshold {
            let removed = self.sweep_at(now, window_ms);
            tracing::debug!(removed, "lazy rate-limit sweep");
        }

        let mut stamps = self.entries.entry(identifier.to_owned()).or_default();
        stamps.retain(|&t| now.saturating_sub(t) < window_ms);

        if stamps.len() >= max_requests as usize {
            let expires_at = stamps.first().map_or(now + window_ms, |&oldest| oldest + window_ms);
            let retry_after_secs = ceil_secs(now, expires_at).max(1);
            return Decision::Limited { retry_after_secs };
        }

        stamps.push(now);
        let used = u32::try_from(stamps.len()).unwrap_or(u32::MAX);
        Decision::Allowed {
            remaining: max_requests.saturating_sub(used),
        }
    }

    /// Forgets every recorded request for `identifier`.
    pub fn reset(&self, identifier: &str) {
        self.entries.remove(identifier);
    }

    /// Drops expired timestamps and removes identifiers left with none.
    ///
    /// Returns the number of identifiers removed.
    pub fn sweep(&self, window: Duration) -> usize {
        self.sweep_at(self.clock.now_millis(), window.as_millis() as u64)
    }

    fn sweep_at(&self, now: u64, window_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, stamps| {
            stamps.retain(|&t| now.saturating_sub(t) < window_ms);
            !stamps.is_empty()
        });
        before.saturating_sub(self.entries.len())
    }

    /// Number of identifiers currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A [`RateLimiter`] bound to a single [`RateLimitPolicy`].
#[derive(Clone)]
pub struct PolicyLimiter {
    name: &'static str,
    limiter: Arc<RateLimiter>,
    policy: RateLimitPolicy,
    redact_identifiers: bool,
}

impl PolicyLimiter {
    #[must_use]
    pub fn new(name: &'static str, limiter: RateLimiter, policy: RateLimitPolicy) -> Self {
        Self {
            name,
            limiter: Arc::new(limiter),
            policy,
            redact_identifiers: false,
        }
    }

    /// Masks identifiers in log output. For keys that are personal data.
    #[must_use]
    pub fn redact_identifiers(mut self) -> Self {
        self.redact_identifiers = true;
        self
    }

    fn log_key(&self, identifier: &str) -> String {
        if !self.redact_identifiers {
            return identifier.to_owned();
        }
        let shown: String = identifier.chars().take(2).collect();
        format!("{shown}***({} chars)", identifier.chars().count())
    }

    pub fn check(&self, identifier: &str) -> Decision {
        let decision =
            self.limiter
                .check_and_record(identifier, self.policy.window, self.policy.max_requests);
        if let Decision::Limited { retry_after_secs } = decision {
            tracing::warn!(
                limiter = self.name,
                identifier = %self.log_key(identifier),
                retry_after_secs,
                "request throttled"
            );
        }
        decision
    }

    pub fn reset(&self, identifier: &str) {
        self.limiter.reset(identifier);
    }

    pub fn sweep(&self) -> usize {
        self.limiter.sweep(self.policy.window)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    #[must_use]
    pub fn tracked(&self) -> usize {
        self.limiter.len()
    }
}

/// Runs [`PolicyLimiter::sweep`] on a fixed interval.
pub struct Sweeper;

impl Sweeper {
    /// Starts the sweep task. The first sweep happens one `every` after start.
    #[must_use]
    pub fn spawn(limiter: PolicyLimiter, every: Duration) -> SweepHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let removed = limiter.sweep();
                        tracing::debug!(
                            limiter = limiter.name(),
                            removed,
                            active = limiter.tracked(),
                            "rate-limit sweep"
                        );
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });
        SweepHandle { stop_tx, task }
    }
}

/// Owner of a running sweep task.
pub struct SweepHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Signals the task to exit and waits for it.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("rate-limit sweeper ended abnormally: {e}");
        }
    }
}
