use crate::adapters::clock::SystemClock;
use crate::adapters::counter_store::InMemoryCounterStore;
use crate::domain::model::LimitScope;
use crate::domain::ports::{Clock, CounterStore};
use crate::utils::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window_seconds: u64,
}

impl RateLimitPolicy {
    pub const fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window_seconds,
        }
    }

    /// 100 requests / 15 minutes across every route.
    pub const fn global() -> Self {
        Self::new(100, 15 * 60)
    }

    /// 5 validated submissions / hour.
    pub const fn contact() -> Self {
        Self::new(5, 60 * 60)
    }

    /// 3 signups / hour.
    pub const fn newsletter() -> Self {
        Self::new(3, 60 * 60)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited,
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

/// Fixed-window limiter keyed by client address.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    scope: LimitScope,
    policy: RateLimitPolicy,
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(scope: LimitScope, policy: RateLimitPolicy) -> Self {
        Self::with_parts(
            scope,
            policy,
            Arc::new(InMemoryCounterStore::new()),
            Arc::new(SystemClock::new()),
        )
    }

    pub fn with_parts(
        scope: LimitScope,
        policy: RateLimitPolicy,
        store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            scope,
            policy,
            store,
            clock,
        }
    }

    pub fn scope(&self) -> LimitScope {
        self.scope
    }

    /// Counts one hit for `key` and decides whether it fits the window.
    pub fn check(&self, key: &str) -> RateDecision {
        let now = self.clock.now();
        let (count, resets_at) = self.store.hit(key, now, self.policy.window());

        if count > self.policy.max_requests {
            tracing::warn!(
                scope = %self.scope,
                client = key,
                count,
                retry_after_secs = resets_at.saturating_duration_since(now).as_secs(),
                "rate limit exceeded"
            );
            return RateDecision::Limited;
        }

        RateDecision::Allowed
    }

    /// Like [`check`](Self::check) but as a `Result` for `?` chains.
    pub fn acquire(&self, key: &str) -> Result<()> {
        match self.check(key) {
            RateDecision::Allowed => Ok(()),
            RateDecision::Limited => Err(RelayError::RateLimited { scope: self.scope }),
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired(self.clock.now())
    }

    pub fn tracked_clients(&self) -> usize {
        self.store.len()
    }
}

/// Periodically drops finished windows from every limiter.
pub fn spawn_sweeper(limiters: Vec<RateLimiter>, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            for limiter in &limiters {
                let removed = limiter.purge_expired();
                if removed > 0 {
                    tracing::debug!(scope = %limiter.scope(), removed, "purged expired rate windows");
                }
            }
        }
    })
}
