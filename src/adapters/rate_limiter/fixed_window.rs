//! Fixed-window rate limiter over a shared counter table.
//!
//! Each key owns one row holding its count and window end. The row is
//! updated atomically, so concurrent checks on the same key never lose
//! increments.

use async_trait::async_trait;
use std::sync::Arc;

use crate::ports::{
    Clock, RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitScope,
    RateLimitStatus, RateLimiter, SharedTable, StoreError,
};

use super::config::RateLimitConfig;

/// State for a single rate limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Events counted in the current window.
    pub count: u32,
    /// When the current window ends, in unix milliseconds.
    pub reset_at_millis: u64,
}

type WindowTable = Arc<dyn SharedTable<WindowState>>;

/// Rate limiter counting events per key in fixed windows.
///
/// Connection windows are dropped on disconnect. Address windows are not,
/// so when a table is full its expired rows are reclaimed before the new
/// key is refused.
pub struct FixedWindowRateLimiter {
    connection_windows: WindowTable,
    ip_windows: WindowTable,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl FixedWindowRateLimiter {
    /// Both scopes share `windows` until [`with_ip_windows`](Self::with_ip_windows)
    /// gives address windows their own table.
    pub fn new(windows: WindowTable, config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            connection_windows: windows.clone(),
            ip_windows: windows,
            config,
            clock,
        }
    }

    pub fn with_ip_windows(mut self, windows: WindowTable) -> Self {
        self.ip_windows = windows;
        self
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn table_for(&self, scope: RateLimitScope) -> &WindowTable {
        match scope {
            RateLimitScope::Connection => &self.connection_windows,
            RateLimitScope::Ip => &self.ip_windows,
        }
    }

    async fn count_event(
        table: &WindowTable,
        key: &str,
        now: u64,
        window_millis: u64,
    ) -> Result<Option<WindowState>, StoreError> {
        table
            .update(
                key,
                Box::new(move |current: Option<WindowState>| {
                    Some(match current {
                        Some(state) if now < state.reset_at_millis => WindowState {
                            count: state.count.saturating_add(1),
                            ..state
                        },
                        _ => WindowState {
                            count: 1,
                            reset_at_millis: now + window_millis,
                        },
                    })
                }),
            )
            .await
    }

    /// Delete every row whose window ended at or before `now`.
    ///
    /// A row refreshed by another task between the scan and its delete is
    /// kept, since the delete re-checks under the row lock.
    async fn reclaim_expired(table: &WindowTable, now: u64) -> Result<usize, StoreError> {
        let mut reclaimed = 0;
        for (key, state) in table.entries().await? {
            if now < state.reset_at_millis {
                continue;
            }
            let kept = table
                .update(
                    &key,
                    Box::new(move |current: Option<WindowState>| {
                        current.filter(|state| now < state.reset_at_millis)
                    }),
                )
                .await?;
            if kept.is_none() {
                reclaimed += 1;
            }
        }
        Ok(reclaimed)
    }
}

#[async_trait]
impl RateLimiter for FixedWindowRateLimiter {
    async fn check(&self, key: &RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let limits = self.config.limits_for(key.scope);
        let now = self.clock.now_millis();
        let window_millis = limits.window_secs * 1000;
        let table = self.table_for(key.scope);
        let storage_key = key.to_storage_key();

        let counted = match Self::count_event(table, &storage_key, now, window_millis).await {
            Err(StoreError::CapacityExceeded { table: name, .. }) => {
                let reclaimed = Self::reclaim_expired(table, now)
                    .await
                    .map_err(|e| RateLimitError::Unavailable(e.to_string()))?;
                tracing::debug!(table = name, reclaimed, "Reclaimed expired rate limit windows");
                Self::count_event(table, &storage_key, now, window_millis).await
            }
            other => other,
        };
        let state = counted
            .map_err(|e| RateLimitError::Unavailable(e.to_string()))?
            .ok_or_else(|| RateLimitError::Unavailable("window row vanished".to_string()))?;

        if state.count > limits.limit {
            let retry_after_secs = (state.reset_at_millis.saturating_sub(now) + 999) / 1000;
            tracing::debug!(
                scope = %key.scope,
                identifier = %key.identifier,
                count = state.count,
                limit = limits.limit,
                "Rate limit exceeded"
            );
            return Ok(RateLimitResult::Denied(RateLimitDenied {
                limit: limits.limit,
                retry_after_secs: retry_after_secs.max(1),
                scope: key.scope,
            }));
        }

        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit: limits.limit,
            count: state.count,
        }))
    }

    async fn reset(&self, key: &RateLimitKey) -> Result<(), RateLimitError> {
        self.table_for(key.scope)
            .delete(&key.to_storage_key())
            .await
            .map_err(|e| RateLimitError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::rate_limiter::WindowLimits;
    use crate::adapters::storage::InMemoryTable;
    use crate::domain::foundation::ConnectionId;

    fn limiter(limit: u32, window_secs: u64) -> (FixedWindowRateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let config = RateLimitConfig {
            per_connection: WindowLimits { limit, window_secs },
            per_ip: WindowLimits {
                limit: 2,
                window_secs: 60,
            },
        };
        let limiter = FixedWindowRateLimiter::new(
            Arc::new(InMemoryTable::new("rate_limits", 64)),
            config,
            clock.clone(),
        );
        (limiter, clock)
    }

    // ─── Check ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn allows_up_to_limit_then_denies() {
        let (limiter, _) = limiter(3, 60);
        let key = RateLimitKey::connection(ConnectionId::new(1));

        for expected in 1..=3 {
            match limiter.check(&key).await.unwrap() {
                RateLimitResult::Allowed(status) => assert_eq!(status.count, expected),
                RateLimitResult::Denied(_) => panic!("denied within limit"),
            }
        }
        assert!(limiter.check(&key).await.unwrap().is_denied());
    }

    #[tokio::test]
    async fn new_window_starts_at_one() {
        let (limiter, clock) = limiter(2, 10);
        let key = RateLimitKey::connection(ConnectionId::new(1));

        limiter.check(&key).await.unwrap();
        limiter.check(&key).await.unwrap();
        assert!(limiter.check(&key).await.unwrap().is_denied());

        clock.advance_secs(10);
        match limiter.check(&key).await.unwrap() {
            RateLimitResult::Allowed(status) => {
                assert_eq!(status.count, 1);
                assert_eq!(status.limit, 2);
            }
            RateLimitResult::Denied(_) => panic!("window did not reset"),
        }
    }

    #[tokio::test]
    async fn denial_reports_retry_after() {
        let (limiter, clock) = limiter(1, 30);
        let key = RateLimitKey::connection(ConnectionId::new(1));
        limiter.check(&key).await.unwrap();
        clock.advance_secs(10);

        match limiter.check(&key).await.unwrap() {
            RateLimitResult::Denied(denied) => {
                assert_eq!(denied.limit, 1);
                assert_eq!(denied.retry_after_secs, 20);
            }
            RateLimitResult::Allowed(_) => panic!("expected denial"),
        }
    }

    #[tokio::test]
    async fn keys_are_counted_independently() {
        let (limiter, _) = limiter(1, 60);
        let a = RateLimitKey::connection(ConnectionId::new(1));
        let b = RateLimitKey::connection(ConnectionId::new(2));

        assert!(limiter.check(&a).await.unwrap().is_allowed());
        assert!(limiter.check(&b).await.unwrap().is_allowed());
        assert!(limiter.check(&a).await.unwrap().is_denied());
    }

    #[tokio::test]
    async fn ip_scope_uses_its_own_limits() {
        let (limiter, _) = limiter(100, 60);
        let key = RateLimitKey::ip("10.0.0.1");
        assert!(limiter.check(&key).await.unwrap().is_allowed());
        assert!(limiter.check(&key).await.unwrap().is_allowed());
        assert!(limiter.check(&key).await.unwrap().is_denied());
    }

    // ─── Reset / Reclaim ───────────────────────────────────────────────

    #[tokio::test]
    async fn reset_clears_window() {
        let (limiter, _) = limiter(1, 60);
        let key = RateLimitKey::connection(ConnectionId::new(1));
        limiter.check(&key).await.unwrap();
        assert!(limiter.check(&key).await.unwrap().is_denied());

        limiter.reset(&key).await.unwrap();
        assert!(limiter.check(&key).await.unwrap().is_allowed());
    }

    fn small_limiter(capacity: usize) -> (FixedWindowRateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let config = RateLimitConfig {
            per_connection: WindowLimits {
                limit: 1,
                window_secs: 10,
            },
            per_ip: WindowLimits {
                limit: 5,
                window_secs: 60,
            },
        };
        let limiter = FixedWindowRateLimiter::new(
            Arc::new(InMemoryTable::new("rate_limits", capacity)),
            config,
            clock.clone(),
        );
        (limiter, clock)
    }

    #[tokio::test]
    async fn expired_address_windows_make_room_for_connections() {
        let (limiter, clock) = small_limiter(4);
        for n in 1..=4 {
            let ip = format!("10.0.0.{}", n);
            assert!(limiter.check(&RateLimitKey::ip(ip)).await.unwrap().is_allowed());
        }
        clock.advance_secs(3600);

        let key = RateLimitKey::connection(ConnectionId::new(1));
        assert!(limiter.check(&key).await.unwrap().is_allowed());
        assert!(limiter.check(&key).await.unwrap().is_denied());
    }

    #[tokio::test]
    async fn live_windows_are_not_reclaimed() {
        let (limiter, _) = small_limiter(2);
        let first = RateLimitKey::connection(ConnectionId::new(1));
        limiter.check(&first).await.unwrap();
        limiter.check(&RateLimitKey::connection(ConnectionId::new(2))).await.unwrap();

        let third = RateLimitKey::connection(ConnectionId::new(3));
        assert!(matches!(
            limiter.check(&third).await,
            Err(RateLimitError::Unavailable(_))
        ));
        assert!(limiter.check(&first).await.unwrap().is_denied());
    }

    #[tokio::test]
    async fn address_windows_kept_apart_never_crowd_out_connections() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let config = RateLimitConfig {
            per_connection: WindowLimits {
                limit: 1,
                window_secs: 10,
            },
            per_ip: WindowLimits {
                limit: 5,
                window_secs: 60,
            },
        };
        let limiter = FixedWindowRateLimiter::new(
            Arc::new(InMemoryTable::new("rate_limits", 2)),
            config,
            clock,
        )
        .with_ip_windows(Arc::new(InMemoryTable::new("handshake_limits", 2)));

        limiter.check(&RateLimitKey::ip("10.0.0.1")).await.unwrap();
        limiter.check(&RateLimitKey::ip("10.0.0.2")).await.unwrap();
        assert!(limiter.check(&RateLimitKey::ip("10.0.0.3")).await.is_err());

        let key = RateLimitKey::connection(ConnectionId::new(1));
        assert!(limiter.check(&key).await.unwrap().is_allowed());
        assert!(limiter.check(&key).await.unwrap().is_denied());

        limiter.reset(&key).await.unwrap();
        assert!(limiter.check(&key).await.unwrap().is_allowed());
    }
}
