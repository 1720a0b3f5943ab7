// src/scheduler/clock.rs
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Wall clock seen by the scheduler.
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    /// Unix seconds.
    fn now(&self) -> i64;
    async fn sleep(&self, d: Duration);
}

/// Real time: chrono for "now", tokio for sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }

    async fn sleep(&self, d: Duration) {
        tokio::time::sleep(d).await;
    }
}

/// Test clock: `sleep` returns immediately and moves time forward.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
    sleeps: AtomicI64,
}

impl ManualClock {
    pub fn at(unix: i64) -> Self {
        Self {
            millis: AtomicI64::new(unix * 1000),
            sleeps: AtomicI64::new(0),
        }
    }

    pub fn set(&self, unix: i64) {
        self.millis.store(unix * 1000, Ordering::SeqCst);
    }

    /// Jump forward without sleeping (simulates a suspended machine).
    pub fn advance(&self, secs: i64) {
        self.millis.fetch_add(secs * 1000, Ordering::SeqCst);
    }

    /// How many times `sleep` was called.
    pub fn sleeps(&self) -> i64 {
        self.sleeps.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.millis.load(Ordering::SeqCst).div_euclid(1000)
    }

    async fn sleep(&self, d: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.millis
            .fetch_add(d.as_millis().min(i64::MAX as u128) as i64, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_clock_sleep_advances_time() {
        let c = ManualClock::at(100);
        c.sleep(Duration::from_millis(1500)).await;
        assert_eq!(c.now(), 101);
        c.sleep(Duration::from_millis(500)).await;
        assert_eq!(c.now(), 102);
        c.advance(10);
        assert_eq!(c.now(), 112);
        assert_eq!(c.sleeps(), 2);
    }
}
