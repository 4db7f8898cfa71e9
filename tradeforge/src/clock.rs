use chrono::Utc;
use std::time::Duration;
use tracing::debug;

/// Defines how a replay run determines wall time and paces itself toward event deadlines.
///
/// `tick_until` suspends until the provided wall deadline according to the clock's pacing
/// model; deadlines already in the past return immediately.
pub trait SimClock {
    /// Current wall time in unix milliseconds.
    fn now_wall_ms(&self) -> u64;

    /// Human-readable description of the clock.
    fn desc(&self) -> String;

    /// Suspend until `target_wall_ms`.
    fn tick_until(&self, target_wall_ms: u64) -> impl Future<Output = ()> + Send;
}

/// Wall time in unix milliseconds.
pub fn wall_now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Clock that never sleeps; replays run as fast as the event loop allows.
///
/// Used when only event ordering matters, not pacing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct LogicalClock;

impl SimClock for LogicalClock {
    fn now_wall_ms(&self) -> u64 {
        wall_now_ms()
    }

    fn desc(&self) -> String {
        "logical".to_string()
    }

    async fn tick_until(&self, _: u64) {}
}

/// Clock pacing the replay in real time.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct WallClock;

impl SimClock for WallClock {
    fn now_wall_ms(&self) -> u64 {
        wall_now_ms()
    }

    fn desc(&self) -> String {
        "wall".to_string()
    }

    async fn tick_until(&self, target_wall_ms: u64) {
        let gap = target_wall_ms.saturating_sub(wall_now_ms());
        if gap > 0 {
            tokio::time::sleep(Duration::from_millis(gap)).await;
        }
    }
}

/// Clock pacing the replay at `speed` times real time.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AcceleratedClock {
    speed: f64,
}

impl AcceleratedClock {
    /// Construct an [`AcceleratedClock`]; non-finite or non-positive speeds clamp to 1.
    pub fn new(speed: f64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            debug!(speed, "invalid acceleration clamped to 1");
            1.0
        };
        Self { speed }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }
}

impl SimClock for AcceleratedClock {
    fn now_wall_ms(&self) -> u64 {
        wall_now_ms()
    }

    fn desc(&self) -> String {
        format!("accelerated(x{})", self.speed)
    }

    async fn tick_until(&self, target_wall_ms: u64) {
        let gap = target_wall_ms.saturating_sub(wall_now_ms());
        if gap > 0 {
            let scaled = (gap as f64 / self.speed).round() as u64;
            if scaled > 0 {
                tokio::time::sleep(Duration::from_millis(scaled)).await;
            }
        }
    }
}
