use crate::replay::stats::ReplayStats;
use serde::{Deserialize, Serialize};

/// Replay termination limits, all optional.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct ReplayLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_events: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sim_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wall_time_ms: Option<u64>,
}

/// The first limit a replay run violated.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LimitBreach {
    MaxEvents,
    MaxSimTime,
    MaxWallTime,
}

impl ReplayLimits {
    /// Determine if emitting an event at `next_ts` would violate a limit.
    ///
    /// Checked BEFORE each emission: the violating event itself is never emitted.
    pub fn violated(
        &self,
        stats: &ReplayStats,
        next_ts: u64,
        now_wall_ms: u64,
    ) -> Option<LimitBreach> {
        if let Some(max_events) = self.max_events
            && stats.events_out >= max_events
        {
            return Some(LimitBreach::MaxEvents);
        }

        if let Some(max_sim) = self.max_sim_time_ms
            && let Some(sim_start) = stats.sim_start_ts
            && next_ts.saturating_sub(sim_start) > max_sim
        {
            return Some(LimitBreach::MaxSimTime);
        }

        if let Some(max_wall) = self.max_wall_time_ms
            && let Some(wall_start) = stats.wall_start_ms
            && now_wall_ms.saturating_sub(wall_start) > max_wall
        {
            return Some(LimitBreach::MaxWallTime);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(events_out: u64, sim_start: Option<u64>, wall_start: Option<u64>) -> ReplayStats {
        ReplayStats {
            events_out,
            sim_start_ts: sim_start,
            sim_last_ts: sim_start,
            wall_start_ms: wall_start,
            wall_last_ms: wall_start,
        }
    }

    #[test]
    fn test_violated() {
        struct TestCase {
            limits: ReplayLimits,
            stats: ReplayStats,
            next_ts: u64,
            now_wall_ms: u64,
            expected: Option<LimitBreach>,
        }

        let tests = vec![
            TestCase {
                // TC0: no limits, no breach
                limits: ReplayLimits::default(),
                stats: stats(1_000_000, Some(0), Some(0)),
                next_ts: u64::MAX,
                now_wall_ms: u64::MAX,
                expected: None,
            },
            TestCase {
                // TC1: max events counts emitted events
                limits: ReplayLimits {
                    max_events: Some(3),
                    ..Default::default()
                },
                stats: stats(3, Some(0), Some(0)),
                next_ts: 1,
                now_wall_ms: 1,
                expected: Some(LimitBreach::MaxEvents),
            },
            TestCase {
                // TC2: one below max events passes
                limits: ReplayLimits {
                    max_events: Some(3),
                    ..Default::default()
                },
                stats: stats(2, Some(0), Some(0)),
                next_ts: 1,
                now_wall_ms: 1,
                expected: None,
            },
            TestCase {
                // TC3: sim window measured from the first emitted event
                limits: ReplayLimits {
                    max_sim_time_ms: Some(100),
                    ..Default::default()
                },
                stats: stats(1, Some(1_000), Some(0)),
                next_ts: 1_101,
                now_wall_ms: 0,
                expected: Some(LimitBreach::MaxSimTime),
            },
            TestCase {
                // TC4: sim window boundary is inclusive
                limits: ReplayLimits {
                    max_sim_time_ms: Some(100),
                    ..Default::default()
                },
                stats: stats(1, Some(1_000), Some(0)),
                next_ts: 1_100,
                now_wall_ms: 0,
                expected: None,
            },
            TestCase {
                // TC5: wall limit compares elapsed wall time
                limits: ReplayLimits {
                    max_wall_time_ms: Some(50),
                    ..Default::default()
                },
                stats: stats(1, Some(0), Some(10_000)),
                next_ts: 1,
                now_wall_ms: 10_051,
                expected: Some(LimitBreach::MaxWallTime),
            },
            TestCase {
                // TC6: before the first event the sim/wall windows cannot breach
                limits: ReplayLimits {
                    max_sim_time_ms: Some(1),
                    max_wall_time_ms: Some(1),
                    ..Default::default()
                },
                stats: stats(0, None, None),
                next_ts: u64::MAX,
                now_wall_ms: u64::MAX,
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(
                test.limits
                    .violated(&test.stats, test.next_ts, test.now_wall_ms),
                test.expected,
                "TC{index} failed"
            );
        }
    }
}
