use serde::{Deserialize, Serialize};

/// Counters of one replay run.
///
/// Sim timestamps are event-time milliseconds; wall timestamps are unix milliseconds.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStats {
    pub events_out: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sim_start_ts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sim_last_ts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_start_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_last_ms: Option<u64>,
}

impl ReplayStats {
    /// Record one emitted event.
    pub fn record(&mut self, sim_ts: u64, wall_ms: u64) {
        self.events_out += 1;
        self.sim_start_ts.get_or_insert(sim_ts);
        self.sim_last_ts = Some(sim_ts);
        self.wall_start_ms.get_or_insert(wall_ms);
        self.wall_last_ms = Some(wall_ms);
    }
}
