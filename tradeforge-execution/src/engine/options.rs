use serde::{Deserialize, Serialize};
use tradeforge_instrument::{asset::Market, scale::ScaleSpec};

/// Maker and taker fee rates in basis points.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct FeeRates {
    pub maker_bps: u32,
    pub taker_bps: u32,
}

/// Cap on how much of a single trade's quantity resting orders may consume.
///
/// Deliberately closed to `{0, 1}`: 0 disables trade-driven fills, 1 uses the full trade
/// quantity as the cap.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ParticipationFactor {
    Disabled,
    Full,
}

impl From<ParticipationFactor> for u8 {
    fn from(factor: ParticipationFactor) -> Self {
        match factor {
            ParticipationFactor::Disabled => 0,
            ParticipationFactor::Full => 1,
        }
    }
}

impl TryFrom<u8> for ParticipationFactor {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::Full),
            other => Err(format!("participation factor must be 0 or 1, got: {other}")),
        }
    }
}

/// Conservative LIMIT admission policy.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConservativePolicy {
    pub enable_conservative_for_limit: bool,
    pub trade_staleness_ms: u64,
}

impl Default for ConservativePolicy {
    fn default() -> Self {
        Self {
            enable_conservative_for_limit: true,
            trade_staleness_ms: 2_000,
        }
    }
}

/// Full configuration of one matching [`Engine`](super::Engine) run.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
    pub market: Market,
    pub scales: ScaleSpec,
    pub prefer_depth_on_equal_ts: bool,
    pub treat_limit_as_maker: bool,
    pub participation_factor: ParticipationFactor,
    pub use_aggressor_for_liquidity: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_slippage_levels: Option<usize>,
    pub reject_on_exhausted_liquidity: bool,
    pub fee: FeeRates,
    pub conservative: ConservativePolicy,
}

impl EngineOptions {
    /// Construct [`EngineOptions`] for the provided market with the standard defaults.
    pub fn new(market: Market, scales: ScaleSpec) -> Self {
        Self {
            market,
            scales,
            prefer_depth_on_equal_ts: true,
            treat_limit_as_maker: true,
            participation_factor: ParticipationFactor::Full,
            use_aggressor_for_liquidity: false,
            max_slippage_levels: None,
            reject_on_exhausted_liquidity: false,
            fee: FeeRates::default(),
            conservative: ConservativePolicy::default(),
        }
    }
}
