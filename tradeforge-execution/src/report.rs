use crate::order::{Order, OrderId, OrderStatus};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tradeforge_instrument::{
    Side,
    fixed::{Price, Qty},
};

/// Liquidity role of a fill.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Liquidity {
    Maker,
    Taker,
}

/// One generated fill.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct Fill {
    pub ts: u64,
    pub order_id: OrderId,
    pub price: Price,
    pub qty: Qty,
    pub side: Side,
    pub liquidity: Liquidity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_ref: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_aggressor: Option<Side>,
}

/// Partial order update carried by an [`ExecutionReport`].
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub status: OrderStatus,
    pub remaining_qty: Qty,
    pub filled_qty: Qty,
    pub last_update_ts: u64,
}

impl From<&Order> for OrderPatch {
    fn from(order: &Order) -> Self {
        Self {
            status: order.status,
            remaining_qty: order.remaining_qty,
            filled_qty: order.filled_qty,
            last_update_ts: order.last_update_ts,
        }
    }
}

/// Kind of a host-facing [`ExecutionReport`].
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportKind {
    Fill,
    OrderUpdated,
    End,
}

/// Stable event contract toward hosts, emitted in timeline order.
///
/// `End` is terminal and emitted exactly once per run; a failed run carries the error
/// description on its terminal report.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub ts: u64,
    pub kind: ReportKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<OrderPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionReport {
    /// Construct a FILL report.
    pub fn fill(fill: Fill) -> Self {
        Self {
            ts: fill.ts,
            kind: ReportKind::Fill,
            order_id: Some(fill.order_id.clone()),
            patch: None,
            fill: Some(fill),
            error: None,
        }
    }

    /// Construct an ORDER_UPDATED report from the order's current state.
    pub fn order_updated(order: &Order) -> Self {
        Self {
            ts: order.last_update_ts,
            kind: ReportKind::OrderUpdated,
            order_id: Some(order.id.clone()),
            patch: Some(OrderPatch::from(order)),
            fill: None,
            error: None,
        }
    }

    /// Construct the terminal END report.
    pub fn end(ts: u64) -> Self {
        Self {
            ts,
            kind: ReportKind::End,
            order_id: None,
            patch: None,
            fill: None,
            error: None,
        }
    }

    /// Construct the terminal END report carrying an error description.
    pub fn end_with_error(ts: u64, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::end(ts)
        }
    }
}
