use crate::balance::AccountId;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tradeforge_instrument::{
    Side,
    fixed::{Amount, Price, Qty},
};

/// The id-keyed [`OrderStore`](store::OrderStore) with eager per-side pending sets.
pub mod store;

/// Unique order `String` identifier.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub struct OrderId(pub SmolStr);

impl OrderId {
    pub fn new<S>(id: S) -> Self
    where
        S: Into<SmolStr>,
    {
        Self(id.into())
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Optional client-assigned order `String` identifier.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub struct ClientOrderId(pub SmolStr);

impl ClientOrderId {
    pub fn new<S>(id: S) -> Self
    where
        S: Into<SmolStr>,
    {
        Self(id.into())
    }
}

/// Kind of an order.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    Market,
    Limit,
}

/// Lifecycle state of an order.
///
/// NEW -> OPEN -> (PARTIALLY_FILLED*) -> FILLED | CANCELLED | REJECTED
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// Determine if an order in this state can still trade.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::New | Self::Open | Self::PartiallyFilled)
    }
}

/// Maker and taker fees accrued by one order, denominated in the quote currency.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize,
)]
pub struct OrderFees {
    pub maker: Amount,
    pub taker: Amount,
}

/// An order placement request.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct OrderSubmit {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientOrderId>,
    pub account: AccountId,
    pub kind: OrderKind,
    pub side: Side,
    pub qty: Qty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

impl OrderSubmit {
    /// Construct a LIMIT order placement request.
    pub fn limit<I, A>(id: I, account: A, side: Side, qty: Qty, price: Price) -> Self
    where
        I: Into<SmolStr>,
        A: Into<SmolStr>,
    {
        Self {
            id: OrderId::new(id),
            client_id: None,
            account: AccountId::new(account),
            kind: OrderKind::Limit,
            side,
            qty,
            price: Some(price),
        }
    }

    /// Construct a MARKET order placement request.
    pub fn market<I, A>(id: I, account: A, side: Side, qty: Qty) -> Self
    where
        I: Into<SmolStr>,
        A: Into<SmolStr>,
    {
        Self {
            id: OrderId::new(id),
            client_id: None,
            account: AccountId::new(account),
            kind: OrderKind::Market,
            side,
            qty,
            price: None,
        }
    }
}

/// An order owned by the [`OrderStore`](store::OrderStore).
///
/// `sequence` is a strictly monotonic store-local counter recording acceptance order.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientOrderId>,
    pub account: AccountId,
    pub kind: OrderKind,
    pub side: Side,
    pub qty: Qty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    pub ts_created: u64,
    pub status: OrderStatus,
    pub remaining_qty: Qty,
    pub filled_qty: Qty,
    pub awaiting_trade: bool,
    pub sequence: u64,
    pub last_update_ts: u64,
    pub fees: OrderFees,
}

impl Order {
    /// Determine if a print (or book level) at `price` crosses this order's limit price.
    ///
    /// A limit BUY crosses at `price <= limit`, a limit SELL at `price >= limit`. Market orders
    /// always cross.
    pub fn crosses_limit_price(&self, price: Price) -> bool {
        let Some(limit) = self.price else {
            return self.kind == OrderKind::Market;
        };

        match self.kind {
            OrderKind::Market => true,
            OrderKind::Limit => match self.side {
                Side::Buy => price <= limit,
                Side::Sell => price >= limit,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(side: Side, kind: OrderKind, limit: Option<&str>) -> Order {
        Order {
            id: OrderId::new("order-1"),
            client_id: None,
            account: AccountId::new("acc-1"),
            kind,
            side,
            qty: Qty::from_raw(100),
            price: limit.map(|limit| Price::parse(limit, 2).unwrap()),
            ts_created: 0,
            status: OrderStatus::Open,
            remaining_qty: Qty::from_raw(100),
            filled_qty: Qty::ZERO,
            awaiting_trade: kind == OrderKind::Limit,
            sequence: 1,
            last_update_ts: 0,
            fees: OrderFees::default(),
        }
    }

    #[test]
    fn test_crosses_limit_price() {
        struct TestCase {
            order: Order,
            price: &'static str,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: limit BUY crosses at or below the limit
                order: order(Side::Buy, OrderKind::Limit, Some("100")),
                price: "99.99",
                expected: true,
            },
            TestCase {
                // TC1: limit BUY does not cross above the limit
                order: order(Side::Buy, OrderKind::Limit, Some("100")),
                price: "100.01",
                expected: false,
            },
            TestCase {
                // TC2: limit SELL crosses at or above the limit
                order: order(Side::Sell, OrderKind::Limit, Some("100")),
                price: "100",
                expected: true,
            },
            TestCase {
                // TC3: limit SELL does not cross below the limit
                order: order(Side::Sell, OrderKind::Limit, Some("100")),
                price: "99.99",
                expected: false,
            },
            TestCase {
                // TC4: market orders always cross
                order: order(Side::Buy, OrderKind::Market, None),
                price: "123456.78",
                expected: true,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let price = Price::parse(test.price, 2).unwrap();
            assert_eq!(
                test.order.crosses_limit_price(price),
                test.expected,
                "TC{index} failed"
            );
        }
    }
}
