use crate::{engine::options::ConservativePolicy, order::{Order, OrderKind}};
use serde::{Deserialize, Serialize};
use tradeforge_data::trade::Trade;
use tradeforge_instrument::{Side, fixed::Price};

/// The most recent print attributed to one aggressor side.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
pub struct RecentTrade {
    pub ts: u64,
    pub price: Price,
}

/// Conservative admission gate for LIMIT orders.
///
/// A LIMIT order is only admitted to fill when a fresh trade print proves the market actually
/// traded through its limit: a BUY requires a print at `price <= limit`, a SELL at
/// `price >= limit`, within the staleness window. MARKET orders are always admitted.
#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct ConservativeGate {
    policy: ConservativePolicy,
    last_buy: Option<RecentTrade>,
    last_sell: Option<RecentTrade>,
}

impl ConservativeGate {
    pub fn new(policy: ConservativePolicy) -> Self {
        Self {
            policy,
            last_buy: None,
            last_sell: None,
        }
    }

    /// Record a trade print against its aggressor side.
    ///
    /// Prints without aggressor information update both sides: they are evidence of the traded
    /// price regardless of attribution.
    pub fn update_trade(&mut self, trade: &Trade) {
        let recent = RecentTrade {
            ts: trade.ts,
            price: trade.price,
        };

        match trade.aggressor.or(trade.side) {
            Some(Side::Buy) => self.last_buy = Some(recent),
            Some(Side::Sell) => self.last_sell = Some(recent),
            None => {
                self.last_buy = Some(recent);
                self.last_sell = Some(recent);
            }
        }
    }

    /// Determine if the provided order is admitted to fill at `now`.
    ///
    /// Aggressor sides are scanned `[opposite, same]` relative to the order side; opposite-side
    /// prints take precedence when both qualify.
    pub fn is_allowed(&self, order: &Order, now: u64) -> bool {
        if !self.policy.enable_conservative_for_limit || order.kind == OrderKind::Market {
            return true;
        }

        let Some(limit) = order.price else {
            return false;
        };

        [order.side.opposite(), order.side]
            .into_iter()
            .filter_map(|aggressor| self.recent(aggressor))
            .any(|trade| {
                let fresh = now.saturating_sub(trade.ts) <= self.policy.trade_staleness_ms;
                let qualifies = match order.side {
                    Side::Buy => trade.price <= limit,
                    Side::Sell => trade.price >= limit,
                };
                fresh && qualifies
            })
    }

    /// Most recent print attributed to the provided aggressor side.
    pub fn recent(&self, aggressor: Side) -> Option<RecentTrade> {
        match aggressor {
            Side::Buy => self.last_buy,
            Side::Sell => self.last_sell,
        }
    }

    /// Rebuild the gate from snapshot parts.
    pub fn from_parts(
        policy: ConservativePolicy,
        last_buy: Option<RecentTrade>,
        last_sell: Option<RecentTrade>,
    ) -> Self {
        Self {
            policy,
            last_buy,
            last_sell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        balance::AccountId,
        order::{OrderFees, OrderId, OrderStatus},
    };
    use smol_str::SmolStr;
    use tradeforge_instrument::{asset::Symbol, fixed::Qty};

    fn limit_order(side: Side, limit: &str) -> Order {
        Order {
            id: OrderId::new("order-1"),
            client_id: None,
            account: AccountId::new("acc-1"),
            kind: OrderKind::Limit,
            side,
            qty: Qty::from_raw(100),
            price: Some(Price::parse(limit, 0).unwrap()),
            ts_created: 0,
            status: OrderStatus::Open,
            remaining_qty: Qty::from_raw(100),
            filled_qty: Qty::ZERO,
            awaiting_trade: true,
            sequence: 1,
            last_update_ts: 0,
            fees: OrderFees::default(),
        }
    }

    fn print(side: Option<Side>, price: &str, ts: u64) -> Trade {
        Trade {
            ts,
            symbol: Symbol::new("btcusdt"),
            price: Price::parse(price, 0).unwrap(),
            qty: Qty::from_raw(1),
            side,
            id: Some(SmolStr::new("t-1")),
            aggressor: side,
        }
    }

    #[test]
    fn test_limit_admission_window() {
        // no prints yet: a LIMIT BUY @100 is denied
        let mut gate = ConservativeGate::new(ConservativePolicy::default());
        let order = limit_order(Side::Buy, "100");
        assert!(!gate.is_allowed(&order, 1_000));

        // a fresh SELL print @99 qualifies (price <= limit)
        gate.update_trade(&print(Some(Side::Sell), "99", 1_000));
        assert!(gate.is_allowed(&order, 1_000));

        // the same print is stale past the 2000ms window
        assert!(!gate.is_allowed(&order, 3_001));
    }

    #[test]
    fn test_admission_predicates() {
        struct TestCase {
            order: Order,
            print: Trade,
            now: u64,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: limit BUY denied when the print is above the limit
                order: limit_order(Side::Buy, "100"),
                print: print(Some(Side::Sell), "101", 500),
                now: 1_000,
                expected: false,
            },
            TestCase {
                // TC1: limit SELL admitted by a print at or above the limit
                order: limit_order(Side::Sell, "100"),
                print: print(Some(Side::Buy), "100", 500),
                now: 1_000,
                expected: true,
            },
            TestCase {
                // TC2: limit SELL denied by a print below the limit
                order: limit_order(Side::Sell, "100"),
                print: print(Some(Side::Buy), "99", 500),
                now: 1_000,
                expected: false,
            },
            TestCase {
                // TC3: same-side prints also qualify (scanned after opposite)
                order: limit_order(Side::Buy, "100"),
                print: print(Some(Side::Buy), "99", 500),
                now: 1_000,
                expected: true,
            },
            TestCase {
                // TC4: a print without aggressor attribution qualifies either side
                order: limit_order(Side::Buy, "100"),
                print: print(None, "99", 500),
                now: 1_000,
                expected: true,
            },
            TestCase {
                // TC5: freshness boundary is inclusive
                order: limit_order(Side::Buy, "100"),
                print: print(Some(Side::Sell), "99", 0),
                now: 2_000,
                expected: true,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let mut gate = ConservativeGate::new(ConservativePolicy::default());
            gate.update_trade(&test.print);
            assert_eq!(
                gate.is_allowed(&test.order, test.now),
                test.expected,
                "TC{index} failed"
            );
        }
    }

    #[test]
    fn test_market_always_admitted_and_disabled_gate() {
        let gate = ConservativeGate::new(ConservativePolicy::default());

        let mut market = limit_order(Side::Buy, "100");
        market.kind = OrderKind::Market;
        market.price = None;
        assert!(gate.is_allowed(&market, 1_000));

        // a limit order without a price is denied
        let mut no_price = limit_order(Side::Buy, "100");
        no_price.price = None;
        assert!(!gate.is_allowed(&no_price, 1_000));

        // a disabled gate admits everything
        let disabled = ConservativeGate::new(ConservativePolicy {
            enable_conservative_for_limit: false,
            trade_staleness_ms: 2_000,
        });
        assert!(disabled.is_allowed(&no_price, 1_000));
    }
}
