use crate::order::{Order, OrderKind};
use serde::{Deserialize, Serialize};
use tradeforge_data::books::{BookSnapshot, Level};
use tradeforge_instrument::{Side, fixed::Qty};

/// Result of a liquidity walk: the levels to consume, best price first, and whether the
/// requested quantity could not be fully planned.
#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct PlanResult {
    pub levels: Vec<Level>,
    pub exhausted: bool,
}

impl PlanResult {
    /// Total quantity covered by the planned levels.
    pub fn planned_qty(&self) -> Qty {
        self.levels
            .iter()
            .fold(Qty::ZERO, |total, level| {
                Qty::from_raw(total.raw() + level.qty.raw())
            })
    }
}

/// Walk the opposing side of a book snapshot, accumulating liquidity for the order.
///
/// LIMIT orders take levels while the price respects their limit (asks ascending for a BUY,
/// bids descending for a SELL). MARKET orders walk up to `max_slippage_levels` book levels, or
/// unbounded when absent. Accumulation stops at the order's remaining quantity.
pub fn plan(order: &Order, book: &BookSnapshot, max_slippage_levels: Option<usize>) -> PlanResult {
    let walk: &[Level] = match order.side {
        Side::Buy => &book.asks,
        Side::Sell => &book.bids,
    };

    let level_cap = match order.kind {
        OrderKind::Market => max_slippage_levels.unwrap_or(usize::MAX),
        OrderKind::Limit => usize::MAX,
    };

    let mut remaining = order.remaining_qty;
    let mut levels = Vec::new();

    for level in walk.iter().take(level_cap) {
        if remaining.is_zero() {
            break;
        }

        // the walk is best-price first, so the first non-crossing level ends a limit plan
        if order.kind == OrderKind::Limit && !order.crosses_limit_price(level.price) {
            break;
        }

        let take = Qty::from_raw(remaining.raw().min(level.qty.raw()));
        if take.is_zero() {
            continue;
        }

        levels.push(Level::new(level.price, take));
        remaining = remaining.saturating_sub(take);
    }

    PlanResult {
        levels,
        exhausted: !remaining.is_zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        balance::AccountId,
        order::{OrderFees, OrderId, OrderStatus},
    };
    use tradeforge_instrument::fixed::Price;

    fn order(side: Side, kind: OrderKind, qty: u64, limit: Option<u64>) -> Order {
        Order {
            id: OrderId::new("order-1"),
            client_id: None,
            account: AccountId::new("acc-1"),
            kind,
            side,
            qty: Qty::from_raw(qty),
            price: limit.map(Price::from_raw),
            ts_created: 0,
            status: OrderStatus::Open,
            remaining_qty: Qty::from_raw(qty),
            filled_qty: Qty::ZERO,
            awaiting_trade: kind == OrderKind::Limit,
            sequence: 1,
            last_update_ts: 0,
            fees: OrderFees::default(),
        }
    }

    fn level(price: u64, qty: u64) -> Level {
        Level::new(Price::from_raw(price), Qty::from_raw(qty))
    }

    fn book(bids: Vec<Level>, asks: Vec<Level>) -> BookSnapshot {
        BookSnapshot {
            ts: Some(1),
            seq: Some(1),
            bids,
            asks,
        }
    }

    #[test]
    fn test_plan() {
        struct TestCase {
            order: Order,
            book: BookSnapshot,
            max_slippage_levels: Option<usize>,
            expected: PlanResult,
        }

        let tests = vec![
            TestCase {
                // TC0: limit BUY 4 @122 against asks [121x2, 122x5] takes both levels partially
                order: order(Side::Buy, OrderKind::Limit, 4, Some(122)),
                book: book(vec![], vec![level(121, 2), level(122, 5)]),
                max_slippage_levels: None,
                expected: PlanResult {
                    levels: vec![level(121, 2), level(122, 2)],
                    exhausted: false,
                },
            },
            TestCase {
                // TC1: limit BUY 5 @121 stops at the limit and is exhausted
                order: order(Side::Buy, OrderKind::Limit, 5, Some(121)),
                book: book(vec![], vec![level(121, 2), level(122, 5)]),
                max_slippage_levels: None,
                expected: PlanResult {
                    levels: vec![level(121, 2)],
                    exhausted: true,
                },
            },
            TestCase {
                // TC2: limit SELL walks bids descending while price >= limit
                order: order(Side::Sell, OrderKind::Limit, 5, Some(99)),
                book: book(vec![level(100, 3), level(99, 1), level(98, 10)], vec![]),
                max_slippage_levels: None,
                expected: PlanResult {
                    levels: vec![level(100, 3), level(99, 1)],
                    exhausted: true,
                },
            },
            TestCase {
                // TC3: market BUY respects the slippage level cap
                order: order(Side::Buy, OrderKind::Market, 10, None),
                book: book(vec![], vec![level(121, 2), level(122, 2), level(123, 2)]),
                max_slippage_levels: Some(2),
                expected: PlanResult {
                    levels: vec![level(121, 2), level(122, 2)],
                    exhausted: true,
                },
            },
            TestCase {
                // TC4: market SELL unbounded walk fills fully
                order: order(Side::Sell, OrderKind::Market, 3, None),
                book: book(vec![level(100, 10)], vec![]),
                max_slippage_levels: None,
                expected: PlanResult {
                    levels: vec![level(100, 3)],
                    exhausted: false,
                },
            },
            TestCase {
                // TC5: empty opposing side plans nothing
                order: order(Side::Buy, OrderKind::Market, 3, None),
                book: book(vec![level(100, 10)], vec![]),
                max_slippage_levels: None,
                expected: PlanResult {
                    levels: vec![],
                    exhausted: true,
                },
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = plan(&test.order, &test.book, test.max_slippage_levels);
            assert_eq!(actual, test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_planned_qty() {
        let result = PlanResult {
            levels: vec![level(121, 2), level(122, 2)],
            exhausted: false,
        };
        assert_eq!(result.planned_qty(), Qty::from_raw(4));
    }
}
