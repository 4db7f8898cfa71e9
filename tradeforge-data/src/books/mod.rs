use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tradeforge_instrument::{
    Side,
    asset::Symbol,
    fixed::{Price, Qty},
};

/// Normalised L2 depth diff record.
///
/// A level with `qty == 0` is a deletion.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct DepthDiff {
    pub ts: u64,
    pub symbol: Symbol,
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

/// Normalised OrderBook [`Level`].
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize,
)]
pub struct Level {
    pub price: Price,
    pub qty: Qty,
}

impl Level {
    pub fn new(price: Price, qty: Qty) -> Self {
        Self { price, qty }
    }
}

impl From<(Price, Qty)> for Level {
    fn from((price, qty): (Price, Qty)) -> Self {
        Self { price, qty }
    }
}

/// A [`Level`] change applied to one side of the [`OrderBook`].
///
/// `level.qty == 0` communicates that the level was removed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct LevelUpdate {
    pub side: Side,
    pub level: Level,
}

/// Incremental local L2 OrderBook.
///
/// Maintains bids sorted descending and asks ascending by price, tracking the timestamp and
/// sequence of the last applied [`DepthDiff`].
#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct OrderBook {
    last_ts: Option<u64>,
    last_seq: Option<u64>,
    bids: OrderBookSide<Bids>,
    asks: OrderBookSide<Asks>,
}

impl OrderBook {
    /// Construct a new sorted [`OrderBook`].
    ///
    /// Note that the passed bid and ask levels do not need to be pre-sorted.
    pub fn new<IterBids, IterAsks, L>(
        last_ts: Option<u64>,
        last_seq: Option<u64>,
        bids: IterBids,
        asks: IterAsks,
    ) -> Self
    where
        IterBids: IntoIterator<Item = L>,
        IterAsks: IntoIterator<Item = L>,
        L: Into<Level>,
    {
        Self {
            last_ts,
            last_seq,
            bids: OrderBookSide::bids(bids),
            asks: OrderBookSide::asks(asks),
        }
    }

    /// Timestamp of the last applied [`DepthDiff`].
    pub fn last_ts(&self) -> Option<u64> {
        self.last_ts
    }

    /// Sequence of the last applied [`DepthDiff`] that carried one.
    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    /// Apply a [`DepthDiff`] to the local book, returning the applied [`LevelUpdate`]s in
    /// diff order.
    ///
    /// Each level is set when `qty > 0` and deleted when `qty == 0`.
    pub fn apply_diff(&mut self, diff: &DepthDiff) -> Vec<LevelUpdate> {
        self.last_ts = Some(diff.ts);
        if diff.seq.is_some() {
            self.last_seq = diff.seq;
        }

        let mut updates = Vec::with_capacity(diff.bids.len() + diff.asks.len());
        for level in &diff.bids {
            self.bids.upsert_single(*level);
            updates.push(LevelUpdate {
                side: Side::Buy,
                level: *level,
            });
        }
        for level in &diff.asks {
            self.asks.upsert_single(*level);
            updates.push(LevelUpdate {
                side: Side::Sell,
                level: *level,
            });
        }

        updates
    }

    /// Best bid - the maximum price with positive quantity.
    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.best()
    }

    /// Best ask - the minimum price with positive quantity.
    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.best()
    }

    /// Return a reference to this [`OrderBook`]s bids (sorted descending).
    pub fn bids(&self) -> &OrderBookSide<Bids> {
        &self.bids
    }

    /// Return a reference to this [`OrderBook`]s asks (sorted ascending).
    pub fn asks(&self) -> &OrderBookSide<Asks> {
        &self.asks
    }

    /// Mid-price of the best bid and ask, integer-truncated.
    pub fn mid_price(&self) -> Option<Price> {
        match (self.bids.best(), self.asks.best()) {
            (Some(bid), Some(ask)) => Some(Price::from_raw((bid.price.raw() + ask.price.raw()) / 2)),
            (Some(bid), None) => Some(bid.price),
            (None, Some(ask)) => Some(ask.price),
            (None, None) => None,
        }
    }

    /// Generate a sorted [`BookSnapshot`] with an optional maximum depth per side.
    pub fn snapshot(&self, depth: Option<usize>) -> BookSnapshot {
        let depth = depth.unwrap_or(usize::MAX);
        BookSnapshot {
            ts: self.last_ts,
            seq: self.last_seq,
            bids: self.bids.levels().iter().take(depth).copied().collect(),
            asks: self.asks.levels().iter().take(depth).copied().collect(),
        }
    }
}

/// Point-in-time export of the top-N [`OrderBook`] levels.
///
/// Bids are sorted descending and asks ascending, ie/ best price first on both sides.
#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct BookSnapshot {
    pub ts: Option<u64>,
    pub seq: Option<u64>,
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
}

impl BookSnapshot {
    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.first()
    }
}

/// Normalised [`Level`]s for one side of the [`OrderBook`].
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct OrderBookSide<S> {
    #[serde(skip)]
    side: std::marker::PhantomData<S>,
    levels: Vec<Level>,
}

/// Unit type to tag an [`OrderBookSide`] as the bid side (ie/ buyers) of an [`OrderBook`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize)]
pub struct Bids;

/// Unit type to tag an [`OrderBookSide`] as the ask side (ie/ sellers) of an [`OrderBook`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize)]
pub struct Asks;

/// Defines the price ordering of one book side.
pub trait SideOrder {
    /// Ordering of `existing` relative to `candidate` in this side's sort order.
    fn cmp_prices(existing: Price, candidate: Price) -> Ordering;
}

impl SideOrder for Bids {
    fn cmp_prices(existing: Price, candidate: Price) -> Ordering {
        existing.cmp(&candidate).reverse()
    }
}

impl SideOrder for Asks {
    fn cmp_prices(existing: Price, candidate: Price) -> Ordering {
        existing.cmp(&candidate)
    }
}

impl OrderBookSide<Bids> {
    /// Construct a new [`OrderBookSide<Bids>`] from the provided [`Level`]s.
    pub fn bids<Iter, L>(levels: Iter) -> Self
    where
        Iter: IntoIterator<Item = L>,
        L: Into<Level>,
    {
        let mut levels = levels.into_iter().map(L::into).collect::<Vec<_>>();
        levels.sort_unstable_by(|a, b| a.price.cmp(&b.price).reverse());

        Self {
            side: std::marker::PhantomData,
            levels,
        }
    }
}

impl OrderBookSide<Asks> {
    /// Construct a new [`OrderBookSide<Asks>`] from the provided [`Level`]s.
    pub fn asks<Iter, L>(levels: Iter) -> Self
    where
        Iter: IntoIterator<Item = L>,
        L: Into<Level>,
    {
        let mut levels = levels.into_iter().map(L::into).collect::<Vec<_>>();
        levels.sort_unstable_by(|a, b| a.price.cmp(&b.price));

        Self {
            side: std::marker::PhantomData,
            levels,
        }
    }
}

impl<S> OrderBookSide<S>
where
    S: SideOrder,
{
    /// Get the best [`Level`] on this [`OrderBookSide`].
    pub fn best(&self) -> Option<&Level> {
        self.levels.first()
    }

    /// Return a reference to the [`OrderBookSide`] levels, best price first.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Upsert a single [`Level`] into this [`OrderBookSide`].
    ///
    /// ### Upsert Scenarios
    /// #### 1 Level Already Exists
    /// 1a) New qty is 0, remove the level
    /// 1b) New qty is > 0, replace the level
    ///
    /// #### 2 Level Does Not Exist
    /// 2a) New qty is 0, nothing to remove - continue
    /// 2b) New qty is > 0, insert the new level
    pub fn upsert_single(&mut self, new_level: Level) {
        let search = self
            .levels
            .binary_search_by(|existing| S::cmp_prices(existing.price, new_level.price));

        match (search, new_level.qty.is_zero()) {
            (Ok(index), true) => {
                let _removed = self.levels.remove(index);
            }
            (Ok(index), false) => {
                self.levels[index].qty = new_level.qty;
            }
            (Err(_), true) => {}
            (Err(index), false) => {
                self.levels.insert(index, new_level);
            }
        }
    }
}

impl<S> Default for OrderBookSide<S> {
    fn default() -> Self {
        Self {
            side: std::marker::PhantomData,
            levels: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeforge_instrument::asset::Symbol;

    fn level(price: &str, qty: &str, scale: u32) -> Level {
        Level::new(
            Price::parse(price, scale).unwrap(),
            Qty::parse(qty, scale).unwrap(),
        )
    }

    #[test]
    fn test_upsert_single() {
        struct TestCase {
            book_side: OrderBookSide<Bids>,
            new_level: Level,
            expected: OrderBookSide<Bids>,
        }

        let tests = vec![
            TestCase {
                // TC0: Level exists & new qty is 0 => remove Level
                book_side: OrderBookSide::bids(vec![
                    level("80", "1", 0),
                    level("90", "1", 0),
                    level("100", "1", 0),
                ]),
                new_level: level("100", "0", 0),
                expected: OrderBookSide::bids(vec![level("80", "1", 0), level("90", "1", 0)]),
            },
            TestCase {
                // TC1: Level exists & new qty is > 0 => replace Level
                book_side: OrderBookSide::bids(vec![
                    level("80", "1", 0),
                    level("90", "1", 0),
                    level("100", "1", 0),
                ]),
                new_level: level("100", "10", 0),
                expected: OrderBookSide::bids(vec![
                    level("80", "1", 0),
                    level("90", "1", 0),
                    level("100", "10", 0),
                ]),
            },
            TestCase {
                // TC2: Level does not exist & new qty > 0 => insert new Level
                book_side: OrderBookSide::bids(vec![
                    level("80", "1", 0),
                    level("90", "1", 0),
                    level("100", "1", 0),
                ]),
                new_level: level("110", "1", 0),
                expected: OrderBookSide::bids(vec![
                    level("80", "1", 0),
                    level("90", "1", 0),
                    level("100", "1", 0),
                    level("110", "1", 0),
                ]),
            },
            TestCase {
                // TC3: Level does not exist & new qty is 0 => no change
                book_side: OrderBookSide::bids(vec![
                    level("80", "1", 0),
                    level("90", "1", 0),
                    level("100", "1", 0),
                ]),
                new_level: level("110", "0", 0),
                expected: OrderBookSide::bids(vec![
                    level("80", "1", 0),
                    level("90", "1", 0),
                    level("100", "1", 0),
                ]),
            },
        ];

        for (index, mut test) in tests.into_iter().enumerate() {
            test.book_side.upsert_single(test.new_level);
            assert_eq!(test.book_side, test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_apply_diff_snapshot() {
        // prices at scale 1, quantities at scale 1
        let symbol = Symbol::new("btcusdt");
        let mut book = OrderBook::default();

        let diff_10 = DepthDiff {
            ts: 1000,
            symbol: symbol.clone(),
            bids: vec![level("100", "1", 1), level("99.5", "2", 1)],
            asks: vec![level("101", "1.5", 1), level("102", "3", 1)],
            seq: Some(10),
        };
        let diff_11 = DepthDiff {
            ts: 2000,
            symbol,
            bids: vec![level("100", "0", 1), level("98.5", "4", 1)],
            asks: vec![level("101", "1", 1)],
            seq: Some(11),
        };

        book.apply_diff(&diff_10);
        let updates = book.apply_diff(&diff_11);
        assert_eq!(updates.len(), 3);

        let snapshot = book.snapshot(Some(10));
        assert_eq!(snapshot.seq, Some(11));
        assert_eq!(snapshot.ts, Some(2000));
        assert_eq!(snapshot.best_bid(), Some(&level("99.5", "2", 1)));
        assert_eq!(snapshot.best_ask(), Some(&level("101", "1", 1)));

        // full sorted sides: bids DESC, asks ASC
        assert_eq!(
            snapshot.bids,
            vec![level("99.5", "2", 1), level("98.5", "4", 1)]
        );
        assert_eq!(
            snapshot.asks,
            vec![level("101", "1", 1), level("102", "3", 1)]
        );
    }

    #[test]
    fn test_snapshot_depth_limit() {
        let book = OrderBook::new(
            Some(1),
            Some(1),
            vec![level("100", "1", 0), level("99", "1", 0), level("98", "1", 0)],
            vec![level("101", "1", 0), level("102", "1", 0)],
        );

        let snapshot = book.snapshot(Some(2));
        assert_eq!(snapshot.bids.len(), 2);
        assert_eq!(snapshot.asks.len(), 2);
        assert_eq!(snapshot.best_bid().unwrap().price, Price::parse("100", 0).unwrap());
    }

    #[test]
    fn test_bulk_update_performance() {
        // 100k updates across alternating price bands with ~4% deletions
        let symbol = Symbol::new("btcusdt");
        let mut book = OrderBook::default();

        let started = std::time::Instant::now();
        for index in 0u64..100_000 {
            let band = index % 500;
            let qty = if index % 25 == 0 { 0 } else { 1 + (index % 7) };
            let diff = DepthDiff {
                ts: index,
                symbol: symbol.clone(),
                bids: vec![Level::new(
                    Price::from_raw(1_000_000 - band),
                    Qty::from_raw(qty),
                )],
                asks: vec![Level::new(
                    Price::from_raw(1_000_001 + band),
                    Qty::from_raw(qty),
                )],
                seq: Some(index),
            };
            book.apply_diff(&diff);
        }

        let elapsed = started.elapsed();
        assert!(
            elapsed < std::time::Duration::from_millis(500),
            "100k updates took {elapsed:?}"
        );
        assert_eq!(book.last_seq(), Some(99_999));
    }
}
