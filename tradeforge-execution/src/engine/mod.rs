use crate::{
    ExecutionError,
    balance::{Accounts, Balance},
    engine::{
        bus::{EngineEvent, EventBus},
        gate::ConservativeGate,
        options::{EngineOptions, ParticipationFactor},
        planner::plan,
    },
    order::{Order, OrderId, OrderKind, OrderSubmit},
    report::{ExecutionReport, Fill, Liquidity},
    snapshot::{EngineSnapshot, SerializedExchangeState},
};
use tradeforge_data::{
    books::{DepthDiff, OrderBook},
    event::MergedEvent,
    trade::Trade,
};
use tradeforge_instrument::{
    Side,
    asset::Asset,
    fixed::{Amount, Price, Qty},
};
use tracing::{debug, info};

/// The synchronous engine event bus and its subscriber contract.
pub mod bus;

/// Conservative LIMIT admission from recent trade prints.
pub mod gate;

/// Engine configuration.
pub mod options;

/// Liquidity walks over book snapshots.
pub mod planner;

/// The deterministic matching engine of one single-symbol run.
///
/// Owns the order store, the local L2 book and the account ledger; all three are mutated only
/// from this engine's methods. Consumes [`MergedEvent`]s in timeline order and surfaces fills
/// through both the [`EventBus`] and the buffered [`ExecutionReport`] stream.
#[derive(Debug)]
pub struct Engine {
    options: EngineOptions,
    book: OrderBook,
    store: crate::order::store::OrderStore,
    accounts: Accounts,
    gate: ConservativeGate,
    bus: EventBus,
    reports: Vec<ExecutionReport>,
    now: u64,
    closed: bool,
}

impl Engine {
    /// Construct a new [`Engine`] with empty state.
    pub fn new(options: EngineOptions) -> Self {
        let gate = ConservativeGate::new(options.conservative);
        Self {
            options,
            book: OrderBook::default(),
            store: crate::order::store::OrderStore::default(),
            accounts: Accounts::default(),
            gate,
            bus: EventBus::new(),
            reports: Vec::new(),
            now: 0,
            closed: false,
        }
    }

    /// Rehydrate an [`Engine`] from snapshot parts. Applies `state` (the account ledger) and
    /// then `engine` (orders, gate, book).
    pub fn restore(engine: EngineSnapshot, state: SerializedExchangeState) -> Self {
        let gate = ConservativeGate::from_parts(
            engine.options.conservative,
            engine.gate_last_buy,
            engine.gate_last_sell,
        );

        Self {
            gate,
            book: engine.book,
            store: crate::order::store::OrderStore::from_parts(
                engine.orders,
                engine.order_sequence,
            ),
            accounts: state.accounts,
            options: engine.options,
            bus: EventBus::new(),
            reports: Vec::new(),
            now: engine.now,
            closed: false,
        }
    }

    /// Export the serializable matching-engine snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            options: self.options.clone(),
            orders: self.store.orders().cloned().collect(),
            order_sequence: self.store.sequence(),
            gate_last_buy: self.gate.recent(Side::Buy),
            gate_last_sell: self.gate.recent(Side::Sell),
            book: self.book.clone(),
            now: self.now,
        }
    }

    /// Export the serializable account ledger.
    pub fn state(&self) -> SerializedExchangeState {
        SerializedExchangeState {
            accounts: self.accounts.clone(),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        self.store.get(order_id)
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    /// Timestamp of the last consumed event (sim ms).
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Credit an external deposit; the only balance mutation a host may request directly.
    pub fn deposit(
        &mut self,
        account: &crate::balance::AccountId,
        currency: &Asset,
        amount: Amount,
    ) -> Result<Balance, ExecutionError> {
        self.accounts.deposit(account, currency, amount)
    }

    /// Close the engine: in-flight processing completes, subsequent order operations fail with
    /// [`ExecutionError::EngineClosed`].
    pub fn close(&mut self) {
        info!("engine closed");
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Place an order.
    ///
    /// LIMIT BUY placement locks the notional at the limit price, LIMIT SELL locks the base
    /// quantity. MARKET orders execute immediately against the current book snapshot; any
    /// unfillable remainder is cancelled, or the whole order rejected when
    /// `reject_on_exhausted_liquidity` is set.
    pub fn place_order(&mut self, submit: OrderSubmit, ts: u64) -> Result<Order, ExecutionError> {
        if self.closed {
            return Err(ExecutionError::EngineClosed);
        }

        // admission lock; a LIMIT without a price locks nothing and is never admitted to fill
        match (submit.kind, submit.side, submit.price) {
            (OrderKind::Limit, Side::Buy, Some(price)) => {
                let notional = price.notional(submit.qty, self.options.scales.qty_scale)?;
                self.accounts
                    .lock(&submit.account, &self.options.market.quote, notional)?;
            }
            (OrderKind::Limit, Side::Sell, _) => {
                self.accounts.lock(
                    &submit.account,
                    &self.options.market.base,
                    Amount::from(submit.qty),
                )?;
            }
            _ => {}
        }

        let order = self.store.create(submit, ts)?.clone();
        self.now = self.now.max(ts);
        self.bus.publish(&EngineEvent::OrderAccepted(order.clone()));
        debug!(order_id = %order.id, kind = %order.kind, side = %order.side, "order accepted");

        if order.kind == OrderKind::Market {
            return self.execute_market(order, ts);
        }
        Ok(order)
    }

    /// Cancel an active order, unlocking the remainder of its admission lock.
    pub fn cancel_order(&mut self, order_id: &OrderId, ts: u64) -> Result<Order, ExecutionError> {
        if self.closed {
            return Err(ExecutionError::EngineClosed);
        }

        let order = self
            .store
            .get(order_id)
            .cloned()
            .ok_or_else(|| ExecutionError::OrderUnknown {
                order_id: order_id.clone(),
            })?;

        self.release_remainder(&order)?;
        let cancelled = self.store.cancel(order_id, ts)?;
        self.reports.push(ExecutionReport::order_updated(&cancelled));
        self.bus
            .publish(&EngineEvent::OrderCancelled(cancelled.clone()));
        Ok(cancelled)
    }

    /// Consume one merged timeline event, returning the [`ExecutionReport`]s it produced.
    pub fn process(&mut self, event: &MergedEvent) -> Result<Vec<ExecutionReport>, ExecutionError> {
        self.now = event.ts();
        match event {
            MergedEvent::Depth(event) => self.on_depth(&event.kind)?,
            MergedEvent::Trade(event) => self.on_trade(&event.kind)?,
        }
        Ok(self.drain_reports())
    }

    /// Drain the buffered host-facing reports (placement fills included).
    pub fn drain_reports(&mut self) -> Vec<ExecutionReport> {
        std::mem::take(&mut self.reports)
    }

    fn on_depth(&mut self, diff: &DepthDiff) -> Result<(), ExecutionError> {
        for update in self.book.apply_diff(diff) {
            self.bus.publish(&EngineEvent::LevelUpdated(update));
        }

        // re-run admission over the pending limit orders now that the book moved; in basic
        // mode limit orders keep awaiting trade prints, so a qualifying book is only noted
        for side in [Side::Buy, Side::Sell] {
            let best_opposing = match side {
                Side::Buy => self.book.best_ask(),
                Side::Sell => self.book.best_bid(),
            }
            .map(|level| level.price);

            let Some(best) = best_opposing else { continue };
            for order in self.store.pending_for_side(side) {
                if order.crosses_limit_price(best) && self.gate.is_allowed(order, self.now) {
                    debug!(
                        order_id = %order.id,
                        best = %best,
                        "book crosses pending limit; maker execution deferred to trade prints"
                    );
                }
            }
        }
        Ok(())
    }

    fn on_trade(&mut self, trade: &Trade) -> Result<(), ExecutionError> {
        self.gate.update_trade(trade);
        self.bus.publish(&EngineEvent::TradeSeen(trade.clone()));

        if self.options.participation_factor == ParticipationFactor::Disabled {
            return Ok(());
        }

        // shared cap: one trade's quantity may only be consumed once across resting orders
        let mut cap = trade.qty;
        if cap.is_zero() {
            return Ok(());
        }

        let aggressor = trade.aggressor.or(trade.side);
        let sides = match aggressor {
            Some(aggressor) => vec![aggressor.opposite()],
            None => vec![Side::Buy, Side::Sell],
        };

        for side in sides {
            // matching order within one trade event: ts_created asc, id lexicographic asc
            let mut candidates = self
                .store
                .pending_for_side(side)
                .iter()
                .map(|order| (order.ts_created, order.id.clone()))
                .collect::<Vec<_>>();
            candidates.sort();

            for (_, order_id) in candidates {
                if cap.is_zero() {
                    break;
                }

                let Some(order) = self.store.get(&order_id) else {
                    continue;
                };
                if !order.status.is_active()
                    || !order.crosses_limit_price(trade.price)
                    || !self.gate.is_allowed(order, self.now)
                {
                    continue;
                }
                let order = order.clone();

                let snapshot = self.book.snapshot(None);
                let planned = plan(&order, &snapshot, self.options.max_slippage_levels);
                let liquidity = self.liquidity_for(&order, aggressor);

                let mut budget = Qty::from_raw(cap.raw().min(order.remaining_qty.raw()));
                for level in planned.levels {
                    if budget.is_zero() {
                        break;
                    }
                    let take = Qty::from_raw(level.qty.raw().min(budget.raw()));
                    self.fill_order(
                        &order_id,
                        level.price,
                        take,
                        trade.ts,
                        liquidity,
                        trade.id.clone(),
                        aggressor,
                    )?;
                    budget = budget.saturating_sub(take);
                    cap = cap.saturating_sub(take);
                }
            }
        }
        Ok(())
    }

    fn execute_market(&mut self, order: Order, ts: u64) -> Result<Order, ExecutionError> {
        let snapshot = self.book.snapshot(None);
        let planned = plan(&order, &snapshot, self.options.max_slippage_levels);

        if planned.exhausted && self.options.reject_on_exhausted_liquidity {
            if let Some(rejected) = self.store.reject(&order.id, ts) {
                self.reports.push(ExecutionReport::order_updated(&rejected));
                self.bus.publish(&EngineEvent::OrderRejected(rejected));
            }
            return Err(ExecutionError::LiquidityExhausted);
        }

        let liquidity = self.liquidity_for(&order, None);
        for level in planned.levels {
            if let Err(error) =
                self.fill_order(&order.id, level.price, level.qty, ts, liquidity, None, None)
            {
                if let Some(rejected) = self.store.reject(&order.id, ts) {
                    self.reports.push(ExecutionReport::order_updated(&rejected));
                    self.bus.publish(&EngineEvent::OrderRejected(rejected));
                }
                return Err(error);
            }
        }

        // market orders never rest: cancel any unfillable remainder
        let current = self
            .store
            .get(&order.id)
            .cloned()
            .ok_or_else(|| ExecutionError::OrderUnknown {
                order_id: order.id.clone(),
            })?;
        if current.status.is_active() {
            let cancelled = self.store.cancel(&order.id, ts)?;
            self.reports.push(ExecutionReport::order_updated(&cancelled));
            self.bus
                .publish(&EngineEvent::OrderCancelled(cancelled.clone()));
            return Ok(cancelled);
        }
        Ok(current)
    }

    fn liquidity_for(&self, order: &Order, aggressor: Option<Side>) -> Liquidity {
        if self.options.use_aggressor_for_liquidity
            && let Some(aggressor) = aggressor
        {
            return if aggressor == order.side {
                Liquidity::Taker
            } else {
                Liquidity::Maker
            };
        }

        match order.kind {
            OrderKind::Limit if self.options.treat_limit_as_maker => Liquidity::Maker,
            OrderKind::Limit | OrderKind::Market => Liquidity::Taker,
        }
    }

    /// Generate one fill: settle balances, accrue fees, transition the order, publish.
    ///
    /// Balance updates strictly precede the `OrderFilled` emission.
    fn fill_order(
        &mut self,
        order_id: &OrderId,
        price: Price,
        qty: Qty,
        ts: u64,
        liquidity: Liquidity,
        trade_ref: Option<smol_str::SmolStr>,
        source_aggressor: Option<Side>,
    ) -> Result<(), ExecutionError> {
        let order = self
            .store
            .get(order_id)
            .cloned()
            .ok_or_else(|| ExecutionError::OrderUnknown {
                order_id: order_id.clone(),
            })?;

        let qty_scale = self.options.scales.qty_scale;
        let notional = price.notional(qty, qty_scale)?;
        let bps = match liquidity {
            Liquidity::Maker => self.options.fee.maker_bps,
            Liquidity::Taker => self.options.fee.taker_bps,
        };
        let fee = notional.fee_bps(bps)?;

        let base = self.options.market.base.clone();
        let quote = self.options.market.quote.clone();

        match order.side {
            Side::Buy => {
                match (order.kind, order.price) {
                    (OrderKind::Limit, Some(limit)) => {
                        // the lock was taken at the limit price; consume the fill notional and
                        // release the price-improvement difference back to free
                        let locked_portion = limit.notional(qty, qty_scale)?;
                        self.accounts.spend_locked(&order.account, &quote, notional)?;
                        let excess = locked_portion.checked_sub(notional)?;
                        if !excess.is_zero() {
                            self.accounts.unlock(&order.account, &quote, excess)?;
                        }
                    }
                    _ => {
                        self.accounts.withdraw(&order.account, &quote, notional)?;
                    }
                }
                self.accounts.debit_fee(&order.account, &quote, fee)?;
                self.accounts
                    .deposit(&order.account, &base, Amount::from(qty))?;
            }
            Side::Sell => {
                match (order.kind, order.price) {
                    (OrderKind::Limit, Some(_)) => {
                        self.accounts
                            .spend_locked(&order.account, &base, Amount::from(qty))?;
                    }
                    _ => {
                        self.accounts
                            .withdraw(&order.account, &base, Amount::from(qty))?;
                    }
                }
                self.accounts.deposit(&order.account, &quote, notional)?;
                self.accounts.debit_fee(&order.account, &quote, fee)?;
            }
        }

        self.store
            .accrue_fee(order_id, liquidity == Liquidity::Maker, fee)?;
        let updated = self.store.apply_fill(order_id, qty, ts)?;

        let fill = Fill {
            ts,
            order_id: order_id.clone(),
            price,
            qty,
            side: order.side,
            liquidity,
            trade_ref,
            source_aggressor,
        };

        debug!(
            order_id = %order_id,
            price = %price,
            qty = %qty,
            ?liquidity,
            "fill generated"
        );

        self.reports.push(ExecutionReport::fill(fill.clone()));
        self.reports.push(ExecutionReport::order_updated(&updated));
        self.bus.publish(&EngineEvent::OrderFilled {
            order: updated.clone(),
            fill,
        });
        self.bus.publish(&EngineEvent::OrderUpdated(updated));
        Ok(())
    }

    /// Unlock whatever admission lock remains on an order leaving the active set.
    fn release_remainder(&mut self, order: &Order) -> Result<(), ExecutionError> {
        if order.remaining_qty.is_zero() {
            return Ok(());
        }

        match (order.kind, order.side, order.price) {
            (OrderKind::Limit, Side::Buy, Some(limit)) => {
                let remainder =
                    limit.notional(order.remaining_qty, self.options.scales.qty_scale)?;
                self.accounts
                    .unlock(&order.account, &self.options.market.quote, remainder)?;
            }
            (OrderKind::Limit, Side::Sell, _) => {
                self.accounts.unlock(
                    &order.account,
                    &self.options.market.base,
                    Amount::from(order.remaining_qty),
                )?;
            }
            _ => {}
        }
        Ok(())
    }
}
