use crate::{
    ExecutionError,
    order::{Order, OrderFees, OrderId, OrderKind, OrderStatus, OrderSubmit},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tradeforge_instrument::{Side, fixed::Qty};
use tracing::debug;

/// Id-keyed owner of all orders, with per-side pending sets of LIMIT orders awaiting a
/// qualifying trade print.
///
/// The pending sets are maintained eagerly by every lifecycle transition; they always list
/// active, still-awaiting orders in acceptance (`sequence`) order.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrderStore {
    orders: IndexMap<OrderId, Order>,
    pending_buys: Vec<OrderId>,
    pending_sells: Vec<OrderId>,
    sequence: u64,
}

impl OrderStore {
    /// Insert a new OPEN order built from the placement request.
    ///
    /// LIMIT orders join the pending set of their side awaiting a qualifying trade.
    pub fn create(&mut self, submit: OrderSubmit, accepted_ts: u64) -> Result<&Order, ExecutionError> {
        if self.orders.contains_key(&submit.id) {
            return Err(ExecutionError::OrderIdTaken {
                order_id: submit.id,
            });
        }

        self.sequence += 1;
        let order = Order {
            id: submit.id.clone(),
            client_id: submit.client_id,
            account: submit.account,
            kind: submit.kind,
            side: submit.side,
            qty: submit.qty,
            price: submit.price,
            ts_created: accepted_ts,
            status: OrderStatus::Open,
            remaining_qty: submit.qty,
            filled_qty: Qty::ZERO,
            awaiting_trade: submit.kind == OrderKind::Limit,
            sequence: self.sequence,
            last_update_ts: accepted_ts,
            fees: OrderFees::default(),
        };

        if order.awaiting_trade {
            self.pending_mut(order.side).push(order.id.clone());
        }

        let id = submit.id;
        self.orders.insert(id.clone(), order);
        Ok(&self.orders[&id])
    }

    /// Cancel an order: CANCELLED, remaining zeroed, removed from its pending set.
    pub fn cancel(&mut self, order_id: &OrderId, ts: u64) -> Result<Order, ExecutionError> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ExecutionError::OrderUnknown {
                order_id: order_id.clone(),
            })?;

        order.status = OrderStatus::Cancelled;
        order.remaining_qty = Qty::ZERO;
        order.awaiting_trade = false;
        order.last_update_ts = ts;
        let order = order.clone();

        self.remove_pending(order.side, order_id);
        Ok(order)
    }

    /// Reject an order; short-circuits silently when the id is unknown.
    pub fn reject(&mut self, order_id: &OrderId, ts: u64) -> Option<Order> {
        let Some(order) = self.orders.get_mut(order_id) else {
            debug!(%order_id, "reject of unknown order ignored");
            return None;
        };

        order.status = OrderStatus::Rejected;
        order.remaining_qty = Qty::ZERO;
        order.awaiting_trade = false;
        order.last_update_ts = ts;
        let order = order.clone();

        self.remove_pending(order.side, order_id);
        Some(order)
    }

    /// Apply a fill of `qty` to an order, clamping the remainder at zero.
    ///
    /// A fully consumed order transitions to FILLED and leaves its pending set; any remainder
    /// keeps it PARTIALLY_FILLED.
    pub fn apply_fill(
        &mut self,
        order_id: &OrderId,
        qty: Qty,
        ts: u64,
    ) -> Result<Order, ExecutionError> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ExecutionError::OrderUnknown {
                order_id: order_id.clone(),
            })?;

        order.remaining_qty = order.remaining_qty.saturating_sub(qty);
        order.filled_qty = order.filled_qty.checked_add(qty)?;
        order.last_update_ts = ts;

        if order.remaining_qty.is_zero() {
            order.status = OrderStatus::Filled;
            order.awaiting_trade = false;
        } else {
            order.status = OrderStatus::PartiallyFilled;
        }
        let order = order.clone();

        if order.status == OrderStatus::Filled {
            self.remove_pending(order.side, order_id);
        }
        Ok(order)
    }

    /// Accrue a maker or taker fee onto an order.
    pub fn accrue_fee(
        &mut self,
        order_id: &OrderId,
        maker: bool,
        amount: tradeforge_instrument::fixed::Amount,
    ) -> Result<(), ExecutionError> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ExecutionError::OrderUnknown {
                order_id: order_id.clone(),
            })?;

        if maker {
            order.fees.maker = order.fees.maker.checked_add(amount)?;
        } else {
            order.fees.taker = order.fees.taker.checked_add(amount)?;
        }
        Ok(())
    }

    /// Active, still-awaiting LIMIT orders of one side, FIFO by acceptance.
    pub fn pending_for_side(&self, side: Side) -> Vec<&Order> {
        self.pending(side)
            .iter()
            .filter_map(|id| self.orders.get(id))
            .filter(|order| order.status.is_active() && order.awaiting_trade)
            .collect()
    }

    /// Return a reference to the order with the provided id.
    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// Iterate all orders in insertion order.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Number of orders ever accepted into the store.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// The store-local acceptance counter.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Rebuild a store from snapshot parts, reconstructing the pending sets from order state.
    pub fn from_parts(orders: Vec<Order>, sequence: u64) -> Self {
        let mut store = Self {
            orders: orders
                .into_iter()
                .map(|order| (order.id.clone(), order))
                .collect(),
            pending_buys: vec![],
            pending_sells: vec![],
            sequence,
        };

        let mut pending = store
            .orders
            .values()
            .filter(|order| order.status.is_active() && order.awaiting_trade)
            .map(|order| (order.sequence, order.side, order.id.clone()))
            .collect::<Vec<_>>();
        pending.sort_by_key(|(sequence, _, _)| *sequence);

        for (_, side, id) in pending {
            store.pending_mut(side).push(id);
        }
        store
    }

    fn pending(&self, side: Side) -> &Vec<OrderId> {
        match side {
            Side::Buy => &self.pending_buys,
            Side::Sell => &self.pending_sells,
        }
    }

    fn pending_mut(&mut self, side: Side) -> &mut Vec<OrderId> {
        match side {
            Side::Buy => &mut self.pending_buys,
            Side::Sell => &mut self.pending_sells,
        }
    }

    fn remove_pending(&mut self, side: Side, order_id: &OrderId) {
        self.pending_mut(side).retain(|id| id != order_id);
    }
}
