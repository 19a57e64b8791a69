//! A single price rung: a FIFO queue of resting orders sharing one (price, side).

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::order::{Order, OrderId, OrderStatus, Side};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

/// Outcome of sweeping a taker against one [`Level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The taker is fully filled; the caller (`Book::match`) should stop the sweep.
    Complete,
    /// The level ran dry before the taker filled; the caller should try the next level.
    Continuation,
}

/// FIFO queue of orders resting at a fixed price on a fixed side.
///
/// Orders are referenced by [`OrderId`]; the backing [`Order`] lives in the engine's
/// id-indexed arena (`engine::Engine::orders`), so `Level` never owns or clones an
/// `Order` directly. Head-of-queue wins within a level: arrival order into the
/// `VecDeque` *is* time priority.
#[derive(Debug)]
pub struct Level {
    pub price: Decimal,
    pub side: Side,
    orders: VecDeque<OrderId>,
}

impl Level {
    pub fn new(price: Decimal, side: Side) -> Self {
        Level {
            price,
            side,
            orders: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderId> {
        self.orders.iter()
    }

    /// Appends `order` to the tail of the queue.
    ///
    /// Precondition (enforced, not merely asserted, since a mismatched price/side
    /// indicates a caller bug in `Book::add`'s level lookup): `order.price == self.price`
    /// and `order.side == self.side`.
    pub fn add(&mut self, order: &Order) -> Result<(), EngineError> {
        if order.price != self.price || order.side != self.side {
            return Err(EngineError::Precondition(format!(
                "order {} at price {} side {:?} does not belong on level {} side {:?}",
                order.id, order.price, order.side, self.price, self.side
            )));
        }
        self.orders.push_back(order.id);
        Ok(())
    }

    /// Returns true iff `taker` is marketable against this rung.
    ///
    /// Uniform check: `taker.price * taker.side_sign >= level.price * taker.side_sign`
    /// (both terms scaled by the *taker's* sign, per the reference implementation).
    /// For a Sell-side level (offers), a Buy taker must bid at or above the level
    /// price; for a Buy-side level (bids), a Sell taker must offer at or below it.
    pub fn can_match(&self, taker: &Order) -> bool {
        debug_assert_ne!(taker.side, self.side, "taker must be on the opposite side");
        let sign = Decimal::from(taker.side.sign());
        taker.price * sign >= self.price * sign
    }

    /// Sweeps `taker` against the resting queue, filling head-of-queue makers first.
    ///
    /// `taker` is owned by the caller (not yet resident in `arena`); makers are
    /// resolved from `arena` by id, so there is never an aliasing conflict between
    /// the two mutable borrows.
    pub fn match_taker(
        &mut self,
        taker: &mut Order,
        arena: &mut HashMap<OrderId, Order>,
        config: &EngineConfig,
    ) -> MatchOutcome {
        while let Some(&maker_id) = self.orders.front() {
            let maker = arena
                .get_mut(&maker_id)
                .expect("level holds an order id no longer present in the engine's arena");

            let trade_qty = taker.leaves_qty.min(maker.leaves_qty);
            taker.fill(trade_qty, self.price, config);
            maker.fill(trade_qty, self.price, config);

            tracing::info!(
                level_price = %self.price,
                taker_id = %taker.id,
                maker_id = %maker.id,
                qty = %trade_qty,
                "matched"
            );

            if maker.status == OrderStatus::Filled {
                self.orders.pop_front();
            }

            if taker.is_filled() {
                return MatchOutcome::Complete;
            }
        }
        MatchOutcome::Continuation
    }

    /// Removes `order_id` from the queue. Fails if not present.
    pub fn cancel(&mut self, order_id: OrderId) -> Result<(), EngineError> {
        match self.orders.iter().position(|&id| id == order_id) {
            Some(pos) => {
                self.orders.remove(pos);
                Ok(())
            }
            None => Err(EngineError::Precondition(format!(
                "order {order_id} not found on level {} side {:?}",
                self.price, self.side
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Order;
    use rust_decimal_macros::dec;

    #[test]
    fn add_rejects_price_mismatch() {
        let mut lv = Level::new(dec!(12.3), Side::Sell);
        let order = Order::new(OrderId(1), Side::Sell, dec!(12.4), dec!(100));
        assert!(lv.add(&order).is_err());
    }

    #[test]
    fn add_rejects_side_mismatch() {
        let mut lv = Level::new(dec!(12.3), Side::Buy);
        let order = Order::new(OrderId(1), Side::Sell, dec!(12.3), dec!(100));
        assert!(lv.add(&order).is_err());
    }

    #[test]
    fn add_accepts_matching_order() {
        let mut lv = Level::new(dec!(12.3), Side::Sell);
        let order = Order::new(OrderId(1), Side::Sell, dec!(12.3), dec!(100));
        lv.add(&order).unwrap();
        assert_eq!(lv.len(), 1);
    }

    #[test]
    fn can_match_buy_level_against_sell_taker() {
        let mut lv = Level::new(dec!(12.3), Side::Buy);
        let maker = Order::new(OrderId(1), Side::Buy, dec!(12.3), dec!(40));
        lv.add(&maker).unwrap();
        let taker = Order::new(OrderId(2), Side::Sell, dec!(12.2), dec!(100));
        assert!(lv.can_match(&taker));
        let no_match = Order::new(OrderId(3), Side::Sell, dec!(12.5), dec!(100));
        assert!(!lv.can_match(&no_match));
    }

    #[test]
    fn match_taker_fills_head_first_and_leaves_partial_maker_at_head() {
        let mut arena = HashMap::new();
        let m1 = Order::new(OrderId(1), Side::Sell, dec!(100), dec!(4));
        let m2 = Order::new(OrderId(2), Side::Sell, dec!(100), dec!(6));
        arena.insert(m1.id, m1);
        arena.insert(m2.id, m2);

        let mut lv = Level::new(dec!(100), Side::Sell);
        lv.add(arena.get(&OrderId(1)).unwrap()).unwrap();
        lv.add(arena.get(&OrderId(2)).unwrap()).unwrap();

        let mut taker = Order::new(OrderId(3), Side::Buy, dec!(100), dec!(9));
        let outcome = lv.match_taker(&mut taker, &mut arena, &EngineConfig::default());

        assert_eq!(outcome, MatchOutcome::Complete);
        assert!(taker.is_filled());
        assert_eq!(arena[&OrderId(1)].status, OrderStatus::Filled);
        assert_eq!(arena[&OrderId(2)].leaves_qty, dec!(1));
        assert_eq!(lv.len(), 1);
    }

    #[test]
    fn cancel_removes_order() {
        let mut arena = HashMap::new();
        let o = Order::new(OrderId(42), Side::Buy, dec!(101), dec!(10));
        arena.insert(o.id, o);
        let mut lv = Level::new(dec!(101), Side::Buy);
        lv.add(arena.get(&OrderId(42)).unwrap()).unwrap();

        lv.cancel(OrderId(42)).unwrap();
        assert!(lv.is_empty());
        assert!(lv.cancel(OrderId(42)).is_err());
    }
}
