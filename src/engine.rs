//! Engine: owns both books plus the id→order index; dispatches requests (§4.4).

use crate::book::Book;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::order::{Order, OrderId, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

/// A new limit order submitted to the engine. Every order carries a limit price —
/// this engine has no market-order concept (§1 Non-goals).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub id: OrderId,
    pub side: Side,
    pub price: Decimal,
    pub qty: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<SystemTime>,
}

/// Tagged request variant: `NewOrder` or `Cancel`. The engine dispatches on the tag
/// (§4.5); no other request kinds are defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    NewOrder(NewOrder),
    Cancel { id: OrderId },
}

/// Structured outcome of a `process` call (§6). `code` is one of two wire values,
/// `"200"` on success or `"500"` on any rejection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Response {
    pub code: &'static str,
    pub msg: String,
}

impl Response {
    fn accepted() -> Self {
        Response {
            code: "200",
            msg: "order accepted".to_string(),
        }
    }
}

impl From<EngineError> for Response {
    fn from(err: EngineError) -> Self {
        Response {
            code: err.code(),
            msg: err.to_string(),
        }
    }
}

/// Owns the two [`Book`]s and the id-indexed order arena. Sole mutator of every
/// [`Order`] it has ever accepted (§3, §5).
pub struct Engine {
    config: EngineConfig,
    buy_book: Book,
    sell_book: Book,
    orders: HashMap<OrderId, Order>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Engine {
            config,
            buy_book: Book::new(Side::Buy),
            sell_book: Book::new(Side::Sell),
            orders: HashMap::new(),
        }
    }

    fn book(&self, side: Side) -> &Book {
        match side {
            Side::Buy => &self.buy_book,
            Side::Sell => &self.sell_book,
        }
    }

    fn book_mut(&mut self, side: Side) -> &mut Book {
        match side {
            Side::Buy => &mut self.buy_book,
            Side::Sell => &mut self.sell_book,
        }
    }

    /// Single entry point: dispatches `request` to its handler and returns a wire
    /// [`Response`] — never panics on caller-supplied input (§4.4, §7).
    pub fn process(&mut self, request: Request) -> Response {
        let result = match request {
            Request::NewOrder(new_order) => self.process_new_order(new_order),
            Request::Cancel { id } => self.process_cancel(id),
        };
        match result {
            Ok(()) => Response::accepted(),
            Err(err) => {
                if matches!(err, EngineError::Precondition(_)) {
                    tracing::error!(error = %err, "internal precondition violated");
                }
                err.into()
            }
        }
    }

    fn process_new_order(&mut self, new_order: NewOrder) -> Result<(), EngineError> {
        if self.orders.contains_key(&new_order.id) {
            return Err(EngineError::DuplicateId(new_order.id));
        }

        let mut taker = Order::new(new_order.id, new_order.side, new_order.price, new_order.qty);
        if let Some(ts) = new_order.ts {
            taker = taker.with_timestamp(ts);
        }

        tracing::info!(
            order_id = %taker.id,
            side = ?taker.side,
            price = %taker.price,
            qty = %taker.orig_qty,
            "new order accepted"
        );

        // Not routed through `book_mut`: matching needs simultaneous access to
        // `self.orders` (the arena) and `self.config` alongside the opposite book,
        // which a `&mut self` helper method would have to borrow exclusively.
        match taker.side.opposite() {
            Side::Buy => self.buy_book.match_taker(&mut taker, &mut self.orders, &self.config),
            Side::Sell => self.sell_book.match_taker(&mut taker, &mut self.orders, &self.config),
        };

        let resting = !taker.is_filled();
        let order_side = taker.side;
        self.orders.insert(taker.id, taker);

        if resting {
            let order = self.orders.get(&new_order.id).expect("just inserted");
            match order_side {
                Side::Buy => self.buy_book.add(order)?,
                Side::Sell => self.sell_book.add(order)?,
            }
        }

        Ok(())
    }

    fn process_cancel(&mut self, id: OrderId) -> Result<(), EngineError> {
        let order = self.orders.get(&id).ok_or(EngineError::UnknownId(id))?;
        if order.is_terminal() {
            return Err(EngineError::AlreadyDone(id));
        }
        let (side, price) = (order.side, order.price);

        self.book_mut(side).cancel(id, price)?;

        let order = self.orders.get_mut(&id).expect("looked up above");
        order.status = crate::order::OrderStatus::Cancelled;
        order.leaves_qty = Decimal::ZERO;
        tracing::info!(order_id = %id, "order cancelled");
        Ok(())
    }

    /// Looks up any order (resting or terminal) by id.
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.book(Side::Buy).best_price()
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.book(Side::Sell).best_price()
    }

    /// Best-first `(price, total resting quantity)` per level on the buy side.
    pub fn bid_depth(&self) -> Vec<(Decimal, Decimal)> {
        self.book(Side::Buy).depth(&self.orders)
    }

    /// Best-first `(price, total resting quantity)` per level on the sell side.
    pub fn ask_depth(&self) -> Vec<(Decimal, Decimal)> {
        self.book(Side::Sell).depth(&self.orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;
    use rust_decimal_macros::dec;

    fn new_order(id: u64, side: Side, price: Decimal, qty: Decimal) -> Request {
        Request::NewOrder(NewOrder {
            id: OrderId(id),
            side,
            price,
            qty,
            ts: None,
        })
    }

    fn cancel(id: u64) -> Request {
        Request::Cancel { id: OrderId(id) }
    }

    #[test]
    fn duplicate_id_is_rejected_and_does_not_mutate_state() {
        let mut engine = Engine::new();
        assert_eq!(engine.process(new_order(7, Side::Buy, dec!(10), dec!(5))).code, "200");

        let resp = engine.process(new_order(7, Side::Sell, dec!(11), dec!(5)));
        assert_eq!(resp.code, "500");
        assert_eq!(resp.msg, "duplicated order_id");
        assert!(engine.ask_depth().is_empty());
    }

    #[test]
    fn cancel_unknown_id_is_rejected() {
        let mut engine = Engine::new();
        let resp = engine.process(cancel(1));
        assert_eq!(resp.code, "500");
        assert_eq!(resp.msg, "cannot cancel order that does not exist");
    }

    #[test]
    fn cancel_after_terminal_is_idempotently_rejected() {
        let mut engine = Engine::new();
        engine.process(new_order(0, Side::Sell, dec!(12.3), dec!(40)));
        assert_eq!(engine.process(cancel(0)).code, "200");

        let resp = engine.process(cancel(0));
        assert_eq!(resp.code, "500");
        assert_eq!(resp.msg, "order is done, cannot cancel");
    }

    #[test]
    fn simple_cancel_scenario_s1() {
        let mut engine = Engine::new();
        engine.process(new_order(0, Side::Sell, dec!(12.3), dec!(40)));
        engine.process(cancel(0));

        let order = engine.order(OrderId(0)).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.leaves_qty, Decimal::ZERO);
    }

    #[test]
    fn marketable_buy_fully_fills_before_any_residual_could_rest() {
        let mut engine = Engine::new();
        engine.process(new_order(1, Side::Sell, dec!(12.3), dec!(40)));
        engine.process(new_order(2, Side::Buy, dec!(12.6), dec!(10)));

        // Taker fully filled against the resting ask; nothing rests on the buy side,
        // so the book can never be crossed (I5).
        assert!(engine.best_bid().is_none());
        assert_eq!(engine.best_ask(), Some(dec!(12.3)));
        assert_eq!(engine.order(OrderId(2)).unwrap().status, OrderStatus::Filled);
        assert_eq!(engine.order(OrderId(1)).unwrap().leaves_qty, dec!(30));
    }
}
