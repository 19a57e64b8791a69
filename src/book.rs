//! One side of the market: an ordered price -> [`Level`] map, traversed best-first.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::level::{Level, MatchOutcome};
use crate::order::{Order, OrderId, Side};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::collections::btree_map::IterMut;

/// Unifies ascending (`Sell`) and descending (`Buy`) best-first traversal over the
/// same `BTreeMap` without duplicating the sweep loop per side.
enum BestFirst<'a> {
    Ascending(IterMut<'a, Decimal, Level>),
    Descending(std::iter::Rev<IterMut<'a, Decimal, Level>>),
}

impl<'a> Iterator for BestFirst<'a> {
    type Item = (&'a Decimal, &'a mut Level);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            BestFirst::Ascending(it) => it.next(),
            BestFirst::Descending(it) => it.next(),
        }
    }
}

/// One side (Buy or Sell) of the order book: a price-ordered map of [`Level`]s.
pub struct Book {
    pub side: Side,
    levels: BTreeMap<Decimal, Level>,
}

impl Book {
    pub fn new(side: Side) -> Self {
        Book {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Best-first iterator: descending for the buy side, ascending for the sell side.
    fn best_first(&mut self) -> BestFirst<'_> {
        match self.side {
            Side::Buy => BestFirst::Descending(self.levels.iter_mut().rev()),
            Side::Sell => BestFirst::Ascending(self.levels.iter_mut()),
        }
    }

    /// Best (top-of-book) price on this side, if any orders rest here.
    pub fn best_price(&self) -> Option<Decimal> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// Best-first `(price, resting quantity)` per level, for book-depth snapshots.
    pub fn depth(&self, orders: &std::collections::HashMap<OrderId, Order>) -> Vec<(Decimal, Decimal)> {
        let prices: Box<dyn Iterator<Item = &Decimal>> = match self.side {
            Side::Buy => Box::new(self.levels.keys().rev()),
            Side::Sell => Box::new(self.levels.keys()),
        };
        prices
            .map(|price| {
                let level = &self.levels[price];
                let qty = level
                    .iter()
                    .map(|id| orders[id].leaves_qty)
                    .sum();
                (*price, qty)
            })
            .collect()
    }

    /// Inserts a non-terminal, non-empty-quantity order into its price level,
    /// creating the level if this is the first resting order at that price.
    pub fn add(&mut self, order: &Order) -> Result<(), EngineError> {
        debug_assert_eq!(order.side, self.side);
        debug_assert!(!order.is_terminal());
        self.levels
            .entry(order.price)
            .or_insert_with(|| Level::new(order.price, self.side))
            .add(order)
    }

    /// Sweeps `taker` best-first against this book until it fills or the book runs
    /// out of marketable liquidity. Levels emptied by the sweep are removed only
    /// after the walk completes (I3), so iterator invalidation never arises.
    pub fn match_taker(
        &mut self,
        taker: &mut Order,
        arena: &mut std::collections::HashMap<OrderId, Order>,
        config: &EngineConfig,
    ) {
        let mut drained = Vec::new();

        for (&price, level) in self.best_first() {
            if !level.can_match(taker) {
                break;
            }
            let outcome = level.match_taker(taker, arena, config);
            if level.is_empty() {
                drained.push(price);
            }
            if outcome == MatchOutcome::Complete {
                break;
            }
        }

        for price in drained {
            self.levels.remove(&price);
        }
    }

    /// Cancels the order identified by `(order_id, price)`. Fails if the price has
    /// no level or the order is not queued there (a Precondition error per §7 /
    /// §9's open question — the engine never dereferences a missing level).
    pub fn cancel(&mut self, order_id: OrderId, price: Decimal) -> Result<(), EngineError> {
        let level = self.levels.get_mut(&price).ok_or_else(|| {
            EngineError::Precondition(format!(
                "order {order_id} has price {price} with no resting level on the {:?} book",
                self.side
            ))
        })?;
        level.cancel(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
