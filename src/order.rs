//! Order value entity and fill-accounting arithmetic.

use crate::config::EngineConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Default residual tolerance used when snapping a near-zero `leaves_qty` to exactly
/// zero (1e-6, matching §4.1).
///
/// Kept as a defensive check even though [`Decimal`] arithmetic is exact for the
/// literals this domain uses; it guards callers that feed in quantities derived from
/// prior floating-point averaging upstream of the engine. See [`EngineConfig`] for
/// how a caller can tune or disable it.
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// Opaque, caller-assigned order identity. The engine never generates ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        OrderId(id)
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Signed multiplier used by [`crate::level::Level::can_match`]'s uniform
    /// marketability check: `taker.price * taker.side_sign >= level.price * level.side_sign`.
    pub fn sign(self) -> i32 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    PartialFill,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// A single order: identity, side, limit price, and running fill state.
///
/// Constructed via [`Order::new`]; mutated only by [`Order::fill`] (during matching)
/// and by cancellation (which the [`crate::level::Level`] performs directly on the
/// fields, mirroring the reference crate's in-place `VecDeque` mutation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: Decimal,
    pub orig_qty: Decimal,
    pub leaves_qty: Decimal,
    pub status: OrderStatus,
    pub cum_notional: Decimal,
    pub avg_fill_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<SystemTime>,
}

impl Order {
    pub fn new(id: OrderId, side: Side, price: Decimal, quantity: Decimal) -> Self {
        Order {
            id,
            side,
            price,
            orig_qty: quantity,
            leaves_qty: quantity,
            status: OrderStatus::Open,
            cum_notional: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, ts: SystemTime) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Applies a fill of `qty` units at `price` to this order, using `config` to
    /// decide whether/how to snap a near-zero residual (§4.1, §4.4.1).
    ///
    /// Precondition: `qty > 0 && qty <= self.leaves_qty && !self.status.is_terminal()`.
    /// Violating the precondition is a matching-engine bug, not caller input, so this
    /// asserts rather than returning a `Result` — callers (`Level::match_taker`)
    /// never invoke it outside the invariant.
    pub fn fill(&mut self, qty: Decimal, price: Decimal, config: &EngineConfig) {
        debug_assert!(qty > Decimal::ZERO);
        debug_assert!(qty <= self.leaves_qty);
        debug_assert!(!self.status.is_terminal());

        self.cum_notional += qty * price;
        self.leaves_qty -= qty;
        let filled_qty = self.orig_qty - self.leaves_qty;
        self.avg_fill_price = self.cum_notional / filled_qty;

        if config.snap_residual && self.leaves_qty.abs() < config.fill_epsilon {
            self.leaves_qty = Decimal::ZERO;
            self.status = OrderStatus::Filled;
        } else if self.leaves_qty == Decimal::ZERO {
            self.status = OrderStatus::Filled;
        } else {
            self.status = OrderStatus::PartialFill;
        }

        tracing::debug!(
            order_id = %self.id,
            %qty,
            %price,
            leaves_qty = %self.leaves_qty,
            status = ?self.status,
            "order filled"
        );
    }

    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
