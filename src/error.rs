//! Error taxonomy for the engine (§7).
//!
//! None of these panic the engine; `Engine::process` maps every variant to a wire
//! [`crate::engine::Response`] at the boundary (§6).

use crate::order::OrderId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("duplicated order_id")]
    DuplicateId(OrderId),

    #[error("cannot cancel order that does not exist")]
    UnknownId(OrderId),

    #[error("order is done, cannot cancel")]
    AlreadyDone(OrderId),

    /// Signals a corrupted invariant (e.g. a level mismatch on add, or a cancel
    /// target missing from its level's queue) rather than bad caller input. The
    /// engine never attempts recovery from this — it indicates a bug upstream.
    #[error("{0}")]
    Precondition(String),
}

impl EngineError {
    /// The short wire status code used by [`crate::engine::Response`] (§6): "200" is
    /// never produced from an error, so this is always "500".
    pub fn code(&self) -> &'static str {
        "500"
    }
}
