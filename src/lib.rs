//! Single-instrument limit-order-book matching engine.
//!
//! Accepts a serialized stream of [`engine::Request`]s (new order / cancel), matches
//! incoming orders against resting orders by price-time priority, and maintains the
//! resting book between calls. See `SPEC_FULL.md` for the full component design;
//! persistence, network transport, multi-instrument routing, and market-data
//! fan-out are explicitly out of scope here and live in whatever embeds this crate.

pub mod book;
pub mod config;
pub mod engine;
pub mod error;
pub mod level;
pub mod order;

pub use config::EngineConfig;
pub use engine::{Engine, NewOrder, Request, Response};
pub use error::EngineError;
pub use order::{Order, OrderId, OrderStatus, Side};
