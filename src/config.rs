//! Small typed configuration surface for [`crate::engine::Engine`].
//!
//! There is no file- or env-based loader here: the engine has no process lifetime
//! of its own outside its host (§6), so the only configuration knobs are the ones
//! an embedding caller passes at construction time.

use crate::order::EPSILON;
use rust_decimal::Decimal;

/// Tuning knobs for fill-residual handling (§4.1, §9's floating-point note).
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Residual below which `leaves_qty` is snapped to exactly zero after a fill.
    pub fill_epsilon: Decimal,
    /// Whether the epsilon snap runs at all. Integer-quantity deployments that
    /// compare `leaves_qty` to zero exactly should disable it (§9).
    pub snap_residual: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            fill_epsilon: EPSILON,
            snap_residual: true,
        }
    }
}
