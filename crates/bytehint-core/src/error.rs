//! Contract-breach errors raised by instruction effects.
//!
//! Every variant here signals a mismatch between what the decoder produced
//! and what the effect table consumed — a bug in the integration, never a
//! property of the analyzed program. Callers must abort the analysis on
//! any of these; continuing would corrupt later inference.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    #[error("operand stack underflow: effect needs {needed} operands, stack depth is {depth}")]
    StackUnderflow { needed: usize, depth: usize },

    #[error("local slot {index} out of range (frame has {len} slots)")]
    LocalOutOfRange { index: u32, len: usize },

    #[error("closure cell {index} out of range (frame has {len} cells)")]
    CellOutOfRange { index: u32, len: usize },

    #[error("constant index {index} out of range (pool has {len} entries)")]
    ConstOutOfRange { index: u32, len: usize },

    #[error("name index {index} out of range (symbol table has {len} entries)")]
    NameOutOfRange { index: u32, len: usize },
}

/// Result alias used by every effect function.
pub type EffectResult = Result<(), EffectError>;
