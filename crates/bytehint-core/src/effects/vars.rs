//! Constant, local-slot, closure-cell, and global/name effects.

use crate::error::{EffectError, EffectResult};
use crate::frame::FrameState;
use crate::lattice::TypeValue;

pub(crate) fn load_const(state: &mut FrameState, arg: u32) -> EffectResult {
    let value = state.const_type(arg)?;
    state.push(value);
    Ok(())
}

pub(crate) fn load_fast(state: &mut FrameState, arg: u32) -> EffectResult {
    let value = match state.local(arg)? {
        Some(value) => value.clone(),
        None => {
            // Use before assignment in the analyzed program, not a
            // decoder bug.
            tracing::debug!(slot = arg, "load of unset local slot");
            TypeValue::Top
        }
    };
    state.push(value);
    Ok(())
}

pub(crate) fn load_fast_and_clear(state: &mut FrameState, arg: u32) -> EffectResult {
    load_fast(state, arg)?;
    state.unset_local(arg)
}

pub(crate) fn store_fast(state: &mut FrameState, arg: u32) -> EffectResult {
    let value = state.pop()?;
    state.set_local(arg, value)
}

/// A deleted name reads as unknown afterwards.
pub(crate) fn delete_fast(state: &mut FrameState, arg: u32) -> EffectResult {
    state.set_local(arg, TypeValue::Top)
}

/// Packed-pair encoding: two 4-bit slot indices in one argument.
pub(crate) fn load_fast_pair(state: &mut FrameState, arg: u32) -> EffectResult {
    load_fast(state, arg >> 4)?;
    load_fast(state, arg & 0x0f)
}

pub(crate) fn store_fast_pair(state: &mut FrameState, arg: u32) -> EffectResult {
    store_fast(state, arg >> 4)?;
    store_fast(state, arg & 0x0f)
}

pub(crate) fn store_fast_load_fast(state: &mut FrameState, arg: u32) -> EffectResult {
    store_fast(state, arg >> 4)?;
    load_fast(state, arg & 0x0f)
}

pub(crate) fn load_cell(state: &mut FrameState, arg: u32) -> EffectResult {
    let value = state.cell(arg)?.clone();
    state.push(value);
    Ok(())
}

/// Cell indices offset past the local slots; the table selects this
/// variant at build time.
pub(crate) fn load_cell_offset(state: &mut FrameState, arg: u32) -> EffectResult {
    let index = arg
        .checked_sub(state.locals_len() as u32)
        .ok_or(EffectError::CellOutOfRange {
            index: arg,
            len: state.cells_len(),
        })?;
    load_cell(state, index)
}

pub(crate) fn load_global(state: &mut FrameState, arg: u32) -> EffectResult {
    let name = state.name(arg)?.to_owned();
    let value = state.resolve(&name);
    state.push(value);
    Ok(())
}

/// The global index carries a flag in its lowest bit in newer instruction
/// sets; the table selects this variant at build time.
pub(crate) fn load_global_shifted(state: &mut FrameState, arg: u32) -> EffectResult {
    load_global(state, arg >> 1)
}

pub(crate) fn import_name(state: &mut FrameState) -> EffectResult {
    state.pop()?;
    state.pop()?;
    state.push(TypeValue::Top);
    Ok(())
}

pub(crate) fn import_from(state: &mut FrameState) -> EffectResult {
    state.push(TypeValue::Top);
    Ok(())
}
