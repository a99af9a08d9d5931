//! Pure stack-reshuffling effects: no type computation.

use crate::error::EffectResult;
use crate::frame::FrameState;

pub(crate) fn nop(_state: &mut FrameState) -> EffectResult {
    Ok(())
}

pub(crate) fn pop_top(state: &mut FrameState) -> EffectResult {
    state.pop()?;
    Ok(())
}

pub(crate) fn pop_two(state: &mut FrameState) -> EffectResult {
    state.pop()?;
    state.pop()?;
    Ok(())
}

/// Remove the value one below the top, keeping the top in place.
pub(crate) fn end_send(state: &mut FrameState) -> EffectResult {
    let top = state.pop()?;
    state.pop()?;
    state.push(top);
    Ok(())
}

/// Duplicate the value at `depth` onto the top.
pub(crate) fn copy(state: &mut FrameState, depth: u32) -> EffectResult {
    let value = state.peek(depth)?.clone();
    state.push(value);
    Ok(())
}

pub(crate) fn dup_top(state: &mut FrameState) -> EffectResult {
    copy(state, 1)
}

/// Exchange the top with the value at `depth`.
pub(crate) fn swap(state: &mut FrameState, depth: u32) -> EffectResult {
    let top = state.peek(1)?.clone();
    let other = state.peek(depth)?.clone();
    state.replace(1, other)?;
    state.replace(depth, top)
}

/// Move the top down to `depth`, shifting the values above it up by one.
pub(crate) fn rot_n(state: &mut FrameState, n: u32) -> EffectResult {
    let value = state.pop()?;
    state.insert(n.max(1), value)
}

pub(crate) fn rot_two(state: &mut FrameState) -> EffectResult {
    rot_n(state, 2)
}

pub(crate) fn rot_three(state: &mut FrameState) -> EffectResult {
    rot_n(state, 3)
}

pub(crate) fn rot_four(state: &mut FrameState) -> EffectResult {
    rot_n(state, 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::TypeValue;

    fn frame_with(values: &[TypeValue]) -> FrameState {
        let mut frame = FrameState::new();
        for value in values {
            frame.push(value.clone());
        }
        frame
    }

    #[test]
    fn rot_three_cycles_top_down() {
        let mut frame = frame_with(&[TypeValue::INT, TypeValue::STR, TypeValue::BOOL]);
        rot_three(&mut frame).unwrap();
        assert_eq!(frame.peek(1), Ok(&TypeValue::STR));
        assert_eq!(frame.peek(2), Ok(&TypeValue::INT));
        assert_eq!(frame.peek(3), Ok(&TypeValue::BOOL));
    }

    #[test]
    fn swap_exchanges_depths() {
        let mut frame = frame_with(&[TypeValue::INT, TypeValue::STR, TypeValue::BOOL]);
        swap(&mut frame, 3).unwrap();
        assert_eq!(frame.peek(1), Ok(&TypeValue::INT));
        assert_eq!(frame.peek(3), Ok(&TypeValue::BOOL));
    }

    #[test]
    fn copy_duplicates_at_depth() {
        let mut frame = frame_with(&[TypeValue::INT, TypeValue::STR]);
        copy(&mut frame, 2).unwrap();
        assert_eq!(frame.depth(), 3);
        assert_eq!(frame.peek(1), Ok(&TypeValue::INT));
    }

    #[test]
    fn end_send_removes_second() {
        let mut frame = frame_with(&[TypeValue::INT, TypeValue::STR]);
        end_send(&mut frame).unwrap();
        assert_eq!(frame.depth(), 1);
        assert_eq!(frame.peek(1), Ok(&TypeValue::STR));
    }

    #[test]
    fn rot_beyond_depth_is_underflow() {
        let mut frame = frame_with(&[TypeValue::INT]);
        assert!(rot_n(&mut frame, 3).is_err());
    }
}
