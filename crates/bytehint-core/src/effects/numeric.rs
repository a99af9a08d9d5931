//! Unary, symmetric-binary, and comparison effects.

use crate::error::EffectResult;
use crate::frame::FrameState;
use crate::lattice::{join, TypeValue};

/// The numeric unary operators keep the operand's structural type; only
/// its constness is dropped (the result value is not re-derived).
pub(crate) fn unary(state: &mut FrameState) -> EffectResult {
    let value = state.pop()?.unwrap_const();
    state.push(value);
    Ok(())
}

pub(crate) fn unary_not(state: &mut FrameState) -> EffectResult {
    state.pop()?;
    state.push(TypeValue::BOOL);
    Ok(())
}

/// Comparison and containment yield bool whatever the operands are.
pub(crate) fn compare_op(state: &mut FrameState) -> EffectResult {
    state.pop()?;
    state.pop()?;
    state.push(TypeValue::BOOL);
    Ok(())
}

pub(crate) fn symmetric_binary_op(state: &mut FrameState) -> EffectResult {
    binary(state, false)
}

pub(crate) fn binary_true_divide(state: &mut FrameState) -> EffectResult {
    binary(state, true)
}

/// The shared policy of the symmetric binary operators.
///
/// Structural agreement wins first (with the int/int true-division
/// override), then same-kind container widening, then repetition-style
/// numeric-times-sequence, then ladder promotion, then `Top`.
/// Fixed-arity tuple concatenation deliberately widens to `Top`: a
/// positional join would claim the wrong arity.
pub(crate) fn binary(state: &mut FrameState, is_true_div: bool) -> EffectResult {
    use TypeValue::*;

    let b = state.pop()?.unwrap_const();
    let a = state.pop()?.unwrap_const();

    let out = if a == b {
        if is_true_div && a == TypeValue::INT {
            TypeValue::FLOAT
        } else {
            a
        }
    } else {
        match (&a, &b) {
            (List(x), List(y)) => List(Box::new(join(x, y))),
            (Set(x), Set(y)) => Set(Box::new(join(x, y))),
            (Iter(x), Iter(y)) => Iter(Box::new(join(x, y))),
            (TupleOf(x), TupleOf(y)) => TupleOf(Box::new(join(x, y))),
            // These two are only meaningful for multiplication, but any
            // other operator on these operand shapes is a runtime error
            // anyway, so the claim stays sound.
            _ if a.numeric_rank().is_some() && b.is_repeatable() => b.clone(),
            _ if b.numeric_rank().is_some() && a.is_repeatable() => a.clone(),
            _ => match (a.numeric_rank(), b.numeric_rank()) {
                (Some(_), Some(_)) => join(&a, &b),
                _ => Top,
            },
        }
    };

    state.push(out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::Literal;

    fn binary_of(a: TypeValue, b: TypeValue, is_true_div: bool) -> TypeValue {
        let mut frame = FrameState::new();
        frame.push(a);
        frame.push(b);
        binary(&mut frame, is_true_div).unwrap();
        assert_eq!(frame.depth(), 1);
        frame.pop().unwrap()
    }

    #[test]
    fn equal_operands_keep_their_type() {
        assert_eq!(
            binary_of(TypeValue::STR, TypeValue::STR, false),
            TypeValue::STR
        );
        assert_eq!(
            binary_of(TypeValue::FLOAT, TypeValue::FLOAT, true),
            TypeValue::FLOAT
        );
    }

    #[test]
    fn int_int_true_division_promotes_to_float() {
        assert_eq!(
            binary_of(TypeValue::INT, TypeValue::INT, true),
            TypeValue::FLOAT
        );
        assert_eq!(
            binary_of(TypeValue::INT, TypeValue::INT, false),
            TypeValue::INT
        );
    }

    #[test]
    fn ladder_promotion_on_mixed_numerics() {
        assert_eq!(
            binary_of(TypeValue::INT, TypeValue::FLOAT, false),
            TypeValue::FLOAT
        );
        assert_eq!(
            binary_of(TypeValue::BOOL, TypeValue::INT, false),
            TypeValue::INT
        );
        assert_eq!(
            binary_of(TypeValue::FLOAT, TypeValue::COMPLEX, false),
            TypeValue::COMPLEX
        );
    }

    #[test]
    fn repetition_keeps_the_sequence_operand() {
        let ints = TypeValue::List(Box::new(TypeValue::INT));
        assert_eq!(binary_of(TypeValue::INT, ints.clone(), false), ints.clone());
        assert_eq!(binary_of(ints.clone(), TypeValue::INT, false), ints);
        assert_eq!(
            binary_of(TypeValue::STR, TypeValue::INT, false),
            TypeValue::STR
        );
    }

    #[test]
    fn same_kind_containers_widen_elementwise() {
        let ints = TypeValue::List(Box::new(TypeValue::INT));
        let floats = TypeValue::List(Box::new(TypeValue::FLOAT));
        assert_eq!(
            binary_of(ints, floats, false),
            TypeValue::List(Box::new(TypeValue::FLOAT))
        );
    }

    #[test]
    fn tuple_concatenation_widens_to_top() {
        let a = TypeValue::Tuple(vec![TypeValue::INT]);
        let b = TypeValue::Tuple(vec![TypeValue::STR]);
        assert_eq!(binary_of(a, b, false), TypeValue::Top);
    }

    #[test]
    fn consts_are_unwrapped_before_comparing() {
        assert_eq!(
            binary_of(
                TypeValue::Const(Literal::Int(6)),
                TypeValue::Const(Literal::Int(7)),
                false
            ),
            TypeValue::INT
        );
    }

    #[test]
    fn unrelated_operands_meet_at_top() {
        assert_eq!(
            binary_of(TypeValue::STR, TypeValue::NONE, false),
            TypeValue::Top
        );
    }

    #[test]
    fn unary_strips_constness() {
        let mut frame = FrameState::new();
        frame.push(TypeValue::Const(Literal::Int(-3)));
        unary(&mut frame).unwrap();
        assert_eq!(frame.pop(), Ok(TypeValue::INT));
    }

    #[test]
    fn comparison_always_yields_bool() {
        let mut frame = FrameState::new();
        frame.push(TypeValue::List(Box::new(TypeValue::INT)));
        frame.push(TypeValue::STR);
        compare_op(&mut frame).unwrap();
        assert_eq!(frame.pop(), Ok(TypeValue::BOOL));
    }
}
