//! Callable construction and text formatting effects.

use crate::error::EffectResult;
use crate::frame::FrameState;
use crate::lattice::{CallableRef, CodeRef, Literal, TypeValue};

fn code_of(value: &TypeValue) -> CodeRef {
    match value {
        TypeValue::Const(Literal::Code(code)) => code.clone(),
        other => {
            tracing::debug!(operand = %other, "callable built from non-constant code reference");
            CodeRef::opaque()
        }
    }
}

fn cells_of(value: &TypeValue) -> Vec<TypeValue> {
    match value {
        TypeValue::Tuple(types) => types.clone(),
        TypeValue::TupleOf(elem) => vec![(**elem).clone()],
        other => {
            tracing::debug!(operand = %other, "closure operand is not a cell tuple");
            Vec::new()
        }
    }
}

/// Flag-driven callable construction.
///
/// The top of stack is either the code reference itself (anonymous form)
/// or a declared name with the code reference beneath it. Each low flag
/// bit adds one operand below the code; bit 3 marks that operand as the
/// captured-cell tuple. Exactly the consumed operands are popped and one
/// `Const`-wrapped callable is pushed.
pub(crate) fn make_function_flags(state: &mut FrameState, arg: u32) -> EffectResult {
    let top = state.peek(1)?.clone();
    let (qualname, code_depth) = match &top {
        TypeValue::Const(Literal::Str(name)) => (Some(name.clone()), 2),
        _ => (None, 1),
    };
    let code = code_of(state.peek(code_depth)?);

    let mut cells = Vec::new();
    if arg & 0x08 != 0 {
        cells = cells_of(state.peek(code_depth + 1)?);
    }

    let pops = code_depth as usize + (arg & 0x0f).count_ones() as usize;
    state.pop_n(pops)?;

    let mut func = CallableRef::new(code).with_cells(cells);
    if let Some(name) = qualname {
        func = func.with_qualname(name);
    }
    state.push(TypeValue::Const(Literal::Func(func)));
    Ok(())
}

/// Fixed-arity callable construction: pops only the code reference.
/// Optional parts arrive via [`set_function_attribute`].
pub(crate) fn make_function_simple(state: &mut FrameState) -> EffectResult {
    let code = code_of(&state.pop()?);
    state.push(TypeValue::Const(Literal::Func(CallableRef::new(code))));
    Ok(())
}

/// Attach one optional part to the callable on top of the stack. Only the
/// captured-cell tuple (bit 3) affects the type.
pub(crate) fn set_function_attribute(state: &mut FrameState, arg: u32) -> EffectResult {
    let func = state.pop()?;
    let attr = state.pop()?;
    match func {
        TypeValue::Const(Literal::Func(mut func)) => {
            if arg & 0x08 != 0 {
                func.cells = cells_of(&attr);
            }
            state.push(TypeValue::Const(Literal::Func(func)));
        }
        other => {
            tracing::debug!(operand = %other, "attribute set on non-callable operand");
            state.push(other);
        }
    }
    Ok(())
}

/// Flag-driven formatting: bit 2 marks an extra format-spec operand.
pub(crate) fn format_value(state: &mut FrameState, arg: u32) -> EffectResult {
    if arg & 0x04 != 0 {
        state.pop()?;
    }
    state.pop()?;
    state.push(TypeValue::STR);
    Ok(())
}

pub(crate) fn format_simple(state: &mut FrameState) -> EffectResult {
    state.pop()?;
    state.push(TypeValue::STR);
    Ok(())
}

pub(crate) fn format_with_spec(state: &mut FrameState) -> EffectResult {
    state.pop()?;
    state.pop()?;
    state.push(TypeValue::STR);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_const(name: &str) -> TypeValue {
        TypeValue::Const(Literal::Code(CodeRef::named(name)))
    }

    fn expect_func(value: TypeValue) -> CallableRef {
        match value {
            TypeValue::Const(Literal::Func(func)) => func,
            other => panic!("expected callable const, got {other:?}"),
        }
    }

    #[test]
    fn named_flag_form_pops_code_and_name() {
        let mut frame = FrameState::new();
        frame.push(code_const("handler"));
        frame.push(TypeValue::Const(Literal::Str("pkg.handler".into())));
        make_function_flags(&mut frame, 0).unwrap();

        assert_eq!(frame.depth(), 1);
        let func = expect_func(frame.pop().unwrap());
        assert_eq!(func.code.name, "handler");
        assert_eq!(func.qualname.as_deref(), Some("pkg.handler"));
        assert!(func.cells.is_empty());
    }

    #[test]
    fn anonymous_flag_form_pops_only_code() {
        let mut frame = FrameState::new();
        frame.push(TypeValue::INT); // unrelated value stays put
        frame.push(code_const("<lambda>"));
        make_function_flags(&mut frame, 0).unwrap();

        assert_eq!(frame.depth(), 2);
        let func = expect_func(frame.pop().unwrap());
        assert_eq!(func.code.name, "<lambda>");
        assert!(func.qualname.is_none());
        assert_eq!(frame.pop(), Ok(TypeValue::INT));
    }

    #[test]
    fn closure_flag_captures_cell_types() {
        let mut frame = FrameState::new();
        frame.push(TypeValue::Const(Literal::Int(1))); // defaults tuple (bit 0)
        frame.push(TypeValue::Tuple(vec![TypeValue::INT, TypeValue::STR]));
        frame.push(code_const("closure"));
        frame.push(TypeValue::Const(Literal::Str("closure".into())));
        make_function_flags(&mut frame, 0x09).unwrap();

        assert_eq!(frame.depth(), 1);
        let func = expect_func(frame.pop().unwrap());
        assert_eq!(func.cells, vec![TypeValue::INT, TypeValue::STR]);
    }

    #[test]
    fn explicit_form_converges_with_flag_form() {
        let mut frame = FrameState::new();
        frame.push(code_const("worker"));
        make_function_simple(&mut frame).unwrap();

        frame.push(TypeValue::Tuple(vec![TypeValue::FLOAT]));
        stackwise_swap(&mut frame);
        set_function_attribute(&mut frame, 0x08).unwrap();

        assert_eq!(frame.depth(), 1);
        let func = expect_func(frame.pop().unwrap());
        assert_eq!(func.code.name, "worker");
        assert_eq!(func.cells, vec![TypeValue::FLOAT]);
    }

    // The attribute value sits below the callable.
    fn stackwise_swap(frame: &mut FrameState) {
        crate::effects::stack::swap(frame, 2).unwrap();
    }

    #[test]
    fn format_value_flag_pops_spec() {
        let mut frame = FrameState::new();
        frame.push(TypeValue::INT);
        frame.push(TypeValue::STR);
        format_value(&mut frame, 0x04).unwrap();
        assert_eq!(frame.depth(), 1);
        assert_eq!(frame.pop(), Ok(TypeValue::STR));

        frame.push(TypeValue::FLOAT);
        format_value(&mut frame, 0).unwrap();
        assert_eq!(frame.pop(), Ok(TypeValue::STR));
    }

    #[test]
    fn opaque_code_operand_still_yields_callable() {
        let mut frame = FrameState::new();
        frame.push(TypeValue::Top);
        make_function_simple(&mut frame).unwrap();
        let func = expect_func(frame.pop().unwrap());
        assert_eq!(func.code.name, "<code>");
    }
}
