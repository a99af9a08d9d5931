//! Attribute and method resolution.
//!
//! Lookup never fails: anything that cannot be resolved statically —
//! opaque receivers, native members, missing fields — widens to `Top`.

use crate::error::EffectResult;
use crate::frame::FrameState;
use crate::lattice::{Literal, TypeValue};

pub(crate) fn load_attr(state: &mut FrameState, arg: u32) -> EffectResult {
    let name = state.name(arg)?.to_owned();
    let receiver = state.pop()?;
    state.push(resolve_member(&receiver, &name));
    Ok(())
}

/// The attribute index carries a flag in its lowest bit in newer
/// instruction sets; the table selects this variant at build time.
pub(crate) fn load_attr_shifted(state: &mut FrameState, arg: u32) -> EffectResult {
    load_attr(state, arg >> 1)
}

pub(crate) fn load_method(state: &mut FrameState, arg: u32) -> EffectResult {
    load_attr(state, arg)
}

fn resolve_member(receiver: &TypeValue, name: &str) -> TypeValue {
    match receiver {
        // A known record value resolves to the exact field value.
        TypeValue::Const(lit) => match lit.field(name) {
            Some(field) => TypeValue::Const(field.clone()),
            None => {
                tracing::debug!(member = name, "member not statically resolvable");
                TypeValue::Top
            }
        },
        TypeValue::Row(fields) => match fields.get(name) {
            // A callable member binds to its receiver.
            Some(TypeValue::Callable(func)) => TypeValue::Const(Literal::Func(
                (**func).clone().bound_to(receiver.clone()),
            )),
            Some(field) => field.clone(),
            None => {
                tracing::debug!(member = name, "row has no such field");
                TypeValue::Top
            }
        },
        _ => TypeValue::Top,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{CallableRef, CodeRef};
    use indexmap::IndexMap;

    #[test]
    fn const_record_field_stays_const() {
        let record = TypeValue::Const(Literal::Record(vec![(
            "timestamp".into(),
            Literal::Float(1.5),
        )]));
        assert_eq!(
            resolve_member(&record, "timestamp"),
            TypeValue::Const(Literal::Float(1.5))
        );
        assert_eq!(resolve_member(&record, "missing"), TypeValue::Top);
    }

    #[test]
    fn row_field_resolves_to_declared_type() {
        let mut fields = IndexMap::new();
        fields.insert("id".to_string(), TypeValue::INT);
        let row = TypeValue::Row(fields);
        assert_eq!(resolve_member(&row, "id"), TypeValue::INT);
        assert_eq!(resolve_member(&row, "other"), TypeValue::Top);
    }

    #[test]
    fn row_callable_member_binds_receiver() {
        let mut fields = IndexMap::new();
        fields.insert(
            "tally".to_string(),
            TypeValue::Callable(Box::new(CallableRef::new(CodeRef::named("tally")))),
        );
        let row = TypeValue::Row(fields);

        match resolve_member(&row, "tally") {
            TypeValue::Const(Literal::Func(func)) => {
                assert_eq!(func.code.name, "tally");
                assert_eq!(func.receiver.as_deref(), Some(&row));
            }
            other => panic!("expected bound callable, got {other:?}"),
        }
    }

    #[test]
    fn opaque_receivers_widen_to_top() {
        assert_eq!(resolve_member(&TypeValue::Top, "anything"), TypeValue::Top);
        assert_eq!(resolve_member(&TypeValue::INT, "real"), TypeValue::Top);
    }

    #[test]
    fn load_attr_consumes_receiver() {
        let mut frame = FrameState::new().with_names(vec!["field".into()]);
        frame.push(TypeValue::Top);
        load_attr(&mut frame, 0).unwrap();
        assert_eq!(frame.depth(), 1);
        assert_eq!(frame.pop(), Ok(TypeValue::Top));
    }

    #[test]
    fn shifted_variant_drops_flag_bit() {
        let mut fields = IndexMap::new();
        fields.insert("id".to_string(), TypeValue::INT);
        let mut frame = FrameState::new().with_names(vec!["id".into()]);
        frame.push(TypeValue::Row(fields));
        // Index 0 with the flag bit set.
        load_attr_shifted(&mut frame, 1).unwrap();
        assert_eq!(frame.pop(), Ok(TypeValue::INT));
    }
}
