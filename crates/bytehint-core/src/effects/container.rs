//! Container construction, in-place growth, subscripting, and unpacking.

use smallvec::SmallVec;

use crate::error::{EffectError, EffectResult};
use crate::frame::FrameState;
use crate::lattice::{element_type, join, key_value_types, Literal, Scalar, TypeValue};

fn fold_join<I>(items: I) -> TypeValue
where
    I: IntoIterator<Item = TypeValue>,
{
    items
        .into_iter()
        .fold(TypeValue::Bottom, |acc, item| join(&acc, &item))
}

// --- construction ---

pub(crate) fn build_tuple(state: &mut FrameState, arg: u32) -> EffectResult {
    let items = state.pop_n(arg as usize)?;
    state.push(TypeValue::Tuple(
        items.iter().map(TypeValue::unwrap_const).collect(),
    ));
    Ok(())
}

pub(crate) fn build_list(state: &mut FrameState, arg: u32) -> EffectResult {
    let items = state.pop_n(arg as usize)?;
    state.push(TypeValue::List(Box::new(fold_join(items))));
    Ok(())
}

pub(crate) fn build_set(state: &mut FrameState, arg: u32) -> EffectResult {
    let items = state.pop_n(arg as usize)?;
    state.push(TypeValue::Set(Box::new(fold_join(items))));
    Ok(())
}

pub(crate) fn build_map(state: &mut FrameState, arg: u32) -> EffectResult {
    let items = state.pop_n(2 * arg as usize)?;
    let keys = fold_join(items.iter().step_by(2).cloned());
    let values = fold_join(items.iter().skip(1).step_by(2).cloned());
    state.push(TypeValue::Dict(Box::new(keys), Box::new(values)));
    Ok(())
}

/// Build a map from a constant key tuple plus N values.
pub(crate) fn build_const_key_map(state: &mut FrameState, arg: u32) -> EffectResult {
    let key_tuple = state.pop()?;
    let keys = match &key_tuple {
        TypeValue::Tuple(items) => fold_join(items.iter().cloned()),
        TypeValue::Const(lit) => match lit.unpack_elements() {
            Some(items) => fold_join(items.into_iter().map(TypeValue::Const)),
            None => TypeValue::Top,
        },
        _ => TypeValue::Top,
    };
    let values = fold_join(state.pop_n(arg as usize)?);
    state.push(TypeValue::Dict(Box::new(keys), Box::new(values)));
    Ok(())
}

pub(crate) fn build_string(state: &mut FrameState, arg: u32) -> EffectResult {
    state.pop_n(arg as usize)?;
    state.push(TypeValue::STR);
    Ok(())
}

pub(crate) fn build_slice(state: &mut FrameState, arg: u32) -> EffectResult {
    state.pop_n(arg as usize)?;
    state.push(TypeValue::Slice);
    Ok(())
}

/// Convert a variadic sequence to the fixed-open tuple of its element.
pub(crate) fn list_to_tuple(state: &mut FrameState) -> EffectResult {
    let base = state.pop()?;
    state.push(TypeValue::TupleOf(Box::new(element_type(&base))));
    Ok(())
}

pub(crate) fn get_iter(state: &mut FrameState) -> EffectResult {
    let base = state.pop()?;
    state.push(TypeValue::Iter(Box::new(element_type(&base))));
    Ok(())
}

// --- in-place growth at a stack depth ---

pub(crate) fn list_append(state: &mut FrameState, depth: u32) -> EffectResult {
    let elem = state.pop()?.unwrap_const();
    let widened = join(&element_type(state.peek(depth)?), &elem);
    state.replace(depth, TypeValue::List(Box::new(widened)))
}

pub(crate) fn set_add(state: &mut FrameState, depth: u32) -> EffectResult {
    let elem = state.pop()?.unwrap_const();
    let widened = join(&element_type(state.peek(depth)?), &elem);
    state.replace(depth, TypeValue::Set(Box::new(widened)))
}

/// The value sits above the key.
pub(crate) fn map_add(state: &mut FrameState, depth: u32) -> EffectResult {
    let value = state.pop()?.unwrap_const();
    let key = state.pop()?.unwrap_const();
    let (base_key, base_value) = dict_parts(state.peek(depth)?);
    state.replace(
        depth,
        TypeValue::Dict(
            Box::new(join(&base_key, &key)),
            Box::new(join(&base_value, &value)),
        ),
    )
}

pub(crate) fn list_extend(state: &mut FrameState, depth: u32) -> EffectResult {
    let tail = state.pop()?;
    let widened = join(&element_type(state.peek(depth)?), &element_type(&tail));
    state.replace(depth, TypeValue::List(Box::new(widened)))
}

pub(crate) fn set_update(state: &mut FrameState, depth: u32) -> EffectResult {
    let other = state.pop()?;
    let widened = join(&element_type(state.peek(depth)?), &element_type(&other));
    state.replace(depth, TypeValue::Set(Box::new(widened)))
}

pub(crate) fn dict_update(state: &mut FrameState, depth: u32) -> EffectResult {
    let other = state.pop()?;
    let (base_key, base_value) = dict_parts(state.peek(depth)?);
    let (other_key, other_value) = match &other {
        TypeValue::Dict(key, value) => ((**key).clone(), (**value).clone()),
        other => key_value_types(&element_type(other)),
    };
    state.replace(
        depth,
        TypeValue::Dict(
            Box::new(join(&base_key, &other_key)),
            Box::new(join(&base_value, &other_value)),
        ),
    )
}

fn dict_parts(value: &TypeValue) -> (TypeValue, TypeValue) {
    match value {
        TypeValue::Dict(key, value) => ((**key).clone(), (**value).clone()),
        _ => (TypeValue::Top, TypeValue::Top),
    }
}

// --- subscripting ---

pub(crate) fn binary_subscr(state: &mut FrameState) -> EffectResult {
    let index = state.pop()?;
    let base = state.pop()?.unwrap_const();
    state.push(subscript_type(&base, &index));
    Ok(())
}

fn subscript_type(base: &TypeValue, index: &TypeValue) -> TypeValue {
    use TypeValue::*;

    match (base, index) {
        // Indexing and slicing str both yield str.
        (Primitive(Scalar::Str), _) => base.clone(),
        (Primitive(Scalar::Bytes), Slice) => base.clone(),
        (Dict(_, value), _) => (**value).clone(),
        (Tuple(items), Const(Literal::Int(i))) => {
            let len = items.len() as i64;
            let idx = if *i < 0 { *i + len } else { *i };
            if (0..len).contains(&idx) {
                items[idx as usize].clone()
            } else {
                element_type(base)
            }
        }
        (TupleOf(elem), Const(Literal::Int(_))) => (**elem).clone(),
        (_, Slice) if base.is_sequence() => base.clone(),
        _ => element_type(base),
    }
}

/// Pops index, container, and stored value. The element type of whatever
/// still holds the container is not refined; a known imprecision.
pub(crate) fn store_subscr(state: &mut FrameState) -> EffectResult {
    state.pop_n(3)?;
    Ok(())
}

pub(crate) fn binary_slice(state: &mut FrameState) -> EffectResult {
    state.pop()?; // stop
    state.pop()?; // start
    let base = state.pop()?.unwrap_const();
    state.push(subscript_type(&base, &TypeValue::Slice));
    Ok(())
}

/// Clears the slice bounds and stored values off the stack but leaves the
/// container type on top, which is all that matters for inference.
pub(crate) fn store_slice(state: &mut FrameState) -> EffectResult {
    state.pop()?; // stop
    state.pop()?; // start
    let container = state.pop()?;
    state.pop()?; // values
    state.push(container);
    Ok(())
}

// --- unpacking ---

pub(crate) fn unpack_sequence(state: &mut FrameState, arg: u32) -> EffectResult {
    let arity = arg as usize;
    let value = state.pop()?;
    let unpacked: Vec<TypeValue> = match &value {
        TypeValue::Const(lit) => match lit.unpack_elements() {
            Some(items) if items.len() == arity => {
                items.into_iter().map(TypeValue::Const).collect()
            }
            _ => vec![TypeValue::Top; arity],
        },
        TypeValue::Tuple(items) if items.len() == arity => items.clone(),
        other => vec![element_type(other); arity],
    };
    // Reversed so left-to-right assignment reads in order from the top.
    for item in unpacked.into_iter().rev() {
        state.push(item);
    }
    Ok(())
}

// --- splat-joining construction ---

/// Pop `arg` containers and concatenate their inner types.
fn splat_inner_types(
    state: &mut FrameState,
    arg: u32,
) -> Result<SmallVec<[TypeValue; 8]>, EffectError> {
    let items = state.pop_n(arg as usize)?;
    let mut inner = SmallVec::new();
    for item in items {
        let item = item.unwrap_const();
        match &item {
            TypeValue::Bottom => {}
            TypeValue::Tuple(types) => inner.extend(types.iter().cloned()),
            TypeValue::List(elem)
            | TypeValue::Set(elem)
            | TypeValue::Iter(elem)
            | TypeValue::TupleOf(elem) => inner.push((**elem).clone()),
            other => {
                tracing::debug!(operand = %other, "splat operand without inner types");
                inner.push(TypeValue::Top);
            }
        }
    }
    Ok(inner)
}

pub(crate) fn build_list_unpack(state: &mut FrameState, arg: u32) -> EffectResult {
    let inner = splat_inner_types(state, arg)?;
    state.push(TypeValue::List(Box::new(fold_join(inner))));
    Ok(())
}

pub(crate) fn build_set_unpack(state: &mut FrameState, arg: u32) -> EffectResult {
    let inner = splat_inner_types(state, arg)?;
    state.push(TypeValue::Set(Box::new(fold_join(inner))));
    Ok(())
}

pub(crate) fn build_tuple_unpack(state: &mut FrameState, arg: u32) -> EffectResult {
    let inner = splat_inner_types(state, arg)?;
    state.push(TypeValue::TupleOf(Box::new(fold_join(inner))));
    Ok(())
}

pub(crate) fn build_map_unpack(state: &mut FrameState, arg: u32) -> EffectResult {
    let items = state.pop_n(arg as usize)?;
    let mut keys = TypeValue::Bottom;
    let mut values = TypeValue::Bottom;
    for item in items {
        let (key, value) = match &item {
            TypeValue::Dict(key, value) => ((**key).clone(), (**value).clone()),
            other => key_value_types(&element_type(other)),
        };
        keys = join(&keys, &key);
        values = join(&values, &value);
    }
    state.push(TypeValue::Dict(Box::new(keys), Box::new(values)));
    Ok(())
}
