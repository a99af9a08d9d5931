//! The instruction effect table.
//!
//! One pure transformation per instruction kind, assembled once per
//! instruction-set version into an immutable, thread-shareable table. The
//! base mnemonic-to-effect assignment is a single exhaustive match over
//! the closed [`Mnemonic`] vocabulary; version-dependent behavior is
//! selected while the table is built, never re-decided per instruction.

mod attr;
mod container;
mod function;
mod numeric;
mod stack;
mod vars;

use std::collections::HashMap;

use crate::error::EffectResult;
use crate::frame::FrameState;
use crate::isa::{IsaConfig, IsaVersion, Mnemonic};
use crate::lattice::TypeValue;

type NullaryFn = Box<dyn Fn(&mut FrameState) -> EffectResult + Send + Sync>;
type UnaryFn = Box<dyn Fn(&mut FrameState, u32) -> EffectResult + Send + Sync>;

/// A single instruction effect: an in-place transformation of the frame.
///
/// `Nullary` effects ignore the immediate argument.
pub enum Effect {
    Nullary(NullaryFn),
    Unary(UnaryFn),
}

impl Effect {
    pub fn nullary(f: impl Fn(&mut FrameState) -> EffectResult + Send + Sync + 'static) -> Self {
        Effect::Nullary(Box::new(f))
    }

    pub fn unary(f: impl Fn(&mut FrameState, u32) -> EffectResult + Send + Sync + 'static) -> Self {
        Effect::Unary(Box::new(f))
    }

    pub fn apply(&self, state: &mut FrameState, arg: u32) -> EffectResult {
        match self {
            Effect::Nullary(f) => f(state),
            Effect::Unary(f) => f(state, arg),
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Nullary(_) => f.write_str("Effect::Nullary(..)"),
            Effect::Unary(_) => f.write_str("Effect::Unary(..)"),
        }
    }
}

/// The default effect for a mnemonic under the given configuration.
///
/// Exhaustive over the vocabulary so a new mnemonic cannot be added
/// without deciding its effect.
fn base_effect(mnemonic: Mnemonic, config: &IsaConfig) -> Effect {
    use Mnemonic::*;

    match mnemonic {
        Nop | Resume | DeleteGlobal => Effect::nullary(stack::nop),
        // Shifts keep the left operand's type, so they just drop one.
        PopTop | StoreGlobal | DeleteAttr | BinaryLshift | InplaceLshift | BinaryRshift
        | InplaceRshift => Effect::nullary(stack::pop_top),
        EndFor | StoreAttr => Effect::nullary(stack::pop_two),
        EndSend => Effect::nullary(stack::end_send),
        Copy => Effect::unary(stack::copy),
        Swap => Effect::unary(stack::swap),
        DupTop => Effect::nullary(stack::dup_top),
        RotTwo => Effect::nullary(stack::rot_two),
        RotThree => Effect::nullary(stack::rot_three),
        RotFour => Effect::nullary(stack::rot_four),
        RotN => Effect::unary(stack::rot_n),

        UnaryPositive | UnaryNegative | UnaryInvert => Effect::nullary(numeric::unary),
        UnaryNot | ToBool => Effect::nullary(numeric::unary_not),
        GetIter => Effect::nullary(container::get_iter),

        // Except for int ** -int, which actually yields float.
        BinaryAdd | InplaceAdd | BinarySubtract | InplaceSubtract | BinaryMultiply
        | InplaceMultiply | BinaryModulo | InplaceModulo | BinaryPower | InplacePower
        | BinaryFloorDivide | InplaceFloorDivide | BinaryAnd | InplaceAnd | BinaryOr
        | InplaceOr | BinaryXor | InplaceXor => Effect::nullary(numeric::symmetric_binary_op),
        BinaryTrueDivide | InplaceTrueDivide => Effect::nullary(numeric::binary_true_divide),
        BinaryOp => {
            let true_divides = config.true_divide_operands.clone();
            Effect::unary(move |state, arg| numeric::binary(state, true_divides.contains(&arg)))
        }

        BinarySubscr => Effect::nullary(container::binary_subscr),
        StoreSubscr => Effect::nullary(container::store_subscr),
        BinarySlice => Effect::nullary(container::binary_slice),
        StoreSlice => Effect::nullary(container::store_slice),
        BuildSlice => Effect::unary(container::build_slice),

        CompareOp | IsOp | ContainsOp => Effect::nullary(numeric::compare_op),

        BuildTuple => Effect::unary(container::build_tuple),
        BuildList => Effect::unary(container::build_list),
        BuildSet => Effect::unary(container::build_set),
        BuildMap => Effect::unary(container::build_map),
        BuildConstKeyMap => Effect::unary(container::build_const_key_map),
        BuildString => Effect::unary(container::build_string),
        BuildListUnpack => Effect::unary(container::build_list_unpack),
        BuildSetUnpack => Effect::unary(container::build_set_unpack),
        BuildTupleUnpack | BuildTupleUnpackWithCall => {
            Effect::unary(container::build_tuple_unpack)
        }
        BuildMapUnpack => Effect::unary(container::build_map_unpack),
        ListToTuple => Effect::nullary(container::list_to_tuple),

        ListAppend => Effect::unary(container::list_append),
        SetAdd => Effect::unary(container::set_add),
        MapAdd => Effect::unary(container::map_add),
        ListExtend => Effect::unary(container::list_extend),
        SetUpdate => Effect::unary(container::set_update),
        DictUpdate | DictMerge => Effect::unary(container::dict_update),

        UnpackSequence => Effect::unary(container::unpack_sequence),

        LoadAttr => {
            if config.shift_attr_index {
                Effect::unary(attr::load_attr_shifted)
            } else {
                Effect::unary(attr::load_attr)
            }
        }
        LoadMethod => Effect::unary(attr::load_method),

        LoadConst => Effect::unary(vars::load_const),
        LoadFast | LoadFastCheck => Effect::unary(vars::load_fast),
        LoadFastAndClear => Effect::unary(vars::load_fast_and_clear),
        LoadFastLoadFast => Effect::unary(vars::load_fast_pair),
        StoreFast => Effect::unary(vars::store_fast),
        StoreFastStoreFast => Effect::unary(vars::store_fast_pair),
        StoreFastLoadFast => Effect::unary(vars::store_fast_load_fast),
        DeleteFast => Effect::unary(vars::delete_fast),
        LoadClosure | LoadDeref => {
            if config.cell_index_offset_by_locals {
                Effect::unary(vars::load_cell_offset)
            } else {
                Effect::unary(vars::load_cell)
            }
        }
        LoadGlobal => {
            if config.shift_global_index {
                Effect::unary(vars::load_global_shifted)
            } else {
                Effect::unary(vars::load_global)
            }
        }
        LoadName => Effect::unary(vars::load_global),

        ImportName => Effect::nullary(vars::import_name),
        ImportFrom => Effect::nullary(vars::import_from),

        FormatValue => Effect::unary(function::format_value),
        FormatSimple | ConvertValue => Effect::nullary(function::format_simple),
        FormatWithSpec => Effect::nullary(function::format_with_spec),

        MakeFunction => {
            if config.explicit_function_attributes {
                Effect::nullary(function::make_function_simple)
            } else {
                Effect::unary(function::make_function_flags)
            }
        }
        SetFunctionAttribute => Effect::unary(function::set_function_attribute),
    }
}

/// The unrecognized-instruction fallback: give up on precise inference for
/// this instruction and widen to `Top`. Nothing is popped, since the
/// instruction's stack consumption is unknown.
fn unknown_mnemonic(state: &mut FrameState, name: &str) -> EffectResult {
    tracing::debug!(mnemonic = name, "unrecognized mnemonic, widening to Top");
    state.push(TypeValue::Top);
    Ok(())
}

/// Immutable mnemonic-to-effect mapping, built once per target
/// instruction-set version.
#[derive(Debug)]
pub struct EffectTable {
    config: IsaConfig,
    entries: HashMap<Mnemonic, Effect>,
    named: HashMap<String, Effect>,
}

impl EffectTable {
    pub fn for_version(version: IsaVersion) -> Self {
        Self::builder(version).build()
    }

    pub fn builder(version: IsaVersion) -> EffectTableBuilder {
        EffectTableBuilder {
            config: IsaConfig::for_version(version),
            overrides: HashMap::new(),
            named: HashMap::new(),
        }
    }

    pub fn config(&self) -> &IsaConfig {
        &self.config
    }

    /// Apply one decoded instruction to the frame.
    pub fn apply(&self, state: &mut FrameState, mnemonic: Mnemonic, arg: u32) -> EffectResult {
        match self.entries.get(&mnemonic) {
            Some(effect) => effect.apply(state, arg),
            // The table is total over the vocabulary; kept as a degrade
            // path rather than a panic.
            None => unknown_mnemonic(state, mnemonic.name()),
        }
    }

    /// Apply an instruction given its raw decoder spelling. Names outside
    /// the vocabulary degrade to `Top` instead of failing the analysis.
    pub fn apply_named(&self, state: &mut FrameState, name: &str, arg: u32) -> EffectResult {
        if let Some(effect) = self.named.get(name) {
            return effect.apply(state, arg);
        }
        match Mnemonic::parse(name) {
            Some(mnemonic) => self.apply(state, mnemonic, arg),
            None => unknown_mnemonic(state, name),
        }
    }
}

/// Registration interface for instruction-set variants: override built-in
/// effects or add effects for mnemonics outside the vocabulary. Consumed
/// by integration setup, not by per-call analysis.
#[derive(Debug)]
pub struct EffectTableBuilder {
    config: IsaConfig,
    overrides: HashMap<Mnemonic, Effect>,
    named: HashMap<String, Effect>,
}

impl EffectTableBuilder {
    pub fn override_effect(mut self, mnemonic: Mnemonic, effect: Effect) -> Self {
        self.overrides.insert(mnemonic, effect);
        self
    }

    pub fn register_named(mut self, name: impl Into<String>, effect: Effect) -> Self {
        self.named.insert(name.into(), effect);
        self
    }

    pub fn build(self) -> EffectTable {
        let mut entries = HashMap::with_capacity(Mnemonic::ALL.len());
        for &mnemonic in Mnemonic::ALL {
            entries.insert(mnemonic, base_effect(mnemonic, &self.config));
        }
        entries.extend(self.overrides);
        EffectTable {
            config: self.config,
            entries,
            named: self.named,
        }
    }
}
