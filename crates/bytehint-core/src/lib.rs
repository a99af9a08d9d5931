//! # Bytehint Core
//!
//! Static type inference for stack-machine bytecode: given a function
//! body as decoded instructions plus the types of its inputs, compute an
//! upper-bound type for every value it could produce — without executing
//! it.
//!
//! The crate is the per-instruction half of that job. An external driver
//! owns decoding and control flow; for each instruction it looks up the
//! effect in an [`EffectTable`] and applies it to a [`FrameState`]. The
//! inferred result type is whatever sits on top of the operand stack when
//! the driver reaches the function's exit.
//!
//! ## Modules
//!
//! - **[`lattice`]** - Symbolic type values and the `join` operator
//! - **[`frame`]** - The per-analysis frame: stack, locals, cells, pools
//! - **[`effects`]** - One effect per instruction, assembled per version
//! - **[`isa`]** - Instruction vocabulary and per-version configuration
//!
//! ## Quick Start
//!
//! ```
//! use bytehint_core::{EffectTable, FrameState, IsaVersion, Literal, Mnemonic, TypeValue};
//!
//! let table = EffectTable::for_version(IsaVersion::V312);
//! let mut frame = FrameState::new()
//!     .with_locals(vec![Some(TypeValue::INT)])
//!     .with_consts(vec![Literal::Int(1)]);
//!
//! table.apply(&mut frame, Mnemonic::LoadFast, 0).unwrap();
//! table.apply(&mut frame, Mnemonic::LoadConst, 0).unwrap();
//! table.apply(&mut frame, Mnemonic::BinaryAdd, 0).unwrap();
//!
//! assert_eq!(frame.top(), Some(&TypeValue::INT));
//! ```

pub mod effects;
pub mod error;
pub mod frame;
pub mod isa;
pub mod lattice;

pub use effects::{Effect, EffectTable, EffectTableBuilder};
pub use error::{EffectError, EffectResult};
pub use frame::{FrameState, MapResolver, ResolveName};
pub use isa::{IsaConfig, IsaVersion, Mnemonic};
pub use lattice::{
    element_type, join, key_value_types, CallableRef, CodeRef, Literal, Scalar, TypeValue,
};
