//! Instruction-set vocabulary and per-version configuration.
//!
//! [`Mnemonic`] is the closed set of instructions the engine models.
//! [`IsaConfig`] captures everything that differs between instruction-set
//! generations — operand encodings, index shifts, which operator arguments
//! denote true division — as one immutable value built exactly once when
//! an effect table is constructed. Effect functions never inspect the
//! version; version-dependent behavior is baked into the table at build
//! time.

use serde::{Deserialize, Serialize};

/// A supported instruction-set generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IsaVersion {
    /// Rotation-based stack shuffles, per-operator binary mnemonics,
    /// flag-driven formatting and callable construction.
    V310,
    /// Argument-selected `BINARY_OP`, `COPY`/`SWAP`, flag bit in the
    /// global-load index, cell indices offset past the local slots.
    V311,
    /// Flag bit in the attribute-load index, dedicated slice instructions.
    V312,
    /// Explicit formatting forms, `TO_BOOL`, and the fixed-arity
    /// callable-construction encoding.
    V313,
}

impl IsaVersion {
    pub fn name(self) -> &'static str {
        match self {
            IsaVersion::V310 => "3.10",
            IsaVersion::V311 => "3.11",
            IsaVersion::V312 => "3.12",
            IsaVersion::V313 => "3.13",
        }
    }
}

impl std::fmt::Display for IsaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for IsaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3.10" | "310" | "v310" => Ok(IsaVersion::V310),
            "3.11" | "311" | "v311" => Ok(IsaVersion::V311),
            "3.12" | "312" | "v312" => Ok(IsaVersion::V312),
            "3.13" | "313" | "v313" => Ok(IsaVersion::V313),
            other => Err(format!("unsupported instruction-set version: {other}")),
        }
    }
}

/// `BINARY_OP` operator arguments that denote true division, per the
/// argument-selected operator table introduced in [`IsaVersion::V311`].
const TRUE_DIVIDE_OPERANDS: &[u32] = &[11, 24];

/// Immutable per-version configuration, built once per effect table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsaConfig {
    pub version: IsaVersion,
    /// `BINARY_OP` arguments that select true division and therefore
    /// promote an int/int operand pair to float.
    pub true_divide_operands: Box<[u32]>,
    /// The global-load index carries a flag in its lowest bit.
    pub shift_global_index: bool,
    /// The attribute-load index carries a flag in its lowest bit.
    pub shift_attr_index: bool,
    /// Closure-cell indices are offset past the local slots.
    pub cell_index_offset_by_locals: bool,
    /// Callable construction pops only the code reference; optional parts
    /// are attached by a separate explicit instruction.
    pub explicit_function_attributes: bool,
}

impl IsaConfig {
    pub fn for_version(version: IsaVersion) -> Self {
        Self {
            version,
            true_divide_operands: if version >= IsaVersion::V311 {
                TRUE_DIVIDE_OPERANDS.into()
            } else {
                Box::default()
            },
            shift_global_index: version >= IsaVersion::V311,
            shift_attr_index: version >= IsaVersion::V312,
            cell_index_offset_by_locals: version >= IsaVersion::V311,
            explicit_function_attributes: version >= IsaVersion::V313,
        }
    }

    pub fn is_true_divide(&self, operand: u32) -> bool {
        self.true_divide_operands.contains(&operand)
    }
}

macro_rules! mnemonics {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// The closed instruction vocabulary.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum Mnemonic {
            $($variant,)+
        }

        impl Mnemonic {
            /// Every mnemonic, in declaration order.
            pub const ALL: &'static [Mnemonic] = &[$(Mnemonic::$variant,)+];

            /// The canonical decoder spelling.
            pub fn name(self) -> &'static str {
                match self {
                    $(Mnemonic::$variant => $name,)+
                }
            }

            /// Parse a decoder spelling, case-insensitively. `None` for
            /// anything outside the vocabulary.
            pub fn parse(name: &str) -> Option<Mnemonic> {
                match name.to_ascii_uppercase().as_str() {
                    $($name => Some(Mnemonic::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

mnemonics! {
    // Stack shape
    Nop => "NOP",
    Resume => "RESUME",
    PopTop => "POP_TOP",
    EndFor => "END_FOR",
    EndSend => "END_SEND",
    Copy => "COPY",
    Swap => "SWAP",
    DupTop => "DUP_TOP",
    RotTwo => "ROT_TWO",
    RotThree => "ROT_THREE",
    RotFour => "ROT_FOUR",
    RotN => "ROT_N",

    // Unary
    UnaryPositive => "UNARY_POSITIVE",
    UnaryNegative => "UNARY_NEGATIVE",
    UnaryInvert => "UNARY_INVERT",
    UnaryNot => "UNARY_NOT",
    ToBool => "TO_BOOL",
    GetIter => "GET_ITER",

    // Symmetric binary, per-operator encoding
    BinaryAdd => "BINARY_ADD",
    InplaceAdd => "INPLACE_ADD",
    BinarySubtract => "BINARY_SUBTRACT",
    InplaceSubtract => "INPLACE_SUBTRACT",
    BinaryMultiply => "BINARY_MULTIPLY",
    InplaceMultiply => "INPLACE_MULTIPLY",
    BinaryModulo => "BINARY_MODULO",
    InplaceModulo => "INPLACE_MODULO",
    BinaryPower => "BINARY_POWER",
    InplacePower => "INPLACE_POWER",
    BinaryFloorDivide => "BINARY_FLOOR_DIVIDE",
    InplaceFloorDivide => "INPLACE_FLOOR_DIVIDE",
    BinaryTrueDivide => "BINARY_TRUE_DIVIDE",
    InplaceTrueDivide => "INPLACE_TRUE_DIVIDE",
    BinaryAnd => "BINARY_AND",
    InplaceAnd => "INPLACE_AND",
    BinaryOr => "BINARY_OR",
    InplaceOr => "INPLACE_OR",
    BinaryXor => "BINARY_XOR",
    InplaceXor => "INPLACE_XOR",
    BinaryLshift => "BINARY_LSHIFT",
    InplaceLshift => "INPLACE_LSHIFT",
    BinaryRshift => "BINARY_RSHIFT",
    InplaceRshift => "INPLACE_RSHIFT",
    // Argument-selected encoding
    BinaryOp => "BINARY_OP",

    // Subscripts and slices
    BinarySubscr => "BINARY_SUBSCR",
    StoreSubscr => "STORE_SUBSCR",
    BinarySlice => "BINARY_SLICE",
    StoreSlice => "STORE_SLICE",
    BuildSlice => "BUILD_SLICE",

    // Comparison and containment
    CompareOp => "COMPARE_OP",
    IsOp => "IS_OP",
    ContainsOp => "CONTAINS_OP",

    // Container construction
    BuildTuple => "BUILD_TUPLE",
    BuildList => "BUILD_LIST",
    BuildSet => "BUILD_SET",
    BuildMap => "BUILD_MAP",
    BuildConstKeyMap => "BUILD_CONST_KEY_MAP",
    BuildString => "BUILD_STRING",
    BuildListUnpack => "BUILD_LIST_UNPACK",
    BuildSetUnpack => "BUILD_SET_UNPACK",
    BuildTupleUnpack => "BUILD_TUPLE_UNPACK",
    BuildTupleUnpackWithCall => "BUILD_TUPLE_UNPACK_WITH_CALL",
    BuildMapUnpack => "BUILD_MAP_UNPACK",
    ListToTuple => "LIST_TO_TUPLE",

    // In-place container growth
    ListAppend => "LIST_APPEND",
    SetAdd => "SET_ADD",
    MapAdd => "MAP_ADD",
    ListExtend => "LIST_EXTEND",
    SetUpdate => "SET_UPDATE",
    DictUpdate => "DICT_UPDATE",
    DictMerge => "DICT_MERGE",

    // Unpacking
    UnpackSequence => "UNPACK_SEQUENCE",

    // Attributes
    LoadAttr => "LOAD_ATTR",
    LoadMethod => "LOAD_METHOD",
    StoreAttr => "STORE_ATTR",
    DeleteAttr => "DELETE_ATTR",

    // Constants, locals, cells, globals
    LoadConst => "LOAD_CONST",
    LoadFast => "LOAD_FAST",
    LoadFastCheck => "LOAD_FAST_CHECK",
    LoadFastAndClear => "LOAD_FAST_AND_CLEAR",
    LoadFastLoadFast => "LOAD_FAST_LOAD_FAST",
    StoreFast => "STORE_FAST",
    StoreFastStoreFast => "STORE_FAST_STORE_FAST",
    StoreFastLoadFast => "STORE_FAST_LOAD_FAST",
    DeleteFast => "DELETE_FAST",
    LoadClosure => "LOAD_CLOSURE",
    LoadDeref => "LOAD_DEREF",
    LoadGlobal => "LOAD_GLOBAL",
    LoadName => "LOAD_NAME",
    StoreGlobal => "STORE_GLOBAL",
    DeleteGlobal => "DELETE_GLOBAL",

    // Imports
    ImportName => "IMPORT_NAME",
    ImportFrom => "IMPORT_FROM",

    // Formatting
    FormatValue => "FORMAT_VALUE",
    FormatSimple => "FORMAT_SIMPLE",
    FormatWithSpec => "FORMAT_WITH_SPEC",
    ConvertValue => "CONVERT_VALUE",

    // Callable construction
    MakeFunction => "MAKE_FUNCTION",
    SetFunctionAttribute => "SET_FUNCTION_ATTRIBUTE",
}

impl std::fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
