//! The type lattice: symbolic type values and the join operator.
//!
//! Every value the engine reasons about is a [`TypeValue`]. The lattice is
//! bounded by [`TypeValue::Top`] (unconstrained) and [`TypeValue::Bottom`]
//! (the empty union, the element type of a container nothing has been put
//! into yet). [`join`] computes the least upper bound of two values and is
//! the single widening operator used everywhere: branch merges, container
//! element folding, and in-place container updates.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Scalar kinds.
///
/// The numeric kinds form the promotion ladder `Bool < Int < Float <
/// Complex` used for arithmetic widening. `Str`, `Bytes` and `None` carry
/// no promotion rank and only participate in the structural join rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scalar {
    Bool,
    Int,
    Float,
    Complex,
    Str,
    Bytes,
    None,
}

impl Scalar {
    /// Position on the numeric promotion ladder, if this kind is numeric.
    pub fn numeric_rank(self) -> Option<u8> {
        match self {
            Scalar::Bool => Some(0),
            Scalar::Int => Some(1),
            Scalar::Float => Some(2),
            Scalar::Complex => Some(3),
            Scalar::Str | Scalar::Bytes | Scalar::None => None,
        }
    }

    fn from_rank(rank: u8) -> Scalar {
        match rank {
            0 => Scalar::Bool,
            1 => Scalar::Int,
            2 => Scalar::Float,
            _ => Scalar::Complex,
        }
    }
}

/// An opaque reference to a function body, as found in a constant pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRef {
    pub name: String,
}

impl CodeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// A code reference whose identity could not be recovered from the
    /// operand it was built from.
    pub fn opaque() -> Self {
        Self {
            name: "<code>".into(),
        }
    }
}

/// A function or method reference.
///
/// `receiver` is set when the callable was produced by binding a row
/// member to its record; `cells` carries the captured-variable types when
/// the callable was assembled with a closure tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallableRef {
    pub code: CodeRef,
    pub qualname: Option<String>,
    pub receiver: Option<Box<TypeValue>>,
    pub cells: Vec<TypeValue>,
}

impl CallableRef {
    pub fn new(code: CodeRef) -> Self {
        Self {
            code,
            qualname: None,
            receiver: None,
            cells: Vec::new(),
        }
    }

    pub fn with_qualname(mut self, qualname: impl Into<String>) -> Self {
        self.qualname = Some(qualname.into());
        self
    }

    pub fn with_cells(mut self, cells: Vec<TypeValue>) -> Self {
        self.cells = cells;
        self
    }

    pub fn bound_to(mut self, receiver: TypeValue) -> Self {
        self.receiver = Some(Box::new(receiver));
        self
    }
}

/// A literal value carried by [`TypeValue::Const`].
///
/// Constant pools hold these; effects wrap them in `Const` so the exact
/// value stays available for attribute lookup, known-index access, and
/// exact-arity unpacking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<Literal>),
    List(Vec<Literal>),
    /// A structured record whose fields are addressable by attribute
    /// resolution.
    Record(Vec<(String, Literal)>),
    /// A function body reference, the operand of callable construction.
    Code(CodeRef),
    /// An assembled callable. Never appears in constant pools; produced by
    /// the callable-construction and member-binding effects.
    Func(CallableRef),
}

impl Literal {
    /// The structural type of this literal, with constness stripped.
    pub fn structural_type(&self) -> TypeValue {
        match self {
            Literal::None => TypeValue::NONE,
            Literal::Bool(_) => TypeValue::BOOL,
            Literal::Int(_) => TypeValue::INT,
            Literal::Float(_) => TypeValue::FLOAT,
            Literal::Str(_) => TypeValue::STR,
            Literal::Bytes(_) => TypeValue::BYTES,
            Literal::Tuple(items) => {
                TypeValue::Tuple(items.iter().map(Literal::structural_type).collect())
            }
            Literal::List(items) => {
                let elem = items
                    .iter()
                    .fold(TypeValue::Bottom, |acc, item| join(&acc, &item.structural_type()));
                TypeValue::List(Box::new(elem))
            }
            Literal::Record(fields) => TypeValue::Row(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.structural_type()))
                    .collect(),
            ),
            Literal::Code(code) => TypeValue::Callable(Box::new(CallableRef::new(code.clone()))),
            Literal::Func(func) => TypeValue::Callable(Box::new(func.clone())),
        }
    }

    /// A named field of a record literal, for attribute resolution.
    pub fn field(&self, name: &str) -> Option<&Literal> {
        match self {
            Literal::Record(fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// The per-element literals of a sequence literal, for exact-arity
    /// unpacking. Returns `None` when the literal is not a sequence.
    pub fn unpack_elements(&self) -> Option<Vec<Literal>> {
        match self {
            Literal::Tuple(items) | Literal::List(items) => Some(items.clone()),
            Literal::Str(s) => Some(s.chars().map(|c| Literal::Str(c.to_string())).collect()),
            Literal::Bytes(b) => Some(b.iter().map(|&byte| Literal::Int(byte as i64)).collect()),
            _ => None,
        }
    }
}

/// A symbolic type value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeValue {
    /// Unconstrained — the lattice maximum.
    Top,
    /// The empty union — the element type of a container before any
    /// element has been seen. Identity for [`join`].
    Bottom,
    /// A literal whose exact value is statically known.
    Const(Literal),
    Primitive(Scalar),
    /// Homogeneous list-like container.
    List(Box<TypeValue>),
    /// Homogeneous set-like container.
    Set(Box<TypeValue>),
    /// Fixed-arity tuple with per-position types.
    Tuple(Vec<TypeValue>),
    /// Fixed-open tuple: zero or more elements of one type.
    TupleOf(Box<TypeValue>),
    /// An iterator over elements of one type.
    Iter(Box<TypeValue>),
    /// Associative container.
    Dict(Box<TypeValue>, Box<TypeValue>),
    /// A slice object, so indexed access can recognize slice-shaped
    /// indices structurally.
    Slice,
    Callable(Box<CallableRef>),
    /// Structural record: field name to field type.
    Row(IndexMap<String, TypeValue>),
}

impl TypeValue {
    pub const BOOL: TypeValue = TypeValue::Primitive(Scalar::Bool);
    pub const INT: TypeValue = TypeValue::Primitive(Scalar::Int);
    pub const FLOAT: TypeValue = TypeValue::Primitive(Scalar::Float);
    pub const COMPLEX: TypeValue = TypeValue::Primitive(Scalar::Complex);
    pub const STR: TypeValue = TypeValue::Primitive(Scalar::Str);
    pub const BYTES: TypeValue = TypeValue::Primitive(Scalar::Bytes);
    pub const NONE: TypeValue = TypeValue::Primitive(Scalar::None);

    /// Strip a `Const` wrapper down to its structural type. Every other
    /// value is returned unchanged.
    pub fn unwrap_const(&self) -> TypeValue {
        match self {
            TypeValue::Const(lit) => lit.structural_type(),
            other => other.clone(),
        }
    }

    /// The numeric promotion rank, if this is a numeric scalar.
    pub fn numeric_rank(&self) -> Option<u8> {
        match self {
            TypeValue::Primitive(kind) => kind.numeric_rank(),
            _ => None,
        }
    }

    /// True for the variadic and fixed-arity sequence constructors.
    pub fn is_sequence(&self) -> bool {
        matches!(
            self,
            TypeValue::List(_)
                | TypeValue::Set(_)
                | TypeValue::Tuple(_)
                | TypeValue::TupleOf(_)
                | TypeValue::Iter(_)
        )
    }

    /// True for sequences and textual scalars: the operand shapes that
    /// survive repetition-style multiplication by a numeric.
    pub fn is_repeatable(&self) -> bool {
        self.is_sequence()
            || matches!(self, TypeValue::Primitive(Scalar::Str | Scalar::Bytes))
    }
}

impl std::fmt::Display for TypeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeValue::Top => write!(f, "Any"),
            TypeValue::Bottom => write!(f, "Empty"),
            TypeValue::Const(lit) => write!(f, "Const[{}]", lit.structural_type()),
            TypeValue::Primitive(Scalar::Bool) => write!(f, "bool"),
            TypeValue::Primitive(Scalar::Int) => write!(f, "int"),
            TypeValue::Primitive(Scalar::Float) => write!(f, "float"),
            TypeValue::Primitive(Scalar::Complex) => write!(f, "complex"),
            TypeValue::Primitive(Scalar::Str) => write!(f, "str"),
            TypeValue::Primitive(Scalar::Bytes) => write!(f, "bytes"),
            TypeValue::Primitive(Scalar::None) => write!(f, "None"),
            TypeValue::List(elem) => write!(f, "List[{elem}]"),
            TypeValue::Set(elem) => write!(f, "Set[{elem}]"),
            TypeValue::Tuple(items) => {
                write!(f, "Tuple[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            TypeValue::TupleOf(elem) => write!(f, "Tuple[{elem}, ...]"),
            TypeValue::Iter(elem) => write!(f, "Iter[{elem}]"),
            TypeValue::Dict(key, value) => write!(f, "Dict[{key}, {value}]"),
            TypeValue::Slice => write!(f, "slice"),
            TypeValue::Callable(call) => match &call.qualname {
                Some(name) => write!(f, "Callable[{name}]"),
                None => write!(f, "Callable[{}]", call.code.name),
            },
            TypeValue::Row(fields) => {
                write!(f, "Row[")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Least upper bound of two type values.
///
/// `Bottom` is the identity and `Top` absorbs. Identical `Const` literals
/// stay `Const`; otherwise constness is stripped before comparing. Same-kind
/// containers widen elementwise, numeric scalars promote along the ladder,
/// and anything else meets at `Top`.
pub fn join(a: &TypeValue, b: &TypeValue) -> TypeValue {
    use TypeValue::*;

    match (a, b) {
        (Bottom, other) | (other, Bottom) => return other.clone(),
        (Top, _) | (_, Top) => return Top,
        (Const(x), Const(y)) if x == y => return Const(x.clone()),
        _ => {}
    }

    let a = a.unwrap_const();
    let b = b.unwrap_const();
    if a == b {
        return a;
    }

    match (&a, &b) {
        (List(x), List(y)) => List(Box::new(join(x, y))),
        (Set(x), Set(y)) => Set(Box::new(join(x, y))),
        (Iter(x), Iter(y)) => Iter(Box::new(join(x, y))),
        (TupleOf(x), TupleOf(y)) => TupleOf(Box::new(join(x, y))),
        (Tuple(xs), Tuple(ys)) if xs.len() == ys.len() => {
            Tuple(xs.iter().zip(ys).map(|(x, y)| join(x, y)).collect())
        }
        // Tuple-like values of differing shape widen to an open tuple.
        (Tuple(_), Tuple(_)) | (Tuple(_), TupleOf(_)) | (TupleOf(_), Tuple(_)) => {
            TupleOf(Box::new(join(&element_type(&a), &element_type(&b))))
        }
        (Dict(k1, v1), Dict(k2, v2)) => Dict(Box::new(join(k1, k2)), Box::new(join(v1, v2))),
        (Primitive(x), Primitive(y)) => match (x.numeric_rank(), y.numeric_rank()) {
            (Some(rx), Some(ry)) => Primitive(Scalar::from_rank(rx.max(ry))),
            _ => Top,
        },
        _ => Top,
    }
}

/// The widened per-element type of a container.
///
/// Fixed-arity tuples fold their positional types; dict iteration yields
/// keys; indexing `str` yields `str` and `bytes` yields `int`. Anything
/// without elements widens to `Top`.
pub fn element_type(t: &TypeValue) -> TypeValue {
    use TypeValue::*;

    match t {
        Top => Top,
        Bottom => Bottom,
        Const(lit) => element_type(&lit.structural_type()),
        List(elem) | Set(elem) | Iter(elem) | TupleOf(elem) => (**elem).clone(),
        Tuple(items) => items.iter().fold(Bottom, |acc, item| join(&acc, item)),
        Dict(key, _) => (**key).clone(),
        Primitive(Scalar::Str) => TypeValue::STR,
        Primitive(Scalar::Bytes) => TypeValue::INT,
        _ => Top,
    }
}

/// Split the element type of a pair-iterable into `(key, value)`.
///
/// A two-element tuple yields its positions; anything else yields
/// `(Top, Top)`.
pub fn key_value_types(elem: &TypeValue) -> (TypeValue, TypeValue) {
    match elem {
        TypeValue::Tuple(items) if items.len() == 2 => (items[0].clone(), items[1].clone()),
        _ => (TypeValue::Top, TypeValue::Top),
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use quickcheck::{quickcheck, Arbitrary, Gen};

    /// A generator over the scalar-and-container fragment of the lattice.
    /// Float literals are excluded so idempotence is not confounded by
    /// NaN's reflexive inequality.
    #[derive(Debug, Clone)]
    struct SmallType(TypeValue);

    fn gen_type(g: &mut Gen, depth: usize) -> TypeValue {
        let scalars = [
            TypeValue::Top,
            TypeValue::Bottom,
            TypeValue::BOOL,
            TypeValue::INT,
            TypeValue::FLOAT,
            TypeValue::COMPLEX,
            TypeValue::STR,
            TypeValue::BYTES,
            TypeValue::NONE,
            TypeValue::Const(Literal::Int(3)),
            TypeValue::Const(Literal::Str("k".into())),
            TypeValue::Const(Literal::Bool(true)),
        ];
        if depth == 0 {
            return g.choose(&scalars).cloned().unwrap_or(TypeValue::Top);
        }
        match u8::arbitrary(g) % 7 {
            0 => TypeValue::List(Box::new(gen_type(g, depth - 1))),
            1 => TypeValue::Set(Box::new(gen_type(g, depth - 1))),
            2 => TypeValue::Tuple(vec![gen_type(g, depth - 1), gen_type(g, depth - 1)]),
            3 => TypeValue::TupleOf(Box::new(gen_type(g, depth - 1))),
            4 => TypeValue::Dict(
                Box::new(gen_type(g, depth - 1)),
                Box::new(gen_type(g, depth - 1)),
            ),
            _ => g.choose(&scalars).cloned().unwrap_or(TypeValue::Top),
        }
    }

    impl Arbitrary for SmallType {
        fn arbitrary(g: &mut Gen) -> Self {
            SmallType(gen_type(g, 2))
        }
    }

    quickcheck! {
        fn join_is_commutative(a: SmallType, b: SmallType) -> bool {
            join(&a.0, &b.0) == join(&b.0, &a.0)
        }

        fn join_is_idempotent(a: SmallType) -> bool {
            join(&a.0, &a.0) == a.0
        }

        fn join_with_bottom_is_identity(a: SmallType) -> bool {
            join(&a.0, &TypeValue::Bottom) == a.0
        }

        fn join_with_top_is_top(a: SmallType) -> bool {
            join(&a.0, &TypeValue::Top) == TypeValue::Top
        }
    }
}
