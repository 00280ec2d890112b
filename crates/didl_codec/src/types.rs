//! Structural type model
//!
//! [`Type`] is a closed set of primitive and constructed variants. Schemas are
//! built once and shared read-only; the only mutable piece is
//! [`RecursiveType`], a slot that is filled exactly once after the types that
//! refer to it have been built.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::hash::{id_label, idl_label_to_id};
use crate::{Error, Result, Value, MAX_RECURSION_DEPTH};

/// Wire opcodes
pub mod opcode {
    pub const NULL: i64 = -1;
    pub const BOOL: i64 = -2;
    pub const NAT: i64 = -3;
    pub const INT: i64 = -4;
    pub const NAT8: i64 = -5;
    pub const NAT16: i64 = -6;
    pub const NAT32: i64 = -7;
    pub const NAT64: i64 = -8;
    pub const INT8: i64 = -9;
    pub const INT16: i64 = -10;
    pub const INT32: i64 = -11;
    pub const INT64: i64 = -12;
    pub const FLOAT32: i64 = -13;
    pub const FLOAT64: i64 = -14;
    pub const TEXT: i64 = -15;
    pub const RESERVED: i64 = -16;
    pub const EMPTY: i64 = -17;
    pub const OPT: i64 = -18;
    pub const VECTOR: i64 = -19;
    pub const RECORD: i64 = -20;
    pub const VARIANT: i64 = -21;
    pub const FUNC: i64 = -22;
    pub const SERVICE: i64 = -23;
    pub const PRINCIPAL: i64 = -24;

    /// Opcodes below this one are reserved for future types
    pub const LAST_KNOWN: i64 = PRINCIPAL;

    /// True for opcodes that name a primitive type
    pub fn is_primitive(op: i64) -> bool {
        (EMPTY..=NULL).contains(&op) || op == PRINCIPAL
    }

    /// Candid name of a primitive opcode
    pub fn primitive_name(op: i64) -> Option<&'static str> {
        Some(match op {
            NULL => "null",
            BOOL => "bool",
            NAT => "nat",
            INT => "int",
            NAT8 => "nat8",
            NAT16 => "nat16",
            NAT32 => "nat32",
            NAT64 => "nat64",
            INT8 => "int8",
            INT16 => "int16",
            INT32 => "int32",
            INT64 => "int64",
            FLOAT32 => "float32",
            FLOAT64 => "float64",
            TEXT => "text",
            RESERVED => "reserved",
            EMPTY => "empty",
            PRINCIPAL => "principal",
            _ => return None,
        })
    }
}

/// Function annotation
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FuncMode {
    Query = 1,
    Oneway = 2,
    CompositeQuery = 3,
}

impl FuncMode {
    /// Parse an annotation byte
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Query),
            2 => Some(Self::Oneway),
            3 => Some(Self::CompositeQuery),
            _ => None,
        }
    }

    /// Annotation keyword
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Oneway => "oneway",
            Self::CompositeQuery => "composite_query",
        }
    }
}

/// A named record or variant field
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Label as written by the schema author
    pub name: String,
    /// Wire id derived from the name
    pub id: u32,
    /// Field type
    pub ty: Type,
}

impl Field {
    /// Create a field, deriving its id from the name
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        let name = name.into();
        let id = idl_label_to_id(&name);
        Self { name, id, ty }
    }

    /// Create a field known only by its wire id
    pub fn unnamed(id: u32, ty: Type) -> Self {
        Self {
            name: id_label(id),
            id,
            ty,
        }
    }
}

/// Function signature
#[derive(Clone, Debug, PartialEq)]
pub struct FuncType {
    pub args: Vec<Type>,
    pub rets: Vec<Type>,
    pub modes: Vec<FuncMode>,
}

/// A service method
#[derive(Clone, Debug, PartialEq)]
pub struct Method {
    pub name: String,
    pub ty: Type,
}

/// Placeholder for a type that refers to itself
///
/// Clones share the same slot; equality is identity.
#[derive(Clone, Default)]
pub struct RecursiveType(Arc<OnceLock<Type>>);

impl RecursiveType {
    /// Create an unfilled placeholder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body; a placeholder can be filled only once
    ///
    /// A body that is this placeholder, directly or through a chain of
    /// other placeholders, is rejected with [`Error::CyclicType`].
    pub fn fill(&self, ty: Type) -> Result<()> {
        if self.0.get().is_some() {
            return Err(Error::AlreadyFilled);
        }
        let mut current = &ty;
        for _ in 0..MAX_RECURSION_DEPTH {
            match current {
                Type::Recursive(rec) if rec == self => return Err(Error::CyclicType),
                Type::Recursive(rec) => match rec.0.get() {
                    Some(body) => current = body,
                    None => break,
                },
                _ => break,
            }
        }
        self.0.set(ty).map_err(|_| Error::AlreadyFilled)
    }

    /// The body, if filled
    pub fn get(&self) -> Result<&Type> {
        self.0.get().ok_or(Error::UninitializedType)
    }

    pub fn is_filled(&self) -> bool {
        self.0.get().is_some()
    }

    /// Identity of the shared slot
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// This placeholder as a type
    pub fn as_type(&self) -> Type {
        Type::Recursive(self.clone())
    }
}

impl PartialEq for RecursiveType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RecursiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecursiveType(μ{:x}, filled: {})", self.id(), self.is_filled())
    }
}

/// A Candid type
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Null,
    Bool,
    Nat,
    Int,
    Nat8,
    Nat16,
    Nat32,
    Nat64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    Reserved,
    Empty,
    Principal,
    Vector(Box<Type>),
    Opt(Box<Type>),
    /// Fields sorted by id, ids unique
    Record(Vec<Field>),
    /// Fields sorted by id, ids unique
    Variant(Vec<Field>),
    /// Positional record with ids `0..n`
    Tuple(Vec<Type>),
    Func(FuncType),
    /// Methods sorted by name, names unique
    Service(Vec<Method>),
    Recursive(RecursiveType),
}

impl Type {
    // ─────────────────────────────────────────────────────────────────────
    // Constructors
    // ─────────────────────────────────────────────────────────────────────

    /// `vec inner`
    pub fn vec(inner: Type) -> Self {
        Type::Vector(Box::new(inner))
    }

    /// `opt inner`
    pub fn opt(inner: Type) -> Self {
        Type::Opt(Box::new(inner))
    }

    /// `record { .. }` with fields canonicalized by label id
    pub fn record<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        Ok(Type::Record(canonical_fields(fields)?))
    }

    /// `variant { .. }` with fields canonicalized by label id
    pub fn variant<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        Ok(Type::Variant(canonical_fields(fields)?))
    }

    /// `record { t0; t1; .. }`
    pub fn tuple(types: impl IntoIterator<Item = Type>) -> Self {
        Type::Tuple(types.into_iter().collect())
    }

    /// `func (args) -> (rets) modes`
    pub fn func(args: Vec<Type>, rets: Vec<Type>, modes: Vec<FuncMode>) -> Self {
        Type::Func(FuncType { args, rets, modes })
    }

    /// `service { .. }` with methods sorted by name
    pub fn service<I, S>(methods: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        let mut methods: Vec<Method> = methods
            .into_iter()
            .map(|(name, ty)| Method {
                name: name.into(),
                ty,
            })
            .collect();
        for method in &methods {
            if !matches!(method.ty, Type::Func(_) | Type::Recursive(_)) {
                return Err(Error::mismatch("func", &method.ty));
            }
        }
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = methods.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(Error::DuplicateMethod(pair[0].name.clone()));
        }
        Ok(Type::Service(methods))
    }

    /// Unfilled placeholder for a self-referential type
    ///
    /// ```
    /// use didl_codec::Type;
    ///
    /// let list = Type::recursive();
    /// let body = Type::record([("head", Type::Int), ("tail", Type::opt(list.as_type()))])?;
    /// list.fill(body)?;
    /// assert!(list.is_filled());
    /// # Ok::<(), didl_codec::Error>(())
    /// ```
    pub fn recursive() -> RecursiveType {
        RecursiveType::new()
    }

    /// `nat8` .. `nat64`
    pub fn fixed_nat(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(Type::Nat8),
            16 => Ok(Type::Nat16),
            32 => Ok(Type::Nat32),
            64 => Ok(Type::Nat64),
            _ => Err(Error::InvalidWidth(bits)),
        }
    }

    /// `int8` .. `int64`
    pub fn fixed_int(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(Type::Int8),
            16 => Ok(Type::Int16),
            32 => Ok(Type::Int32),
            64 => Ok(Type::Int64),
            _ => Err(Error::InvalidWidth(bits)),
        }
    }

    /// `float32` or `float64`
    pub fn float(bits: u32) -> Result<Self> {
        match bits {
            32 => Ok(Type::Float32),
            64 => Ok(Type::Float64),
            _ => Err(Error::InvalidWidth(bits)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────

    /// Opcode of a primitive type
    pub fn primitive_opcode(&self) -> Option<i64> {
        Some(match self {
            Type::Null => opcode::NULL,
            Type::Bool => opcode::BOOL,
            Type::Nat => opcode::NAT,
            Type::Int => opcode::INT,
            Type::Nat8 => opcode::NAT8,
            Type::Nat16 => opcode::NAT16,
            Type::Nat32 => opcode::NAT32,
            Type::Nat64 => opcode::NAT64,
            Type::Int8 => opcode::INT8,
            Type::Int16 => opcode::INT16,
            Type::Int32 => opcode::INT32,
            Type::Int64 => opcode::INT64,
            Type::Float32 => opcode::FLOAT32,
            Type::Float64 => opcode::FLOAT64,
            Type::Text => opcode::TEXT,
            Type::Reserved => opcode::RESERVED,
            Type::Empty => opcode::EMPTY,
            Type::Principal => opcode::PRINCIPAL,
            _ => return None,
        })
    }

    /// True for types encoded by a fixed opcode instead of a table entry
    pub fn is_primitive(&self) -> bool {
        self.primitive_opcode().is_some()
    }

    /// Primitive opcode or constructor opcode, resolving recursion
    pub fn opcode(&self) -> Result<i64> {
        if let Some(op) = self.primitive_opcode() {
            return Ok(op);
        }
        Ok(match self.resolve()? {
            Type::Vector(_) => opcode::VECTOR,
            Type::Opt(_) => opcode::OPT,
            Type::Record(_) | Type::Tuple(_) => opcode::RECORD,
            Type::Variant(_) => opcode::VARIANT,
            Type::Func(_) => opcode::FUNC,
            Type::Service(_) => opcode::SERVICE,
            other => return other.opcode(),
        })
    }

    /// Follow filled recursive placeholders to a concrete type
    pub fn resolve(&self) -> Result<&Type> {
        let mut current = self;
        for _ in 0..MAX_RECURSION_DEPTH {
            match current {
                Type::Recursive(rec) => current = rec.get()?,
                other => return Ok(other),
            }
        }
        Err(Error::RecursionDepthExceeded(MAX_RECURSION_DEPTH))
    }

    /// Canonical Candid name
    pub fn name(&self) -> String {
        self.to_string()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Value checks
    // ─────────────────────────────────────────────────────────────────────

    /// True if `value` can be encoded as this type
    pub fn is_valid_value(&self, value: &Value) -> bool {
        self.validate(value).is_ok()
    }

    /// Check that `value` has the shape of this type
    pub fn validate(&self, value: &Value) -> Result<()> {
        let ok = match (self, value) {
            (Type::Recursive(_), _) => return self.resolve()?.validate(value),
            (Type::Null, Value::Null)
            | (Type::Reserved, Value::Reserved)
            | (Type::Bool, Value::Bool(_))
            | (Type::Nat, Value::Nat(_))
            | (Type::Int, Value::Int(_))
            | (Type::Nat8, Value::Nat8(_))
            | (Type::Nat16, Value::Nat16(_))
            | (Type::Nat32, Value::Nat32(_))
            | (Type::Nat64, Value::Nat64(_))
            | (Type::Int8, Value::Int8(_))
            | (Type::Int16, Value::Int16(_))
            | (Type::Int32, Value::Int32(_))
            | (Type::Int64, Value::Int64(_))
            | (Type::Float32, Value::Float32(_))
            | (Type::Float64, Value::Float64(_))
            | (Type::Text, Value::Text(_))
            | (Type::Principal, Value::Principal(_))
            | (Type::Func(_), Value::Func(..))
            | (Type::Service(_), Value::Service(_)) => true,
            (Type::Vector(elem), Value::Blob(_)) => matches!(elem.resolve()?, Type::Nat8),
            (Type::Vector(elem), Value::Vector(items)) => {
                for item in items {
                    elem.validate(item)?;
                }
                true
            }
            (Type::Opt(_), Value::Opt(None)) => true,
            (Type::Opt(inner), Value::Opt(Some(v))) => return inner.validate(v),
            (Type::Record(fields), Value::Record(map)) => {
                for field in fields {
                    let v = map
                        .get(&field.name)
                        .ok_or_else(|| Error::MissingField(field.name.clone()))?;
                    field.ty.validate(v)?;
                }
                if let Some(extra) = map.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
                    return Err(Error::UnexpectedField(extra.clone()));
                }
                true
            }
            (Type::Tuple(types), Value::Tuple(values)) => {
                if types.len() != values.len() {
                    return Err(Error::ArityMismatch {
                        expected: types.len(),
                        found: values.len(),
                    });
                }
                for (ty, v) in types.iter().zip(values) {
                    ty.validate(v)?;
                }
                true
            }
            (Type::Variant(fields), Value::Variant(name, v)) => {
                let field = fields
                    .iter()
                    .find(|f| &f.name == name)
                    .ok_or_else(|| Error::MissingField(name.clone()))?;
                return field.ty.validate(v);
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::mismatch(self, value.kind()))
        }
    }
}

impl From<RecursiveType> for Type {
    fn from(rec: RecursiveType) -> Self {
        Type::Recursive(rec)
    }
}

fn canonical_fields<I, S>(fields: I) -> Result<Vec<Field>>
where
    I: IntoIterator<Item = (S, Type)>,
    S: Into<String>,
{
    let mut fields: Vec<Field> = fields
        .into_iter()
        .map(|(name, ty)| Field::new(name, ty))
        .collect();
    fields.sort_by_key(|f| f.id);
    if let Some(pair) = fields.windows(2).find(|w| w[0].id == w[1].id) {
        return Err(Error::DuplicateField {
            id: pair[1].id,
            name: pair[1].name.clone(),
        });
    }
    Ok(fields)
}

/// Labels that are not plain identifiers are quoted
fn write_label(f: &mut fmt::Formatter<'_>, label: &str) -> fmt::Result {
    let mut chars = label.chars();
    let is_ident = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_ident {
        f.write_str(label)
    } else {
        write!(f, "{label:?}")
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    f.write_str("(")?;
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    f.write_str(")")
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, &self.args)?;
        f.write_str(" -> ")?;
        write_list(f, &self.rets)?;
        for mode in &self.modes {
            write!(f, " {}", mode.as_str())?;
        }
        Ok(())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.primitive_opcode().and_then(opcode::primitive_name) {
            return f.write_str(name);
        }
        match self {
            Type::Vector(inner) => write!(f, "vec {inner}"),
            Type::Opt(inner) => write!(f, "opt {inner}"),
            Type::Record(fields) | Type::Variant(fields) => {
                let keyword = if matches!(self, Type::Record(_)) {
                    "record"
                } else {
                    "variant"
                };
                write!(f, "{keyword} {{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write_label(f, &field.name)?;
                    write!(f, ":{}", field.ty)?;
                }
                f.write_str("}")
            }
            Type::Tuple(types) => {
                f.write_str("record {")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{ty}")?;
                }
                f.write_str("}")
            }
            Type::Func(func) => write!(f, "func {func}"),
            Type::Service(methods) => {
                f.write_str("service {")?;
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write_label(f, &method.name)?;
                    write!(f, ":{}", method.ty)?;
                }
                f.write_str("}")
            }
            Type::Recursive(rec) => write!(f, "μ{:x}", rec.id()),
            _ => Ok(()),
        }
    }
}
