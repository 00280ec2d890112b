//! Dynamic values
//!
//! One variant per value domain. `Nat` and `Int` are arbitrary precision;
//! the fixed-width kinds use the matching Rust integer.

use std::collections::BTreeMap;
use std::fmt;

use num_bigint::{BigInt, BigUint};

use crate::Principal;

/// A value of some Candid type
///
/// Equality is structural, except that a [`Value::Blob`] equals a
/// [`Value::Vector`] of the same bytes as [`Value::Nat8`] items.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Nat(BigUint),
    Int(BigInt),
    Nat8(u8),
    Nat16(u16),
    Nat32(u32),
    Nat64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Reserved,
    Principal(Principal),
    Vector(Vec<Value>),
    /// `vec nat8` decoded as a byte copy
    Blob(Vec<u8>),
    /// Absent or present optional value
    Opt(Option<Box<Value>>),
    /// Record fields keyed by label name
    Record(BTreeMap<String, Value>),
    /// Selected case and its payload
    Variant(String, Box<Value>),
    Tuple(Vec<Value>),
    /// Function reference: service principal and method name
    Func(Principal, String),
    Service(Principal),
}

impl Value {
    pub fn nat(v: u64) -> Self {
        Value::Nat(BigUint::from(v))
    }

    pub fn int(v: i64) -> Self {
        Value::Int(BigInt::from(v))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn some(v: Value) -> Self {
        Value::Opt(Some(Box::new(v)))
    }

    pub fn none() -> Self {
        Value::Opt(None)
    }

    pub fn record<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn variant(case: impl Into<String>, v: Value) -> Self {
        Value::Variant(case.into(), Box::new(v))
    }

    /// Short name of the value domain, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Nat(_) => "nat",
            Value::Int(_) => "int",
            Value::Nat8(_) => "nat8",
            Value::Nat16(_) => "nat16",
            Value::Nat32(_) => "nat32",
            Value::Nat64(_) => "nat64",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Text(_) => "text",
            Value::Reserved => "reserved",
            Value::Principal(_) => "principal",
            Value::Vector(_) => "vec",
            Value::Blob(_) => "blob",
            Value::Opt(_) => "opt",
            Value::Record(_) => "record",
            Value::Variant(..) => "variant",
            Value::Tuple(_) => "tuple",
            Value::Func(..) => "func",
            Value::Service(_) => "service",
        }
    }

    /// Field of a record value
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(name),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Reserved, Value::Reserved) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nat(a), Value::Nat(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Nat8(a), Value::Nat8(b)) => a == b,
            (Value::Nat16(a), Value::Nat16(b)) => a == b,
            (Value::Nat32(a), Value::Nat32(b)) => a == b,
            (Value::Nat64(a), Value::Nat64(b)) => a == b,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Principal(a), Value::Principal(b))
            | (Value::Service(a), Value::Service(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            // vec nat8 has one value domain whichever form built it
            (Value::Blob(bytes), Value::Vector(items))
            | (Value::Vector(items), Value::Blob(bytes)) => {
                bytes.len() == items.len()
                    && bytes
                        .iter()
                        .zip(items)
                        .all(|(b, item)| matches!(item, Value::Nat8(n) if n == b))
            }
            (Value::Opt(a), Value::Opt(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Variant(case_a, a), Value::Variant(case_b, b)) => {
                case_a == case_b && a == b
            }
            (Value::Func(p_a, m_a), Value::Func(p_b, m_b)) => p_a == p_b && m_a == m_b,
            _ => false,
        }
    }
}

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str("; ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("}")
}

/// Candid text syntax
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null | Value::Reserved => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Nat(n) => write!(f, "{n}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Nat8(n) => write!(f, "{n} : nat8"),
            Value::Nat16(n) => write!(f, "{n} : nat16"),
            Value::Nat32(n) => write!(f, "{n} : nat32"),
            Value::Nat64(n) => write!(f, "{n} : nat64"),
            Value::Int8(n) => write!(f, "{n} : int8"),
            Value::Int16(n) => write!(f, "{n} : int16"),
            Value::Int32(n) => write!(f, "{n} : int32"),
            Value::Int64(n) => write!(f, "{n} : int64"),
            Value::Float32(n) => write!(f, "{n:?} : float32"),
            Value::Float64(n) => write!(f, "{n:?}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Principal(p) => write!(f, "principal \"{p}\""),
            Value::Vector(items) => write_seq(f, "vec {", items.iter()),
            Value::Blob(bytes) => {
                f.write_str("blob \"")?;
                for &b in bytes {
                    if (b.is_ascii_graphic() && b != b'"' && b != b'\\') || b == b' ' {
                        write!(f, "{}", b as char)?;
                    } else {
                        write!(f, "\\{b:02x}")?;
                    }
                }
                f.write_str("\"")
            }
            Value::Opt(None) => f.write_str("null"),
            Value::Opt(Some(v)) => write!(f, "opt {v}"),
            Value::Record(fields) => {
                f.write_str("record {")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{name} = {v}")?;
                }
                f.write_str("}")
            }
            Value::Variant(case, v) => match v.as_ref() {
                Value::Null => write!(f, "variant {{{case}}}"),
                v => write!(f, "variant {{{case} = {v}}}"),
            },
            Value::Tuple(items) => write_seq(f, "record {", items.iter()),
            Value::Func(p, method) => write!(f, "func \"{p}\".{method}"),
            Value::Service(p) => write!(f, "service \"{p}\""),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Principal> for Value {
    fn from(v: Principal) -> Self {
        Value::Principal(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let value = Value::record([
            ("name", Value::text("ada")),
            ("tags", Value::Vector(vec![Value::nat(1), Value::nat(2)])),
            ("nick", Value::none()),
            ("age", Value::some(Value::Nat8(36))),
        ]);
        assert_eq!(
            value.to_string(),
            "record {age = opt 36 : nat8; name = \"ada\"; nick = null; tags = vec {1; 2}}"
        );
        assert_eq!(Value::variant("ok", Value::Null).to_string(), "variant {ok}");
        assert_eq!(
            Value::variant("err", Value::int(-3)).to_string(),
            "variant {err = -3}"
        );
        assert_eq!(Value::Blob(vec![b'h', 0, b'i']).to_string(), "blob \"h\\00i\"");
        assert_eq!(
            Value::Principal(Principal::anonymous()).to_string(),
            "principal \"2vxsx-fae\""
        );
        assert_eq!(
            Value::Func(Principal::management_canister(), "greet".into()).to_string(),
            "func \"aaaaa-aa\".greet"
        );
        assert_eq!(Value::Float64(1.0).to_string(), "1.0");
    }

    #[test]
    fn test_blob_equals_byte_vector() {
        let blob = Value::Blob(vec![1, 2]);
        assert_eq!(blob, Value::Vector(vec![Value::Nat8(1), Value::Nat8(2)]));
        assert_eq!(Value::Vector(vec![Value::Nat8(1), Value::Nat8(2)]), blob);
        assert_eq!(Value::Blob(vec![]), Value::Vector(vec![]));
        assert_ne!(blob, Value::Vector(vec![Value::Nat8(1)]));
        assert_ne!(blob, Value::Vector(vec![Value::Nat16(1), Value::Nat16(2)]));
        assert_ne!(Value::Vector(vec![]), Value::Tuple(vec![]));
    }

    #[test]
    fn test_field_lookup() {
        let value = Value::record([("a", Value::Bool(true))]);
        assert_eq!(value.field("a"), Some(&Value::Bool(true)));
        assert_eq!(value.field("b"), None);
        assert_eq!(Value::Null.field("a"), None);
    }
}
