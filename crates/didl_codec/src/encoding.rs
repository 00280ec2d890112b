//! DIDL message encoder

use tracing::debug;

use crate::leb128::{write_signed, write_u64, write_unsigned};
use crate::{Error, Pipe, Principal, Result, Type, TypeTable, Value, MAGIC};

/// Reference flag for a transparent (inline) principal
const REFERENCE_TRANSPARENT: u8 = 1;

impl Type {
    /// Append the wire form of `value` as this type
    ///
    /// Fails with [`Error::TypeMismatch`] when the value does not have the
    /// shape of the type.
    pub fn encode_value(&self, value: &Value, pipe: &mut Pipe) -> Result<()> {
        match (self, value) {
            (Type::Recursive(_), _) => self.resolve()?.encode_value(value, pipe),
            (Type::Reserved, Value::Reserved) | (Type::Null, Value::Null) => Ok(()),
            (Type::Bool, Value::Bool(b)) => {
                pipe.write_byte(u8::from(*b));
                Ok(())
            }
            (Type::Nat, Value::Nat(n)) => {
                write_unsigned(pipe, n);
                Ok(())
            }
            (Type::Int, Value::Int(n)) => {
                write_signed(pipe, n);
                Ok(())
            }
            (Type::Nat8, Value::Nat8(n)) => {
                pipe.write_byte(*n);
                Ok(())
            }
            (Type::Nat16, Value::Nat16(n)) => write_le(pipe, &n.to_le_bytes()),
            (Type::Nat32, Value::Nat32(n)) => write_le(pipe, &n.to_le_bytes()),
            (Type::Nat64, Value::Nat64(n)) => write_le(pipe, &n.to_le_bytes()),
            (Type::Int8, Value::Int8(n)) => write_le(pipe, &n.to_le_bytes()),
            (Type::Int16, Value::Int16(n)) => write_le(pipe, &n.to_le_bytes()),
            (Type::Int32, Value::Int32(n)) => write_le(pipe, &n.to_le_bytes()),
            (Type::Int64, Value::Int64(n)) => write_le(pipe, &n.to_le_bytes()),
            (Type::Float32, Value::Float32(n)) => write_le(pipe, &n.to_le_bytes()),
            (Type::Float64, Value::Float64(n)) => write_le(pipe, &n.to_le_bytes()),
            (Type::Text, Value::Text(s)) => {
                write_bytes(pipe, s.as_bytes());
                Ok(())
            }
            (Type::Principal, Value::Principal(p)) => {
                write_principal(pipe, p);
                Ok(())
            }
            (Type::Vector(elem), Value::Blob(bytes)) if matches!(elem.resolve()?, Type::Nat8) => {
                write_bytes(pipe, bytes);
                Ok(())
            }
            (Type::Vector(elem), Value::Vector(items)) => {
                write_u64(pipe, items.len() as u64);
                items.iter().try_for_each(|item| elem.encode_value(item, pipe))
            }
            (Type::Opt(_), Value::Opt(None)) => {
                pipe.write_byte(0);
                Ok(())
            }
            (Type::Opt(inner), Value::Opt(Some(v))) => {
                pipe.write_byte(1);
                inner.encode_value(v, pipe)
            }
            (Type::Record(fields), Value::Record(map)) => {
                for field in fields {
                    let v = map
                        .get(&field.name)
                        .ok_or_else(|| Error::MissingField(field.name.clone()))?;
                    field.ty.encode_value(v, pipe)?;
                }
                Ok(())
            }
            (Type::Tuple(types), Value::Tuple(values)) => {
                if types.len() != values.len() {
                    return Err(Error::ArityMismatch {
                        expected: types.len(),
                        found: values.len(),
                    });
                }
                types
                    .iter()
                    .zip(values)
                    .try_for_each(|(ty, v)| ty.encode_value(v, pipe))
            }
            (Type::Variant(fields), Value::Variant(case, v)) => {
                let (index, field) = fields
                    .iter()
                    .enumerate()
                    .find(|(_, f)| &f.name == case)
                    .ok_or_else(|| Error::MissingField(case.clone()))?;
                write_u64(pipe, index as u64);
                field.ty.encode_value(v, pipe)
            }
            (Type::Func(_), Value::Func(service, method)) => {
                pipe.write_byte(REFERENCE_TRANSPARENT);
                write_principal(pipe, service);
                write_bytes(pipe, method.as_bytes());
                Ok(())
            }
            (Type::Service(_), Value::Service(service)) => {
                write_principal(pipe, service);
                Ok(())
            }
            _ => Err(Error::mismatch(self, value.kind())),
        }
    }
}

fn write_le(pipe: &mut Pipe, bytes: &[u8]) -> Result<()> {
    pipe.write(bytes);
    Ok(())
}

/// Length-prefixed bytes
fn write_bytes(pipe: &mut Pipe, bytes: &[u8]) {
    write_u64(pipe, bytes.len() as u64);
    pipe.write(bytes);
}

fn write_principal(pipe: &mut Pipe, principal: &Principal) {
    pipe.write_byte(REFERENCE_TRANSPARENT);
    write_bytes(pipe, principal.as_slice());
}

/// DIDL message encoder
///
/// Collects typed arguments, then writes the header, the shared type table,
/// the argument types and the values.
#[derive(Debug, Default)]
pub struct Encoder {
    /// Constructed types of every argument
    table: TypeTable,
    /// Argument types, in order
    types: Vec<Type>,
    /// Encoded values, in order
    values: Pipe,
}

impl Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one argument
    pub fn arg(&mut self, ty: &Type, value: &Value) -> Result<&mut Self> {
        ty.validate(value)?;
        self.table.add(ty)?;
        ty.encode_value(value, &mut self.values)?;
        self.types.push(ty.clone());
        Ok(self)
    }

    /// Number of arguments added so far
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Produce the message bytes
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut pipe = Pipe::with_capacity(MAGIC.len() + 16 + self.values.remaining());
        pipe.write(&MAGIC);
        self.table.write_to(&mut pipe);
        write_u64(&mut pipe, self.types.len() as u64);
        for ty in &self.types {
            self.table.write_type(&mut pipe, ty)?;
        }
        pipe.write(self.values.as_slice());

        debug!(
            table_len = self.table.len(),
            args = self.types.len(),
            bytes = pipe.remaining(),
            "encoded message"
        );
        Ok(pipe.into_vec())
    }
}

/// Encode `values` as a message with argument types `types`
pub fn encode(types: &[Type], values: &[Value]) -> Result<Vec<u8>> {
    if types.len() != values.len() {
        return Err(Error::ArityMismatch {
            expected: types.len(),
            found: values.len(),
        });
    }
    let mut encoder = Encoder::new();
    for (ty, value) in types.iter().zip(values) {
        encoder.arg(ty, value)?;
    }
    encoder.finish()
}
