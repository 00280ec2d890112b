//! Type table builder
//!
//! Every constructed type reachable from a message's argument types gets one
//! serialized entry. Entries are appended post-order, so sub-types usually
//! come first; a recursive type reserves its slot before its body is visited,
//! which is what lets self-referential schemas terminate.
//!
//! Entries are keyed by the canonical display name. Structurally equal types
//! share one entry; recursive placeholders are distinguished by identity.

use std::collections::HashMap;

use tracing::trace;

use crate::leb128::{write_i64, write_u64};
use crate::{Error, Pipe, Result, Type};

/// Serialized type descriptors for one message
#[derive(Debug, Default)]
pub struct TypeTable {
    /// Encoded entries, in table order
    entries: Vec<Vec<u8>>,
    /// Display name to entry index
    index: HashMap<String, usize>,
}

impl TypeTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if `ty` already has an entry
    pub fn contains(&self, ty: &Type) -> bool {
        self.index.contains_key(&ty.to_string())
    }

    /// Add `ty` and every constructed type it references
    ///
    /// Adding the same type twice is a no-op. Primitive types never get an
    /// entry.
    pub fn add(&mut self, ty: &Type) -> Result<()> {
        if ty.is_primitive() {
            return Ok(());
        }
        let key = ty.to_string();
        if self.index.contains_key(&key) {
            return Ok(());
        }

        if let Type::Recursive(rec) = ty {
            // Fails on unfilled placeholders and overlong placeholder chains
            ty.resolve()?;
            let body = rec.get()?;
            if body.is_primitive() || matches!(body, Type::Recursive(_)) {
                self.add(body)?;
                if let Some(&slot) = self.index.get(&body.to_string()) {
                    self.index.insert(key, slot);
                }
                return Ok(());
            }
            let body_key = body.to_string();
            if let Some(&slot) = self.index.get(&body_key) {
                self.index.insert(key, slot);
                return Ok(());
            }

            let slot = self.entries.len();
            self.entries.push(Vec::new());
            self.index.insert(key, slot);
            trace!(slot, "reserved type table slot for recursive type");

            self.add_children(body)?;
            self.entries[slot] = self.describe(body)?;
            self.index.entry(body_key).or_insert(slot);
            trace!(slot, body = %body, "filled recursive type table slot");
            return Ok(());
        }

        self.add_children(ty)?;
        // A child may have reached this type again through a recursive body
        if self.index.contains_key(&key) {
            return Ok(());
        }
        let entry = self.describe(ty)?;
        let slot = self.entries.len();
        self.entries.push(entry);
        trace!(slot, ty = %key, "appended type table entry");
        self.index.insert(key, slot);
        Ok(())
    }

    fn add_children(&mut self, ty: &Type) -> Result<()> {
        match ty {
            Type::Vector(inner) | Type::Opt(inner) => self.add(inner),
            Type::Record(fields) | Type::Variant(fields) => {
                fields.iter().try_for_each(|field| self.add(&field.ty))
            }
            Type::Tuple(types) => types.iter().try_for_each(|t| self.add(t)),
            Type::Func(func) => func
                .args
                .iter()
                .chain(&func.rets)
                .try_for_each(|t| self.add(t)),
            Type::Service(methods) => methods.iter().try_for_each(|m| self.add(&m.ty)),
            _ => Ok(()),
        }
    }

    /// Serialize the entry for a constructed, non-recursive type
    fn describe(&self, ty: &Type) -> Result<Vec<u8>> {
        let mut pipe = Pipe::with_capacity(16);
        write_i64(&mut pipe, ty.opcode()?);
        match ty {
            Type::Vector(inner) | Type::Opt(inner) => self.write_type(&mut pipe, inner)?,
            Type::Record(fields) | Type::Variant(fields) => {
                write_u64(&mut pipe, fields.len() as u64);
                for field in fields {
                    write_u64(&mut pipe, u64::from(field.id));
                    self.write_type(&mut pipe, &field.ty)?;
                }
            }
            Type::Tuple(types) => {
                write_u64(&mut pipe, types.len() as u64);
                for (i, t) in types.iter().enumerate() {
                    write_u64(&mut pipe, i as u64);
                    self.write_type(&mut pipe, t)?;
                }
            }
            Type::Func(func) => {
                write_u64(&mut pipe, func.args.len() as u64);
                for t in &func.args {
                    self.write_type(&mut pipe, t)?;
                }
                write_u64(&mut pipe, func.rets.len() as u64);
                for t in &func.rets {
                    self.write_type(&mut pipe, t)?;
                }
                write_u64(&mut pipe, func.modes.len() as u64);
                for &mode in &func.modes {
                    pipe.write_byte(mode as u8);
                }
            }
            Type::Service(methods) => {
                write_u64(&mut pipe, methods.len() as u64);
                for method in methods {
                    write_u64(&mut pipe, method.name.len() as u64);
                    pipe.write(method.name.as_bytes());
                    self.write_type(&mut pipe, &method.ty)?;
                }
            }
            other => return Err(Error::UnknownType(other.to_string())),
        }
        Ok(pipe.into_vec())
    }

    /// Table index of a constructed type, or the opcode of a primitive one
    pub fn encode_type(&self, ty: &Type) -> Result<i64> {
        if let Some(op) = ty.primitive_opcode() {
            return Ok(op);
        }
        if let Type::Recursive(_) = ty {
            if let Some(op) = ty.resolve()?.primitive_opcode() {
                return Ok(op);
            }
        }
        self.index
            .get(&ty.to_string())
            .map(|&slot| slot as i64)
            .ok_or_else(|| Error::UnknownType(ty.to_string()))
    }

    /// Append the SLEB128 reference to `ty`
    pub fn write_type(&self, pipe: &mut Pipe, ty: &Type) -> Result<()> {
        write_i64(pipe, self.encode_type(ty)?);
        Ok(())
    }

    /// Append the entry count followed by every entry
    pub fn write_to(&self, pipe: &mut Pipe) {
        write_u64(pipe, self.entries.len() as u64);
        for entry in &self.entries {
            pipe.write(entry);
        }
    }
}
