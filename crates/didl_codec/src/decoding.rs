//! DIDL message decoder
//!
//! The wire type table is read into a flat arena of entries addressed by
//! index, so cyclic wire types never become pointer cycles. Values are then
//! decoded pairwise against the caller's expected types:
//!
//! - primitives require the same opcode on both sides
//! - record fields are matched by id; extra wire fields are skipped and
//!   missing `opt`, `null` or `reserved` fields are filled in
//! - an expected `reserved` accepts and discards anything
//! - extra trailing arguments are skipped

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::hash::id_label;
use crate::leb128::{decode_signed, decode_unsigned, read_i64, read_len, read_u64};
use crate::types::opcode;
use crate::{
    Error, Field, FuncMode, Pipe, Principal, Result, Type, Value, MAGIC, MAX_RECURSION_DEPTH,
    MAX_TYPE_TABLE_LEN,
};

/// Limits applied while decoding untrusted bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum nesting depth of types and values
    pub max_depth: usize,
    /// Maximum number of entries in the wire type table
    pub max_table_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_RECURSION_DEPTH,
            max_table_len: MAX_TYPE_TABLE_LEN,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

/// Reference to a wire type: a primitive opcode or a table entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum WireType {
    Primitive(i64),
    Index(usize),
}

/// One entry of the wire type table
#[derive(Debug)]
enum WireEntry {
    Vector(WireType),
    Opt(WireType),
    /// Fields strictly increasing by id
    Record(Vec<(u32, WireType)>),
    /// Cases strictly increasing by id
    Variant(Vec<(u32, WireType)>),
    Func {
        args: Vec<WireType>,
        rets: Vec<WireType>,
        modes: Vec<FuncMode>,
    },
    /// Methods strictly increasing by name
    Service(Vec<(String, WireType)>),
}

impl WireEntry {
    /// Non-empty record whose field ids are exactly `0..n`
    fn is_tuple(&self) -> bool {
        match self {
            WireEntry::Record(fields) => {
                !fields.is_empty()
                    && fields
                        .iter()
                        .enumerate()
                        .all(|(i, (id, _))| *id as usize == i)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct WireTable {
    entries: Vec<WireEntry>,
}

impl WireTable {
    fn read(pipe: &mut Pipe, config: &DecoderConfig) -> Result<Self> {
        let len = read_len(pipe)?;
        if len > config.max_table_len {
            return Err(Error::TableTooLarge {
                len,
                max: config.max_table_len,
            });
        }

        let mut entries = Vec::with_capacity(len.min(pipe.remaining()));
        for slot in 0..len {
            let op = read_i64(pipe)?;
            let entry = match op {
                opcode::VECTOR => WireEntry::Vector(read_ref(pipe, len)?),
                opcode::OPT => WireEntry::Opt(read_ref(pipe, len)?),
                opcode::RECORD => WireEntry::Record(read_fields(pipe, len)?),
                opcode::VARIANT => WireEntry::Variant(read_fields(pipe, len)?),
                opcode::FUNC => {
                    let args = read_refs(pipe, len)?;
                    let rets = read_refs(pipe, len)?;
                    let count = read_len(pipe)?;
                    let mut modes = Vec::with_capacity(count.min(pipe.remaining()));
                    for _ in 0..count {
                        let byte = pipe.read_byte()?;
                        let mode = FuncMode::from_u8(byte).ok_or(Error::InvalidByte {
                            context: "function annotation",
                            value: byte,
                        })?;
                        modes.push(mode);
                    }
                    WireEntry::Func { args, rets, modes }
                }
                opcode::SERVICE => WireEntry::Service(read_methods(pipe, len)?),
                op if op < opcode::LAST_KNOWN => return Err(Error::FutureTypeNotSupported(op)),
                op => return Err(Error::IllegalOpcode(op)),
            };
            trace!(slot, ?entry, "read type table entry");
            entries.push(entry);
        }

        let table = Self { entries };
        table.check_services()?;
        Ok(table)
    }

    /// Every service method must reference a function type
    fn check_services(&self) -> Result<()> {
        for entry in &self.entries {
            if let WireEntry::Service(methods) = entry {
                for &(_, ty) in methods {
                    if !matches!(ty, WireType::Index(i) if matches!(self.entries[i], WireEntry::Func { .. }))
                    {
                        return Err(Error::mismatch("func", self.describe(ty)));
                    }
                }
            }
        }
        Ok(())
    }

    fn entry(&self, index: usize) -> &WireEntry {
        &self.entries[index]
    }

    /// Short human-readable name of a wire type
    fn describe(&self, ty: WireType) -> String {
        match ty {
            WireType::Primitive(op) => opcode::primitive_name(op).unwrap_or("?").to_string(),
            WireType::Index(i) => {
                let entry = self.entry(i);
                let kind = match entry {
                    WireEntry::Vector(_) => "vec",
                    WireEntry::Opt(_) => "opt",
                    WireEntry::Record(_) if entry.is_tuple() => "tuple",
                    WireEntry::Record(_) => "record",
                    WireEntry::Variant(_) => "variant",
                    WireEntry::Func { .. } => "func",
                    WireEntry::Service(_) => "service",
                };
                format!("{kind} (table entry {i})")
            }
        }
    }
}

/// Resolve a raw SLEB128 type reference against a table of `len` entries
fn wire_ref(raw: i64, len: usize) -> Result<WireType> {
    if raw >= 0 {
        return match usize::try_from(raw) {
            Ok(index) if index < len => Ok(WireType::Index(index)),
            _ => Err(Error::TypeIndexOutOfRange { index: raw, len }),
        };
    }
    if opcode::is_primitive(raw) {
        Ok(WireType::Primitive(raw))
    } else if raw < opcode::LAST_KNOWN {
        Err(Error::FutureTypeNotSupported(raw))
    } else {
        Err(Error::IllegalOpcode(raw))
    }
}

fn read_ref(pipe: &mut Pipe, len: usize) -> Result<WireType> {
    wire_ref(read_i64(pipe)?, len)
}

fn read_refs(pipe: &mut Pipe, len: usize) -> Result<Vec<WireType>> {
    let count = read_len(pipe)?;
    let mut refs = Vec::with_capacity(count.min(pipe.remaining()));
    for _ in 0..count {
        refs.push(read_ref(pipe, len)?);
    }
    Ok(refs)
}

fn read_fields(pipe: &mut Pipe, len: usize) -> Result<Vec<(u32, WireType)>> {
    let count = read_len(pipe)?;
    let mut fields: Vec<(u32, WireType)> = Vec::with_capacity(count.min(pipe.remaining()));
    for _ in 0..count {
        let id = u32::try_from(read_u64(pipe)?).map_err(|_| Error::Overflow("field id"))?;
        if let Some(&(previous, _)) = fields.last() {
            if id <= previous {
                return Err(Error::FieldOrderViolation {
                    previous,
                    found: id,
                });
            }
        }
        fields.push((id, read_ref(pipe, len)?));
    }
    Ok(fields)
}

fn read_methods(pipe: &mut Pipe, len: usize) -> Result<Vec<(String, WireType)>> {
    let count = read_len(pipe)?;
    let mut methods: Vec<(String, WireType)> = Vec::with_capacity(count.min(pipe.remaining()));
    for _ in 0..count {
        let name = read_text(pipe, "method name")?;
        if let Some((previous, _)) = methods.last() {
            if name.as_str() <= previous.as_str() {
                return Err(Error::MethodOrderViolation {
                    previous: previous.clone(),
                    found: name,
                });
            }
        }
        methods.push((name, read_ref(pipe, len)?));
    }
    Ok(methods)
}

fn read_text(pipe: &mut Pipe, context: &'static str) -> Result<String> {
    let len = read_len(pipe)?;
    let bytes = pipe.read(len)?;
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| Error::InvalidUtf8(context))
}

// ─────────────────────────────────────────────────────────────────────────────
// Values
// ─────────────────────────────────────────────────────────────────────────────

/// Expected side of a record field
struct Slot<'t> {
    id: u32,
    name: Option<&'t str>,
    ty: &'t Type,
}

impl Slot<'_> {
    fn label(&self) -> String {
        self.name.map_or_else(|| id_label(self.id), str::to_string)
    }

    /// Value of a field absent from the wire
    fn missing(&self) -> Result<Value> {
        match self.ty.resolve()? {
            Type::Opt(_) => Ok(Value::Opt(None)),
            Type::Null => Ok(Value::Null),
            Type::Reserved => Ok(Value::Reserved),
            _ => Err(Error::MissingField(self.label())),
        }
    }
}

fn record_slots(fields: &[Field]) -> Vec<Slot<'_>> {
    fields
        .iter()
        .map(|f| Slot {
            id: f.id,
            name: Some(f.name.as_str()),
            ty: &f.ty,
        })
        .collect()
}

fn tuple_slots(types: &[Type]) -> Vec<Slot<'_>> {
    types
        .iter()
        .enumerate()
        .map(|(i, ty)| Slot {
            id: i as u32,
            name: None,
            ty,
        })
        .collect()
}

/// Decoding state for one message
struct Reader<'a> {
    table: &'a WireTable,
    pipe: &'a mut Pipe,
    depth: usize,
    max_depth: usize,
    /// (wire, recursive type) pairs assumed compatible while checking
    assumed: HashSet<(WireType, usize)>,
}

impl<'a> Reader<'a> {
    fn new(table: &'a WireTable, pipe: &'a mut Pipe, max_depth: usize) -> Self {
        Self {
            table,
            pipe,
            depth: 0,
            max_depth,
            assumed: HashSet::new(),
        }
    }

    /// Enter a nested type or value (recursion check)
    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::RecursionDepthExceeded(self.max_depth));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn mismatch(&self, expected: &Type, wire: WireType) -> Error {
        Error::mismatch(expected, self.table.describe(wire))
    }

    // ── type compatibility ───────────────────────────────────────────────

    /// Check that values of wire type `wire` can be read as `expected`
    fn check_type(&mut self, wire: WireType, expected: &Type) -> Result<()> {
        self.enter()?;
        let result = self.check_type_inner(wire, expected);
        self.leave();
        result
    }

    fn check_type_inner(&mut self, wire: WireType, expected: &Type) -> Result<()> {
        if let Type::Recursive(rec) = expected {
            // Coinductive: a pair already under check is assumed to match
            if !self.assumed.insert((wire, rec.id())) {
                return Ok(());
            }
            return self.check_type(wire, rec.get()?);
        }
        if let Type::Reserved = expected {
            return Ok(());
        }
        if let Some(op) = expected.primitive_opcode() {
            return match wire {
                WireType::Primitive(found) if found == op && op != opcode::EMPTY => Ok(()),
                _ => Err(self.mismatch(expected, wire)),
            };
        }

        let WireType::Index(index) = wire else {
            return Err(self.mismatch(expected, wire));
        };
        let table = self.table;
        match (table.entry(index), expected) {
            (WireEntry::Vector(w), Type::Vector(e)) | (WireEntry::Opt(w), Type::Opt(e)) => {
                self.check_type(*w, e)
            }
            (WireEntry::Record(wire_fields), Type::Record(fields)) => {
                self.check_fields(wire_fields, &record_slots(fields))
            }
            (WireEntry::Record(wire_fields), Type::Tuple(types)) => {
                self.check_fields(wire_fields, &tuple_slots(types))
            }
            (WireEntry::Variant(wire_cases), Type::Variant(cases)) => {
                for &(id, w) in wire_cases {
                    if let Ok(i) = cases.binary_search_by_key(&id, |f| f.id) {
                        self.check_type(w, &cases[i].ty)?;
                    }
                }
                Ok(())
            }
            (WireEntry::Func { args, rets, modes }, Type::Func(func)) => {
                if args.len() != func.args.len()
                    || rets.len() != func.rets.len()
                    || *modes != func.modes
                {
                    return Err(self.mismatch(expected, wire));
                }
                for (&w, e) in args.iter().zip(&func.args).chain(rets.iter().zip(&func.rets)) {
                    self.check_type(w, e)?;
                }
                Ok(())
            }
            (WireEntry::Service(wire_methods), Type::Service(methods)) => {
                if wire_methods.len() != methods.len() {
                    return Err(self.mismatch(expected, wire));
                }
                // Both sides are sorted by name
                for ((name, w), method) in wire_methods.iter().zip(methods) {
                    if *name != method.name {
                        return Err(self.mismatch(expected, wire));
                    }
                    self.check_type(*w, &method.ty)?;
                }
                Ok(())
            }
            _ => Err(self.mismatch(expected, wire)),
        }
    }

    fn check_fields(&mut self, wire_fields: &[(u32, WireType)], slots: &[Slot<'_>]) -> Result<()> {
        for slot in slots {
            match wire_fields.binary_search_by_key(&slot.id, |&(id, _)| id) {
                Ok(i) => self.check_type(wire_fields[i].1, slot.ty)?,
                Err(_) => {
                    slot.missing()?;
                }
            }
        }
        Ok(())
    }

    // ── decoding ─────────────────────────────────────────────────────────

    /// Decode one value of wire type `wire` as `expected`
    fn decode_value(&mut self, wire: WireType, expected: &Type) -> Result<Value> {
        self.enter()?;
        let result = self.decode_value_inner(wire, expected);
        self.leave();
        result
    }

    fn decode_value_inner(&mut self, wire: WireType, expected: &Type) -> Result<Value> {
        match expected {
            Type::Recursive(rec) => return self.decode_value(wire, rec.get()?),
            Type::Reserved => {
                self.skip_value(wire)?;
                return Ok(Value::Reserved);
            }
            Type::Empty => return Err(self.mismatch(expected, wire)),
            _ => {}
        }

        let index = match wire {
            WireType::Primitive(op) if expected.primitive_opcode() == Some(op) => {
                return self.read_primitive(op);
            }
            WireType::Index(index) => index,
            WireType::Primitive(_) => return Err(self.mismatch(expected, wire)),
        };

        let table = self.table;
        match (table.entry(index), expected) {
            (WireEntry::Vector(w), Type::Vector(e)) => {
                let len = read_len(self.pipe)?;
                if *w == WireType::Primitive(opcode::NAT8) && matches!(e.resolve()?, Type::Nat8) {
                    return Ok(Value::Blob(self.pipe.read(len)?.to_vec()));
                }
                let mut items = Vec::with_capacity(len.min(self.pipe.remaining()));
                for _ in 0..len {
                    items.push(self.decode_value(*w, e)?);
                }
                Ok(Value::Vector(items))
            }
            (WireEntry::Opt(w), Type::Opt(e)) => match self.pipe.read_byte()? {
                0 => Ok(Value::Opt(None)),
                1 => Ok(Value::some(self.decode_value(*w, e)?)),
                value => Err(Error::InvalidByte {
                    context: "opt presence",
                    value,
                }),
            },
            (WireEntry::Record(wire_fields), Type::Record(fields)) => {
                let slots = record_slots(fields);
                let values = self.decode_fields(wire_fields, &slots)?;
                Ok(Value::Record(
                    fields.iter().map(|f| f.name.clone()).zip(values).collect(),
                ))
            }
            (WireEntry::Record(wire_fields), Type::Tuple(types)) => {
                let values = self.decode_fields(wire_fields, &tuple_slots(types))?;
                Ok(Value::Tuple(values))
            }
            (WireEntry::Variant(wire_cases), Type::Variant(cases)) => {
                let selected = read_len(self.pipe)?;
                let &(id, w) = wire_cases
                    .get(selected)
                    .ok_or(Error::VariantIndexOutOfRange {
                        index: selected,
                        len: wire_cases.len(),
                    })?;
                let case = cases
                    .binary_search_by_key(&id, |f| f.id)
                    .map(|i| &cases[i])
                    .map_err(|_| Error::UnknownVariant(id))?;
                let payload = self.decode_value(w, &case.ty)?;
                Ok(Value::variant(case.name.clone(), payload))
            }
            (WireEntry::Func { .. }, Type::Func(_)) => {
                self.read_reference_flag()?;
                let service = self.read_principal()?;
                let method = read_text(self.pipe, "method name")?;
                Ok(Value::Func(service, method))
            }
            (WireEntry::Service(_), Type::Service(_)) => Ok(Value::Service(self.read_principal()?)),
            _ => Err(self.mismatch(expected, wire)),
        }
    }

    /// Walk wire fields and expected slots together, both sorted by id
    fn decode_fields(
        &mut self,
        wire_fields: &[(u32, WireType)],
        slots: &[Slot<'_>],
    ) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(slots.len());
        let mut slots = slots.iter().peekable();
        for &(id, w) in wire_fields {
            while let Some(slot) = slots.next_if(|s| s.id < id) {
                values.push(slot.missing()?);
            }
            match slots.next_if(|s| s.id == id) {
                Some(slot) => values.push(self.decode_value(w, slot.ty)?),
                None => self.skip_value(w)?,
            }
        }
        for slot in slots {
            values.push(slot.missing()?);
        }
        Ok(values)
    }

    fn read_primitive(&mut self, op: i64) -> Result<Value> {
        Ok(match op {
            opcode::NULL => Value::Null,
            opcode::BOOL => match self.pipe.read_byte()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                value => {
                    return Err(Error::InvalidByte {
                        context: "bool",
                        value,
                    })
                }
            },
            opcode::NAT => Value::Nat(decode_unsigned(self.pipe)?),
            opcode::INT => Value::Int(decode_signed(self.pipe)?),
            opcode::NAT8 => Value::Nat8(self.pipe.read_byte()?),
            opcode::NAT16 => Value::Nat16(u16::from_le_bytes(self.read_array()?)),
            opcode::NAT32 => Value::Nat32(u32::from_le_bytes(self.read_array()?)),
            opcode::NAT64 => Value::Nat64(u64::from_le_bytes(self.read_array()?)),
            opcode::INT8 => Value::Int8(i8::from_le_bytes(self.read_array()?)),
            opcode::INT16 => Value::Int16(i16::from_le_bytes(self.read_array()?)),
            opcode::INT32 => Value::Int32(i32::from_le_bytes(self.read_array()?)),
            opcode::INT64 => Value::Int64(i64::from_le_bytes(self.read_array()?)),
            opcode::FLOAT32 => Value::Float32(f32::from_le_bytes(self.read_array()?)),
            opcode::FLOAT64 => Value::Float64(f64::from_le_bytes(self.read_array()?)),
            opcode::TEXT => Value::Text(read_text(self.pipe, "text")?),
            opcode::RESERVED => Value::Reserved,
            opcode::PRINCIPAL => Value::Principal(self.read_principal()?),
            _ => return Err(Error::mismatch("a value", self.table.describe(WireType::Primitive(op)))),
        })
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.pipe.read(N)?);
        Ok(out)
    }

    fn read_reference_flag(&mut self) -> Result<()> {
        match self.pipe.read_byte()? {
            1 => Ok(()),
            value => Err(Error::InvalidByte {
                context: "reference flag",
                value,
            }),
        }
    }

    fn read_principal(&mut self) -> Result<Principal> {
        self.read_reference_flag()?;
        let len = read_len(self.pipe)?;
        Ok(Principal::from_slice(self.pipe.read(len)?))
    }

    // ── skipping ─────────────────────────────────────────────────────────

    /// Consume one value of wire type `wire` without building it
    fn skip_value(&mut self, wire: WireType) -> Result<()> {
        self.enter()?;
        let result = self.skip_value_inner(wire);
        self.leave();
        result
    }

    fn skip_value_inner(&mut self, wire: WireType) -> Result<()> {
        let index = match wire {
            WireType::Primitive(op) => {
                match op {
                    opcode::NAT => {
                        decode_unsigned(self.pipe)?;
                    }
                    opcode::INT => {
                        decode_signed(self.pipe)?;
                    }
                    opcode::TEXT => {
                        let len = read_len(self.pipe)?;
                        self.pipe.read(len)?;
                    }
                    opcode::PRINCIPAL => {
                        self.read_principal()?;
                    }
                    opcode::EMPTY => {
                        return Err(Error::mismatch("a value", "empty"));
                    }
                    op => {
                        self.pipe.read(fixed_size(op).unwrap_or(0))?;
                    }
                }
                return Ok(());
            }
            WireType::Index(index) => index,
        };

        let table = self.table;
        match table.entry(index) {
            WireEntry::Vector(w) => {
                let len = read_len(self.pipe)?;
                if let WireType::Primitive(op) = *w {
                    if let Some(size) = fixed_size(op) {
                        let total = len.checked_mul(size).ok_or(Error::Overflow("vector length"))?;
                        self.pipe.read(total)?;
                        return Ok(());
                    }
                }
                for _ in 0..len {
                    self.skip_value(*w)?;
                }
                Ok(())
            }
            WireEntry::Opt(w) => match self.pipe.read_byte()? {
                0 => Ok(()),
                1 => self.skip_value(*w),
                value => Err(Error::InvalidByte {
                    context: "opt presence",
                    value,
                }),
            },
            WireEntry::Record(fields) => fields.iter().try_for_each(|&(_, w)| self.skip_value(w)),
            WireEntry::Variant(cases) => {
                let selected = read_len(self.pipe)?;
                let &(_, w) = cases.get(selected).ok_or(Error::VariantIndexOutOfRange {
                    index: selected,
                    len: cases.len(),
                })?;
                self.skip_value(w)
            }
            WireEntry::Func { .. } => {
                self.read_reference_flag()?;
                self.read_principal()?;
                let len = read_len(self.pipe)?;
                self.pipe.read(len)?;
                Ok(())
            }
            WireEntry::Service(_) => self.read_principal().map(drop),
        }
    }
}

/// Byte width of primitives with a fixed-size value
fn fixed_size(op: i64) -> Option<usize> {
    match op {
        opcode::NULL | opcode::RESERVED => Some(0),
        opcode::BOOL | opcode::NAT8 | opcode::INT8 => Some(1),
        opcode::NAT16 | opcode::INT16 => Some(2),
        opcode::NAT32 | opcode::INT32 | opcode::FLOAT32 => Some(4),
        opcode::NAT64 | opcode::INT64 | opcode::FLOAT64 => Some(8),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────────────────

/// DIDL message decoder
///
/// Holds the limits applied to every message; each call builds and discards
/// its own wire type table, so one decoder can be shared freely.
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder with custom limits
    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a message, returning one value per expected type
    ///
    /// The message may carry more arguments than `types`; the extra ones are
    /// consumed and dropped. Fewer arguments is an [`Error::ArityMismatch`].
    pub fn decode(&self, types: &[Type], bytes: &[u8]) -> Result<Vec<Value>> {
        let mut pipe = Pipe::from_slice(bytes);

        let magic = pipe.read(MAGIC.len())?;
        if magic != MAGIC.as_slice() {
            return Err(Error::MagicMismatch {
                found: magic.to_vec(),
            });
        }

        let table = WireTable::read(&mut pipe, &self.config)?;
        let count = read_len(&mut pipe)?;
        let mut args = Vec::with_capacity(count.min(pipe.remaining()));
        for _ in 0..count {
            args.push(read_ref(&mut pipe, table.entries.len())?);
        }
        if args.len() < types.len() {
            return Err(Error::ArityMismatch {
                expected: types.len(),
                found: args.len(),
            });
        }
        debug!(
            table_len = table.entries.len(),
            args = args.len(),
            expected = types.len(),
            "decoded message header"
        );

        let mut reader = Reader::new(&table, &mut pipe, self.config.max_depth);
        let mut values = Vec::with_capacity(types.len());
        for (&wire, ty) in args.iter().zip(types) {
            reader.check_type(wire, ty)?;
            values.push(reader.decode_value(wire, ty)?);
        }
        for &wire in &args[types.len()..] {
            reader.skip_value(wire)?;
        }

        if !pipe.is_exhausted() {
            return Err(Error::TrailingBytes(pipe.remaining()));
        }
        debug!(bytes = bytes.len(), values = values.len(), "decoded message values");
        Ok(values)
    }
}

/// Decode a message with default limits
pub fn decode(types: &[Type], bytes: &[u8]) -> Result<Vec<Value>> {
    Decoder::new().decode(types, bytes)
}

/// Decode a message with custom limits
pub fn decode_with_config(types: &[Type], bytes: &[u8], config: &DecoderConfig) -> Result<Vec<Value>> {
    Decoder::with_config(config.clone()).decode(types, bytes)
}
