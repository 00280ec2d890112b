//! DIDL - Candid Binary Wire Format Encoding/Decoding
//!
//! This crate implements the self-describing binary format of the Candid
//! interface description language: typed values are written together with a
//! table describing their types, so a reader can check structure and skip
//! data it does not know about.
//!
//! # Wire Format
//!
//! - LEB128 / SLEB128 for lengths, counts, type references and `nat`/`int`
//! - Little-endian fixed-width integers and IEEE 754 floats
//! - Record and variant fields identified by a 32-bit hash of their label
//!
//! # Message Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  magic "DIDL" (4 bytes)                                  │
//! ├──────────────────────────────────────────────────────────┤
//! │  type table: LEB128 count, then one entry per            │
//! │  constructed type (SLEB128 opcode + payload)             │
//! ├──────────────────────────────────────────────────────────┤
//! │  argument types: LEB128 count, then SLEB128 each         │
//! │  (negative = primitive opcode, otherwise table index)    │
//! ├──────────────────────────────────────────────────────────┤
//! │  values, one per argument type, in order                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use didl_codec::{decode, encode, Type, Value};
//!
//! let ty = Type::record([("name", Type::Text), ("age", Type::Nat8)])?;
//! let value = Value::record([("name", Value::text("ada")), ("age", Value::Nat8(36))]);
//!
//! let bytes = encode(&[ty.clone()], &[value.clone()])?;
//! assert_eq!(&bytes[..4], b"DIDL");
//!
//! let decoded = decode(&[ty], &bytes)?;
//! assert_eq!(decoded, vec![value]);
//! # Ok::<(), didl_codec::Error>(())
//! ```

mod decoding;
mod encoding;
mod error;
pub mod hash;
pub mod leb128;
mod pipe;
mod principal;
mod table;
mod types;
mod value;

#[cfg(test)]
mod tests;

pub use decoding::{decode, decode_with_config, Decoder, DecoderConfig};
pub use encoding::{encode, Encoder};
pub use error::{Error, ErrorCategory, Result};
pub use hash::{idl_hash, idl_label_to_id};
pub use pipe::Pipe;
pub use principal::{crc32, Principal, ANONYMOUS_SUFFIX, SELF_AUTHENTICATING_SUFFIX};
pub use table::TypeTable;
pub use types::{opcode, Field, FuncMode, FuncType, Method, RecursiveType, Type};
pub use value::Value;

/// Message magic number
pub const MAGIC: [u8; 4] = *b"DIDL";

/// Maximum nesting depth while resolving or decoding values
pub const MAX_RECURSION_DEPTH: usize = 256;

/// Maximum number of entries accepted in a wire type table
pub const MAX_TYPE_TABLE_LEN: usize = 1 << 16;

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        decode, encode, Decoder, DecoderConfig, Encoder, Error, Field, FuncMode, Principal,
        RecursiveType, Result, Type, Value, MAGIC,
    };
}
