//! Field label hashing
//!
//! Record and variant fields are identified on the wire by a 32-bit id. Names
//! hash to ids; positional names such as `_0_` or `_0x1f_` map to their
//! literal value. Collisions are not resolved.

/// Hash a label name: `h = h * 223 + byte (mod 2^32)`
pub fn idl_hash(name: &str) -> u32 {
    name.bytes()
        .fold(0u32, |h, b| h.wrapping_mul(223).wrapping_add(u32::from(b)))
}

/// Id of a label, honoring the `_<digits>_` / `_0x<hex>_` literal forms
pub fn idl_label_to_id(label: &str) -> u32 {
    literal_id(label).unwrap_or_else(|| idl_hash(label))
}

fn literal_id(label: &str) -> Option<u32> {
    let inner = label.strip_prefix('_')?.strip_suffix('_')?;
    if let Some(hex) = inner.strip_prefix("0x") {
        if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16).ok();
        }
        return None;
    }
    if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
        return inner.parse().ok();
    }
    None
}

/// Name used for a field known only by its id
pub fn id_label(id: u32) -> String {
    format!("_{id}_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_values() {
        assert_eq!(idl_hash(""), 0);
        assert_eq!(idl_hash("a"), 97);
        assert_eq!(idl_hash("ab"), 97 * 223 + 98);
        // Reference ids used by other Candid implementations
        assert_eq!(idl_hash("foo"), 5_097_222);
        assert_eq!(idl_hash("bar"), 4_895_187);
    }

    #[test]
    fn test_hash_wraps() {
        let long = "z".repeat(64);
        let expected = long
            .bytes()
            .fold(0u64, |h, b| (h * 223 + u64::from(b)) % (1u64 << 32));
        assert_eq!(u64::from(idl_hash(&long)), expected);
    }

    #[test]
    fn test_literal_labels() {
        assert_eq!(idl_label_to_id("_0_"), 0);
        assert_eq!(idl_label_to_id("_12_"), 12);
        assert_eq!(idl_label_to_id("_0x1f_"), 31);
        assert_eq!(idl_label_to_id("_4294967295_"), u32::MAX);
    }

    #[test]
    fn test_non_literal_labels_hash() {
        for label in ["_4294967296_", "_0x_", "__", "_1a_", "_12", "12_", "_0x100000000_"] {
            assert_eq!(idl_label_to_id(label), idl_hash(label), "{label}");
        }
    }

    #[test]
    fn test_id_label_roundtrip() {
        for id in [0, 7, u32::MAX] {
            assert_eq!(idl_label_to_id(&id_label(id)), id);
        }
    }
}
