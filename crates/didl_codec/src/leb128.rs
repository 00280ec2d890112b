//! LEB128 / SLEB128 variable-length integers
//!
//! `Nat` and `Int` values go through [`BigUint`] / [`BigInt`] so nothing is
//! truncated to a machine word. Lengths, counts and type indices use the
//! `u64` / `i64` forms, which reject values that do not fit.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{ToPrimitive, Zero};

use crate::{Error, Pipe, Result};

/// Encode an unsigned value
pub fn encode_unsigned(value: &BigUint) -> Vec<u8> {
    let mut pipe = Pipe::new();
    write_unsigned(&mut pipe, value);
    pipe.into_vec()
}

/// Encode a signed value
pub fn encode_signed(value: &BigInt) -> Vec<u8> {
    let mut pipe = Pipe::new();
    write_signed(&mut pipe, value);
    pipe.into_vec()
}

/// Append the LEB128 form of `value`
pub fn write_unsigned(pipe: &mut Pipe, value: &BigUint) {
    if let Some(small) = value.to_u64() {
        return write_u64(pipe, small);
    }
    let mut rest = value.clone();
    loop {
        let byte = low_bits(&rest);
        rest >>= 7u32;
        if rest.is_zero() {
            pipe.write_byte(byte);
            break;
        }
        pipe.write_byte(byte | 0x80);
    }
}

/// Append the SLEB128 form of `value`
pub fn write_signed(pipe: &mut Pipe, value: &BigInt) {
    if let Some(small) = value.to_i64() {
        return write_i64(pipe, small);
    }
    let modulus = BigInt::from(0x80);
    let minus_one = BigInt::from(-1);
    let mut rest = value.clone();
    loop {
        // Euclidean remainder keeps the low 7 bits in two's complement form
        let low = ((&rest % &modulus) + &modulus) % &modulus;
        let byte = low.to_u8().unwrap_or_default();
        rest = (rest - low) / &modulus;
        let sign_bit = byte & 0x40 != 0;
        if (rest.is_zero() && !sign_bit) || (rest == minus_one && sign_bit) {
            pipe.write_byte(byte);
            break;
        }
        pipe.write_byte(byte | 0x80);
    }
}

/// Read an unsigned value of any size
pub fn decode_unsigned(pipe: &mut Pipe) -> Result<BigUint> {
    let (groups, _) = read_groups(pipe)?;
    Ok(from_groups(&groups))
}

/// Read a signed value of any size
pub fn decode_signed(pipe: &mut Pipe) -> Result<BigInt> {
    let (groups, last) = read_groups(pipe)?;
    let value = BigInt::from_biguint(Sign::Plus, from_groups(&groups));
    if last & 0x40 != 0 {
        let width = 7 * groups.len() as u64;
        return Ok(value - (BigInt::from(1) << width));
    }
    Ok(value)
}

/// 7-bit payload groups up to and including the terminating byte
fn read_groups(pipe: &mut Pipe) -> Result<(Vec<u8>, u8)> {
    let mut groups = Vec::new();
    loop {
        let byte = pipe.read_byte()?;
        groups.push(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Ok((groups, byte));
        }
    }
}

/// Pack little-endian base-128 digits in one pass
fn from_groups(groups: &[u8]) -> BigUint {
    BigUint::from_radix_le(groups, 128).unwrap_or_default()
}

/// Append the LEB128 form of a `u64`
pub fn write_u64(pipe: &mut Pipe, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            pipe.write_byte(byte);
            break;
        }
        pipe.write_byte(byte | 0x80);
    }
}

/// Append the SLEB128 form of an `i64`
pub fn write_i64(pipe: &mut Pipe, mut value: i64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let sign_bit = byte & 0x40 != 0;
        if (value == 0 && !sign_bit) || (value == -1 && sign_bit) {
            pipe.write_byte(byte);
            break;
        }
        pipe.write_byte(byte | 0x80);
    }
}

/// Read a LEB128 value that must fit a `u64`
pub fn read_u64(pipe: &mut Pipe) -> Result<u64> {
    let mut result = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = pipe.read_byte()?;
        let payload = u64::from(byte & 0x7f);
        let overflow =
            payload != 0 && (shift >= 64 || (shift > 0 && payload >> (64 - shift) != 0));
        if overflow {
            // Keep consuming so a truncated number still reports end of buffer
            if byte & 0x80 != 0 {
                continue_to_end(pipe)?;
            }
            return Err(Error::Overflow("unsigned LEB128"));
        }
        if shift < 64 {
            result |= payload << shift;
        }
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift = shift.saturating_add(7);
    }
}

/// Read a SLEB128 value that must fit an `i64`
///
/// Every bit at position 63 and above must repeat the final sign bit.
pub fn read_i64(pipe: &mut Pipe) -> Result<i64> {
    let mut result = 0i64;
    let mut shift = 0u32;
    let mut high_ones = false;
    let mut high_zeros = false;
    loop {
        let byte = pipe.read_byte()?;
        let payload = byte & 0x7f;
        if shift.saturating_add(7) > 63 {
            let low = 63u32.saturating_sub(shift);
            let high = payload >> low;
            high_ones |= high != 0;
            high_zeros |= high != 0x7f >> low;
        }
        if shift < 64 {
            result |= i64::from(payload) << shift;
        }
        shift = shift.saturating_add(7);
        if byte & 0x80 == 0 {
            let negative = byte & 0x40 != 0;
            if (negative && high_zeros) || (!negative && high_ones) {
                return Err(Error::Overflow("signed LEB128"));
            }
            if negative && shift < 64 {
                result |= -1i64 << shift;
            }
            return Ok(result);
        }
    }
}

/// Read a LEB128 length or count
pub fn read_len(pipe: &mut Pipe) -> Result<usize> {
    let value = read_u64(pipe)?;
    usize::try_from(value).map_err(|_| Error::Overflow("length"))
}

fn continue_to_end(pipe: &mut Pipe) -> Result<()> {
    while pipe.read_byte()? & 0x80 != 0 {}
    Ok(())
}

fn low_bits(value: &BigUint) -> u8 {
    value.iter_u32_digits().next().unwrap_or(0) as u8 & 0x7f
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(v: u128) -> BigUint {
        BigUint::from(v)
    }

    fn roundtrip_unsigned(v: BigUint) {
        let mut pipe = Pipe::from(encode_unsigned(&v));
        assert_eq!(decode_unsigned(&mut pipe).unwrap(), v);
        assert!(pipe.is_exhausted());
    }

    fn roundtrip_signed(v: BigInt) {
        let mut pipe = Pipe::from(encode_signed(&v));
        assert_eq!(decode_signed(&mut pipe).unwrap(), v, "value {v}");
        assert!(pipe.is_exhausted());
    }

    #[test]
    fn test_unsigned_vectors() {
        assert_eq!(encode_unsigned(&big(0)), vec![0x00]);
        assert_eq!(encode_unsigned(&big(127)), vec![0x7f]);
        assert_eq!(encode_unsigned(&big(128)), vec![0x80, 0x01]);
        assert_eq!(encode_unsigned(&big(624485)), vec![0xe5, 0x8e, 0x26]);
    }

    #[test]
    fn test_unsigned_roundtrip() {
        for v in [0u128, 1, 127, 128, u64::MAX as u128, u64::MAX as u128 + 1, u128::MAX] {
            roundtrip_unsigned(big(v));
        }
        roundtrip_unsigned(BigUint::from(1u8) << 300u32);
    }

    #[test]
    fn test_signed_vectors() {
        assert_eq!(encode_signed(&BigInt::from(-1)), vec![0x7f]);
        assert_eq!(encode_signed(&BigInt::from(64)), vec![0xc0, 0x00]);
        assert_eq!(encode_signed(&BigInt::from(-64)), vec![0x40]);
        assert_eq!(encode_signed(&BigInt::from(-65)), vec![0xbf, 0x7f]);
        assert_eq!(encode_signed(&BigInt::from(-123456)), vec![0xc0, 0xbb, 0x78]);
    }

    #[test]
    fn test_signed_roundtrip() {
        for v in [
            0i128,
            1,
            -1,
            63,
            64,
            -64,
            -65,
            i64::MIN as i128,
            i64::MAX as i128,
            i64::MIN as i128 - 1,
            i64::MAX as i128 + 1,
            i128::MIN,
            i128::MAX,
        ] {
            roundtrip_signed(BigInt::from(v));
        }
        let mut v = i64::MIN as i128;
        while v < i64::MAX as i128 {
            roundtrip_signed(BigInt::from(v));
            v += 0x0123_4567_89ab_cdef;
        }
    }

    #[test]
    fn test_big_and_small_paths_agree() {
        let value = BigInt::from(i64::MIN) - 1;
        let bytes = encode_signed(&value);
        let mut pipe = Pipe::from(bytes.clone());
        assert_eq!(decode_signed(&mut pipe).unwrap(), value);

        let mut small = Pipe::new();
        write_i64(&mut small, i64::MIN);
        assert_eq!(small.into_vec(), encode_signed(&BigInt::from(i64::MIN)));
    }

    #[test]
    fn test_truncated() {
        let mut pipe = Pipe::from(vec![0x80, 0x80]);
        assert!(matches!(
            decode_unsigned(&mut pipe),
            Err(Error::EndOfBuffer { .. })
        ));
        let mut pipe = Pipe::from(vec![0xff]);
        assert!(matches!(read_i64(&mut pipe), Err(Error::EndOfBuffer { .. })));
    }

    #[test]
    fn test_i64_bounds() {
        for v in [0i64, 1, -1, 63, 64, -64, -65, i64::MIN, i64::MAX] {
            let mut pipe = Pipe::from(encode_signed(&BigInt::from(v)));
            assert_eq!(read_i64(&mut pipe).unwrap(), v);
            assert!(pipe.is_exhausted());
        }
        // padded encodings of -1 and 1
        assert_eq!(read_i64(&mut Pipe::from(vec![0xff, 0x7f])).unwrap(), -1);
        assert_eq!(read_i64(&mut Pipe::from(vec![0x81, 0x80, 0x00])).unwrap(), 1);

        for v in [BigInt::from(i64::MAX) + 1, BigInt::from(i64::MIN) - 1] {
            let mut pipe = Pipe::from(encode_signed(&v));
            assert_eq!(read_i64(&mut pipe), Err(Error::Overflow("signed LEB128")));
            assert!(pipe.is_exhausted());
        }
    }

    #[test]
    fn test_long_values_decode_in_linear_time() {
        // n groups of seven ones, then a final 1 bit
        let n = 1 << 20;
        let mut bytes = vec![0xff; n];
        bytes.push(0x01);

        let start = std::time::Instant::now();
        let value = decode_unsigned(&mut Pipe::from(bytes.clone())).unwrap();
        let signed = decode_signed(&mut Pipe::from(bytes)).unwrap();
        let elapsed = start.elapsed();

        let bits = 7 * n as u64 + 1;
        assert_eq!(value.bits(), bits);
        assert_eq!(value.count_ones(), bits);
        assert_eq!(signed.magnitude(), &value);
        assert!(elapsed < std::time::Duration::from_secs(5), "took {elapsed:?}");
    }

    #[test]
    fn test_u64_overflow() {
        let mut pipe = Pipe::from(encode_unsigned(&big(u64::MAX as u128)));
        assert_eq!(read_u64(&mut pipe).unwrap(), u64::MAX);

        let mut pipe = Pipe::from(encode_unsigned(&big(u64::MAX as u128 + 1)));
        assert_eq!(read_u64(&mut pipe), Err(Error::Overflow("unsigned LEB128")));
        assert!(pipe.is_exhausted());
    }
}
