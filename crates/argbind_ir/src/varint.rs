//! Variable-length unsigned integers.
//!
//! BER compressed integer form: seven bits per byte, most significant group
//! first, high bit set on every byte except the last. `0` is one byte,
//! `128` is `[0x81, 0x00]`, `u64::MAX` is ten bytes.

/// Failure reading a variable-length integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarintError {
    /// The input ended before a byte without the continuation bit.
    Truncated,
    /// The value does not fit in 64 bits.
    Overflow,
}

/// Append `value` to `out`.
pub fn write_ber(out: &mut Vec<u8>, mut value: u64) {
    let mut groups = [0u8; 10];
    let mut count = 0;
    loop {
        groups[count] = (value & 0x7f) as u8;
        count += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | continuation);
    }
}

/// Read a value from the front of `bytes`, returning it and the number of
/// bytes consumed.
pub fn read_ber(bytes: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut value: u64 = 0;
    for (index, byte) in bytes.iter().enumerate() {
        if value > (u64::MAX >> 7) {
            return Err(VarintError::Overflow);
        }
        value = (value << 7) | u64::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Ok((value, index + 1));
        }
    }
    Err(VarintError::Truncated)
}

/// Number of bytes `write_ber` produces for `value`.
pub fn ber_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Map a signed integer onto an unsigned one so small magnitudes stay short.
#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
