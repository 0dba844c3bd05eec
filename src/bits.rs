//! Bit field primitives.
//!
//! Fields are addressed MSB first: bit 0 is the most significant bit
//! of the first byte. These helpers do not check the buffer boundaries
//! beyond slice indexing; decoders working on untrusted data should
//! go through [crate::stream::BitStream].
use num_traits::PrimInt;

/// Extracts an unsigned field of `len` bits (at most 64)
/// starting at bit `pos`. A zero length field is 0.
pub fn get_unsigned(buf: &[u8], pos: usize, len: usize) -> u64 {
    debug_assert!(len <= 64, "field width exceeds 64 bits");
    let mut value = 0_u64;
    for i in pos..pos + len {
        value = (value << 1) | u64::from((buf[i / 8] >> (7 - i % 8)) & 0x01);
    }
    value
}

/// Extracts a two's complement field of `len` bits (at most 64)
/// starting at bit `pos`.
pub fn get_signed(buf: &[u8], pos: usize, len: usize) -> i64 {
    sign_extend(get_unsigned(buf, pos, len), len)
}

/// Interprets the `len` LSBs of `value` as a two's complement integer:
/// `value >= 2^(len-1)` maps to `value - 2^len`.
pub fn sign_extend(value: u64, len: usize) -> i64 {
    if len == 0 {
        return 0;
    }
    if len >= 64 {
        return value as i64;
    }
    let value = value & ((1_u64 << len) - 1);
    if value >= 1_u64 << (len - 1) {
        value as i64 - (1_i64 << len)
    } else {
        value as i64
    }
}

/// Writes the `len` LSBs of `value` at bit `pos`, MSB first.
/// Bits outside of the field are left untouched.
pub fn set_unsigned(buf: &mut [u8], pos: usize, len: usize, value: u64) {
    debug_assert!(len <= 64, "field width exceeds 64 bits");
    for i in 0..len {
        let index = pos + i;
        let mask = 0x80_u8 >> (index % 8);
        if (value >> (len - 1 - i)) & 0x01 == 1 {
            buf[index / 8] |= mask;
        } else {
            buf[index / 8] &= !mask;
        }
    }
}

/// Writes `value` as a `len` bit two's complement field at bit `pos`.
pub fn set_signed(buf: &mut [u8], pos: usize, len: usize, value: i64) {
    set_unsigned(buf, pos, len, value as u64);
}

/// Copies `len` bits from `src` (starting at bit `src_pos`)
/// into `dst` (starting at bit `dst_pos`).
pub fn bit_copy(dst: &mut [u8], dst_pos: usize, src: &[u8], src_pos: usize, len: usize) {
    let mut done = 0;
    while done < len {
        let chunk = (len - done).min(32);
        let value = get_unsigned(src, src_pos + done, chunk);
        set_unsigned(dst, dst_pos + done, chunk, value);
        done += chunk;
    }
}

/// Moves `len` bits within `buf`, from bit `src_pos` to bit `dst_pos`.
/// Source and destination may overlap.
pub fn bit_copy_within(buf: &mut [u8], dst_pos: usize, src_pos: usize, len: usize) {
    if dst_pos <= src_pos {
        let mut done = 0;
        while done < len {
            let chunk = (len - done).min(32);
            let value = get_unsigned(buf, src_pos + done, chunk);
            set_unsigned(buf, dst_pos + done, chunk, value);
            done += chunk;
        }
    } else {
        // walk backwards so the tail of the source is read before being overwritten
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(32);
            remaining -= chunk;
            let value = get_unsigned(buf, src_pos + remaining, chunk);
            set_unsigned(buf, dst_pos + remaining, chunk, value);
        }
    }
}

/// Shifts the first `len` bits of `buf` left by `shift` bits.
/// Vacated low order bits are zero filled.
pub fn bit_shift_left(buf: &mut [u8], len: usize, shift: usize) {
    let shift = shift.min(len);
    bit_copy_within(buf, 0, shift, len - shift);
    let mut pos = len - shift;
    while pos < len {
        let chunk = (len - pos).min(64);
        set_unsigned(buf, pos, chunk, 0);
        pos += chunk;
    }
}

/// Even parity: 1 when `word` holds an odd number of set bits.
pub fn parity(word: u32) -> u8 {
    let mut x = word;
    x ^= x >> 16;
    x ^= x >> 8;
    x ^= x >> 4;
    x &= 0x0f;
    ((0x6996_u32 >> x) & 0x01) as u8
}

/// Counts the bits of `word` equal to `target`.
pub fn count_bits<T: PrimInt>(word: T, target: bool) -> u32 {
    if target {
        word.count_ones()
    } else {
        word.count_zeros()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn unsigned_fields() {
        let buf = [0xde, 0xad, 0xbe, 0xef];
        assert_eq!(get_unsigned(&buf, 0, 0), 0);
        assert_eq!(get_unsigned(&buf, 0, 8), 0xde);
        assert_eq!(get_unsigned(&buf, 4, 8), 0xea);
        assert_eq!(get_unsigned(&buf, 0, 32), 0xdeadbeef);
        assert_eq!(get_unsigned(&buf, 28, 4), 0xf);
        assert_eq!(get_unsigned(&buf, 7, 1), 0);
        assert_eq!(get_unsigned(&buf, 8, 1), 1);
    }
    #[test]
    fn signed_fields() {
        let buf = [0xde, 0xad, 0xbe, 0xef];
        assert_eq!(get_signed(&buf, 0, 8), -34);
        assert_eq!(get_signed(&buf, 0, 32), 0xdeadbeef_u32 as i32 as i64);
        assert_eq!(get_signed(&buf, 2, 6), 30);
        assert_eq!(get_signed(&buf, 0, 1), -1);
    }
    #[test]
    fn sign_extension() {
        for (value, len, expected) in [
            (0x0_u64, 1, 0_i64),
            (0x1, 1, -1),
            (0x7f, 8, 127),
            (0x80, 8, -128),
            (0xff, 8, -1),
            (0x3fffff, 22, -1),
            (0x200000, 22, -2097152),
            (0x1fffff, 22, 2097151),
            (u64::MAX, 64, -1),
            (0x8000_0000_0000_0000, 64, i64::MIN),
            (0x7fff_ffff_ffff_ffff, 64, i64::MAX),
        ] {
            assert_eq!(
                sign_extend(value, len),
                expected,
                "sign_extend({:x}, {}) failed",
                value,
                len
            );
        }
    }
    #[test]
    fn set_fields() {
        let mut buf = [0_u8; 4];
        set_unsigned(&mut buf, 4, 8, 0xab);
        assert_eq!(buf, [0x0a, 0xb0, 0x00, 0x00]);
        set_signed(&mut buf, 16, 16, -2);
        assert_eq!(buf, [0x0a, 0xb0, 0xff, 0xfe]);
        set_unsigned(&mut buf, 0, 4, 0xfff);
        assert_eq!(buf, [0xfa, 0xb0, 0xff, 0xfe]);
        set_unsigned(&mut buf, 8, 0, 0xff);
        assert_eq!(buf, [0xfa, 0xb0, 0xff, 0xfe]);
    }
    #[test]
    fn shift_left() {
        for (shift, expected) in [
            (16, [0xbe, 0xef, 0x00, 0x00]),
            (4, [0xea, 0xdb, 0xee, 0xf0]),
            (12, [0xdb, 0xee, 0xf0, 0x00]),
            (10, [0xb6, 0xfb, 0xbc, 0x00]),
            (40, [0x00, 0x00, 0x00, 0x00]),
        ] {
            let mut buf = [0xde, 0xad, 0xbe, 0xef];
            bit_shift_left(&mut buf, 32, shift);
            assert_eq!(buf, expected, "{}-bit shift", shift);
        }
    }
    #[test]
    fn copy_within() {
        let mut buf = [0xde, 0xad, 0xbe, 0xef];
        bit_copy_within(&mut buf, 0, 16, 16);
        assert_eq!(buf, [0xbe, 0xef, 0xbe, 0xef], "16-bit copy");

        let mut buf = [0xde, 0xad, 0xbe, 0xef];
        bit_copy_within(&mut buf, 0, 4, 28);
        assert_eq!(buf, [0xea, 0xdb, 0xee, 0xff], "28-bit copy");

        let mut buf = [0xde, 0xad, 0xbe, 0xef, 0xde, 0xad, 0xbe, 0xef, 0xde, 0xad];
        bit_copy_within(&mut buf, 0, 8, 72);
        assert_eq!(
            buf,
            [0xad, 0xbe, 0xef, 0xde, 0xad, 0xbe, 0xef, 0xde, 0xad, 0xad],
            "72-bit copy"
        );

        let mut buf = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x00];
        bit_copy_within(&mut buf, 8, 0, 40);
        assert_eq!(buf, [0xde, 0xde, 0xad, 0xbe, 0xef, 0x00], "overlapping forward move");
    }
    #[test]
    fn copy_between_buffers() {
        let src = [0xde, 0xad, 0xbe, 0xef];
        let mut dst = [0x00; 5];
        bit_copy(&mut dst, 4, &src, 0, 32);
        assert_eq!(dst, [0x0d, 0xea, 0xdb, 0xee, 0xf0]);
    }
    #[test]
    fn parity_bit() {
        for (word, expected) in [
            (0_u32, 0_u8),
            (1, 1),
            (3, 0),
            (0x8000_0000, 1),
            (0xffff_ffff, 0),
            (0xdeadbeef, 0),
            (0x7fff_ffff, 1),
        ] {
            assert_eq!(parity(word), expected, "parity({:x})", word);
        }
    }
    #[test]
    fn bit_counting() {
        for (word, ones) in [(0xde_u8, 6), (0xad, 5), (0x12, 2), (0xef, 7)] {
            assert_eq!(count_bits(word, true), ones);
            assert_eq!(count_bits(word, false), 8 - ones);
        }
        for (word, ones) in [(0xde05_u16, 8), (0xadf6, 11), (0xbe32, 9), (0xef45, 10)] {
            assert_eq!(count_bits(word, true), ones);
            assert_eq!(count_bits(word, false), 16 - ones);
        }
        for (word, ones) in [
            (0xde051234_u32, 13),
            (0x00000000, 0),
            (0x00329300, 7),
            (0x1f45a6c8, 15),
        ] {
            assert_eq!(count_bits(word, true), ones);
            assert_eq!(count_bits(word, false), 32 - ones);
        }
        for (word, ones) in [
            (0xde051234432150ed_u64, 26),
            (0x0000000080000000, 1),
            (0x0032930000392300, 14),
            (0x10f14350a060c080, 18),
        ] {
            assert_eq!(count_bits(word, true), ones);
            assert_eq!(count_bits(word, false), 64 - ones);
        }
    }
}
