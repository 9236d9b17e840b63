//! Bit slicing helpers shared by every instruction format.

/// Returns bits `[lsb, msb]` (inclusive) of `word`, right-justified.
pub fn extract_bitfield(word: u32, msb: u32, lsb: u32) -> u32 {
    debug_assert!(lsb <= msb && msb < 32);
    let mask = u32::MAX >> (31 - (msb - lsb));
    (word >> lsb) & mask
}

/// Reinterprets `value` as a two's-complement number whose sign lives in bit
/// `signbit`. Values with that bit clear come back unchanged.
pub fn sign_extend(value: u32, signbit: u32) -> i32 {
    debug_assert!(signbit < 32);
    let sign = 1u32 << signbit;
    if value & sign != 0 {
        ((value & (sign - 1)) as i64 - sign as i64) as i32
    } else {
        value as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extract_bitfield() {
        assert_eq!(extract_bitfield(0xdead_beef, 7, 0), 0xef);
        assert_eq!(extract_bitfield(0xdead_beef, 31, 16), 0xdead);
        assert_eq!(extract_bitfield(0xdead_beef, 31, 0), 0xdead_beef);
        assert_eq!(extract_bitfield(0x8000_0000, 31, 31), 1);
        // addi x1, x0, 5
        assert_eq!(extract_bitfield(0x0050_0093, 6, 0), 0b0010011);
        assert_eq!(extract_bitfield(0x0050_0093, 11, 7), 1);
        assert_eq!(extract_bitfield(0x0050_0093, 31, 20), 5);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0x123, 11), 0x123);
        assert_eq!(sign_extend(0x800, 11), -2048);
        assert_eq!(sign_extend(0xfff, 11), -1);
        assert_eq!(sign_extend(0x1ffe, 12), -2);
        assert_eq!(sign_extend(0x8000_0000, 31), i32::MIN);
        assert_eq!(sign_extend(0xffff_ffff, 31), -1);
        assert_eq!(sign_extend(1, 0), -1);
    }

    proptest! {
        #[test]
        fn extract_matches_slice(word in any::<u32>(), a in 0u32..32, b in 0u32..32) {
            let (lsb, msb) = if a <= b { (a, b) } else { (b, a) };
            let field = extract_bitfield(word, msb, lsb);
            let width = msb - lsb + 1;
            if width < 32 {
                prop_assert!(field < (1u32 << width));
            }
            for i in 0..width {
                prop_assert_eq!((field >> i) & 1, (word >> (lsb + i)) & 1);
            }
        }

        #[test]
        fn sign_extend_matches_native_shift(value in any::<u32>(), signbit in 0u32..32) {
            let width = signbit + 1;
            let pattern = if width == 32 { value } else { value & ((1u32 << width) - 1) };
            let shift = 32 - width;
            let native = ((pattern << shift) as i32) >> shift;
            prop_assert_eq!(sign_extend(pattern, signbit), native);
        }
    }
}
