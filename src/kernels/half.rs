//! This module contains the pure, stateless kernels converting between IEEE 754
//! half-precision bit patterns and `f32`.
//!
//! Narrowing truncates the mantissa rather than rounding, so every value that
//! is exactly representable as a half survives a round trip unchanged.

/// Widens a half-precision bit pattern to `f32`. Exact for every input.
pub fn f16_bits_to_f32(bits: u16) -> f32 {
    let sign = u32::from(bits >> 15) << 31;
    let exp = u32::from((bits >> 10) & 0x1F);
    let mut mant = u32::from(bits & 0x3FF);

    let out = if exp == 0 {
        if mant == 0 {
            sign
        } else {
            // Subnormal: shift until the implicit bit appears.
            let mut e: u32 = 127 - 15 + 1;
            while mant & 0x400 == 0 {
                mant <<= 1;
                e -= 1;
            }
            mant &= 0x3FF;
            sign | (e << 23) | (mant << 13)
        }
    } else if exp == 0x1F {
        sign | 0x7F80_0000 | (mant << 13)
    } else {
        sign | ((exp + 127 - 15) << 23) | (mant << 13)
    };
    f32::from_bits(out)
}

/// Narrows an `f32` to a half-precision bit pattern.
///
/// Magnitudes beyond the half range become infinity, those below the smallest
/// subnormal become signed zero. NaN stays NaN.
pub fn f32_to_f16_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let raw_exp = ((bits >> 23) & 0xFF) as i32;
    let mant = bits & 0x007F_FFFF;

    if raw_exp == 0xFF {
        if mant == 0 {
            return sign | 0x7C00;
        }
        // Keep a non-zero payload so truncation cannot turn NaN into infinity.
        let payload = (mant >> 13) as u16;
        return sign | 0x7C00 | if payload == 0 { 0x200 } else { payload };
    }

    let exp = raw_exp - 127 + 15;
    if exp >= 0x1F {
        return sign | 0x7C00;
    }
    if exp <= 0 {
        if exp < -10 {
            return sign;
        }
        let mant = (mant | 0x0080_0000) >> (1 - exp);
        return sign | (mant >> 13) as u16;
    }
    sign | ((exp as u16) << 10) | (mant >> 13) as u16
}
