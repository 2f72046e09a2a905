//! Microsoft Binary Format floating point.
//!
//! Tokenised programs store single and double precision literals the way
//! the 8086 BASIC interpreter held them in memory: little-endian mantissa,
//! sign in the top bit of the highest mantissa byte, and an exponent byte
//! biased by 129 in the last position.

pub fn single_to_mbf(value: f32) -> [u8; 4] {
    let bits = value.to_bits();
    let sign = (bits >> 31) as u8;
    let exp = ((bits >> 23) & 0xFF) as u16;
    let man = bits & 0x7F_FFFF;
    if exp == 0 {
        return [0; 4];
    }
    let exp = exp + 2;
    if exp > 0xFF {
        return [0xFF, 0xFF, 0x7F | (sign << 7), 0xFF];
    }
    [
        man as u8,
        (man >> 8) as u8,
        ((man >> 16) as u8 & 0x7F) | (sign << 7),
        exp as u8,
    ]
}

pub fn mbf_to_single(bytes: [u8; 4]) -> f32 {
    let exp = bytes[3] as u32;
    if exp <= 2 {
        return 0.0;
    }
    let sign = (bytes[2] >> 7) as u32;
    let man = (bytes[0] as u32) | (bytes[1] as u32) << 8 | ((bytes[2] & 0x7F) as u32) << 16;
    f32::from_bits(sign << 31 | (exp - 2) << 23 | man)
}

pub fn double_to_mbf(value: f64) -> [u8; 8] {
    let bits = value.to_bits();
    let sign = (bits >> 63) as u8;
    let exp = ((bits >> 52) & 0x7FF) as i32;
    if exp == 0 {
        return [0; 8];
    }
    let exp = exp - 1023 + 129;
    if exp <= 0 {
        return [0; 8];
    }
    if exp > 0xFF {
        let mut out = [0xFF; 8];
        out[6] = 0x7F | (sign << 7);
        return out;
    }
    let man = (bits & 0xF_FFFF_FFFF_FFFF) << 3;
    let mut out = [0u8; 8];
    out[..7].copy_from_slice(&man.to_le_bytes()[..7]);
    out[6] = (out[6] & 0x7F) | (sign << 7);
    out[7] = exp as u8;
    out
}

pub fn mbf_to_double(bytes: [u8; 8]) -> f64 {
    let exp = bytes[7] as i64;
    if exp == 0 {
        return 0.0;
    }
    let exp = exp - 129 + 1023;
    let sign = (bytes[6] >> 7) as u64;
    let mut man_bytes = [0u8; 8];
    man_bytes[..7].copy_from_slice(&bytes[..7]);
    man_bytes[6] &= 0x7F;
    let man = u64::from_le_bytes(man_bytes) >> 3;
    f64::from_bits(sign << 63 | (exp as u64) << 52 | man)
}
