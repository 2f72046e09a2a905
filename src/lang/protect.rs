//! Protected program obfuscation.
//!
//! Every byte is combined with two fixed keys of coprime length, so the
//! transform repeats only every 13 * 11 bytes. Byte position counts from
//! the first byte after the file marker.

const KEY1: [u8; 13] = [
    0xA9, 0x84, 0x8D, 0xCD, 0x75, 0x83, 0x43, 0x63, 0x24, 0x83, 0x19, 0xF7, 0x9A,
];
const KEY2: [u8; 11] = [
    0x1E, 0x1D, 0xC4, 0x77, 0x26, 0x97, 0xE0, 0x74, 0x59, 0x88, 0x7C,
];

pub fn protect_byte(c: u8, index: usize) -> u8 {
    let i1 = index % KEY1.len();
    let i2 = index % KEY2.len();
    let c = c.wrapping_sub(13 - i1 as u8);
    let c = c ^ KEY2[i2] ^ KEY1[i1];
    c.wrapping_add(11 - i2 as u8)
}

pub fn unprotect_byte(c: u8, index: usize) -> u8 {
    let i1 = index % KEY1.len();
    let i2 = index % KEY2.len();
    let c = c.wrapping_sub(11 - i2 as u8);
    let c = c ^ KEY1[i1] ^ KEY2[i2];
    c.wrapping_add(13 - i1 as u8)
}

pub fn protect(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .enumerate()
        .map(|(i, c)| protect_byte(*c, i))
        .collect()
}

pub fn unprotect(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .enumerate()
        .map(|(i, c)| unprotect_byte(*c, i))
        .collect()
}
