use super::mbf::{mbf_to_double, mbf_to_single};
use super::token::*;
use std::convert::TryInto;

/// Turn the token bytes of one line back into program text.
pub fn detokenise(tokens: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tokens.len() * 2);
    let mut pos = 0;
    let mut quoted = false;
    let mut remark = false;
    let mut data = false;
    while pos < tokens.len() {
        let c = tokens[pos];
        pos += 1;
        if quoted {
            out.push(c);
            quoted = c != QUOTE;
            continue;
        }
        if remark {
            out.push(c);
            continue;
        }
        if c == QUOTE {
            out.push(c);
            quoted = true;
            continue;
        }
        if data {
            out.push(c);
            data = c != COLON;
            continue;
        }
        if c == COLON {
            if tokens.get(pos) == Some(&ELSE) {
                out.extend_from_slice(b"ELSE");
                pos += 1;
            } else if tokens[pos..].starts_with(&[REM, APOSTROPHE]) {
                out.push(b'\'');
                pos += 2;
                remark = true;
            } else {
                out.push(c);
            }
            continue;
        }
        if let Some(len) = operand_len(c) {
            let operand = match tokens.get(pos..pos + len) {
                Some(operand) => operand,
                None => {
                    out.push(c);
                    continue;
                }
            };
            pos += len;
            out.extend_from_slice(number(c, operand).as_bytes());
            continue;
        }
        if is_prefix(c) && pos < tokens.len() {
            if let Some(word) = word_for(&tokens[pos - 1..=pos]) {
                out.extend_from_slice(word.as_bytes());
                pos += 1;
                continue;
            }
        }
        if c >= 0x80 {
            if let Some(word) = word_for(&[c]) {
                out.extend_from_slice(word.as_bytes());
                match c {
                    REM => remark = true,
                    DATA => data = true,
                    WHILE if tokens.get(pos) == Some(&PLUS) => pos += 1,
                    _ => {}
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn number(token: u8, operand: &[u8]) -> String {
    let word = |o: &[u8]| u16::from_le_bytes([o[0], o[1]]);
    match token {
        DIGIT_0..=DIGIT_9 => (token - DIGIT_0).to_string(),
        BYTE => operand[0].to_string(),
        INTEGER => (word(operand) as i16).to_string(),
        LINE_NUMBER | LINE_POINTER => word(operand).to_string(),
        HEX => format!("&H{:X}", word(operand)),
        OCT => format!("&O{:o}", word(operand)),
        SINGLE => match operand.try_into() {
            Ok(bytes) => single(mbf_to_single(bytes)),
            Err(_) => String::new(),
        },
        DOUBLE => match operand.try_into() {
            Ok(bytes) => double(mbf_to_double(bytes)),
            Err(_) => String::new(),
        },
        _ => String::new(),
    }
}

fn significant_digits(s: &str) -> usize {
    s.split(|c| c == 'E' || c == 'D')
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| c == '0' || c == '.' || c == '-')
        .chars()
        .filter(|c| c.is_ascii_digit())
        .count()
}

/// Write `mantissa E exponent` as the interpreter lists it: `1.5E+10`.
fn exponent_form(s: &str, marker: char) -> String {
    let mut parts = s.splitn(2, 'E');
    let mantissa = parts.next().unwrap_or("0");
    let exp: i32 = parts.next().and_then(|e| e.parse().ok()).unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}{}{}{:02}", mantissa, marker, sign, exp.abs())
}

fn trim_leading_zero(s: String) -> String {
    if s.starts_with("0.") {
        s[1..].to_string()
    } else {
        s
    }
}

fn single(value: f32) -> String {
    let magnitude = value.abs();
    let mut s = if magnitude != 0.0 && !(0.01..1e7).contains(&magnitude) {
        exponent_form(&format!("{:E}", value), 'E')
    } else {
        trim_leading_zero(format!("{}", value))
    };
    if (!s.contains('.') && !s.contains('E')) || significant_digits(&s) > 7 {
        s.push('!');
    }
    s
}

fn double(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(0.01..1e16).contains(&magnitude) {
        exponent_form(&format!("{:E}", value), 'D')
    } else {
        let mut s = trim_leading_zero(format!("{}", value));
        s.push('#');
        s
    }
}
