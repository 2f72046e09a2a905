use super::mbf::{double_to_mbf, single_to_mbf};
use super::token::*;
use super::{LineNumber, MaxValue};

/// Split a line of program text into its line number and token bytes.
pub fn lex(s: &[u8]) -> (LineNumber, Vec<u8>) {
    BasicLexer::lex(s)
}

fn is_basic_whitespace(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'.'
}

fn is_sigil(c: u8) -> bool {
    c == b'$' || c == b'%' || c == b'!' || c == b'#'
}

struct BasicLexer<'a> {
    s: &'a [u8],
    pos: usize,
    out: Vec<u8>,
    remark: bool,
    data: bool,
    line_numbers: bool,
}

impl<'a> BasicLexer<'a> {
    fn lex(s: &[u8]) -> (LineNumber, Vec<u8>) {
        let mut ln = 0;
        while ln < s.len() && is_basic_whitespace(s[ln]) {
            ln += 1;
        }
        let start = ln;
        while ln < s.len() && s[ln].is_ascii_digit() {
            ln += 1;
        }
        let mut line_number = None;
        let mut rest = s;
        if ln > start {
            let digits = String::from_utf8_lossy(&s[start..ln]);
            if let Ok(n) = digits.parse::<u32>() {
                if n <= LineNumber::max_value() as u32 {
                    line_number = Some(n as u16);
                    if s.get(ln) == Some(&b' ') {
                        ln += 1;
                    }
                    rest = &s[ln..];
                }
            }
        }
        let mut lexer = BasicLexer {
            s: rest,
            pos: 0,
            out: Vec::with_capacity(rest.len()),
            remark: false,
            data: false,
            line_numbers: false,
        };
        lexer.run();
        let mut tokens = lexer.out;
        if line_number.is_none() {
            while let Some(true) = tokens.last().map(|c| is_basic_whitespace(*c)) {
                tokens.pop();
            }
        }
        (line_number, tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.s.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.s.get(self.pos + offset).copied()
    }

    fn run(&mut self) {
        while let Some(c) = self.peek() {
            if c == END_OF_LINE {
                self.pos += 1;
                continue;
            }
            if self.remark {
                let rest = &self.s[self.pos..];
                self.out.extend(rest.iter().filter(|&&c| c != END_OF_LINE));
                self.pos = self.s.len();
                break;
            }
            if c == QUOTE {
                self.string();
                continue;
            }
            if self.data {
                self.pos += 1;
                self.out.push(c);
                if c == COLON {
                    self.data = false;
                }
                continue;
            }
            if is_basic_whitespace(c) {
                self.pos += 1;
                self.out.push(c);
            } else if c.is_ascii_digit() || c == b'.' {
                if self.line_numbers && c.is_ascii_digit() {
                    self.line_number();
                } else {
                    self.number();
                    self.line_numbers = false;
                }
            } else if c == b'&' {
                self.radix();
                self.line_numbers = false;
            } else if c.is_ascii_alphabetic() {
                self.alphabetic();
            } else {
                self.minutia(c);
            }
        }
    }

    fn string(&mut self) {
        self.out.push(QUOTE);
        self.pos += 1;
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == END_OF_LINE {
                continue;
            }
            self.out.push(c);
            if c == QUOTE {
                break;
            }
        }
    }

    /// Punctuation and anything else outside strings and remarks. Control
    /// and high bytes would read as token codes here, so they are dropped.
    fn minutia(&mut self, c: u8) {
        self.pos += 1;
        match c {
            0x00..=0x1F | 0x7F..=0xFF => {}
            b'\'' => {
                self.out.extend_from_slice(&[COLON, REM, APOSTROPHE]);
                self.remark = true;
            }
            b'?' => {
                self.out.push(PRINT);
                self.line_numbers = false;
            }
            b',' | b'-' if self.line_numbers => {
                self.out.push(token_for(&(c as char).to_string()).map_or(c, |t| t[0]));
            }
            _ => {
                let word = (c as char).to_string();
                match token_for(&word) {
                    Some(token) if !c.is_ascii_alphanumeric() => self.out.extend(token),
                    _ => self.out.push(c),
                }
                self.line_numbers = false;
            }
        }
    }

    fn alphabetic(&mut self) {
        if let Some(word) = longest_word(&self.s[self.pos..]) {
            self.pos += word.len();
            self.keyword(word);
            return;
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_name_char(c) {
                break;
            }
            self.pos += 1;
        }
        let name = self.s[start..self.pos].to_ascii_uppercase();
        if name == b"GO" && self.collapse_go() {
            return;
        }
        self.out.extend_from_slice(&name);
        if let Some(c) = self.peek() {
            if is_sigil(c) {
                self.pos += 1;
                self.out.push(c);
            }
        }
        self.line_numbers = false;
    }

    fn collapse_go(&mut self) -> bool {
        let mut ahead = self.pos;
        while ahead < self.s.len() && is_basic_whitespace(self.s[ahead]) {
            ahead += 1;
        }
        for (word, full) in [("TO", "GOTO"), ("SUB", "GOSUB")].iter() {
            let end = ahead + word.len();
            if end <= self.s.len() && self.s[ahead..end].eq_ignore_ascii_case(word.as_bytes()) {
                self.pos = end;
                self.keyword(full);
                return true;
            }
        }
        false
    }

    fn keyword(&mut self, word: &str) {
        let token = match token_for(word) {
            Some(token) => token,
            None => {
                debug_assert!(false, "Keyword missing from table.");
                return;
            }
        };
        match token[0] {
            ELSE => self.out.push(COLON),
            REM => self.remark = true,
            DATA => self.data = true,
            _ => {}
        }
        self.out.extend_from_slice(&token);
        if token[0] == WHILE {
            self.out.push(PLUS);
        }
        self.line_numbers = takes_line_number(word);
    }

    fn line_number(&mut self) {
        let start = self.pos;
        while let Some(true) = self.peek().map(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits = String::from_utf8_lossy(&self.s[start..self.pos]).to_string();
        match digits.parse::<u16>() {
            Ok(n) if n <= LineNumber::max_value() => {
                self.out.push(LINE_NUMBER);
                self.out.extend_from_slice(&n.to_le_bytes());
            }
            _ => {
                self.pos = start;
                self.number();
                self.line_numbers = false;
            }
        }
    }

    fn radix(&mut self) {
        self.pos += 1;
        let (token, radix) = match self.peek().map(|c| c.to_ascii_uppercase()) {
            Some(b'H') => {
                self.pos += 1;
                (HEX, 16)
            }
            Some(b'O') => {
                self.pos += 1;
                (OCT, 8)
            }
            _ => (OCT, 8),
        };
        let mut value: u32 = 0;
        while let Some(d) = self.peek().and_then(|c| (c as char).to_digit(radix)) {
            self.pos += 1;
            value = (value * radix + d) & 0xFFFF;
        }
        self.out.push(token);
        self.out.extend_from_slice(&(value as u16).to_le_bytes());
    }

    fn number(&mut self) {
        let start = self.pos;
        let mut decimal = false;
        let mut exp = false;
        let mut double = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == b'.' && !decimal && !exp {
                decimal = true;
                self.pos += 1;
            } else if !exp && matches!(c.to_ascii_uppercase(), b'E' | b'D') && self.exponent_follows() {
                exp = true;
                double = c.to_ascii_uppercase() == b'D';
                self.pos += 1;
                if let Some(b'+') | Some(b'-') = self.peek() {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
        let text = String::from_utf8_lossy(&self.s[start..self.pos])
            .to_ascii_uppercase()
            .replace('D', "E");
        let mantissa = text.split('E').next().unwrap_or("");
        let significant = mantissa
            .trim_start_matches(|c: char| c == '0' || c == '.')
            .chars()
            .filter(|c| c.is_ascii_digit())
            .count();
        let sigil = match self.peek() {
            Some(c) if c == b'%' || c == b'!' || c == b'#' => {
                self.pos += 1;
                Some(c)
            }
            _ => None,
        };
        let value = text.parse::<f64>().unwrap_or(0.0);
        match sigil {
            Some(b'#') => return self.double(value),
            Some(b'!') => return self.single(value),
            Some(b'%') if value.fract() == 0.0 && value <= i16::max_value() as f64 => {
                return self.integer(value as u16)
            }
            _ => {}
        }
        if double || significant > 7 {
            self.double(value)
        } else if decimal || exp || value > i16::max_value() as f64 {
            self.single(value)
        } else {
            self.integer(value as u16)
        }
    }

    fn exponent_follows(&self) -> bool {
        match self.peek_at(1) {
            Some(c) if c.is_ascii_digit() => true,
            Some(b'+') | Some(b'-') => self.peek_at(2).map_or(false, |c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn integer(&mut self, n: u16) {
        if n <= 9 {
            self.out.push(DIGIT_0 + n as u8);
        } else if n <= 0xFF {
            self.out.extend_from_slice(&[BYTE, n as u8]);
        } else {
            self.out.push(INTEGER);
            self.out.extend_from_slice(&n.to_le_bytes());
        }
    }

    fn single(&mut self, value: f64) {
        self.out.push(SINGLE);
        self.out.extend_from_slice(&single_to_mbf(value as f32));
    }

    fn double(&mut self, value: f64) {
        self.out.push(DOUBLE);
        self.out.extend_from_slice(&double_to_mbf(value));
    }
}
