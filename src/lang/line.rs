use super::lex::*;
use super::list::*;
use super::LineNumber;

/// One line of program text held in tokenised form.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    number: LineNumber,
    tokens: Vec<u8>,
}

impl Line {
    pub fn new(s: &[u8]) -> Line {
        let (number, tokens) = lex(s);
        Line { number, tokens }
    }

    pub fn from_tokens(number: u16, tokens: Vec<u8>) -> Line {
        Line {
            number: Some(number),
            tokens,
        }
    }

    pub fn number(&self) -> LineNumber {
        self.number
    }

    pub fn is_direct(&self) -> bool {
        self.number.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[u8] {
        &self.tokens
    }

    /// Program text for this line, as LIST would show it.
    pub fn text(&self) -> Vec<u8> {
        let mut out = match self.number {
            Some(number) => format!("{} ", number).into_bytes(),
            None => vec![],
        };
        out.append(&mut detokenise(&self.tokens));
        out
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.text()))
    }
}
