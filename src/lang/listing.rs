use super::format::SENTINEL;
use super::token::{is_prefix, operand_len, COLON, DATA, END_OF_LINE, QUOTE, REM};
use super::{Error, ErrorCode, Line, LineNumber, MaxValue};
use std::collections::{btree_map::Values, BTreeMap};

type Result<T> = std::result::Result<T, Error>;

/// Address of the first line record in program memory. Line links in
/// tokenised files count from here.
pub const PROGRAM_BASE: u16 = 0x126E;

/// ## Program image
///
/// The numbered lines of a program in tokenised form. Bytes found after the
/// end of program link are kept as the tail and written back out with the
/// binary formats; they are not part of the program.

#[derive(Debug, Clone, Default)]
pub struct ProgramImage {
    source: BTreeMap<u16, Line>,
    tail: Vec<u8>,
}

impl PartialEq for ProgramImage {
    fn eq(&self, other: &ProgramImage) -> bool {
        self.source == other.source
    }
}

impl Eq for ProgramImage {}

impl ProgramImage {
    pub fn new() -> ProgramImage {
        ProgramImage::default()
    }

    pub fn clear(&mut self) {
        self.source.clear();
        self.tail.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn insert(&mut self, line: Line) -> Option<Line> {
        let number = line.number()?;
        self.source.insert(number, line)
    }

    pub fn remove(&mut self, number: u16) -> Option<Line> {
        self.source.remove(&number)
    }

    pub fn line(&self, number: u16) -> Option<&Line> {
        self.source.get(&number)
    }

    pub fn lines(&self) -> Values<'_, u16, Line> {
        self.source.values()
    }

    pub fn tail(&self) -> &[u8] {
        &self.tail
    }

    /// Enter one line of program text the way typing it would.
    pub fn load_str(&mut self, s: &[u8]) -> Result<()> {
        let line = Line::new(s);
        if line.is_empty() {
            if let Some(number) = line.number() {
                self.source.remove(&number);
            }
            Ok(())
        } else if line.is_direct() {
            Err(error!(DirectStatementInFile))
        } else {
            self.insert(line);
            Ok(())
        }
    }

    /// Read plain program text up to the end of file byte.
    pub fn from_text(bytes: &[u8]) -> Result<ProgramImage> {
        let mut image = ProgramImage::new();
        let end = bytes
            .iter()
            .position(|&c| c == SENTINEL)
            .unwrap_or_else(|| bytes.len());
        let text = &bytes[..end];
        let mut start = 0;
        let mut index = 0;
        while start < text.len() {
            let stop = text[start..]
                .iter()
                .position(|&c| c == b'\r' || c == b'\n')
                .map_or(text.len(), |p| start + p);
            index += 1;
            if let Err(error) = image.load_str(&text[start..stop]) {
                return Err(error.message(format!(
                    "In line {} of the file. (Not BASIC line number)",
                    index
                )));
            }
            start = stop;
            if text[start..].starts_with(b"\r\n") {
                start += 2;
            } else if start < text.len() {
                start += 1;
            }
        }
        Ok(image)
    }

    pub fn to_text(&self) -> Vec<u8> {
        let mut out = vec![];
        for line in self.lines() {
            out.append(&mut line.text());
            out.extend_from_slice(b"\r\n");
        }
        out.push(SENTINEL);
        out
    }

    /// Program memory: linked line records, a zero link, then the tail.
    pub fn to_memory(&self) -> Vec<u8> {
        let mut out = vec![];
        for (number, line) in self.source.iter() {
            let len = 2 + 2 + line.tokens().len() + 1;
            let link = PROGRAM_BASE.wrapping_add((out.len() + len) as u16);
            out.extend_from_slice(&link.to_le_bytes());
            out.extend_from_slice(&number.to_le_bytes());
            out.extend_from_slice(line.tokens());
            out.push(END_OF_LINE);
        }
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&self.tail);
        out
    }

    /// Parse program memory. `corrupt` is the error reported when the
    /// memory does not reach its end of program link.
    pub fn from_memory(mem: &[u8], corrupt: ErrorCode) -> Result<ProgramImage> {
        let mut image = ProgramImage::new();
        let mut pos = 0;
        let mut last: Option<u16> = None;
        loop {
            let link = match mem.get(pos..pos + 2) {
                Some(link) => u16::from_le_bytes([link[0], link[1]]),
                None => return Err(Error::new(corrupt).message("MISSING END OF PROGRAM")),
            };
            pos += 2;
            if link == 0 {
                break;
            }
            let number = match mem.get(pos..pos + 2) {
                Some(number) => u16::from_le_bytes([number[0], number[1]]),
                None => return Err(Error::new(corrupt).message("TRUNCATED LINE")),
            };
            pos += 2;
            let end = match line_end(mem, pos) {
                Some(end) => end,
                None => return Err(Error::new(corrupt).message("UNTERMINATED LINE")),
            };
            if number > LineNumber::max_value() || last.map_or(false, |last| number <= last) {
                return Err(Error::new(corrupt).message(format!("BAD LINE NUMBER {}", number)));
            }
            last = Some(number);
            image
                .source
                .insert(number, Line::from_tokens(number, mem[pos..end].to_vec()));
            pos = end + 1;
        }
        image.tail = mem[pos..].to_vec();
        Ok(image)
    }
}

/// Index of the zero byte ending the line that starts at `pos`. Zero bytes
/// inside numeric operands do not end a line.
fn line_end(mem: &[u8], mut pos: usize) -> Option<usize> {
    let mut quoted = false;
    let mut remark = false;
    let mut data = false;
    while pos < mem.len() {
        let c = mem[pos];
        if c == END_OF_LINE {
            return Some(pos);
        }
        pos += 1;
        if quoted {
            quoted = c != QUOTE;
        } else if remark {
            continue;
        } else if c == QUOTE {
            quoted = true;
        } else if data {
            data = c != COLON;
        } else if c == REM {
            remark = true;
        } else if c == DATA {
            data = true;
        } else if is_prefix(c) {
            pos += 1;
        } else if let Some(len) = operand_len(c) {
            pos += len;
        }
    }
    None
}
