use std::collections::HashMap;

/// ## Keyword token table
///
/// Reserved words are stored in program memory as a single byte in
/// `0x81..=0xF4` or as a prefix byte `0xFD`, `0xFE` or `0xFF` followed
/// by a second byte. The table is fixed so that files written by one
/// interpreter load in any other.

pub const END_OF_LINE: u8 = 0x00;
pub const OCT: u8 = 0x0B;
pub const HEX: u8 = 0x0C;
pub const LINE_POINTER: u8 = 0x0D;
pub const LINE_NUMBER: u8 = 0x0E;
pub const BYTE: u8 = 0x0F;
pub const DIGIT_0: u8 = 0x11;
pub const DIGIT_9: u8 = 0x1A;
pub const INTEGER: u8 = 0x1C;
pub const SINGLE: u8 = 0x1D;
pub const DOUBLE: u8 = 0x1F;

pub const COLON: u8 = b':';
pub const QUOTE: u8 = b'"';
pub const DATA: u8 = 0x84;
pub const REM: u8 = 0x8F;
pub const ELSE: u8 = 0xA1;
pub const WHILE: u8 = 0xB1;
pub const APOSTROPHE: u8 = 0xD9;
pub const PLUS: u8 = 0xE9;
pub const PRINT: u8 = 0x91;

const ONE_BYTE: &[(u8, &str)] = &[
    (0x81, "END"),
    (0x82, "FOR"),
    (0x83, "NEXT"),
    (0x84, "DATA"),
    (0x85, "INPUT"),
    (0x86, "DIM"),
    (0x87, "READ"),
    (0x88, "LET"),
    (0x89, "GOTO"),
    (0x8A, "RUN"),
    (0x8B, "IF"),
    (0x8C, "RESTORE"),
    (0x8D, "GOSUB"),
    (0x8E, "RETURN"),
    (0x8F, "REM"),
    (0x90, "STOP"),
    (0x91, "PRINT"),
    (0x92, "CLEAR"),
    (0x93, "LIST"),
    (0x94, "NEW"),
    (0x95, "ON"),
    (0x96, "WAIT"),
    (0x97, "DEF"),
    (0x98, "POKE"),
    (0x99, "CONT"),
    (0x9C, "OUT"),
    (0x9D, "LPRINT"),
    (0x9E, "LLIST"),
    (0xA0, "WIDTH"),
    (0xA1, "ELSE"),
    (0xA2, "TRON"),
    (0xA3, "TROFF"),
    (0xA4, "SWAP"),
    (0xA5, "ERASE"),
    (0xA6, "EDIT"),
    (0xA7, "ERROR"),
    (0xA8, "RESUME"),
    (0xA9, "DELETE"),
    (0xAA, "AUTO"),
    (0xAB, "RENUM"),
    (0xAC, "DEFSTR"),
    (0xAD, "DEFINT"),
    (0xAE, "DEFSNG"),
    (0xAF, "DEFDBL"),
    (0xB0, "LINE"),
    (0xB1, "WHILE"),
    (0xB2, "WEND"),
    (0xB3, "CALL"),
    (0xB7, "WRITE"),
    (0xB8, "OPTION"),
    (0xB9, "RANDOMIZE"),
    (0xBA, "OPEN"),
    (0xBB, "CLOSE"),
    (0xBC, "LOAD"),
    (0xBD, "MERGE"),
    (0xBE, "SAVE"),
    (0xBF, "COLOR"),
    (0xC0, "CLS"),
    (0xC1, "MOTOR"),
    (0xC2, "BSAVE"),
    (0xC3, "BLOAD"),
    (0xC4, "SOUND"),
    (0xC5, "BEEP"),
    (0xC6, "PSET"),
    (0xC7, "PRESET"),
    (0xC8, "SCREEN"),
    (0xC9, "KEY"),
    (0xCA, "LOCATE"),
    (0xCC, "TO"),
    (0xCD, "THEN"),
    (0xCE, "TAB("),
    (0xCF, "STEP"),
    (0xD0, "USR"),
    (0xD1, "FN"),
    (0xD2, "SPC("),
    (0xD3, "NOT"),
    (0xD4, "ERL"),
    (0xD5, "ERR"),
    (0xD6, "STRING$"),
    (0xD7, "USING"),
    (0xD8, "INSTR"),
    (0xD9, "'"),
    (0xDA, "VARPTR"),
    (0xDB, "CSRLIN"),
    (0xDC, "POINT"),
    (0xDD, "OFF"),
    (0xDE, "INKEY$"),
    (0xE6, ">"),
    (0xE7, "="),
    (0xE8, "<"),
    (0xE9, "+"),
    (0xEA, "-"),
    (0xEB, "*"),
    (0xEC, "/"),
    (0xED, "^"),
    (0xEE, "AND"),
    (0xEF, "OR"),
    (0xF0, "XOR"),
    (0xF1, "EQV"),
    (0xF2, "IMP"),
    (0xF3, "MOD"),
    (0xF4, "\\"),
];

const TWO_BYTE: &[(u8, u8, &str)] = &[
    (0xFD, 0x81, "CVI"),
    (0xFD, 0x82, "CVS"),
    (0xFD, 0x83, "CVD"),
    (0xFD, 0x84, "MKI$"),
    (0xFD, 0x85, "MKS$"),
    (0xFD, 0x86, "MKD$"),
    (0xFD, 0x8B, "EXTERR"),
    (0xFE, 0x81, "FILES"),
    (0xFE, 0x82, "FIELD"),
    (0xFE, 0x83, "SYSTEM"),
    (0xFE, 0x84, "NAME"),
    (0xFE, 0x85, "LSET"),
    (0xFE, 0x86, "RSET"),
    (0xFE, 0x87, "KILL"),
    (0xFE, 0x88, "PUT"),
    (0xFE, 0x89, "GET"),
    (0xFE, 0x8A, "RESET"),
    (0xFE, 0x8B, "COMMON"),
    (0xFE, 0x8C, "CHAIN"),
    (0xFE, 0x8D, "DATE$"),
    (0xFE, 0x8E, "TIME$"),
    (0xFE, 0x8F, "PAINT"),
    (0xFE, 0x90, "COM"),
    (0xFE, 0x91, "CIRCLE"),
    (0xFE, 0x92, "DRAW"),
    (0xFE, 0x93, "PLAY"),
    (0xFE, 0x94, "TIMER"),
    (0xFE, 0x95, "ERDEV"),
    (0xFE, 0x96, "IOCTL"),
    (0xFE, 0x97, "CHDIR"),
    (0xFE, 0x98, "MKDIR"),
    (0xFE, 0x99, "RMDIR"),
    (0xFE, 0x9A, "SHELL"),
    (0xFE, 0x9B, "ENVIRON"),
    (0xFE, 0x9C, "VIEW"),
    (0xFE, 0x9D, "WINDOW"),
    (0xFE, 0x9E, "PMAP"),
    (0xFE, 0x9F, "PALETTE"),
    (0xFE, 0xA0, "LCOPY"),
    (0xFE, 0xA1, "CALLS"),
    (0xFE, 0xA5, "PCOPY"),
    (0xFE, 0xA7, "LOCK"),
    (0xFE, 0xA8, "UNLOCK"),
    (0xFF, 0x81, "LEFT$"),
    (0xFF, 0x82, "RIGHT$"),
    (0xFF, 0x83, "MID$"),
    (0xFF, 0x84, "SGN"),
    (0xFF, 0x85, "INT"),
    (0xFF, 0x86, "ABS"),
    (0xFF, 0x87, "SQR"),
    (0xFF, 0x88, "RND"),
    (0xFF, 0x89, "SIN"),
    (0xFF, 0x8A, "LOG"),
    (0xFF, 0x8B, "EXP"),
    (0xFF, 0x8C, "COS"),
    (0xFF, 0x8D, "TAN"),
    (0xFF, 0x8E, "ATN"),
    (0xFF, 0x8F, "FRE"),
    (0xFF, 0x90, "INP"),
    (0xFF, 0x91, "POS"),
    (0xFF, 0x92, "LEN"),
    (0xFF, 0x93, "STR$"),
    (0xFF, 0x94, "VAL"),
    (0xFF, 0x95, "ASC"),
    (0xFF, 0x96, "CHR$"),
    (0xFF, 0x97, "PEEK"),
    (0xFF, 0x98, "SPACE$"),
    (0xFF, 0x99, "OCT$"),
    (0xFF, 0x9A, "HEX$"),
    (0xFF, 0x9B, "LPOS"),
    (0xFF, 0x9C, "CINT"),
    (0xFF, 0x9D, "CSNG"),
    (0xFF, 0x9E, "CDBL"),
    (0xFF, 0x9F, "FIX"),
    (0xFF, 0xA0, "PEN"),
    (0xFF, 0xA1, "STICK"),
    (0xFF, 0xA2, "STRIG"),
    (0xFF, 0xA3, "EOF"),
    (0xFF, 0xA4, "LOC"),
    (0xFF, 0xA5, "LOF"),
];

/// Keywords after which numbers are line numbers.
const LINE_NUMBER_WORDS: &[&str] = &[
    "GOTO", "GOSUB", "THEN", "ELSE", "RESTORE", "RUN", "LIST", "LLIST", "DELETE", "RENUM",
    "AUTO", "EDIT", "RESUME", "ERL",
];

thread_local!(
    static WORD_TO_TOKEN: HashMap<&'static str, Vec<u8>> = ONE_BYTE
        .iter()
        .map(|(b, s)| (*s, vec![*b]))
        .chain(TWO_BYTE.iter().map(|(p, b, s)| (*s, vec![*p, *b])))
        .collect();
    static TOKEN_TO_WORD: HashMap<Vec<u8>, &'static str> = ONE_BYTE
        .iter()
        .map(|(b, s)| (vec![*b], *s))
        .chain(TWO_BYTE.iter().map(|(p, b, s)| (vec![*p, *b], *s)))
        .collect();
);

/// Token bytes for an upper-case reserved word.
pub fn token_for(word: &str) -> Option<Vec<u8>> {
    WORD_TO_TOKEN.with(|wtt| wtt.get(word).cloned())
}

/// Reserved word for one- or two-byte token code.
pub fn word_for(token: &[u8]) -> Option<&'static str> {
    TOKEN_TO_WORD.with(|ttw| ttw.get(token).copied())
}

/// Longest reserved word at the start of `s`, compared without case.
pub fn longest_word(s: &[u8]) -> Option<&'static str> {
    ONE_BYTE
        .iter()
        .map(|(_, w)| *w)
        .chain(TWO_BYTE.iter().map(|(_, _, w)| *w))
        .filter(|w| w.as_bytes()[0].is_ascii_alphabetic())
        .filter(|w| s.len() >= w.len() && s[..w.len()].eq_ignore_ascii_case(w.as_bytes()))
        .max_by_key(|w| w.len())
}

pub fn is_prefix(byte: u8) -> bool {
    byte == 0xFD || byte == 0xFE || byte == 0xFF
}

pub fn takes_line_number(word: &str) -> bool {
    LINE_NUMBER_WORDS.contains(&word)
}

/// Number of operand bytes following a numeric token, if `byte` is one.
pub fn operand_len(byte: u8) -> Option<usize> {
    match byte {
        OCT | HEX | LINE_POINTER | LINE_NUMBER | INTEGER => Some(2),
        BYTE => Some(1),
        SINGLE => Some(4),
        DOUBLE => Some(8),
        DIGIT_0..=DIGIT_9 => Some(0),
        _ => None,
    }
}
