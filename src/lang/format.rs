/*!
## Program file formats

A program is saved as plain text, as tokenised program memory, or as
tokenised memory run through the protection transform. The first byte of
a file tells them apart:

| Format    | Marker | Body                                   | End    |
|-----------|--------|----------------------------------------|--------|
| PlainText | none   | `10 PRINT 1` lines ending CR LF        | `0x1A` |
| Tokenised | `0xFF` | linked line records, zero link, tail   | `0x1A` |
| Protected | `0xFE` | the tokenised body, protected          | `0x1A` |

*/

use super::listing::ProgramImage;
use super::protect::{protect, unprotect};
use super::{Error, ErrorCode};
use log::debug;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, Error>;

pub const TOKENISED_MARKER: u8 = 0xFF;
pub const PROTECTED_MARKER: u8 = 0xFE;
pub const SENTINEL: u8 = 0x1A;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    PlainText,
    Tokenised,
    Protected,
}

impl Format {
    /// Format named by the letter SAVE and the converter use:
    /// `A` for plain text, `B` for tokenised, `P` for protected.
    pub fn from_letter(letter: char) -> Option<Format> {
        match letter.to_ascii_uppercase() {
            'A' => Some(Format::PlainText),
            'B' => Some(Format::Tokenised),
            'P' => Some(Format::Protected),
            _ => None,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Format::*;
        match self {
            PlainText => write!(f, "PLAIN TEXT"),
            Tokenised => write!(f, "TOKENISED"),
            Protected => write!(f, "PROTECTED"),
        }
    }
}

/// The bytes of a program file, marker included, tagged with its format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodedBlob {
    PlainText(Vec<u8>),
    Tokenised(Vec<u8>),
    Protected(Vec<u8>),
}

impl EncodedBlob {
    /// Classify file contents by their leading byte.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<EncodedBlob> {
        match bytes.first() {
            None => Ok(EncodedBlob::PlainText(bytes)),
            Some(&TOKENISED_MARKER) => Ok(EncodedBlob::Tokenised(bytes)),
            Some(&PROTECTED_MARKER) => Ok(EncodedBlob::Protected(bytes)),
            Some(&c) if c < 0x80 => Ok(EncodedBlob::PlainText(bytes)),
            Some(&c) => Err(error!(UnknownMarker; format!("&H{:02X}", c))),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            EncodedBlob::PlainText(_) => Format::PlainText,
            EncodedBlob::Tokenised(_) => Format::Tokenised,
            EncodedBlob::Protected(_) => Format::Protected,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            EncodedBlob::PlainText(b) | EncodedBlob::Tokenised(b) | EncodedBlob::Protected(b) => b,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            EncodedBlob::PlainText(b) | EncodedBlob::Tokenised(b) | EncodedBlob::Protected(b) => b,
        }
    }
}

pub fn encode(image: &ProgramImage, format: Format) -> EncodedBlob {
    let blob = match format {
        Format::PlainText => EncodedBlob::PlainText(image.to_text()),
        Format::Tokenised => {
            let mut out = vec![TOKENISED_MARKER];
            out.append(&mut image.to_memory());
            if image.tail().last() != Some(&SENTINEL) {
                out.push(SENTINEL);
            }
            EncodedBlob::Tokenised(out)
        }
        Format::Protected => {
            let mut out = vec![PROTECTED_MARKER];
            out.append(&mut protect(&image.to_memory()));
            out.push(SENTINEL);
            EncodedBlob::Protected(out)
        }
    };
    debug!(
        "encoded {} lines as {} ({} bytes)",
        image.len(),
        format,
        blob.as_bytes().len()
    );
    blob
}

pub fn decode(blob: &EncodedBlob) -> Result<ProgramImage> {
    let image = match blob {
        EncodedBlob::PlainText(bytes) => {
            if let Some(&c) = bytes.first() {
                if c >= 0x80 {
                    return Err(error!(UnknownMarker; format!("&H{:02X}", c)));
                }
            }
            ProgramImage::from_text(bytes)?
        }
        EncodedBlob::Tokenised(bytes) => {
            let body = marked_body(bytes, TOKENISED_MARKER)?;
            ProgramImage::from_memory(body, ErrorCode::CorruptTokenised)?
        }
        EncodedBlob::Protected(bytes) => {
            let mut body = marked_body(bytes, PROTECTED_MARKER)?;
            if let Some((&SENTINEL, rest)) = body.split_last() {
                body = rest;
            }
            ProgramImage::from_memory(&unprotect(body), ErrorCode::CorruptProtected)?
        }
    };
    debug!("decoded {} lines from {}", image.len(), blob.format());
    Ok(image)
}

/// Re-encode a program file in another format.
pub fn convert(blob: &EncodedBlob, format: Format) -> Result<EncodedBlob> {
    Ok(encode(&decode(blob)?, format))
}

fn marked_body(bytes: &[u8], marker: u8) -> Result<&[u8]> {
    match bytes.split_first() {
        Some((&c, body)) if c == marker => Ok(body),
        Some((&c, _)) => Err(error!(UnknownMarker; format!("&H{:02X}", c))),
        None => Err(error!(UnknownMarker; "EMPTY FILE")),
    }
}
