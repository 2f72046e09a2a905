/*!
## Rust Language Module

This Rust module holds BASIC programs as the interpreter stores them:
tokenised lines, and the three file formats a program is saved in.

*/

#[macro_use]
mod error;
mod lex;
mod line;
mod list;
mod listing;
mod mbf;
mod protect;

pub mod format;
pub mod token;

pub use error::io_error;
pub use error::Error;
pub use error::ErrorCode;
pub use format::{convert, decode, encode, EncodedBlob, Format};
pub use lex::lex;
pub use line::Line;
pub use list::detokenise;
pub use listing::{ProgramImage, PROGRAM_BASE};

pub type LineNumber = Option<u16>;

pub trait MaxValue<T> {
    fn max_value() -> T;
}

impl MaxValue<u16> for LineNumber {
    fn max_value() -> u16 {
        65529
    }
}
