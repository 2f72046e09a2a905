//! # BASIC
//!
//! Convert BASIC program files between plain text, tokenised and
//! protected form.
//!

fn main() {
    basic::term::main();
}
