//! # BASIC sessions
//!
//! Program storage and session continuity for a GW-BASIC style
//! interpreter.
//!
//! Programs are kept in three interchangeable file formats: plain text,
//! tokenised and protected. The [`lang`] module converts between them.
//! ```
//! use basic::lang::{convert, EncodedBlob, Format};
//! let text = EncodedBlob::from_bytes(b"10 PRINT 1\r\n\x1a".to_vec()).unwrap();
//! let tokenised = convert(&text, Format::Tokenised).unwrap();
//! assert_eq!(
//!     tokenised.as_bytes(),
//!     b"\xff\x76\x12\x0a\x00\x91\x20\x12\x00\x00\x00\x1a"
//! );
//! ```
//!
//! A running session, with its variables, open files, sound queue and
//! pending keystrokes, lives in [`mach::Session`]. It can be checkpointed
//! to a file and resumed later, in the same process or another one.
//! ```no_run
//! use basic::mach::Session;
//! let session = Session::default();
//! session.checkpoint("SESSION.BSS").unwrap();
//! let resumed = Session::restore("SESSION.BSS").unwrap();
//! assert!(resumed.failures.is_empty());
//! ```

pub mod config;
pub mod lang;
pub mod mach;
pub mod term;
