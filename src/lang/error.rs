use thiserror::Error as ThisError;

/// ## Errors
///
/// Every failure in the crate is an `Error` holding an `ErrorCode`.
/// File table errors also carry the file number they happened on.

#[derive(Debug, Clone, PartialEq, ThisError)]
#[error("{code}{}", suffix(.handle, .message))]
pub struct Error {
    code: ErrorCode,
    handle: Option<u8>,
    message: String,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, #$handle:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_handle($handle)
    };
    ($err:ident, #$handle:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_handle($handle)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code,
            handle: None,
            message: String::new(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn handle(&self) -> Option<u8> {
        self.handle
    }

    pub fn in_handle(self, handle: u8) -> Error {
        debug_assert!(self.handle.is_none());
        Error {
            handle: Some(handle),
            ..self
        }
    }

    pub fn message<S: AsRef<str>>(self, message: S) -> Error {
        debug_assert!(self.message.is_empty());
        Error {
            message: message.as_ref().to_string(),
            ..self
        }
    }

    pub fn get_message(&self) -> &str {
        &self.message
    }
}

fn suffix(handle: &Option<u8>, message: &str) -> String {
    let mut s = String::new();
    if let Some(handle) = handle {
        s.push_str(&format!(" IN #{}", handle));
    }
    if !message.is_empty() {
        s.push_str(&format!("; {}", message));
    }
    s
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum ErrorCode {
    #[error("ILLEGAL FUNCTION CALL")]
    IllegalFunctionCall = 5,
    #[error("OVERFLOW")]
    Overflow = 6,
    #[error("OUT OF MEMORY")]
    OutOfMemory = 7,
    #[error("SUBSCRIPT OUT OF RANGE")]
    SubscriptOutOfRange = 9,
    #[error("REDIMENSIONED ARRAY")]
    RedimensionedArray = 10,
    #[error("TYPE MISMATCH")]
    TypeMismatch = 13,
    #[error("STRING TOO LONG")]
    StringTooLong = 15,
    #[error("INTERNAL ERROR")]
    InternalError = 51,
    #[error("BAD FILE NUMBER")]
    BadFileNumber = 52,
    #[error("FILE NOT FOUND")]
    FileNotFound = 53,
    #[error("BAD FILE MODE")]
    BadFileMode = 54,
    #[error("FILE ALREADY OPEN")]
    FileAlreadyOpen = 55,
    #[error("DEVICE I/O ERROR")]
    DeviceIoError = 57,
    #[error("INPUT PAST END")]
    InputPastEnd = 62,
    #[error("BAD FILE NAME")]
    BadFileName = 64,
    #[error("DIRECT STATEMENT IN FILE")]
    DirectStatementInFile = 66,
    #[error("UNKNOWN FILE MARKER")]
    UnknownMarker = 200,
    #[error("CORRUPT TOKENISED PROGRAM")]
    CorruptTokenised = 201,
    #[error("CORRUPT PROTECTED PROGRAM")]
    CorruptProtected = 202,
    #[error("NO SUCH SNAPSHOT")]
    NoSuchSnapshot = 203,
    #[error("CORRUPT SNAPSHOT")]
    CorruptSnapshot = 204,
    #[error("FILE REOPEN FAILED")]
    FileReopenFailed = 205,
}

impl ErrorCode {
    /// The number ERR would report. Engine conditions without a
    /// GW-BASIC counterpart report above 200.
    pub fn number(self) -> u16 {
        self as u16
    }
}

/// Map an operating system failure onto the closest BASIC error.
pub fn io_error(error: &std::io::Error) -> Error {
    use std::io::ErrorKind;
    let msg = error.to_string();
    match error.kind() {
        ErrorKind::NotFound => Error::new(ErrorCode::FileNotFound).message(msg),
        ErrorKind::InvalidInput => Error::new(ErrorCode::BadFileName).message(msg),
        _ => Error::new(ErrorCode::DeviceIoError).message(msg),
    }
}
