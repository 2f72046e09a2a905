#![allow(dead_code)]

use basic::lang::{Error, ErrorCode};
use basic::mach::{Clock, FileMode, Host, Session, Val};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_600_000_000, 0).unwrap()
}

/// A clock that only moves when told to, or by `step` on every idle.
/// With `break_at` set, the user breaks in on that poll.
pub struct ManualHost {
    pub now: DateTime<Utc>,
    pub step: Duration,
    pub idles: usize,
    pub polls: usize,
    pub break_at: Option<usize>,
}

impl ManualHost {
    pub fn new() -> ManualHost {
        ManualHost {
            now: t0(),
            step: Duration::milliseconds(10),
            idles: 0,
            polls: 0,
            break_at: None,
        }
    }

    pub fn advance(&mut self, by: Duration) {
        self.now = self.now + by;
    }
}

impl Clock for ManualHost {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

impl Host for ManualHost {
    fn idle(&mut self) {
        self.idles += 1;
        self.now = self.now + self.step;
    }

    fn check_events(&mut self) -> bool {
        self.polls += 1;
        self.break_at == Some(self.polls)
    }
}

/// Run every complete line waiting in the key buffer, the way the
/// interpreter would in direct mode. Returns the errors printed.
pub fn exec(session: &mut Session) -> Vec<String> {
    let mut errors = vec![];
    while let Some(line) = session.keys_mut().next_line() {
        if let Err(error) = statement(session, line.trim()) {
            errors.push(error.to_string());
        }
    }
    errors
}

/// Enough of BASIC to drive files and variables:
/// `OPEN "O",#1,"FILE"`, `PRINT #1,A`, `CLOSE [#1]` and `A=1`.
pub fn statement(session: &mut Session, line: &str) -> Result<(), Error> {
    let upper = line.to_ascii_uppercase();
    if upper.starts_with("OPEN") {
        let quoted: Vec<&str> = line.split('"').collect();
        let (mode, number, path) = match quoted.as_slice() {
            [_, mode, number, path, ..] => (mode.to_ascii_uppercase(), *number, *path),
            _ => return Err(syntax()),
        };
        let number = file_number(number.trim_matches(|c: char| c == ','))?;
        let mode = match mode.as_str() {
            "I" => FileMode::Input,
            "O" => FileMode::Output,
            "A" => FileMode::Append,
            "R" => FileMode::Random,
            _ => return Err(Error::new(ErrorCode::BadFileMode)),
        };
        session.files_mut().open(number, path, mode, None)
    } else if upper.starts_with("PRINT") {
        let rest = upper["PRINT".len()..].trim();
        let mut parts = rest.splitn(2, ',');
        let number = file_number(parts.next().unwrap_or(""))?;
        let value = match parts.next() {
            Some(expr) => value(session, expr.trim())?,
            None => return Err(syntax()),
        };
        let text = format!("{}\r\n", print_using(&value));
        session.files_mut().write(number, text.as_bytes())
    } else if upper.starts_with("CLOSE") {
        let rest = upper["CLOSE".len()..].trim();
        if rest.is_empty() {
            session.files_mut().close_all()
        } else {
            let number = file_number(rest)?;
            session.files_mut().close(number)
        }
    } else if let Some(eq) = upper.find('=') {
        let value = value(session, upper[eq + 1..].trim())?;
        session.var_mut().store(upper[..eq].trim(), value)
    } else {
        Err(syntax())
    }
}

fn syntax() -> Error {
    Error::new(ErrorCode::IllegalFunctionCall).message("SYNTAX")
}

fn file_number(s: &str) -> Result<u8, Error> {
    s.trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| Error::new(ErrorCode::BadFileNumber))
}

fn value(session: &Session, expr: &str) -> Result<Val, Error> {
    if let Some(s) = expr.strip_prefix('"') {
        return Ok(Val::String(s.trim_end_matches('"').to_string()));
    }
    match expr.parse::<f32>() {
        Ok(n) => Ok(Val::Single(n)),
        Err(_) if expr.chars().all(|c| c.is_ascii_alphanumeric() || "$%!#".contains(c)) => {
            Ok(session.var().fetch(expr))
        }
        Err(_) => Err(syntax()),
    }
}

/// Numbers print with a sign position and a trailing space.
pub fn print_using(value: &Val) -> String {
    let n = match value {
        Val::String(s) => return s.clone(),
        Val::Integer(n) => *n as f64,
        Val::Single(n) => *n as f64,
        Val::Double(n) => *n,
    };
    if n < 0.0 {
        format!("{} ", value)
    } else {
        format!(" {} ", value)
    }
}
