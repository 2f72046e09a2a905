use crate::error;
use crate::lang::Error;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// ## Variable values

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Val {
    String(String),
    Integer(i16),
    Single(f32),
    Double(f64),
}

impl std::fmt::Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Val::*;
        match self {
            String(s) => write!(f, "{}", s),
            Integer(n) => write!(f, "{}", n),
            Single(n) => write!(f, "{}", n),
            Double(n) => write!(f, "{}", n),
        }
    }
}

impl TryFrom<Val> for i16 {
    type Error = Error;
    fn try_from(val: Val) -> Result<Self, Self::Error> {
        let n = match val {
            Val::Integer(n) => return Ok(n),
            Val::Single(n) => n as f64,
            Val::Double(n) => n,
            Val::String(_) => return Err(error!(TypeMismatch)),
        };
        let n = n.round();
        if n < i16::min_value() as f64 || n > i16::max_value() as f64 || n.is_nan() {
            Err(error!(Overflow))
        } else {
            Ok(n as i16)
        }
    }
}

impl TryFrom<Val> for f32 {
    type Error = Error;
    fn try_from(val: Val) -> Result<Self, Self::Error> {
        let n = match val {
            Val::Integer(n) => return Ok(n as f32),
            Val::Single(n) => n,
            Val::Double(n) if n.is_finite() && n.abs() <= f32::MAX as f64 => n as f32,
            Val::Double(_) => return Err(error!(Overflow)),
            Val::String(_) => return Err(error!(TypeMismatch)),
        };
        if n.is_finite() {
            Ok(n)
        } else {
            Err(error!(Overflow))
        }
    }
}

impl TryFrom<Val> for f64 {
    type Error = Error;
    fn try_from(val: Val) -> Result<Self, Self::Error> {
        let n = match val {
            Val::Integer(n) => return Ok(n as f64),
            Val::Single(n) => n as f64,
            Val::Double(n) => n,
            Val::String(_) => return Err(error!(TypeMismatch)),
        };
        if n.is_finite() {
            Ok(n)
        } else {
            Err(error!(Overflow))
        }
    }
}
