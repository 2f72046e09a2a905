use super::Val;
use crate::error;
use crate::lang::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// ## Variable memory
///
/// Names are upper case and carry their type sigil; a name without one is
/// single precision. Array elements live beside the scalars under a key
/// built from the subscripts.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Var {
    vars: BTreeMap<String, Val>,
    #[serde(default)]
    dims: BTreeMap<String, Vec<i16>>,
}

impl Var {
    pub fn new() -> Var {
        Var::default()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
        self.dims.clear();
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Val)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn fetch(&self, var_name: &str) -> Val {
        let var_name = var_name.to_ascii_uppercase();
        match self.vars.get(&var_name) {
            Some(val) => val.clone(),
            None => {
                if var_name.ends_with('$') {
                    Val::String("".into())
                } else if var_name.ends_with('#') {
                    Val::Double(0.0)
                } else if var_name.ends_with('%') {
                    Val::Integer(0)
                } else {
                    Val::Single(0.0)
                }
            }
        }
    }

    pub fn store(&mut self, var_name: &str, value: Val) -> Result<()> {
        let var_name = var_name.to_ascii_uppercase();
        if self.vars.len() > u16::max_value() as usize {
            return Err(error!(OutOfMemory));
        }
        let value = if var_name.ends_with('$') {
            match value {
                Val::String(s) => {
                    if s.chars().count() > 255 {
                        return Err(error!(StringTooLong; "MAXIMUM STRING LENGTH IS 255"));
                    }
                    Val::String(s)
                }
                _ => return Err(error!(TypeMismatch)),
            }
        } else if var_name.ends_with('#') {
            Val::Double(f64::try_from(value)?)
        } else if var_name.ends_with('%') {
            Val::Integer(i16::try_from(value)?)
        } else {
            Val::Single(f32::try_from(value)?)
        };
        self.vars.insert(var_name, value);
        Ok(())
    }

    pub fn dimension_array(&mut self, var_name: &str, dims: &[i16]) -> Result<()> {
        let var_name = var_name.to_ascii_uppercase();
        if self.dims.contains_key(&var_name) {
            return Err(error!(RedimensionedArray));
        }
        if dims.iter().any(|d| *d < 0) {
            return Err(error!(IllegalFunctionCall));
        }
        self.dims.insert(var_name, dims.to_vec());
        Ok(())
    }

    pub fn store_array(&mut self, var_name: &str, subscripts: &[i16], value: Val) -> Result<()> {
        let key = self.build_array_key(var_name, subscripts)?;
        self.store(&key, value)
    }

    pub fn fetch_array(&mut self, var_name: &str, subscripts: &[i16]) -> Result<Val> {
        let key = self.build_array_key(var_name, subscripts)?;
        Ok(self.fetch(&key))
    }

    fn build_array_key(&mut self, var_name: &str, requested: &[i16]) -> Result<String> {
        let var_name = var_name.to_ascii_uppercase();
        let dimensioned = self
            .dims
            .entry(var_name.clone())
            .or_insert_with(|| vec![10; requested.len()]);
        if dimensioned.len() != requested.len() {
            return Err(error!(SubscriptOutOfRange));
        }
        for (r, d) in requested.iter().zip(dimensioned.iter()) {
            if *r < 0 || r > d {
                return Err(error!(SubscriptOutOfRange));
            }
        }
        let mut s: String = requested.iter().map(|r| format!(",{}", r)).collect();
        s.push_str(&format!(",{}", var_name));
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    #[test]
    fn test_defaults_by_sigil() {
        let var = Var::new();
        assert_eq!(var.fetch("a$"), Val::String("".into()));
        assert_eq!(var.fetch("a%"), Val::Integer(0));
        assert_eq!(var.fetch("a#"), Val::Double(0.0));
        assert_eq!(var.fetch("a"), Val::Single(0.0));
    }

    #[test]
    fn test_store_converts() {
        let mut var = Var::new();
        var.store("a%", Val::Single(2.6)).unwrap();
        assert_eq!(var.fetch("A%"), Val::Integer(3));
        var.store("b", Val::Integer(2)).unwrap();
        assert_eq!(var.fetch("B"), Val::Single(2.0));
        let error = var.store("c$", Val::Integer(1)).unwrap_err();
        assert_eq!(error.code(), ErrorCode::TypeMismatch);
        let error = var.store("c$", Val::String("x".repeat(256))).unwrap_err();
        assert_eq!(error.code(), ErrorCode::StringTooLong);
    }

    #[test]
    fn test_arrays() {
        let mut var = Var::new();
        var.store_array("x", &[3], Val::Single(1.5)).unwrap();
        assert_eq!(var.fetch_array("X", &[3]).unwrap(), Val::Single(1.5));
        let error = var.fetch_array("x", &[11]).unwrap_err();
        assert_eq!(error.code(), ErrorCode::SubscriptOutOfRange);
        let error = var.dimension_array("x", &[20]).unwrap_err();
        assert_eq!(error.code(), ErrorCode::RedimensionedArray);
        var.dimension_array("y$", &[2, 2]).unwrap();
        let error = var.store_array("y$", &[1], Val::String("a".into())).unwrap_err();
        assert_eq!(error.code(), ErrorCode::SubscriptOutOfRange);
    }

    #[test]
    fn test_non_finite_values_overflow() {
        let mut var = Var::new();
        for name in &["a#", "a!", "a"] {
            let error = var.store(name, Val::Double(f64::INFINITY)).unwrap_err();
            assert_eq!(error.code(), ErrorCode::Overflow);
            let error = var.store(name, Val::Single(f32::NAN)).unwrap_err();
            assert_eq!(error.code(), ErrorCode::Overflow);
        }
        let error = var.store_array("z#", &[1], Val::Double(f64::NAN)).unwrap_err();
        assert_eq!(error.code(), ErrorCode::Overflow);
        assert!(var.is_empty());
    }
}
