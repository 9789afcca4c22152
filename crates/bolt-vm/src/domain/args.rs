//! # Argument Decoding
//!
//! Decodes wire arguments into typed values before a contract operation runs.
//! This is the only place where a method's declared signature meets untyped
//! input, so every mismatch surfaces here as a [`VmError`].

use super::value_objects::{Arg, ArgType};
use crate::errors::VmError;

/// A decoded argument.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    /// Signed 32-bit integer.
    I32(i32),
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit float.
    F64(f64),
    /// UTF-8 string.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Boolean.
    Bool(bool),
}

impl ArgValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::I32(_) => "I32",
            Self::I64(_) => "I64",
            Self::U64(_) => "U64",
            Self::F64(_) => "F64",
            Self::Str(_) => "String",
            Self::Bytes(_) => "Bytes",
            Self::Bool(_) => "Bool",
        }
    }
}

/// Decoded argument list of one invocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    values: Vec<ArgValue>,
}

impl Args {
    /// Decode every wire argument.
    pub fn decode(args: &[Arg]) -> Result<Self, VmError> {
        let values = args
            .iter()
            .enumerate()
            .map(|(index, arg)| decode_one(index, arg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { values })
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no arguments were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fails unless exactly `expected` arguments were supplied.
    pub fn expect_len(&self, method: &str, expected: usize) -> Result<(), VmError> {
        if self.values.len() != expected {
            return Err(VmError::ArgumentCount {
                method: method.to_string(),
                expected,
                got: self.values.len(),
            });
        }
        Ok(())
    }

    /// String argument at `index`.
    pub fn string(&self, index: usize) -> Result<String, VmError> {
        match self.at(index, "String")? {
            ArgValue::Str(s) => Ok(s.clone()),
            other => Err(mismatch(index, "String", other)),
        }
    }

    /// Bytes argument at `index`. A string argument is accepted as its UTF-8 bytes.
    pub fn bytes(&self, index: usize) -> Result<Vec<u8>, VmError> {
        match self.at(index, "Bytes")? {
            ArgValue::Bytes(b) => Ok(b.clone()),
            ArgValue::Str(s) => Ok(s.clone().into_bytes()),
            other => Err(mismatch(index, "Bytes", other)),
        }
    }

    /// Unsigned 64-bit argument at `index`.
    pub fn u64(&self, index: usize) -> Result<u64, VmError> {
        match self.at(index, "U64")? {
            ArgValue::U64(n) => Ok(*n),
            other => Err(mismatch(index, "U64", other)),
        }
    }

    /// Signed 32-bit argument at `index`.
    pub fn i32(&self, index: usize) -> Result<i32, VmError> {
        match self.at(index, "I32")? {
            ArgValue::I32(n) => Ok(*n),
            other => Err(mismatch(index, "I32", other)),
        }
    }

    /// Signed 64-bit argument at `index`.
    pub fn i64(&self, index: usize) -> Result<i64, VmError> {
        match self.at(index, "I64")? {
            ArgValue::I64(n) => Ok(*n),
            ArgValue::I32(n) => Ok(i64::from(*n)),
            other => Err(mismatch(index, "I64", other)),
        }
    }

    /// Float argument at `index`. Integer arguments widen.
    #[allow(clippy::cast_precision_loss)]
    pub fn f64(&self, index: usize) -> Result<f64, VmError> {
        match self.at(index, "F64")? {
            ArgValue::F64(n) => Ok(*n),
            ArgValue::I32(n) => Ok(f64::from(*n)),
            ArgValue::I64(n) => Ok(*n as f64),
            ArgValue::U64(n) => Ok(*n as f64),
            other => Err(mismatch(index, "F64", other)),
        }
    }

    /// Boolean argument at `index`.
    pub fn bool(&self, index: usize) -> Result<bool, VmError> {
        match self.at(index, "Bool")? {
            ArgValue::Bool(b) => Ok(*b),
            other => Err(mismatch(index, "Bool", other)),
        }
    }

    fn at(&self, index: usize, expected: &'static str) -> Result<&ArgValue, VmError> {
        self.values.get(index).ok_or(VmError::ArgumentDecode {
            index,
            expected,
            reason: "missing".to_string(),
        })
    }
}

fn mismatch(index: usize, expected: &'static str, found: &ArgValue) -> VmError {
    VmError::ArgumentDecode {
        index,
        expected,
        reason: format!("found {}", found.type_name()),
    }
}

fn decode_one(index: usize, arg: &Arg) -> Result<ArgValue, VmError> {
    let err = |reason: String| VmError::ArgumentDecode {
        index,
        expected: arg.typ.name(),
        reason,
    };

    if arg.typ == ArgType::Bytes {
        return Ok(ArgValue::Bytes(arg.value.clone()));
    }

    let text = std::str::from_utf8(&arg.value).map_err(|e| err(e.to_string()))?;
    match arg.typ {
        ArgType::I32 => text.parse().map(ArgValue::I32).map_err(|e| err(e.to_string())),
        ArgType::I64 => text.parse().map(ArgValue::I64).map_err(|e| err(e.to_string())),
        ArgType::U64 => text.parse().map(ArgValue::U64).map_err(|e| err(e.to_string())),
        ArgType::F64 => text.parse().map(ArgValue::F64).map_err(|e| err(e.to_string())),
        ArgType::Bool => text.parse().map(ArgValue::Bool).map_err(|e| err(e.to_string())),
        ArgType::String => Ok(ArgValue::Str(text.to_string())),
        ArgType::Bytes => Ok(ArgValue::Bytes(arg.value.clone())),
    }
}
