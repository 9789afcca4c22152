//! # Domain Value Objects
//!
//! Immutable value types shared by the dispatcher and every built-in contract.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// ADDRESS
// =============================================================================

/// Account or contract address in its canonical string form.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create an address from its string form.
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Borrow the string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for a `0x` prefixed, 40 hex digit address.
    #[must_use]
    pub fn is_well_formed(addr: &str) -> bool {
        addr.strip_prefix("0x")
            .map(|body| body.len() == 40 && hex::decode(body).is_ok())
            .unwrap_or(false)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for Address {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Address {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// =============================================================================
// TRANSACTION HASH
// =============================================================================

/// 32-byte transaction hash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    /// All-zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Hex form with `0x` prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// =============================================================================
// INVOCATION ARGUMENTS
// =============================================================================

/// Wire type tag of an invocation argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArgType {
    /// Signed 32-bit integer, decimal text.
    I32,
    /// Signed 64-bit integer, decimal text.
    I64,
    /// Unsigned 64-bit integer, decimal text.
    U64,
    /// 64-bit float, decimal text.
    F64,
    /// UTF-8 string.
    String,
    /// Raw bytes.
    Bytes,
    /// `true` / `false`.
    Bool,
}

impl ArgType {
    /// Human name used in decode errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::I32 => "I32",
            Self::I64 => "I64",
            Self::U64 => "U64",
            Self::F64 => "F64",
            Self::String => "String",
            Self::Bytes => "Bytes",
            Self::Bool => "Bool",
        }
    }
}

/// One encoded argument of an invocation payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arg {
    /// Wire type.
    #[serde(rename = "type")]
    pub typ: ArgType,
    /// Encoded value.
    pub value: Vec<u8>,
}

impl Arg {
    /// String argument.
    pub fn string(s: impl Into<String>) -> Self {
        Self {
            typ: ArgType::String,
            value: s.into().into_bytes(),
        }
    }

    /// Bytes argument.
    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Self {
            typ: ArgType::Bytes,
            value: b.into(),
        }
    }

    /// Unsigned 64-bit argument.
    #[must_use]
    pub fn u64(n: u64) -> Self {
        Self {
            typ: ArgType::U64,
            value: n.to_string().into_bytes(),
        }
    }

    /// Signed 32-bit argument.
    #[must_use]
    pub fn i32(n: i32) -> Self {
        Self {
            typ: ArgType::I32,
            value: n.to_string().into_bytes(),
        }
    }

    /// Signed 64-bit argument.
    #[must_use]
    pub fn i64(n: i64) -> Self {
        Self {
            typ: ArgType::I64,
            value: n.to_string().into_bytes(),
        }
    }

    /// Float argument.
    #[must_use]
    pub fn f64(n: f64) -> Self {
        Self {
            typ: ArgType::F64,
            value: n.to_string().into_bytes(),
        }
    }

    /// Boolean argument.
    #[must_use]
    pub fn bool(b: bool) -> Self {
        Self {
            typ: ArgType::Bool,
            value: b.to_string().into_bytes(),
        }
    }
}
