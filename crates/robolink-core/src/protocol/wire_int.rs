// ============================================
// File: crates/robolink-core/src/protocol/wire_int.rs
// ============================================
//! # Arbitrary-Size JSON Integers
//!
//! ## Creation Reason
//! Curve coordinates and signature scalars are 256-bit values sent as
//! bare JSON numbers. `serde_json` numbers stop at 128 bits, so `WireInt`
//! reads and writes the raw number text itself.
//!
//! ## Accepted Encodings
//! ```text
//! 1234                     bare decimal number (canonical, always emitted)
//! "1234"                   decimal string
//! "0x4d2" / "0X4D2"        hex string
//! ```
//! Negative numbers, fractions and exponents are rejected.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Deserialization goes through `serde_json::value::RawValue`, which only
//!   works with serde_json's own deserializers. Do not put `WireInt` behind
//!   `#[serde(flatten)]` or `#[serde(untagged)]`: both buffer the input
//!   and lose the raw text
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use robolink_common::error::CommonError;

// ============================================
// WireInt
// ============================================

/// Non-negative integer of any size, carried as a JSON number.
///
/// # Example
/// ```
/// use robolink_core::protocol::WireInt;
///
/// let big: WireInt = serde_json::from_str("115792089210356248762697446949407573529996955224135760342422259061068512044369").unwrap();
/// assert_eq!(serde_json::to_string(&big).unwrap().len(), 78);
///
/// let hex: WireInt = serde_json::from_str("\"0xff\"").unwrap();
/// assert_eq!(hex, WireInt::from(255u64));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireInt(pub BigUint);

impl WireInt {
    /// Returns the wrapped value.
    #[must_use]
    pub const fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Consumes the wrapper.
    #[must_use]
    pub fn into_inner(self) -> BigUint {
        self.0
    }

    /// Formats as lowercase `0x`-prefixed hex.
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        format!("{:#x}", self.0)
    }
}

impl From<BigUint> for WireInt {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl From<&BigUint> for WireInt {
    fn from(value: &BigUint) -> Self {
        Self(value.clone())
    }
}

impl From<u64> for WireInt {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<WireInt> for BigUint {
    fn from(value: WireInt) -> Self {
        value.0
    }
}

impl fmt::Display for WireInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WireInt {
    type Err = CommonError;

    /// Parses decimal digits or a `0x`-prefixed hex string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_text(s.trim()).map(Self)
    }
}

fn parse_text(text: &str) -> Result<BigUint, CommonError> {
    let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(rest) => (rest, 16),
        None => (text, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(CommonError::invalid_input(
            "integer",
            format!("'{text}' is not a non-negative decimal or 0x-hex integer"),
        ));
    }
    BigUint::parse_bytes(digits.as_bytes(), radix).ok_or_else(|| {
        CommonError::invalid_input("integer", format!("'{text}' could not be parsed"))
    })
}

fn parse_raw(raw: &str) -> Result<BigUint, CommonError> {
    let raw = raw.trim();
    if raw.starts_with('"') {
        let text: String = serde_json::from_str(raw)
            .map_err(|e| CommonError::decoding("integer string", e.to_string()))?;
        return parse_text(text.trim());
    }
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CommonError::invalid_input(
            "integer",
            format!("expected a non-negative integer, got {raw}"),
        ));
    }
    parse_text(raw)
}

// ============================================
// Serde
// ============================================

impl Serialize for WireInt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if let Some(small) = self.0.to_u128() {
            return serializer.serialize_u128(small);
        }
        let raw = RawValue::from_string(self.0.to_str_radix(10)).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WireInt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        parse_raw(raw.get()).map(Self).map_err(D::Error::custom)
    }
}

// ============================================
// Tests
// ============================================
