//! Typed claims and the strongly-typed values they carry
//!
//! A [`Claim`] is a single named fact embedded in a token payload. The
//! constructors on this type are the validation point for raw values:
//! a claim that constructs successfully is well-shaped, and a payload
//! only ever holds constructed claims.

use aliri_braid::braid;
use aliri_clock::UnixTime;
use serde_json::Value;

use crate::error::{self, InvalidClaimError};

/// The registered names of the lifecycle claims a factory generates by
/// default
pub mod names {
    /// Issuer (`iss`)
    pub const ISS: &str = "iss";

    /// Issued at (`iat`)
    pub const IAT: &str = "iat";

    /// Expiry (`exp`)
    pub const EXP: &str = "exp";

    /// Not before (`nbf`)
    pub const NBF: &str = "nbf";

    /// JWT ID (`jti`)
    pub const JTI: &str = "jti";
}

/// An issuer of tokens, conventionally the URL of the issuing endpoint
#[braid(serde, ref_doc = "A borrowed reference to an [`Issuer`]")]
pub struct Issuer;

/// A unique identifier for one issued token
#[braid(serde, ref_doc = "A borrowed reference to a [`JwtId`]")]
pub struct JwtId;

/// A single named, typed claim
///
/// The lifecycle claims each get a dedicated variant holding an
/// already-validated value; every other claim is carried through the
/// [`Custom`][Claim::Custom] variant as a raw JSON value.
#[derive(Clone, Debug, PartialEq)]
pub enum Claim {
    /// The `iss` claim
    Issuer(Issuer),

    /// The `iat` claim, as a Unix timestamp
    IssuedAt(UnixTime),

    /// The `exp` claim, as a Unix timestamp
    Expiry(UnixTime),

    /// The `nbf` claim, as a Unix timestamp
    NotBefore(UnixTime),

    /// The `jti` claim
    TokenId(JwtId),

    /// An application-defined claim
    Custom {
        /// The claim name
        name: String,

        /// The claim value
        value: Value,
    },
}

impl Claim {
    /// Constructs an `iss` claim from a raw value
    ///
    /// # Errors
    ///
    /// Returns an error unless the value is a non-empty string.
    pub fn issuer(raw: Value) -> Result<Self, InvalidClaimError> {
        non_empty_string(names::ISS, raw).map(|s| Claim::Issuer(Issuer::from(s)))
    }

    /// Constructs an `iat` claim from a raw value
    ///
    /// # Errors
    ///
    /// Returns an error unless the value is a non-negative integer.
    pub fn issued_at(raw: Value) -> Result<Self, InvalidClaimError> {
        timestamp(names::IAT, raw).map(Claim::IssuedAt)
    }

    /// Constructs an `exp` claim from a raw value
    ///
    /// # Errors
    ///
    /// Returns an error unless the value is a non-negative integer.
    pub fn expiry(raw: Value) -> Result<Self, InvalidClaimError> {
        timestamp(names::EXP, raw).map(Claim::Expiry)
    }

    /// Constructs an `nbf` claim from a raw value
    ///
    /// # Errors
    ///
    /// Returns an error unless the value is a non-negative integer.
    pub fn not_before(raw: Value) -> Result<Self, InvalidClaimError> {
        timestamp(names::NBF, raw).map(Claim::NotBefore)
    }

    /// Constructs a `jti` claim from a raw value
    ///
    /// # Errors
    ///
    /// Returns an error unless the value is a non-empty string.
    pub fn token_id(raw: Value) -> Result<Self, InvalidClaimError> {
        non_empty_string(names::JTI, raw).map(|s| Claim::TokenId(JwtId::from(s)))
    }

    /// Constructs an application-defined claim from a raw value
    ///
    /// # Errors
    ///
    /// Returns an error if the value is JSON `null`; any other JSON value
    /// is accepted as-is.
    pub fn custom(name: impl Into<String>, raw: Value) -> Result<Self, InvalidClaimError> {
        let name = name.into();
        if raw.is_null() {
            return Err(error::invalid_claim(name, "claim values may not be null"));
        }

        Ok(Claim::Custom { name, value: raw })
    }

    /// The registered name of this claim
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Claim::Issuer(_) => names::ISS,
            Claim::IssuedAt(_) => names::IAT,
            Claim::Expiry(_) => names::EXP,
            Claim::NotBefore(_) => names::NBF,
            Claim::TokenId(_) => names::JTI,
            Claim::Custom { name, .. } => name,
        }
    }

    /// The claim value as a JSON value
    #[must_use]
    pub fn value(&self) -> Value {
        match self {
            Claim::Issuer(iss) => Value::from(iss.as_str()),
            Claim::IssuedAt(t) | Claim::Expiry(t) | Claim::NotBefore(t) => Value::from(t.0),
            Claim::TokenId(jti) => Value::from(jti.as_str()),
            Claim::Custom { value, .. } => value.clone(),
        }
    }

    /// The claim value as a Unix timestamp, for the time-based claims
    #[must_use]
    pub fn as_time(&self) -> Option<UnixTime> {
        match self {
            Claim::IssuedAt(t) | Claim::Expiry(t) | Claim::NotBefore(t) => Some(*t),
            _ => None,
        }
    }
}

fn timestamp(name: &'static str, raw: Value) -> Result<UnixTime, InvalidClaimError> {
    raw.as_u64()
        .map(UnixTime)
        .ok_or_else(|| error::invalid_claim(name, "expected a non-negative integer timestamp"))
}

fn non_empty_string(name: &'static str, raw: Value) -> Result<String, InvalidClaimError> {
    match raw {
        Value::String(s) if !s.is_empty() => Ok(s),
        _ => Err(error::invalid_claim(name, "expected a non-empty string")),
    }
}
