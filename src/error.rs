//! Common errors

use thiserror::Error;

/// A claim's raw value does not satisfy the type or shape rule for its name
///
/// This error is always fatal to the build that produced it; no partial
/// payload is ever returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid value for claim '{name}': {reason}")]
pub struct InvalidClaimError {
    name: String,
    reason: &'static str,
}

impl InvalidClaimError {
    /// The name of the rejected claim
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Why the value was rejected
    #[must_use]
    pub fn reason(&self) -> &str {
        self.reason
    }
}

#[inline]
pub(crate) fn invalid_claim(name: impl Into<String>, reason: &'static str) -> InvalidClaimError {
    InvalidClaimError {
        name: name.into(),
        reason,
    }
}

/// A claim name was looked up in a payload that does not contain it
///
/// This is a caller error, not a token-integrity failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("claim '{name}' not found in payload")]
pub struct ClaimNotFoundError {
    name: String,
}

impl ClaimNotFoundError {
    /// The name that was looked up
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[inline]
pub(crate) fn claim_not_found(name: impl Into<String>) -> ClaimNotFoundError {
    ClaimNotFoundError { name: name.into() }
}

/// A claim set was rejected by the payload validator
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TokenInvalidError {
    /// A required claim is absent from the claim set
    #[error("required claim '{0}' is missing")]
    MissingClaim(String),

    /// The token is expired according to the `exp` claim, or the refresh
    /// window measured from `iat` has elapsed
    #[error("token has expired")]
    TokenExpired,

    /// The token is not yet valid according to the `nbf` claim
    #[error("token is not yet valid")]
    BeforeValid,
}

/// An error occurring while building a payload
#[derive(Debug, Error)]
pub enum TokenBuildError {
    /// A staged claim failed its type or shape rule
    #[error(transparent)]
    InvalidClaim(#[from] InvalidClaimError),

    /// The assembled claim set was rejected by the validator
    #[error("payload rejected by validator")]
    Invalid(#[from] TokenInvalidError),
}
