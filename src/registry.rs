//! Resolution of raw claim values into typed claims

use std::collections::HashMap;

use serde_json::Value;

use crate::claim::{names, Claim};
use crate::error::InvalidClaimError;

/// A constructor for an application-registered claim name
///
/// The constructor both types and validates the raw value, in the same way
/// as the built-in [`Claim`] constructors.
pub type ClaimConstructor = fn(Value) -> Result<Claim, InvalidClaimError>;

/// Maps claim names to the constructors that type and validate their raw
/// values
///
/// The five lifecycle claim names are a closed set dispatching to the
/// dedicated [`Claim`] constructors. Applications may register constructors
/// for additional names; any name with no constructor at all falls back to
/// the generic [`Claim::Custom`] passthrough, so application-defined claims
/// are always representable without pre-registration.
///
/// Resolution is pure construction with no side effects, so a registry may
/// be shared freely once configured.
#[derive(Clone, Debug, Default)]
pub struct ClaimRegistry {
    registered: HashMap<String, ClaimConstructor>,
}

impl ClaimRegistry {
    /// Constructs a registry knowing only the lifecycle claims
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor for an application-defined claim name
    ///
    /// Registered constructors take precedence over the generic passthrough,
    /// but never over the built-in lifecycle claim constructors.
    pub fn register(&mut self, name: impl Into<String>, constructor: ClaimConstructor) -> &mut Self {
        self.registered.insert(name.into(), constructor);
        self
    }

    /// Resolves a raw `(name, value)` pair into a typed claim
    ///
    /// # Errors
    ///
    /// Returns an error if the value fails the type or shape rule of the
    /// constructor selected for `name`.
    pub fn resolve(&self, name: &str, raw: Value) -> Result<Claim, InvalidClaimError> {
        match name {
            names::ISS => Claim::issuer(raw),
            names::IAT => Claim::issued_at(raw),
            names::EXP => Claim::expiry(raw),
            names::NBF => Claim::not_before(raw),
            names::JTI => Claim::token_id(raw),
            _ => match self.registered.get(name) {
                Some(constructor) => constructor(raw),
                None => Claim::custom(name, raw),
            },
        }
    }
}
