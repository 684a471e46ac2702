//! Policy validation of claim sets
//!
//! A [`PayloadValidator`] is purely functional configuration: validating a
//! claim set never mutates the validator, so one instance may be shared
//! across any number of concurrent validations.

use aliri_clock::{Clock, UnixTime};
use indexmap::IndexMap;

use crate::claim::{names, Claim};
use crate::duration::DurationMins;
use crate::error::TokenInvalidError;

/// Controls which time-based rules apply during validation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationMode {
    /// Apply the expiry rule: the current time must not exceed `exp`
    Strict,

    /// Relax the expiry rule in favor of the refresh window: the current
    /// time must not exceed `iat` plus the configured refresh ttl
    Refresh,
}

/// A policy describing what a valid claim set looks like
///
/// The default policy requires the five lifecycle claims and allows a
/// refresh window of two weeks measured from `iat`.
#[derive(Clone, Debug)]
#[must_use]
pub struct PayloadValidator {
    required_claims: Vec<String>,
    refresh_ttl: DurationMins,
}

impl Default for PayloadValidator {
    fn default() -> Self {
        Self {
            required_claims: vec![
                names::ISS.to_owned(),
                names::IAT.to_owned(),
                names::EXP.to_owned(),
                names::NBF.to_owned(),
                names::JTI.to_owned(),
            ],
            refresh_ttl: DurationMins(20160),
        }
    }
}

impl PayloadValidator {
    /// Adds a claim name to the required set
    pub fn require_claim(self, name: impl Into<String>) -> Self {
        let mut this = self;
        this.required_claims.push(name.into());
        this
    }

    /// Removes a claim name from the required set
    ///
    /// Used by the factory for builds with no ttl, where the `exp` claim is
    /// intentionally absent.
    pub fn without_required_claim(self, name: &str) -> Self {
        let mut this = self;
        this.required_claims.retain(|c| c != name);
        this
    }

    /// Sets the refresh window, measured from a payload's `iat` claim
    pub fn with_refresh_ttl(self, refresh_ttl: DurationMins) -> Self {
        Self {
            refresh_ttl,
            ..self
        }
    }

    /// The configured refresh window
    #[must_use]
    pub fn refresh_ttl(&self) -> DurationMins {
        self.refresh_ttl
    }

    /// The claim names this policy requires
    #[must_use]
    pub fn required_claims(&self) -> &[String] {
        &self.required_claims
    }

    /// Whether this policy requires a claim by the given name
    #[must_use]
    pub fn requires_claim(&self, name: &str) -> bool {
        self.required_claims.iter().any(|c| c == name)
    }

    /// Validates a candidate claim set, short-circuiting on the first
    /// failure
    ///
    /// # Errors
    ///
    /// Returns an error if a required claim is absent, if the token is
    /// expired (past `exp` in [`Strict`][ValidationMode::Strict] mode, or
    /// past the refresh window in [`Refresh`][ValidationMode::Refresh]
    /// mode), or if the `nbf` claim lies in the future.
    pub fn validate<C: Clock>(
        &self,
        claims: &IndexMap<String, Claim>,
        mode: ValidationMode,
        clock: &C,
    ) -> Result<(), TokenInvalidError> {
        let now = clock.now();

        for required in &self.required_claims {
            if !claims.contains_key(required) {
                tracing::warn!(claim = required.as_str(), "required claim missing");
                return Err(TokenInvalidError::MissingClaim(required.clone()));
            }
        }

        match mode {
            ValidationMode::Strict => {
                if let Some(exp) = time_claim(claims, names::EXP) {
                    if now > exp {
                        return Err(TokenInvalidError::TokenExpired);
                    }
                }
            }
            ValidationMode::Refresh => {
                if let Some(iat) = time_claim(claims, names::IAT) {
                    if now > iat + self.refresh_ttl.into_secs() {
                        return Err(TokenInvalidError::TokenExpired);
                    }
                }
            }
        }

        if let Some(nbf) = time_claim(claims, names::NBF) {
            if now < nbf {
                return Err(TokenInvalidError::BeforeValid);
            }
        }

        Ok(())
    }
}

fn time_claim(claims: &IndexMap<String, Claim>, name: &str) -> Option<UnixTime> {
    claims.get(name).and_then(Claim::as_time)
}
