//! Assembly of claim payloads
//!
//! The [`Factory`] is the only ordinary way to obtain a
//! [`Payload`]: it generates the default lifecycle claims, merges staged
//! custom claims over them, resolves every pair through the
//! [`ClaimRegistry`], and hands the result to the validator.
//!
//! A factory is stateful per instance (ttl, default-claim list, staged
//! claims) and is meant to be owned by one logical caller at a time; it
//! takes `&mut self` throughout and must not be shared across concurrent
//! builds without external synchronization.

use aliri_clock::{Clock, System};
use indexmap::IndexMap;
use serde_json::Value;

use crate::claim::{names, Issuer};
use crate::duration::DurationMins;
use crate::error::TokenBuildError;
use crate::jti::{JtiSource, RandomJti};
use crate::payload::Payload;
use crate::registry::ClaimRegistry;
use crate::validator::{PayloadValidator, ValidationMode};

/// The capability the request layer provides: the URL under which tokens
/// are being issued, used for the `iss` default claim
pub trait IssuerSource {
    /// The current issuer URL
    fn current_url(&self) -> Issuer;
}

impl IssuerSource for Issuer {
    #[inline]
    fn current_url(&self) -> Issuer {
        self.clone()
    }
}

impl<F> IssuerSource for F
where
    F: Fn() -> Issuer,
{
    #[inline]
    fn current_url(&self) -> Issuer {
        self()
    }
}

/// Builds validated payloads from default and staged claims
///
/// A factory is reusable: each [`make`][Factory::make] call produces an
/// independent payload and clears the staged custom claims for the next
/// build.
#[derive(Debug)]
pub struct Factory<I, C = System, J = RandomJti> {
    registry: ClaimRegistry,
    validator: PayloadValidator,
    issuer_source: I,
    clock: C,
    jti_source: J,
    ttl: Option<DurationMins>,
    default_claims: Vec<String>,
    staged: IndexMap<String, Value>,
}

/// The default ttl of one hour
const DEFAULT_TTL: DurationMins = DurationMins(60);

impl<I: IssuerSource> Factory<I> {
    /// Constructs a factory using the system clock and a random `jti`
    /// source
    pub fn new(issuer_source: I, validator: PayloadValidator) -> Self {
        Self::with_parts(issuer_source, validator, System, RandomJti::new())
    }
}

impl<I, C, J> Factory<I, C, J>
where
    I: IssuerSource,
    C: Clock,
    J: JtiSource,
{
    /// Constructs a factory with an explicit clock and `jti` source
    pub fn with_parts(issuer_source: I, validator: PayloadValidator, clock: C, jti_source: J) -> Self {
        Self {
            registry: ClaimRegistry::new(),
            validator,
            issuer_source,
            clock,
            jti_source,
            ttl: Some(DEFAULT_TTL),
            default_claims: vec![
                names::ISS.to_owned(),
                names::IAT.to_owned(),
                names::EXP.to_owned(),
                names::NBF.to_owned(),
                names::JTI.to_owned(),
            ],
            staged: IndexMap::new(),
        }
    }

    /// Sets the token ttl; `None` disables the `exp` default claim for all
    /// subsequent builds from this factory
    pub fn set_ttl(&mut self, ttl: Option<DurationMins>) -> &mut Self {
        self.ttl = ttl;
        self
    }

    /// The configured token ttl
    #[must_use]
    pub fn ttl(&self) -> Option<DurationMins> {
        self.ttl
    }

    /// Replaces the default-claim name list wholesale
    pub fn set_default_claims<T, N>(&mut self, claims: T) -> &mut Self
    where
        T: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.default_claims = claims.into_iter().map(Into::into).collect();
        self
    }

    /// The default-claim names generated on each build
    #[must_use]
    pub fn default_claims(&self) -> &[String] {
        &self.default_claims
    }

    /// The claim registry, for registering application-defined claim
    /// constructors
    pub fn registry_mut(&mut self) -> &mut ClaimRegistry {
        &mut self.registry
    }

    /// The validator payloads from this factory are checked against
    #[must_use]
    pub fn validator(&self) -> &PayloadValidator {
        &self.validator
    }

    /// Stages one claim for the next build, overriding any default of the
    /// same name
    pub fn add_claim(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.staged.insert(name.into(), value.into());
        self
    }

    /// Stages many claims; equivalent to repeated [`add_claim`][Factory::add_claim]
    pub fn add_claims<T, N, V>(&mut self, claims: T) -> &mut Self
    where
        T: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in claims {
            self.add_claim(name, value);
        }
        self
    }

    /// Builds and validates a payload from the current defaults plus the
    /// staged claims
    ///
    /// The staged custom claims are cleared whether or not the build
    /// succeeds, so each call produces an independent payload.
    ///
    /// # Errors
    ///
    /// Returns an error if any claim value fails its type or shape rule,
    /// or if the assembled claim set is rejected by the validator. The
    /// whole build aborts on the first failure.
    pub fn make(&mut self) -> Result<Payload, TokenBuildError> {
        let staged = std::mem::take(&mut self.staged);

        // one clock read per build, shared by iat, exp, and nbf
        let now = self.clock.now();

        let mut raw: IndexMap<String, Value> = IndexMap::with_capacity(
            self.default_claims.len() + staged.len(),
        );

        for name in &self.default_claims {
            let value = match name.as_str() {
                names::ISS => Value::from(self.issuer_source.current_url().as_str()),
                names::IAT | names::NBF => Value::from(now.0),
                names::EXP => match self.ttl {
                    Some(ttl) => Value::from((now + ttl.into_secs()).0),
                    None => continue,
                },
                names::JTI => Value::from(self.jti_source.generate(&raw).as_str()),
                _ => {
                    // only generatable from a staged value
                    tracing::trace!(claim = name.as_str(), "no generator for default claim");
                    continue;
                }
            };
            raw.insert(name.clone(), value);
        }

        for (name, value) in staged {
            raw.insert(name, value);
        }

        let mut claims = IndexMap::with_capacity(raw.len());
        for (name, value) in raw {
            let claim = self.registry.resolve(&name, value)?;
            claims.insert(name, claim);
        }

        let validator = if self.ttl.is_none() {
            self.validator.clone().without_required_claim(names::EXP)
        } else {
            self.validator.clone()
        };

        tracing::debug!(claims = claims.len(), "assembled claim payload");

        Ok(Payload::new(
            claims,
            validator,
            ValidationMode::Strict,
            &self.clock,
        )?)
    }
}
