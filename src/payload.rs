//! The validated claim set of a token
//!
//! A [`Payload`] can only be produced by [`Factory::make`][crate::factory::Factory::make]
//! or [`Payload::refresh`], both of which validate the claim set eagerly.
//! A payload that exists is therefore a payload that has passed its policy,
//! and it is immutable and safe for unrestricted concurrent reads from then
//! on.

use aliri_clock::Clock;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::claim::{names, Claim};
use crate::duration::DurationMins;
use crate::error::{self, ClaimNotFoundError, TokenInvalidError};
use crate::jti::JtiSource;
use crate::validator::{PayloadValidator, ValidationMode};

/// An immutable, validated, ordered collection of claims
///
/// Serializes as a JSON object of claim name to claim value, which is the
/// form an external signer consumes.
#[derive(Clone, Debug)]
#[must_use]
pub struct Payload {
    claims: IndexMap<String, Claim>,
    validator: PayloadValidator,
    mode: ValidationMode,
}

impl Payload {
    /// Constructs a payload from a resolved claim set, validating it
    /// immediately
    ///
    /// `mode` is [`Strict`][ValidationMode::Strict] for ordinary builds;
    /// the [`Refresh`][ValidationMode::Refresh] relaxation exists for
    /// payloads produced by [`refresh`][Payload::refresh].
    ///
    /// # Errors
    ///
    /// Returns an error if the claim set is rejected by the validator. No
    /// partially-validated payload is ever returned.
    pub fn new<C: Clock>(
        claims: IndexMap<String, Claim>,
        validator: PayloadValidator,
        mode: ValidationMode,
        clock: &C,
    ) -> Result<Self, TokenInvalidError> {
        validator.validate(&claims, mode, clock)?;

        Ok(Self {
            claims,
            validator,
            mode,
        })
    }

    /// Looks up a claim by name
    ///
    /// # Errors
    ///
    /// Returns an error if the payload holds no claim by that name.
    pub fn get(&self, name: &str) -> Result<&Claim, ClaimNotFoundError> {
        self.claims
            .get(name)
            .ok_or_else(|| error::claim_not_found(name))
    }

    /// Looks up a claim by name, returning its JSON value
    ///
    /// # Errors
    ///
    /// Returns an error if the payload holds no claim by that name.
    pub fn get_value(&self, name: &str) -> Result<Value, ClaimNotFoundError> {
        self.get(name).map(Claim::value)
    }

    /// Whether the payload holds a claim by the given name
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// The number of claims in the payload
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether the payload holds no claims
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Iterates over the claims in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Claim> + '_ {
        self.claims.values()
    }

    /// The full claim set as a JSON object, for the external signer
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        self.claims
            .iter()
            .map(|(name, claim)| (name.clone(), claim.value()))
            .collect()
    }

    /// Produces a new payload with fresh time claims and identifier
    ///
    /// The `iat` and `nbf` claims are regenerated from the clock, `exp` is
    /// regenerated from `ttl` (or removed when `ttl` is `None`), `jti` is
    /// regenerated, and every other claim is carried over unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TokenExpired`][TokenInvalidError::TokenExpired] if this
    /// payload's `iat` is older than the validator's refresh window. That
    /// failure is terminal for the token; the caller must re-authenticate.
    pub fn refresh<C: Clock, J: JtiSource>(
        &self,
        ttl: Option<DurationMins>,
        clock: &C,
        jti_source: &mut J,
    ) -> Result<Payload, TokenInvalidError> {
        self.validator
            .validate(&self.claims, ValidationMode::Refresh, clock)?;

        let now = clock.now();
        let mut claims = self.claims.clone();

        claims.insert(names::IAT.to_owned(), Claim::IssuedAt(now));
        claims.insert(names::NBF.to_owned(), Claim::NotBefore(now));
        match ttl {
            Some(ttl) => {
                claims.insert(
                    names::EXP.to_owned(),
                    Claim::Expiry(now + ttl.into_secs()),
                );
            }
            None => {
                claims.shift_remove(names::EXP);
            }
        }

        let staged: IndexMap<String, Value> = claims
            .iter()
            .filter(|(name, _)| name.as_str() != names::JTI)
            .map(|(name, claim)| (name.clone(), claim.value()))
            .collect();
        claims.insert(
            names::JTI.to_owned(),
            Claim::TokenId(jti_source.generate(&staged)),
        );

        // keep the required-claims policy in step with the new ttl, so a
        // payload that regains an expiry also regains its requirement
        let validator = match ttl {
            Some(_) if !self.validator.requires_claim(names::EXP) => {
                self.validator.clone().require_claim(names::EXP)
            }
            Some(_) => self.validator.clone(),
            None => self.validator.clone().without_required_claim(names::EXP),
        };

        tracing::debug!(claims = claims.len(), "refreshed claim payload");

        Payload::new(claims, validator, ValidationMode::Refresh, clock)
    }

    /// The validation mode this payload was constructed under
    #[must_use]
    pub fn validation_mode(&self) -> ValidationMode {
        self.mode
    }

    /// The validator this payload was checked against
    #[must_use]
    pub fn validator(&self) -> &PayloadValidator {
        &self.validator
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.claims.len()))?;
        for (name, claim) in &self.claims {
            map.serialize_entry(name, &claim.value())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use aliri_clock::{TestClock, UnixTime};
    use serde_json::json;

    use super::*;
    use crate::claim::{Issuer, JwtId};
    use crate::test::SeqJti;

    fn claim_set() -> IndexMap<String, Claim> {
        let mut claims = IndexMap::new();
        claims.insert(
            names::ISS.to_owned(),
            Claim::Issuer(Issuer::from_static("https://issuer.example.com")),
        );
        claims.insert(names::IAT.to_owned(), Claim::IssuedAt(UnixTime(1000)));
        claims.insert(names::EXP.to_owned(), Claim::Expiry(UnixTime(4600)));
        claims.insert(names::NBF.to_owned(), Claim::NotBefore(UnixTime(1000)));
        claims.insert(
            names::JTI.to_owned(),
            Claim::TokenId(JwtId::from_static("id-1")),
        );
        claims.insert(
            "sub".to_owned(),
            Claim::Custom {
                name: "sub".to_owned(),
                value: json!("user-1"),
            },
        );
        claims
    }

    fn payload_at(now: u64) -> Payload {
        Payload::new(
            claim_set(),
            PayloadValidator::default(),
            ValidationMode::Strict,
            &TestClock::new(UnixTime(now)),
        )
        .unwrap()
    }

    #[test]
    fn construction_is_all_or_nothing() {
        let clock = TestClock::new(UnixTime(5000));
        let err = Payload::new(
            claim_set(),
            PayloadValidator::default(),
            ValidationMode::Strict,
            &clock,
        )
        .unwrap_err();

        assert_eq!(err, TokenInvalidError::TokenExpired);
    }

    #[test]
    fn lookup_by_name() {
        let payload = payload_at(2000);

        assert_eq!(payload.get_value("sub").unwrap(), json!("user-1"));
        assert_eq!(payload.get_value("exp").unwrap(), json!(4600));
        assert_eq!(payload.get("nope").unwrap_err().name(), "nope");
    }

    #[test]
    fn serializes_as_a_json_object() {
        let payload = payload_at(2000);

        let expected = json!({
            "iss": "https://issuer.example.com",
            "iat": 1000,
            "exp": 4600,
            "nbf": 1000,
            "jti": "id-1",
            "sub": "user-1",
        });

        assert_eq!(serde_json::to_value(&payload).unwrap(), expected);
        assert_eq!(Value::Object(payload.to_map()), expected);
    }

    #[test]
    fn refresh_regenerates_time_claims_and_identifier() {
        let payload = payload_at(2000);

        // well past exp, but inside the default two-week window
        let clock = TestClock::new(UnixTime(10_000));
        let refreshed = payload
            .refresh(Some(DurationMins(60)), &clock, &mut SeqJti::new())
            .unwrap();

        assert_eq!(refreshed.get_value("iat").unwrap(), json!(10_000));
        assert_eq!(refreshed.get_value("nbf").unwrap(), json!(10_000));
        assert_eq!(refreshed.get_value("exp").unwrap(), json!(13_600));
        assert_eq!(refreshed.get_value("jti").unwrap(), json!("jti-1"));
        assert_eq!(refreshed.get_value("sub").unwrap(), json!("user-1"));
        assert_eq!(
            refreshed.get_value("iss").unwrap(),
            json!("https://issuer.example.com")
        );
        assert_eq!(refreshed.validation_mode(), ValidationMode::Refresh);
    }

    #[test]
    fn refresh_without_ttl_drops_the_expiry_claim() {
        let payload = payload_at(2000);

        let clock = TestClock::new(UnixTime(10_000));
        let refreshed = payload.refresh(None, &clock, &mut SeqJti::new()).unwrap();

        assert!(!refreshed.contains("exp"));
    }

    #[test]
    fn refresh_with_ttl_restores_the_expiry_requirement() {
        // a payload originally built without an expiry
        let mut claims = claim_set();
        claims.shift_remove(names::EXP);
        let payload = Payload::new(
            claims,
            PayloadValidator::default().without_required_claim(names::EXP),
            ValidationMode::Strict,
            &TestClock::new(UnixTime(2000)),
        )
        .unwrap();
        assert!(!payload.validator().requires_claim(names::EXP));

        // regaining a ttl regains the requirement for the descendants
        let clock = TestClock::new(UnixTime(10_000));
        let refreshed = payload
            .refresh(Some(DurationMins(60)), &clock, &mut SeqJti::new())
            .unwrap();

        assert!(refreshed.contains("exp"));
        assert!(refreshed.validator().requires_claim(names::EXP));

        // and dropping it again removes both claim and requirement
        let refreshed = refreshed.refresh(None, &clock, &mut SeqJti::new()).unwrap();
        assert!(!refreshed.contains("exp"));
        assert!(!refreshed.validator().requires_claim(names::EXP));
    }

    #[test]
    fn refresh_fails_after_the_window_elapses() {
        let payload = payload_at(2000);

        // 1000 + 20160 minutes, one second too late
        let clock = TestClock::new(UnixTime(1000 + 20160 * 60 + 1));
        let err = payload
            .refresh(Some(DurationMins(60)), &clock, &mut SeqJti::new())
            .unwrap_err();

        assert_eq!(err, TokenInvalidError::TokenExpired);
    }
}
