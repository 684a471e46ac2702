//! Generation of unique token identifiers
//!
//! A `jti` value is derived by hashing the JSON serialization of the
//! in-progress claim set together with a random nonce, so two builds with
//! identical claims still receive distinct identifiers. The digest makes
//! the identifier collision-resistant, not collision-proof.

use aliri_base64::Base64Url;
use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use ring::digest;
use serde_json::Value;

use crate::claim::JwtId;

/// A source of `jti` values for newly built payloads
pub trait JtiSource {
    /// Generates an identifier for a payload whose staged claims are given
    fn generate(&mut self, staged: &IndexMap<String, Value>) -> JwtId;
}

impl<T> JtiSource for &'_ mut T
where
    T: JtiSource,
{
    #[inline]
    fn generate(&mut self, staged: &IndexMap<String, Value>) -> JwtId {
        T::generate(self, staged)
    }
}

/// Derives identifiers from a SHA-256 digest of the staged claim set and a
/// random nonce, rendered as base64url
pub struct RandomJti<R = rand::rngs::StdRng> {
    rand_source: R,
}

impl RandomJti<rand::rngs::StdRng> {
    /// Constructs a new source seeded from the thread-local generator
    #[must_use]
    pub fn new() -> Self {
        Self {
            rand_source: rand::rngs::StdRng::from_rng(rand::thread_rng()).unwrap(),
        }
    }
}

impl<R> RandomJti<R> {
    /// Constructs a source drawing nonces from the given generator
    pub fn with_rng(rand_source: R) -> Self {
        Self { rand_source }
    }
}

impl Default for RandomJti<rand::rngs::StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> std::fmt::Debug for RandomJti<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("RandomJti").finish_non_exhaustive()
    }
}

impl<R: Rng> JtiSource for RandomJti<R> {
    fn generate(&mut self, staged: &IndexMap<String, Value>) -> JwtId {
        let mut nonce = [0u8; 16];
        self.rand_source.fill(&mut nonce);

        let mut input =
            serde_json::to_vec(staged).expect("claim sets always serialize as JSON objects");
        input.extend_from_slice(&nonce);

        let hash = digest::digest(&digest::SHA256, &input);
        JwtId::from(Base64Url::from_raw(hash.as_ref()).to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn staged() -> IndexMap<String, Value> {
        let mut staged = IndexMap::new();
        staged.insert(String::from("iss"), json!("https://issuer.example.com"));
        staged.insert(String::from("iat"), json!(1600000000));
        staged
    }

    #[test]
    fn identical_inputs_produce_distinct_identifiers() {
        let mut source = RandomJti::new();
        let staged = staged();

        let first = source.generate(&staged);
        let second = source.generate(&staged);

        assert_ne!(first, second);
    }

    #[test]
    fn identifiers_are_distinct_across_sources() {
        let staged = staged();

        let first = RandomJti::new().generate(&staged);
        let second = RandomJti::new().generate(&staged);

        assert_ne!(first, second);
    }
}
