//! Assembly and validation of JWT claim payloads
//!
//! This crate builds the claims section of a JSON Web Token ([RFC7519][])
//! from a set of named claims, enforcing structural validity before the
//! payload can be handed to a signer. The [`Factory`] generates the
//! mandatory lifecycle claims (`iss`, `iat`, `exp`, `nbf`, `jti`), merges
//! in caller-supplied custom claims with last-write-wins precedence, and
//! produces a [`Payload`] that has been checked against a
//! [`PayloadValidator`] policy: required claims present, expiry not yet
//! elapsed, and not-before not in the future.
//!
//! Signing, verification, and the wire encoding of the finished token are
//! deliberately out of scope. A [`Payload`] serializes as a plain JSON
//! object (and exposes [`Payload::to_map`]), so any JOSE encoder can
//! consume it.
//!
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//!
//! # Example
//!
//! ```
//! use tokensmith::{DurationMins, Factory, Issuer, PayloadValidator};
//!
//! let mut factory = Factory::new(
//!     Issuer::from_static("https://issuer.example.com/login"),
//!     PayloadValidator::default(),
//! );
//!
//! let payload = factory
//!     .set_ttl(Some(DurationMins(60)))
//!     .add_claim("sub", "user-1")
//!     .make()
//!     .unwrap();
//!
//! assert_eq!(payload.get_value("sub").unwrap(), "user-1");
//! assert!(payload.contains("exp"));
//! ```
//!
//! Every time read goes through an [`aliri_clock::Clock`], so expiry and
//! refresh-window behavior can be tested deterministically with
//! [`aliri_clock::TestClock`].

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod claim;
pub mod duration;
pub mod error;
pub mod factory;
pub mod jti;
pub mod payload;
pub mod registry;
pub mod validator;


#[doc(inline)]
pub use claim::{Claim, Issuer, IssuerRef, JwtId, JwtIdRef};
#[doc(inline)]
pub use duration::DurationMins;
#[doc(inline)]
pub use factory::{Factory, IssuerSource};
#[doc(inline)]
pub use jti::{JtiSource, RandomJti};
#[doc(inline)]
pub use payload::Payload;
#[doc(inline)]
pub use registry::ClaimRegistry;
#[doc(inline)]
pub use validator::{PayloadValidator, ValidationMode};
