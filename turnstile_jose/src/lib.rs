//! Verification of RSA-signed JSON Web Tokens
//!
//! This crate covers the parts of the JOSE standards needed to check a
//! bearer token presented to an API:
//!
//! * JSON Web Signature (JWS): [RFC7515][]
//! * JSON Web Key (JWK): [RFC7517][]
//! * JSON Web Algorithms (JWA): [RFC7518][], RSA signatures only
//! * JSON Web Token (JWT): [RFC7519][]
//!
//! Symmetric (`HS*`) and unsigned (`none`) tokens are always rejected.
//! Nothing in this crate performs I/O; obtaining a [`Jwks`] is left to the
//! caller.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7517]: https://tools.ietf.org/html/rfc7517
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//!
//! # Example
//!
//! ```
//! use turnstile_clock::{TestClock, UnixTime};
//! use turnstile_jose::{jwa, jwt, Jwks, JwtRef};
//!
//! let token = JwtRef::from_str("not.a.token");
//! let keys = Jwks::default();
//!
//! let validator = jwt::CoreValidator::default()
//!     .add_approved_algorithm(jwa::Algorithm::RS256)
//!     .require_issuer(jwt::Issuer::from_static("https://issuer.example/pool-1"));
//!
//! let clock = TestClock::new(UnixTime(1_700_000_000));
//! let result = token.verify_with_keys::<jwt::BasicClaims, _>(&keys, &validator, &clock);
//! assert!(result.is_err());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod b64;
pub mod error;
pub mod jwa;
pub mod jwk;
mod jwks;
pub mod jws;
pub mod jwt;

#[cfg(test)]
pub(crate) mod test;

pub use b64::Base64Url;
#[doc(inline)]
pub use jwk::Jwk;
#[doc(inline)]
pub use jwks::Jwks;
#[doc(inline)]
pub use jwt::{Jwt, JwtRef};
