//! Bearer-token authorization for API gateways
//!
//! An [`Authorizer`] answers one question for each incoming request: does
//! the presented access token grant invocation of the requested resource?
//! The answer is an allow [`AuthorizationDecision`], or an
//! [`AuthorizationError`] whose message is always `unauthorized`.
//!
//! A token is allowed when all of the following hold:
//!
//! * it is a JWT signed with an approved RSA algorithm by a key published in
//!   the issuer's JSON Web Key Set
//! * it has not expired and is not used before its `nbf` time
//! * its `iss` is exactly the configured issuer
//! * its `client_id` and `token_use` are exactly the configured values
//! * it names a `username`
//!
//! The key set is fetched lazily, cached for a configurable time, and
//! refreshed once when a token names a key the cache does not hold, so that
//! key rotation is picked up without waiting for the cache to expire.
//!
//! # Example
//!
//! ```no_run
//! use turnstile::{AuthorizationRequest, Authorizer, AuthorizerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthorizerConfig::from_env()?;
//! let authorizer = Authorizer::new(&config)?;
//!
//! let request = AuthorizationRequest::new(
//!     "Bearer eyJhbGciOi...",
//!     "arn:aws:execute-api:us-east-1:123456789012:api/prod/GET/users",
//! );
//!
//! match authorizer.authorize(&request).await {
//!     Ok(decision) => println!("allowed {}", decision.principal_id()),
//!     Err(err) => println!("{err}"),
//! }
//! # Ok(())
//! # }
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

mod authorizer;
pub mod claims;
pub mod config;
pub mod decision;
pub mod error;
pub mod gateway;
pub mod keys;
mod policy;


pub use authorizer::Authorizer;
#[doc(inline)]
pub use config::AuthorizerConfig;
#[doc(inline)]
pub use decision::{AuthorizationDecision, AuthorizationRequest};
#[doc(inline)]
pub use error::AuthorizationError;
pub use policy::{ClaimsPolicy, Principal};
