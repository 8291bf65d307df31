//! Errors raised while authorizing a request

use std::{error::Error as StdError, time::Duration};

use thiserror::Error;
use turnstile_jose::error::JwtVerifyError;

/// The key set could not be obtained
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request to the key set endpoint failed
    #[error("key set request failed")]
    Transport(#[source] Box<dyn StdError + Send + Sync + 'static>),

    /// The key set endpoint responded with a non-success status
    #[error("key set endpoint responded with status {0}")]
    Status(u16),

    /// The key set document was not a valid JWKS
    #[error("key set document could not be decoded")]
    Decode(#[source] serde_json::Error),

    /// The key set was not obtained before the deadline
    #[error("key set was not available within {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Wraps a transport-level failure from a custom key set source
    pub fn transport(source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Transport(source.into())
    }

    /// Whether the fetch was abandoned at a deadline
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// A verified token was not acceptable for this deployment
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum PolicyError {
    /// The token was issued to a different client
    #[error("token was issued to a different client")]
    ClientMismatch,

    /// The token does not name the client it was issued to
    #[error("token has no client_id claim")]
    MissingClientId,

    /// The token is not meant for this use
    #[error("token_use does not match")]
    TokenUseMismatch,

    /// The token does not declare its use
    #[error("token has no token_use claim")]
    MissingTokenUse,

    /// The token does not identify a principal
    #[error("token has no username")]
    MissingSubject,
}

/// The broad category of an authorization failure
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Keys could not be obtained
    Fetch,
    /// The token was malformed, unsigned by a known key, or its core claims
    /// were rejected
    Verification,
    /// The token was valid but not acceptable to the claims policy
    Policy,
}

/// A request was not authorized
///
/// The message is always `unauthorized`, whatever the cause, so that it can
/// be handed back to a caller as-is. The cause is available through
/// [`kind()`][Self::kind] and the [`source()`][StdError::source] chain for
/// diagnostics.
#[derive(Debug, Error)]
#[error("unauthorized")]
pub struct AuthorizationError {
    #[source]
    cause: Cause,
}

#[derive(Debug, Error)]
enum Cause {
    #[error(transparent)]
    Fetch(FetchError),
    #[error(transparent)]
    Verification(JwtVerifyError),
    #[error(transparent)]
    Policy(PolicyError),
}

impl AuthorizationError {
    /// The category of the failure
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match &self.cause {
            Cause::Fetch(_) => ErrorKind::Fetch,
            Cause::Verification(_) => ErrorKind::Verification,
            Cause::Policy(_) => ErrorKind::Policy,
        }
    }

    /// The key fetch failure, if that was the cause
    #[must_use]
    pub fn as_fetch(&self) -> Option<&FetchError> {
        match &self.cause {
            Cause::Fetch(e) => Some(e),
            _ => None,
        }
    }

    /// The token verification failure, if that was the cause
    #[must_use]
    pub fn as_verification(&self) -> Option<&JwtVerifyError> {
        match &self.cause {
            Cause::Verification(e) => Some(e),
            _ => None,
        }
    }

    /// The claims policy failure, if that was the cause
    #[must_use]
    pub fn as_policy(&self) -> Option<PolicyError> {
        match &self.cause {
            Cause::Policy(e) => Some(*e),
            _ => None,
        }
    }
}

impl From<FetchError> for AuthorizationError {
    fn from(err: FetchError) -> Self {
        Self {
            cause: Cause::Fetch(err),
        }
    }
}

impl From<JwtVerifyError> for AuthorizationError {
    fn from(err: JwtVerifyError) -> Self {
        Self {
            cause: Cause::Verification(err),
        }
    }
}

impl From<PolicyError> for AuthorizationError {
    fn from(err: PolicyError) -> Self {
        Self {
            cause: Cause::Policy(err),
        }
    }
}

/// The authorizer could not be configured
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("missing required environment variable {0}")]
    MissingVariable(&'static str),

    /// An environment variable holds a value that cannot be used
    #[error("environment variable {variable} has an invalid value")]
    InvalidValue {
        /// The offending variable
        variable: &'static str,
        /// Why the value was refused
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    /// The HTTP client for fetching keys could not be built
    #[error("unable to construct key set client")]
    HttpClient(#[source] reqwest::Error),
}
