use std::{error::Error as StdError, fmt, sync::Arc, time::Duration};

use turnstile_clock::System;
use turnstile_jose::{
    jwt::{CoreValidator, Verified},
    JwtRef,
};

use crate::{
    claims::AccessClaims,
    config::AuthorizerConfig,
    decision::{AuthorizationDecision, AuthorizationRequest},
    error::{AuthorizationError, ConfigError, FetchError},
    gateway::{GatewayAuthorizerRequest, GatewayAuthorizerResponse},
    keys::{HttpKeySetSource, KeySetCache, KeySetSource, SharedClock},
    ClaimsPolicy,
};

struct Inner {
    keys: KeySetCache,
    validator: CoreValidator,
    policy: ClaimsPolicy,
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("keys", &self.keys)
            .field("validator", &self.validator)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Decides whether bearer tokens grant access to resources
///
/// A token is allowed only when it carries a valid signature from a key in
/// the issuer's key set, has not expired, names the configured issuer, and
/// passes the [`ClaimsPolicy`]. Anything else is an
/// [`AuthorizationError`].
///
/// The authorizer is cheap to clone and may be shared across concurrent
/// requests. Clones share one key set cache.
#[derive(Clone)]
#[must_use]
pub struct Authorizer {
    inner: Arc<Inner>,
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl Authorizer {
    /// Constructs an authorizer that fetches keys from the configured URL
    ///
    /// No keys are fetched until the first request.
    ///
    /// # Errors
    ///
    /// The HTTP client could not be constructed.
    pub fn new(config: &AuthorizerConfig) -> Result<Self, ConfigError> {
        let source = HttpKeySetSource::new(config.jwks_url(), config.fetch_timeout())?;
        Ok(Self::from_parts(config, source, Arc::new(System)))
    }

    /// Constructs an authorizer with a custom key source and clock
    pub fn from_parts(
        config: &AuthorizerConfig,
        source: impl KeySetSource + 'static,
        clock: SharedClock,
    ) -> Self {
        let keys = KeySetCache::with_clock(source, config.cache_ttl(), clock);

        Self {
            inner: Arc::new(Inner {
                keys,
                validator: config.validator(),
                policy: config.policy(),
            }),
        }
    }

    /// The key set cache backing this authorizer
    ///
    /// Useful to preload keys or to start a background refresh.
    pub fn keys(&self) -> &KeySetCache {
        &self.inner.keys
    }

    /// Authorizes a request
    ///
    /// The key set is fetched if no fresh copy is held. If the token names a
    /// key that is not in the key set, the key set is refreshed once and the
    /// token checked again.
    ///
    /// # Errors
    ///
    /// The request is not authorized. No partial decision is ever returned.
    pub async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationDecision, AuthorizationError> {
        let result = self.evaluate(request).await;

        if let Err(err) = &result {
            let error: &dyn StdError = err;
            tracing::debug!(
                error,
                error.kind = ?err.kind(),
                error.cause = err.source().map(tracing::field::display),
                resource = request.target_resource(),
                "request denied",
            );
        }

        result
    }

    /// Authorizes a request, giving up once `deadline` has passed
    ///
    /// # Errors
    ///
    /// As [`authorize()`][Self::authorize]. Running out of time is a
    /// [`FetchError::Timeout`].
    pub async fn authorize_within(
        &self,
        request: &AuthorizationRequest,
        deadline: Duration,
    ) -> Result<AuthorizationDecision, AuthorizationError> {
        tokio::time::timeout(deadline, self.authorize(request))
            .await
            .unwrap_or_else(|_| {
                tracing::debug!(?deadline, "authorization deadline elapsed");
                Err(FetchError::Timeout(deadline).into())
            })
    }

    /// Authorizes an API Gateway token authorizer event
    ///
    /// # Errors
    ///
    /// As [`authorize()`][Self::authorize].
    pub async fn authorize_gateway(
        &self,
        request: &GatewayAuthorizerRequest,
    ) -> Result<GatewayAuthorizerResponse, AuthorizationError> {
        let request = AuthorizationRequest::from(request);
        self.authorize(&request).await.map(Into::into)
    }

    async fn evaluate(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationDecision, AuthorizationError> {
        let verified = self.verify(request.token()).await?;
        let principal = self.inner.policy.check(&verified)?;

        tracing::debug!(
            principal = %principal.username(),
            resource = request.target_resource(),
            "request allowed",
        );

        Ok(AuthorizationDecision::allow(
            principal,
            request.target_resource(),
        ))
    }

    async fn verify(&self, token: &JwtRef) -> Result<Verified<AccessClaims>, AuthorizationError> {
        let keys = &self.inner.keys;
        let clock = keys.clock();

        let snapshot = keys.current().await?;
        match token.verify_with_keys(snapshot.jwks(), &self.inner.validator, clock) {
            Err(err) if err.is_unknown_key_id() => {
                tracing::debug!("token names an unknown key; refreshing JWKS");
                let snapshot = keys.refresh().await?;
                Ok(token.verify_with_keys(snapshot.jwks(), &self.inner.validator, clock)?)
            }
            result => Ok(result?),
        }
    }
}
