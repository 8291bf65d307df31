//! Deployment configuration for an [`Authorizer`][crate::Authorizer]

use std::{env, time::Duration};

use turnstile_jose::{
    jwa,
    jwt::{CoreValidator, Issuer},
};

use crate::{
    claims::{ClientId, TokenUse},
    error::ConfigError,
    ClaimsPolicy,
};

const DEFAULT_TOKEN_USE: &str = "access";
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings that identify the token issuer and the accepted client
///
/// Built either from explicit values, or with [`from_env()`][Self::from_env]
/// from the environment the authorizer is deployed into.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct AuthorizerConfig {
    issuer: Issuer,
    client_id: ClientId,
    token_use: TokenUse,
    jwks_url: String,
    algorithms: Vec<jwa::Algorithm>,
    leeway: Duration,
    cache_ttl: Duration,
    fetch_timeout: Duration,
}

impl AuthorizerConfig {
    /// Constructs a configuration for an arbitrary issuer
    ///
    /// Accepts `RS256` access tokens with no clock leeway. Keys are cached for
    /// ten minutes and each fetch is given five seconds.
    pub fn new(issuer: Issuer, client_id: ClientId, jwks_url: impl Into<String>) -> Self {
        Self {
            issuer,
            client_id,
            token_use: TokenUse::from_static(DEFAULT_TOKEN_USE),
            jwks_url: jwks_url.into(),
            algorithms: vec![jwa::Algorithm::RS256],
            leeway: Duration::ZERO,
            cache_ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Constructs a configuration for a Cognito user pool
    ///
    /// ```
    /// use turnstile::{AuthorizerConfig, claims::ClientId};
    ///
    /// let config = AuthorizerConfig::for_user_pool(
    ///     "us-east-1",
    ///     "us-east-1_example",
    ///     ClientId::from_static("client-A"),
    /// );
    ///
    /// assert_eq!(
    ///     config.issuer().as_str(),
    ///     "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_example",
    /// );
    /// assert_eq!(
    ///     config.jwks_url(),
    ///     "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_example/.well-known/jwks.json",
    /// );
    /// ```
    pub fn for_user_pool(region: &str, user_pool_id: &str, client_id: ClientId) -> Self {
        let issuer = user_pool_issuer(region, user_pool_id);
        let jwks_url = well_known_jwks_url(&issuer);
        Self::new(Issuer::new(issuer), client_id, jwks_url)
    }

    /// Reads the configuration from the process environment
    ///
    /// `REGION`, `USER_POOL_ID` and `USER_POOL_CLIENT_ID` are required.
    /// `ISSUER`, `JWKS_URL`, `TOKEN_USE`, `TOKEN_LEEWAY_SECS`,
    /// `JWKS_CACHE_TTL_SECS` and `JWKS_FETCH_TIMEOUT_SECS` override the
    /// defaults when set and not empty. A custom `ISSUER` without a
    /// `JWKS_URL` takes its key set from `{ISSUER}/.well-known/jwks.json`.
    ///
    /// # Errors
    ///
    /// A required variable is unset, or an optional one cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVariable(name))
        };

        let region = required("REGION")?;
        let user_pool_id = required("USER_POOL_ID")?;
        let client_id = ClientId::new(required("USER_POOL_CLIENT_ID")?);

        let optional = |name: &'static str| lookup(name).filter(|v| !v.is_empty());

        let mut config = Self::for_user_pool(&region, &user_pool_id, client_id);

        // The key set lives with the issuer unless named explicitly.
        if let Some(issuer) = optional("ISSUER") {
            config.jwks_url = well_known_jwks_url(&issuer);
            config.issuer = Issuer::new(issuer);
        }

        if let Some(url) = optional("JWKS_URL") {
            config.jwks_url = url;
        }

        if let Some(token_use) = optional("TOKEN_USE") {
            config.token_use = TokenUse::new(token_use);
        }

        let secs = |name: &'static str| -> Result<Option<Duration>, ConfigError> {
            optional(name)
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .map(Duration::from_secs)
                        .map_err(|e| ConfigError::InvalidValue {
                            variable: name,
                            source: e.into(),
                        })
                })
                .transpose()
        };

        if let Some(leeway) = secs("TOKEN_LEEWAY_SECS")? {
            config.leeway = leeway;
        }

        if let Some(ttl) = secs("JWKS_CACHE_TTL_SECS")? {
            config.cache_ttl = ttl;
        }

        if let Some(timeout) = secs("JWKS_FETCH_TIMEOUT_SECS")? {
            config.fetch_timeout = timeout;
        }

        tracing::debug!(
            issuer = %config.issuer,
            client_id = %config.client_id,
            jwks.url = %config.jwks_url,
            "loaded authorizer configuration"
        );

        Ok(config)
    }

    /// Requires a different `token_use` claim
    pub fn with_token_use(self, token_use: TokenUse) -> Self {
        Self { token_use, ..self }
    }

    /// Fetches keys from a different location
    pub fn with_jwks_url(self, jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            ..self
        }
    }

    /// Replaces the set of approved signature algorithms
    pub fn with_algorithms<I: IntoIterator<Item = jwa::Algorithm>>(self, algorithms: I) -> Self {
        Self {
            algorithms: algorithms.into_iter().collect(),
            ..self
        }
    }

    /// Allows a grace period around the `exp` and `nbf` claims
    pub fn with_leeway(self, leeway: Duration) -> Self {
        Self { leeway, ..self }
    }

    /// Sets how long a fetched key set is used before it is fetched again
    pub fn with_cache_ttl(self, cache_ttl: Duration) -> Self {
        Self { cache_ttl, ..self }
    }

    /// Sets the time allowed for a single key set fetch
    pub fn with_fetch_timeout(self, fetch_timeout: Duration) -> Self {
        Self {
            fetch_timeout,
            ..self
        }
    }

    /// The required issuer
    #[must_use]
    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    /// The required client
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// The required token use
    #[must_use]
    pub fn token_use(&self) -> &TokenUse {
        &self.token_use
    }

    /// Where keys are fetched from
    #[must_use]
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// The approved signature algorithms
    #[must_use]
    pub fn algorithms(&self) -> &[jwa::Algorithm] {
        &self.algorithms
    }

    /// The grace period around time claims
    #[must_use]
    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    /// How long a fetched key set is used
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// The time allowed for a single fetch
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// The validator for signature algorithm, time and issuer checks
    pub fn validator(&self) -> CoreValidator {
        CoreValidator::default()
            .extend_approved_algorithms(self.algorithms.iter().copied())
            .with_leeway(self.leeway)
            .require_issuer(self.issuer.clone())
    }

    /// The policy for client and token use checks
    pub fn policy(&self) -> ClaimsPolicy {
        ClaimsPolicy::new(self.client_id.clone(), self.token_use.clone())
    }
}

fn user_pool_issuer(region: &str, user_pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}")
}

fn well_known_jwks_url(issuer: &str) -> String {
    format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use color_eyre::Result;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("REGION", "eu-west-1"),
        ("USER_POOL_ID", "eu-west-1_pool"),
        ("USER_POOL_CLIENT_ID", "client-A"),
    ];

    #[test]
    fn reads_required_variables() -> Result<()> {
        let config = AuthorizerConfig::from_lookup(lookup(&REQUIRED))?;

        assert_eq!(
            config.issuer().as_str(),
            "https://cognito-idp.eu-west-1.amazonaws.com/eu-west-1_pool"
        );
        assert_eq!(
            config.jwks_url(),
            "https://cognito-idp.eu-west-1.amazonaws.com/eu-west-1_pool/.well-known/jwks.json"
        );
        assert_eq!(config.client_id().as_str(), "client-A");
        assert_eq!(config.token_use().as_str(), "access");
        assert_eq!(config.algorithms(), &[jwa::Algorithm::RS256]);
        assert_eq!(config.leeway(), Duration::ZERO);
        assert_eq!(config.cache_ttl(), DEFAULT_CACHE_TTL);
        assert_eq!(config.fetch_timeout(), DEFAULT_FETCH_TIMEOUT);
        Ok(())
    }

    #[test]
    fn each_required_variable_is_reported() {
        for (missing, _) in REQUIRED {
            let vars: Vec<_> = REQUIRED.iter().copied().filter(|(k, _)| *k != missing).collect();
            let err = AuthorizerConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(
                matches!(err, ConfigError::MissingVariable(name) if name == missing),
                "expected {missing} to be reported, got {err:?}"
            );
        }
    }

    #[test]
    fn empty_required_variable_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[2] = ("USER_POOL_CLIENT_ID", "");
        let err = AuthorizerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVariable("USER_POOL_CLIENT_ID")
        ));
    }

    #[test]
    fn optional_variables_override_defaults() -> Result<()> {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("ISSUER", "https://issuer.example/pool-1"),
            ("JWKS_URL", "http://127.0.0.1:9/jwks.json"),
            ("TOKEN_USE", "id"),
            ("TOKEN_LEEWAY_SECS", "30"),
            ("JWKS_CACHE_TTL_SECS", " 60 "),
            ("JWKS_FETCH_TIMEOUT_SECS", "2"),
        ]);

        let config = AuthorizerConfig::from_lookup(lookup(&vars))?;
        assert_eq!(config.issuer().as_str(), "https://issuer.example/pool-1");
        assert_eq!(config.jwks_url(), "http://127.0.0.1:9/jwks.json");
        assert_eq!(config.token_use().as_str(), "id");
        assert_eq!(config.leeway(), Duration::from_secs(30));
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(2));
        Ok(())
    }

    #[test]
    fn custom_issuer_moves_key_set_location() -> Result<()> {
        let mut vars = REQUIRED.to_vec();
        vars.push(("ISSUER", "https://issuer.example/pool-1/"));

        let config = AuthorizerConfig::from_lookup(lookup(&vars))?;
        assert_eq!(config.issuer().as_str(), "https://issuer.example/pool-1/");
        assert_eq!(
            config.jwks_url(),
            "https://issuer.example/pool-1/.well-known/jwks.json"
        );
        Ok(())
    }

    #[test]
    fn empty_optional_variables_keep_defaults() -> Result<()> {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("ISSUER", ""),
            ("JWKS_URL", ""),
            ("TOKEN_USE", ""),
            ("TOKEN_LEEWAY_SECS", ""),
            ("JWKS_CACHE_TTL_SECS", ""),
        ]);

        let config = AuthorizerConfig::from_lookup(lookup(&vars))?;
        assert_eq!(
            config.issuer().as_str(),
            "https://cognito-idp.eu-west-1.amazonaws.com/eu-west-1_pool"
        );
        assert_eq!(
            config.jwks_url(),
            "https://cognito-idp.eu-west-1.amazonaws.com/eu-west-1_pool/.well-known/jwks.json"
        );
        assert_eq!(config.token_use().as_str(), "access");
        assert_eq!(config.leeway(), Duration::ZERO);
        assert_eq!(config.cache_ttl(), DEFAULT_CACHE_TTL);
        Ok(())
    }

    #[test]
    fn unparsable_duration_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("TOKEN_LEEWAY_SECS", "soon"));
        let err = AuthorizerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                variable: "TOKEN_LEEWAY_SECS",
                ..
            }
        ));
    }

    #[test]
    fn validator_reflects_configuration() {
        let config = AuthorizerConfig::for_user_pool("us-east-1", "pool", ClientId::from_static("c"))
            .with_algorithms([jwa::Algorithm::RS256, jwa::Algorithm::PS256])
            .with_leeway(Duration::from_secs(5));

        let validator = config.validator();
        assert_eq!(
            validator.approved_algorithms(),
            &[jwa::Algorithm::RS256, jwa::Algorithm::PS256]
        );
        assert_eq!(validator.leeway(), Duration::from_secs(5));
        assert_eq!(
            validator.issuer().map(|i| i.as_str()),
            Some("https://cognito-idp.us-east-1.amazonaws.com/pool")
        );
    }

    #[test]
    fn empty_algorithm_list_approves_nothing() {
        let config = AuthorizerConfig::for_user_pool("us-east-1", "pool", ClientId::from_static("c"))
            .with_algorithms([]);
        assert!(config.validator().approved_algorithms().is_empty());
    }
}
