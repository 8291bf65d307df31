use turnstile_jose::jwt::Verified;

use crate::{
    claims::{AccessClaims, ClientId, TokenUse, Username},
    error::PolicyError,
};

/// The authenticated caller behind an accepted token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub(crate) username: Username,
    pub(crate) client_id: ClientId,
}

impl Principal {
    /// The user the token was issued for
    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// The client the token was issued to
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }
}

/// Deployment-specific checks applied to a token after its signature and
/// core claims have been verified
///
/// The token must have been issued to exactly the configured client, must
/// declare exactly the configured use, and must name a user.
///
/// # Example
///
/// ```
/// use turnstile::{ClaimsPolicy, claims::{ClientId, TokenUse}};
///
/// let policy = ClaimsPolicy::new(
///     ClientId::from_static("client-A"),
///     TokenUse::from_static("access"),
/// );
/// assert_eq!(policy.client_id().as_str(), "client-A");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct ClaimsPolicy {
    client_id: ClientId,
    token_use: TokenUse,
}

impl ClaimsPolicy {
    /// Constructs a policy accepting only `client_id` and `token_use`
    pub fn new(client_id: ClientId, token_use: TokenUse) -> Self {
        Self {
            client_id,
            token_use,
        }
    }

    /// The client tokens must be issued to
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// The use tokens must declare
    #[must_use]
    pub fn token_use(&self) -> &TokenUse {
        &self.token_use
    }

    /// Evaluates the claims of a verified token
    ///
    /// # Errors
    ///
    /// Checks are made in order: `client_id`, then `token_use`, then
    /// `username`. The first failure is returned.
    pub fn check(&self, token: &Verified<AccessClaims>) -> Result<Principal, PolicyError> {
        self.check_claims(token.claims())
    }

    pub(crate) fn check_claims(&self, claims: &AccessClaims) -> Result<Principal, PolicyError> {
        match claims.client_id() {
            Some(c) if c.as_str() == self.client_id.as_str() => {}
            Some(_) => return Err(PolicyError::ClientMismatch),
            None => return Err(PolicyError::MissingClientId),
        }

        match claims.token_use() {
            Some(u) if u.as_str() == self.token_use.as_str() => {}
            Some(_) => return Err(PolicyError::TokenUseMismatch),
            None => return Err(PolicyError::MissingTokenUse),
        }

        let username = match claims.username() {
            Some(u) if !u.as_str().is_empty() => u.to_owned(),
            _ => return Err(PolicyError::MissingSubject),
        };

        Ok(Principal {
            username,
            client_id: self.client_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ClaimsPolicy {
        ClaimsPolicy::new(
            ClientId::from_static("client-A"),
            TokenUse::from_static("access"),
        )
    }

    fn claims() -> AccessClaims {
        AccessClaims::new()
            .with_client_id("client-A")
            .with_token_use("access")
            .with_username("alice")
    }

    #[test]
    fn accepts_matching_claims() {
        let principal = policy().check_claims(&claims()).unwrap();
        assert_eq!(principal.username().as_str(), "alice");
        assert_eq!(principal.client_id().as_str(), "client-A");
    }

    #[test]
    fn rejects_other_client() {
        let claims = claims().with_client_id("client-B");
        assert_eq!(
            policy().check_claims(&claims),
            Err(PolicyError::ClientMismatch)
        );
    }

    #[test]
    fn client_comparison_is_exact() {
        let claims = claims().with_client_id("Client-A");
        assert_eq!(
            policy().check_claims(&claims),
            Err(PolicyError::ClientMismatch)
        );
    }

    #[test]
    fn rejects_missing_client() {
        let claims = AccessClaims::new()
            .with_token_use("access")
            .with_username("alice");
        assert_eq!(
            policy().check_claims(&claims),
            Err(PolicyError::MissingClientId)
        );
    }

    #[test]
    fn rejects_id_token() {
        let claims = claims().with_token_use("id");
        assert_eq!(
            policy().check_claims(&claims),
            Err(PolicyError::TokenUseMismatch)
        );
    }

    #[test]
    fn rejects_missing_token_use() {
        let claims = AccessClaims::new()
            .with_client_id("client-A")
            .with_username("alice");
        assert_eq!(
            policy().check_claims(&claims),
            Err(PolicyError::MissingTokenUse)
        );
    }

    #[test]
    fn rejects_missing_or_empty_username() {
        let claims = AccessClaims::new()
            .with_client_id("client-A")
            .with_token_use("access");
        assert_eq!(
            policy().check_claims(&claims),
            Err(PolicyError::MissingSubject)
        );

        let claims = claims.with_username("");
        assert_eq!(
            policy().check_claims(&claims),
            Err(PolicyError::MissingSubject)
        );
    }

    #[test]
    fn client_is_checked_before_token_use() {
        let claims = AccessClaims::new()
            .with_client_id("client-B")
            .with_token_use("id");
        assert_eq!(
            policy().check_claims(&claims),
            Err(PolicyError::ClientMismatch)
        );
    }
}
