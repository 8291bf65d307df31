//! Claims carried by user pool access tokens

use aliri_braid::braid;
use serde::{Deserialize, Serialize};
use turnstile_clock::{Clock, UnixTime};
use turnstile_jose::jwt::{CoreClaims, Issuer, IssuerRef, Subject, SubjectRef};

/// The application client a token was issued to
#[braid(serde, ref_doc = "A borrowed reference to a [`ClientId`]")]
pub struct ClientId;

/// The declared purpose of a token, such as `access` or `id`
#[braid(serde, ref_doc = "A borrowed reference to a [`TokenUse`]")]
pub struct TokenUse;

/// The user a token was issued for
#[braid(serde, ref_doc = "A borrowed reference to a [`Username`]")]
pub struct Username;

/// Claims of an access token
///
/// Every claim is optional here. Presence requirements are enforced by the
/// [`CoreValidator`][turnstile_jose::jwt::CoreValidator] for the time and
/// issuer claims, and by the [`ClaimsPolicy`][crate::ClaimsPolicy] for the
/// rest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct AccessClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<Issuer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_use: Option<TokenUse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<Username>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbf: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<UnixTime>,
}

impl CoreClaims for AccessClaims {
    fn nbf(&self) -> Option<UnixTime> {
        self.nbf
    }

    fn exp(&self) -> Option<UnixTime> {
        self.exp
    }

    fn iss(&self) -> Option<&IssuerRef> {
        self.iss.as_deref()
    }
}

impl AccessClaims {
    /// Constructs an empty set of claims
    pub const fn new() -> Self {
        Self {
            iss: None,
            sub: None,
            client_id: None,
            token_use: None,
            username: None,
            scope: None,
            exp: None,
            nbf: None,
            iat: None,
        }
    }

    /// The subject
    #[must_use]
    pub fn sub(&self) -> Option<&SubjectRef> {
        self.sub.as_deref()
    }

    /// The client the token was issued to
    #[must_use]
    pub fn client_id(&self) -> Option<&ClientIdRef> {
        self.client_id.as_deref()
    }

    /// The declared token use
    #[must_use]
    pub fn token_use(&self) -> Option<&TokenUseRef> {
        self.token_use.as_deref()
    }

    /// The user the token was issued for
    #[must_use]
    pub fn username(&self) -> Option<&UsernameRef> {
        self.username.as_deref()
    }

    /// The space-separated scopes granted to the token
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// When the token was issued
    #[must_use]
    pub fn iat(&self) -> Option<UnixTime> {
        self.iat
    }

    /// Sets the issuer
    pub fn with_issuer(mut self, iss: impl Into<Issuer>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Sets the subject
    pub fn with_subject(mut self, sub: impl Into<Subject>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Sets the client id
    pub fn with_client_id(mut self, client_id: impl Into<ClientId>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the token use
    pub fn with_token_use(mut self, token_use: impl Into<TokenUse>) -> Self {
        self.token_use = Some(token_use.into());
        self
    }

    /// Sets the username
    pub fn with_username(mut self, username: impl Into<Username>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the granted scopes
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the expiration time
    pub fn with_expiration(mut self, time: UnixTime) -> Self {
        self.exp = Some(time);
        self
    }

    /// Sets the expiration to `secs` after the clock's current time
    pub fn with_future_expiration_from_clock<K: Clock>(mut self, secs: u64, clock: &K) -> Self {
        self.exp = Some(UnixTime(clock.now().0.saturating_add(secs)));
        self
    }

    /// Sets the not-before time
    pub fn with_not_before(mut self, time: UnixTime) -> Self {
        self.nbf = Some(time);
        self
    }

    /// Sets the issued-at time
    pub fn with_issued_at(mut self, time: UnixTime) -> Self {
        self.iat = Some(time);
        self
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;

    #[test]
    fn deserializes_user_pool_access_token_payload() -> Result<()> {
        const DATA: &str = r#"{
            "sub": "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee",
            "iss": "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_example",
            "client_id": "client-A",
            "origin_jti": "bbbbbbbb-cccc-dddd-eeee-ffffffffffff",
            "event_id": "cccccccc-dddd-eeee-ffff-000000000000",
            "token_use": "access",
            "scope": "aws.cognito.signin.user.admin",
            "auth_time": 1700000000,
            "exp": 1700003600,
            "iat": 1700000000,
            "jti": "dddddddd-eeee-ffff-0000-111111111111",
            "username": "alice"
        }"#;

        let claims: AccessClaims = serde_json::from_str(DATA)?;
        assert_eq!(claims.client_id(), Some(ClientIdRef::from_static("client-A")));
        assert_eq!(claims.token_use(), Some(TokenUseRef::from_static("access")));
        assert_eq!(claims.username(), Some(UsernameRef::from_static("alice")));
        assert_eq!(claims.exp(), Some(UnixTime(1_700_003_600)));
        assert_eq!(claims.iat(), Some(UnixTime(1_700_000_000)));
        assert_eq!(claims.nbf(), None);
        assert_eq!(claims.scope(), Some("aws.cognito.signin.user.admin"));
        assert_eq!(
            claims.iss().map(IssuerRef::as_str),
            Some("https://cognito-idp.us-east-1.amazonaws.com/us-east-1_example")
        );
        Ok(())
    }

    #[test]
    fn non_string_client_id_is_rejected() {
        let res = serde_json::from_str::<AccessClaims>(r#"{"client_id": 42}"#);
        assert!(res.is_err());
    }

    #[test]
    fn serializes_only_present_claims() -> Result<()> {
        let claims = AccessClaims::new()
            .with_username("alice")
            .with_expiration(UnixTime(10));
        let value = serde_json::to_value(&claims)?;
        assert_eq!(value, serde_json::json!({ "username": "alice", "exp": 10 }));
        Ok(())
    }
}
