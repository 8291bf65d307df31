//! Authorization requests and the decisions made about them

use std::fmt;

use serde::{Deserialize, Serialize};
use turnstile_jose::{Jwt, JwtRef};

use crate::{
    claims::{ClientId, Username},
    policy::Principal,
};

/// The action granted by an allow decision
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Whether a statement permits or forbids its action
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// The action is permitted
    Allow,
    /// The action is forbidden
    Deny,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        })
    }
}

/// A single permission over a resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceStatement {
    effect: Effect,
    action: String,
    resource: String,
}

impl ResourceStatement {
    /// A statement permitting invocation of `resource`
    #[must_use]
    pub fn allow_invoke(resource: impl Into<String>) -> Self {
        Self {
            effect: Effect::Allow,
            action: INVOKE_ACTION.to_owned(),
            resource: resource.into(),
        }
    }

    /// A statement forbidding invocation of `resource`
    #[must_use]
    pub fn deny_invoke(resource: impl Into<String>) -> Self {
        Self {
            effect: Effect::Deny,
            action: INVOKE_ACTION.to_owned(),
            resource: resource.into(),
        }
    }

    /// The effect of the statement
    #[must_use]
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// The governed action
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The governed resource
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

/// A bearer token presented for access to a resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRequest {
    token: Jwt,
    target_resource: String,
}

impl AuthorizationRequest {
    /// Constructs a request from the raw authorization value
    ///
    /// A leading `Bearer` scheme, matched without regard to case, is removed
    /// along with surrounding whitespace.
    ///
    /// ```
    /// use turnstile::AuthorizationRequest;
    ///
    /// let req = AuthorizationRequest::new("Bearer aaa.bbb.ccc", "arn:resource");
    /// assert_eq!(req.token().as_str(), "aaa.bbb.ccc");
    /// ```
    pub fn new(authorization: impl AsRef<str>, target_resource: impl Into<String>) -> Self {
        Self {
            token: Jwt::new(strip_bearer(authorization.as_ref()).to_owned()),
            target_resource: target_resource.into(),
        }
    }

    /// The presented token
    pub fn token(&self) -> &JwtRef {
        &self.token
    }

    /// The resource access is requested for
    #[must_use]
    pub fn target_resource(&self) -> &str {
        &self.target_resource
    }
}

fn strip_bearer(value: &str) -> &str {
    const SCHEME: &str = "bearer ";

    let value = value.trim();
    match value.get(..SCHEME.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(SCHEME) => value[SCHEME.len()..].trim_start(),
        _ => value,
    }
}

/// Values handed to the protected backend alongside an allow decision
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DecisionContext {
    #[serde(rename = "clientId")]
    client_id: ClientId,
}

impl DecisionContext {
    /// The client the accepted token was issued to
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }
}

/// The outcome of a successful authorization
///
/// Only allow decisions are produced by the authorizer. Every failure is
/// reported as an [`AuthorizationError`][crate::AuthorizationError] instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationDecision {
    effect: Effect,
    principal_id: Username,
    statements: Vec<ResourceStatement>,
    context: DecisionContext,
}

impl AuthorizationDecision {
    pub(crate) fn allow(principal: Principal, target_resource: &str) -> Self {
        let Principal {
            username,
            client_id,
        } = principal;

        Self {
            effect: Effect::Allow,
            principal_id: username,
            statements: vec![ResourceStatement::allow_invoke(target_resource)],
            context: DecisionContext { client_id },
        }
    }

    /// The overall effect
    #[must_use]
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// The user that was granted access
    #[must_use]
    pub fn principal_id(&self) -> &Username {
        &self.principal_id
    }

    /// The permissions granted
    #[must_use]
    pub fn statements(&self) -> &[ResourceStatement] {
        &self.statements
    }

    /// Values to forward to the backend
    #[must_use]
    pub fn context(&self) -> &DecisionContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bearer_scheme() {
        assert_eq!(strip_bearer("Bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(strip_bearer("bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(strip_bearer("BEARER   abc.def.ghi "), "abc.def.ghi");
        assert_eq!(strip_bearer("abc.def.ghi"), "abc.def.ghi");
        assert_eq!(strip_bearer("Basic dXNlcjpwYXNz"), "Basic dXNlcjpwYXNz");
        assert_eq!(strip_bearer("Bearer"), "Bearer");
        assert_eq!(strip_bearer(""), "");
    }

    #[test]
    fn multibyte_prefix_does_not_panic() {
        assert_eq!(strip_bearer("ééééé"), "ééééé");
    }

    #[test]
    fn allow_covers_exactly_the_requested_resource() {
        let principal = Principal {
            username: Username::from_static("alice"),
            client_id: ClientId::from_static("client-A"),
        };

        let decision = AuthorizationDecision::allow(principal, "arn:resource:method/GET/users");
        assert_eq!(decision.effect(), Effect::Allow);
        assert_eq!(decision.principal_id().as_str(), "alice");
        assert_eq!(decision.context().client_id().as_str(), "client-A");
        assert_eq!(
            decision.statements(),
            &[ResourceStatement::allow_invoke("arn:resource:method/GET/users")]
        );
        assert_eq!(decision.statements()[0].action(), "execute-api:Invoke");
    }

    #[test]
    fn effect_serializes_capitalized() {
        assert_eq!(
            serde_json::to_value(Effect::Allow).unwrap(),
            serde_json::json!("Allow")
        );
        assert_eq!(Effect::Deny.to_string(), "Deny");
    }

    #[test]
    fn request_debug_redacts_token() {
        let req = AuthorizationRequest::new("Bearer aaa.bbb.ccc", "arn:resource");
        let printed = format!("{req:?}");
        assert!(!printed.contains("ccc"));
        assert!(printed.contains("arn:resource"));
    }
}
