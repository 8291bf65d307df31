//! The wire format of an API Gateway token authorizer
//!
//! A `TOKEN` authorizer receives the caller's authorization header value and
//! the ARN of the method being invoked, and answers with an IAM policy
//! document. Failing to authorize is signalled by returning an error whose
//! message is `Unauthorized`, which the gateway turns into a `401`.

use serde::{Deserialize, Serialize};
use turnstile_jose::Jwt;

use crate::{
    decision::{AuthorizationDecision, AuthorizationRequest, Effect, ResourceStatement},
    error::AuthorizationError,
};

/// Version of the IAM policy language used in responses
pub const POLICY_VERSION: &str = "2012-10-17";

/// The event handed to a token authorizer
///
/// The token is held as a [`Jwt`], so printing the request never reveals
/// it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAuthorizerRequest {
    /// The authorizer type, normally `TOKEN`
    #[serde(rename = "type", default)]
    pub request_type: String,

    /// The raw authorization header value
    pub authorization_token: Jwt,

    /// The ARN of the invoked method
    pub method_arn: String,
}

impl From<&GatewayAuthorizerRequest> for AuthorizationRequest {
    fn from(req: &GatewayAuthorizerRequest) -> Self {
        AuthorizationRequest::new(req.authorization_token.as_str(), req.method_arn.as_str())
    }
}

/// The answer of a token authorizer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAuthorizerResponse {
    /// The principal the policy applies to
    pub principal_id: String,

    /// The granted or denied permissions
    pub policy_document: PolicyDocument,

    /// Values forwarded to the backend integration
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl GatewayAuthorizerResponse {
    /// An explicit denial of `method_arn` for `principal_id`
    ///
    /// The gateway answers such a response with `403` rather than `401`.
    #[must_use]
    pub fn deny(principal_id: impl Into<String>, method_arn: impl Into<String>) -> Self {
        Self {
            principal_id: principal_id.into(),
            policy_document: PolicyDocument::single(
                (&ResourceStatement::deny_invoke(method_arn)).into(),
            ),
            context: serde_json::Map::new(),
        }
    }
}

impl From<AuthorizationDecision> for GatewayAuthorizerResponse {
    fn from(decision: AuthorizationDecision) -> Self {
        let statement = decision
            .statements()
            .iter()
            .map(PolicyStatement::from)
            .collect();

        let mut context = serde_json::Map::new();
        context.insert(
            "clientId".to_owned(),
            decision.context().client_id().as_str().into(),
        );

        Self {
            principal_id: decision.principal_id().as_str().to_owned(),
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_owned(),
                statement,
            },
            context,
        }
    }
}

/// An IAM policy document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// The policy language version
    pub version: String,
    /// The statements of the policy
    pub statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    fn single(statement: PolicyStatement) -> Self {
        Self {
            version: POLICY_VERSION.to_owned(),
            statement: vec![statement],
        }
    }
}

/// A statement of an IAM policy document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// The governed actions
    pub action: Vec<String>,
    /// Whether the actions are allowed
    pub effect: Effect,
    /// The governed resources
    pub resource: Vec<String>,
}

impl From<&ResourceStatement> for PolicyStatement {
    fn from(s: &ResourceStatement) -> Self {
        Self {
            action: vec![s.action().to_owned()],
            effect: s.effect(),
            resource: vec![s.resource().to_owned()],
        }
    }
}

/// Turns an authorization outcome into what the gateway expects
///
/// # Errors
///
/// Any failure becomes the error message `Unauthorized`.
pub fn respond(
    outcome: Result<AuthorizationDecision, AuthorizationError>,
) -> Result<GatewayAuthorizerResponse, Unauthorized> {
    outcome.map(Into::into).map_err(|_| Unauthorized)
}

/// The error a token authorizer returns to have the gateway answer `401`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[error("Unauthorized")]
pub struct Unauthorized;
