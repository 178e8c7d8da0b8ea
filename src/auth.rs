//! HTTP Basic authorizer for the upload API.
//!
//! Answers an API gateway request-authorizer event with an IAM policy that
//! allows or denies `execute-api:Invoke` on the requested route. Passwords
//! are looked up by username in a [`CredentialStore`]; the deployed store
//! is the process environment.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::AuthError;

const BASIC_PREFIX: &str = "Basic ";
const POLICY_VERSION: &str = "2012-10-17";
const INVOKE_ACTION: &str = "execute-api:Invoke";
const ANONYMOUS: &str = "anonymous";

/// The parts of a request-authorizer event the authorizer reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerEvent {
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    pub route_arn: String,
}

impl AuthorizerEvent {
    /// The `Authorization` header value, whatever the header name's case.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

/// Authorizer answer: who the caller is and what they may invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
}

impl AuthResponse {
    pub fn new(principal_id: impl Into<String>, route_arn: &str, effect: Effect) -> Self {
        Self {
            principal_id: principal_id.into(),
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![Statement {
                    action: INVOKE_ACTION.to_string(),
                    effect,
                    resource: route_arn.to_string(),
                }],
            },
        }
    }

    pub fn is_allowed(&self) -> bool {
        let statements = &self.policy_document.statement;
        !statements.is_empty() && statements.iter().all(|s| s.effect == Effect::Allow)
    }
}

/// Username and password carried by a Basic `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Parse `Basic <base64(username:password)>`. The username ends at the
    /// first `:`; the password is everything after it.
    pub fn from_header(value: &str) -> Result<Self, AuthError> {
        let encoded = value
            .strip_prefix(BASIC_PREFIX)
            .ok_or(AuthError::NotBasic)?
            .trim();
        let decoded = String::from_utf8(STANDARD.decode(encoded)?)?;

        match decoded.split_once(':') {
            Some((username, password)) if !username.is_empty() && !password.is_empty() => {
                Ok(Self {
                    username: username.to_string(),
                    password: password.to_string(),
                })
            }
            _ => Err(AuthError::MissingCredentials),
        }
    }
}

/// Source of the expected password for a username.
pub trait CredentialStore: Send + Sync {
    fn password_for(&self, username: &str) -> Option<String>;
}

/// Passwords kept in environment variables named after the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialStore for EnvCredentials {
    fn password_for(&self, username: &str) -> Option<String> {
        // not representable as a variable name
        if username.contains(['=', '\0']) {
            return None;
        }
        std::env::var(username).ok().filter(|p| !p.is_empty())
    }
}

impl CredentialStore for HashMap<String, String> {
    fn password_for(&self, username: &str) -> Option<String> {
        self.get(username).filter(|p| !p.is_empty()).cloned()
    }
}

pub struct BasicAuthorizer<C> {
    credentials: C,
}

impl<C: CredentialStore> BasicAuthorizer<C> {
    pub fn new(credentials: C) -> Self {
        Self { credentials }
    }

    /// The authenticated username, or why the header does not authenticate.
    pub fn authenticate(&self, header: Option<&str>) -> Result<String, AuthError> {
        let header = header.ok_or(AuthError::MissingHeader)?;
        let Credentials { username, password } = Credentials::from_header(header)?;

        let Some(stored) = self.credentials.password_for(&username) else {
            return Err(AuthError::UnknownUser { username });
        };
        if stored != password {
            return Err(AuthError::PasswordMismatch { username });
        }
        Ok(username)
    }

    /// Allow the route for a valid caller; deny it as `anonymous` otherwise.
    #[instrument(skip_all, fields(route = %event.route_arn))]
    pub fn authorize(&self, event: &AuthorizerEvent) -> AuthResponse {
        match self.authenticate(event.authorization()) {
            Ok(username) => {
                info!(username = %username, "authorized");
                AuthResponse::new(username, &event.route_arn, Effect::Allow)
            }
            Err(err) => {
                warn!(error = %err, "denied");
                AuthResponse::new(ANONYMOUS, &event.route_arn, Effect::Deny)
            }
        }
    }
}
