//! Permission checks applied before an agent executes.
//!
//! Checks run against a [`RequestContext`], a framework-neutral view of the
//! caller: whether they authenticated, who they are, and which named grants
//! they hold. How a context is derived from a request is the embedding
//! application's concern (see the context provider in [`crate::http`]).

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::AgentError;

/// The caller's identity and grants, as seen by permission checks.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub grants: HashSet<String>,
}

impl RequestContext {
    /// Context for an unauthenticated caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for an authenticated caller.
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            user_id: Some(user_id.into()),
            grants: HashSet::new(),
        }
    }

    pub fn with_grant(mut self, grant: impl Into<String>) -> Self {
        self.grants.insert(grant.into());
        self
    }
}

/// A permission check on agent execution.
pub trait Permission: Send + Sync {
    /// Whether the context may execute the agent.
    fn allows(&self, context: &RequestContext, slug: &str) -> bool;

    /// Message returned to the caller when the check fails.
    fn denied_message(&self, _context: &RequestContext, slug: &str) -> String {
        format!("You do not have permission to execute agent '{slug}'")
    }
}

/// Allows every request. The default when an agent declares no permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAny;

impl Permission for AllowAny {
    fn allows(&self, _context: &RequestContext, _slug: &str) -> bool {
        true
    }
}

/// Requires an authenticated caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireAuthenticated;

impl Permission for RequireAuthenticated {
    fn allows(&self, context: &RequestContext, _slug: &str) -> bool {
        context.authenticated
    }

    fn denied_message(&self, _context: &RequestContext, _slug: &str) -> String {
        "Authentication required to execute this agent".to_string()
    }
}

/// Requires an authenticated caller holding a named grant.
#[derive(Debug, Clone)]
pub struct RequirePermission {
    grant: String,
}

impl RequirePermission {
    pub fn new(grant: impl Into<String>) -> Self {
        Self {
            grant: grant.into(),
        }
    }
}

impl Permission for RequirePermission {
    fn allows(&self, context: &RequestContext, _slug: &str) -> bool {
        context.authenticated && context.grants.contains(&self.grant)
    }

    fn denied_message(&self, _context: &RequestContext, slug: &str) -> String {
        format!(
            "You do not have the required permission '{}' to execute agent '{slug}'",
            self.grant
        )
    }
}

/// Passes when every inner permission passes.
pub struct AllOf {
    inner: Vec<Arc<dyn Permission>>,
}

impl AllOf {
    pub fn new(inner: Vec<Arc<dyn Permission>>) -> Result<Self, AgentError> {
        if inner.is_empty() {
            return Err(AgentError::EmptyComposite);
        }
        Ok(Self { inner })
    }
}

impl Permission for AllOf {
    fn allows(&self, context: &RequestContext, slug: &str) -> bool {
        self.inner
            .iter()
            .all(|permission| permission.allows(context, slug))
    }

    /// The first failing inner permission explains the denial.
    fn denied_message(&self, context: &RequestContext, slug: &str) -> String {
        for permission in &self.inner {
            if !permission.allows(context, slug) {
                return permission.denied_message(context, slug);
            }
        }
        format!("You do not have permission to execute agent '{slug}'")
    }
}

/// Passes when any inner permission passes.
pub struct AnyOf {
    inner: Vec<Arc<dyn Permission>>,
}

impl AnyOf {
    pub fn new(inner: Vec<Arc<dyn Permission>>) -> Result<Self, AgentError> {
        if inner.is_empty() {
            return Err(AgentError::EmptyComposite);
        }
        Ok(Self { inner })
    }
}

impl Permission for AnyOf {
    fn allows(&self, context: &RequestContext, slug: &str) -> bool {
        self.inner
            .iter()
            .any(|permission| permission.allows(context, slug))
    }
}
