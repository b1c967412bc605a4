//! Agent trait and registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::AgentError;
use crate::permission::{AllowAny, Permission};

/// Declared type of an agent parameter, surfaced to callers as metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Integer,
    Float,
    Boolean,
    Object,
}

/// One declared parameter of an agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentParameter {
    pub name: String,
    pub kind: ParameterKind,
    pub description: String,
}

impl AgentParameter {
    pub fn new(
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
        }
    }
}

/// A named task executable over HTTP with JSON arguments.
///
/// The slug identifies the agent in URLs and the registry; it must consist
/// of letters, numbers, underscores or hyphens.
pub trait Agent: Send + Sync {
    fn slug(&self) -> &str;

    fn description(&self) -> &str;

    /// Declared parameters. Metadata only; `execute` receives the raw
    /// argument map and validates what it needs.
    fn parameters(&self) -> Vec<AgentParameter> {
        Vec::new()
    }

    /// Permission gating execution. Defaults to allowing every request.
    fn permission(&self) -> Arc<dyn Permission> {
        Arc::new(AllowAny)
    }

    fn execute(&self, arguments: &Map<String, Value>) -> Result<Value, AgentError>;
}

/// Validate a slug at registration time.
pub fn validate_slug(slug: &str) -> Result<(), AgentError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AgentError::InvalidSlug(slug.to_string()))
    }
}

/// Registry mapping agent slugs to agents.
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, Arc<dyn Agent>>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
        }
    }

    /// Register an agent under its slug.
    ///
    /// Registering the same slug again replaces the previous agent.
    pub fn register(&self, agent: Arc<dyn Agent>) -> Result<(), AgentError> {
        validate_slug(agent.slug())?;
        info!(slug = %agent.slug(), "Registering agent");
        let mut agents = self.agents.write().unwrap();
        agents.insert(agent.slug().to_string(), agent);
        Ok(())
    }

    /// Look up an agent by slug.
    pub fn get(&self, slug: &str) -> Option<Arc<dyn Agent>> {
        self.agents.read().unwrap().get(slug).cloned()
    }

    /// Registered agents, sorted by slug.
    pub fn list(&self) -> Vec<Arc<dyn Agent>> {
        let mut agents: Vec<Arc<dyn Agent>> =
            self.agents.read().unwrap().values().cloned().collect();
        agents.sort_by(|a, b| a.slug().cmp(b.slug()));
        agents
    }

    pub fn len(&self) -> usize {
        self.agents.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
