//! # corpus-agents
//!
//! Named task registration and HTTP execution for the corpus pipeline.
//!
//! An [`Agent`] is a named unit of work callable over HTTP with JSON
//! arguments. Agents live in an [`AgentRegistry`], carry a declared
//! [`Permission`], and execute through the router in [`http`]:
//! `POST /agents/{slug}` with `{"arguments": {...}}`.

pub mod agent;
pub mod error;
pub mod http;
pub mod permission;

pub use agent::{validate_slug, Agent, AgentParameter, AgentRegistry, ParameterKind};
pub use error::AgentError;
pub use http::{router, serve, AnonymousContext, ContextProvider};
pub use permission::{
    AllOf, AllowAny, AnyOf, Permission, RequireAuthenticated, RequirePermission, RequestContext,
};
