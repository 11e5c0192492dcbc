//! Named operations callable over HTTP or stdio.

pub mod stdio;

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::{Credential, CredentialResolver, ForwardedToken};
use crate::model::component::ListComponentsRequest;
use crate::model::issue::{IssueDetailsRequest, IssueLinksRequest, ListIssuesRequest};
use crate::service::{IssueQueryService, ServiceError};

/// Per-call inputs handed to a tool handler.
pub struct ToolContext {
    pub service: Arc<IssueQueryService>,
    pub credential: Option<Credential>,
}

pub type ToolHandler = for<'a> fn(&'a ToolContext, Value) -> BoxFuture<'a, Result<Value, ServiceError>>;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

struct ToolEntry {
    descriptor: ToolDescriptor,
    handler: ToolHandler,
}

/// Missing or `null` arguments read as `{}` so every field takes its default.
fn arguments<T: DeserializeOwned>(args: Value) -> Result<T, ServiceError> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(args).map_err(|e| ServiceError::Validation(e.to_string()))
}

fn to_json<T: Serialize>(response: T) -> Result<Value, ServiceError> {
    serde_json::to_value(response).map_err(|e| ServiceError::Internal(e.to_string()))
}

fn list_jira_issues(ctx: &ToolContext, args: Value) -> BoxFuture<'_, Result<Value, ServiceError>> {
    Box::pin(async move {
        let request: ListIssuesRequest = arguments(args)?;
        to_json(ctx.service.list_issues(request, ctx.credential.as_ref()).await?)
    })
}

fn get_jira_issue_details(ctx: &ToolContext, args: Value) -> BoxFuture<'_, Result<Value, ServiceError>> {
    Box::pin(async move {
        let request: IssueDetailsRequest = arguments(args)?;
        to_json(
            ctx.service
                .get_issue_details(&request.issue_keys, ctx.credential.as_ref())
                .await?,
        )
    })
}

fn get_jira_project_summary(ctx: &ToolContext, _args: Value) -> BoxFuture<'_, Result<Value, ServiceError>> {
    Box::pin(async move { to_json(ctx.service.get_project_summary(ctx.credential.as_ref()).await?) })
}

fn get_jira_issue_links(ctx: &ToolContext, args: Value) -> BoxFuture<'_, Result<Value, ServiceError>> {
    Box::pin(async move {
        let request: IssueLinksRequest = arguments(args)?;
        to_json(
            ctx.service
                .get_issue_links(&request.issue_key, ctx.credential.as_ref())
                .await?,
        )
    })
}

fn list_jira_components(ctx: &ToolContext, args: Value) -> BoxFuture<'_, Result<Value, ServiceError>> {
    Box::pin(async move {
        let request: ListComponentsRequest = arguments(args)?;
        to_json(ctx.service.list_components(request, ctx.credential.as_ref()).await?)
    })
}

/// Fixed table of tool name to handler.
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        let mut registry = Self { entries: Vec::new() };
        registry.register(
            "list_jira_issues",
            "List issues filtered by project, type, status, priority, text, components and date windows",
            list_jira_issues,
        );
        registry.register(
            "get_jira_issue_details",
            "Full records, comments and links for a list of issue keys",
            get_jira_issue_details,
        );
        registry.register(
            "get_jira_project_summary",
            "Issue counts per project, status and priority",
            get_jira_project_summary,
        );
        registry.register(
            "get_jira_issue_links",
            "Inward and outward links of one issue",
            get_jira_issue_links,
        );
        registry.register(
            "list_jira_components",
            "List components, optionally restricted to one issue",
            list_jira_components,
        );
        registry
    }

    fn register(&mut self, name: &'static str, description: &'static str, handler: ToolHandler) {
        self.entries.push(ToolEntry {
            descriptor: ToolDescriptor {
                name: name.to_string(),
                description: description.to_string(),
            },
            handler,
        });
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.entries.iter().map(|entry| entry.descriptor.clone()).collect()
    }

    #[instrument(skip(self, ctx, args))]
    pub async fn dispatch(&self, name: &str, ctx: &ToolContext, args: Value) -> Result<Value, ServiceError> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.descriptor.name == name)
            .ok_or_else(|| ServiceError::UnknownTool(name.to_string()))?;

        info!("dispatching tool");
        let result = (entry.handler)(ctx, args).await;
        if let Err(e) = &result {
            warn!(error = %e, "tool call failed");
        }
        result
    }
}

/// Everything a transport needs to serve tool calls.
pub struct ToolServer {
    pub registry: ToolRegistry,
    pub service: Arc<IssueQueryService>,
    pub resolver: CredentialResolver,
}

impl ToolServer {
    pub fn new(service: Arc<IssueQueryService>, resolver: CredentialResolver) -> Self {
        Self {
            registry: ToolRegistry::new(),
            service,
            resolver,
        }
    }

    /// Resolves the credential for this call, then dispatches.
    pub async fn call(&self, name: &str, args: Value, forwarded: Option<&ForwardedToken>) -> Result<Value, ServiceError> {
        let credential = self
            .resolver
            .resolve(forwarded)
            .map_err(|e| ServiceError::Authentication(format!("Failed to generate key-pair token: {}", e)))?;

        let ctx = ToolContext {
            service: self.service.clone(),
            credential,
        };
        self.registry.dispatch(name, &ctx, args).await
    }
}
