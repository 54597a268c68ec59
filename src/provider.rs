//! The provider dispatcher.
//!
//! [`SentryProvider`] owns the configured API client and routes every
//! lifecycle call to the handler for the request's resource-type token. The
//! client is injected as an `Arc<dyn SentryApi>`, so tests drive the full
//! dispatch path against [`MockSentryApi`](crate::testing::MockSentryApi).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::SentryApi;
use crate::client::{SentryClient, DEFAULT_API_URL};
use crate::diff::ResourceDiff;
use crate::error::ProviderError;
use crate::resources::keys::ClientKeyResource;
use crate::resources::project::ProjectResource;
use crate::resources::{Created, Properties, ReadResult, ResourceLifecycle};
use crate::validation::CheckFailure;

/// Resource-type token for projects.
pub const PROJECT_TYPE_TOKEN: &str = "sentry:index:Project";
/// Resource-type token for client keys.
pub const CLIENT_KEY_TYPE_TOKEN: &str = "sentry:index:ClientKey";

static PROJECT: ProjectResource = ProjectResource;
static CLIENT_KEY: ClientKeyResource = ClientKeyResource;

/// The resource kinds this provider serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A Sentry project.
    Project,
    /// A project client key.
    ClientKey,
}

impl ResourceKind {
    /// Parse a resource-type token.
    pub fn from_token(token: &str) -> Result<Self, ProviderError> {
        match token {
            PROJECT_TYPE_TOKEN => Ok(Self::Project),
            CLIENT_KEY_TYPE_TOKEN => Ok(Self::ClientKey),
            other => Err(ProviderError::UnknownResourceType(other.to_string())),
        }
    }

    /// The token naming this kind.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Project => PROJECT_TYPE_TOKEN,
            Self::ClientKey => CLIENT_KEY_TYPE_TOKEN,
        }
    }

    fn handler(&self) -> &'static dyn ResourceLifecycle {
        match self {
            Self::Project => &PROJECT,
            Self::ClientKey => &CLIENT_KEY,
        }
    }
}

/// Provider-level configuration supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Sentry auth token. Needs `project:admin` and `org:read` scopes.
    pub token: String,
    /// API base URL override; defaults to hosted Sentry when absent.
    #[serde(rename = "apiUrl", default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// The outcome of `check`: the validated inputs plus any failures.
///
/// Inputs are echoed back verbatim; this provider applies no defaults or
/// normalization during check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// The inputs as the host proposed them.
    pub inputs: Properties,
    /// Per-property validation failures, sorted by property name. Empty
    /// means the inputs are acceptable.
    pub failures: Vec<CheckFailure>,
}

/// Diff two provider configurations, returning the changed config keys.
pub fn diff_config(olds: &ProviderConfig, news: &ProviderConfig) -> Vec<String> {
    let mut diffs = Vec::new();
    if olds.token != news.token {
        diffs.push("sentryToken".to_string());
    }
    if olds.api_url != news.api_url {
        diffs.push("sentryApiUrl".to_string());
    }
    diffs
}

/// Routes lifecycle calls to resource handlers over one configured API client.
pub struct SentryProvider {
    api: Arc<dyn SentryApi>,
}

impl SentryProvider {
    /// Build a provider over an already-constructed API client.
    pub fn new(api: Arc<dyn SentryApi>) -> Self {
        Self { api }
    }

    /// Build a provider from host-supplied configuration.
    pub fn configure(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_url = config.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        info!(api_url, "configuring sentry provider");
        let client = SentryClient::new(api_url, config.token.clone())
            .map_err(|e| ProviderError::api("could not configure API client", e))?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Validate proposed inputs for a resource type.
    pub fn check(
        &self,
        resource_type: &str,
        news: &Properties,
    ) -> Result<CheckResult, ProviderError> {
        let kind = ResourceKind::from_token(resource_type)?;
        let failures = kind.handler().check(news);
        Ok(CheckResult {
            inputs: news.clone(),
            failures,
        })
    }

    /// Diff prior against proposed inputs for a resource type.
    pub fn diff(
        &self,
        resource_type: &str,
        olds: &Properties,
        news: &Properties,
    ) -> Result<ResourceDiff, ProviderError> {
        let kind = ResourceKind::from_token(resource_type)?;
        Ok(kind.handler().diff(olds, news))
    }

    /// Create a resource.
    pub async fn create(
        &self,
        resource_type: &str,
        inputs: &Properties,
    ) -> Result<Created, ProviderError> {
        let kind = ResourceKind::from_token(resource_type)?;
        let created = kind.handler().create(self.api.as_ref(), inputs).await?;
        info!(token = kind.token(), id = %created.id, "created resource");
        Ok(created)
    }

    /// Read the live state of a resource by ID.
    pub async fn read(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<ReadResult, ProviderError> {
        let kind = ResourceKind::from_token(resource_type)?;
        kind.handler().read(self.api.as_ref(), id).await
    }

    /// Update a resource in place.
    pub async fn update(
        &self,
        resource_type: &str,
        id: &str,
        olds: &Properties,
        news: &Properties,
    ) -> Result<Properties, ProviderError> {
        let kind = ResourceKind::from_token(resource_type)?;
        let outputs = kind
            .handler()
            .update(self.api.as_ref(), id, olds, news)
            .await?;
        info!(token = kind.token(), id, "updated resource");
        Ok(outputs)
    }

    /// Delete a resource by ID.
    pub async fn delete(&self, resource_type: &str, id: &str) -> Result<(), ProviderError> {
        let kind = ResourceKind::from_token(resource_type)?;
        kind.handler().delete(self.api.as_ref(), id).await?;
        info!(token = kind.token(), id, "deleted resource");
        Ok(())
    }
}
