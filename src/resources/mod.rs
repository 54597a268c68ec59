//! Resource handlers.
//!
//! Each resource kind implements [`ResourceLifecycle`], the shared capability
//! interface the dispatcher routes to. Handlers talk to Sentry exclusively
//! through the [`SentryApi`] trait passed into each call.

pub mod keys;
pub mod project;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::api::SentryApi;
use crate::diff::ResourceDiff;
use crate::error::ProviderError;
use crate::validation::CheckFailure;

/// A property bag keyed by camelCase field names.
pub type Properties = Map<String, Value>;

/// The outcome of a successful `Create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    /// Opaque ID the caller's state store persists for this resource.
    pub id: String,
    /// Output properties.
    pub outputs: Properties,
}

/// The outcome of a `Read`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    /// The resource exists upstream.
    Present {
        /// Canonical ID, rebuilt from API-returned slugs (may differ from
        /// the ID that was read).
        id: String,
        /// Current live state.
        outputs: Properties,
    },
    /// The resource no longer exists upstream; the caller should drop it
    /// from tracked state. Not an error.
    Absent,
}

/// The CRUD lifecycle every resource kind implements.
#[async_trait]
pub trait ResourceLifecycle: Send + Sync {
    /// Validate proposed inputs, collecting every failure.
    fn check(&self, news: &Properties) -> Vec<CheckFailure>;

    /// Diff prior against proposed inputs.
    fn diff(&self, olds: &Properties, news: &Properties) -> ResourceDiff;

    /// Create the resource upstream and return its ID and outputs.
    async fn create(
        &self,
        api: &dyn SentryApi,
        inputs: &Properties,
    ) -> Result<Created, ProviderError>;

    /// Read live state by opaque ID.
    async fn read(&self, api: &dyn SentryApi, id: &str) -> Result<ReadResult, ProviderError>;

    /// Update the resource in place and return the new state.
    async fn update(
        &self,
        api: &dyn SentryApi,
        id: &str,
        olds: &Properties,
        news: &Properties,
    ) -> Result<Properties, ProviderError>;

    /// Delete the resource by opaque ID.
    async fn delete(&self, api: &dyn SentryApi, id: &str) -> Result<(), ProviderError>;
}

/// Fetch a required string input. Inputs reaching Create/Update have passed
/// Check, so a miss here is a host-contract violation, not a user error.
pub(crate) fn required_str<'a>(
    inputs: &'a Properties,
    key: &str,
) -> Result<&'a str, ProviderError> {
    inputs
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::InvalidInput(key.to_string()))
}

/// Fetch an optional string input, treating null as absent.
pub(crate) fn optional_str<'a>(inputs: &'a Properties, key: &str) -> Option<&'a str> {
    inputs.get(key).and_then(Value::as_str)
}
