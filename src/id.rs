//! Opaque resource ID codec.
//!
//! The caller's state store hands IDs back verbatim on every lifecycle call,
//! so the formats here must stay stable across provider versions: existing
//! managed resources are addressed by nothing else.
//!
//! - Project: `{organizationSlug}/{slug}`
//! - Client key: `{organizationSlug}/{projectSlug}/{keyId}`

use std::fmt;
use std::str::FromStr;

use crate::error::ProviderError;

/// Identity of a project: `(organizationSlug, slug)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectId {
    /// Slug of the owning organization.
    pub organization_slug: String,
    /// Project slug, unique within the organization.
    pub slug: String,
}

impl ProjectId {
    /// Build a project ID from its two components.
    pub fn new(organization_slug: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            organization_slug: organization_slug.into(),
            slug: slug.into(),
        }
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization_slug, self.slug)
    }
}

impl FromStr for ProjectId {
    type Err = ProviderError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        match split_segments(id, 2)?.as_slice() {
            [org, slug] => Ok(Self::new(*org, *slug)),
            _ => Err(ProviderError::MalformedId(id.to_string())),
        }
    }
}

/// Identity of a client key: `(organizationSlug, projectSlug, keyId)`.
///
/// `key_id` is the local identifier issued by Sentry when the key is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKeyId {
    /// Slug of the owning organization.
    pub organization_slug: String,
    /// Slug of the owning project.
    pub project_slug: String,
    /// Key identifier assigned by the API.
    pub key_id: String,
}

impl ClientKeyId {
    /// Build a client key ID from its three components.
    pub fn new(
        organization_slug: impl Into<String>,
        project_slug: impl Into<String>,
        key_id: impl Into<String>,
    ) -> Self {
        Self {
            organization_slug: organization_slug.into(),
            project_slug: project_slug.into(),
            key_id: key_id.into(),
        }
    }
}

impl fmt::Display for ClientKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.organization_slug, self.project_slug, self.key_id
        )
    }
}

impl FromStr for ClientKeyId {
    type Err = ProviderError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        match split_segments(id, 3)?.as_slice() {
            [org, proj, key] => Ok(Self::new(*org, *proj, *key)),
            _ => Err(ProviderError::MalformedId(id.to_string())),
        }
    }
}

/// Split an ID into exactly `count` non-empty `/`-delimited segments.
fn split_segments(id: &str, count: usize) -> Result<Vec<&str>, ProviderError> {
    let parts: Vec<&str> = id.split('/').collect();
    if parts.len() != count || parts.iter().any(|p| p.is_empty()) {
        return Err(ProviderError::MalformedId(id.to_string()));
    }
    Ok(parts)
}
