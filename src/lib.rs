//! Sentry resource provider
//!
//! This crate implements the resource lifecycle for two Sentry resources,
//! exposed to an infrastructure-as-code host: **projects** and project
//! **client keys** (DSN credentials).
//!
//! # Overview
//!
//! The crate provides:
//!
//! - **SentryProvider**: the dispatcher that routes lifecycle calls by
//!   resource-type token (`sentry:index:Project`, `sentry:index:ClientKey`)
//! - **Resource handlers**: check / diff / create / read / update / delete
//!   behind the [`ResourceLifecycle`] trait
//! - **SentryApi trait**: the capability interface to the Sentry REST API,
//!   with a reqwest-backed [`SentryClient`] and a closure-driven
//!   [`testing::MockSentryApi`] for tests
//! - **ID codec**: opaque `organization/project` and
//!   `organization/project/keyId` IDs with strict parsing
//! - **Logging**: `tracing` setup writing to stderr
//!
//! # Quick Start
//!
//! ```ignore
//! use sentry_provider::{init_logging, ProviderConfig, SentryProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let provider = SentryProvider::configure(&ProviderConfig {
//!         token: std::env::var("SENTRY_TOKEN")?,
//!         api_url: None,
//!     })?;
//!
//!     let result = provider
//!         .read("sentry:index:Project", "my-org/my-project")
//!         .await?;
//!     println!("{result:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Lifecycle contract
//!
//! - `check` collects every validation failure as data; it never errors on
//!   bad user input.
//! - `diff` decides between in-place update and replacement; identity fields
//!   (organization, slug, team) force delete-before-replace.
//! - `read` returns [`ReadResult::Absent`] when the resource is gone
//!   upstream, so the host drops it from state instead of failing.
//! - IDs are opaque to the host and round-trip exactly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod client;
pub mod diff;
pub mod error;
pub mod id;
pub mod logging;
pub mod provider;
pub mod resources;
pub mod testing;
pub mod validation;

// Re-export main types at crate root
pub use api::{ApiError, SentryApi};
pub use client::{SentryClient, DEFAULT_API_URL};
pub use diff::{DiffKind, ResourceDiff};
pub use error::ProviderError;
pub use id::{ClientKeyId, ProjectId};
pub use logging::{init_logging, try_init_logging};
pub use provider::{
    diff_config, CheckResult, ProviderConfig, ResourceKind, SentryProvider,
    CLIENT_KEY_TYPE_TOKEN, PROJECT_TYPE_TOKEN,
};
pub use resources::{Created, Properties, ReadResult, ResourceLifecycle};
pub use validation::CheckFailure;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
