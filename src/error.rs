//! Error types for the Sentry provider.

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur while servicing a lifecycle call.
///
/// Validation problems are not represented here: `Check` collects them as
/// [`CheckFailure`](crate::validation::CheckFailure) values and returns them
/// as data, never through the error path.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An opaque resource ID did not have the expected shape.
    #[error("malformed resource ID: {0:?}")]
    MalformedId(String),

    /// The request carried a resource-type token this provider does not serve.
    #[error("unknown resource type: {0:?}")]
    UnknownResourceType(String),

    /// A field changed that has no update path. Diff should have forced a
    /// replacement instead, so reaching this is a provider/schema bug.
    #[error("unsupported change: {0}")]
    UnsupportedChange(String),

    /// An upstream Sentry API call failed, wrapped with the operation that
    /// issued it.
    #[error("{context}: {source}")]
    Api {
        /// Which call failed, and for which resource.
        context: String,
        /// The underlying API failure.
        source: ApiError,
    },

    /// A lifecycle call carried an input that Check would have rejected.
    /// The host is expected to run Check before Create/Update.
    #[error("missing or invalid input {0:?}")]
    InvalidInput(String),

    /// A property bag could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProviderError {
    /// Wrap an [`ApiError`] with the operation context that produced it.
    pub fn api(context: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::MalformedId("just-one-segment".to_string());
        assert_eq!(
            format!("{}", err),
            "malformed resource ID: \"just-one-segment\""
        );

        let err = ProviderError::UnknownResourceType("sentry:index:Widget".to_string());
        assert_eq!(
            format!("{}", err),
            "unknown resource type: \"sentry:index:Widget\""
        );

        let err = ProviderError::UnsupportedChange("teamSlug".to_string());
        assert_eq!(format!("{}", err), "unsupported change: teamSlug");
    }

    #[test]
    fn test_api_error_context() {
        let err = ProviderError::api(
            "could not CreateProject \"my-proj\"",
            ApiError::Status {
                status: 403,
                body: "forbidden".to_string(),
            },
        );
        let rendered = format!("{}", err);
        assert!(rendered.starts_with("could not CreateProject"));
        assert!(rendered.contains("403"));
    }
}
