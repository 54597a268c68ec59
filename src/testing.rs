//! Test doubles for provider implementations.
//!
//! [`MockSentryApi`] stands in for the real REST client in handler and
//! dispatcher tests: set a closure per operation the test expects, leave the
//! rest unset. Calling an unset operation panics with its name, which makes
//! an unexpected API call an immediate test failure.
//!
//! # Example
//!
//! ```
//! use sentry_provider::testing::MockSentryApi;
//! use sentry_provider::api::Project;
//!
//! let api = MockSentryApi {
//!     get_project: Some(Box::new(|org, slug| {
//!         assert_eq!(org, "the-org");
//!         Ok(Project {
//!             slug: slug.to_string(),
//!             name: "a name".to_string(),
//!             ..Default::default()
//!         })
//!     })),
//!     ..Default::default()
//! };
//! ```

use async_trait::async_trait;

use crate::api::{ApiError, ClientKey, Organization, Project, ProjectUpdate, SentryApi, Team};

type CreateProjectFn =
    dyn Fn(&str, &str, &str, &str) -> Result<Project, ApiError> + Send + Sync;
type GetProjectFn = dyn Fn(&str, &str) -> Result<Project, ApiError> + Send + Sync;
type UpdateProjectFn =
    dyn Fn(&str, &str, &ProjectUpdate) -> Result<Project, ApiError> + Send + Sync;
type DeleteProjectFn = dyn Fn(&str, &str) -> Result<(), ApiError> + Send + Sync;
type CreateClientKeyFn = dyn Fn(&str, &str, &str) -> Result<ClientKey, ApiError> + Send + Sync;
type GetClientKeysFn = dyn Fn(&str, &str) -> Result<Vec<ClientKey>, ApiError> + Send + Sync;
type DeleteClientKeyFn = dyn Fn(&str, &str, &str) -> Result<(), ApiError> + Send + Sync;
type GetOrganizationFn = dyn Fn(&str) -> Result<Organization, ApiError> + Send + Sync;
type GetTeamFn = dyn Fn(&str, &str) -> Result<Team, ApiError> + Send + Sync;

/// A [`SentryApi`] implementation backed by per-operation closures.
#[derive(Default)]
#[allow(missing_docs)]
pub struct MockSentryApi {
    pub create_project: Option<Box<CreateProjectFn>>,
    pub get_project: Option<Box<GetProjectFn>>,
    pub update_project: Option<Box<UpdateProjectFn>>,
    pub delete_project: Option<Box<DeleteProjectFn>>,
    pub create_client_key: Option<Box<CreateClientKeyFn>>,
    pub get_client_keys: Option<Box<GetClientKeysFn>>,
    pub delete_client_key: Option<Box<DeleteClientKeyFn>>,
    pub get_organization: Option<Box<GetOrganizationFn>>,
    pub get_team: Option<Box<GetTeamFn>>,
}

fn unset(operation: &str) -> ! {
    panic!("{operation} not set on MockSentryApi")
}

#[async_trait]
impl SentryApi for MockSentryApi {
    async fn create_project(
        &self,
        organization_slug: &str,
        team_slug: &str,
        name: &str,
        slug: &str,
    ) -> Result<Project, ApiError> {
        match &self.create_project {
            Some(f) => f(organization_slug, team_slug, name, slug),
            None => unset("create_project"),
        }
    }

    async fn get_project(&self, organization_slug: &str, slug: &str) -> Result<Project, ApiError> {
        match &self.get_project {
            Some(f) => f(organization_slug, slug),
            None => unset("get_project"),
        }
    }

    async fn update_project(
        &self,
        organization_slug: &str,
        slug: &str,
        update: &ProjectUpdate,
    ) -> Result<Project, ApiError> {
        match &self.update_project {
            Some(f) => f(organization_slug, slug, update),
            None => unset("update_project"),
        }
    }

    async fn delete_project(&self, organization_slug: &str, slug: &str) -> Result<(), ApiError> {
        match &self.delete_project {
            Some(f) => f(organization_slug, slug),
            None => unset("delete_project"),
        }
    }

    async fn create_client_key(
        &self,
        organization_slug: &str,
        project_slug: &str,
        name: &str,
    ) -> Result<ClientKey, ApiError> {
        match &self.create_client_key {
            Some(f) => f(organization_slug, project_slug, name),
            None => unset("create_client_key"),
        }
    }

    async fn get_client_keys(
        &self,
        organization_slug: &str,
        project_slug: &str,
    ) -> Result<Vec<ClientKey>, ApiError> {
        match &self.get_client_keys {
            Some(f) => f(organization_slug, project_slug),
            None => unset("get_client_keys"),
        }
    }

    async fn delete_client_key(
        &self,
        organization_slug: &str,
        project_slug: &str,
        key_id: &str,
    ) -> Result<(), ApiError> {
        match &self.delete_client_key {
            Some(f) => f(organization_slug, project_slug, key_id),
            None => unset("delete_client_key"),
        }
    }

    async fn get_organization(&self, slug: &str) -> Result<Organization, ApiError> {
        match &self.get_organization {
            Some(f) => f(slug),
            None => unset("get_organization"),
        }
    }

    async fn get_team(&self, organization_slug: &str, team_slug: &str) -> Result<Team, ApiError> {
        match &self.get_team {
            Some(f) => f(organization_slug, team_slug),
            None => unset("get_team"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_dispatches_to_closure() {
        let api = MockSentryApi {
            get_organization: Some(Box::new(|slug| {
                Ok(Organization {
                    slug: slug.to_string(),
                    name: None,
                })
            })),
            ..Default::default()
        };
        let org = tokio_test::block_on(api.get_organization("the-org")).unwrap();
        assert_eq!(org.slug, "the-org");
    }

    #[test]
    #[should_panic(expected = "get_team not set")]
    fn test_unset_operation_panics() {
        let api = MockSentryApi::default();
        let _ = tokio_test::block_on(api.get_team("org", "team"));
    }
}
