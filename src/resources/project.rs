//! The Project resource handler.
//!
//! A project is identified by `(organizationSlug, slug)`. Name and the
//! notification settings can change in place; the organization, the slug and
//! the owning team are part of the identity (the API has no safe "move to
//! another team" call), so changing them destroys and recreates the project.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::api::{ProjectUpdate, SentryApi};
use crate::diff::{diff_inputs, ResourceDiff};
use crate::error::ProviderError;
use crate::id::ProjectId;
use crate::resources::{
    optional_str, required_str, Created, Properties, ReadResult, ResourceLifecycle,
};
use crate::validation::{collect_failures, CheckFailure};

const REQUIRED_INPUTS: &[&str] = &["organizationSlug", "name", "slug", "teamSlug"];
const OPTIONAL_INPUTS: &[&str] = &["defaultEnvironment", "subjectPrefix", "subjectTemplate"];
const TRACKED_INPUTS: &[&str] = &[
    "organizationSlug",
    "name",
    "slug",
    "teamSlug",
    "defaultEnvironment",
    "subjectPrefix",
    "subjectTemplate",
];
const REPLACE_INPUTS: &[&str] = &["organizationSlug", "slug", "teamSlug"];
const UPDATABLE_INPUTS: &[&str] = &["name", "defaultEnvironment", "subjectPrefix", "subjectTemplate"];

/// Label Sentry gives the client key it provisions with every new project.
const DEFAULT_KEY_LABEL: &str = "Default";

/// Handler for `sentry:index:Project`.
pub struct ProjectResource;

#[async_trait]
impl ResourceLifecycle for ProjectResource {
    fn check(&self, news: &Properties) -> Vec<CheckFailure> {
        collect_failures(news, REQUIRED_INPUTS, OPTIONAL_INPUTS)
    }

    fn diff(&self, olds: &Properties, news: &Properties) -> ResourceDiff {
        diff_inputs(olds, news, TRACKED_INPUTS, REPLACE_INPUTS)
    }

    async fn create(
        &self,
        api: &dyn SentryApi,
        inputs: &Properties,
    ) -> Result<Created, ProviderError> {
        let organization_slug = required_str(inputs, "organizationSlug")?;
        let name = required_str(inputs, "name")?;
        let slug = required_str(inputs, "slug")?;
        let team_slug = required_str(inputs, "teamSlug")?;

        let mut project = api
            .create_project(organization_slug, team_slug, name, slug)
            .await
            .map_err(|e| ProviderError::api(format!("could not CreateProject {slug:?}"), e))?;

        // The creation endpoint only accepts name and slug; notification
        // settings go through a follow-up update. The API may have
        // normalized the slug, so address the project by what it returned.
        let update = update_from_inputs(&project.name, inputs);
        if update.default_environment.is_some()
            || update.subject_prefix.is_some()
            || update.subject_template.is_some()
        {
            project = api
                .update_project(organization_slug, &project.slug, &update)
                .await
                .map_err(|e| {
                    ProviderError::api(format!("could not UpdateProject {:?}", project.slug), e)
                })?;
        }

        let default_dsn_public =
            default_public_dsn(api, organization_slug, &project.slug).await?;

        let id = ProjectId::new(organization_slug, &project.slug);
        let mut outputs = Properties::new();
        outputs.insert(
            "organizationSlug".to_string(),
            Value::from(organization_slug),
        );
        outputs.insert("name".to_string(), Value::from(project.name.clone()));
        outputs.insert("slug".to_string(), Value::from(project.slug.clone()));
        outputs.insert("teamSlug".to_string(), Value::from(team_slug));
        insert_optional_outputs(&mut outputs, inputs);
        outputs.insert(
            "defaultDsnPublic".to_string(),
            Value::from(default_dsn_public),
        );

        Ok(Created {
            id: id.to_string(),
            outputs,
        })
    }

    async fn read(&self, api: &dyn SentryApi, id: &str) -> Result<ReadResult, ProviderError> {
        let parsed: ProjectId = id.parse()?;
        debug!(id, "reading project");

        let organization = api
            .get_organization(&parsed.organization_slug)
            .await
            .map_err(|e| {
                ProviderError::api(
                    format!("could not GetOrganization {:?}", parsed.organization_slug),
                    e,
                )
            })?;

        let project = match api.get_project(&organization.slug, &parsed.slug).await {
            Ok(project) => project,
            // Gone upstream: tell the caller to drop it from state.
            Err(e) if e.is_not_found() => return Ok(ReadResult::Absent),
            Err(e) => {
                return Err(ProviderError::api(
                    format!("could not GetProject {:?}", parsed.slug),
                    e,
                ))
            }
        };

        // The API is the source of truth for slugs; re-derive the ID from
        // what it returned rather than echoing the request.
        let canonical_org = project
            .organization
            .as_ref()
            .map(|o| o.slug.clone())
            .unwrap_or(organization.slug);
        let team_slug = project
            .team
            .as_ref()
            .map(|t| t.slug.clone())
            .unwrap_or_default();

        let default_dsn_public = default_public_dsn(api, &canonical_org, &project.slug).await?;

        let mut outputs = Properties::new();
        outputs.insert(
            "organizationSlug".to_string(),
            Value::from(canonical_org.clone()),
        );
        outputs.insert("name".to_string(), Value::from(project.name.clone()));
        outputs.insert("slug".to_string(), Value::from(project.slug.clone()));
        outputs.insert("teamSlug".to_string(), Value::from(team_slug));
        if let Some(env) = &project.default_environment {
            outputs.insert("defaultEnvironment".to_string(), Value::from(env.clone()));
        }
        if let Some(prefix) = &project.subject_prefix {
            outputs.insert("subjectPrefix".to_string(), Value::from(prefix.clone()));
        }
        if let Some(template) = &project.subject_template {
            outputs.insert("subjectTemplate".to_string(), Value::from(template.clone()));
        }
        outputs.insert(
            "defaultDsnPublic".to_string(),
            Value::from(default_dsn_public),
        );

        Ok(ReadResult::Present {
            id: ProjectId::new(canonical_org, project.slug).to_string(),
            outputs,
        })
    }

    async fn update(
        &self,
        api: &dyn SentryApi,
        id: &str,
        olds: &Properties,
        news: &Properties,
    ) -> Result<Properties, ProviderError> {
        let parsed: ProjectId = id.parse()?;

        // Diff should have forced a replacement for anything outside the
        // updatable set; reaching here with such a change is a bug.
        let diff = self.diff(olds, news);
        if let Some(bad) = diff
            .diffs
            .iter()
            .find(|d| !UPDATABLE_INPUTS.contains(&d.as_str()))
        {
            return Err(ProviderError::UnsupportedChange(format!(
                "project field {bad:?} cannot be updated in place"
            )));
        }

        let name = required_str(news, "name")?;
        let mut update = update_from_inputs(name, news);
        // An optional field removed from the inputs must be cleared upstream;
        // omitting it from the PUT body would leave the old value in place and
        // the same diff would reappear on every refresh. Sentry clears these
        // fields when sent the empty string.
        if cleared(olds, news, "defaultEnvironment") {
            update.default_environment = Some(String::new());
        }
        if cleared(olds, news, "subjectPrefix") {
            update.subject_prefix = Some(String::new());
        }
        if cleared(olds, news, "subjectTemplate") {
            update.subject_template = Some(String::new());
        }
        api.update_project(&parsed.organization_slug, &parsed.slug, &update)
            .await
            .map_err(|e| {
                ProviderError::api(format!("could not UpdateProject {:?}", parsed.slug), e)
            })?;

        // The caller persists the proposed values; no re-read.
        Ok(news.clone())
    }

    async fn delete(&self, api: &dyn SentryApi, id: &str) -> Result<(), ProviderError> {
        let parsed: ProjectId = id.parse()?;
        api.delete_project(&parsed.organization_slug, &parsed.slug)
            .await
            .map_err(|e| {
                ProviderError::api(format!("could not DeleteProject {:?}", parsed.slug), e)
            })
    }
}

fn update_from_inputs(name: &str, inputs: &Properties) -> ProjectUpdate {
    ProjectUpdate {
        name: name.to_string(),
        default_environment: optional_str(inputs, "defaultEnvironment").map(str::to_string),
        subject_prefix: optional_str(inputs, "subjectPrefix").map(str::to_string),
        subject_template: optional_str(inputs, "subjectTemplate").map(str::to_string),
    }
}

fn cleared(olds: &Properties, news: &Properties, key: &str) -> bool {
    optional_str(olds, key).is_some() && optional_str(news, key).is_none()
}

fn insert_optional_outputs(outputs: &mut Properties, inputs: &Properties) {
    for key in OPTIONAL_INPUTS {
        if let Some(value) = optional_str(inputs, key) {
            outputs.insert(key.to_string(), Value::from(value));
        }
    }
}

/// Resolve the public DSN of the project's "Default" client key.
///
/// Sentry provisions the key with every new project, but if it is genuinely
/// missing this returns an empty string rather than failing; a later Read
/// picks the value up once the key exists.
async fn default_public_dsn(
    api: &dyn SentryApi,
    organization_slug: &str,
    project_slug: &str,
) -> Result<String, ProviderError> {
    let keys = api
        .get_client_keys(organization_slug, project_slug)
        .await
        .map_err(|e| {
            ProviderError::api(format!("could not GetClientKeys for {project_slug:?}"), e)
        })?;
    Ok(keys
        .into_iter()
        .find(|k| k.label == DEFAULT_KEY_LABEL)
        .map(|k| k.dsn.public)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ClientKey, Dsn, Organization, Project, Team};
    use crate::testing::MockSentryApi;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn bag(value: serde_json::Value) -> Properties {
        value.as_object().cloned().unwrap()
    }

    fn default_key(public_dsn: &str) -> ClientKey {
        ClientKey {
            id: "key-id".to_string(),
            label: DEFAULT_KEY_LABEL.to_string(),
            dsn: Dsn {
                public: public_dsn.to_string(),
                ..Default::default()
            },
            public: "pub".to_string(),
            secret: "sec".to_string(),
            date_created: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_check_missing_inputs() {
        let failures = ProjectResource.check(&Properties::new());
        let properties: Vec<&str> = failures.iter().map(|f| f.property.as_str()).collect();
        assert_eq!(
            properties,
            vec!["name", "organizationSlug", "slug", "teamSlug"]
        );
        for failure in &failures {
            assert_eq!(failure.reason, "this input must be a non-empty string");
        }
    }

    #[test]
    fn test_check_wrong_types() {
        let news = bag(json!({
            "name": 1,
            "organizationSlug": 1,
            "slug": 1,
            "teamSlug": 1
        }));
        assert_eq!(ProjectResource.check(&news).len(), 4);
    }

    #[test]
    fn test_check_valid_inputs() {
        let news = bag(json!({
            "name": "a name",
            "organizationSlug": "org-slug",
            "slug": "slug",
            "teamSlug": "team-slug",
            "subjectPrefix": "[x]"
        }));
        assert!(ProjectResource.check(&news).is_empty());
    }

    #[test]
    fn test_diff_replacement_fields() {
        let olds = bag(json!({
            "organizationSlug": "org-a", "name": "n", "slug": "s", "teamSlug": "t"
        }));
        let news = bag(json!({
            "organizationSlug": "org-b", "name": "n", "slug": "s", "teamSlug": "t"
        }));
        let diff = ProjectResource.diff(&olds, &news);
        assert_eq!(diff.replaces, vec!["organizationSlug"]);
        assert!(diff.delete_before_replace);
    }

    #[test]
    fn test_diff_name_updates_in_place() {
        let olds = bag(json!({
            "organizationSlug": "org", "name": "old", "slug": "s", "teamSlug": "t"
        }));
        let news = bag(json!({
            "organizationSlug": "org", "name": "new", "slug": "s", "teamSlug": "t"
        }));
        let diff = ProjectResource.diff(&olds, &news);
        assert_eq!(diff.diffs, vec!["name"]);
        assert!(diff.replaces.is_empty());
        assert!(!diff.delete_before_replace);
    }

    #[tokio::test]
    async fn test_create_uses_server_assigned_slug() {
        let api = MockSentryApi {
            create_project: Some(Box::new(|org, team, name, slug| {
                assert_eq!(org, "the-org");
                assert_eq!(team, "the-team");
                assert_eq!(name, "a name");
                assert_eq!(slug, "slug");
                Ok(Project {
                    name: "name-from-create".to_string(),
                    slug: "slug-from-create".to_string(),
                    ..Default::default()
                })
            })),
            get_client_keys: Some(Box::new(|_, _| Ok(vec![default_key("the-public-dsn")]))),
            ..Default::default()
        };
        let inputs = bag(json!({
            "organizationSlug": "the-org",
            "name": "a name",
            "slug": "slug",
            "teamSlug": "the-team"
        }));
        let created = ProjectResource.create(&api, &inputs).await.unwrap();
        assert_eq!(created.id, "the-org/slug-from-create");
        assert_eq!(created.outputs["slug"], "slug-from-create");
        assert_eq!(created.outputs["name"], "name-from-create");
        assert_eq!(created.outputs["teamSlug"], "the-team");
        assert_eq!(created.outputs["defaultDsnPublic"], "the-public-dsn");
    }

    #[tokio::test]
    async fn test_create_applies_optional_fields_via_update() {
        let api = MockSentryApi {
            create_project: Some(Box::new(|_, _, _, _| {
                Ok(Project {
                    name: "a name".to_string(),
                    slug: "the-slug".to_string(),
                    ..Default::default()
                })
            })),
            update_project: Some(Box::new(|org, slug, update| {
                assert_eq!(org, "the-org");
                assert_eq!(slug, "the-slug");
                assert_eq!(update.default_environment.as_deref(), Some("production"));
                assert_eq!(update.subject_prefix.as_deref(), Some("[sentry]"));
                Ok(Project {
                    name: update.name.clone(),
                    slug: slug.to_string(),
                    default_environment: update.default_environment.clone(),
                    subject_prefix: update.subject_prefix.clone(),
                    ..Default::default()
                })
            })),
            get_client_keys: Some(Box::new(|_, _| Ok(vec![default_key("dsn")]))),
            ..Default::default()
        };
        let inputs = bag(json!({
            "organizationSlug": "the-org",
            "name": "a name",
            "slug": "the-slug",
            "teamSlug": "the-team",
            "defaultEnvironment": "production",
            "subjectPrefix": "[sentry]"
        }));
        let created = ProjectResource.create(&api, &inputs).await.unwrap();
        assert_eq!(created.outputs["defaultEnvironment"], "production");
        assert_eq!(created.outputs["subjectPrefix"], "[sentry]");
    }

    #[tokio::test]
    async fn test_create_without_optional_fields_skips_update() {
        // No update_project closure: calling it would panic the test.
        let api = MockSentryApi {
            create_project: Some(Box::new(|_, _, name, slug| {
                Ok(Project {
                    name: name.to_string(),
                    slug: slug.to_string(),
                    ..Default::default()
                })
            })),
            get_client_keys: Some(Box::new(|_, _| Ok(vec![default_key("dsn")]))),
            ..Default::default()
        };
        let inputs = bag(json!({
            "organizationSlug": "org",
            "name": "n",
            "slug": "s",
            "teamSlug": "t"
        }));
        assert!(ProjectResource.create(&api, &inputs).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_missing_default_key_yields_empty_dsn() {
        let api = MockSentryApi {
            create_project: Some(Box::new(|_, _, name, slug| {
                Ok(Project {
                    name: name.to_string(),
                    slug: slug.to_string(),
                    ..Default::default()
                })
            })),
            get_client_keys: Some(Box::new(|_, _| Ok(vec![]))),
            ..Default::default()
        };
        let inputs = bag(json!({
            "organizationSlug": "org",
            "name": "n",
            "slug": "s",
            "teamSlug": "t"
        }));
        let created = ProjectResource.create(&api, &inputs).await.unwrap();
        assert_eq!(created.outputs["defaultDsnPublic"], "");
    }

    #[tokio::test]
    async fn test_create_failure_is_wrapped() {
        let api = MockSentryApi {
            create_project: Some(Box::new(|_, _, _, _| {
                Err(ApiError::Status {
                    status: 400,
                    body: "bad slug".to_string(),
                })
            })),
            ..Default::default()
        };
        let inputs = bag(json!({
            "organizationSlug": "org",
            "name": "n",
            "slug": "s",
            "teamSlug": "t"
        }));
        let err = ProjectResource.create(&api, &inputs).await.unwrap_err();
        assert!(format!("{err}").contains("could not CreateProject"));
    }

    #[tokio::test]
    async fn test_read_not_found_is_absent() {
        let api = MockSentryApi {
            get_organization: Some(Box::new(|slug| {
                Ok(Organization {
                    slug: slug.to_string(),
                    name: None,
                })
            })),
            get_project: Some(Box::new(|_, slug| {
                Err(ApiError::NotFound {
                    resource: format!("project {slug:?}"),
                })
            })),
            ..Default::default()
        };
        let result = ProjectResource.read(&api, "org-slug/proj-slug").await.unwrap();
        assert_eq!(result, ReadResult::Absent);
    }

    #[tokio::test]
    async fn test_read_canonicalizes_id_from_api() {
        let api = MockSentryApi {
            get_organization: Some(Box::new(|slug| {
                Ok(Organization {
                    slug: slug.to_string(),
                    name: None,
                })
            })),
            get_project: Some(Box::new(|org, slug| {
                assert_eq!(org, "org-slug");
                assert_eq!(slug, "proj-slug");
                Ok(Project {
                    name: "name-from-read".to_string(),
                    slug: "slug-from-read".to_string(),
                    organization: Some(Organization {
                        slug: "the-org-from-read".to_string(),
                        name: None,
                    }),
                    team: Some(Team {
                        slug: "the-team-from-read".to_string(),
                        name: None,
                    }),
                    ..Default::default()
                })
            })),
            get_client_keys: Some(Box::new(|org, proj| {
                assert_eq!(org, "the-org-from-read");
                assert_eq!(proj, "slug-from-read");
                Ok(vec![default_key("dsn-from-read")])
            })),
            ..Default::default()
        };
        match ProjectResource.read(&api, "org-slug/proj-slug").await.unwrap() {
            ReadResult::Present { id, outputs } => {
                assert_eq!(id, "the-org-from-read/slug-from-read");
                assert_eq!(outputs["organizationSlug"], "the-org-from-read");
                assert_eq!(outputs["name"], "name-from-read");
                assert_eq!(outputs["slug"], "slug-from-read");
                assert_eq!(outputs["teamSlug"], "the-team-from-read");
                assert_eq!(outputs["defaultDsnPublic"], "dsn-from-read");
            }
            ReadResult::Absent => panic!("expected the project to be present"),
        }
    }

    #[tokio::test]
    async fn test_read_other_errors_propagate() {
        let api = MockSentryApi {
            get_organization: Some(Box::new(|slug| {
                Ok(Organization {
                    slug: slug.to_string(),
                    name: None,
                })
            })),
            get_project: Some(Box::new(|_, _| {
                Err(ApiError::Status {
                    status: 500,
                    body: "boom".to_string(),
                })
            })),
            ..Default::default()
        };
        let err = ProjectResource
            .read(&api, "org-slug/proj-slug")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Api { .. }));
    }

    #[tokio::test]
    async fn test_read_malformed_id() {
        let api = MockSentryApi::default();
        let err = ProjectResource.read(&api, "not-an-id").await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedId(_)));
    }

    #[tokio::test]
    async fn test_update_in_place_fields() {
        let api = MockSentryApi {
            update_project: Some(Box::new(|org, slug, update| {
                assert_eq!(org, "the-org");
                assert_eq!(slug, "the-proj");
                assert_eq!(update.name, "new name");
                assert_eq!(update.subject_template.as_deref(), Some("$title"));
                Ok(Project {
                    name: update.name.clone(),
                    slug: slug.to_string(),
                    ..Default::default()
                })
            })),
            ..Default::default()
        };
        let olds = bag(json!({
            "organizationSlug": "the-org", "name": "old name",
            "slug": "the-proj", "teamSlug": "t"
        }));
        let news = bag(json!({
            "organizationSlug": "the-org", "name": "new name",
            "slug": "the-proj", "teamSlug": "t", "subjectTemplate": "$title"
        }));
        let outputs = ProjectResource
            .update(&api, "the-org/the-proj", &olds, &news)
            .await
            .unwrap();
        assert_eq!(outputs, news);
    }

    #[tokio::test]
    async fn test_update_clears_removed_optional_field() {
        let api = MockSentryApi {
            update_project: Some(Box::new(|_, slug, update| {
                assert_eq!(update.subject_prefix.as_deref(), Some(""));
                let body = serde_json::to_value(update).unwrap();
                assert_eq!(body["subjectPrefix"], "");
                Ok(Project {
                    name: update.name.clone(),
                    slug: slug.to_string(),
                    ..Default::default()
                })
            })),
            ..Default::default()
        };
        let olds = bag(json!({
            "organizationSlug": "the-org", "name": "n",
            "slug": "the-proj", "teamSlug": "t", "subjectPrefix": "[x]"
        }));
        let news = bag(json!({
            "organizationSlug": "the-org", "name": "n",
            "slug": "the-proj", "teamSlug": "t"
        }));
        let outputs = ProjectResource
            .update(&api, "the-org/the-proj", &olds, &news)
            .await
            .unwrap();
        assert!(outputs.get("subjectPrefix").is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_identity_change() {
        let api = MockSentryApi::default();
        let olds = bag(json!({
            "organizationSlug": "org", "name": "n", "slug": "s", "teamSlug": "team-a"
        }));
        let news = bag(json!({
            "organizationSlug": "org", "name": "n", "slug": "s", "teamSlug": "team-b"
        }));
        let err = ProjectResource
            .update(&api, "org/s", &olds, &news)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedChange(ref msg) if msg.contains("teamSlug")));
    }

    #[tokio::test]
    async fn test_delete() {
        let api = MockSentryApi {
            delete_project: Some(Box::new(|org, slug| {
                assert_eq!(org, "the-org");
                assert_eq!(slug, "the-proj");
                Ok(())
            })),
            ..Default::default()
        };
        ProjectResource.delete(&api, "the-org/the-proj").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_not_found_is_an_error() {
        let api = MockSentryApi {
            delete_project: Some(Box::new(|_, slug| {
                Err(ApiError::NotFound {
                    resource: format!("project {slug:?}"),
                })
            })),
            ..Default::default()
        };
        let err = ProjectResource
            .delete(&api, "the-org/the-proj")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Api { .. }));
    }
}
