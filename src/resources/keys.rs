//! The ClientKey resource handler.
//!
//! A client key is the DSN credential an SDK uses to send events to a
//! project. Keys are immutable once provisioned: every tracked input is part
//! of the identity, so any change destroys the old key and mints a new one.

use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::Value;
use tracing::debug;

use crate::api::{ClientKey, SentryApi};
use crate::diff::{diff_inputs, ResourceDiff};
use crate::error::ProviderError;
use crate::id::ClientKeyId;
use crate::resources::{required_str, Created, Properties, ReadResult, ResourceLifecycle};
use crate::validation::{collect_failures, CheckFailure};

const REQUIRED_INPUTS: &[&str] = &["organizationSlug", "name", "projectSlug"];

/// Handler for `sentry:index:ClientKey`.
pub struct ClientKeyResource;

#[async_trait]
impl ResourceLifecycle for ClientKeyResource {
    fn check(&self, news: &Properties) -> Vec<CheckFailure> {
        collect_failures(news, REQUIRED_INPUTS, &[])
    }

    fn diff(&self, olds: &Properties, news: &Properties) -> ResourceDiff {
        diff_inputs(olds, news, REQUIRED_INPUTS, REQUIRED_INPUTS)
    }

    async fn create(
        &self,
        api: &dyn SentryApi,
        inputs: &Properties,
    ) -> Result<Created, ProviderError> {
        let organization_slug = required_str(inputs, "organizationSlug")?;
        let project_slug = required_str(inputs, "projectSlug")?;
        let name = required_str(inputs, "name")?;

        let key = api
            .create_client_key(organization_slug, project_slug, name)
            .await
            .map_err(|e| ProviderError::api(format!("could not CreateClientKey {name:?}"), e))?;

        let id = ClientKeyId::new(organization_slug, project_slug, &key.id);
        Ok(Created {
            id: id.to_string(),
            outputs: outputs_from_key(&key),
        })
    }

    async fn read(&self, api: &dyn SentryApi, id: &str) -> Result<ReadResult, ProviderError> {
        let parsed: ClientKeyId = id.parse()?;
        debug!(id, "reading client key");

        // Sentry has no GET endpoint for a single key; list and scan.
        let keys = match api
            .get_client_keys(&parsed.organization_slug, &parsed.project_slug)
            .await
        {
            Ok(keys) => keys,
            Err(e) if e.is_not_found() => return Ok(ReadResult::Absent),
            Err(e) => {
                return Err(ProviderError::api(
                    format!("could not GetClientKeys for {:?}", parsed.project_slug),
                    e,
                ))
            }
        };

        match keys.into_iter().find(|k| k.id == parsed.key_id) {
            Some(key) => Ok(ReadResult::Present {
                id: parsed.to_string(),
                outputs: outputs_from_key(&key),
            }),
            None => Ok(ReadResult::Absent),
        }
    }

    async fn update(
        &self,
        _api: &dyn SentryApi,
        _id: &str,
        _olds: &Properties,
        _news: &Properties,
    ) -> Result<Properties, ProviderError> {
        // Diff marks every field as requiring replacement, so the host should
        // never route an Update here.
        Err(ProviderError::UnsupportedChange(
            "client keys cannot be updated in place".to_string(),
        ))
    }

    async fn delete(&self, api: &dyn SentryApi, id: &str) -> Result<(), ProviderError> {
        let parsed: ClientKeyId = id.parse()?;
        api.delete_client_key(
            &parsed.organization_slug,
            &parsed.project_slug,
            &parsed.key_id,
        )
        .await
        .map_err(|e| {
            ProviderError::api(format!("could not DeleteClientKey {:?}", parsed.key_id), e)
        })
    }
}

fn outputs_from_key(key: &ClientKey) -> Properties {
    let mut outputs = Properties::new();
    outputs.insert("name".to_string(), Value::from(key.label.clone()));
    outputs.insert("dsnSecret".to_string(), Value::from(key.dsn.secret.clone()));
    outputs.insert("dsnPublic".to_string(), Value::from(key.dsn.public.clone()));
    outputs.insert("dsnCSP".to_string(), Value::from(key.dsn.csp.clone()));
    outputs.insert("secret".to_string(), Value::from(key.secret.clone()));
    outputs.insert("public".to_string(), Value::from(key.public.clone()));
    outputs.insert(
        "dateCreated".to_string(),
        Value::from(
            key.date_created
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
    );
    outputs
}
