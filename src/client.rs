//! reqwest-backed implementation of [`SentryApi`].
//!
//! A thin wrapper over the Sentry REST API: bearer-token auth, JSON bodies,
//! and a fixed per-call timeout. No retries; every failure propagates to the
//! caller, who decides whether to rerun the whole operation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::api::{ApiError, ClientKey, Organization, Project, ProjectUpdate, SentryApi, Team};

/// Default base URL of the hosted Sentry API.
pub const DEFAULT_API_URL: &str = "https://sentry.io/api/0/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the Sentry REST API.
pub struct SentryClient {
    http: Client,
    token: String,
    base_url: Url,
}

impl SentryClient {
    /// Create a client for the given API base URL and auth token.
    ///
    /// Pass [`DEFAULT_API_URL`] for hosted Sentry. The URL must end with a
    /// trailing slash for relative endpoint paths to resolve under it.
    pub fn new(api_url: &str, token: impl Into<String>) -> Result<Self, ApiError> {
        let base_url = Url::parse(api_url).map_err(|e| ApiError::Url(e.to_string()))?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            token: token.into(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Url(format!("{path}: {e}")))
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        resource: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "sentry API request");

        let mut req = self
            .http
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                resource: resource.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, resource: &str) -> Result<T, ApiError> {
        let resp = self
            .request::<()>(Method::GET, path, None, resource)
            .await?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl SentryApi for SentryClient {
    async fn create_project(
        &self,
        organization_slug: &str,
        team_slug: &str,
        name: &str,
        slug: &str,
    ) -> Result<Project, ApiError> {
        let path = format!("teams/{organization_slug}/{team_slug}/projects/");
        let body = json!({ "name": name, "slug": slug });
        let resource = format!("team {organization_slug}/{team_slug}");
        let resp = self
            .request(Method::POST, &path, Some(&body), &resource)
            .await?;
        Ok(resp.json().await?)
    }

    async fn get_project(&self, organization_slug: &str, slug: &str) -> Result<Project, ApiError> {
        let path = format!("projects/{organization_slug}/{slug}/");
        let resource = format!("project {organization_slug}/{slug}");
        self.get_json(&path, &resource).await
    }

    async fn update_project(
        &self,
        organization_slug: &str,
        slug: &str,
        update: &ProjectUpdate,
    ) -> Result<Project, ApiError> {
        let path = format!("projects/{organization_slug}/{slug}/");
        let resource = format!("project {organization_slug}/{slug}");
        let resp = self
            .request(Method::PUT, &path, Some(update), &resource)
            .await?;
        Ok(resp.json().await?)
    }

    async fn delete_project(&self, organization_slug: &str, slug: &str) -> Result<(), ApiError> {
        let path = format!("projects/{organization_slug}/{slug}/");
        let resource = format!("project {organization_slug}/{slug}");
        self.request::<()>(Method::DELETE, &path, None, &resource)
            .await?;
        Ok(())
    }

    async fn create_client_key(
        &self,
        organization_slug: &str,
        project_slug: &str,
        name: &str,
    ) -> Result<ClientKey, ApiError> {
        let path = format!("projects/{organization_slug}/{project_slug}/keys/");
        let body = json!({ "name": name });
        let resource = format!("project {organization_slug}/{project_slug}");
        let resp = self
            .request(Method::POST, &path, Some(&body), &resource)
            .await?;
        Ok(resp.json().await?)
    }

    async fn get_client_keys(
        &self,
        organization_slug: &str,
        project_slug: &str,
    ) -> Result<Vec<ClientKey>, ApiError> {
        let path = format!("projects/{organization_slug}/{project_slug}/keys/");
        let resource = format!("project {organization_slug}/{project_slug}");
        self.get_json(&path, &resource).await
    }

    async fn delete_client_key(
        &self,
        organization_slug: &str,
        project_slug: &str,
        key_id: &str,
    ) -> Result<(), ApiError> {
        let path = format!("projects/{organization_slug}/{project_slug}/keys/{key_id}/");
        let resource = format!("client key {organization_slug}/{project_slug}/{key_id}");
        self.request::<()>(Method::DELETE, &path, None, &resource)
            .await?;
        Ok(())
    }

    async fn get_organization(&self, slug: &str) -> Result<Organization, ApiError> {
        let path = format!("organizations/{slug}/");
        let resource = format!("organization {slug}");
        self.get_json(&path, &resource).await
    }

    async fn get_team(&self, organization_slug: &str, team_slug: &str) -> Result<Team, ApiError> {
        let path = format!("teams/{organization_slug}/{team_slug}/");
        let resource = format!("team {organization_slug}/{team_slug}");
        self.get_json(&path, &resource).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_endpoint_joins_under_base() {
        let client = SentryClient::new("https://sentry.example/api/0/", "tok").unwrap();
        let url = client.endpoint("projects/the-org/the-proj/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sentry.example/api/0/projects/the-org/the-proj/"
        );
    }

    #[test]
    fn test_default_api_url_parses() {
        assert!(SentryClient::new(DEFAULT_API_URL, "tok").is_ok());
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            SentryClient::new("not a url", "tok"),
            Err(ApiError::Url(_))
        ));
    }

    fn serve_once(response: &'static str) -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_404_maps_to_not_found() {
        let base = serve_once("HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n");
        let client = SentryClient::new(&base, "tok").unwrap();
        let err = client.get_project("org", "proj").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unexpected_status_carries_body() {
        let base =
            serve_once("HTTP/1.1 500 Internal Server Error\r\ncontent-length: 4\r\n\r\noops");
        let client = SentryClient::new(&base, "tok").unwrap();
        match client.delete_project("org", "proj").await.unwrap_err() {
            ApiError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "oops");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
