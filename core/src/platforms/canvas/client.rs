//! HTTP implementation of [`CanvasApi`]

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, LINK};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::{CanvasApi, CanvasAssignment, CanvasFile, Course, Module, ModuleItem, Submission};
use crate::config::credentials::{CanvasCredentials, CANVAS_DOMAIN};
use crate::error::{ConfigError, Result, ServiceError};

const SERVICE: &str = "Canvas";
const PER_PAGE: &str = "100";

/// Bearer-token Canvas client
#[derive(Debug, Clone)]
pub struct CanvasClient {
    client: Client,
    base_url: Url,
}

impl CanvasClient {
    /// Create a client for the configured institution
    pub fn new(credentials: &CanvasCredentials) -> Result<Self> {
        let base_url = Url::parse(&credentials.base_url()).map_err(|e| ConfigError::InvalidValue {
            field: CANVAS_DOMAIN.to_string(),
            value: format!("{} ({})", credentials.domain, e),
        })?;
        Self::with_base_url(base_url, &credentials.access_token)
    }

    /// Create a client against an explicit API root
    pub fn with_base_url(base_url: Url, access_token: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", access_token)).map_err(|_| {
            ConfigError::InvalidValue {
                field: "CANVAS_ACCESS_TOKEN".to_string(),
                value: "<contains invalid header characters>".to_string(),
            }
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ServiceError::UnexpectedResponse {
                service: SERVICE.to_string(),
                message: format!("invalid endpoint {}: {}", path, e),
            })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn send(&self, url: Url) -> Result<reqwest::Response> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = api_error_message(&body);
        if status == StatusCode::UNAUTHORIZED {
            return Err(ServiceError::Authentication {
                service: SERVICE.to_string(),
                message,
            }
            .into());
        }

        Err(ServiceError::Api {
            service: SERVICE.to_string(),
            status: status.as_u16(),
            message,
        }
        .into())
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path, &[])?;
        let response = self.send(url).await?;
        Ok(response.json().await?)
    }

    /// Fetch every page of a list endpoint
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut query = query.to_vec();
        query.push(("per_page", PER_PAGE));

        let mut next = Some(self.endpoint(path, &query)?);
        let mut items = Vec::new();

        while let Some(url) = next.take() {
            let response = self.send(url).await?;
            next = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(next_page_link)
                .and_then(|link| Url::parse(&link).ok());

            let page: Vec<T> = response.json().await?;
            items.extend(page);
        }

        Ok(items)
    }
}

#[async_trait]
impl CanvasApi for CanvasClient {
    async fn list_active_courses(&self) -> Result<Vec<Course>> {
        let courses: Vec<Course> = self
            .get_all(
                "/api/v1/courses",
                &[("enrollment_type", "student"), ("enrollment_state", "active")],
            )
            .await?;

        let total = courses.len();
        let courses: Vec<Course> = courses.into_iter().filter(|c| c.name.is_some()).collect();
        tracing::debug!("{} active courses ({} restricted)", courses.len(), total - courses.len());
        Ok(courses)
    }

    async fn get_course(&self, course_id: u64) -> Result<Course> {
        self.get_one(&format!("/api/v1/courses/{}", course_id)).await
    }

    async fn list_assignments(&self, course_id: u64) -> Result<Vec<CanvasAssignment>> {
        self.get_all(&format!("/api/v1/courses/{}/assignments", course_id), &[])
            .await
    }

    async fn submission_state(&self, course_id: u64, assignment_id: u64) -> Result<Option<String>> {
        let submission: Submission = self
            .get_one(&format!(
                "/api/v1/courses/{}/assignments/{}/submissions/self",
                course_id, assignment_id
            ))
            .await?;
        Ok(submission.workflow_state)
    }

    async fn list_modules(&self, course_id: u64) -> Result<Vec<Module>> {
        self.get_all(&format!("/api/v1/courses/{}/modules", course_id), &[])
            .await
    }

    async fn list_module_items(&self, course_id: u64, module_id: u64) -> Result<Vec<ModuleItem>> {
        self.get_all(
            &format!("/api/v1/courses/{}/modules/{}/items", course_id, module_id),
            &[],
        )
        .await
    }

    async fn get_file(&self, course_id: u64, file_id: u64) -> Result<CanvasFile> {
        self.get_one(&format!("/api/v1/courses/{}/files/{}", course_id, file_id))
            .await
    }

    async fn list_files(&self, course_id: u64) -> Result<Vec<CanvasFile>> {
        self.get_all(&format!("/api/v1/courses/{}/files", course_id), &[])
            .await
    }
}

/// Extract the `rel="next"` target from a `Link` header
pub fn next_page_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.trim().split_once(';')?;
        let is_next = params
            .split(';')
            .any(|param| matches!(param.trim(), "rel=\"next\"" | "rel=next"));
        if !is_next {
            return None;
        }
        target
            .trim()
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

/// Best-effort message from a Canvas error body
fn api_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .pointer("/errors/0/message")
            .or_else(|| value.get("message"))
            .and_then(|m| m.as_str());
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let body = body.trim();
    if body.is_empty() {
        "empty response".to_string()
    } else {
        body.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::serve_stub;
    use axum::extract::Query;
    use axum::http::header::HOST;
    use axum::http::HeaderMap;
    use axum::response::{IntoResponse, Json, Response};
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;
    use std::collections::HashMap;

    /// Two pages of courses behind a bearer token
    async fn courses(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
        let token = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        if token != Some("Bearer secret") {
            let body = json!({"errors": [{"message": "Invalid access token."}]});
            return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        }
        if query.get("per_page").map(String::as_str) != Some("100")
            || query.get("enrollment_type").map(String::as_str) != Some("student")
        {
            return StatusCode::BAD_REQUEST.into_response();
        }

        match query.get("page").map(String::as_str) {
            None => {
                let host = headers.get(HOST).and_then(|v| v.to_str().ok()).unwrap_or_default();
                let next = format!(
                    "<http://{}/api/v1/courses?enrollment_type=student&page=2&per_page=100>; \
                     rel=\"next\"",
                    host
                );
                ([(LINK, next)], Json(json!([{"id": 1, "name": "Algorithms"}]))).into_response()
            }
            Some("2") => Json(json!([
                {"id": 2, "name": "Linear Algebra"},
                {"id": 3, "access_restricted_by_date": true}
            ]))
            .into_response(),
            Some(_) => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn stub() -> Url {
        serve_stub(Router::new().route("/api/v1/courses", get(courses))).await
    }

    #[tokio::test]
    async fn test_list_follows_next_links() {
        let client = CanvasClient::with_base_url(stub().await, "secret").unwrap();

        let courses = client.list_active_courses().await.unwrap();

        let ids: Vec<u64> = courses.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(courses[1].display_name(), "Linear Algebra");
    }

    #[tokio::test]
    async fn test_unauthorized_is_an_authentication_error() {
        let client = CanvasClient::with_base_url(stub().await, "expired").unwrap();

        let err = client.list_active_courses().await.unwrap_err();

        match err {
            Error::Service(ServiceError::Authentication { service, message }) => {
                assert_eq!(service, "Canvas");
                assert_eq!(message, "Invalid access token.");
            }
            other => panic!("expected an authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_other_statuses_are_api_errors() {
        let client = CanvasClient::with_base_url(stub().await, "secret").unwrap();

        let err = client.get_course(99).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Service(ServiceError::Api { status: 404, .. })
        ));
    }

    #[test]
    fn test_next_page_link() {
        let header = concat!(
            "<https://canvas.example.edu/api/v1/courses?page=1&per_page=100>; rel=\"current\",",
            "<https://canvas.example.edu/api/v1/courses?page=2&per_page=100>; rel=\"next\",",
            "<https://canvas.example.edu/api/v1/courses?page=1&per_page=100>; rel=\"first\",",
            "<https://canvas.example.edu/api/v1/courses?page=3&per_page=100>; rel=\"last\""
        );

        assert_eq!(
            next_page_link(header).as_deref(),
            Some("https://canvas.example.edu/api/v1/courses?page=2&per_page=100")
        );
    }

    #[test]
    fn test_last_page_has_no_next_link() {
        let header = concat!(
            "<https://canvas.example.edu/api/v1/courses?page=3>; rel=\"current\",",
            "<https://canvas.example.edu/api/v1/courses?page=1>; rel=\"first\""
        );
        assert_eq!(next_page_link(header), None);
        assert_eq!(next_page_link(""), None);
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error_message(r#"{"errors":[{"message":"Invalid access token."}]}"#),
            "Invalid access token."
        );
        assert_eq!(
            api_error_message(r#"{"message":"The specified resource does not exist."}"#),
            "The specified resource does not exist."
        );
        assert_eq!(api_error_message("  "), "empty response");
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_endpoint_keeps_query() {
        let credentials = CanvasCredentials::new("token", "canvas.example.edu");
        let client = CanvasClient::new(&credentials).unwrap();
        let url = client
            .endpoint("/api/v1/courses", &[("enrollment_type", "student"), ("per_page", "100")])
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://canvas.example.edu/api/v1/courses?enrollment_type=student&per_page=100"
        );
    }
}
