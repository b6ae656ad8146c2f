//! Gradescope web portal
//!
//! Gradescope has no public student API, so the client keeps a cookie
//! session and scrapes the account and course pages.

pub mod parser;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::GradescopeCredentials;
use crate::error::{Result, ServiceError};

const SERVICE: &str = "Gradescope";

/// Public Gradescope host
pub const GRADESCOPE_URL: &str = "https://www.gradescope.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradescopeCourse {
    pub id: String,
    pub short_name: String,
    pub name: String,
    /// Term heading the course is listed under, e.g. `Spring 2024`
    pub term: String,
}

impl GradescopeCourse {
    /// `(season, year)` split out of the term heading
    pub fn semester_and_year(&self) -> Option<(&str, &str)> {
        let (season, year) = self.term.trim().rsplit_once(' ')?;
        Some((season.trim(), year.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradescopeAssignment {
    pub name: String,
    pub status: Option<String>,
    pub due_date: Option<DateTime<FixedOffset>>,
    pub late_due_date: Option<DateTime<FixedOffset>>,
}

/// Student view of Gradescope
#[async_trait]
pub trait GradescopeApi: Send + Sync {
    async fn list_student_courses(&self) -> Result<Vec<GradescopeCourse>>;

    async fn list_assignments(&self, course_id: &str) -> Result<Vec<GradescopeAssignment>>;
}

/// Logged-in Gradescope session
#[derive(Debug, Clone)]
pub struct GradescopeClient {
    client: Client,
    base_url: Url,
}

impl GradescopeClient {
    /// Log in to gradescope.com
    pub async fn login(credentials: &GradescopeCredentials) -> Result<Self> {
        let base_url = Url::parse(GRADESCOPE_URL).map_err(|e| unexpected(e.to_string()))?;
        Self::login_at(base_url, credentials).await
    }

    /// Log in to a Gradescope deployment at `base_url`
    pub async fn login_at(base_url: Url, credentials: &GradescopeCredentials) -> Result<Self> {
        let client = Client::builder().cookie_store(true).build()?;
        let session = Self { client, base_url };

        let landing = session.fetch("/").await?;
        let token = parser::authenticity_token(&landing)
            .ok_or_else(|| unexpected("login page has no authenticity token"))?;

        let form = [
            ("utf8", "\u{2713}"),
            ("session[email]", credentials.email.as_str()),
            ("session[password]", credentials.password.as_str()),
            ("session[remember_me]", "0"),
            ("commit", "Log In"),
            ("session[remember_me_sso]", "0"),
            ("authenticity_token", token.as_str()),
        ];

        tracing::debug!("Logging in to Gradescope as {}", credentials.email);
        let response = session
            .client
            .post(session.url("/login")?)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Api {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                message: "login request rejected".to_string(),
            }
            .into());
        }

        if !response.url().path().starts_with("/account") {
            return Err(ServiceError::Authentication {
                service: SERVICE.to_string(),
                message: "Invalid email or password".to_string(),
            }
            .into());
        }

        tracing::info!("Logged in to Gradescope");
        Ok(session)
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| unexpected(format!("invalid path {}: {}", path, e)))
    }

    async fn fetch(&self, path: &str) -> Result<String> {
        let url = self.url(path)?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Api {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                message: format!("failed to load {}", path),
            }
            .into());
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl GradescopeApi for GradescopeClient {
    async fn list_student_courses(&self) -> Result<Vec<GradescopeCourse>> {
        let page = self.fetch("/account").await?;
        let courses = parser::parse_courses(&page);
        tracing::debug!("Found {} Gradescope student courses", courses.len());
        Ok(courses)
    }

    async fn list_assignments(&self, course_id: &str) -> Result<Vec<GradescopeAssignment>> {
        let page = self.fetch(&format!("/courses/{}", course_id)).await?;
        Ok(parser::parse_assignments(&page))
    }
}

fn unexpected<S: Into<String>>(message: S) -> crate::error::Error {
    ServiceError::UnexpectedResponse {
        service: SERVICE.to_string(),
        message: message.into(),
    }
    .into()
}
