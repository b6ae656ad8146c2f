//! Canvas LMS REST API

mod client;

pub use client::{next_page_link, CanvasClient};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

/// Canvas sends `null` for many fields it documents as strings
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A course the student is enrolled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    /// Missing when access to the course is restricted
    #[serde(default)]
    pub name: Option<String>,
}

impl Course {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// File attached directly to an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default", alias = "display_name")]
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasAssignment {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published: bool,
    #[serde(default)]
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub workflow_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleItem {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// `File`, `SubHeader`, `ExternalUrl`, `Page`, ...
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasFile {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Pre-signed download URL; empty for locked files
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Read-only view of the Canvas API used by the tools
#[async_trait]
pub trait CanvasApi: Send + Sync {
    /// Active courses where the user is enrolled as a student
    async fn list_active_courses(&self) -> Result<Vec<Course>>;

    async fn get_course(&self, course_id: u64) -> Result<Course>;

    async fn list_assignments(&self, course_id: u64) -> Result<Vec<CanvasAssignment>>;

    /// `workflow_state` of the current user's submission
    async fn submission_state(&self, course_id: u64, assignment_id: u64) -> Result<Option<String>>;

    async fn list_modules(&self, course_id: u64) -> Result<Vec<Module>>;

    async fn list_module_items(&self, course_id: u64, module_id: u64) -> Result<Vec<ModuleItem>>;

    async fn get_file(&self, course_id: u64, file_id: u64) -> Result<CanvasFile>;

    async fn list_files(&self, course_id: u64) -> Result<Vec<CanvasFile>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_defaults() {
        let assignment: CanvasAssignment = serde_json::from_str(
            r#"{"id": 7, "name": "Essay", "due_at": "2024-04-12T03:59:00Z"}"#,
        )
        .unwrap();

        assert!(!assignment.published);
        assert!(assignment.attachments.is_empty());
        assert_eq!(
            assignment.due_at.unwrap().to_rfc3339(),
            "2024-04-12T03:59:00+00:00"
        );
    }

    #[test]
    fn test_module_item_kind() {
        let item: ModuleItem = serde_json::from_str(
            r#"{"id": 1, "title": "01 - Intro", "type": "SubHeader"}"#,
        )
        .unwrap();

        assert_eq!(item.kind, "SubHeader");
        assert_eq!(item.content_id, None);
    }

    #[test]
    fn test_null_fields_do_not_fail_a_page() {
        let files: Vec<CanvasFile> = serde_json::from_str(
            r#"[
                {"id": 1, "filename": "a.pdf", "url": null},
                {"id": 2, "filename": null, "url": "https://x/2"}
            ]"#,
        )
        .unwrap();
        assert_eq!(files[0].url, "");
        assert_eq!(files[1].filename, "");

        let modules: Vec<Module> =
            serde_json::from_str(r#"[{"id": 5, "name": null}, {"id": 6, "name": "Week 1"}]"#)
                .unwrap();
        assert_eq!(modules[0].name, "");
        assert_eq!(modules[1].name, "Week 1");

        let item: ModuleItem =
            serde_json::from_str(r#"{"id": 9, "title": null, "type": "File", "content_id": 40}"#)
                .unwrap();
        assert_eq!(item.title, "");
        assert_eq!(item.content_id, Some(40));

        let assignment: CanvasAssignment = serde_json::from_str(
            r#"{"id": 7, "name": null, "published": null, "attachments": null}"#,
        )
        .unwrap();
        assert_eq!(assignment.name, "");
        assert!(!assignment.published);
        assert!(assignment.attachments.is_empty());
    }

    #[test]
    fn test_restricted_course_has_no_name() {
        let course: Course =
            serde_json::from_str(r#"{"id": 3, "access_restricted_by_date": true}"#).unwrap();
        assert!(course.name.is_none());
        assert_eq!(course.display_name(), "");
    }
}
