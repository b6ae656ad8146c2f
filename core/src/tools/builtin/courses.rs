//! Canvas course tools: listing courses and downloading their files

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use super::expand_path;
use crate::downloads::{CourseDownloader, DownloadStats};
use crate::error::{Result, ToolError};
use crate::impl_tool_factory;
use crate::tools::{Tool, ToolCall, ToolContext, ToolExample, ToolResult};

#[derive(Debug, Serialize)]
struct CourseSummary<'a> {
    id: u64,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct DownloadSummary {
    status: &'static str,
    message: String,
    course_name: String,
    download_path: String,
    stats: DownloadStats,
}

/// Active Canvas courses
pub struct ListCoursesTool {
    context: Arc<ToolContext>,
}

impl ListCoursesTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }

    async fn list(&self) -> Result<Option<String>> {
        let courses = self.context.services.canvas()?.list_active_courses().await?;
        if courses.is_empty() {
            return Ok(None);
        }

        let summaries: Vec<_> = courses
            .iter()
            .map(|c| CourseSummary {
                id: c.id,
                name: c.display_name(),
            })
            .collect();
        Ok(Some(serde_json::to_string_pretty(&summaries)?))
    }
}

#[async_trait]
impl Tool for ListCoursesTool {
    fn name(&self) -> &str {
        "list_courses"
    }

    fn description(&self) -> &str {
        "List available courses from Canvas."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        match self.list().await {
            Ok(Some(courses)) => Ok(ToolResult::success(&call.id, courses)),
            Ok(None) => Ok(ToolResult::success(&call.id, "No active courses found.")),
            Err(e) => Ok(ToolResult::error(
                &call.id,
                format!("Error listing courses: {}", e),
            )),
        }
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "List active courses".to_string(),
            parameters: json!({}),
            expected_result: "JSON list of course ids and names".to_string(),
        }]
    }
}

enum DownloadReply {
    NotFound,
    Done(String),
}

/// Mirrors a Canvas course to the local disk
pub struct DownloadCourseFilesTool {
    context: Arc<ToolContext>,
}

impl DownloadCourseFilesTool {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }

    async fn download(
        &self,
        course_id: u64,
        download_path: Option<String>,
    ) -> Result<DownloadReply> {
        let services = &self.context.services;
        let downloader = CourseDownloader::new(
            services.canvas()?,
            services.file_fetcher(),
            self.context.settings.clone(),
        );

        let courses = downloader.current_courses().await?;
        if !courses.iter().any(|c| c.id == course_id) {
            return Ok(DownloadReply::NotFound);
        }

        let target = download_path.as_deref().map(expand_path);
        let result = downloader
            .download_all_course_files(course_id, target.as_deref())
            .await?;

        let stats = result.stats;
        let summary = DownloadSummary {
            status: "success",
            message: format!(
                "Downloaded {} files ({} skipped, {} failed)",
                stats.successful, stats.skipped, stats.failed
            ),
            course_name: result.course_name,
            download_path: result.base_path.display().to_string(),
            stats,
        };
        Ok(DownloadReply::Done(serde_json::to_string_pretty(&summary)?))
    }
}

/// Course ids arrive as numbers, but some clients send numeric strings
fn course_id(call: &ToolCall) -> Result<u64> {
    let raw: serde_json::Value = call.get_parameter("course_id")?;
    let id = match &raw {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };

    id.ok_or_else(|| {
        ToolError::InvalidParameters {
            message: format!("course_id must be a non-negative integer, got {}", raw),
        }
        .into()
    })
}

#[async_trait]
impl Tool for DownloadCourseFilesTool {
    fn name(&self) -> &str {
        "download_course_files"
    }

    fn description(&self) -> &str {
        "Download files from a Canvas course.\n\
         Module files, assignment attachments and course files are saved under \
         `<download_path>/<course name>`. Files that already exist with the same \
         size are skipped. When `download_path` is given it also becomes the \
         default download path."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "course_id": {
                    "type": "integer",
                    "description": "Canvas course ID"
                },
                "download_path": {
                    "type": "string",
                    "description": "Path to download files to \
                                    (optional, will use default if not provided)"
                }
            },
            "required": ["course_id"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let course_id = course_id(&call)?;
        let download_path: Option<String> = call.get_optional_parameter("download_path")?;
        let download_path = download_path.filter(|p| !p.trim().is_empty());

        match self.download(course_id, download_path).await {
            Ok(DownloadReply::Done(summary)) => Ok(ToolResult::success(&call.id, summary)),
            Ok(DownloadReply::NotFound) => Ok(ToolResult::error(
                &call.id,
                format!("Course with ID {} not found.", course_id),
            )),
            Err(e) => Ok(ToolResult::error(
                &call.id,
                format!("Error downloading course files: {}", e),
            )),
        }
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![
            ToolExample {
                description: "Download a course to the default path".to_string(),
                parameters: json!({"course_id": 12345}),
                expected_result: "Download summary with file counts".to_string(),
            },
            ToolExample {
                description: "Download a course to a specific folder".to_string(),
                parameters: json!({"course_id": 12345, "download_path": "~/School"}),
                expected_result: "Download summary; ~/School becomes the default path".to_string(),
            },
        ]
    }
}

impl_tool_factory!(
    ListCoursesToolFactory,
    ListCoursesTool,
    "list_courses",
    "List available courses from Canvas"
);

impl_tool_factory!(
    DownloadCourseFilesToolFactory,
    DownloadCourseFilesTool,
    "download_course_files",
    "Download files from a Canvas course"
);
