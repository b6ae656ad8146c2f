//! In-memory stand-ins for Canvas, Gradescope, downloads and osascript

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Local, Offset, Utc};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::config::{CredentialSet, SettingsStore};
use crate::deadlines::Term;
use crate::downloads::{FetchedFile, FileFetcher};
use crate::error::{Error, Result, ServiceError};
use crate::platforms::canvas::{CanvasAssignment, CanvasFile, Course, Module, ModuleItem};
use crate::platforms::gradescope::{GradescopeAssignment, GradescopeCourse};
use crate::platforms::{CanvasApi, GradescopeApi};
use crate::reminders::ScriptRunner;
use crate::tools::{ServiceProvider, ToolContext};

fn missing(what: String) -> Error {
    ServiceError::Api {
        service: "Canvas".to_string(),
        status: 404,
        message: format!("{} not found", what),
    }
    .into()
}

/// Canvas backed by maps; unregistered assignment lists, module items and files are 404s
#[derive(Debug, Default)]
pub struct FakeCanvas {
    pub courses: Vec<Course>,
    pub assignments: HashMap<u64, Vec<CanvasAssignment>>,
    /// Submission state by assignment id
    pub submissions: HashMap<u64, String>,
    pub modules: HashMap<u64, Vec<Module>>,
    pub module_items: HashMap<u64, Vec<ModuleItem>>,
    pub files: HashMap<u64, CanvasFile>,
    pub course_files: HashMap<u64, Vec<CanvasFile>>,
    pub fail: bool,
}

#[async_trait]
impl CanvasApi for FakeCanvas {
    async fn list_active_courses(&self) -> Result<Vec<Course>> {
        if self.fail {
            return Err(ServiceError::Api {
                service: "Canvas".to_string(),
                status: 500,
                message: "unavailable".to_string(),
            }
            .into());
        }
        Ok(self.courses.clone())
    }

    async fn get_course(&self, course_id: u64) -> Result<Course> {
        self.courses
            .iter()
            .find(|c| c.id == course_id)
            .cloned()
            .ok_or_else(|| missing(format!("course {}", course_id)))
    }

    async fn list_assignments(&self, course_id: u64) -> Result<Vec<CanvasAssignment>> {
        self.assignments
            .get(&course_id)
            .cloned()
            .ok_or_else(|| missing(format!("assignments of course {}", course_id)))
    }

    async fn submission_state(
        &self,
        _course_id: u64,
        assignment_id: u64,
    ) -> Result<Option<String>> {
        Ok(self.submissions.get(&assignment_id).cloned())
    }

    async fn list_modules(&self, course_id: u64) -> Result<Vec<Module>> {
        Ok(self.modules.get(&course_id).cloned().unwrap_or_default())
    }

    async fn list_module_items(&self, _course_id: u64, module_id: u64) -> Result<Vec<ModuleItem>> {
        self.module_items
            .get(&module_id)
            .cloned()
            .ok_or_else(|| missing(format!("items of module {}", module_id)))
    }

    async fn get_file(&self, _course_id: u64, file_id: u64) -> Result<CanvasFile> {
        self.files
            .get(&file_id)
            .cloned()
            .ok_or_else(|| missing(format!("file {}", file_id)))
    }

    async fn list_files(&self, course_id: u64) -> Result<Vec<CanvasFile>> {
        Ok(self.course_files.get(&course_id).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct FakeGradescope {
    pub courses: Vec<GradescopeCourse>,
    /// Assignments by course id
    pub assignments: HashMap<String, Vec<GradescopeAssignment>>,
    pub fail: bool,
}

#[async_trait]
impl GradescopeApi for FakeGradescope {
    async fn list_student_courses(&self) -> Result<Vec<GradescopeCourse>> {
        if self.fail {
            return Err(ServiceError::UnexpectedResponse {
                service: "Gradescope".to_string(),
                message: "account page changed".to_string(),
            }
            .into());
        }
        Ok(self.courses.clone())
    }

    async fn list_assignments(&self, course_id: &str) -> Result<Vec<GradescopeAssignment>> {
        Ok(self.assignments.get(course_id).cloned().unwrap_or_default())
    }
}

/// Canned download response
#[derive(Debug, Clone, Default)]
pub struct FakeFile {
    body: Vec<u8>,
    disposition: Option<String>,
    content_type: Option<String>,
}

impl FakeFile {
    pub fn new(body: &[u8]) -> Self {
        Self {
            body: body.to_vec(),
            ..Self::default()
        }
    }

    pub fn disposition(mut self, value: &str) -> Self {
        self.disposition = Some(value.to_string());
        self
    }

    pub fn content_type(mut self, value: &str) -> Self {
        self.content_type = Some(value.to_string());
        self
    }
}

/// Serves [`FakeFile`]s by URL; anything else is a 404
#[derive(Debug, Default)]
pub struct FakeFetcher {
    files: HashMap<String, FakeFile>,
}

impl FakeFetcher {
    pub fn with(mut self, url: &str, file: FakeFile) -> Self {
        self.files.insert(url.to_string(), file);
        self
    }
}

#[async_trait]
impl FileFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedFile> {
        let file = self.files.get(url).cloned().ok_or_else(|| {
            Error::from(ServiceError::Api {
                service: "Download".to_string(),
                status: 404,
                message: "Not Found".to_string(),
            })
        })?;

        let content_length = Some(file.body.len() as u64);
        let chunk: Result<Bytes> = Ok(Bytes::from(file.body));
        Ok(FetchedFile {
            content_disposition: file.disposition,
            content_type: file.content_type,
            content_length,
            body: futures::stream::iter(vec![chunk]).boxed(),
        })
    }
}

/// Records every script; scripts containing `fail_pattern` fail
#[derive(Debug, Default)]
pub struct RecordingRunner {
    scripts: Mutex<Vec<String>>,
    fail_pattern: Option<String>,
}

impl RecordingRunner {
    pub fn failing_when(pattern: &str) -> Self {
        Self {
            fail_pattern: Some(pattern.to_string()),
            ..Self::default()
        }
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptRunner for RecordingRunner {
    async fn run(&self, script: &str) -> Result<String> {
        self.scripts.lock().unwrap().push(script.to_string());

        match &self.fail_pattern {
            Some(pattern) if script.contains(pattern.as_str()) => {
                Err(ServiceError::UnexpectedResponse {
                    service: "Reminders".to_string(),
                    message: "AppleScript error (code 1): execution error".to_string(),
                }
                .into())
            }
            _ => Ok(String::new()),
        }
    }
}

/// Fake services; `None` behaves like unset credentials
pub struct FakeServices {
    pub canvas: Option<Arc<FakeCanvas>>,
    pub gradescope: Option<Arc<FakeGradescope>>,
    pub fetcher: Arc<FakeFetcher>,
    pub runner: Arc<RecordingRunner>,
}

impl Default for FakeServices {
    fn default() -> Self {
        Self {
            canvas: Some(Arc::new(FakeCanvas::default())),
            gradescope: Some(Arc::new(FakeGradescope::default())),
            fetcher: Arc::new(FakeFetcher::default()),
            runner: Arc::new(RecordingRunner::default()),
        }
    }
}

impl FakeServices {
    /// One current-term course per platform with work due after `anchor`
    ///
    /// Gradescope "Homework 5" is due a day after `anchor`, Canvas
    /// "Problem Set" three days after. Canvas course 1 also has a syllabus.
    pub fn with_upcoming_work(anchor: DateTime<Utc>) -> Self {
        let term = Term::for_date(&anchor.with_timezone(&Local));

        let mut canvas = FakeCanvas::default();
        canvas.courses = vec![Course {
            id: 1,
            name: Some(format!("Seminar {}", term)),
        }];
        canvas.assignments.insert(
            1,
            vec![CanvasAssignment {
                id: 10,
                name: "Problem Set".to_string(),
                due_at: Some(anchor + Duration::days(3)),
                published: true,
                points_possible: Some(10.0),
                html_url: Some("https://canvas.example.edu/courses/1/assignments/10".to_string()),
                description: None,
                attachments: Vec::new(),
            }],
        );
        canvas.submissions.insert(10, "unsubmitted".to_string());
        canvas.course_files.insert(
            1,
            vec![CanvasFile {
                id: 300,
                filename: "syllabus.pdf".to_string(),
                display_name: None,
                url: "https://files.example.edu/300".to_string(),
                size: Some(8),
            }],
        );

        let mut gradescope = FakeGradescope::default();
        gradescope.courses = vec![GradescopeCourse {
            id: "100".to_string(),
            short_name: "CS 161".to_string(),
            name: "Design and Analysis of Algorithms".to_string(),
            term: term.to_string(),
        }];
        gradescope.assignments.insert(
            "100".to_string(),
            vec![GradescopeAssignment {
                name: "Homework 5".to_string(),
                status: None,
                due_date: Some((anchor + Duration::days(1)).with_timezone(&Utc.fix())),
                late_due_date: None,
            }],
        );

        let fetcher = FakeFetcher::default()
            .with("https://files.example.edu/300", FakeFile::new(b"syllabus"));

        Self {
            canvas: Some(Arc::new(canvas)),
            gradescope: Some(Arc::new(gradescope)),
            fetcher: Arc::new(fetcher),
            runner: Arc::new(RecordingRunner::default()),
        }
    }
}

#[async_trait]
impl ServiceProvider for FakeServices {
    fn canvas(&self) -> Result<Arc<dyn CanvasApi>> {
        match &self.canvas {
            Some(canvas) => Ok(canvas.clone()),
            None => Err(CredentialSet::default().require_canvas().unwrap_err()),
        }
    }

    async fn gradescope(&self) -> Result<Arc<dyn GradescopeApi>> {
        match &self.gradescope {
            Some(gradescope) => Ok(gradescope.clone()),
            None => Err(CredentialSet::default().require_gradescope().unwrap_err()),
        }
    }

    fn file_fetcher(&self) -> Arc<dyn FileFetcher> {
        self.fetcher.clone()
    }

    fn script_runner(&self) -> Arc<dyn ScriptRunner> {
        self.runner.clone()
    }
}

/// Context over [`FakeServices::default`] with settings in a temporary home
pub fn fake_context() -> (Arc<ToolContext>, TempDir) {
    fake_context_with(FakeServices::default())
}

pub fn fake_context_with(services: FakeServices) -> (Arc<ToolContext>, TempDir) {
    let home = tempfile::tempdir().unwrap();
    let context = ToolContext::new(SettingsStore::new(home.path()), Arc::new(services));
    (Arc::new(context), home)
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn serve_stub(router: axum::Router) -> url::Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    url::Url::parse(&base).unwrap()
}
