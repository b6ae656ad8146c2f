//! Mirroring Canvas course content to disk
//!
//! Layout under the download directory:
//!
//! ```text
//! <course>/Modules/<module>[/<NN - section>]/<file>
//! <course>/Assignments/<assignment>/<file>
//! <course>/Files/<file>
//! ```

mod fetcher;
pub mod naming;

pub use fetcher::{
    download_file, ByteStream, DownloadOutcome, DownloadStatus, FetchedFile, FileFetcher,
    HttpFileFetcher,
};
pub use naming::{extract_section_info, sanitize_filename};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use crate::config::SettingsStore;
use crate::error::Result;
use crate::platforms::canvas::{CanvasApi, CanvasAssignment, Course};

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).expect("valid regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl DownloadStats {
    fn record(&mut self, outcome: &DownloadOutcome) {
        self.total += 1;
        match outcome.status {
            DownloadStatus::Success => self.successful += 1,
            DownloadStatus::Skipped => self.skipped += 1,
            DownloadStatus::Error => self.failed += 1,
        }
    }
}

/// Result of mirroring one course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDownload {
    pub course_name: String,
    pub base_path: PathBuf,
    pub files: Vec<DownloadOutcome>,
    pub stats: DownloadStats,
}

impl CourseDownload {
    /// A file that was attempted
    fn push_file(&mut self, outcome: DownloadOutcome) {
        self.stats.record(&outcome);
        self.files.push(outcome);
    }

    /// A listing that failed before any file could be attempted
    fn push_listing_error(
        &mut self,
        what: String,
        path: &Path,
        context: &str,
        e: crate::error::Error,
    ) {
        tracing::warn!("{} for {}: {}", context, what, e);
        self.files
            .push(DownloadOutcome::error(what, path, format!("{}: {}", context, e)));
    }
}

/// Downloads every file reachable from a Canvas course
pub struct CourseDownloader {
    canvas: Arc<dyn CanvasApi>,
    fetcher: Arc<dyn FileFetcher>,
    settings: SettingsStore,
}

impl CourseDownloader {
    pub fn new(
        canvas: Arc<dyn CanvasApi>,
        fetcher: Arc<dyn FileFetcher>,
        settings: SettingsStore,
    ) -> Self {
        Self {
            canvas,
            fetcher,
            settings,
        }
    }

    /// Active courses as shown to the user
    pub async fn current_courses(&self) -> Result<Vec<Course>> {
        self.canvas.list_active_courses().await
    }

    /// Mirror a course below `download_path`, or the saved default
    ///
    /// An explicit `download_path` becomes the new saved default.
    pub async fn download_all_course_files(
        &self,
        course_id: u64,
        download_path: Option<&Path>,
    ) -> Result<CourseDownload> {
        let course = self.canvas.get_course(course_id).await?;
        let course_name = course.display_name().to_string();

        let root = match download_path {
            Some(path) => {
                self.settings.save_download_path(path).await?;
                path.to_path_buf()
            }
            None => self.settings.download_path().await,
        };
        let base_path = root.join(sanitize_filename(&course_name));
        tokio::fs::create_dir_all(&base_path).await?;

        tracing::info!("Downloading '{}' into {}", course_name, base_path.display());

        let mut result = CourseDownload {
            course_name,
            base_path: base_path.clone(),
            files: Vec::new(),
            stats: DownloadStats::default(),
        };

        self.download_modules(course_id, &base_path.join("Modules"), &mut result).await;
        self.download_assignments(course_id, &base_path.join("Assignments"), &mut result)
            .await;
        self.download_files(course_id, &base_path.join("Files"), &mut result).await;

        tracing::info!(
            "Finished '{}': {} downloaded, {} skipped, {} failed",
            result.course_name,
            result.stats.successful,
            result.stats.skipped,
            result.stats.failed
        );
        Ok(result)
    }

    async fn download_modules(
        &self,
        course_id: u64,
        modules_path: &Path,
        result: &mut CourseDownload,
    ) {
        let modules = match self.canvas.list_modules(course_id).await {
            Ok(modules) => modules,
            Err(e) => {
                result.push_listing_error(
                    "Modules".to_string(),
                    modules_path,
                    "Error processing modules",
                    e,
                );
                return;
            }
        };

        for module in modules {
            let module_path = modules_path.join(sanitize_filename(&module.name));
            let items = match self.canvas.list_module_items(course_id, module.id).await {
                Ok(items) => items,
                Err(e) => {
                    result.push_listing_error(
                        format!("Module {}", module.name),
                        &module_path,
                        "Error processing module items",
                        e,
                    );
                    continue;
                }
            };

            let mut section: Option<String> = None;
            for item in items {
                match item.kind.as_str() {
                    "SubHeader" | "ExternalUrl" if !item.title.is_empty() => {
                        if let Some(folder) = naming::section_folder(&item.title) {
                            section = Some(folder);
                        }
                    }
                    "File" => {
                        let target = match &section {
                            Some(folder) => module_path.join(sanitize_filename(folder)),
                            None => module_path.clone(),
                        };
                        let outcome = match item.content_id {
                            Some(file_id) => match self.canvas.get_file(course_id, file_id).await {
                                Ok(file) => {
                                    download_file(
                                        self.fetcher.as_ref(),
                                        &file.url,
                                        &target,
                                        Some(&file.filename),
                                    )
                                    .await
                                }
                                Err(e) => DownloadOutcome::error(
                                    item.title.clone(),
                                    &module_path,
                                    format!("Error downloading file: {}", e),
                                ),
                            },
                            None => DownloadOutcome::error(
                                item.title.clone(),
                                &module_path,
                                "Error downloading file: module item has no file id".to_string(),
                            ),
                        };
                        result.push_file(outcome);
                    }
                    _ => {}
                }
            }
        }
    }

    async fn download_assignments(
        &self,
        course_id: u64,
        assignments_path: &Path,
        result: &mut CourseDownload,
    ) {
        let assignments = match self.canvas.list_assignments(course_id).await {
            Ok(assignments) => assignments,
            Err(e) => {
                result.push_listing_error(
                    "Assignments".to_string(),
                    assignments_path,
                    "Error processing assignments",
                    e,
                );
                return;
            }
        };

        for assignment in assignments {
            let target = assignments_path.join(sanitize_filename(&assignment.name));

            for file_id in linked_file_ids(&assignment) {
                let outcome = match self.canvas.get_file(course_id, file_id).await {
                    Ok(file) => {
                        download_file(self.fetcher.as_ref(), &file.url, &target, None).await
                    }
                    Err(e) => DownloadOutcome::error(
                        format!("file {}", file_id),
                        &target,
                        format!("Error downloading file: {}", e),
                    ),
                };
                result.push_file(outcome);
            }

            for attachment in &assignment.attachments {
                let outcome = download_file(
                    self.fetcher.as_ref(),
                    &attachment.url,
                    &target,
                    Some(&attachment.filename),
                )
                .await;
                result.push_file(outcome);
            }
        }
    }

    async fn download_files(&self, course_id: u64, files_path: &Path, result: &mut CourseDownload) {
        let files = match self.canvas.list_files(course_id).await {
            Ok(files) => files,
            Err(e) => {
                result.push_listing_error(
                    "Files".to_string(),
                    files_path,
                    "Error processing course files",
                    e,
                );
                return;
            }
        };

        for file in files {
            let outcome = download_file(
                self.fetcher.as_ref(),
                &file.url,
                files_path,
                Some(&file.filename),
            )
            .await;
            result.push_file(outcome);
        }
    }
}

/// Canvas file ids linked from an assignment description
///
/// Preview links are ignored.
fn linked_file_ids(assignment: &CanvasAssignment) -> Vec<u64> {
    let Some(description) = assignment.description.as_deref() else {
        return Vec::new();
    };

    let mut ids = Vec::new();
    for link in HREF.captures_iter(description) {
        let url = &link[1];
        if !url.contains("/files/") || url.contains("/preview") {
            continue;
        }

        let Some(tail) = url.rsplit("/files/").next() else {
            continue;
        };
        let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
        match digits.parse::<u64>() {
            Ok(id) if !ids.contains(&id) => ids.push(id),
            Ok(_) => {}
            Err(_) => tracing::debug!("Ignoring file link without an id: {}", url),
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::canvas::{Attachment, CanvasFile, Module, ModuleItem};
    use crate::testing::{FakeCanvas, FakeFetcher, FakeFile};
    use tempfile::tempdir;

    fn item(id: u64, kind: &str, title: &str, content_id: Option<u64>) -> ModuleItem {
        ModuleItem {
            id,
            title: title.to_string(),
            kind: kind.to_string(),
            content_id,
        }
    }

    fn file(id: u64, filename: &str) -> CanvasFile {
        CanvasFile {
            id,
            filename: filename.to_string(),
            display_name: None,
            url: format!("https://files.example.edu/{}", id),
            size: None,
        }
    }

    fn fake_course() -> (FakeCanvas, FakeFetcher) {
        let mut canvas = FakeCanvas::default();
        canvas.courses = vec![Course {
            id: 42,
            name: Some("BIO 101: Cells".to_string()),
        }];
        canvas.modules.insert(
            42,
            vec![
                Module { id: 1, name: "Week 1".to_string() },
                Module { id: 2, name: "Broken".to_string() },
            ],
        );
        canvas.module_items.insert(
            1,
            vec![
                item(1, "File", "Overview", Some(100)),
                item(2, "SubHeader", "4 - Diffusion", None),
                item(3, "File", "Slides", Some(101)),
                item(4, "SubHeader", "Reading list", None),
                item(5, "File", "Paper", Some(102)),
                item(6, "Page", "Notes", None),
                item(7, "File", "Gone", Some(999)),
            ],
        );
        for f in [
            file(100, "overview.pdf"),
            file(101, "slides.pdf"),
            file(102, "paper.pdf"),
            file(200, "rubric.pdf"),
            file(300, "syllabus.pdf"),
        ] {
            canvas.files.insert(f.id, f);
        }
        canvas.assignments.insert(
            42,
            vec![CanvasAssignment {
                id: 7,
                name: "Lab 1".to_string(),
                due_at: None,
                published: true,
                points_possible: None,
                html_url: None,
                description: Some(
                    concat!(
                        r#"<p><a href="https://canvas.example.edu/courses/42/files/200/"#,
                        r#"download?wrap=1">Rubric</a>"#,
                        r#"<a href="https://canvas.example.edu/courses/42/files/200/"#,
                        r#"preview">Preview</a>"#,
                        r#"<a href="https://example.com/other">Other</a></p>"#
                    )
                    .to_string(),
                ),
                attachments: vec![Attachment {
                    url: "https://files.example.edu/attachment".to_string(),
                    filename: "data.csv".to_string(),
                }],
            }],
        );
        canvas.course_files.insert(42, vec![file(300, "syllabus.pdf")]);

        let fetcher = FakeFetcher::default()
            .with("https://files.example.edu/100", FakeFile::new(b"overview"))
            .with("https://files.example.edu/101", FakeFile::new(b"slides"))
            .with("https://files.example.edu/102", FakeFile::new(b"paper"))
            .with(
                "https://files.example.edu/200",
                FakeFile::new(b"rubric").disposition("attachment; filename=\"rubric.pdf\""),
            )
            .with("https://files.example.edu/attachment", FakeFile::new(b"a,b"))
            .with("https://files.example.edu/300", FakeFile::new(b"syllabus"));

        (canvas, fetcher)
    }

    #[test]
    fn test_linked_file_ids() {
        let (canvas, _) = fake_course();
        let assignment = &canvas.assignments[&42][0];
        assert_eq!(linked_file_ids(assignment), vec![200]);
    }

    #[tokio::test]
    async fn test_download_course_layout() {
        let home = tempdir().unwrap();
        let target = home.path().join("school");
        let settings = SettingsStore::new(home.path());
        let (canvas, fetcher) = fake_course();

        let downloader =
            CourseDownloader::new(Arc::new(canvas), Arc::new(fetcher), settings.clone());
        let result = downloader
            .download_all_course_files(42, Some(&target))
            .await
            .unwrap();

        let base = target.join("BIO 101_ Cells");
        assert_eq!(result.course_name, "BIO 101: Cells");
        assert_eq!(result.base_path, base);

        for path in [
            "Modules/Week 1/overview.pdf",
            "Modules/Week 1/04 - Diffusion/slides.pdf",
            "Modules/Week 1/04 - Diffusion/paper.pdf",
            "Assignments/Lab 1/rubric.pdf",
            "Assignments/Lab 1/data.csv",
            "Files/syllabus.pdf",
        ] {
            assert!(base.join(path).is_file(), "missing {path}");
        }

        // Module 2 has no items registered, file 999 does not exist
        assert_eq!(
            result.stats,
            DownloadStats {
                total: 7,
                successful: 6,
                failed: 1,
                skipped: 0,
            }
        );
        assert_eq!(
            result
                .files
                .iter()
                .filter(|f| f.status == DownloadStatus::Error)
                .count(),
            2
        );

        // The explicit path becomes the saved default
        assert_eq!(settings.download_path().await, target);
    }

    #[tokio::test]
    async fn test_second_run_skips_existing_files() {
        let home = tempdir().unwrap();
        let settings = SettingsStore::new(home.path());
        let (canvas, fetcher) = fake_course();
        let downloader = CourseDownloader::new(Arc::new(canvas), Arc::new(fetcher), settings);

        downloader.download_all_course_files(42, None).await.unwrap();
        let again = downloader.download_all_course_files(42, None).await.unwrap();

        assert_eq!(again.stats.skipped, 6);
        assert_eq!(again.stats.successful, 0);
        assert!(home.path().join("Canvas_Downloads/BIO 101_ Cells/Files/syllabus.pdf").is_file());
    }

    #[tokio::test]
    async fn test_unknown_course_is_an_error() {
        let home = tempdir().unwrap();
        let (canvas, fetcher) = fake_course();
        let settings = SettingsStore::new(home.path());
        let downloader = CourseDownloader::new(Arc::new(canvas), Arc::new(fetcher), settings);

        assert!(downloader.download_all_course_files(7, None).await.is_err());
    }
}
