//! Built-in tools

pub mod courses;
pub mod deadlines;
pub mod download_path;

pub use courses::{
    DownloadCourseFilesTool, DownloadCourseFilesToolFactory, ListCoursesTool,
    ListCoursesToolFactory,
};
pub use deadlines::{
    AddToRemindersTool, AddToRemindersToolFactory, GetDeadlinesTool, GetDeadlinesToolFactory,
};
pub use download_path::{
    GetDownloadPathInfoTool, GetDownloadPathInfoToolFactory, SetDownloadPathTool,
    SetDownloadPathToolFactory,
};

use std::path::PathBuf;

/// Expand a leading `~` in a user-supplied path
pub(crate) fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw.trim()).into_owned())
}
