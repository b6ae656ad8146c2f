//! Per-platform assignment sources

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::{Assignment, DeadlineWindow};
use crate::error::{Error, Result};
use crate::platforms::{CanvasApi, GradescopeApi, Platform};

/// Submission state used when Canvas does not report one
const NO_SUBMISSION: &str = "No submission";
/// Status used when Gradescope shows none
const NOT_SUBMITTED: &str = "Not submitted";

/// A platform that can report upcoming, unsubmitted assignments
#[async_trait]
pub trait AssignmentSource: Send + Sync {
    fn platform(&self) -> Platform;

    async fn upcoming(&self, window: &DeadlineWindow) -> Result<Vec<Assignment>>;
}

fn fetch_error(platform: Platform, e: Error) -> Error {
    Error::Generic(format!("Error fetching {} assignments: {}", platform, e))
}

/// Canvas assignments from current-term courses
pub struct CanvasSource {
    api: Arc<dyn CanvasApi>,
}

impl CanvasSource {
    pub fn new(api: Arc<dyn CanvasApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AssignmentSource for CanvasSource {
    fn platform(&self) -> Platform {
        Platform::Canvas
    }

    async fn upcoming(&self, window: &DeadlineWindow) -> Result<Vec<Assignment>> {
        let courses = self
            .api
            .list_active_courses()
            .await
            .map_err(|e| fetch_error(Platform::Canvas, e))?;

        let mut upcoming = Vec::new();
        for course in courses
            .iter()
            .filter(|c| window.term.matches_course_name(c.display_name()))
        {
            let assignments = match self.api.list_assignments(course.id).await {
                Ok(assignments) => assignments,
                Err(e) => {
                    tracing::warn!("Skipping Canvas course {}: {}", course.display_name(), e);
                    continue;
                }
            };

            for assignment in assignments {
                let Some(due) = assignment.due_at else {
                    continue;
                };
                if !assignment.published || due < window.now || due > window.end {
                    continue;
                }

                let state = match self.api.submission_state(course.id, assignment.id).await {
                    Ok(Some(state)) => state,
                    Ok(None) => NO_SUBMISSION.to_string(),
                    Err(e) => {
                        tracing::debug!("No submission for assignment {}: {}", assignment.id, e);
                        NO_SUBMISSION.to_string()
                    }
                };
                if state == "submitted" || state == "graded" {
                    continue;
                }

                upcoming.push(Assignment {
                    platform: Platform::Canvas,
                    course_name: course.display_name().to_string(),
                    assignment_name: assignment.name,
                    due_date: due,
                    late_due_date: None,
                    points_possible: assignment.points_possible,
                    url: assignment.html_url,
                    status: Some(state),
                });
            }
        }

        Ok(upcoming)
    }
}

/// Gradescope assignments from current-term student courses
pub struct GradescopeSource {
    api: Arc<dyn GradescopeApi>,
}

impl GradescopeSource {
    pub fn new(api: Arc<dyn GradescopeApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AssignmentSource for GradescopeSource {
    fn platform(&self) -> Platform {
        Platform::Gradescope
    }

    async fn upcoming(&self, window: &DeadlineWindow) -> Result<Vec<Assignment>> {
        let courses = self
            .api
            .list_student_courses()
            .await
            .map_err(|e| fetch_error(Platform::Gradescope, e))?;

        let mut upcoming = Vec::new();
        for course in courses.iter().filter(|c| {
            c.semester_and_year()
                .is_some_and(|(season, year)| window.term.matches(season, year))
        }) {
            let assignments = self
                .api
                .list_assignments(&course.id)
                .await
                .map_err(|e| fetch_error(Platform::Gradescope, e))?;

            for assignment in assignments {
                if assignment.status.as_deref() == Some("Submitted") {
                    continue;
                }
                let Some(due) = assignment.due_date.map(|d| d.with_timezone(&Utc)) else {
                    continue;
                };
                if due <= window.now || due > window.end {
                    continue;
                }

                upcoming.push(Assignment {
                    platform: Platform::Gradescope,
                    course_name: course.name.clone(),
                    assignment_name: assignment.name,
                    due_date: due,
                    late_due_date: assignment.late_due_date.map(|d| d.with_timezone(&Utc)),
                    points_possible: None,
                    url: None,
                    status: Some(
                        assignment
                            .status
                            .unwrap_or_else(|| NOT_SUBMITTED.to_string()),
                    ),
                });
            }
        }

        Ok(upcoming)
    }
}
