//! Upcoming deadline aggregation across Canvas and Gradescope

mod sources;
mod term;

pub use sources::{AssignmentSource, CanvasSource, GradescopeSource};
pub use term::{Season, Term};

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, ToolError};
use crate::platforms::{CanvasApi, GradescopeApi, Platform};

/// Format used for dates shown to the user
pub const DATE_FORMAT: &str = "%Y-%m-%d %I:%M %p %Z";

/// Default look-ahead for deadline queries
pub const DEFAULT_DAYS_AHEAD: i64 = 14;

/// An upcoming assignment from either platform
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub platform: Platform,
    pub course_name: String,
    pub assignment_name: String,
    pub due_date: DateTime<Utc>,
    pub late_due_date: Option<DateTime<Utc>>,
    pub points_possible: Option<f64>,
    pub url: Option<String>,
    pub status: Option<String>,
}

/// Time range a deadline query covers
#[derive(Debug, Clone, Copy)]
pub struct DeadlineWindow {
    pub now: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub term: Term,
}

impl DeadlineWindow {
    /// Window of `days_ahead` days starting at `now`, in the term containing `now`
    pub fn new(now: DateTime<Utc>, days_ahead: i64) -> Result<Self> {
        let end = Duration::try_days(days_ahead)
            .filter(|_| days_ahead >= 0)
            .and_then(|ahead| now.checked_add_signed(ahead))
            .ok_or_else(|| ToolError::InvalidParameters {
                message: format!("days_ahead out of range: {}", days_ahead),
            })?;

        Ok(Self {
            now,
            end,
            term: Term::for_date(&now.with_timezone(&Local)),
        })
    }
}

/// Deadline as returned to the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineView {
    pub platform: Platform,
    pub course_name: String,
    pub assignment_name: String,
    pub due_date: String,
    pub late_due_date: Option<String>,
    pub points_possible: Option<f64>,
    pub url: Option<String>,
    pub status: Option<String>,
    pub time_remaining: String,
}

impl DeadlineView {
    /// Render an assignment with dates in `tz`
    pub fn render<Tz>(assignment: &Assignment, now: DateTime<Utc>, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let format = |date: &DateTime<Utc>| date.with_timezone(tz).format(DATE_FORMAT).to_string();

        Self {
            platform: assignment.platform,
            course_name: assignment.course_name.clone(),
            assignment_name: assignment.assignment_name.clone(),
            due_date: format(&assignment.due_date),
            late_due_date: assignment.late_due_date.as_ref().map(format),
            points_possible: assignment.points_possible,
            url: assignment.url.clone(),
            status: assignment.status.clone(),
            time_remaining: format_time_remaining(assignment.due_date - now),
        }
    }
}

/// `"{d} days, {h} hours"`, or `"{h} hours"` under a day
pub fn format_time_remaining(remaining: Duration) -> String {
    let seconds = remaining.num_seconds().max(0);
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;

    if days > 0 {
        format!("{} days, {} hours", days, hours)
    } else {
        format!("{} hours", hours)
    }
}

/// Collects deadlines from every configured source
pub struct DeadlineScraper {
    sources: Vec<Box<dyn AssignmentSource>>,
}

impl DeadlineScraper {
    pub fn new(sources: Vec<Box<dyn AssignmentSource>>) -> Self {
        Self { sources }
    }

    /// Gradescope first, then Canvas
    pub fn for_services(canvas: Arc<dyn CanvasApi>, gradescope: Arc<dyn GradescopeApi>) -> Self {
        Self::new(vec![
            Box::new(GradescopeSource::new(gradescope)),
            Box::new(CanvasSource::new(canvas)),
        ])
    }

    /// All upcoming assignments, ordered by due date
    pub async fn collect(&self, days_ahead: i64, now: DateTime<Utc>) -> Result<Vec<Assignment>> {
        let window = DeadlineWindow::new(now, days_ahead)?;
        tracing::debug!("Collecting deadlines for {} until {}", window.term, window.end);

        let mut assignments = Vec::new();
        for source in &self.sources {
            let found = source.upcoming(&window).await?;
            tracing::info!("{} upcoming {} assignments", found.len(), source.platform());
            assignments.extend(found);
        }

        assignments.sort_by_key(|a| a.due_date);
        Ok(assignments)
    }

    /// Upcoming deadlines rendered in the local timezone
    pub async fn upcoming_deadlines(
        &self,
        days_ahead: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<DeadlineView>> {
        let assignments = self.collect(days_ahead, now).await?;
        Ok(assignments
            .iter()
            .map(|a| DeadlineView::render(a, now, &Local))
            .collect())
    }
}
