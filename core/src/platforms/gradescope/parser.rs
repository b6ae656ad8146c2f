//! Scrapers for the Gradescope account and course pages

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::sync::LazyLock;

use super::{GradescopeAssignment, GradescopeCourse};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid regex")
});

static TOKEN_INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<input[^>]*name="authenticity_token"[^>]*>"#).expect("valid regex")
});
static CSRF_META: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<meta[^>]*name="csrf-token"[^>]*>"#).expect("valid regex"));

static PAGE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<h1[^>]*class="[^"]*\bpageHeading\b[^"]*"[^>]*>(.*?)</h1>"#)
        .expect("valid regex")
});
static COURSE_LIST_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?s)<div[^>]*class="courseList--term\b[^"]*"[^>]*>(.*?)</div>"#,
        r#"|(<a[^>]*class="courseBox\b[^"]*"[^>]*>)(.*?)</a>"#,
    ))
    .expect("valid regex")
});
static COURSE_SHORT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="courseBox--shortname\b[^"]*"[^>]*>(.*?)</"#).expect("valid regex")
});
static COURSE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="courseBox--name\b[^"]*"[^>]*>(.*?)</"#).expect("valid regex")
});
static COURSE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/courses/(\d+)").expect("valid regex"));

static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<tr\b[^>]*>(.*?)</tr>").expect("valid regex"));
static PRIMARY_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<th[^>]*class="[^"]*\btable--primaryLink\b[^"]*"[^>]*>(.*?)</th>"#)
        .expect("valid regex")
});
static STATUS_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="submissionStatus--text\b[^"]*"[^>]*>(.*?)</div>"#)
        .expect("valid regex")
});
static DUE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<time[^>]*class="[^"]*\bsubmissionTimeChart--dueDate\b[^"]*"[^>]*>"#)
        .expect("valid regex")
});

/// CSRF token needed to post the login form
pub fn authenticity_token(html: &str) -> Option<String> {
    TOKEN_INPUT
        .find(html)
        .and_then(|tag| attribute(tag.as_str(), "value"))
        .or_else(|| CSRF_META.find(html).and_then(|tag| attribute(tag.as_str(), "content")))
        .filter(|token| !token.is_empty())
}

/// Courses from the account page where the user is a student
pub fn parse_courses(html: &str) -> Vec<GradescopeCourse> {
    let Some(section) = student_section(html) else {
        return Vec::new();
    };

    let mut courses = Vec::new();
    let mut term = String::new();

    for entry in COURSE_LIST_ENTRY.captures_iter(section) {
        if let Some(term_text) = entry.get(1) {
            term = text(term_text.as_str());
            continue;
        }

        let (Some(tag), Some(body)) = (entry.get(2), entry.get(3)) else {
            continue;
        };
        let Some(id) = attribute(tag.as_str(), "href")
            .and_then(|href| COURSE_ID.captures(&href).map(|c| c[1].to_string()))
        else {
            continue;
        };

        let short_name = COURSE_SHORT_NAME
            .captures(body.as_str())
            .map(|c| text(&c[1]))
            .unwrap_or_default();
        let name = COURSE_NAME
            .captures(body.as_str())
            .map(|c| text(&c[1]))
            .unwrap_or_else(|| short_name.clone());

        courses.push(GradescopeCourse {
            id,
            short_name,
            name,
            term: term.clone(),
        });
    }

    courses
}

/// Assignment rows from a course page
pub fn parse_assignments(html: &str) -> Vec<GradescopeAssignment> {
    TABLE_ROW
        .captures_iter(html)
        .filter_map(|row| parse_assignment_row(&row[1]))
        .collect()
}

fn parse_assignment_row(row: &str) -> Option<GradescopeAssignment> {
    let name = text(&PRIMARY_CELL.captures(row)?[1]);
    if name.is_empty() {
        return None;
    }

    let status = STATUS_TEXT
        .captures(row)
        .map(|c| text(&c[1]))
        .filter(|s| !s.is_empty())
        .or_else(|| row.contains("submissionStatus--score").then(|| "Submitted".to_string()));

    let mut dates = DUE_DATE
        .find_iter(row)
        .filter_map(|tag| attribute(tag.as_str(), "datetime"))
        .filter_map(|raw| parse_datetime(&raw));

    Some(GradescopeAssignment {
        name,
        status,
        due_date: dates.next(),
        late_due_date: dates.next(),
    })
}

/// The "Student Courses" part of the account page
///
/// Accounts with a single role have no role headings, in which case the
/// whole page is used. An instructor-only page yields nothing.
fn student_section(html: &str) -> Option<&str> {
    let headings: Vec<_> = PAGE_HEADING
        .captures_iter(html)
        .filter_map(|c| {
            let whole = c.get(0)?;
            Some((whole.start(), whole.end(), text(&c[1])))
        })
        .collect();

    let is_role_heading = |title: &str| {
        title.ends_with("Courses") && (title.contains("Student") || title.contains("Instructor"))
    };
    if !headings.iter().any(|(_, _, title)| is_role_heading(title)) {
        return Some(html);
    }

    let position = headings
        .iter()
        .position(|(_, _, title)| title.contains("Student Courses"))?;
    let start = headings[position].1;
    let end = headings
        .get(position + 1)
        .map(|(next_start, _, _)| *next_start)
        .unwrap_or(html.len());

    Some(&html[start..end])
}

fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    match DateTime::parse_from_str(raw.trim(), DATETIME_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!("Unparseable Gradescope date {:?}: {}", raw, e);
            None
        }
    }
}

/// Value of a named attribute inside a single start tag
fn attribute(tag: &str, name: &str) -> Option<String> {
    ATTRIBUTE
        .captures_iter(tag)
        .find(|c| c[1].eq_ignore_ascii_case(name))
        .and_then(|c| c.get(2).or_else(|| c.get(3)))
        .map(|value| decode_entities(value.as_str()))
}

/// Visible text of an HTML fragment
pub fn text(fragment: &str) -> String {
    let stripped = TAG.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

pub fn decode_entities(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
