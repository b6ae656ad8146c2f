//! Academic term detection

use chrono::Datelike;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Standardised course codes such as `ECONUN1155_001_2024_1`
static COURSE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*_\d{3}_(\d{4})_(\d)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub fn name(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }

    /// Numeric term code used in course codes
    pub fn code(&self) -> u32 {
        match self {
            Season::Spring => 1,
            Season::Summer => 2,
            Season::Fall => 3,
        }
    }

    fn for_month(month: u32) -> Self {
        match month {
            1..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Fall,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub season: Season,
    pub year: i32,
}

impl Term {
    pub fn new(season: Season, year: i32) -> Self {
        Self { season, year }
    }

    /// Term containing `date`
    pub fn for_date<D: Datelike>(date: &D) -> Self {
        Self {
            season: Season::for_month(date.month()),
            year: date.year(),
        }
    }

    /// Whether a Gradescope term heading (`Spring`, `2024`) is this term
    ///
    /// Gradescope capitalises its headings, so the comparison is exact.
    pub fn matches(&self, season: &str, year: &str) -> bool {
        season == self.season.name() && year == self.year.to_string()
    }

    /// Whether a Canvas course name belongs to this term
    ///
    /// Course codes of the form `..._NNN_YYYY_T...` are compared exactly.
    /// Other names match when they mention the term, e.g. `Spring 2024`,
    /// `spring2024`, `2024Spring`, `Spring'24` or `Spring '24`.
    pub fn matches_course_name(&self, course_name: &str) -> bool {
        if let Some(code) = COURSE_CODE.captures(course_name) {
            return code[1] == self.year.to_string() && code[2] == self.season.code().to_string();
        }

        let name = course_name.to_lowercase();
        let season = self.season.name().to_lowercase();
        let year = self.year.to_string();
        let short_year = format!("{:02}", self.year.rem_euclid(100));

        [
            format!("{} {}", season, year),
            format!("{}{}", season, year),
            format!("{}{}", year, season),
            format!("{}'{}", season, short_year),
            format!("{} '{}", season, short_year),
        ]
        .iter()
        .any(|pattern| name.contains(pattern.as_str()))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.season.name(), self.year)
    }
}
