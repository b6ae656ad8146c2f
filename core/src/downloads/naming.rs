//! File and folder naming for downloaded course content

use regex::Regex;
use std::sync::LazyLock;

static SECTION_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"^(\d{1,2})\s*-\s*(.+)").expect("valid regex"),
        Regex::new(r"^(\d{1,2})\.\s*(.+)").expect("valid regex"),
        Regex::new(r"^(\d{1,2})\s+(.+)").expect("valid regex"),
    ]
});

static DISPOSITION_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bfilename\s*=\s*(?:"([^"]*)"|([^;]+))"#).expect("valid regex")
});

/// Make a name safe to use as a single path component on any OS
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| (*c as u32) >= 32)
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Section number and title from headers like `04 - Diffusion`
///
/// The number is zero-padded to two digits.
pub fn extract_section_info(title: &str) -> Option<(String, String)> {
    SECTION_PATTERNS.iter().find_map(|pattern| {
        let captures = pattern.captures(title)?;
        let name = captures[2].trim();
        if name.is_empty() {
            return None;
        }
        Some((format!("{:0>2}", &captures[1]), name.to_string()))
    })
}

/// Folder name for a module section header
pub fn section_folder(title: &str) -> Option<String> {
    extract_section_info(title).map(|(number, name)| format!("{} - {}", number, name))
}

/// `filename=` value of a `Content-Disposition` header
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let captures = DISPOSITION_FILENAME.captures(header)?;
    let name = captures
        .get(1)
        .or_else(|| captures.get(2))?
        .as_str()
        .trim()
        .trim_matches('"');
    (!name.is_empty()).then(|| name.to_string())
}

/// Last path segment of a URL, without query string
pub fn filename_from_url(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Extension (with leading dot) for a `Content-Type` value
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let parsed: mime::Mime = content_type.parse().ok()?;

    let ext = match parsed.essence_str() {
        "application/pdf" => ".pdf",
        "application/zip" => ".zip",
        "application/json" => ".json",
        "application/msword" => ".doc",
        "application/vnd.ms-excel" => ".xls",
        "application/vnd.ms-powerpoint" => ".ppt",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => ".docx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => ".xlsx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => ".pptx",
        "text/plain" => ".txt",
        "text/html" => ".html",
        "text/csv" => ".csv",
        "text/markdown" => ".md",
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/gif" => ".gif",
        "image/svg+xml" => ".svg",
        "audio/mpeg" => ".mp3",
        "video/mp4" => ".mp4",
        _ => return None,
    };
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Lab 1: Intro/Setup?.pdf"), "Lab 1_ Intro_Setup_.pdf");
        assert_eq!(sanitize_filename(" a<b>c|d*e\"f\\g "), "a_b_c_d_e_f_g");
        assert_eq!(sanitize_filename("tab\there\u{7}.txt"), "tabhere.txt");
        assert_eq!(sanitize_filename("Économie"), "Économie");
    }

    #[test]
    fn test_extract_section_info() {
        assert_eq!(
            extract_section_info("04 - Diffusion at Cellular and Molecular Scales"),
            Some(("04".to_string(), "Diffusion at Cellular and Molecular Scales".to_string()))
        );
        assert_eq!(
            extract_section_info("4. Kinetics"),
            Some(("04".to_string(), "Kinetics".to_string()))
        );
        assert_eq!(
            extract_section_info("12 Review  "),
            Some(("12".to_string(), "Review".to_string()))
        );
        assert_eq!(extract_section_info("123 Numbers"), None);
        assert_eq!(extract_section_info("Week 4"), None);
        assert_eq!(section_folder("7-Final"), Some("07 - Final".to_string()));
    }

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition(
                r#"attachment; filename="Lecture 1.pdf"; filename*=UTF-8''Lecture%201.pdf"#
            ),
            Some("Lecture 1.pdf".to_string())
        );
        assert_eq!(
            filename_from_disposition("inline; filename=notes.txt"),
            Some("notes.txt".to_string())
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://files.example.edu/a/b/syllabus.pdf?download=1&token=x"),
            Some("syllabus.pdf".to_string())
        );
        assert_eq!(filename_from_url("https://files.example.edu/dir/"), None);
    }

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(extension_for_content_type("application/pdf"), Some(".pdf"));
        assert_eq!(extension_for_content_type("text/plain; charset=utf-8"), Some(".txt"));
        assert_eq!(extension_for_content_type("application/x-unknown"), None);
        assert_eq!(extension_for_content_type("not a mime"), None);
    }
}
