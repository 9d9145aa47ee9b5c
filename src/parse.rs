//! Input list parsing.
//!
//! Line indices are positions in the original file. Blank and comment lines
//! consume an index without producing a record, which keeps resume offsets
//! valid when the file is edited only below the cursor.
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// One importable line of the input list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    pub line_index: usize,
    pub raw_text: String,
    pub title: String,
    pub year: Option<i32>,
}

impl InputRecord {
    /// 1-based line number for operator-facing messages.
    pub fn line_no(&self) -> usize {
        self.line_index + 1
    }
}

/// Full input text split into lines; records are derived lazily on demand.
#[derive(Debug, Clone)]
pub struct InputList {
    lines: Vec<String>,
}

impl InputList {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Total line count including blanks and comments.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Records in file order, starting at the first line index `>= start`.
    pub fn records_from(&self, start: usize) -> impl Iterator<Item = InputRecord> + '_ {
        self.lines
            .iter()
            .enumerate()
            .skip(start)
            .filter_map(|(index, raw)| parse_line(index, raw))
    }
}

pub fn load_input(path: &Path) -> Result<InputList> {
    if !path.is_file() {
        return Err(anyhow!("Input file not found: {}", path.display()));
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    Ok(InputList::from_text(&text))
}

/// Parse a single line, returning `None` for blanks and `#` comments.
pub fn parse_line(line_index: usize, raw: &str) -> Option<InputRecord> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (title, year) = parse_title_year(trimmed);
    Some(InputRecord {
        line_index,
        raw_text: trimmed.to_string(),
        title,
        year,
    })
}

/// Split an optional trailing `(YYYY)` off a title.
///
/// Anything else in parentheses stays part of the title.
pub fn parse_title_year(text: &str) -> (String, Option<i32>) {
    let trimmed = text.trim();
    if let Some(caps) = year_suffix().captures(trimmed) {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or(trimmed.len());
        let title = trimmed[..whole].trim();
        let year = caps.get(1).and_then(|m| m.as_str().parse::<i32>().ok());
        if !title.is_empty() {
            if let Some(year) = year {
                return (title.to_string(), Some(year));
            }
        }
    }
    (trimmed.to_string(), None)
}

fn year_suffix() -> &'static Regex {
    static YEAR_SUFFIX: OnceLock<Regex> = OnceLock::new();
    YEAR_SUFFIX.get_or_init(|| Regex::new(r"\((\d{4})\)\s*$").expect("valid year regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_year_is_extracted() {
        assert_eq!(
            parse_title_year("The Matrix (1999)"),
            ("The Matrix".to_string(), Some(1999))
        );
        assert_eq!(
            parse_title_year("  Heat   (1995)  "),
            ("Heat".to_string(), Some(1995))
        );
    }

    #[test]
    fn malformed_parentheticals_stay_in_title() {
        assert_eq!(
            parse_title_year("Blade Runner (Final Cut)"),
            ("Blade Runner (Final Cut)".to_string(), None)
        );
        assert_eq!(
            parse_title_year("Movie (99)"),
            ("Movie (99)".to_string(), None)
        );
        assert_eq!(
            parse_title_year("Movie (1999) Remastered"),
            ("Movie (1999) Remastered".to_string(), None)
        );
        assert_eq!(parse_title_year("(1999)"), ("(1999)".to_string(), None));
    }

    #[test]
    fn blanks_and_comments_consume_indices() {
        let input = InputList::from_text("# header\n\nAlien (1979)\r\n   \n  # note\nAliens\n");
        assert_eq!(input.line_count(), 6);
        let records: Vec<_> = input.records_from(0).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line_index, 2);
        assert_eq!(records[0].title, "Alien");
        assert_eq!(records[0].year, Some(1979));
        assert_eq!(records[1].line_index, 5);
        assert_eq!(records[1].raw_text, "Aliens");
        assert_eq!(records[1].year, None);
    }

    #[test]
    fn records_from_resumes_at_index() {
        let input = InputList::from_text("A\nB\nC\n");
        let titles: Vec<_> = input.records_from(1).map(|r| r.title).collect();
        assert_eq!(titles, vec!["B", "C"]);
        assert_eq!(input.records_from(3).count(), 0);
        assert_eq!(input.records_from(10).count(), 0);
    }

    #[test]
    fn load_input_reports_missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = load_input(&dir.path().join("missing.txt")).expect_err("missing file");
        assert!(err.to_string().contains("Input file not found"));
    }
}
