//! Sentence extraction from uploaded files.
//!
//! Plain text and CSV files become one sentence per line; subtitle files have
//! their index and timing lines dropped and multi-line cues joined.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static JAPANESE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ぁ-んァ-ン一-龯]").expect("valid regex"));
static INDEX_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}:\d{2}:\d{2}").expect("valid regex"));
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n|\r").expect("valid regex"));

/// Supported upload kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Subtitle,
    LineList,
}

impl SourceKind {
    /// Detect the kind from a file name
    pub fn from_filename(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("csv") => SourceKind::Csv,
            Some("srt") | Some("vtt") => SourceKind::Subtitle,
            _ => SourceKind::LineList,
        }
    }
}

pub fn contains_japanese(text: &str) -> bool {
    JAPANESE.is_match(text)
}

fn is_boundary(line: &str) -> bool {
    line.is_empty() || INDEX_LINE.is_match(line) || TIMESTAMP.is_match(line)
}

/// First column of every non-empty CSV line
pub fn parse_csv(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.split(',').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Japanese lines of a text file, skipping index and timestamp lines
pub fn parse_line_list(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !is_boundary(line))
        .filter(|line| contains_japanese(line))
        .map(str::to_string)
        .collect()
}

/// Cue texts of a subtitle file. Consecutive Japanese lines are joined with a
/// space until a blank, index, or timestamp line ends the cue.
pub fn parse_subtitles(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for raw in LINE_BREAK.split(text) {
        let line = raw.trim();

        if is_boundary(line) {
            flush(&mut current, &mut sentences);
            continue;
        }

        if contains_japanese(line) {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(line);
        }
    }
    flush(&mut current, &mut sentences);

    sentences
}

fn flush(current: &mut String, sentences: &mut Vec<String>) {
    if !current.is_empty() && contains_japanese(current) {
        sentences.push(current.trim().to_string());
        current.clear();
    }
}

/// Parse file content according to its name
pub fn parse_file(filename: &str, text: &str) -> Vec<String> {
    match SourceKind::from_filename(filename) {
        SourceKind::Csv => parse_csv(text),
        SourceKind::Subtitle => parse_subtitles(text),
        SourceKind::LineList => parse_line_list(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SRT: &str = "1\r\n00:00:01,000 --> 00:00:02,500\r\nこんにちは\r\n\r\n2\r\n00:00:03,000 --> 00:00:05,000\r\n今日は\r\nいい天気ですね\r\n\r\n3\r\n00:00:06,000 --> 00:00:07,000\r\nOK!\r\n";

    #[test]
    fn test_source_kind_from_filename() {
        assert_eq!(SourceKind::from_filename("words.csv"), SourceKind::Csv);
        assert_eq!(SourceKind::from_filename("EP01.SRT"), SourceKind::Subtitle);
        assert_eq!(SourceKind::from_filename("notes.txt"), SourceKind::LineList);
        assert_eq!(SourceKind::from_filename("README"), SourceKind::LineList);
    }

    #[test]
    fn test_parse_subtitles_joins_multiline_cues() {
        let sentences = parse_subtitles(SRT);
        assert_eq!(sentences, vec!["こんにちは", "今日は いい天気ですね"]);
    }

    #[test]
    fn test_parse_subtitles_without_japanese_is_empty() {
        let text = "1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\n";
        assert!(parse_subtitles(text).is_empty());
    }

    #[test]
    fn test_parse_subtitles_ignores_latin_lines_inside_cue() {
        let text = "1\n00:00:01,000 --> 00:00:02,000\nHello\nさようなら\n";
        assert_eq!(parse_subtitles(text), vec!["さようなら"]);
    }

    #[test]
    fn test_parse_subtitles_old_mac_line_endings() {
        let text = "1\r00:00:01,000 --> 00:00:02,000\rありがとう\r";
        assert_eq!(parse_subtitles(text), vec!["ありがとう"]);
    }

    #[test]
    fn test_parse_line_list() {
        let text = "12\n00:01:02 something\n  猫が好き  \nhello\n\nカタカナ\n";
        assert_eq!(parse_line_list(text), vec!["猫が好き", "カタカナ"]);
    }

    #[test]
    fn test_parse_csv_takes_first_column() {
        let text = "今日は,today\n\n明日,tomorrow\n ,empty\n";
        assert_eq!(parse_csv(text), vec!["今日は", "明日"]);
    }

    #[test]
    fn test_parse_file_dispatch() {
        assert_eq!(parse_file("a.srt", SRT).len(), 2);
        assert_eq!(parse_file("a.csv", "x,y").len(), 1);
        assert!(parse_file("a.txt", "english only").is_empty());
    }
}
