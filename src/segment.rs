//! Annotation result model
//!
//! A sentence analyzed by the model arrives as an ordered list of [`Segment`]s.
//! Each segment carries its own word-level fields plus "cumulative" fields that
//! hold the running total of every segment up to and including itself.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One word/phrase unit of an analyzed sentence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Japanese surface text of this unit
    #[serde(default, deserialize_with = "lenient_string")]
    pub jp: String,
    /// Hiragana reading
    #[serde(default, deserialize_with = "lenient_string")]
    pub read: String,
    /// Korean pronunciation
    #[serde(default, deserialize_with = "lenient_string")]
    pub kr: String,
    /// Korean meaning
    #[serde(default, deserialize_with = "lenient_string")]
    pub meaning: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cumulative_jp: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cumulative_read: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cumulative_kr: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cumulative_translation: String,
    /// Whole-sentence translation, attached to at most a few segments
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub sentence_translation: Option<String>,
}

/// Word unit returned by the reduced annotation used after Korean→Japanese translation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordReading {
    #[serde(default, deserialize_with = "lenient_string")]
    pub jp: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub read: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub kr: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub meaning: String,
}

/// Grammatical unit from sentence analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisUnit {
    #[serde(default, deserialize_with = "lenient_string")]
    pub word: String,
    /// Part of speech (in Korean)
    #[serde(default, deserialize_with = "lenient_string")]
    pub pos: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reading: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub meaning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub analysis: Vec<AnalysisUnit>,
}

/// Coerce whatever the model put in a field into a string; absent, null,
/// `false` and structured values become the empty string.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => String::new(),
    })
}

/// Like [`lenient_string`], but an empty result means the field is absent
fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = lenient_string(deserializer)?;
    Ok((!s.is_empty()).then_some(s))
}

/// A segment plus the client-only playback state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedSegment {
    pub segment: Segment,
    /// Set once the segment's translation has been appended to the reveal log
    pub meaning_shown: bool,
    /// Character offset of `segment.jp` within the spoken sentence
    pub start_index: usize,
}

/// The segments of exactly one sentence, replaced wholesale on each generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationResult {
    items: Vec<AnnotatedSegment>,
}

impl AnnotationResult {
    pub fn new(segments: Vec<Segment>) -> Self {
        let items = segments
            .into_iter()
            .map(|segment| AnnotatedSegment {
                segment,
                meaning_shown: false,
                start_index: 0,
            })
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[AnnotatedSegment] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&AnnotatedSegment> {
        self.items.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut AnnotatedSegment> {
        self.items.get_mut(index)
    }

    /// Plain segments, in order, for rendering or persisting
    pub fn segments(&self) -> Vec<Segment> {
        self.items.iter().map(|item| item.segment.clone()).collect()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.items.last().map(|item| &item.segment)
    }

    /// Forget every reveal so a new playback pass starts from scratch
    pub fn reset_reveals(&mut self) {
        for item in &mut self.items {
            item.meaning_shown = false;
        }
    }

    /// Locate each segment's text within `text`, scanning forward from the
    /// previous match. A segment that cannot be found keeps the current cursor,
    /// so offsets never decrease.
    pub fn compute_start_indices(&mut self, text: &str) {
        let mut cursor = 0usize;
        for item in &mut self.items {
            match find_chars(text, &item.segment.jp, cursor) {
                Some(found) => {
                    item.start_index = found;
                    cursor = found + item.segment.jp.chars().count();
                }
                None => item.start_index = cursor,
            }
        }
    }
}

/// Character-offset substring search: find `needle` in `haystack` starting at
/// character `from`, returning the character offset of the match.
fn find_chars(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let start_byte = match haystack.char_indices().nth(from) {
        Some((byte, _)) => byte,
        None if haystack.chars().count() == from => haystack.len(),
        None => return None,
    };
    haystack[start_byte..]
        .find(needle)
        .map(|byte| from + haystack[start_byte..start_byte + byte].chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seg(jp: &str) -> Segment {
        Segment {
            jp: jp.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let parsed: Segment = serde_json::from_str(r#"{"jp": "今日の", "read": null}"#).unwrap();
        assert_eq!(parsed.jp, "今日の");
        assert_eq!(parsed.read, "");
        assert_eq!(parsed.cumulative_translation, "");
        assert!(parsed.sentence_translation.is_none());
    }

    #[test]
    fn test_camel_case_field_names() {
        let parsed: Segment = serde_json::from_str(
            r#"{"jp": "何を", "cumulativeJp": "今日の晩ご飯は何を", "sentenceTranslation": "무엇을"}"#,
        )
        .unwrap();
        assert_eq!(parsed.cumulative_jp, "今日の晩ご飯は何を");
        assert_eq!(parsed.sentence_translation.as_deref(), Some("무엇을"));

        let value = serde_json::to_value(&parsed).unwrap();
        assert_eq!(value["cumulativeJp"], "今日の晩ご飯は何を");
        assert!(value.get("cumulativeKr").is_some());
    }

    #[test]
    fn test_lenient_non_string_values() {
        let parsed: WordReading =
            serde_json::from_str(r#"{"jp": 3, "read": false, "kr": ["x"], "meaning": 0}"#).unwrap();
        assert_eq!(parsed.jp, "3");
        assert_eq!(parsed.read, "");
        assert_eq!(parsed.kr, "");
        assert_eq!(parsed.meaning, "");
    }

    #[test]
    fn test_non_string_sentence_translation_keeps_segment() {
        let parsed: Segment = serde_json::from_str(
            r#"{"jp": "猫", "cumulativeJp": "猫", "sentenceTranslation": 5}"#,
        )
        .unwrap();
        assert_eq!(parsed.jp, "猫");
        assert_eq!(parsed.cumulative_jp, "猫");
        assert_eq!(parsed.sentence_translation.as_deref(), Some("5"));

        for raw in [r#"{"sentenceTranslation": {"ko": "x"}}"#, r#"{"sentenceTranslation": ""}"#] {
            let parsed: Segment = serde_json::from_str(raw).unwrap();
            assert!(parsed.sentence_translation.is_none(), "{raw}");
        }
    }

    #[test]
    fn test_compute_start_indices() {
        let mut result = AnnotationResult::new(vec![seg("今日の"), seg("晩ご飯は"), seg("何を"), seg("食べようか")]);
        result.compute_start_indices("今日の晩ご飯は何を食べようか");

        let starts: Vec<usize> = result.items().iter().map(|i| i.start_index).collect();
        assert_eq!(starts, vec![0, 3, 7, 9]);
    }

    #[test]
    fn test_start_indices_stay_monotonic_on_mismatch() {
        let mut result = AnnotationResult::new(vec![seg("今日の"), seg("夕飯は"), seg("何を")]);
        result.compute_start_indices("今日の晩ご飯は何を");

        let starts: Vec<usize> = result.items().iter().map(|i| i.start_index).collect();
        // "夕飯は" is not in the text, so it sits at the cursor after "今日の"
        assert_eq!(starts, vec![0, 3, 7]);
    }

    #[test]
    fn test_start_indices_repeated_word() {
        let mut result = AnnotationResult::new(vec![seg("ねえ"), seg("ねえ")]);
        result.compute_start_indices("ねえねえ");
        assert_eq!(result.items()[1].start_index, 2);
    }

    #[test]
    fn test_find_chars_past_end() {
        assert_eq!(find_chars("abc", "", 3), Some(3));
        assert_eq!(find_chars("abc", "a", 5), None);
    }

    #[test]
    fn test_reset_reveals() {
        let mut result = AnnotationResult::new(vec![seg("a"), seg("b")]);
        result.get_mut(0).unwrap().meaning_shown = true;
        result.reset_reveals();
        assert!(result.items().iter().all(|i| !i.meaning_shown));
    }
}
