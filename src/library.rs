//! Example sentence and subtitle batch libraries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LibraryConfig;
use crate::segment::{AnnotationResult, Segment};
use crate::store::{FileStore, KeyValueStore, ListItem, ListStore, StoreError};

/// A saved sentence with its full annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleEntry {
    /// Creation time in milliseconds
    pub id: i64,
    /// Full cumulative Japanese text; unique within the library
    pub jp: String,
    pub kr: String,
    pub trans: String,
    pub full_data: Vec<Segment>,
    pub date: DateTime<Utc>,
}

impl ExampleEntry {
    /// Snapshot the current result; `None` when there is nothing to save
    pub fn from_result(result: &AnnotationResult, now: DateTime<Utc>) -> Option<Self> {
        let last = result.last()?;
        Some(Self {
            id: now.timestamp_millis(),
            jp: last.cumulative_jp.clone(),
            kr: last.cumulative_kr.clone(),
            trans: last.cumulative_translation.clone(),
            full_data: result.segments(),
            date: now,
        })
    }
}

impl ListItem for ExampleEntry {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Sentences extracted from one uploaded subtitle file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleBatch {
    pub id: i64,
    /// Uploaded file name; unique within the library
    pub filename: String,
    pub sentences: Vec<String>,
    pub count: usize,
    pub date: DateTime<Utc>,
}

impl SubtitleBatch {
    pub fn new(filename: impl Into<String>, sentences: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: now.timestamp_millis(),
            filename: filename.into(),
            count: sentences.len(),
            sentences,
            date: now,
        }
    }
}

impl ListItem for SubtitleBatch {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Result of a save attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// An entry with the same key existed and was replaced
    Replaced,
    /// An entry with the same key exists and overwriting was not confirmed
    Duplicate,
}

pub type ExampleLibrary<B> = ListStore<ExampleEntry, B>;
pub type SubtitleLibrary<B> = ListStore<SubtitleBatch, B>;

/// Save `entry`, replacing an existing entry with the same sentence only when
/// `overwrite` is set.
pub fn save_example<B: KeyValueStore>(
    library: &mut ExampleLibrary<B>,
    entry: ExampleEntry,
    overwrite: bool,
) -> Result<SaveOutcome, StoreError> {
    let jp = entry.jp.clone();
    save_unique(library, entry, overwrite, move |e: &ExampleEntry| e.jp == jp)
}

/// Save `batch`, replacing an existing batch from the same file only when
/// `overwrite` is set.
pub fn save_subtitles<B: KeyValueStore>(
    library: &mut SubtitleLibrary<B>,
    batch: SubtitleBatch,
    overwrite: bool,
) -> Result<SaveOutcome, StoreError> {
    let filename = batch.filename.clone();
    save_unique(library, batch, overwrite, move |b: &SubtitleBatch| {
        b.filename == filename
    })
}

fn save_unique<T, B>(
    library: &mut ListStore<T, B>,
    item: T,
    overwrite: bool,
    same_key: impl Fn(&T) -> bool,
) -> Result<SaveOutcome, StoreError>
where
    T: ListItem + Serialize + serde::de::DeserializeOwned,
    B: KeyValueStore,
{
    let outcome = if library.exists(&same_key) {
        if !overwrite {
            return Ok(SaveOutcome::Duplicate);
        }
        library.remove_where(&same_key);
        SaveOutcome::Replaced
    } else {
        SaveOutcome::Saved
    };

    library.add(item)?;
    Ok(outcome)
}

/// Both libraries, loaded from the configured directory
pub struct Libraries {
    pub examples: ExampleLibrary<FileStore>,
    pub subtitles: SubtitleLibrary<FileStore>,
}

impl Libraries {
    pub fn open(config: &LibraryConfig, dir: std::path::PathBuf) -> Self {
        let backend = FileStore::new(dir, config.quota_bytes);
        let mut examples = ListStore::new(config.example_key.clone(), backend.clone());
        let mut subtitles = ListStore::new(config.subtitle_key.clone(), backend);
        examples.load();
        subtitles.load();
        tracing::debug!(
            "Loaded {} examples and {} subtitle batches",
            examples.count(),
            subtitles.count()
        );
        Self {
            examples,
            subtitles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn result(words: &[&str]) -> AnnotationResult {
        let mut cumulative = String::new();
        AnnotationResult::new(
            words
                .iter()
                .map(|w| {
                    cumulative.push_str(w);
                    Segment {
                        jp: w.to_string(),
                        cumulative_jp: cumulative.clone(),
                        cumulative_kr: "kr".to_string(),
                        cumulative_translation: "tr".to_string(),
                        ..Default::default()
                    }
                })
                .collect(),
        )
    }

    #[test]
    fn test_example_entry_from_result() {
        let entry = ExampleEntry::from_result(&result(&["今日は", "晴れです"]), at(1_700_000_000_000)).unwrap();
        assert_eq!(entry.id, 1_700_000_000_000);
        assert_eq!(entry.jp, "今日は晴れです");
        assert_eq!(entry.full_data.len(), 2);

        assert!(ExampleEntry::from_result(&AnnotationResult::default(), at(0)).is_none());
    }

    #[test]
    fn test_example_entry_json_shape() {
        let entry = ExampleEntry::from_result(&result(&["はい"]), at(1)).unwrap();
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("fullData").is_some());
        assert_eq!(value["fullData"][0]["cumulativeJp"], "はい");
    }

    #[test]
    fn test_duplicate_requires_overwrite() {
        let mut library = ExampleLibrary::new("examples", MemoryStore::default());
        let first = ExampleEntry::from_result(&result(&["はい"]), at(1)).unwrap();
        let second = ExampleEntry::from_result(&result(&["はい"]), at(2)).unwrap();

        assert_eq!(save_example(&mut library, first, false).unwrap(), SaveOutcome::Saved);
        assert_eq!(
            save_example(&mut library, second.clone(), false).unwrap(),
            SaveOutcome::Duplicate
        );
        assert_eq!(library.get_all()[0].id, 1);

        assert_eq!(save_example(&mut library, second, true).unwrap(), SaveOutcome::Replaced);
        assert_eq!(library.count(), 1);
        assert_eq!(library.get_all()[0].id, 2);
    }

    #[test]
    fn test_subtitle_batches_keyed_by_filename() {
        let mut library = SubtitleLibrary::new("subs", MemoryStore::default());
        let batch = SubtitleBatch::new("ep1.srt", vec!["こんにちは".to_string()], at(10));
        assert_eq!(batch.count, 1);

        save_subtitles(&mut library, batch, false).unwrap();
        save_subtitles(
            &mut library,
            SubtitleBatch::new("ep2.srt", vec!["さようなら".to_string()], at(11)),
            false,
        )
        .unwrap();
        let again = SubtitleBatch::new("ep1.srt", vec!["a".into(), "b".into()], at(12));
        assert_eq!(save_subtitles(&mut library, again, true).unwrap(), SaveOutcome::Replaced);

        assert_eq!(library.count(), 2);
        assert_eq!(library.get_all()[0].filename, "ep1.srt");
        assert_eq!(library.get_all()[0].count, 2);
    }

    #[test]
    fn test_libraries_open_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = LibraryConfig::default();
        {
            let mut libs = Libraries::open(&config, dir.path().to_path_buf());
            let batch = SubtitleBatch::new("a.srt", vec!["猫".to_string()], at(5));
            save_subtitles(&mut libs.subtitles, batch, false).unwrap();
        }

        let libs = Libraries::open(&config, dir.path().to_path_buf());
        assert_eq!(libs.subtitles.count(), 1);
        assert_eq!(libs.examples.count(), 0);
    }
}
