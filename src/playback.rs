//! Playback synchronizer
//!
//! Maps a stream of playback positions onto segment reveals. Positions come
//! either as character offsets (speech-synthesis word boundaries) or as a
//! fraction of the audio duration (server-rendered audio); the synchronizer
//! does not care which backend produced them.

use tokio::sync::mpsc;

use crate::segment::AnnotationResult;

/// Where playback currently is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    /// Character offset into the spoken sentence
    CharOffset(usize),
    /// `current_time / duration`
    Progress(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    Position(Position),
    Ended,
}

/// How a driven playback pass finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The backend reported the end of playback; every segment is revealed
    Completed,
    /// The event source went away before the end
    Interrupted,
}

/// A line appended to the running translation log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEntry {
    Word { jp: String, meaning: String },
    Sentence { translation: String },
}

/// Receives the visible effects of a reveal
pub trait RevealSink {
    /// Mark segment `index` as revealed; may be called repeatedly
    fn mark_revealed(&mut self, index: usize);
    fn append(&mut self, entry: RevealEntry);
    /// Drop every revealed mark and log entry
    fn reset(&mut self);
}

/// In-memory reveal state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealLog {
    revealed: Vec<bool>,
    entries: Vec<RevealEntry>,
}

impl RevealLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[RevealEntry] {
        &self.entries
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.get(index).copied().unwrap_or(false)
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.iter().filter(|r| **r).count()
    }
}

impl RevealSink for RevealLog {
    fn mark_revealed(&mut self, index: usize) {
        if self.revealed.len() <= index {
            self.revealed.resize(index + 1, false);
        }
        self.revealed[index] = true;
    }

    fn append(&mut self, entry: RevealEntry) {
        self.entries.push(entry);
    }

    fn reset(&mut self) {
        self.revealed.clear();
        self.entries.clear();
    }
}

/// One playback pass over an annotation result
pub struct PlaybackSynchronizer<'a, S: RevealSink> {
    result: &'a mut AnnotationResult,
    sink: &'a mut S,
}

impl<'a, S: RevealSink> PlaybackSynchronizer<'a, S> {
    /// Start a pass: clear earlier reveals and locate every segment in `text`
    pub fn start(result: &'a mut AnnotationResult, sink: &'a mut S, text: &str) -> Self {
        result.reset_reveals();
        sink.reset();
        result.compute_start_indices(text);
        tracing::debug!("Playback started over {} segments", result.len());
        Self { result, sink }
    }

    /// Highest segment index reached at `position`
    pub fn active_index(&self, position: Position) -> Option<usize> {
        let len = self.result.len();
        match position {
            Position::CharOffset(offset) => {
                let mut active = None;
                for (i, item) in self.result.items().iter().enumerate() {
                    if item.start_index <= offset {
                        active = Some(i);
                    } else {
                        break;
                    }
                }
                active
            }
            Position::Progress(progress) => {
                if !progress.is_finite() {
                    return None;
                }
                let bucket = (progress * len as f64).floor();
                if bucket >= 0.0 && bucket < len as f64 {
                    Some(bucket as usize)
                } else {
                    None
                }
            }
        }
    }

    pub fn on_position(&mut self, position: Position) {
        if let Some(index) = self.active_index(position) {
            self.reveal_through(index);
        }
    }

    /// Reveal segments `0..=index`; each one logs its translations only once
    pub fn reveal_through(&mut self, index: usize) {
        let len = self.result.len();
        for i in 0..len.min(index.saturating_add(1)) {
            self.sink.mark_revealed(i);

            let Some(item) = self.result.get_mut(i) else {
                continue;
            };
            if item.meaning_shown {
                continue;
            }
            if !item.segment.meaning.is_empty() {
                self.sink.append(RevealEntry::Word {
                    jp: item.segment.jp.clone(),
                    meaning: item.segment.meaning.clone(),
                });
            }
            if let Some(translation) = item.segment.sentence_translation.as_ref() {
                if !translation.is_empty() {
                    self.sink.append(RevealEntry::Sentence {
                        translation: translation.clone(),
                    });
                }
            }
            item.meaning_shown = true;
        }
    }

    /// Playback ended: reveal whatever timing gaps left behind
    pub fn finish(&mut self) {
        if let Some(last) = self.result.len().checked_sub(1) {
            self.reveal_through(last);
        }
    }
}

/// Drive a playback pass from a position channel until the backend reports
/// the end or drops its sender.
pub async fn run_playback<S: RevealSink>(
    result: &mut AnnotationResult,
    sink: &mut S,
    text: &str,
    mut events: mpsc::Receiver<PlaybackEvent>,
) -> PlaybackOutcome {
    let mut sync = PlaybackSynchronizer::start(result, sink, text);

    while let Some(event) = events.recv().await {
        match event {
            PlaybackEvent::Position(position) => sync.on_position(position),
            PlaybackEvent::Ended => {
                sync.finish();
                tracing::debug!("Playback completed");
                return PlaybackOutcome::Completed;
            }
        }
    }

    tracing::debug!("Playback interrupted before completion");
    PlaybackOutcome::Interrupted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segment;
    use pretty_assertions::assert_eq;

    const SENTENCE: &str = "今日の晩ご飯は何を食べようか";

    fn dinner() -> AnnotationResult {
        let words = [
            ("今日の", "오늘의"),
            ("晩ご飯は", "저녁밥은"),
            ("何を", "무엇을"),
            ("食べようか", "먹을까"),
        ];
        AnnotationResult::new(
            words
                .iter()
                .map(|(jp, meaning)| Segment {
                    jp: jp.to_string(),
                    meaning: meaning.to_string(),
                    ..Default::default()
                })
                .collect(),
        )
    }

    #[test]
    fn test_progress_bucket_reveals_prefix() {
        let mut result = dinner();
        let mut log = RevealLog::new();
        let mut sync = PlaybackSynchronizer::start(&mut result, &mut log, SENTENCE);

        assert_eq!(sync.active_index(Position::Progress(0.6)), Some(2));
        sync.on_position(Position::Progress(0.6));
        drop(sync);

        assert!(log.is_revealed(0) && log.is_revealed(1) && log.is_revealed(2));
        assert!(!log.is_revealed(3));
        assert_eq!(log.entries().len(), 3);
        assert!(!result.items()[3].meaning_shown);
    }

    #[test]
    fn test_progress_at_three_quarters_reveals_last() {
        let mut result = dinner();
        let mut log = RevealLog::new();
        let mut sync = PlaybackSynchronizer::start(&mut result, &mut log, SENTENCE);
        sync.on_position(Position::Progress(0.75));
        drop(sync);
        assert!(log.is_revealed(3));
    }

    #[test]
    fn test_out_of_range_progress_is_ignored() {
        let mut result = dinner();
        let mut log = RevealLog::new();
        let sync = PlaybackSynchronizer::start(&mut result, &mut log, SENTENCE);

        assert_eq!(sync.active_index(Position::Progress(f64::NAN)), None);
        assert_eq!(sync.active_index(Position::Progress(1.0)), None);
        assert_eq!(sync.active_index(Position::Progress(-0.1)), None);
    }

    #[test]
    fn test_char_offset_maps_to_segment() {
        let mut result = dinner();
        let mut log = RevealLog::new();
        let sync = PlaybackSynchronizer::start(&mut result, &mut log, SENTENCE);

        assert_eq!(sync.active_index(Position::CharOffset(0)), Some(0));
        assert_eq!(sync.active_index(Position::CharOffset(6)), Some(1));
        assert_eq!(sync.active_index(Position::CharOffset(7)), Some(2));
        assert_eq!(sync.active_index(Position::CharOffset(100)), Some(3));
    }

    #[test]
    fn test_reveal_is_idempotent() {
        let mut result = dinner();
        let mut log = RevealLog::new();
        let mut sync = PlaybackSynchronizer::start(&mut result, &mut log, SENTENCE);

        sync.reveal_through(1);
        sync.reveal_through(1);
        sync.on_position(Position::CharOffset(3));
        drop(sync);

        assert_eq!(
            log.entries(),
            &[
                RevealEntry::Word {
                    jp: "今日の".to_string(),
                    meaning: "오늘의".to_string()
                },
                RevealEntry::Word {
                    jp: "晩ご飯は".to_string(),
                    meaning: "저녁밥은".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_sentence_translation_logged_after_word() {
        let mut result = AnnotationResult::new(vec![Segment {
            jp: "はい".to_string(),
            meaning: "네".to_string(),
            sentence_translation: Some("네.".to_string()),
            ..Default::default()
        }]);
        let mut log = RevealLog::new();
        let mut sync = PlaybackSynchronizer::start(&mut result, &mut log, "はい");
        sync.finish();
        drop(sync);

        assert_eq!(log.entries().len(), 2);
        assert_eq!(
            log.entries()[1],
            RevealEntry::Sentence {
                translation: "네.".to_string()
            }
        );
    }

    #[test]
    fn test_restart_resets_state() {
        let mut result = dinner();
        let mut log = RevealLog::new();
        {
            let mut sync = PlaybackSynchronizer::start(&mut result, &mut log, SENTENCE);
            sync.finish();
        }
        assert_eq!(log.revealed_count(), 4);

        PlaybackSynchronizer::start(&mut result, &mut log, SENTENCE);
        assert_eq!(log.revealed_count(), 0);
        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn test_run_playback_completes_and_reveals_all() {
        let mut result = dinner();
        let mut log = RevealLog::new();
        let (tx, rx) = mpsc::channel(8);

        tx.send(PlaybackEvent::Position(Position::Progress(0.3))).await.unwrap();
        tx.send(PlaybackEvent::Ended).await.unwrap();

        let outcome = run_playback(&mut result, &mut log, SENTENCE, rx).await;
        assert_eq!(outcome, PlaybackOutcome::Completed);
        assert_eq!(log.revealed_count(), 4);
        assert_eq!(log.entries().len(), 4);
    }

    #[tokio::test]
    async fn test_run_playback_interrupted() {
        let mut result = dinner();
        let mut log = RevealLog::new();
        let (tx, rx) = mpsc::channel(8);

        tx.send(PlaybackEvent::Position(Position::CharOffset(3))).await.unwrap();
        drop(tx);

        let outcome = run_playback(&mut result, &mut log, SENTENCE, rx).await;
        assert_eq!(outcome, PlaybackOutcome::Interrupted);
        assert_eq!(log.revealed_count(), 2);
    }
}
