//! Application state for one learner session
//!
//! Owns the current annotation result, the uploaded sentence list and the
//! reveal log, and coordinates the renderer, playback and libraries over them.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::error::GatewayResult;
use crate::gateway::Gateway;
use crate::ingest;
use crate::library::{save_example, ExampleEntry, ExampleLibrary, SaveOutcome, SubtitleBatch};
use crate::llm::Completion;
use crate::playback::{run_playback, PlaybackEvent, PlaybackOutcome, PlaybackSynchronizer, RevealLog};
use crate::renderer::{CumulativeRenderer, RevealFrame, Summary};
use crate::segment::{AnnotationResult, Segment};
use crate::store::{KeyValueStore, StoreError};
use crate::tts::SpeechSynthesis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Danger,
}

/// Visible status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            level: StatusLevel::Info,
            message: "ready".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    input: String,
    result: AnnotationResult,
    separator: bool,
    sentences: Vec<String>,
    selected: Option<usize>,
    reveal_log: RevealLog,
    status: Status,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn result(&self) -> &AnnotationResult {
        &self.result
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn reveal_log(&self) -> &RevealLog {
        &self.reveal_log
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn separator(&self) -> bool {
        self.separator
    }

    fn set_status(&mut self, level: StatusLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            StatusLevel::Info => tracing::info!("{}", message),
            StatusLevel::Danger => tracing::warn!("{}", message),
        }
        self.status = Status { level, message };
    }

    /// Report a failed user action
    pub fn report_failure(&mut self, action: &str, detail: &str) {
        self.set_status(StatusLevel::Danger, format!("{action} failed: {detail}"));
    }

    /// Drop the current result and every reveal
    pub fn clear(&mut self) {
        self.result = AnnotationResult::default();
        self.reveal_log = RevealLog::new();
    }

    /// Replace the current result wholesale. Returns `false` for an empty result.
    pub fn load_segments(&mut self, segments: Vec<Segment>) -> bool {
        self.clear();
        if segments.is_empty() {
            self.set_status(StatusLevel::Info, "conversion result is empty");
            return false;
        }
        self.result = AnnotationResult::new(segments);
        self.set_status(StatusLevel::Info, "conversion complete");
        true
    }

    /// Annotate the current input through `gateway` and load the result.
    /// Failures land in the status line before being returned.
    pub async fn generate<C, S>(&mut self, gateway: &Gateway<C, S>) -> GatewayResult<bool>
    where
        C: Completion,
        S: SpeechSynthesis,
    {
        match gateway.annotate(&self.input).await {
            Ok(segments) => Ok(self.load_segments(segments)),
            Err(e) => {
                self.report_failure("conversion", &e.to_string());
                Err(e)
            }
        }
    }

    pub fn toggle_separator(&mut self) -> bool {
        self.separator = !self.separator;
        self.separator
    }

    pub fn frames(&self) -> Vec<RevealFrame> {
        CumulativeRenderer::new(self.separator).render(&self.result.segments())
    }

    pub fn summary(&self) -> Option<Summary> {
        CumulativeRenderer::new(self.separator).summary(&self.result.segments())
    }

    /// Parse an uploaded file into the sentence list. Returns the number of
    /// sentences; zero leaves the previous list untouched.
    pub fn ingest_file(&mut self, filename: &str, text: &str) -> usize {
        let sentences = ingest::parse_file(filename, text);
        if sentences.is_empty() {
            self.set_status(StatusLevel::Danger, format!("no sentences found in {filename}"));
            return 0;
        }
        self.set_sentences(sentences);
        self.sentences.len()
    }

    pub fn set_sentences(&mut self, sentences: Vec<String>) {
        self.sentences = sentences;
        self.selected = None;
        let count = self.sentences.len();
        self.set_status(StatusLevel::Info, format!("loaded {count} sentences"));
    }

    /// Use a saved subtitle batch as the sentence list
    pub fn load_subtitle_batch(&mut self, batch: &SubtitleBatch) {
        self.set_sentences(batch.sentences.clone());
        self.set_status(
            StatusLevel::Info,
            format!("loaded {} sentences from {}", batch.sentences.len(), batch.filename),
        );
    }

    /// Make sentence `index` the input text and reset the preview
    pub fn select_sentence(&mut self, index: usize) -> Option<&str> {
        let sentence = self.sentences.get(index)?.clone();
        self.selected = Some(index);
        self.input = sentence;
        self.clear();
        self.set_status(StatusLevel::Info, format!("sentence #{} selected", index + 1));
        Some(&self.input)
    }

    /// Start a playback pass over the current input
    pub fn start_playback(&mut self) -> Option<PlaybackSynchronizer<'_, RevealLog>> {
        if self.result.is_empty() {
            return None;
        }
        Some(PlaybackSynchronizer::start(
            &mut self.result,
            &mut self.reveal_log,
            &self.input,
        ))
    }

    /// Drive playback from a stream of position events
    pub async fn play(&mut self, events: mpsc::Receiver<PlaybackEvent>) -> Option<PlaybackOutcome> {
        if self.result.is_empty() {
            self.set_status(StatusLevel::Info, "generate readings before playback");
            return None;
        }
        let outcome = run_playback(&mut self.result, &mut self.reveal_log, &self.input, events).await;
        if outcome == PlaybackOutcome::Completed {
            self.set_status(StatusLevel::Info, "playback complete");
        }
        Some(outcome)
    }

    /// Save the current result into the example library
    pub fn save_to_library<B: KeyValueStore>(
        &mut self,
        library: &mut ExampleLibrary<B>,
        overwrite: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<SaveOutcome>, StoreError> {
        let Some(entry) = ExampleEntry::from_result(&self.result, now) else {
            self.set_status(StatusLevel::Info, "nothing to save");
            return Ok(None);
        };
        match save_example(library, entry, overwrite) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                self.set_status(StatusLevel::Danger, e.user_message());
                Err(e)
            }
        }
    }

    /// Restore a saved example as the current result
    pub fn load_from_library(&mut self, entry: &ExampleEntry) {
        self.input = entry.jp.clone();
        self.load_segments(entry.full_data.clone());
        self.set_status(StatusLevel::Info, "loaded from library");
    }
}
