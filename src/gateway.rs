//! Gateway operations
//!
//! Stateless request translation: validate input, prompt the model (or the
//! TTS backend), and reshape the reply into the client's data model.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::config::LlmConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::llm::{parse_json_reply, Completion, CompletionRequest};
use crate::prompt;
use crate::segment::{Analysis, AnalysisUnit, Segment, WordReading};
use crate::tts::{SpeechSynthesis, VoiceParams};

/// Korean input translated to Japanese plus its word readings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedAnalysis {
    pub translated_text: String,
    pub analysis: Vec<WordReading>,
}

pub struct Gateway<C, S> {
    llm: C,
    tts: S,
    settings: LlmConfig,
}

impl<C: Completion, S: SpeechSynthesis> Gateway<C, S> {
    pub fn new(llm: C, tts: S, settings: LlmConfig) -> Self {
        Self { llm, tts, settings }
    }

    fn structured(&self, system: &str, user: String) -> CompletionRequest {
        CompletionRequest {
            system: system.to_string(),
            user,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    fn translation(&self, text: &str) -> CompletionRequest {
        CompletionRequest {
            system: prompt::TRANSLATE_SYSTEM.to_string(),
            user: prompt::translate_user(text),
            temperature: self.settings.translate_temperature,
            max_tokens: self.settings.translate_max_tokens,
        }
    }

    /// Segment a Japanese sentence with readings and cumulative fields
    pub async fn annotate(&self, text: &str) -> GatewayResult<Vec<Segment>> {
        let text = require_text(text)?;
        let reply = self
            .llm
            .complete(self.structured(prompt::ANNOTATE_SYSTEM, prompt::annotate_user(text)))
            .await?;
        let segments = normalize_array(&reply)?;
        tracing::debug!("Annotated '{}' into {} segments", text, segments.len());
        Ok(segments)
    }

    /// Grammatical breakdown of a Japanese sentence
    pub async fn analyze(&self, text: &str) -> GatewayResult<Analysis> {
        let text = require_text(text)?;
        let reply = self
            .llm
            .complete(self.structured(prompt::ANALYZE_SYSTEM, prompt::analyze_user(text)))
            .await?;
        normalize_analysis(&reply)
    }

    /// Korean → Japanese
    pub async fn translate(&self, text: &str) -> GatewayResult<String> {
        let text = require_text(text)?;
        let reply = self.llm.complete(self.translation(text)).await?;
        Ok(reply.trim().to_string())
    }

    /// Korean → Japanese, then word readings of the Japanese
    pub async fn translate_and_annotate(&self, text: &str) -> GatewayResult<TranslatedAnalysis> {
        let japanese = self.translate(text).await?;
        let reply = self
            .llm
            .complete(self.structured(prompt::READINGS_SYSTEM, prompt::annotate_user(&japanese)))
            .await?;
        let analysis = normalize_array(&reply)?;
        Ok(TranslatedAnalysis {
            translated_text: japanese,
            analysis,
        })
    }

    pub async fn synthesize_speech(&self, text: &str, params: &VoiceParams) -> GatewayResult<Bytes> {
        let text = require_text(text)?;
        self.tts.synthesize(text, params).await
    }
}

fn require_text(text: &str) -> GatewayResult<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::missing_text());
    }
    Ok(trimmed)
}

/// Parse a JSON array reply, coercing every element into `T`. Elements that
/// are not objects become all-empty items.
pub fn normalize_array<T>(reply: &str) -> GatewayResult<Vec<T>>
where
    T: serde::de::DeserializeOwned + Default,
{
    match parse_json_reply(reply)? {
        Value::Array(items) => Ok(items.into_iter().map(coerce).collect()),
        _ => Err(GatewayError::UpstreamFormat(
            "Response is not an array".to_string(),
        )),
    }
}

/// Parse an `{"analysis": [...]}` reply
pub fn normalize_analysis(reply: &str) -> GatewayResult<Analysis> {
    let mut value = parse_json_reply(reply)?;
    match value.get_mut("analysis").map(Value::take) {
        Some(Value::Array(items)) => Ok(Analysis {
            analysis: items.into_iter().map(coerce::<AnalysisUnit>).collect(),
        }),
        _ => Err(GatewayError::UpstreamFormat(
            "Invalid response format".to_string(),
        )),
    }
}

fn coerce<T: serde::de::DeserializeOwned + Default>(item: Value) -> T {
    serde_json::from_value(item).unwrap_or_default()
}
