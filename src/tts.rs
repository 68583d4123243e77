//! Speech synthesis through the Google Translate TTS endpoint

use std::future::Future;

use bytes::Bytes;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::TtsConfig;
use crate::error::{GatewayError, GatewayResult};

/// Voice options accepted from the client
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceParams {
    /// Voice name; the Google endpoint has a single voice per language
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            voice: None,
            speed: default_speed(),
        }
    }
}

fn default_speed() -> f32 {
    1.0
}

/// Text-in, audio-out backend
pub trait SpeechSynthesis: Send + Sync {
    fn synthesize(
        &self,
        text: &str,
        params: &VoiceParams,
    ) -> impl Future<Output = GatewayResult<Bytes>> + Send;
}

pub struct TtsClient {
    client: Client,
    config: TtsConfig,
}

impl TtsClient {
    pub fn new(config: TtsConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build the audio URL for `text`
    pub fn audio_url(&self, text: &str, params: &VoiceParams) -> GatewayResult<Url> {
        let length = text.chars().count();
        if length > self.config.max_chars {
            return Err(GatewayError::Synthesis(format!(
                "text length ({}) should be less than {} characters",
                length, self.config.max_chars
            )));
        }

        let speed = if params.speed < 1.0 { "0.24" } else { "1" };
        let textlen = length.to_string();
        let base = format!("{}/translate_tts", self.config.host.trim_end_matches('/'));

        Url::parse_with_params(
            &base,
            &[
                ("ie", "UTF-8"),
                ("q", text),
                ("tl", self.config.lang.as_str()),
                ("total", "1"),
                ("idx", "0"),
                ("textlen", textlen.as_str()),
                ("client", "tw-ob"),
                ("prompt", "input"),
                ("ttsspeed", speed),
            ],
        )
        .map_err(|e| GatewayError::Synthesis(format!("invalid TTS host {}: {}", self.config.host, e)))
    }
}

impl SpeechSynthesis for TtsClient {
    async fn synthesize(&self, text: &str, params: &VoiceParams) -> GatewayResult<Bytes> {
        if let Some(voice) = params.voice.as_deref() {
            tracing::debug!("Ignoring voice '{}' for Google TTS", voice);
        }

        let url = self.audio_url(text, params)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(GatewayError::Synthesis(format!(
                "Google TTS fetch failed: {}",
                response.status().as_u16()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| GatewayError::Synthesis(format!("failed reading TTS audio: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TtsClient {
        TtsClient::new(TtsConfig::default())
    }

    #[test]
    fn test_audio_url_parameters() {
        let url = client().audio_url("猫", &VoiceParams::default()).unwrap();

        assert_eq!(url.host_str(), Some("translate.google.com"));
        assert_eq!(url.path(), "/translate_tts");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".to_string(), "猫".to_string())));
        assert!(pairs.contains(&("tl".to_string(), "ja".to_string())));
        assert!(pairs.contains(&("textlen".to_string(), "1".to_string())));
        assert!(pairs.contains(&("ttsspeed".to_string(), "1".to_string())));
    }

    #[test]
    fn test_slow_speed() {
        let params = VoiceParams {
            voice: Some("alloy".to_string()),
            speed: 0.8,
        };
        let url = client().audio_url("はい", &params).unwrap();
        assert!(url.query().unwrap().contains("ttsspeed=0.24"));
    }

    #[test]
    fn test_text_too_long_is_synthesis_failure() {
        let text = "あ".repeat(201);
        let err = client().audio_url(&text, &VoiceParams::default()).unwrap_err();
        assert!(matches!(err, GatewayError::Synthesis(ref m) if m.contains("(201)")));
        assert_eq!(err.status(), http::StatusCode::INTERNAL_SERVER_ERROR);

        assert!(client().audio_url(&"あ".repeat(200), &VoiceParams::default()).is_ok());
    }

    #[test]
    fn test_voice_params_defaults_from_json() {
        let params: VoiceParams = serde_json::from_str(r#"{"voice": "alloy"}"#).unwrap();
        assert_eq!(params.voice.as_deref(), Some("alloy"));
        assert_eq!(params.speed, 1.0);
    }
}
