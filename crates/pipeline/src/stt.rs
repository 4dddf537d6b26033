//! HTTP Speech-to-Text
//!
//! Sends captured utterances as WAV to a Deepgram-compatible
//! transcription API and returns the top alternative.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use docvoice_core::{AudioFrame, SpeechToText, TranscriptResult};

use crate::{wav, PipelineError};

/// STT configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// API endpoint
    pub endpoint: String,
    /// API key
    pub api_key: String,
    /// Model name
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.deepgram.com/v1/listen".to_string(),
            api_key: String::new(),
            model: "nova-2".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SttResponse {
    results: SttResults,
}

#[derive(Debug, Deserialize)]
struct SttResults {
    channels: Vec<SttChannel>,
}

#[derive(Debug, Deserialize)]
struct SttChannel {
    alternatives: Vec<SttAlternative>,
}

#[derive(Debug, Deserialize)]
struct SttAlternative {
    transcript: String,
    #[serde(default)]
    confidence: f32,
}

/// Deepgram-compatible HTTP transcriber
pub struct HttpStt {
    client: Client,
    config: SttConfig,
}

impl HttpStt {
    pub fn new(config: SttConfig) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PipelineError::Stt(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn top_alternative(response: SttResponse) -> Result<TranscriptResult, PipelineError> {
        let alternative = response
            .results
            .channels
            .into_iter()
            .next()
            .and_then(|channel| channel.alternatives.into_iter().next())
            .ok_or_else(|| PipelineError::Stt("Response contained no alternatives".to_string()))?;

        Ok(TranscriptResult::final_text(
            alternative.transcript,
            alternative.confidence,
        ))
    }
}

#[async_trait]
impl SpeechToText for HttpStt {
    async fn transcribe(&self, audio: &AudioFrame) -> docvoice_core::Result<TranscriptResult> {
        let body = wav::encode_wav(audio)?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("model", self.config.model.as_str())])
            .header("Authorization", format!("Token {}", self.config.api_key))
            .header("Content-Type", "audio/wav")
            .body(body)
            .send()
            .await
            .map_err(PipelineError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(PipelineError::Stt(format!("{}: {}", status, error)).into());
        }

        let parsed: SttResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Stt(format!("Malformed response: {}", e)))?;

        let transcript = Self::top_alternative(parsed)?;
        tracing::debug!(
            text = %transcript.text,
            confidence = transcript.confidence,
            "Transcription complete"
        );

        Ok(transcript)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing_takes_top_alternative() {
        let raw = r#"{
            "results": {
                "channels": [{
                    "alternatives": [
                        {"transcript": "what are gold loan rates", "confidence": 0.98},
                        {"transcript": "what our gold loan rates", "confidence": 0.71}
                    ]
                }]
            }
        }"#;

        let parsed: SttResponse = serde_json::from_str(raw).unwrap();
        let transcript = HttpStt::top_alternative(parsed).unwrap();

        assert_eq!(transcript.text, "what are gold loan rates");
        assert!((transcript.confidence - 0.98).abs() < 1e-6);
        assert!(transcript.is_final);
    }

    #[test]
    fn test_empty_channels_is_error() {
        let parsed: SttResponse =
            serde_json::from_str(r#"{"results":{"channels":[]}}"#).unwrap();
        assert!(HttpStt::top_alternative(parsed).is_err());
    }
}
