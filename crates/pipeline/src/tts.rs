//! HTTP Text-to-Speech
//!
//! Calls an OpenAI-compatible `/audio/speech` endpoint, decodes the WAV
//! payload, and exposes the result both as one frame and as a chunked
//! stream. Chunked playback is what makes barge-in possible: the session
//! drops the stream mid-way and the remaining chunks are never played.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::Serialize;

use docvoice_core::{AudioFrame, TextToSpeech};

use crate::{wav, PipelineError};

/// Playback chunk duration (ms)
const CHUNK_MS: usize = 200;

/// TTS configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// API endpoint
    pub endpoint: String,
    /// API key
    pub api_key: String,
    /// Model name
    pub model: String,
    /// Voice name
    pub voice: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/audio/speech".to_string(),
            api_key: String::new(),
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct TtsRequest {
    model: String,
    voice: String,
    input: String,
    response_format: &'static str,
}

/// OpenAI-compatible HTTP synthesizer
pub struct HttpTts {
    client: Client,
    config: TtsConfig,
}

impl HttpTts {
    pub fn new(config: TtsConfig) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PipelineError::Tts(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

/// Split a synthesized frame into fixed-duration playback chunks
fn split_frame(frame: &AudioFrame, chunk_ms: usize) -> Vec<AudioFrame> {
    let chunk_samples =
        (frame.sample_rate.samples_per_ms() * chunk_ms * frame.channels.count()).max(1);

    frame
        .samples
        .chunks(chunk_samples)
        .enumerate()
        .map(|(i, chunk)| {
            AudioFrame::new(
                chunk.to_vec(),
                frame.sample_rate,
                frame.channels,
                frame.sequence + i as u64,
            )
        })
        .collect()
}

#[async_trait]
impl TextToSpeech for HttpTts {
    async fn synthesize(&self, text: &str) -> docvoice_core::Result<AudioFrame> {
        let request = TtsRequest {
            model: self.config.model.clone(),
            voice: self.config.voice.clone(),
            input: text.to_string(),
            response_format: "wav",
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(PipelineError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(PipelineError::Tts(format!("{}: {}", status, error)).into());
        }

        let bytes = response.bytes().await.map_err(PipelineError::from)?;
        let frame = wav::decode_wav(&bytes)?;

        tracing::debug!(
            chars = text.len(),
            duration_ms = frame.duration().as_millis() as u64,
            "Synthesis complete"
        );

        Ok(frame)
    }

    fn synthesize_stream<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Stream<Item = docvoice_core::Result<AudioFrame>> + Send + 'a>> {
        Box::pin(
            futures::stream::once(self.synthesize(text)).flat_map(|result| {
                let items: Vec<docvoice_core::Result<AudioFrame>> = match result {
                    Ok(frame) => split_frame(&frame, CHUNK_MS).into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(e)],
                };
                futures::stream::iter(items)
            }),
        )
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvoice_core::{Channels, SampleRate};

    #[test]
    fn test_split_frame_chunks_and_sequences() {
        // 1 second at 16kHz = five 200ms chunks
        let frame = AudioFrame::new(vec![0.1; 16000], SampleRate::Hz16000, Channels::Mono, 10);
        let chunks = split_frame(&frame, CHUNK_MS);

        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| c.samples.len() == 3200));
        assert_eq!(chunks[0].sequence, 10);
        assert_eq!(chunks[4].sequence, 14);
    }

    #[test]
    fn test_split_frame_keeps_remainder() {
        let frame = AudioFrame::new(vec![0.1; 3300], SampleRate::Hz16000, Channels::Mono, 0);
        let chunks = split_frame(&frame, CHUNK_MS);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].samples.len(), 100);
        let total: usize = chunks.iter().map(|c| c.samples.len()).sum();
        assert_eq!(total, 3300);
    }

    #[test]
    fn test_request_serialization() {
        let request = TtsRequest {
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            input: "hello".to_string(),
            response_format: "wav",
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["voice"], "alloy");
        assert_eq!(json["response_format"], "wav");
    }
}
