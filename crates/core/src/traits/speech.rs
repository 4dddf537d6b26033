//! Speech processing traits

use crate::transcript::TranscriptResult;
use crate::{AudioFrame, Result};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Speech-to-Text interface
///
/// # Example
///
/// ```ignore
/// let stt: Box<dyn SpeechToText> = Box::new(HttpStt::new(config));
/// let transcript = stt.transcribe(&utterance).await?;
/// println!("Transcribed: {}", transcript.text);
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe a complete utterance
    async fn transcribe(&self, audio: &AudioFrame) -> Result<TranscriptResult>;

    /// Get model/provider name for logging
    fn model_name(&self) -> &str;
}

/// Text-to-Speech interface
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize text to a single audio frame
    async fn synthesize(&self, text: &str) -> Result<AudioFrame>;

    /// Stream synthesis as playable frames
    ///
    /// Enables interruptible playback: the caller may drop the stream
    /// mid-way (barge-in) and the remaining synthesis is abandoned.
    fn synthesize_stream<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Stream<Item = Result<AudioFrame>> + Send + 'a>>;

    /// Get model/provider name for logging
    fn model_name(&self) -> &str;
}

/// Configuration for Voice Activity Detection
///
/// Controls sensitivity and timing thresholds for speech detection.
#[derive(Debug, Clone)]
pub struct VADConfig {
    /// Speech probability threshold (0.0-1.0)
    pub threshold: f32,
    /// Minimum consecutive speech to confirm speech start (ms)
    pub min_speech_duration_ms: u32,
    /// Minimum consecutive silence to confirm speech end (ms)
    pub min_silence_duration_ms: u32,
    /// Audio before confirmed speech start to include in the utterance (ms)
    pub pre_speech_padding_ms: u32,
    /// Audio after confirmed speech end to include in the utterance (ms)
    pub post_speech_padding_ms: u32,
}

impl Default for VADConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            min_speech_duration_ms: 250,
            min_silence_duration_ms: 400,
            pre_speech_padding_ms: 100,
            post_speech_padding_ms: 100,
        }
    }
}

/// Voice Activity Detection events
#[derive(Debug, Clone, PartialEq)]
pub enum VADEvent {
    /// Speech confirmed (after min_speech_duration_ms of speech)
    SpeechStart,
    /// Speech continuing with current probability
    SpeechContinue { probability: f32 },
    /// Speech ended; carries the captured utterance including padding
    SpeechEnd { utterance: AudioFrame },
    /// Silence
    Silence,
}

impl VADEvent {
    /// Check if this event indicates active speech
    pub fn is_speech(&self) -> bool {
        matches!(self, Self::SpeechStart | Self::SpeechContinue { .. })
    }
}

/// VAD state for tracking speech boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VADState {
    /// Waiting for speech
    #[default]
    Idle,
    /// Potential speech detected, waiting for confirmation
    PendingSpeech,
    /// In confirmed speech segment
    InSpeech,
    /// Potential end of speech, waiting for confirmation
    PendingSilence,
}

/// Voice Activity Detector interface
///
/// Implementations maintain internal state across frames to track speech
/// boundaries; `reset` must be called between sessions.
pub trait VoiceActivityDetector: Send + Sync + 'static {
    /// Feed one frame and get the resulting event
    fn process(&self, audio: &AudioFrame) -> VADEvent;

    /// Get speech probability for a frame without advancing state
    fn speech_probability(&self, audio: &AudioFrame) -> f32;

    /// Reset internal state
    fn reset(&self);

    /// Get current VAD state
    fn current_state(&self) -> VADState;

    /// Get model info for logging
    fn model_info(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Channels, SampleRate};

    struct MockStt;

    #[async_trait]
    impl SpeechToText for MockStt {
        async fn transcribe(&self, _audio: &AudioFrame) -> Result<TranscriptResult> {
            Ok(TranscriptResult::final_text("test transcription", 0.95))
        }

        fn model_name(&self) -> &str {
            "mock-stt"
        }
    }

    #[tokio::test]
    async fn test_mock_stt_transcribe() {
        let stt = MockStt;
        let frame = AudioFrame::new(vec![0.0; 320], SampleRate::Hz16000, Channels::Mono, 0);
        let result = stt.transcribe(&frame).await.unwrap();
        assert_eq!(result.text, "test transcription");
        assert!(result.is_final);
    }

    #[test]
    fn test_vad_event_is_speech() {
        assert!(VADEvent::SpeechStart.is_speech());
        assert!(VADEvent::SpeechContinue { probability: 0.8 }.is_speech());
        assert!(!VADEvent::Silence.is_speech());
    }
}
