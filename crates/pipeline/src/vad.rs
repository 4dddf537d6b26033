//! Energy-based Voice Activity Detection
//!
//! Frame RMS energy is mapped to a speech probability and run through a
//! debouncing state machine: speech must persist for
//! `min_speech_duration_ms` before a start is confirmed, and silence for
//! `min_silence_duration_ms` before the utterance is emitted. Captured
//! utterances include pre- and post-speech padding so word edges are not
//! clipped.

use std::collections::VecDeque;

use parking_lot::Mutex;

use docvoice_core::{AudioFrame, VADConfig, VADEvent, VADState, VoiceActivityDetector};

/// RMS energy that maps to probability 1.0
const FULL_SCALE_ENERGY: f32 = 0.06;

/// Mutable state for the detector (single lock per frame)
struct VadMutableState {
    state: VADState,
    /// Accumulated speech duration while pending confirmation (ms)
    speech_ms: u32,
    /// Accumulated silence duration while pending end (ms)
    silence_ms: u32,
    /// Recent frames kept for pre-speech padding
    ring: VecDeque<AudioFrame>,
    ring_ms: u32,
    /// Captured utterance samples
    utterance: Vec<f32>,
    /// Sequence of the first captured frame
    utterance_sequence: u64,
}

impl VadMutableState {
    fn new() -> Self {
        Self {
            state: VADState::Idle,
            speech_ms: 0,
            silence_ms: 0,
            ring: VecDeque::new(),
            ring_ms: 0,
            utterance: Vec::new(),
            utterance_sequence: 0,
        }
    }
}

/// Energy-based voice activity detector
pub struct EnergyVad {
    config: VADConfig,
    mutable: Mutex<VadMutableState>,
}

impl EnergyVad {
    pub fn new(config: VADConfig) -> Self {
        Self {
            config,
            mutable: Mutex::new(VadMutableState::new()),
        }
    }

    fn probability_of(frame: &AudioFrame) -> f32 {
        (frame.energy() / FULL_SCALE_ENERGY).clamp(0.0, 1.0)
    }

    fn frame_ms(frame: &AudioFrame) -> u32 {
        frame.duration().as_millis() as u32
    }

    /// Push a frame into the pre-speech ring, evicting old frames
    fn push_ring(&self, state: &mut VadMutableState, frame: &AudioFrame) {
        state.ring.push_back(frame.clone());
        state.ring_ms += Self::frame_ms(frame);
        while state.ring_ms > self.config.pre_speech_padding_ms {
            match state.ring.pop_front() {
                Some(old) => state.ring_ms -= Self::frame_ms(&old),
                None => break,
            }
        }
    }

    /// Move the ring into the utterance buffer as pre-speech padding
    ///
    /// The utterance sequence becomes the first padded frame's when
    /// padding exists; the caller seeds it with the triggering frame.
    fn capture_ring(state: &mut VadMutableState) {
        if let Some(first) = state.ring.front() {
            state.utterance_sequence = first.sequence;
        }
        for frame in state.ring.drain(..) {
            state.utterance.extend_from_slice(&frame.samples);
        }
        state.ring_ms = 0;
    }

    /// Build the final utterance, trimming captured silence beyond the
    /// post-speech padding
    fn finish_utterance(&self, state: &mut VadMutableState, frame: &AudioFrame) -> AudioFrame {
        let excess_ms = state
            .silence_ms
            .saturating_sub(self.config.post_speech_padding_ms);
        let trim = excess_ms as usize * frame.sample_rate.samples_per_ms();
        let keep = state.utterance.len().saturating_sub(trim);
        state.utterance.truncate(keep);

        let samples = std::mem::take(&mut state.utterance);
        AudioFrame::new(
            samples,
            frame.sample_rate,
            frame.channels,
            state.utterance_sequence,
        )
    }
}

impl VoiceActivityDetector for EnergyVad {
    fn process(&self, audio: &AudioFrame) -> VADEvent {
        let probability = Self::probability_of(audio);
        let is_speech = probability >= self.config.threshold;
        let frame_ms = Self::frame_ms(audio);

        let mut state = self.mutable.lock();

        match state.state {
            VADState::Idle => {
                if is_speech {
                    state.state = VADState::PendingSpeech;
                    state.speech_ms = frame_ms;
                    state.utterance_sequence = audio.sequence;
                    Self::capture_ring(&mut state);
                    state.utterance.extend_from_slice(&audio.samples);
                } else {
                    self.push_ring(&mut state, audio);
                }
                VADEvent::Silence
            },
            VADState::PendingSpeech => {
                if is_speech {
                    state.speech_ms += frame_ms;
                    state.utterance.extend_from_slice(&audio.samples);
                    if state.speech_ms >= self.config.min_speech_duration_ms {
                        state.state = VADState::InSpeech;
                        tracing::debug!(speech_ms = state.speech_ms, "Speech confirmed");
                        VADEvent::SpeechStart
                    } else {
                        VADEvent::Silence
                    }
                } else {
                    // False start, discard and return to idle
                    state.state = VADState::Idle;
                    state.speech_ms = 0;
                    state.utterance.clear();
                    self.push_ring(&mut state, audio);
                    VADEvent::Silence
                }
            },
            VADState::InSpeech => {
                state.utterance.extend_from_slice(&audio.samples);
                if is_speech {
                    VADEvent::SpeechContinue { probability }
                } else {
                    state.state = VADState::PendingSilence;
                    state.silence_ms = frame_ms;
                    VADEvent::SpeechContinue { probability }
                }
            },
            VADState::PendingSilence => {
                state.utterance.extend_from_slice(&audio.samples);
                if is_speech {
                    state.state = VADState::InSpeech;
                    state.silence_ms = 0;
                    VADEvent::SpeechContinue { probability }
                } else {
                    state.silence_ms += frame_ms;
                    if state.silence_ms >= self.config.min_silence_duration_ms {
                        let utterance = self.finish_utterance(&mut state, audio);
                        state.state = VADState::Idle;
                        state.speech_ms = 0;
                        state.silence_ms = 0;
                        tracing::debug!(
                            duration_ms = utterance.duration().as_millis() as u64,
                            "Utterance captured"
                        );
                        VADEvent::SpeechEnd { utterance }
                    } else {
                        VADEvent::SpeechContinue { probability }
                    }
                }
            },
        }
    }

    fn speech_probability(&self, audio: &AudioFrame) -> f32 {
        Self::probability_of(audio)
    }

    fn reset(&self) {
        *self.mutable.lock() = VadMutableState::new();
    }

    fn current_state(&self) -> VADState {
        self.mutable.lock().state
    }

    fn model_info(&self) -> &str {
        "energy-vad"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvoice_core::{Channels, SampleRate};

    fn frame(amplitude: f32, sequence: u64) -> AudioFrame {
        // 20ms at 16kHz
        AudioFrame::new(
            vec![amplitude; 320],
            SampleRate::Hz16000,
            Channels::Mono,
            sequence,
        )
    }

    fn vad() -> EnergyVad {
        EnergyVad::new(VADConfig::default())
    }

    #[test]
    fn test_silence_stays_idle() {
        let vad = vad();
        for i in 0..50 {
            assert_eq!(vad.process(&frame(0.0, i)), VADEvent::Silence);
        }
        assert_eq!(vad.current_state(), VADState::Idle);
    }

    #[test]
    fn test_speech_confirmed_after_min_duration() {
        let vad = vad();
        let mut started = false;

        // 250ms minimum at 20ms frames = 13 frames to confirm
        for i in 0..20 {
            if vad.process(&frame(0.5, i)) == VADEvent::SpeechStart {
                started = true;
                assert!(i >= 12);
                break;
            }
        }

        assert!(started);
        assert_eq!(vad.current_state(), VADState::InSpeech);
    }

    #[test]
    fn test_short_burst_is_not_speech() {
        let vad = vad();
        // Three speech frames (60ms) then silence: below the 250ms minimum
        for i in 0..3 {
            assert_ne!(vad.process(&frame(0.5, i)), VADEvent::SpeechStart);
        }
        vad.process(&frame(0.0, 3));
        assert_eq!(vad.current_state(), VADState::Idle);
    }

    #[test]
    fn test_utterance_emitted_after_silence() {
        let vad = vad();
        let mut sequence = 0;

        for _ in 0..25 {
            vad.process(&frame(0.5, sequence));
            sequence += 1;
        }
        assert_eq!(vad.current_state(), VADState::InSpeech);

        // 400ms minimum silence at 20ms frames = 20 frames
        let mut utterance = None;
        for _ in 0..30 {
            if let VADEvent::SpeechEnd { utterance: u } = vad.process(&frame(0.0, sequence)) {
                utterance = Some(u);
                break;
            }
            sequence += 1;
        }

        let utterance = utterance.expect("utterance emitted");
        // Speech (500ms) plus trailing padding, minus trimmed silence
        assert!(utterance.duration().as_millis() >= 500);
        assert_eq!(vad.current_state(), VADState::Idle);
    }

    #[test]
    fn test_reset_clears_state() {
        let vad = vad();
        for i in 0..20 {
            vad.process(&frame(0.5, i));
        }
        assert_eq!(vad.current_state(), VADState::InSpeech);

        vad.reset();
        assert_eq!(vad.current_state(), VADState::Idle);
    }

    #[test]
    fn test_probability_tracks_energy() {
        let vad = vad();
        assert!(vad.speech_probability(&frame(0.0, 0)) < 0.01);
        assert!(vad.speech_probability(&frame(0.5, 0)) > 0.9);
    }
}
