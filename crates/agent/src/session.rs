//! Voice session
//!
//! Drives one conversation end to end: wait for a participant, play an
//! interruptible greeting, then loop turns through VAD, STT, the chat
//! engine, and TTS playback. Turn-level failures (a provider hiccup, a
//! blank transcript) keep the session alive; only transport loss or
//! shutdown ends it.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{broadcast, RwLock};

use docvoice_core::{
    AudioFrame, SpeechToText, TextToSpeech, VADConfig, VADEvent, VoiceActivityDetector,
};

use crate::chat_engine::ChatEngine;
use crate::room::{Room, RoomEvent};
use crate::AgentError;

/// Voice session configuration
#[derive(Debug, Clone)]
pub struct VoiceSessionConfig {
    /// Greeting spoken when the participant joins
    pub greeting: String,
    /// Allow the participant to interrupt playback
    pub barge_in_enabled: bool,
    /// VAD parameters
    pub vad: VADConfig,
}

impl Default for VoiceSessionConfig {
    fn default() -> Self {
        Self {
            greeting: "Hey, how can I help you today?".to_string(),
            barge_in_enabled: true,
            vad: VADConfig::default(),
        }
    }
}

/// Voice session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceSessionState {
    /// Waiting for a participant to join
    WaitingForParticipant,
    /// Listening for user speech
    Listening,
    /// Processing user input
    Processing,
    /// Speaking a response
    Speaking,
    /// Session ended
    Ended,
}

/// Voice session events
#[derive(Debug, Clone)]
pub enum VoiceSessionEvent {
    /// Participant joined and the session started
    Started { session_id: String, participant: String },
    /// State changed
    StateChanged {
        old: VoiceSessionState,
        new: VoiceSessionState,
    },
    /// Final transcript of a user turn
    UserTranscript { text: String },
    /// Response being spoken
    Speaking { text: String },
    /// Playback interrupted by the participant
    BargedIn,
    /// Turn-level error, session continues
    Error(String),
    /// Session ended
    Ended { reason: String },
}

/// A single voice conversation over a room
pub struct VoiceSession {
    session_id: String,
    config: VoiceSessionConfig,
    vad: Arc<dyn VoiceActivityDetector>,
    stt: Arc<dyn SpeechToText>,
    tts: Arc<dyn TextToSpeech>,
    engine: Arc<ChatEngine>,
    state: Arc<RwLock<VoiceSessionState>>,
    event_tx: broadcast::Sender<VoiceSessionEvent>,
    shutdown_tx: broadcast::Sender<()>,
}

impl VoiceSession {
    pub fn new(
        config: VoiceSessionConfig,
        vad: Arc<dyn VoiceActivityDetector>,
        stt: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
        engine: Arc<ChatEngine>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            config,
            vad,
            stt,
            tts,
            engine,
            state: Arc::new(RwLock::new(VoiceSessionState::WaitingForParticipant)),
            event_tx,
            shutdown_tx,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<VoiceSessionEvent> {
        self.event_tx.subscribe()
    }

    /// Current session state
    pub async fn state(&self) -> VoiceSessionState {
        *self.state.read().await
    }

    /// Request session shutdown
    pub fn end(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Run the conversation until the room closes or shutdown is requested
    pub async fn run(&self, mut room: Room) -> Result<(), AgentError> {
        // Subscribe before anything else so an early end() is not lost
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let participant = match self.wait_for_participant(&mut room, &mut shutdown_rx).await? {
            Some(identity) => identity,
            None => {
                self.finish("Room closed before a participant joined").await;
                return Ok(());
            },
        };

        tracing::info!(
            session_id = %self.session_id,
            room = room.name(),
            participant = %participant,
            grounded = self.engine.is_grounded(),
            "Starting voice session"
        );
        let _ = self.event_tx.send(VoiceSessionEvent::Started {
            session_id: self.session_id.clone(),
            participant,
        });

        self.vad.reset();
        let greeting = self.config.greeting.clone();
        if self.speak(&mut room, &greeting).await?.room_closed {
            self.finish("Room closed").await;
            return Ok(());
        }

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    self.finish("Shutdown requested").await;
                    return Ok(());
                }

                event = room.next_event() => match event {
                    Some(RoomEvent::Audio(frame)) => {
                        if let VADEvent::SpeechEnd { utterance } = self.vad.process(&frame) {
                            if self.handle_turn(&mut room, utterance).await? {
                                self.finish("Room closed").await;
                                return Ok(());
                            }
                        }
                    },
                    Some(RoomEvent::ParticipantJoined { identity }) => {
                        tracing::debug!(participant = %identity, "Additional participant ignored");
                    },
                    Some(RoomEvent::Closed) | None => {
                        self.finish("Room closed").await;
                        return Ok(());
                    },
                },
            }
        }
    }

    /// Wait for the first participant; `None` if the room closes first
    async fn wait_for_participant(
        &self,
        room: &mut Room,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> Result<Option<String>, AgentError> {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => return Ok(None),
                event = room.next_event() => match event {
                    Some(RoomEvent::ParticipantJoined { identity }) => {
                        return Ok(Some(identity));
                    },
                    Some(RoomEvent::Audio(_)) => continue,
                    Some(RoomEvent::Closed) | None => return Ok(None),
                },
            }
        }
    }

    /// Process one completed user utterance
    ///
    /// Returns `true` when the room closed during playback.
    async fn handle_turn(&self, room: &mut Room, utterance: AudioFrame) -> Result<bool, AgentError> {
        self.set_state(VoiceSessionState::Processing).await;

        let transcript = match self.stt.transcribe(&utterance).await {
            Ok(transcript) => transcript,
            Err(e) => {
                self.turn_error(e).await;
                self.set_state(VoiceSessionState::Listening).await;
                return Ok(false);
            },
        };

        if transcript.is_blank() {
            tracing::debug!("Blank transcript, ignoring turn");
            self.set_state(VoiceSessionState::Listening).await;
            return Ok(false);
        }

        tracing::info!(text = %transcript.text, "User turn");
        let _ = self.event_tx.send(VoiceSessionEvent::UserTranscript {
            text: transcript.text.clone(),
        });

        let response = match self.engine.respond(&transcript.text).await {
            Ok(response) => response,
            Err(e) => {
                self.turn_error(e).await;
                self.set_state(VoiceSessionState::Listening).await;
                return Ok(false);
            },
        };

        let outcome = self.speak(room, &response).await?;
        if outcome.barged_in {
            tracing::debug!("Response interrupted by participant");
        }
        Ok(outcome.room_closed)
    }

    /// Speak text over the room, stopping early on barge-in
    async fn speak(&self, room: &mut Room, text: &str) -> Result<SpeakOutcome, AgentError> {
        self.set_state(VoiceSessionState::Speaking).await;
        let _ = self.event_tx.send(VoiceSessionEvent::Speaking {
            text: text.to_string(),
        });

        let mut outcome = SpeakOutcome::default();
        {
            let mut stream = self.tts.synthesize_stream(text);

            loop {
                tokio::select! {
                    chunk = stream.next() => match chunk {
                        Some(Ok(frame)) => {
                            if room.play(frame).await.is_err() {
                                outcome.room_closed = true;
                                break;
                            }
                        },
                        Some(Err(e)) => {
                            self.turn_error(e).await;
                            break;
                        },
                        None => break,
                    },

                    event = room.next_event(), if self.config.barge_in_enabled => match event {
                        Some(RoomEvent::Audio(frame)) => {
                            if self.vad.speech_probability(&frame) >= self.config.vad.threshold {
                                tracing::debug!("Barge-in detected, stopping playback");
                                let _ = self.event_tx.send(VoiceSessionEvent::BargedIn);
                                // The interrupting frame starts the next turn
                                self.vad.reset();
                                self.vad.process(&frame);
                                outcome.barged_in = true;
                                break;
                            }
                        },
                        Some(RoomEvent::ParticipantJoined { .. }) => {},
                        Some(RoomEvent::Closed) | None => {
                            outcome.room_closed = true;
                            break;
                        },
                    },
                }
            }
        }

        if !outcome.room_closed {
            self.set_state(VoiceSessionState::Listening).await;
        }
        Ok(outcome)
    }

    async fn turn_error(&self, error: docvoice_core::Error) {
        if error.is_turn_recoverable() {
            tracing::warn!(error = %error, "Turn failed, continuing session");
        } else {
            tracing::error!(error = %error, "Turn failed");
        }
        let _ = self.event_tx.send(VoiceSessionEvent::Error(error.to_string()));
    }

    async fn set_state(&self, new: VoiceSessionState) {
        let mut state = self.state.write().await;
        let old = *state;
        if old != new {
            *state = new;
            let _ = self
                .event_tx
                .send(VoiceSessionEvent::StateChanged { old, new });
        }
    }

    async fn finish(&self, reason: &str) {
        self.set_state(VoiceSessionState::Ended).await;
        tracing::info!(session_id = %self.session_id, reason, "Session ended");
        let _ = self.event_tx.send(VoiceSessionEvent::Ended {
            reason: reason.to_string(),
        });
    }
}

/// How a playback attempt ended
#[derive(Debug, Default)]
struct SpeakOutcome {
    barged_in: bool,
    room_closed: bool,
}
