//! Room abstraction
//!
//! A room is the audio boundary of a session: participant lifecycle and
//! microphone frames come in, synthesized playback frames go out. The
//! transport side holds a `RoomHandle`; the session consumes the `Room`.

use tokio::sync::mpsc;

use docvoice_core::AudioFrame;

use crate::AgentError;

/// Events arriving from the room transport
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// A participant joined the room
    ParticipantJoined { identity: String },
    /// A microphone audio frame from the participant
    Audio(AudioFrame),
    /// The room was closed by the transport
    Closed,
}

/// Session side of a room
pub struct Room {
    name: String,
    events: mpsc::Receiver<RoomEvent>,
    playback_tx: mpsc::Sender<AudioFrame>,
}

/// Transport side of a room
pub struct RoomHandle {
    event_tx: mpsc::Sender<RoomEvent>,
    playback: Option<mpsc::Receiver<AudioFrame>>,
}

impl Room {
    /// Create a connected room / handle pair
    pub fn channel(name: impl Into<String>, capacity: usize) -> (Self, RoomHandle) {
        let (event_tx, events) = mpsc::channel(capacity);
        let (playback_tx, playback) = mpsc::channel(capacity);

        (
            Self {
                name: name.into(),
                events,
                playback_tx,
            },
            RoomHandle {
                event_tx,
                playback: Some(playback),
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receive the next room event; `None` when the transport is gone
    pub async fn next_event(&mut self) -> Option<RoomEvent> {
        self.events.recv().await
    }

    /// Send a playback frame toward the participant
    pub async fn play(&self, frame: AudioFrame) -> Result<(), AgentError> {
        self.playback_tx
            .send(frame)
            .await
            .map_err(|_| AgentError::Room("Playback channel closed".to_string()))
    }
}

impl RoomHandle {
    /// Announce a participant
    pub async fn join(&self, identity: impl Into<String>) -> Result<(), AgentError> {
        self.event_tx
            .send(RoomEvent::ParticipantJoined {
                identity: identity.into(),
            })
            .await
            .map_err(|_| AgentError::Room("Event channel closed".to_string()))
    }

    /// Push a microphone frame
    pub async fn send_audio(&self, frame: AudioFrame) -> Result<(), AgentError> {
        self.event_tx
            .send(RoomEvent::Audio(frame))
            .await
            .map_err(|_| AgentError::Room("Event channel closed".to_string()))
    }

    /// Close the room
    pub async fn close(&self) {
        let _ = self.event_tx.send(RoomEvent::Closed).await;
    }

    /// Receive the next playback frame
    pub async fn next_playback(&mut self) -> Option<AudioFrame> {
        match &mut self.playback {
            Some(playback) => playback.recv().await,
            None => None,
        }
    }

    /// Take the playback receiver for a dedicated consumer task
    pub fn take_playback(&mut self) -> Option<mpsc::Receiver<AudioFrame>> {
        self.playback.take()
    }
}
