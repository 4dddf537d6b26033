//! End-to-end session tests with mock providers: a full voice turn,
//! barge-in during playback, and clean teardown on room close.

use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use tokio::time::timeout;

use docvoice_agent::{
    ChatEngine, ChatEngineConfig, Room, VoiceSession, VoiceSessionConfig, VoiceSessionEvent,
};
use docvoice_core::{
    AudioFrame, ChatMessage, ChatModel, Channels, Result, SampleRate, SpeechToText,
    TextToSpeech, TranscriptResult,
};
use docvoice_pipeline::EnergyVad;

struct MockStt;

#[async_trait]
impl SpeechToText for MockStt {
    async fn transcribe(&self, _audio: &AudioFrame) -> Result<TranscriptResult> {
        Ok(TranscriptResult::final_text("what are gold loan rates", 0.97))
    }

    fn model_name(&self) -> &str {
        "mock-stt"
    }
}

/// TTS yielding many small chunks with a delay, so playback is long
/// enough to interrupt
struct MockTts {
    chunks: usize,
    chunks_played: Arc<AtomicUsize>,
}

#[async_trait]
impl TextToSpeech for MockTts {
    async fn synthesize(&self, _text: &str) -> Result<AudioFrame> {
        Ok(AudioFrame::new(
            vec![0.2; 320],
            SampleRate::Hz16000,
            Channels::Mono,
            0,
        ))
    }

    fn synthesize_stream<'a>(
        &'a self,
        _text: &'a str,
    ) -> Pin<Box<dyn Stream<Item = Result<AudioFrame>> + Send + 'a>> {
        let total = self.chunks;
        let played = self.chunks_played.clone();
        Box::pin(futures::stream::unfold(0usize, move |i| {
            let played = played.clone();
            async move {
                if i >= total {
                    return None;
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
                played.fetch_add(1, Ordering::SeqCst);
                let frame =
                    AudioFrame::new(vec![0.2; 320], SampleRate::Hz16000, Channels::Mono, i as u64);
                Some((Ok(frame), i + 1))
            }
        }))
    }

    fn model_name(&self) -> &str {
        "mock-tts"
    }
}

struct MockModel;

#[async_trait]
impl ChatModel for MockModel {
    async fn chat(&self, _messages: &[ChatMessage]) -> Result<String> {
        Ok("Rates start at nine percent.".to_string())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

fn session(config: VoiceSessionConfig, tts_chunks: usize) -> (Arc<VoiceSession>, Arc<AtomicUsize>) {
    let chunks_played = Arc::new(AtomicUsize::new(0));
    let vad_config = config.vad.clone();
    let session = VoiceSession::new(
        config,
        Arc::new(EnergyVad::new(vad_config)),
        Arc::new(MockStt),
        Arc::new(MockTts {
            chunks: tts_chunks,
            chunks_played: chunks_played.clone(),
        }),
        Arc::new(ChatEngine::new(
            Arc::new(MockModel),
            None,
            ChatEngineConfig::default(),
        )),
    );
    (Arc::new(session), chunks_played)
}

fn speech_frame(sequence: u64) -> AudioFrame {
    AudioFrame::new(vec![0.5; 320], SampleRate::Hz16000, Channels::Mono, sequence)
}

fn silence_frame(sequence: u64) -> AudioFrame {
    AudioFrame::new(vec![0.0; 320], SampleRate::Hz16000, Channels::Mono, sequence)
}

async fn wait_for<F>(
    events: &mut tokio::sync::broadcast::Receiver<VoiceSessionEvent>,
    mut predicate: F,
) -> VoiceSessionEvent
where
    F: FnMut(&VoiceSessionEvent) -> bool,
{
    timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.expect("event stream open");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("expected event within timeout")
}

#[tokio::test]
async fn full_turn_produces_transcript_and_spoken_response() {
    let config = VoiceSessionConfig {
        barge_in_enabled: false,
        ..Default::default()
    };
    let (session, _) = session(config, 5);
    let mut events = session.subscribe();

    let (room, mut handle) = Room::channel("test-room", 256);
    let mut playback = handle.take_playback().unwrap();
    tokio::spawn(async move { while playback.recv().await.is_some() {} });

    let runner = {
        let session = session.clone();
        tokio::spawn(async move { session.run(room).await })
    };

    handle.join("caller-1").await.unwrap();
    wait_for(&mut events, |e| matches!(e, VoiceSessionEvent::Started { .. })).await;

    // 500ms of speech then 500ms of silence completes a turn
    let mut sequence = 0;
    for _ in 0..25 {
        handle.send_audio(speech_frame(sequence)).await.unwrap();
        sequence += 1;
    }
    for _ in 0..25 {
        handle.send_audio(silence_frame(sequence)).await.unwrap();
        sequence += 1;
    }

    let transcript = wait_for(&mut events, |e| {
        matches!(e, VoiceSessionEvent::UserTranscript { .. })
    })
    .await;
    if let VoiceSessionEvent::UserTranscript { text } = transcript {
        assert_eq!(text, "what are gold loan rates");
    }

    let speaking = wait_for(&mut events, |e| {
        matches!(e, VoiceSessionEvent::Speaking { text } if text.contains("nine percent"))
    })
    .await;
    assert!(matches!(speaking, VoiceSessionEvent::Speaking { .. }));

    handle.close().await;
    wait_for(&mut events, |e| matches!(e, VoiceSessionEvent::Ended { .. })).await;
    runner.await.unwrap().unwrap();
}

#[tokio::test]
async fn barge_in_stops_playback_early() {
    let (session, chunks_played) = session(VoiceSessionConfig::default(), 500);
    let mut events = session.subscribe();

    let (room, mut handle) = Room::channel("test-room", 256);
    let mut playback = handle.take_playback().unwrap();
    tokio::spawn(async move { while playback.recv().await.is_some() {} });

    let runner = {
        let session = session.clone();
        tokio::spawn(async move { session.run(room).await })
    };

    handle.join("caller-1").await.unwrap();
    wait_for(&mut events, |e| {
        matches!(e, VoiceSessionEvent::Speaking { .. })
    })
    .await;

    // Interrupt the greeting mid-playback
    handle.send_audio(speech_frame(0)).await.unwrap();
    wait_for(&mut events, |e| matches!(e, VoiceSessionEvent::BargedIn)).await;

    assert!(chunks_played.load(Ordering::SeqCst) < 500);

    handle.close().await;
    wait_for(&mut events, |e| matches!(e, VoiceSessionEvent::Ended { .. })).await;
    runner.await.unwrap().unwrap();
}

#[tokio::test]
async fn room_closed_before_join_ends_cleanly() {
    let (session, _) = session(VoiceSessionConfig::default(), 5);
    let mut events = session.subscribe();

    let (room, handle) = Room::channel("test-room", 8);
    handle.close().await;

    let runner = {
        let session = session.clone();
        tokio::spawn(async move { session.run(room).await })
    };

    wait_for(&mut events, |e| matches!(e, VoiceSessionEvent::Ended { .. })).await;
    runner.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_request_ends_session() {
    let (session, _) = session(VoiceSessionConfig::default(), 5);
    let mut events = session.subscribe();

    let (room, mut handle) = Room::channel("test-room", 256);
    let mut playback = handle.take_playback().unwrap();
    tokio::spawn(async move { while playback.recv().await.is_some() {} });

    let runner = {
        let session = session.clone();
        tokio::spawn(async move { session.run(room).await })
    };

    handle.join("caller-1").await.unwrap();
    wait_for(&mut events, |e| matches!(e, VoiceSessionEvent::Started { .. })).await;

    session.end();
    wait_for(&mut events, |e| matches!(e, VoiceSessionEvent::Ended { .. })).await;
    runner.await.unwrap().unwrap();
}