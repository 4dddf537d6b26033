//! Application state
//!
//! Shared between the prewarm task and the room accept loop. The index
//! slot starts empty and is filled by the background build; sessions
//! created before the build finishes run ungrounded.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use docvoice_agent::{ChatEngine, ChatEngineConfig, VoiceSession, VoiceSessionConfig};
use docvoice_config::Settings;
use docvoice_core::{RetrieveOptions, Retriever, VADConfig, VoiceActivityDetector};
use docvoice_llm::{ChatCompletionsBackend, LlmConfig};
use docvoice_pipeline::{EnergyVad, HttpStt, HttpTts, SttConfig, TtsConfig};
use docvoice_rag::{
    ChunkConfig, Embedder, EmbeddingConfig, HashEmbedder, HttpEmbedder, IndexManager,
    IndexManagerConfig, IndexRetriever, VectorIndex,
};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    embedder: Arc<dyn Embedder>,
    /// Filled by the background index build
    index: Arc<RwLock<Option<Arc<VectorIndex>>>>,
    /// VAD constructed at prewarm, handed to the first session
    prewarmed_vad: Arc<Mutex<Option<Arc<EnergyVad>>>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let providers = &settings.providers;
        let embedder: Arc<dyn Embedder> = if providers.embedding_endpoint.is_empty() {
            Arc::new(HashEmbedder::new(providers.embedding_dim))
        } else {
            Arc::new(HttpEmbedder::new(EmbeddingConfig {
                endpoint: providers.embedding_endpoint.clone(),
                model: providers.embedding_model.clone(),
                embedding_dim: providers.embedding_dim,
            }))
        };

        Self {
            settings: Arc::new(settings),
            embedder,
            index: Arc::new(RwLock::new(None)),
            prewarmed_vad: Arc::new(Mutex::new(None)),
        }
    }

    /// Construct the session VAD ahead of the first room so the first
    /// session does not pay construction cost
    pub fn prewarm(&self) {
        let vad = Arc::new(EnergyVad::new(self.vad_config()));
        tracing::debug!(vad = vad.model_info(), "Pipeline prewarmed");
        *self.prewarmed_vad.lock() = Some(vad);
    }

    /// Build or load the document index into the shared slot
    ///
    /// `Ok(true)` when an index is available afterward, `Ok(false)` for
    /// an empty corpus (sessions run ungrounded). An unusable
    /// persistence directory surfaces as an error; the worker treats
    /// that as fatal.
    pub async fn initialize_index(&self) -> docvoice_core::Result<bool> {
        let manager = IndexManager::new(
            IndexManagerConfig {
                documents_dir: self.settings.index.documents_dir.clone(),
                persist_dir: self.settings.index.persist_dir.clone(),
                chunking: ChunkConfig::default(),
            },
            self.embedder.clone(),
        );

        match manager.load_or_build().await {
            Ok(Some(index)) => {
                tracing::info!(chunks = index.len(), "Document index ready");
                *self.index.write() = Some(index);
                Ok(true)
            },
            Ok(None) => {
                tracing::warn!("No documents to index, sessions will be ungrounded");
                Ok(false)
            },
            Err(e) => {
                tracing::error!(error = %e, "Index initialization failed");
                Err(e.into())
            },
        }
    }

    fn vad_config(&self) -> VADConfig {
        VADConfig {
            threshold: self.settings.session.vad_threshold,
            min_silence_duration_ms: self.settings.session.min_silence_duration_ms,
            ..VADConfig::default()
        }
    }

    /// Retriever over the shared index, if one is available yet
    pub fn retriever(&self) -> Option<Arc<dyn Retriever>> {
        self.index
            .read()
            .as_ref()
            .map(|index| {
                Arc::new(IndexRetriever::new(index.clone(), self.embedder.clone()))
                    as Arc<dyn Retriever>
            })
    }

    pub fn index_ready(&self) -> bool {
        self.index.read().is_some()
    }

    /// Assemble a voice session from the configured providers
    pub fn build_session(&self) -> docvoice_core::Result<VoiceSession> {
        let providers = &self.settings.providers;
        let session = &self.settings.session;

        let vad: Arc<dyn VoiceActivityDetector> = match self.prewarmed_vad.lock().take() {
            Some(vad) => vad,
            None => Arc::new(EnergyVad::new(self.vad_config())),
        };

        let stt = Arc::new(HttpStt::new(SttConfig {
            endpoint: providers.stt_endpoint.clone(),
            api_key: providers.stt_api_key.clone().unwrap_or_default(),
            ..SttConfig::default()
        })?);

        let tts = Arc::new(HttpTts::new(TtsConfig {
            endpoint: providers.tts_endpoint.clone(),
            api_key: providers.tts_api_key.clone().unwrap_or_default(),
            voice: providers.tts_voice.clone(),
            ..TtsConfig::default()
        })?);

        let model = Arc::new(ChatCompletionsBackend::new(LlmConfig {
            endpoint: providers.llm_endpoint.clone(),
            model: providers.llm_model.clone(),
            api_key: providers.llm_api_key.clone(),
            timeout: Duration::from_secs(30),
            ..LlmConfig::default()
        })?);

        let engine = Arc::new(ChatEngine::new(
            model,
            self.retriever(),
            ChatEngineConfig {
                retrieve: RetrieveOptions {
                    top_k: self.settings.index.top_k,
                    min_score: self.settings.index.min_score,
                },
                ..ChatEngineConfig::default()
            },
        ));

        Ok(VoiceSession::new(
            VoiceSessionConfig {
                greeting: session.greeting.clone(),
                barge_in_enabled: session.barge_in_enabled,
                vad: self.vad_config(),
            },
            vad,
            stt,
            tts,
            engine,
        ))
    }
}
