//! Voice relay pipeline.
//!
//! For one inbound audio chunk the relay performs three strictly sequential
//! external calls — transcription, reply generation, speech synthesis — and
//! produces at most one output audio chunk. Each stage sits behind a trait
//! so tests can substitute mocks and future providers can be swapped in
//! without touching the orchestration.
//!
//! Stage faults never escape [`VoiceRelay::process`]: every failure path
//! collapses to a single empty frame on the wire. Internally the pipeline
//! keeps the outcome typed ([`RelayOutcome`]) so logs can still tell
//! "nothing to transcribe" apart from "upstream failure".

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use futures::stream::BoxStream;
use tracing::{debug, warn};

use crate::config::RelayConfig;
use crate::errors::{ConfigError, RelayError, RelayResult};
use crate::providers::openai::{OpenAiChat, OpenAiSpeech, OpenAiTranscriber};

/// Speech-to-text stage.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio chunk to plain text.
    async fn transcribe(&self, audio: Bytes) -> RelayResult<String>;

    /// Release any held session resource. No-op for stateless HTTP stages.
    async fn shutdown(&self) {}
}

/// Reply-generation stage.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate the assistant reply for a single-turn transcript.
    async fn generate(&self, transcript: &str) -> RelayResult<String>;

    /// Release any held session resource. No-op for stateless HTTP stages.
    async fn shutdown(&self) {}
}

/// Text-to-speech stage.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize the reply text to encoded audio bytes.
    async fn synthesize(&self, text: &str) -> RelayResult<Bytes>;

    /// Release any held session resource. No-op for stateless HTTP stages.
    async fn shutdown(&self) {}
}

/// Typed result of one trip through the pipeline.
///
/// Only [`RelayOutcome::Audio`] carries payload; the other variants all map
/// to the empty sentinel frame at the socket boundary but stay
/// distinguishable for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Synthesis succeeded; contains the encoded reply audio
    Audio(Bytes),
    /// Transcription produced no usable text (empty or whitespace-only)
    NoInput,
    /// Reply generation produced no usable text (empty or null content)
    NoReply,
    /// An external call faulted at the named stage
    StageFailed(Stage),
}

/// Pipeline stage names, used in outcomes and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcription,
    ReplyGeneration,
    Synthesis,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Transcription => write!(f, "transcription"),
            Stage::ReplyGeneration => write!(f, "reply-generation"),
            Stage::Synthesis => write!(f, "synthesis"),
        }
    }
}

impl RelayOutcome {
    /// Collapse the outcome to its wire representation.
    ///
    /// Every non-success outcome becomes the zero-length sentinel frame;
    /// the peer cannot distinguish silence from failure by design.
    pub fn into_frame(self) -> Bytes {
        match self {
            RelayOutcome::Audio(bytes) => bytes,
            RelayOutcome::NoInput | RelayOutcome::NoReply | RelayOutcome::StageFailed(_) => {
                Bytes::new()
            }
        }
    }
}

/// Orchestrates transcription, reply generation and synthesis for one
/// audio chunk at a time.
///
/// Stateless across chunks: no conversation history, no per-connection
/// accumulator. One instance is shared by all connections.
pub struct VoiceRelay {
    transcriber: Arc<dyn Transcriber>,
    generator: Arc<dyn ReplyGenerator>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl VoiceRelay {
    /// Build the production relay from validated configuration.
    ///
    /// Fails fast when the credential is missing so the process aborts
    /// before accepting any connection.
    pub fn new(config: RelayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            transcriber: Arc::new(OpenAiTranscriber::new(&config)?),
            generator: Arc::new(OpenAiChat::new(&config)?),
            synthesizer: Arc::new(OpenAiSpeech::new(&config)?),
        })
    }

    /// Build a relay from explicit stage implementations.
    ///
    /// Used by tests and by callers wiring alternative providers.
    pub fn with_stages(
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<dyn ReplyGenerator>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            transcriber,
            generator,
            synthesizer,
        }
    }

    /// Run one chunk through the pipeline and return the typed outcome.
    ///
    /// Strictly sequential: a stage is only invoked if the previous one
    /// produced usable output.
    pub async fn run_pipeline(&self, chunk: Bytes) -> RelayOutcome {
        let transcript = match self.transcriber.transcribe(chunk).await {
            Ok(text) => text,
            Err(e) => {
                warn!(stage = %Stage::Transcription, error = %e, "stage fault");
                return RelayOutcome::StageFailed(Stage::Transcription);
            }
        };

        let transcript = transcript.trim();
        if transcript.is_empty() {
            debug!("transcription produced no text");
            return RelayOutcome::NoInput;
        }
        debug!(chars = transcript.len(), "transcript received");

        let reply = match self.generator.generate(transcript).await {
            Ok(text) => text,
            Err(e) => {
                warn!(stage = %Stage::ReplyGeneration, error = %e, "stage fault");
                return RelayOutcome::StageFailed(Stage::ReplyGeneration);
            }
        };

        let reply = reply.trim();
        if reply.is_empty() {
            debug!("reply generation produced no text");
            return RelayOutcome::NoReply;
        }
        debug!(chars = reply.len(), "reply generated");

        match self.synthesizer.synthesize(reply).await {
            Ok(audio) => {
                debug!(bytes = audio.len(), "audio synthesized");
                RelayOutcome::Audio(audio)
            }
            Err(e) => {
                warn!(stage = %Stage::Synthesis, error = %e, "stage fault");
                RelayOutcome::StageFailed(Stage::Synthesis)
            }
        }
    }

    /// Process one chunk into a lazy stream of output frames.
    ///
    /// The stream yields exactly one frame: the synthesized audio on
    /// success, the empty sentinel otherwise. Callers write frames as they
    /// arrive rather than buffering a full response.
    pub fn process(&self, chunk: Bytes) -> impl Stream<Item = Bytes> + Send + '_ {
        async_stream::stream! {
            yield self.run_pipeline(chunk).await.into_frame();
        }
    }

    /// Boxed variant of [`Self::process`] for callers that need a nameable type.
    pub fn process_boxed(&self, chunk: Bytes) -> BoxStream<'_, Bytes> {
        Box::pin(self.process(chunk))
    }

    /// Release per-relay resources held by the stages.
    ///
    /// Called exactly once per connection, on every exit path. The HTTP
    /// stages hold no session state, so today this only delegates to the
    /// stage no-ops.
    pub async fn teardown(&self) {
        self.transcriber.shutdown().await;
        self.generator.shutdown().await;
        self.synthesizer.shutdown().await;
        debug!("relay teardown complete");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted transcriber that records how often it was called.
    pub(crate) struct MockTranscriber {
        pub result: RelayResult<String>,
        pub calls: AtomicUsize,
        pub shutdowns: AtomicUsize,
    }

    impl MockTranscriber {
        pub fn returning(result: RelayResult<String>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
                shutdowns: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Transcriber for MockTranscriber {
        async fn transcribe(&self, _audio: Bytes) -> RelayResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        async fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) struct MockGenerator {
        pub result: RelayResult<String>,
        pub calls: AtomicUsize,
    }

    impl MockGenerator {
        pub fn returning(result: RelayResult<String>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ReplyGenerator for MockGenerator {
        async fn generate(&self, _transcript: &str) -> RelayResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    pub(crate) struct MockSynthesizer {
        pub result: RelayResult<Bytes>,
        pub calls: AtomicUsize,
    }

    impl MockSynthesizer {
        pub fn returning(result: RelayResult<Bytes>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Synthesizer for MockSynthesizer {
        async fn synthesize(&self, _text: &str) -> RelayResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn network_err<T>() -> RelayResult<T> {
        Err(RelayError::Network("connection refused".to_string()))
    }

    async fn collect_frames(relay: &VoiceRelay, chunk: Bytes) -> Vec<Bytes> {
        // Bounded wait: process must never hang with mocked stages.
        tokio::time::timeout(
            Duration::from_secs(1),
            relay.process(chunk).collect::<Vec<_>>(),
        )
        .await
        .expect("pipeline must terminate")
    }

    #[tokio::test]
    async fn test_transcription_fault_yields_single_empty_frame() {
        let transcriber = MockTranscriber::returning(network_err());
        let generator = MockGenerator::returning(Ok("unused".to_string()));
        let synthesizer = MockSynthesizer::returning(Ok(Bytes::from_static(b"unused")));
        let relay = VoiceRelay::with_stages(
            transcriber.clone(),
            generator.clone(),
            synthesizer.clone(),
        );

        let frames = collect_frames(&relay, Bytes::from_static(b"\x01\x02")).await;
        assert_eq!(frames, vec![Bytes::new()]);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_whitespace_transcript_short_circuits() {
        let transcriber = MockTranscriber::returning(Ok("   \n\t ".to_string()));
        let generator = MockGenerator::returning(Ok("unused".to_string()));
        let synthesizer = MockSynthesizer::returning(Ok(Bytes::from_static(b"unused")));
        let relay = VoiceRelay::with_stages(
            transcriber.clone(),
            generator.clone(),
            synthesizer.clone(),
        );

        let frames = collect_frames(&relay, Bytes::from_static(b"audio")).await;
        assert_eq!(frames, vec![Bytes::new()]);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_reply_skips_synthesis() {
        let transcriber = MockTranscriber::returning(Ok("hello".to_string()));
        let generator = MockGenerator::returning(Ok(String::new()));
        let synthesizer = MockSynthesizer::returning(Ok(Bytes::from_static(b"unused")));
        let relay = VoiceRelay::with_stages(
            transcriber.clone(),
            generator.clone(),
            synthesizer.clone(),
        );

        let frames = collect_frames(&relay, Bytes::from_static(b"audio")).await;
        assert_eq!(frames, vec![Bytes::new()]);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_fault_skips_synthesis() {
        let transcriber = MockTranscriber::returning(Ok("hello".to_string()));
        let generator = MockGenerator::returning(network_err());
        let synthesizer = MockSynthesizer::returning(Ok(Bytes::from_static(b"unused")));
        let relay = VoiceRelay::with_stages(
            transcriber.clone(),
            generator.clone(),
            synthesizer.clone(),
        );

        let frames = collect_frames(&relay, Bytes::from_static(b"audio")).await;
        assert_eq!(frames, vec![Bytes::new()]);
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_path_yields_exact_audio() {
        let audio = Bytes::from_static(b"\xff\xfb\x90\x00synth");
        let transcriber = MockTranscriber::returning(Ok("hello".to_string()));
        let generator = MockGenerator::returning(Ok("hi there".to_string()));
        let synthesizer = MockSynthesizer::returning(Ok(audio.clone()));
        let relay = VoiceRelay::with_stages(
            transcriber.clone(),
            generator.clone(),
            synthesizer.clone(),
        );

        let frames = collect_frames(&relay, Bytes::from_static(b"audio")).await;
        assert_eq!(frames, vec![audio]);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_synthesis_fault_yields_empty_frame() {
        let transcriber = MockTranscriber::returning(Ok("hello".to_string()));
        let generator = MockGenerator::returning(Ok("hi there".to_string()));
        let synthesizer = MockSynthesizer::returning(network_err());
        let relay = VoiceRelay::with_stages(transcriber, generator, synthesizer.clone());

        let frames = collect_frames(&relay, Bytes::from_static(b"audio")).await;
        assert_eq!(frames, vec![Bytes::new()]);
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_typed_outcomes_distinguish_failure_modes() {
        let faulted = VoiceRelay::with_stages(
            MockTranscriber::returning(network_err()),
            MockGenerator::returning(Ok("unused".to_string())),
            MockSynthesizer::returning(Ok(Bytes::new())),
        );
        assert_eq!(
            faulted.run_pipeline(Bytes::from_static(b"a")).await,
            RelayOutcome::StageFailed(Stage::Transcription)
        );

        let silent = VoiceRelay::with_stages(
            MockTranscriber::returning(Ok("  ".to_string())),
            MockGenerator::returning(Ok("unused".to_string())),
            MockSynthesizer::returning(Ok(Bytes::new())),
        );
        assert_eq!(
            silent.run_pipeline(Bytes::from_static(b"a")).await,
            RelayOutcome::NoInput
        );

        // An empty assistant reply is not the same as silent input.
        let speechless = VoiceRelay::with_stages(
            MockTranscriber::returning(Ok("hello".to_string())),
            MockGenerator::returning(Ok(" \n".to_string())),
            MockSynthesizer::returning(Ok(Bytes::new())),
        );
        assert_eq!(
            speechless.run_pipeline(Bytes::from_static(b"a")).await,
            RelayOutcome::NoReply
        );
    }

    #[tokio::test]
    async fn test_teardown_reaches_stages() {
        let transcriber = MockTranscriber::returning(Ok("hello".to_string()));
        let relay = VoiceRelay::with_stages(
            transcriber.clone(),
            MockGenerator::returning(Ok("hi".to_string())),
            MockSynthesizer::returning(Ok(Bytes::new())),
        );
        relay.teardown().await;
        assert_eq!(transcriber.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_relay_construction_requires_credential() {
        let config = RelayConfig {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            stt_model: "whisper-1".to_string(),
            stt_language: None,
            audio_input_format: crate::providers::openai::AudioInputFormat::Webm,
            chat_model: "gpt-4o-mini".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_format: "mp3".to_string(),
        };
        assert!(matches!(
            VoiceRelay::new(config),
            Err(ConfigError::MissingEnvVar("OPENAI_API_KEY"))
        ));
    }

    #[test]
    fn test_outcome_into_frame() {
        assert_eq!(
            RelayOutcome::Audio(Bytes::from_static(b"x")).into_frame(),
            Bytes::from_static(b"x")
        );
        assert_eq!(RelayOutcome::NoInput.into_frame(), Bytes::new());
        assert_eq!(RelayOutcome::NoReply.into_frame(), Bytes::new());
        assert_eq!(
            RelayOutcome::StageFailed(Stage::Synthesis).into_frame(),
            Bytes::new()
        );
    }
}
