pub mod bootstrap;
pub mod config_manager;
pub mod dispatcher;
pub mod error;
pub mod event_bus;
pub mod health_check;
pub mod media_capture;
pub mod normalizer;
pub mod taxonomy;
pub mod telemetry;
pub mod translation;
pub mod types;

pub use bootstrap::{PetVoicePipeline, PetVoicePipelineBuilder};
pub use config_manager::{
    ConfigManager, EngineConfig, StaticConfigManager, VisionConfig, MAX_UPLOAD_BYTES,
};
pub use dispatcher::{
    classify_status, vision_prompt, AnalysisDispatcher, HttpAnalysisDispatcher, PredictResponse,
    RawBackendResponse, TranslateResponse,
};
pub use error::{PipelineError, PipelineResult};
pub use event_bus::{ChannelEventBus, EventBus, EventTopic, PipelineEvent};
pub use health_check::{HealthChecker, ServiceHealth};
pub use media_capture::{
    CaptureState, MediaCapture, MicrophoneSource, MicrophoneStream, StubMicrophone,
};
pub use normalizer::{extract_embedded_json, normalize, VisionInsight};
pub use taxonomy::{CanonicalEmotion, Species, ALL_EMOTIONS};
pub use telemetry::{StderrTelemetrySink, TelemetryDatum, TelemetrySink};
pub use translation::TranslationEngine;
pub use types::{
    AnalysisPurpose, AnalysisRequest, AnalysisResult, MediaKind, MediaPayload, TranslationResult,
    TranslationSource, TranslationTarget,
};
