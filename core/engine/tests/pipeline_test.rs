//! 管线端到端测试（调度器用 mock 实现）

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::timeout;

use petvoice_engine::dispatcher::{
    AnalysisDispatcher, PredictResponse, RawBackendResponse, TranslateResponse,
};
use petvoice_engine::event_bus::{
    ChannelEventBus, EventTopic, TOPIC_ANALYSIS_COMPLETED, TOPIC_ANALYSIS_FAILED,
    TOPIC_ANALYSIS_STARTED,
};
use petvoice_engine::media_capture::StubMicrophone;
use petvoice_engine::taxonomy::{CanonicalEmotion, Species};
use petvoice_engine::types::AnalysisRequest;
use petvoice_engine::{
    PetVoicePipeline, PipelineError, PipelineResult, StaticConfigManager, StderrTelemetrySink,
};

fn predict_raw(label: &str, confidence: f32) -> RawBackendResponse {
    RawBackendResponse::Predict(PredictResponse {
        success: Some(true),
        emotion: Some(label.to_string()),
        confidence: Some(confidence),
        ..Default::default()
    })
}

/// 固定返回同一个结果的 mock 调度器
struct FixedDispatcher {
    calls: AtomicUsize,
    response: PipelineResult<RawBackendResponse>,
}

impl FixedDispatcher {
    fn new(response: PipelineResult<RawBackendResponse>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            response,
        })
    }
}

#[async_trait]
impl AnalysisDispatcher for FixedDispatcher {
    async fn dispatch(&self, _request: AnalysisRequest) -> PipelineResult<RawBackendResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

fn build_pipeline(
    dispatcher: Arc<dyn AnalysisDispatcher>,
    mic: StubMicrophone,
    bus: Arc<ChannelEventBus>,
) -> PetVoicePipeline {
    PetVoicePipeline::builder()
        .microphone(Arc::new(mic))
        .dispatcher(dispatcher)
        .config(Arc::new(StaticConfigManager::default()))
        .event_bus(bus)
        .telemetry(Arc::new(StderrTelemetrySink::new()))
        .build()
        .expect("管线装配失败")
}

#[tokio::test]
async fn classify_flow_normalizes_and_stores_result() {
    let dispatcher = FixedDispatcher::new(Ok(predict_raw("hungry", 0.82)));
    let pipeline = build_pipeline(
        dispatcher.clone(),
        StubMicrophone::new(vec![]),
        Arc::new(ChannelEventBus::new()),
    );
    pipeline.boot().await.unwrap();

    let result = pipeline
        .classify_audio_file(vec![1, 2, 3], "audio/wav", Species::Cat)
        .await
        .unwrap();

    assert_eq!(result.emotion, CanonicalEmotion::Hungry);
    assert_eq!(result.confidence, 82);
    assert_eq!(result.description, "检测到猫咪的饿了情绪 (置信度: 82%)");

    let latest = pipeline.last_result().await.unwrap();
    assert_eq!(latest.emotion, CanonicalEmotion::Hungry);
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn started_event_pairs_with_completed() {
    let bus = Arc::new(ChannelEventBus::new());
    let mut started_rx = bus
        .subscribe_receiver(EventTopic(TOPIC_ANALYSIS_STARTED.to_string()))
        .await;
    let mut completed_rx = bus
        .subscribe_receiver(EventTopic(TOPIC_ANALYSIS_COMPLETED.to_string()))
        .await;

    let pipeline = build_pipeline(
        FixedDispatcher::new(Ok(predict_raw("warning", 0.61))),
        StubMicrophone::new(vec![]),
        bus.clone(),
    );
    pipeline
        .classify_audio_file(vec![1], "audio/wav", Species::Dog)
        .await
        .unwrap();

    let started = timeout(Duration::from_secs(1), started_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let completed = timeout(Duration::from_secs(1), completed_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(started.payload["ticket"], completed.payload["ticket"]);
    assert_eq!(completed.payload["emotion"], "警告");
}

#[tokio::test]
async fn started_event_pairs_with_failed_on_error_path() {
    let bus = Arc::new(ChannelEventBus::new());
    let mut failed_rx = bus
        .subscribe_receiver(EventTopic(TOPIC_ANALYSIS_FAILED.to_string()))
        .await;

    let pipeline = build_pipeline(
        FixedDispatcher::new(Err(PipelineError::ServiceNotReady)),
        StubMicrophone::new(vec![]),
        bus.clone(),
    );
    let err = pipeline
        .classify_audio_file(vec![1], "audio/wav", Species::Cat)
        .await
        .unwrap_err();
    assert_eq!(err, PipelineError::ServiceNotReady);

    // 失败路径同样熄灭加载指示
    let failed = timeout(Duration::from_secs(1), failed_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(failed.payload["message"]
        .as_str()
        .unwrap()
        .contains("未就绪"));
    assert!(pipeline.last_result().await.is_none());
}

#[tokio::test]
async fn each_stop_event_uploads_exactly_once() {
    let dispatcher = FixedDispatcher::new(Ok(predict_raw("coquetry", 0.7)));
    let pipeline = build_pipeline(
        dispatcher.clone(),
        StubMicrophone::new(vec![vec![1, 2]]),
        Arc::new(ChannelEventBus::new()),
    );

    assert!(pipeline.start_recording().await.unwrap());
    tokio::time::sleep(Duration::from_millis(15)).await;

    let result = pipeline
        .finish_recording_and_classify(Species::Cat)
        .await
        .unwrap();
    assert!(result.is_some());
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);

    // Idle 状态下再停一次：既没有负载也没有第二次上传
    let second = pipeline
        .finish_recording_and_classify(Species::Cat)
        .await
        .unwrap();
    assert!(second.is_none());
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retry_redispatches_an_equivalent_request() {
    let dispatcher = FixedDispatcher::new(Ok(predict_raw("hungry", 0.9)));
    let pipeline = build_pipeline(
        dispatcher.clone(),
        StubMicrophone::new(vec![]),
        Arc::new(ChannelEventBus::new()),
    );

    pipeline
        .classify_audio_file(vec![5, 5], "audio/mpeg", Species::Cat)
        .await
        .unwrap();
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);

    let retried = pipeline.retry_last().await.unwrap().expect("应有历史请求");
    assert_eq!(retried.emotion, CanonicalEmotion::Hungry);
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn retry_without_history_is_a_noop() {
    let pipeline = build_pipeline(
        FixedDispatcher::new(Ok(predict_raw("hungry", 0.9))),
        StubMicrophone::new(vec![]),
        Arc::new(ChannelEventBus::new()),
    );
    assert!(pipeline.retry_last().await.unwrap().is_none());
}

/// 第一个请求被闸门挂住、第二个立即完成的 mock 调度器
struct GatedDispatcher {
    calls: AtomicUsize,
    gate: Arc<Notify>,
}

#[async_trait]
impl AnalysisDispatcher for GatedDispatcher {
    async fn dispatch(&self, _request: AnalysisRequest) -> PipelineResult<RawBackendResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            self.gate.notified().await;
            Ok(predict_raw("warning", 0.5))
        } else {
            Ok(predict_raw("hungry", 0.9))
        }
    }
}

#[tokio::test]
async fn stale_result_loses_to_newer_request() {
    let gate = Arc::new(Notify::new());
    let dispatcher = Arc::new(GatedDispatcher {
        calls: AtomicUsize::new(0),
        gate: gate.clone(),
    });
    let pipeline = Arc::new(build_pipeline(
        dispatcher.clone(),
        StubMicrophone::new(vec![]),
        Arc::new(ChannelEventBus::new()),
    ));

    let first = tokio::spawn({
        let pipeline = pipeline.clone();
        async move {
            pipeline
                .classify_audio_file(vec![1], "audio/wav", Species::Cat)
                .await
        }
    });

    // 等第一个请求真正进入调度器再发第二个，保证票号顺序
    while dispatcher.calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let newer = pipeline
        .classify_audio_file(vec![2], "audio/wav", Species::Cat)
        .await
        .unwrap();
    assert_eq!(newer.emotion, CanonicalEmotion::Hungry);

    // 放行旧请求：它拿到自己的返回值，但结果槽不被覆盖
    gate.notify_one();
    let stale = first.await.unwrap().unwrap();
    assert_eq!(stale.emotion, CanonicalEmotion::Warning);

    let latest = pipeline.last_result().await.unwrap();
    assert_eq!(latest.emotion, CanonicalEmotion::Hungry);
}

#[tokio::test]
async fn image_failure_degrades_instead_of_erroring() {
    let pipeline = build_pipeline(
        FixedDispatcher::new(Err(PipelineError::TransportError {
            details: "connection refused".to_string(),
        })),
        StubMicrophone::new(vec![]),
        Arc::new(ChannelEventBus::new()),
    );

    let result = pipeline
        .classify_image_file(vec![0xFF, 0xD8], "image/jpeg", Species::Cat)
        .await;

    assert_eq!(result.emotion, CanonicalEmotion::AnalysisFailed);
    assert_eq!(result.confidence, 0);
    assert!(result.description.contains("图片分析失败"));
    assert_eq!(result.tips.len(), 3);
}

#[tokio::test]
async fn translation_uses_backend_fields_verbatim() {
    let response = RawBackendResponse::Translate(TranslateResponse {
        success: true,
        original_animal: Some("cat".to_string()),
        original_emotion: Some("hungry".to_string()),
        original_emotion_name: Some("饿了".to_string()),
        confidence: Some(0.82),
        target_animal_name: Some("狗".to_string()),
        description: Some("为您播放对应的狗语音频".to_string()),
        audio_filename: Some("狗_饿了.m4a".to_string()),
        ..Default::default()
    });
    let pipeline = build_pipeline(
        FixedDispatcher::new(Ok(response)),
        StubMicrophone::new(vec![]),
        Arc::new(ChannelEventBus::new()),
    );

    let result = pipeline
        .translate_audio_file(vec![1, 2], "audio/m4a", Species::Cat)
        .await
        .unwrap();

    assert_eq!(result.source.species, Species::Cat);
    assert_eq!(result.source.intent, CanonicalEmotion::Hungry);
    assert_eq!(result.source.confidence, 82);
    assert_eq!(result.target.species, Species::Dog);
    assert_eq!(result.target.description, "为您播放对应的狗语音频");
    assert_eq!(result.audio_reference.as_deref(), Some("狗_饿了.m4a"));
    assert!(result.can_translate);
}

#[tokio::test]
async fn translation_falls_back_to_local_mapping() {
    // 后端只给了分类结果、没给翻译侧字段
    let pipeline = build_pipeline(
        FixedDispatcher::new(Ok(predict_raw("hungry", 0.9))),
        StubMicrophone::new(vec![]),
        Arc::new(ChannelEventBus::new()),
    );

    let result = pipeline
        .translate_audio_file(vec![1], "audio/wav", Species::Cat)
        .await
        .unwrap();

    assert_eq!(result.source.intent, CanonicalEmotion::Hungry);
    assert_eq!(result.target.species, Species::Dog);
    assert_eq!(result.target.intent, CanonicalEmotion::Hungry);
    assert_eq!(result.audio_reference.as_deref(), Some("狗_饿了.m4a"));
    assert!(result.can_translate);
}

#[tokio::test]
async fn builder_reports_missing_components() {
    let err = PetVoicePipeline::builder()
        .microphone(Arc::new(StubMicrophone::new(vec![])))
        .config(Arc::new(StaticConfigManager::default()))
        .event_bus(Arc::new(ChannelEventBus::new()))
        .telemetry(Arc::new(StderrTelemetrySink::new()))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("dispatcher"));
}
