//! 调度器的离线集成测试
//!
//! 需要真实后端的用例放在带 #[ignore] 的测试里；这里只覆盖不触网
//! 就能判定的行为。

use petvoice_engine::dispatcher::{AnalysisDispatcher, HttpAnalysisDispatcher};
use petvoice_engine::taxonomy::Species;
use petvoice_engine::types::{AnalysisPurpose, AnalysisRequest, MediaKind, MediaPayload};
use petvoice_engine::{EngineConfig, PipelineError};

#[tokio::test]
async fn oversized_audio_short_circuits_before_the_wire() {
    let dispatcher = HttpAnalysisDispatcher::new(EngineConfig::default());

    // 25MB：超过 20MB 上限，不应产生任何网络调用或响应体解析
    let payload = MediaPayload::new(vec![0u8; 25 * 1024 * 1024], "audio/wav");
    let request = AnalysisRequest::classify_audio(payload, Species::Cat);

    let err = dispatcher.dispatch(request).await.unwrap_err();
    assert_eq!(err, PipelineError::PayloadTooLarge);
}

#[tokio::test]
async fn oversized_translation_upload_is_rejected_the_same_way() {
    let dispatcher = HttpAnalysisDispatcher::new(EngineConfig::default());

    let payload = MediaPayload::new(vec![0u8; 25 * 1024 * 1024], "audio/mpeg");
    let request = AnalysisRequest::translate_audio(payload, Species::Dog);

    let err = dispatcher.dispatch(request).await.unwrap_err();
    assert_eq!(err, PipelineError::PayloadTooLarge);
}

#[tokio::test]
async fn image_translation_has_no_route() {
    let dispatcher = HttpAnalysisDispatcher::new(EngineConfig::default());

    let request = AnalysisRequest {
        payload: MediaPayload::new(vec![1, 2, 3], "image/jpeg"),
        kind: MediaKind::Image,
        purpose: AnalysisPurpose::Translate,
        species: Species::Cat,
    };

    let err = dispatcher.dispatch(request).await.unwrap_err();
    assert_eq!(err, PipelineError::UnsupportedFormat);
}

#[tokio::test]
async fn malformed_mime_hint_is_classified_not_propagated() {
    let dispatcher = HttpAnalysisDispatcher::new(EngineConfig::default());

    let payload = MediaPayload::new(vec![1, 2, 3], "不是mime");
    let request = AnalysisRequest::classify_audio(payload, Species::Cat);

    let err = dispatcher.dispatch(request).await.unwrap_err();
    assert_eq!(err, PipelineError::UnsupportedFormat);
}

#[tokio::test]
#[ignore] // 需要运行中的分类服务
async fn classify_against_live_backend() {
    let dispatcher = HttpAnalysisDispatcher::new(EngineConfig::default());
    let payload = MediaPayload::new(vec![0u8; 64], "audio/wav");
    let request = AnalysisRequest::classify_audio(payload, Species::Cat);

    // 服务没起时测试会失败；有服务时只要求返回已分类的结果或错误
    let _ = dispatcher.dispatch(request).await;
}
