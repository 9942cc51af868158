//! 管线装配
//!
//! 把采集、调度、归一化、翻译和周边设施（配置、事件总线、遥测）组装
//! 成一个对外的管线对象。调用方只看到归一化后的结果和分类错误。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tokio::sync::RwLock;

use crate::config_manager::ConfigManager;
use crate::dispatcher::{AnalysisDispatcher, RawBackendResponse};
use crate::error::PipelineResult;
use crate::event_bus::{
    EventBus, PipelineEvent, TOPIC_ANALYSIS_COMPLETED, TOPIC_ANALYSIS_FAILED,
    TOPIC_ANALYSIS_STARTED, TOPIC_RECORDING_STATE,
};
use crate::media_capture::{CaptureState, MediaCapture, MicrophoneSource};
use crate::normalizer::normalize;
use crate::taxonomy::Species;
use crate::telemetry::{TelemetryDatum, TelemetrySink};
use crate::translation::TranslationEngine;
use crate::types::{AnalysisRequest, AnalysisResult, MediaPayload, TranslationResult};

/// 端到端管线
///
/// 调度器和归一化层无状态、可重入；结果槽采用 last-result-wins：
/// 每次请求领取递增的票号，只有票号仍是最新时完成的结果才会落槽，
/// 过期请求的结果被直接丢弃（以新代旧，不做真正的取消）。
pub struct PetVoicePipeline {
    capture: MediaCapture,
    dispatcher: Arc<dyn AnalysisDispatcher>,
    config: Arc<dyn ConfigManager>,
    event_bus: Arc<dyn EventBus>,
    telemetry: Arc<dyn TelemetrySink>,
    translation: TranslationEngine,
    issued: AtomicU64,
    latest: RwLock<Option<(u64, AnalysisResult)>>,
    last_request: RwLock<Option<AnalysisRequest>>,
}

impl std::fmt::Debug for PetVoicePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetVoicePipeline").finish_non_exhaustive()
    }
}

pub struct PetVoicePipelineBuilder {
    microphone: Option<Arc<dyn MicrophoneSource>>,
    dispatcher: Option<Arc<dyn AnalysisDispatcher>>,
    config: Option<Arc<dyn ConfigManager>>,
    event_bus: Option<Arc<dyn EventBus>>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl PetVoicePipelineBuilder {
    pub fn new() -> Self {
        Self {
            microphone: None,
            dispatcher: None,
            config: None,
            event_bus: None,
            telemetry: None,
        }
    }

    pub fn microphone(mut self, microphone: Arc<dyn MicrophoneSource>) -> Self {
        self.microphone = Some(microphone);
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn AnalysisDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn config(mut self, config: Arc<dyn ConfigManager>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn event_bus(mut self, event_bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn build(self) -> anyhow::Result<PetVoicePipeline> {
        let microphone = self
            .microphone
            .ok_or_else(|| anyhow::anyhow!("microphone is missing"))?;
        Ok(PetVoicePipeline {
            capture: MediaCapture::new(microphone),
            dispatcher: self
                .dispatcher
                .ok_or_else(|| anyhow::anyhow!("dispatcher is missing"))?,
            config: self
                .config
                .ok_or_else(|| anyhow::anyhow!("config is missing"))?,
            event_bus: self
                .event_bus
                .ok_or_else(|| anyhow::anyhow!("event_bus is missing"))?,
            telemetry: self
                .telemetry
                .ok_or_else(|| anyhow::anyhow!("telemetry is missing"))?,
            translation: TranslationEngine::new(),
            issued: AtomicU64::new(0),
            latest: RwLock::new(None),
            last_request: RwLock::new(None),
        })
    }
}

impl Default for PetVoicePipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PetVoicePipeline {
    pub fn builder() -> PetVoicePipelineBuilder {
        PetVoicePipelineBuilder::new()
    }

    pub async fn boot(&self) -> PipelineResult<()> {
        self.event_bus.start().await?;
        let config = self.config.load().await?;
        eprintln!(
            "[PIPELINE] 🚀 启动: predict={} translate={}",
            config.predict_base_url, config.translate_base_url
        );
        self.record("pipeline.boot", 1.0, "count").await;
        Ok(())
    }

    pub async fn shutdown(&self) -> PipelineResult<()> {
        self.event_bus.stop().await?;
        self.record("pipeline.shutdown", 1.0, "count").await;
        Ok(())
    }

    /// 当前录音状态
    pub async fn capture_state(&self) -> CaptureState {
        self.capture.state().await
    }

    /// 最近一次落槽的结果（过期请求的结果不会出现在这里）
    pub async fn last_result(&self) -> Option<AnalysisResult> {
        self.latest.read().await.as_ref().map(|(_, r)| r.clone())
    }

    /// 开始录音；重复开始是空操作
    pub async fn start_recording(&self) -> PipelineResult<bool> {
        match self.capture.request_start().await {
            Ok(started) => {
                if started {
                    self.publish(TOPIC_RECORDING_STATE, json!({"state": "recording"}))
                        .await;
                }
                Ok(started)
            }
            Err(err) => {
                self.publish(
                    TOPIC_RECORDING_STATE,
                    json!({"state": "error", "message": err.message()}),
                )
                .await;
                Err(err)
            }
        }
    }

    /// 停止录音并把整段录音送去分类
    ///
    /// 每次停止恰好产出一次上传；Idle 时停止返回 None 且不触发任何
    /// 网络调用。
    pub async fn finish_recording_and_classify(
        &self,
        species: Species,
    ) -> PipelineResult<Option<AnalysisResult>> {
        match self.capture.request_stop().await? {
            Some(payload) => {
                self.publish(TOPIC_RECORDING_STATE, json!({"state": "idle"}))
                    .await;
                let result = self
                    .run_analysis(AnalysisRequest::classify_audio(payload, species))
                    .await?;
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// 停止录音并把整段录音送去跨物种翻译
    pub async fn finish_recording_and_translate(
        &self,
        species: Species,
    ) -> PipelineResult<Option<TranslationResult>> {
        match self.capture.request_stop().await? {
            Some(payload) => {
                self.publish(TOPIC_RECORDING_STATE, json!({"state": "idle"}))
                    .await;
                let result = self
                    .run_translation(AnalysisRequest::translate_audio(payload, species))
                    .await?;
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// 上传音频文件并分类
    pub async fn classify_audio_file(
        &self,
        data: Vec<u8>,
        mime_hint: &str,
        species: Species,
    ) -> PipelineResult<AnalysisResult> {
        let payload = MediaPayload::new(data, mime_hint);
        self.run_analysis(AnalysisRequest::classify_audio(payload, species))
            .await
    }

    /// 上传音频文件并跨物种翻译
    pub async fn translate_audio_file(
        &self,
        data: Vec<u8>,
        mime_hint: &str,
        species: Species,
    ) -> PipelineResult<TranslationResult> {
        let payload = MediaPayload::new(data, mime_hint);
        self.run_translation(AnalysisRequest::translate_audio(payload, species))
            .await
    }

    /// 上传图片并识别情绪
    ///
    /// 视觉路径不向调用方抛分类错误：失败降级为"分析失败"结果，
    /// 描述里带上可展示的原因。
    pub async fn classify_image_file(
        &self,
        data: Vec<u8>,
        mime_hint: &str,
        species: Species,
    ) -> AnalysisResult {
        let payload = MediaPayload::new(data, mime_hint);
        match self
            .run_analysis(AnalysisRequest::classify_image(payload, species))
            .await
        {
            Ok(result) => result,
            Err(err) => AnalysisResult {
                emotion: crate::taxonomy::CanonicalEmotion::AnalysisFailed,
                confidence: 0,
                description: format!(
                    "图片分析失败: {}。请检查网络连接或稍后重试。",
                    err.message()
                ),
                all_emotions: HashMap::new(),
                tips: vec![
                    "请检查网络连接是否正常".to_string(),
                    format!("确保上传的是清晰的{}图片", species.display_name()),
                    "如问题持续，请联系技术支持".to_string(),
                ],
            },
        }
    }

    /// 重试：把上一次提交的请求重新调度一遍
    ///
    /// 没有历史请求时返回 None。重试领取新的票号，旧请求的结果随之
    /// 过期（last-result-wins）。
    pub async fn retry_last(&self) -> PipelineResult<Option<AnalysisResult>> {
        let request = self.last_request.read().await.clone();
        match request {
            Some(request) => self.run_analysis(request).await.map(Some),
            None => Ok(None),
        }
    }

    async fn run_analysis(&self, request: AnalysisRequest) -> PipelineResult<AnalysisResult> {
        let species = request.species;
        let (ticket, raw) = self.dispatch_traced(request).await?;
        let result = normalize(&raw, species);
        self.store_if_current(ticket, &result).await;
        self.publish(
            TOPIC_ANALYSIS_COMPLETED,
            json!({
                "ticket": ticket,
                "emotion": result.emotion.as_str(),
                "confidence": result.confidence,
            }),
        )
        .await;
        Ok(result)
    }

    async fn run_translation(&self, request: AnalysisRequest) -> PipelineResult<TranslationResult> {
        let species = request.species;
        let (ticket, raw) = self.dispatch_traced(request).await?;

        let result = match &raw {
            RawBackendResponse::Translate(resp) => self.translation.from_backend(resp),
            // 后端没给翻译侧字段时退回本地映射
            other => {
                let source = normalize(other, species);
                self.translation
                    .translate(&source, species, species.counterpart())
            }
        };

        // 结果槽统一存归一化的分析结果，翻译结果的源侧就是这一形状
        let source_view = AnalysisResult {
            emotion: result.source.intent,
            confidence: result.source.confidence,
            description: result.source.description.clone(),
            all_emotions: HashMap::new(),
            tips: Vec::new(),
        };
        self.store_if_current(ticket, &source_view).await;

        self.publish(
            TOPIC_ANALYSIS_COMPLETED,
            json!({
                "ticket": ticket,
                "emotion": result.source.intent.as_str(),
                "target_emotion": result.target.intent.as_str(),
                "can_translate": result.can_translate,
            }),
        )
        .await;
        Ok(result)
    }

    /// 领票、发 started 事件、调度、记录耗时
    ///
    /// 失败路径在这里发出 failed 事件，成功路径由调用方在归一化后发
    /// completed。两者恰好与 started 成对，加载指示在任何退出路径上
    /// 都会被熄灭。
    async fn dispatch_traced(
        &self,
        request: AnalysisRequest,
    ) -> PipelineResult<(u64, RawBackendResponse)> {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_request.write().await = Some(request.clone());

        self.publish(
            TOPIC_ANALYSIS_STARTED,
            json!({"ticket": ticket, "species": request.species.wire_name()}),
        )
        .await;

        let started_at = Instant::now();
        let outcome = self.dispatcher.dispatch(request).await;
        let elapsed_ms = started_at.elapsed().as_millis() as f64;
        self.record("pipeline.dispatch_ms", elapsed_ms, "ms").await;

        match outcome {
            Ok(raw) => Ok((ticket, raw)),
            Err(err) => {
                self.record("pipeline.dispatch_errors", 1.0, "count").await;
                self.publish(
                    TOPIC_ANALYSIS_FAILED,
                    json!({"ticket": ticket, "message": err.message()}),
                )
                .await;
                Err(err)
            }
        }
    }

    /// last-result-wins：只有票号仍是最新时结果才落槽
    async fn store_if_current(&self, ticket: u64, result: &AnalysisResult) -> bool {
        let mut latest = self.latest.write().await;
        if self.issued.load(Ordering::SeqCst) != ticket {
            return false;
        }
        *latest = Some((ticket, result.clone()));
        true
    }

    async fn publish(&self, topic: &str, payload: serde_json::Value) {
        if let Err(e) = self
            .event_bus
            .publish(PipelineEvent::new(topic, payload))
            .await
        {
            eprintln!("[PIPELINE] ⚠️ 事件发布失败: {}", e);
        }
    }

    async fn record(&self, name: &str, value: f64, unit: &str) {
        let datum = TelemetryDatum {
            name: name.to_string(),
            value,
            unit: unit.to_string(),
        };
        if let Err(e) = self.telemetry.record(datum).await {
            eprintln!("[PIPELINE] ⚠️ 遥测写入失败: {}", e);
        }
    }
}
