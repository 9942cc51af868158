mod client;
mod types;

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::types::AnalysisRequest;

pub use client::{classify_status, vision_prompt, HttpAnalysisDispatcher};
pub use types::{
    PredictResponse, RawBackendResponse, TranslateResponse, VisionChatRequest, VisionChatResponse,
    VisionChoice, VisionChoiceMessage, VisionContentPart, VisionImageUrl, VisionMessage,
};

/// 分析调度器
///
/// 根据请求的媒体类型和目的选择后端，发起请求，并把异构的响应形状与
/// HTTP 失败码统一解释成带标签的原始响应或分类错误。不自动重试；重试
/// 是调用方重新提交等价请求。
#[async_trait]
pub trait AnalysisDispatcher: Send + Sync {
    async fn dispatch(&self, request: AnalysisRequest) -> PipelineResult<RawBackendResponse>;
}
