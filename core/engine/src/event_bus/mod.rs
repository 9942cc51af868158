mod channel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::PipelineResult;

pub use channel::ChannelEventBus;

/// 一次分析开始（加载指示应当点亮）
pub const TOPIC_ANALYSIS_STARTED: &str = "analysis.started";
/// 一次分析成功结束（加载指示应当熄灭）
pub const TOPIC_ANALYSIS_COMPLETED: &str = "analysis.completed";
/// 一次分析以分类错误结束（加载指示同样熄灭）
pub const TOPIC_ANALYSIS_FAILED: &str = "analysis.failed";
/// 录音会话状态变化
pub const TOPIC_RECORDING_STATE: &str = "recording.state";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EventTopic(pub String);

/// 管线事件
///
/// 每次 dispatch 的 started 事件与 completed / failed 事件恰好成对，
/// 无论请求从哪条路径退出；表示层据此维护加载指示。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub topic: EventTopic,
    pub payload: serde_json::Value,
    pub timestamp_ms: u64,
}

impl PipelineEvent {
    pub fn new(topic: &str, payload: serde_json::Value) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            topic: EventTopic(topic.to_string()),
            payload,
            timestamp_ms,
        }
    }
}

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn start(&self) -> PipelineResult<()>;
    async fn stop(&self) -> PipelineResult<()>;
    async fn publish(&self, event: PipelineEvent) -> PipelineResult<()>;
}
