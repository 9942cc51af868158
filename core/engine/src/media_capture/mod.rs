mod recorder;
mod stub;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;

pub use recorder::MediaCapture;
pub use stub::StubMicrophone;

/// 录音会话状态机
///
/// 同一采集面上最多只有一个会话处于 Recording；Finalizing 是
/// `request_stop` 期间的瞬态，缓冲排空后回到 Idle。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureState {
    Idle,
    Recording,
    Finalizing,
}

/// 麦克风来源
///
/// 平台拒绝授权时 `acquire` 返回 `PermissionDenied`，此时不会有任何
/// 设备句柄泄漏。
#[async_trait]
pub trait MicrophoneSource: Send + Sync {
    async fn acquire(&self) -> PipelineResult<Box<dyn MicrophoneStream>>;
}

/// 一条独占的麦克风流
///
/// 实现约定：
/// - `next_chunk` 必须是取消安全的（内部用通道接收，轮询中途被丢弃
///   不会吞掉数据块）；
/// - `stop_tracks` 之后 `next_chunk` 先吐完已缓冲的块，然后返回 None；
/// - `stop_tracks` 可重复调用。
#[async_trait]
pub trait MicrophoneStream: Send {
    /// 下一段音频数据；流结束返回 None
    async fn next_chunk(&mut self) -> Option<Vec<u8>>;

    /// 录音器的原生媒体类型（如 "audio/webm"）
    fn mime_type(&self) -> &str;

    /// 停止所有音轨并释放设备
    fn stop_tracks(&mut self);
}
