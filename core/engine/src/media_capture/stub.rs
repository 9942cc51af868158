use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PipelineError, PipelineResult};

use super::{MicrophoneSource, MicrophoneStream};

/// 麦克风 stub 实现（用于测试和开发）
///
/// 按脚本吐出预设的数据块；`released_flag` 暴露音轨是否已停止，
/// 供测试断言设备释放。
pub struct StubMicrophone {
    chunks: Vec<Vec<u8>>,
    mime_type: String,
    deny_permission: bool,
    released: Arc<AtomicBool>,
}

impl StubMicrophone {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks,
            mime_type: "audio/webm".to_string(),
            deny_permission: false,
            released: Arc::new(AtomicBool::new(true)),
        }
    }

    /// 模拟平台拒绝麦克风授权
    pub fn denying_permission() -> Self {
        Self {
            chunks: Vec::new(),
            mime_type: "audio/webm".to_string(),
            deny_permission: true,
            released: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// true 表示当前没有活动音轨
    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

#[async_trait]
impl MicrophoneSource for StubMicrophone {
    async fn acquire(&self) -> PipelineResult<Box<dyn MicrophoneStream>> {
        if self.deny_permission {
            return Err(PipelineError::PermissionDenied);
        }
        self.released.store(false, Ordering::SeqCst);
        Ok(Box::new(StubStream {
            pending: self.chunks.clone().into(),
            mime_type: self.mime_type.clone(),
            stopped: false,
            released: Arc::clone(&self.released),
        }))
    }
}

struct StubStream {
    pending: VecDeque<Vec<u8>>,
    mime_type: String,
    stopped: bool,
    released: Arc<AtomicBool>,
}

#[async_trait]
impl MicrophoneStream for StubStream {
    async fn next_chunk(&mut self) -> Option<Vec<u8>> {
        loop {
            if let Some(chunk) = self.pending.pop_front() {
                return Some(chunk);
            }
            if self.stopped {
                return None;
            }
            // 脚本吐完但还没停止：模拟设备在等待新的音频数据
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn stop_tracks(&mut self) {
        self.stopped = true;
        self.released.store(true, Ordering::SeqCst);
    }
}
