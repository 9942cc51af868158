//! 录音状态机
//!
//! 把开始/停止手势变成一段完整的媒体负载。麦克风句柄由采集器独占，
//! 无论从哪条路径退出（正常停止、零数据块、采集任务出错），音轨都在
//! 同一个收集任务里被停掉，不存在游离的设备句柄。

use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::error::{PipelineError, PipelineResult};
use crate::taxonomy::Species;
use crate::types::{AnalysisPurpose, AnalysisRequest, MediaKind, MediaPayload};

use super::{CaptureState, MicrophoneSource, MicrophoneStream};

struct ActiveSession {
    mime_type: String,
    stop_tx: oneshot::Sender<()>,
    collector: JoinHandle<Vec<Vec<u8>>>,
}

struct CaptureInner {
    state: CaptureState,
    session: Option<ActiveSession>,
}

/// 媒体采集器
pub struct MediaCapture {
    source: Arc<dyn MicrophoneSource>,
    inner: Mutex<CaptureInner>,
}

impl MediaCapture {
    pub fn new(source: Arc<dyn MicrophoneSource>) -> Self {
        Self {
            source,
            inner: Mutex::new(CaptureInner {
                state: CaptureState::Idle,
                session: None,
            }),
        }
    }

    /// 当前状态
    pub async fn state(&self) -> CaptureState {
        self.inner.lock().await.state
    }

    /// 开始录音
    ///
    /// Idle -> Recording。已经在录音时是空操作（返回 false），绝不会
    /// 产生第二个并发会话。授权被拒时返回 `PermissionDenied`，状态保持
    /// Idle。
    pub async fn request_start(&self) -> PipelineResult<bool> {
        let mut inner = self.inner.lock().await;
        if inner.state != CaptureState::Idle {
            eprintln!("[CAPTURE] ⚠️ 已在录音中，忽略重复的开始请求");
            return Ok(false);
        }

        let stream = self.source.acquire().await?;
        let mime_type = stream.mime_type().to_string();

        let (stop_tx, stop_rx) = oneshot::channel();
        let collector = tokio::spawn(collect_chunks(stream, stop_rx));

        inner.session = Some(ActiveSession {
            mime_type,
            stop_tx,
            collector,
        });
        inner.state = CaptureState::Recording;
        eprintln!("[CAPTURE] 🎙️ 录音开始");
        Ok(true)
    }

    /// 停止录音并取回完整负载
    ///
    /// Recording -> Finalizing -> Idle。负载只在收集任务把缓冲里的
    /// 数据块全部追加完之后才组装，每次停止恰好产出一次完成信号。
    /// Idle 时停止是空操作，返回 None。
    pub async fn request_stop(&self) -> PipelineResult<Option<MediaPayload>> {
        let session = {
            let mut inner = self.inner.lock().await;
            match inner.session.take() {
                Some(session) => {
                    inner.state = CaptureState::Finalizing;
                    session
                }
                None => return Ok(None),
            }
        };

        // 收集任务收到信号后先停音轨、再排空缓冲，最后返回全部数据块
        let _ = session.stop_tx.send(());
        let joined = session.collector.await;

        {
            let mut inner = self.inner.lock().await;
            inner.state = CaptureState::Idle;
        }

        let chunks = joined.map_err(|e| PipelineError::TransportError {
            details: format!("录音收集任务异常结束: {}", e),
        })?;

        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in &chunks {
            data.extend_from_slice(chunk);
        }
        eprintln!(
            "[CAPTURE] ⏹️ 录音结束: {} 块 / {} 字节 ({})",
            chunks.len(),
            total,
            session.mime_type
        );
        Ok(Some(MediaPayload::new(data, session.mime_type)))
    }

    /// 直接接收一个现成文件，完全绕过录音会话
    pub fn accept_file(
        data: Vec<u8>,
        mime_hint: &str,
        kind: MediaKind,
        purpose: AnalysisPurpose,
        species: Species,
    ) -> AnalysisRequest {
        AnalysisRequest {
            payload: MediaPayload::new(data, mime_hint),
            kind,
            purpose,
            species,
        }
    }
}

/// 收集任务：按到达顺序缓冲数据块
///
/// 音轨的停止点只有这里一处：停止信号、流自然结束，两条路径都会
/// 经过 `stop_tracks`。
async fn collect_chunks(
    mut stream: Box<dyn MicrophoneStream>,
    mut stop_rx: oneshot::Receiver<()>,
) -> Vec<Vec<u8>> {
    let mut chunks: Vec<Vec<u8>> = Vec::new();
    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                stream.stop_tracks();
                // 排空已缓冲的块，保证负载不会从半空的缓冲组装
                while let Some(chunk) = stream.next_chunk().await {
                    if !chunk.is_empty() {
                        chunks.push(chunk);
                    }
                }
                break;
            }
            chunk = stream.next_chunk() => {
                match chunk {
                    Some(chunk) if !chunk.is_empty() => chunks.push(chunk),
                    Some(_) => {}
                    None => {
                        stream.stop_tracks();
                        break;
                    }
                }
            }
        }
    }
    chunks
}
