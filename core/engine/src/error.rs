use std::fmt::{Display, Formatter};

/// 管线错误分类
///
/// 每个变体都对应一种用户可见的失败情况，`Display` 输出可直接展示的中文
/// 提示（不携带堆栈信息）。上游 HTTP 状态码由 dispatcher 分类到这里，
/// 采集设备错误由 media_capture 分类到这里。
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// 采集设备不可用（麦克风未授权）
    PermissionDenied,
    /// 文件格式不支持或参数错误（HTTP 422）
    UnsupportedFormat,
    /// 文件超过上传上限（HTTP 413，上限 20MB）
    PayloadTooLarge,
    /// AI 模型未就绪（HTTP 503）
    ServiceNotReady,
    /// 服务器内部错误（其他 5xx）
    UpstreamServerError { status: u16 },
    /// 网络失败或超时
    TransportError { details: String },
    /// 响应体形状无法识别（2xx 但 success/label 缺失）
    ParseFailure { details: String },
}

impl PipelineError {
    /// 用户可见的提示文案，与前端展示保持一致
    pub fn message(&self) -> String {
        match self {
            PipelineError::PermissionDenied => {
                "无法访问麦克风，请确保已授权麦克风权限".to_string()
            }
            PipelineError::UnsupportedFormat => {
                "文件格式不支持或参数错误，请检查音频文件格式（支持.m4a, .wav, .mp3）".to_string()
            }
            PipelineError::PayloadTooLarge => {
                "文件过大，请确保音频文件小于20MB".to_string()
            }
            PipelineError::ServiceNotReady => "AI模型未就绪，请稍后重试".to_string(),
            PipelineError::UpstreamServerError { status } => {
                format!("服务器内部错误，请稍后重试 (HTTP {})", status)
            }
            PipelineError::TransportError { details } => {
                format!("网络请求失败，请检查网络连接: {}", details)
            }
            PipelineError::ParseFailure { details } => {
                format!("无法解析分析结果: {}", details)
            }
        }
    }
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PipelineError {}

pub type PipelineResult<T> = Result<T, PipelineError>;
