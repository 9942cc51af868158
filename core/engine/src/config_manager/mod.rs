use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::PipelineResult;

/// 上传大小上限（与后端 20MB 限制一致）
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// 视觉后端配置
///
/// 凭证属于外部配置，由宿主注入；管线本身不持有任何密钥。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// chat-completion 风格接口的完整地址
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.siliconflow.cn/v1/chat/completions".to_string(),
            model: "Pro/THUDM/GLM-4.1V-9B-Thinking".to_string(),
            api_key: None,
            max_tokens: 800,
            temperature: 0.3,
        }
    }
}

/// 管线配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 音频分类服务的基础 URL
    pub predict_base_url: String,
    /// 跨物种翻译服务的基础 URL
    pub translate_base_url: String,
    pub vision: VisionConfig,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            predict_base_url: "http://localhost:8000".to_string(),
            translate_base_url: "http://117.50.34.14:8000".to_string(),
            vision: VisionConfig::default(),
            timeout_secs: 30,
        }
    }
}

impl EngineConfig {
    /// 翻译服务上示例音频的下载地址
    pub fn audio_url(&self, filename: &str) -> String {
        format!("{}/audio/{}", self.translate_base_url, filename)
    }
}

#[async_trait]
pub trait ConfigManager: Send + Sync {
    async fn load(&self) -> PipelineResult<EngineConfig>;
    async fn current(&self) -> PipelineResult<EngineConfig>;
}

/// 静态配置管理器
///
/// 配置在构造时给定，`load` 与 `current` 返回同一份内容。
pub struct StaticConfigManager {
    config: RwLock<EngineConfig>,
}

impl StaticConfigManager {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

impl Default for StaticConfigManager {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[async_trait]
impl ConfigManager for StaticConfigManager {
    async fn load(&self) -> PipelineResult<EngineConfig> {
        Ok(self.config.read().await.clone())
    }

    async fn current(&self) -> PipelineResult<EngineConfig> {
        Ok(self.config.read().await.clone())
    }
}
