// core/engine/src/dispatcher/types.rs
// 三个后端的线缆类型

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 音频分类服务响应（POST /predict）
///
/// 历史上有两种成功形状：带 success 标志的完整输出，以及只有
/// label/confidence 的标准化输出，字段全部按可缺失处理。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub animal: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    /// 0-1 的小数置信度
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub all_emotions: Option<HashMap<String, f32>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// 跨物种翻译服务响应（POST /translate）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslateResponse {
    #[serde(default)]
    pub success: bool,
    /// "cat" | "dog"
    #[serde(default)]
    pub original_animal: Option<String>,
    /// 英文情绪标签
    #[serde(default)]
    pub original_emotion: Option<String>,
    /// 情绪的中文名
    #[serde(default)]
    pub original_emotion_name: Option<String>,
    /// 0-1 的小数置信度
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub target_animal: Option<String>,
    /// 目标物种中文名（"猫" / "狗"）
    #[serde(default)]
    pub target_animal_name: Option<String>,
    /// 目标物种示例音频文件名
    #[serde(default)]
    pub audio_filename: Option<String>,
    #[serde(default)]
    pub audio_path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub translation: Option<serde_json::Value>,
    #[serde(default)]
    pub raw_prediction: Option<serde_json::Value>,
    #[serde(default)]
    pub all_emotions: Option<HashMap<String, f32>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// 视觉后端 chat-completion 请求体
#[derive(Debug, Clone, Serialize)]
pub struct VisionChatRequest {
    pub model: String,
    pub messages: Vec<VisionMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisionMessage {
    pub role: String,
    pub content: Vec<VisionContentPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum VisionContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: VisionImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct VisionImageUrl {
    /// data URL（data:image/jpeg;base64,...）
    pub url: String,
}

/// 视觉后端 chat-completion 响应
#[derive(Debug, Clone, Deserialize)]
pub struct VisionChatResponse {
    #[serde(default)]
    pub choices: Vec<VisionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionChoice {
    pub message: VisionChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionChoiceMessage {
    #[serde(default)]
    pub content: String,
}

/// 后端原始响应的带标签联合
///
/// 只在 dispatcher 和归一化层之间流转，管线对外只暴露归一化后的
/// `AnalysisResult` / `TranslationResult`。
#[derive(Debug, Clone)]
pub enum RawBackendResponse {
    Predict(PredictResponse),
    Vision { content: String },
    Translate(TranslateResponse),
}
