use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::taxonomy::{CanonicalEmotion, Species};

/// 采集或上传得到的媒体负载
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPayload {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl MediaPayload {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 媒体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Audio,
    Image,
}

/// 分析目的
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisPurpose {
    /// 识别情绪 / 意图
    Classify,
    /// 跨物种翻译
    Translate,
}

/// 一次分析请求
///
/// 构造后不再修改，每个请求恰好被 dispatch 消费一次；重试是由调用方
/// 重新构造等价请求，而不是复用同一个请求对象。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub payload: MediaPayload,
    pub kind: MediaKind,
    pub purpose: AnalysisPurpose,
    /// 被分析的物种（决定视觉提示词和描述文案里的称呼）
    pub species: Species,
}

impl AnalysisRequest {
    pub fn classify_audio(payload: MediaPayload, species: Species) -> Self {
        Self {
            payload,
            kind: MediaKind::Audio,
            purpose: AnalysisPurpose::Classify,
            species,
        }
    }

    pub fn translate_audio(payload: MediaPayload, species: Species) -> Self {
        Self {
            payload,
            kind: MediaKind::Audio,
            purpose: AnalysisPurpose::Translate,
            species,
        }
    }

    pub fn classify_image(payload: MediaPayload, species: Species) -> Self {
        Self {
            payload,
            kind: MediaKind::Image,
            purpose: AnalysisPurpose::Classify,
            species,
        }
    }
}

/// 归一化后的分析结果
///
/// 所有后端的输出都收敛到这个形状：规范情绪标签、0-100 的整数置信度、
/// 始终非空的描述文案，以及可选的逐标签得分和建议列表。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub emotion: CanonicalEmotion,
    /// 置信度百分比，恒在 [0, 100]
    pub confidence: u8,
    pub description: String,
    /// 逐标签得分（后端给出时才有内容）
    #[serde(default)]
    pub all_emotions: HashMap<CanonicalEmotion, f32>,
    /// 专业建议（视觉后端给出，音频后端为空）
    #[serde(default)]
    pub tips: Vec<String>,
}

impl AnalysisResult {
    /// 后端报错或置信度缺失时的降级结果
    pub fn failed(description: impl Into<String>) -> Self {
        Self {
            emotion: CanonicalEmotion::AnalysisFailed,
            confidence: 0,
            description: description.into(),
            all_emotions: HashMap::new(),
            tips: Vec::new(),
        }
    }
}

/// 翻译结果的源侧
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSource {
    pub species: Species,
    pub intent: CanonicalEmotion,
    pub confidence: u8,
    pub description: String,
}

/// 翻译结果的目标侧
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationTarget {
    pub species: Species,
    pub intent: CanonicalEmotion,
    pub description: String,
}

/// 跨物种翻译结果
///
/// 不变式：`source.species != target.species`。源情绪是哨兵值时
/// `can_translate` 为 false，目标侧为未知；这是定义好的退化输出，
/// 不是错误。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub source: TranslationSource,
    pub target: TranslationTarget,
    /// 目标物种的示例音频文件名
    pub audio_reference: Option<String>,
    pub can_translate: bool,
}
