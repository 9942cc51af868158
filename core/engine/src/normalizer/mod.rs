//! 结果归一化层
//!
//! 把三个后端各自的词汇（英文 ML 标签、视觉模型自由文本、中文规范
//! 标签）收敛到统一的 `AnalysisResult`。纯函数：相同输入必然得到相同
//! 输出，失败一律降级为哨兵标签而不是报错。

mod json_extract;

use std::collections::HashMap;

use crate::dispatcher::{PredictResponse, RawBackendResponse, TranslateResponse};
use crate::taxonomy::{CanonicalEmotion, Species};
use crate::types::AnalysisResult;

pub use json_extract::{extract_embedded_json, VisionInsight};

/// 小数置信度转整数百分比，四舍五入并夹在 [0, 100]
pub fn fraction_to_percent(fraction: f32) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

/// 任意来源的标签归一化：先按中文规范集匹配，再按英文 ML 标签匹配
pub fn canonicalize_label(label: &str) -> CanonicalEmotion {
    let by_chinese = CanonicalEmotion::from_chinese(label);
    if by_chinese != CanonicalEmotion::Unknown {
        return by_chinese;
    }
    CanonicalEmotion::from_english(label)
}

/// 按物种和情绪合成标准描述
pub fn synthesize_description(species: Species, emotion: CanonicalEmotion, confidence: u8) -> String {
    format!(
        "检测到{}的{}情绪 (置信度: {}%)",
        species.display_name(),
        emotion.as_str(),
        confidence
    )
}

/// 带标签联合到统一结果的总映射
pub fn normalize(raw: &RawBackendResponse, species: Species) -> AnalysisResult {
    match raw {
        RawBackendResponse::Predict(resp) => normalize_predict(resp, species),
        RawBackendResponse::Vision { content } => normalize_vision(content, species),
        RawBackendResponse::Translate(resp) => normalize_translate_source(resp, species),
    }
}

/// 音频分类响应的归一化
pub fn normalize_predict(resp: &PredictResponse, species: Species) -> AnalysisResult {
    if let Some(error) = &resp.error {
        return AnalysisResult::failed(format!("分析失败: {}", error));
    }
    let confidence = match resp.confidence {
        Some(fraction) => fraction_to_percent(fraction),
        // 置信度缺失按后端出错处理
        None => return AnalysisResult::failed("分析失败: 后端未返回置信度"),
    };

    let raw_label = resp
        .emotion
        .as_deref()
        .or(resp.label.as_deref())
        .unwrap_or("未知");
    let emotion = canonicalize_label(raw_label);

    AnalysisResult {
        emotion,
        confidence,
        description: synthesize_description(species, emotion, confidence),
        all_emotions: canonicalize_scores(resp.all_emotions.as_ref()),
        tips: Vec::new(),
    }
}

/// 视觉后端自由文本的归一化
///
/// 嵌入 JSON 提取失败不是错误：整段文本降级为描述，置信度取默认值，
/// 建议取默认列表。封闭集合外的标签收敛到未知，但原始说法保留在描述
/// 里，不强行塞进规范集。
pub fn normalize_vision(content: &str, species: Species) -> AnalysisResult {
    match extract_embedded_json(content) {
        Ok(insight) => {
            let emotion = CanonicalEmotion::from_chinese(&insight.emotion);
            let confidence = insight.confidence.round().clamp(0.0, 100.0) as u8;

            let mut description = if insight.description.is_empty() {
                content.to_string()
            } else {
                insight.description
            };
            if emotion == CanonicalEmotion::Unknown && !insight.emotion.is_empty() {
                description = format!("{}（模型标签：{}）", description, insight.emotion);
            }

            let tips = if insight.tips.is_empty() {
                default_vision_tips(species)
            } else {
                insight.tips
            };

            AnalysisResult {
                emotion,
                confidence,
                description,
                all_emotions: HashMap::new(),
                tips,
            }
        }
        Err(text) => AnalysisResult {
            emotion: CanonicalEmotion::Unknown,
            confidence: 85,
            description: text.to_string(),
            all_emotions: HashMap::new(),
            tips: fallback_vision_tips(species),
        },
    }
}

/// 翻译响应源侧的归一化（目标侧由 TranslationEngine 处理）
pub fn normalize_translate_source(resp: &TranslateResponse, species: Species) -> AnalysisResult {
    let species = resp
        .original_animal
        .as_deref()
        .and_then(Species::from_wire)
        .unwrap_or(species);

    let confidence = match resp.confidence {
        Some(fraction) => fraction_to_percent(fraction),
        None => return AnalysisResult::failed("分析失败: 后端未返回置信度"),
    };

    let emotion = resp
        .original_emotion
        .as_deref()
        .map(canonicalize_label)
        .unwrap_or(CanonicalEmotion::Unknown);

    AnalysisResult {
        emotion,
        confidence,
        description: synthesize_description(species, emotion, confidence),
        all_emotions: canonicalize_scores(resp.all_emotions.as_ref()),
        tips: Vec::new(),
    }
}

/// 逐标签得分表的键归一化；无法归类的键丢弃，重复键取较大值
fn canonicalize_scores(raw: Option<&HashMap<String, f32>>) -> HashMap<CanonicalEmotion, f32> {
    let mut scores = HashMap::new();
    if let Some(raw) = raw {
        for (label, score) in raw {
            let emotion = canonicalize_label(label);
            if emotion.is_sentinel() {
                continue;
            }
            let slot = scores.entry(emotion).or_insert(*score);
            if *score > *slot {
                *slot = *score;
            }
        }
    }
    scores
}

fn default_vision_tips(species: Species) -> Vec<String> {
    vec![
        format!("继续观察{}的行为变化", species.display_name()),
        "保持良好的生活环境".to_string(),
        "如有异常及时咨询兽医".to_string(),
    ]
}

fn fallback_vision_tips(species: Species) -> Vec<String> {
    vec![
        format!("根据AI分析结果关注{}状态", species.display_name()),
        "保持良好的生活环境".to_string(),
        "如有异常及时咨询兽医".to_string(),
    ]
}
