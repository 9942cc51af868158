//! 跨物种翻译
//!
//! 把一侧物种的规范情绪映射成另一侧物种的对应情绪和示例音频。翻译
//! 后端在场时它是权威，结果原样采用；只有源结果在手、没有翻译侧
//! 字段时才在本地按封闭词汇表推导。

use crate::dispatcher::TranslateResponse;
use crate::normalizer::{canonicalize_label, fraction_to_percent, synthesize_description};
use crate::taxonomy::{default_audio_emotions, resolve_similar, CanonicalEmotion, Species};
use crate::types::{AnalysisResult, TranslationResult, TranslationSource, TranslationTarget};

pub struct TranslationEngine;

impl TranslationEngine {
    pub fn new() -> Self {
        Self
    }

    /// 后端权威路径：直接采用翻译服务给出的各字段
    ///
    /// 源侧英文情绪归一成中文规范标签，小数置信度换算成百分比；目标
    /// 侧标签、描述和音频文件名原样透传。透传标签落在封闭集合之外时
    /// 退回本地映射，保证目标情绪永远在规范集内。
    pub fn from_backend(&self, resp: &TranslateResponse) -> TranslationResult {
        let source_species = resp
            .original_animal
            .as_deref()
            .and_then(Species::from_wire)
            .unwrap_or(Species::Cat);
        let target_species = match resp.target_animal_name.as_deref().and_then(Species::from_wire)
        {
            Some(species) if species != source_species => species,
            _ => source_species.counterpart(),
        };

        let source_intent = resp
            .original_emotion
            .as_deref()
            .map(canonicalize_label)
            .unwrap_or(CanonicalEmotion::Unknown);
        let confidence = fraction_to_percent(resp.confidence.unwrap_or(0.0));

        let source = TranslationSource {
            species: source_species,
            intent: source_intent,
            confidence,
            description: synthesize_description(source_species, source_intent, confidence),
        };

        if source_intent.is_sentinel() {
            return Self::undetermined(source, target_species);
        }

        let target_intent = match resp.original_emotion_name.as_deref() {
            Some(name) => {
                let passthrough = CanonicalEmotion::from_chinese(name);
                if passthrough.is_sentinel() {
                    source_intent.counterpart()
                } else {
                    passthrough
                }
            }
            None => source_intent.counterpart(),
        };

        let target_description = resp.description.clone().unwrap_or_else(|| {
            format!(
                "对应{}的{}叫声",
                target_species.display_name(),
                target_intent.as_str()
            )
        });

        let audio_reference = resp
            .audio_filename
            .clone()
            .or_else(|| target_intent.audio_reference(target_species));

        TranslationResult {
            source,
            target: TranslationTarget {
                species: target_species,
                intent: target_intent,
                description: target_description,
            },
            audio_reference,
            can_translate: true,
        }
    }

    /// 本地路径：只有源结果在手时按封闭词汇表推导对应情绪
    pub fn translate(
        &self,
        source_result: &AnalysisResult,
        source_species: Species,
        target_species: Species,
    ) -> TranslationResult {
        let source = TranslationSource {
            species: source_species,
            intent: source_result.emotion,
            confidence: source_result.confidence,
            description: source_result.description.clone(),
        };

        if source_result.emotion.is_sentinel() {
            return Self::undetermined(source, target_species);
        }

        let target_intent = source_result.emotion.counterpart();
        TranslationResult {
            source,
            target: TranslationTarget {
                species: target_species,
                intent: target_intent,
                description: format!(
                    "对应{}的{}叫声",
                    target_species.display_name(),
                    target_intent.as_str()
                ),
            },
            audio_reference: target_intent.audio_reference(target_species),
            can_translate: true,
        }
    }

    /// 自由文本标签的示例音频解析
    ///
    /// 先按规范集和相似词表归类，都查不到时退回默认音频顺序里第一个
    /// 可用的标签。
    pub fn resolve_audio_reference(&self, label: &str, species: Species) -> Option<String> {
        if let Some(emotion) = resolve_similar(label) {
            return emotion.audio_reference(species);
        }
        default_audio_emotions()
            .iter()
            .find_map(|emotion| emotion.audio_reference(species))
    }

    /// 退化输出：源情绪是哨兵值时无法确定对应叫声
    ///
    /// 这是定义好的结果而不是错误，目标侧固定为未知。
    fn undetermined(source: TranslationSource, target_species: Species) -> TranslationResult {
        let description = format!(
            "无法确定对应的{}叫声：源情绪为{}",
            target_species.display_name(),
            source.intent.as_str()
        );
        TranslationResult {
            source,
            target: TranslationTarget {
                species: target_species,
                intent: CanonicalEmotion::Unknown,
                description,
            },
            audio_reference: None,
            can_translate: false,
        }
    }
}

impl Default for TranslationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source_result(emotion: CanonicalEmotion, confidence: u8) -> AnalysisResult {
        AnalysisResult {
            emotion,
            confidence,
            description: synthesize_description(Species::Cat, emotion, confidence),
            all_emotions: HashMap::new(),
            tips: Vec::new(),
        }
    }

    #[test]
    fn backend_fields_are_authoritative() {
        let resp = TranslateResponse {
            success: true,
            original_animal: Some("cat".to_string()),
            original_emotion: Some("hungry".to_string()),
            original_emotion_name: Some("饿了".to_string()),
            confidence: Some(0.82),
            target_animal_name: Some("狗".to_string()),
            description: Some("为您播放对应的狗语音频".to_string()),
            audio_filename: Some("狗_饿了.m4a".to_string()),
            ..Default::default()
        };
        let result = TranslationEngine::new().from_backend(&resp);

        assert_eq!(result.source.species, Species::Cat);
        assert_eq!(result.source.intent, CanonicalEmotion::Hungry);
        assert_eq!(result.source.confidence, 82);
        assert_eq!(result.target.species, Species::Dog);
        assert_eq!(result.target.intent, CanonicalEmotion::Hungry);
        assert_eq!(result.target.description, "为您播放对应的狗语音频");
        assert_eq!(result.audio_reference.as_deref(), Some("狗_饿了.m4a"));
        assert!(result.can_translate);
        assert_ne!(result.source.species, result.target.species);
    }

    #[test]
    fn passthrough_label_outside_taxonomy_falls_back_to_mapping() {
        let resp = TranslateResponse {
            success: true,
            original_animal: Some("dog".to_string()),
            original_emotion: Some("warning".to_string()),
            original_emotion_name: Some("狂怒".to_string()),
            confidence: Some(0.6),
            ..Default::default()
        };
        let result = TranslationEngine::new().from_backend(&resp);
        assert_eq!(result.target.intent, CanonicalEmotion::Warning);
        assert_eq!(result.target.species, Species::Cat);
    }

    #[test]
    fn local_mapping_stays_inside_canonical_set() {
        let engine = TranslationEngine::new();
        let result = engine.translate(
            &source_result(CanonicalEmotion::Coquettish, 77),
            Species::Cat,
            Species::Dog,
        );
        assert_eq!(result.target.intent, CanonicalEmotion::Coquettish);
        assert_eq!(result.audio_reference.as_deref(), Some("狗_撒娇.m4a"));
        assert!(result.can_translate);
    }

    #[test]
    fn degenerate_source_yields_undetermined_target() {
        let engine = TranslationEngine::new();
        let result = engine.translate(
            &source_result(CanonicalEmotion::Unknown, 0),
            Species::Cat,
            Species::Dog,
        );
        assert_eq!(result.target.intent, CanonicalEmotion::Unknown);
        assert!(!result.can_translate);
        assert!(result.audio_reference.is_none());
        assert!(result.target.description.contains("无法确定"));
    }

    #[test]
    fn analysis_failed_source_is_also_degenerate() {
        let engine = TranslationEngine::new();
        let result = engine.translate(
            &source_result(CanonicalEmotion::AnalysisFailed, 0),
            Species::Dog,
            Species::Cat,
        );
        assert!(!result.can_translate);
        assert_eq!(result.target.intent, CanonicalEmotion::Unknown);
    }

    #[test]
    fn audio_resolution_uses_similar_then_default() {
        let engine = TranslationEngine::new();
        assert_eq!(
            engine.resolve_audio_reference("饥饿", Species::Dog),
            Some("狗_饿了.m4a".to_string())
        );
        assert_eq!(
            engine.resolve_audio_reference("量子纠缠", Species::Cat),
            Some("猫_打招呼.m4a".to_string())
        );
    }
}
