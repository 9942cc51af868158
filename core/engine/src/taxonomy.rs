//! 情绪标签体系
//!
//! 封闭的 18 个意图标签加两个哨兵值（未知 / 分析失败），所有后端词汇
//! （英文 ML 标签、视觉模型自由文本、中文规范标签）都归一到这里。
//! 纯数据加查表函数，无 I/O。

use serde::{Deserialize, Serialize};

/// 规范情绪标签
///
/// 序列化形式为中文标签本身，与后端 `/labels` 接口和视觉模型提示词
/// 使用的词汇一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalEmotion {
    #[serde(rename = "兴奋捕猎")]
    ExcitedHunting,
    #[serde(rename = "友好呼唤")]
    FriendlyCall,
    #[serde(rename = "吵架")]
    Quarreling,
    #[serde(rename = "好吃")]
    Yummy,
    #[serde(rename = "委屈")]
    Wronged,
    #[serde(rename = "想玩耍")]
    Playful,
    #[serde(rename = "打招呼")]
    Greeting,
    #[serde(rename = "打架预备")]
    FightReady,
    #[serde(rename = "撒娇")]
    Coquettish,
    #[serde(rename = "无聊")]
    Bored,
    #[serde(rename = "求偶")]
    Mating,
    #[serde(rename = "求救")]
    Distress,
    #[serde(rename = "满足")]
    Content,
    #[serde(rename = "着急")]
    Anxious,
    #[serde(rename = "舒服")]
    Comfortable,
    #[serde(rename = "警告")]
    Warning,
    #[serde(rename = "走开")]
    GoAway,
    #[serde(rename = "饿了")]
    Hungry,
    /// 哨兵：无法归入封闭集合的标签
    #[serde(rename = "未知")]
    Unknown,
    /// 哨兵：后端报错或置信度缺失
    #[serde(rename = "分析失败")]
    AnalysisFailed,
}

/// 封闭集合中的 18 个标签（不含哨兵）
pub const ALL_EMOTIONS: [CanonicalEmotion; 18] = [
    CanonicalEmotion::ExcitedHunting,
    CanonicalEmotion::FriendlyCall,
    CanonicalEmotion::Quarreling,
    CanonicalEmotion::Yummy,
    CanonicalEmotion::Wronged,
    CanonicalEmotion::Playful,
    CanonicalEmotion::Greeting,
    CanonicalEmotion::FightReady,
    CanonicalEmotion::Coquettish,
    CanonicalEmotion::Bored,
    CanonicalEmotion::Mating,
    CanonicalEmotion::Distress,
    CanonicalEmotion::Content,
    CanonicalEmotion::Anxious,
    CanonicalEmotion::Comfortable,
    CanonicalEmotion::Warning,
    CanonicalEmotion::GoAway,
    CanonicalEmotion::Hungry,
];

impl CanonicalEmotion {
    /// 中文标签
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalEmotion::ExcitedHunting => "兴奋捕猎",
            CanonicalEmotion::FriendlyCall => "友好呼唤",
            CanonicalEmotion::Quarreling => "吵架",
            CanonicalEmotion::Yummy => "好吃",
            CanonicalEmotion::Wronged => "委屈",
            CanonicalEmotion::Playful => "想玩耍",
            CanonicalEmotion::Greeting => "打招呼",
            CanonicalEmotion::FightReady => "打架预备",
            CanonicalEmotion::Coquettish => "撒娇",
            CanonicalEmotion::Bored => "无聊",
            CanonicalEmotion::Mating => "求偶",
            CanonicalEmotion::Distress => "求救",
            CanonicalEmotion::Content => "满足",
            CanonicalEmotion::Anxious => "着急",
            CanonicalEmotion::Comfortable => "舒服",
            CanonicalEmotion::Warning => "警告",
            CanonicalEmotion::GoAway => "走开",
            CanonicalEmotion::Hungry => "饿了",
            CanonicalEmotion::Unknown => "未知",
            CanonicalEmotion::AnalysisFailed => "分析失败",
        }
    }

    /// 是否为哨兵值（未知 / 分析失败）
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self,
            CanonicalEmotion::Unknown | CanonicalEmotion::AnalysisFailed
        )
    }

    /// 中文标签 -> 规范标签
    ///
    /// 封闭集合外的任何输入（包括视觉模型临时造出的"好奇"、"分析中"等）
    /// 一律收敛到未知，不会失败。
    pub fn from_chinese(label: &str) -> Self {
        let label = label.trim();
        match label {
            "兴奋捕猎" => CanonicalEmotion::ExcitedHunting,
            "友好呼唤" => CanonicalEmotion::FriendlyCall,
            "吵架" => CanonicalEmotion::Quarreling,
            "好吃" => CanonicalEmotion::Yummy,
            "委屈" => CanonicalEmotion::Wronged,
            "想玩耍" => CanonicalEmotion::Playful,
            "打招呼" => CanonicalEmotion::Greeting,
            "打架预备" => CanonicalEmotion::FightReady,
            "撒娇" => CanonicalEmotion::Coquettish,
            "无聊" => CanonicalEmotion::Bored,
            "求偶" => CanonicalEmotion::Mating,
            "求救" => CanonicalEmotion::Distress,
            "满足" => CanonicalEmotion::Content,
            "着急" => CanonicalEmotion::Anxious,
            "舒服" => CanonicalEmotion::Comfortable,
            "警告" => CanonicalEmotion::Warning,
            "走开" => CanonicalEmotion::GoAway,
            "饿了" => CanonicalEmotion::Hungry,
            "分析失败" => CanonicalEmotion::AnalysisFailed,
            _ => CanonicalEmotion::Unknown,
        }
    }

    /// 英文 ML 标签 -> 规范标签
    ///
    /// 覆盖分类服务历史上用过的全部标签写法（下划线、连字符、空格
    /// 混用），未识别的标签收敛到未知。
    pub fn from_english(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "hungry" | "hunger" => CanonicalEmotion::Hungry,
            "excited_hunting" | "hunting" | "excited" => CanonicalEmotion::ExcitedHunting,
            "friendly_call" | "friendly" | "call" => CanonicalEmotion::FriendlyCall,
            "quarrel" | "quarreling" | "fighting" | "argue" => CanonicalEmotion::Quarreling,
            "yummy" | "delicious" | "tasty" => CanonicalEmotion::Yummy,
            "wronged" | "aggrieved" | "grievance" | "plea" => CanonicalEmotion::Wronged,
            "want_play" | "playful" | "play" => CanonicalEmotion::Playful,
            "greeting" | "greet" | "hello" => CanonicalEmotion::Greeting,
            "fight_ready" | "pre_fight" | "ready_to_fight" => CanonicalEmotion::FightReady,
            "coquetry" | "acting_cute" | "cute" | "sajiao" => CanonicalEmotion::Coquettish,
            "bored" | "boring" => CanonicalEmotion::Bored,
            "mating" | "courtship" | "estrus" => CanonicalEmotion::Mating,
            "distress" | "help" | "sos" | "rescue" => CanonicalEmotion::Distress,
            "content" | "satisfied" | "satisfaction" => CanonicalEmotion::Content,
            "anxious" | "anxiety" | "worried" => CanonicalEmotion::Anxious,
            "comfortable" | "comfort" | "relaxed" => CanonicalEmotion::Comfortable,
            "warning" | "warn" | "threat" => CanonicalEmotion::Warning,
            "go_away" | "leave" | "leave_me_alone" => CanonicalEmotion::GoAway,
            _ => CanonicalEmotion::Unknown,
        }
    }

    /// 跨物种对应标签
    ///
    /// 两个物种共享同一封闭词汇表，18 个标签各自一一对应；哨兵值没有
    /// 对应物，映射结果仍是未知。
    pub fn counterpart(&self) -> Self {
        if self.is_sentinel() {
            CanonicalEmotion::Unknown
        } else {
            *self
        }
    }

    /// 目标物种的示例音频文件名，如 `狗_饿了.m4a`
    ///
    /// 哨兵值没有示例音频。
    pub fn audio_reference(&self, species: Species) -> Option<String> {
        if self.is_sentinel() {
            return None;
        }
        Some(format!("{}_{}.m4a", species.short_name(), self.as_str()))
    }
}

impl std::fmt::Display for CanonicalEmotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 自由文本标签的近似归类
///
/// 音频库里并非每个标签都有示例音频，后端历史上用一张相似词表兜底
/// （比如"饥饿"落到饿了）。查不到时返回 None，调用方再用
/// [`default_audio_emotions`] 的顺序兜底。
pub fn resolve_similar(label: &str) -> Option<CanonicalEmotion> {
    const SIMILAR: [(CanonicalEmotion, &[&str]); 8] = [
        (CanonicalEmotion::ExcitedHunting, &["兴奋", "捕猎", "活跃"]),
        (CanonicalEmotion::FriendlyCall, &["友好", "呼唤"]),
        (CanonicalEmotion::Coquettish, &["可爱", "亲昵"]),
        (CanonicalEmotion::Warning, &["威胁", "生气"]),
        (CanonicalEmotion::Hungry, &["要食物", "饥饿"]),
        (CanonicalEmotion::Anxious, &["焦虑", "不安"]),
        (CanonicalEmotion::Mating, &["发情"]),
        (CanonicalEmotion::Wronged, &["哀求", "请求"]),
    ];

    let label = label.trim();
    let direct = CanonicalEmotion::from_chinese(label);
    if !direct.is_sentinel() {
        return Some(direct);
    }
    SIMILAR
        .iter()
        .find(|(_, synonyms)| synonyms.contains(&label))
        .map(|(emotion, _)| *emotion)
}

/// 兜底示例音频的优先顺序
pub fn default_audio_emotions() -> [CanonicalEmotion; 3] {
    [
        CanonicalEmotion::Greeting,
        CanonicalEmotion::Coquettish,
        CanonicalEmotion::FriendlyCall,
    ]
}

/// 物种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Cat,
    Dog,
}

impl Species {
    /// 后端接口里的英文名（"cat" / "dog"）
    pub fn wire_name(&self) -> &'static str {
        match self {
            Species::Cat => "cat",
            Species::Dog => "dog",
        }
    }

    /// 面向用户的称呼（"猫咪" / "狗狗"）
    pub fn display_name(&self) -> &'static str {
        match self {
            Species::Cat => "猫咪",
            Species::Dog => "狗狗",
        }
    }

    /// 音频文件名里的单字（"猫" / "狗"）
    pub fn short_name(&self) -> &'static str {
        match self {
            Species::Cat => "猫",
            Species::Dog => "狗",
        }
    }

    /// 翻译目标物种（猫 <-> 狗）
    pub fn counterpart(&self) -> Species {
        match self {
            Species::Cat => Species::Dog,
            Species::Dog => Species::Cat,
        }
    }

    /// 解析后端返回的物种名，兼容英文与中文单字
    pub fn from_wire(name: &str) -> Option<Species> {
        match name.trim() {
            "cat" | "猫" | "猫咪" => Some(Species::Cat),
            "dog" | "狗" | "狗狗" => Some(Species::Dog),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_set_has_eighteen_labels() {
        assert_eq!(ALL_EMOTIONS.len(), 18);
        for emotion in ALL_EMOTIONS {
            assert!(!emotion.is_sentinel());
            // 中文标签可以无损往返
            assert_eq!(CanonicalEmotion::from_chinese(emotion.as_str()), emotion);
        }
    }

    #[test]
    fn unrecognized_labels_clamp_to_unknown() {
        assert_eq!(
            CanonicalEmotion::from_chinese("好奇"),
            CanonicalEmotion::Unknown
        );
        assert_eq!(
            CanonicalEmotion::from_chinese("分析中"),
            CanonicalEmotion::Unknown
        );
        assert_eq!(
            CanonicalEmotion::from_english("zoomies"),
            CanonicalEmotion::Unknown
        );
    }

    #[test]
    fn english_lookup_is_case_and_separator_insensitive() {
        assert_eq!(
            CanonicalEmotion::from_english("hungry"),
            CanonicalEmotion::Hungry
        );
        assert_eq!(
            CanonicalEmotion::from_english("Friendly-Call"),
            CanonicalEmotion::FriendlyCall
        );
        assert_eq!(
            CanonicalEmotion::from_english("WANT PLAY"),
            CanonicalEmotion::Playful
        );
    }

    #[test]
    fn counterpart_stays_inside_canonical_set() {
        for emotion in ALL_EMOTIONS {
            assert_eq!(emotion.counterpart(), emotion);
        }
        assert_eq!(
            CanonicalEmotion::AnalysisFailed.counterpart(),
            CanonicalEmotion::Unknown
        );
    }

    #[test]
    fn audio_reference_uses_short_species_name() {
        assert_eq!(
            CanonicalEmotion::Hungry.audio_reference(Species::Dog),
            Some("狗_饿了.m4a".to_string())
        );
        assert_eq!(CanonicalEmotion::Unknown.audio_reference(Species::Cat), None);
    }

    #[test]
    fn similar_label_resolution() {
        assert_eq!(resolve_similar("饥饿"), Some(CanonicalEmotion::Hungry));
        assert_eq!(resolve_similar("哀求"), Some(CanonicalEmotion::Wronged));
        assert_eq!(resolve_similar("饿了"), Some(CanonicalEmotion::Hungry));
        assert_eq!(resolve_similar("量子纠缠"), None);
    }

    #[test]
    fn species_mappings() {
        assert_eq!(Species::Cat.counterpart(), Species::Dog);
        assert_eq!(Species::from_wire("cat"), Some(Species::Cat));
        assert_eq!(Species::from_wire("狗"), Some(Species::Dog));
        assert_eq!(Species::from_wire("fox"), None);
    }
}
