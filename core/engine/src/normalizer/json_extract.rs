//! 从自由文本里扒出第一个 JSON 对象
//!
//! 视觉后端把结构化结果嵌在闲聊式的回复里，这里做尽力而为的结构化
//! 解析；提取或解析失败时把整段文本原样还给调用方，永远不抛错。

use serde::Deserialize;

/// 视觉模型嵌在回复里的结构化结果
#[derive(Debug, Clone, Deserialize)]
pub struct VisionInsight {
    #[serde(default)]
    pub emotion: String,
    /// 0-100 的数字，缺失时取 85
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tips: Vec<String>,
}

fn default_confidence() -> f32 {
    85.0
}

/// 提取并解析第一个嵌入的 JSON 对象
///
/// Err 侧携带原始文本，调用方将其降级成纯描述结果。
pub fn extract_embedded_json(text: &str) -> Result<VisionInsight, &str> {
    let candidate = first_json_object(text).ok_or(text)?;
    serde_json::from_str(candidate).map_err(|_| text)
}

/// 找到第一段配平的大括号区间
///
/// 跳过字符串字面量内部的括号和转义引号。大括号都是 ASCII，切片边界
/// 在 UTF-8 下总是合法的。
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_surrounded_by_chat() {
        let content = "这只猫很开心 {\"emotion\":\"满足\",\"confidence\":90,\"description\":\"很放松\",\"tips\":[\"a\",\"b\"]} 谢谢";
        let insight = extract_embedded_json(content).unwrap();
        assert_eq!(insight.emotion, "满足");
        assert_eq!(insight.confidence, 90.0);
        assert_eq!(insight.description, "很放松");
        assert_eq!(insight.tips, vec!["a", "b"]);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let insight = extract_embedded_json("{\"emotion\":\"撒娇\"}").unwrap();
        assert_eq!(insight.emotion, "撒娇");
        assert_eq!(insight.confidence, 85.0);
        assert!(insight.description.is_empty());
        assert!(insight.tips.is_empty());
    }

    #[test]
    fn plain_text_falls_back() {
        let text = "猫咪看起来既放松又警觉，没有明显的情绪信号。";
        match extract_embedded_json(text) {
            Err(fallback) => assert_eq!(fallback, text),
            Ok(_) => panic!("纯文本不应该解析成功"),
        }
    }

    #[test]
    fn malformed_json_falls_back() {
        let text = "结果是 {\"emotion\": 未加引号} 以上";
        assert!(extract_embedded_json(text).is_err());
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_the_scan() {
        let content = "{\"emotion\":\"警告\",\"description\":\"呲牙{哈气}状\"}";
        let insight = extract_embedded_json(content).unwrap();
        assert_eq!(insight.description, "呲牙{哈气}状");
    }
}
