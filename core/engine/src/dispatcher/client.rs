// core/engine/src/dispatcher/client.rs
// 三个分类/翻译后端的 HTTP 客户端实现

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::config_manager::{EngineConfig, MAX_UPLOAD_BYTES};
use crate::error::{PipelineError, PipelineResult};
use crate::taxonomy::{Species, ALL_EMOTIONS};
use crate::types::{AnalysisPurpose, AnalysisRequest, MediaKind, MediaPayload};

use super::types::{
    PredictResponse, RawBackendResponse, TranslateResponse, VisionChatRequest, VisionChatResponse,
    VisionContentPart, VisionImageUrl, VisionMessage,
};
use super::AnalysisDispatcher;

/// HTTP 状态码到错误分类的映射
///
/// 适用于两个文件上传后端；调用方保证只在非 2xx 时进入这里。
pub fn classify_status(status: u16) -> PipelineError {
    match status {
        422 => PipelineError::UnsupportedFormat,
        413 => PipelineError::PayloadTooLarge,
        503 => PipelineError::ServiceNotReady,
        status => PipelineError::UpstreamServerError { status },
    }
}

/// 视觉后端的指令文本，逐一列出 18 个标签
pub fn vision_prompt(species: Species) -> String {
    let labels: Vec<&str> = ALL_EMOTIONS.iter().map(|e| e.as_str()).collect();
    format!(
        "请分析这张{animal}图片，识别{animal}的情绪状态。你必须从以下18种标签中选择最匹配的一个：{labels}。\
         请严格按照以下JSON格式返回结果：{{\"emotion\": \"从18种标签中选择的情绪\", \"confidence\": 置信度数字(0-100), \
         \"description\": \"{animal}情绪的详细分析\", \"tips\": [\"专业建议1\", \"专业建议2\", \"专业建议3\"]}}",
        animal = species.display_name(),
        labels = labels.join("、"),
    )
}

/// 按媒体类型推一个上传文件名（后端靠扩展名挑解码器）
fn file_name_for(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/webm" => "recording.webm",
        "audio/wav" | "audio/x-wav" => "upload.wav",
        "audio/mpeg" | "audio/mp3" => "upload.mp3",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "upload.m4a",
        _ => "upload.bin",
    }
}

/// 分析调度器的 HTTP 实现
pub struct HttpAnalysisDispatcher {
    http: Client,
    config: EngineConfig,
}

impl HttpAnalysisDispatcher {
    pub fn new(config: EngineConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, config }
    }

    /// 音频分类（POST {predict}/predict，multipart 字段 file）
    async fn classify_audio(&self, payload: MediaPayload) -> PipelineResult<PredictResponse> {
        let url = format!("{}/predict", self.config.predict_base_url);
        let response = self.post_multipart(&url, payload).await?;

        let predict: PredictResponse =
            response
                .json()
                .await
                .map_err(|e| PipelineError::ParseFailure {
                    details: format!("响应不是合法 JSON: {}", e),
                })?;

        // 信封校验：success 为 true，或至少携带 emotion/label
        if predict.success == Some(true) || predict.emotion.is_some() || predict.label.is_some() {
            Ok(predict)
        } else {
            Err(PipelineError::ParseFailure {
                details: predict
                    .error
                    .unwrap_or_else(|| "响应缺少 success/label 字段".to_string()),
            })
        }
    }

    /// 跨物种翻译（POST {translate}/translate，multipart 字段 file）
    async fn translate_audio(&self, payload: MediaPayload) -> PipelineResult<TranslateResponse> {
        let url = format!("{}/translate", self.config.translate_base_url);
        let response = self.post_multipart(&url, payload).await?;

        let translate: TranslateResponse =
            response
                .json()
                .await
                .map_err(|e| PipelineError::ParseFailure {
                    details: format!("响应不是合法 JSON: {}", e),
                })?;

        // 2xx 但 success 为 false 同样算信封损坏
        if translate.success {
            Ok(translate)
        } else {
            Err(PipelineError::ParseFailure {
                details: translate.error.unwrap_or_else(|| "翻译失败".to_string()),
            })
        }
    }

    /// 图片情绪识别（chat-completion 风格的视觉后端）
    ///
    /// 只在传输层或 HTTP 层失败时报错；拿到的自由文本无论长什么样都
    /// 原样交给归一化层处理。
    async fn classify_image(
        &self,
        payload: MediaPayload,
        species: Species,
    ) -> PipelineResult<String> {
        let vision = &self.config.vision;
        let mime_type = if payload.mime_type.is_empty() {
            "image/jpeg".to_string()
        } else {
            payload.mime_type.clone()
        };
        let image_b64 = BASE64.encode(&payload.data);

        let request = VisionChatRequest {
            model: vision.model.clone(),
            messages: vec![VisionMessage {
                role: "user".to_string(),
                content: vec![
                    VisionContentPart::Text {
                        text: vision_prompt(species),
                    },
                    VisionContentPart::ImageUrl {
                        image_url: VisionImageUrl {
                            url: format!("data:{};base64,{}", mime_type, image_b64),
                        },
                    },
                ],
            }],
            max_tokens: vision.max_tokens,
            temperature: vision.temperature,
        };

        eprintln!(
            "[DISPATCH] 📤 调用视觉后端: {} (model: {}, image: {} bytes)",
            vision.endpoint,
            vision.model,
            payload.data.len()
        );

        let mut builder = self.http.post(&vision.endpoint).json(&request);
        if let Some(key) = &vision.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PipelineError::TransportError {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status.as_u16()));
        }

        let chat: VisionChatResponse =
            response
                .json()
                .await
                .map_err(|e| PipelineError::ParseFailure {
                    details: format!("响应不是合法 JSON: {}", e),
                })?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::ParseFailure {
                details: "响应缺少 choices".to_string(),
            })?;

        Ok(content)
    }

    /// multipart 上传公共路径
    ///
    /// 超过 20MB 的负载直接返回 `PayloadTooLarge`，不会触网，也不会去
    /// 解析任何响应体；非 2xx 状态在读取响应体之前就分类成错误。
    async fn post_multipart(
        &self,
        url: &str,
        payload: MediaPayload,
    ) -> PipelineResult<reqwest::Response> {
        if payload.len() > MAX_UPLOAD_BYTES {
            return Err(PipelineError::PayloadTooLarge);
        }

        eprintln!(
            "[DISPATCH] 📤 上传到 {} ({} bytes, {})",
            url,
            payload.len(),
            payload.mime_type
        );

        let file_name = file_name_for(&payload.mime_type);
        let part = Part::bytes(payload.data)
            .file_name(file_name)
            .mime_str(&payload.mime_type)
            .map_err(|_| PipelineError::UnsupportedFormat)?;
        let form = Form::new().part("file", part);

        // 超时同样落到 TransportError，挂起的后端不会把管线永远挂住
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::TransportError {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            eprintln!("[DISPATCH] ❌ 后端返回 {}", status);
            return Err(classify_status(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl AnalysisDispatcher for HttpAnalysisDispatcher {
    async fn dispatch(&self, request: AnalysisRequest) -> PipelineResult<RawBackendResponse> {
        match (request.purpose, request.kind) {
            (AnalysisPurpose::Classify, MediaKind::Audio) => self
                .classify_audio(request.payload)
                .await
                .map(RawBackendResponse::Predict),
            (AnalysisPurpose::Translate, MediaKind::Audio) => self
                .translate_audio(request.payload)
                .await
                .map(RawBackendResponse::Translate),
            (AnalysisPurpose::Classify, MediaKind::Image) => self
                .classify_image(request.payload, request.species)
                .await
                .map(|content| RawBackendResponse::Vision { content }),
            // 图片没有跨物种翻译路由
            (AnalysisPurpose::Translate, MediaKind::Image) => {
                Err(PipelineError::UnsupportedFormat)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_contract() {
        assert_eq!(classify_status(422), PipelineError::UnsupportedFormat);
        assert_eq!(classify_status(413), PipelineError::PayloadTooLarge);
        assert_eq!(classify_status(503), PipelineError::ServiceNotReady);
        assert_eq!(
            classify_status(500),
            PipelineError::UpstreamServerError { status: 500 }
        );
        assert_eq!(
            classify_status(502),
            PipelineError::UpstreamServerError { status: 502 }
        );
    }

    #[test]
    fn upload_file_name_follows_mime() {
        assert_eq!(file_name_for("audio/webm"), "recording.webm");
        assert_eq!(file_name_for("audio/wav"), "upload.wav");
        assert_eq!(file_name_for("audio/mpeg"), "upload.mp3");
        assert_eq!(file_name_for("application/octet-stream"), "upload.bin");
    }

    #[test]
    fn vision_prompt_enumerates_all_labels() {
        let prompt = vision_prompt(Species::Cat);
        assert!(prompt.contains("猫咪"));
        assert!(prompt.contains("18种标签"));
        for emotion in ALL_EMOTIONS {
            assert!(prompt.contains(emotion.as_str()));
        }
    }
}
