//! 健康检查模块
//!
//! 探测音频分类和跨物种翻译服务的 /health 接口，部分后端故障时
//! 调用方可以据此提前提示，而不是等上传失败。

use std::time::Duration;

use reqwest::Client;

use crate::config_manager::EngineConfig;

/// 服务健康状态
#[derive(Debug, Clone)]
pub struct ServiceHealth {
    pub is_healthy: bool,
    pub service_name: String,
    pub url: String,
    pub error: Option<String>,
}

/// 健康检查器
pub struct HealthChecker {
    http: Client,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// 检查音频分类服务
    pub async fn check_predict_service(&self, base_url: &str) -> ServiceHealth {
        self.probe("predict", base_url).await
    }

    /// 检查跨物种翻译服务
    pub async fn check_translate_service(&self, base_url: &str) -> ServiceHealth {
        self.probe("translate", base_url).await
    }

    /// 同时检查两个文件上传后端
    pub async fn check_all(&self, config: &EngineConfig) -> Vec<ServiceHealth> {
        vec![
            self.check_predict_service(&config.predict_base_url).await,
            self.check_translate_service(&config.translate_base_url).await,
        ]
    }

    async fn probe(&self, service_name: &str, base_url: &str) -> ServiceHealth {
        let url = format!("{}/health", base_url);
        match self.http.get(&url).send().await {
            Ok(response) => {
                if response.status().is_success() {
                    ServiceHealth {
                        is_healthy: true,
                        service_name: service_name.to_string(),
                        url: base_url.to_string(),
                        error: None,
                    }
                } else {
                    ServiceHealth {
                        is_healthy: false,
                        service_name: service_name.to_string(),
                        url: base_url.to_string(),
                        error: Some(format!("HTTP {}", response.status())),
                    }
                }
            }
            Err(e) => ServiceHealth {
                is_healthy: false,
                service_name: service_name.to_string(),
                url: base_url.to_string(),
                error: Some(e.to_string()),
            },
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}
