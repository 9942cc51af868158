use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryDatum {
    pub name: String,
    pub value: f64,
    pub unit: String,
}

#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn record(&self, datum: TelemetryDatum) -> PipelineResult<()>;
}

/// 把遥测数据打到 stderr 的默认实现
pub struct StderrTelemetrySink;

impl StderrTelemetrySink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StderrTelemetrySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetrySink for StderrTelemetrySink {
    async fn record(&self, datum: TelemetryDatum) -> PipelineResult<()> {
        eprintln!("[TELEMETRY] {} = {} {}", datum.name, datum.value, datum.unit);
        Ok(())
    }
}
