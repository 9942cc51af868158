//! 基于 Channel 的事件总线实现
//!
//! 用 tokio::sync::mpsc 做发布/订阅：发布端把事件投进无界通道，
//! 后台任务按 topic 扇出到各订阅者。

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use async_trait::async_trait;

use crate::error::{PipelineError, PipelineResult};

use super::{EventBus, EventTopic, PipelineEvent};

type SubscriberMap = HashMap<String, Vec<mpsc::UnboundedSender<PipelineEvent>>>;

pub struct ChannelEventBus {
    sender: mpsc::UnboundedSender<PipelineEvent>,
    subscribers: Arc<RwLock<SubscriberMap>>,
    started: Arc<RwLock<bool>>,
}

impl ChannelEventBus {
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<PipelineEvent>();
        let subscribers: Arc<RwLock<SubscriberMap>> = Arc::new(RwLock::new(HashMap::new()));
        let started = Arc::new(RwLock::new(false));

        let subscribers_clone = Arc::clone(&subscribers);

        // 后台分发任务：把事件送到订阅了对应 topic 的所有接收端，
        // 断开的订阅者顺手清理掉
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                let topic = event.topic.0.clone();
                let mut dead = Vec::new();
                {
                    let subs = subscribers_clone.read().await;
                    if let Some(list) = subs.get(&topic) {
                        for (idx, sub) in list.iter().enumerate() {
                            if sub.send(event.clone()).is_err() {
                                dead.push(idx);
                            }
                        }
                    }
                }
                if !dead.is_empty() {
                    let mut subs = subscribers_clone.write().await;
                    if let Some(list) = subs.get_mut(&topic) {
                        for &idx in dead.iter().rev() {
                            if idx < list.len() {
                                list.remove(idx);
                            }
                        }
                        if list.is_empty() {
                            subs.remove(&topic);
                        }
                    }
                }
            }
        });

        Self {
            sender,
            subscribers,
            started,
        }
    }

    /// 订阅指定 topic，返回接收端
    pub async fn subscribe_receiver(
        &self,
        topic: EventTopic,
    ) -> mpsc::UnboundedReceiver<PipelineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subs = self.subscribers.write().await;
        subs.entry(topic.0).or_default().push(tx);
        rx
    }
}

impl Default for ChannelEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for ChannelEventBus {
    async fn start(&self) -> PipelineResult<()> {
        let mut started = self.started.write().await;
        *started = true;
        Ok(())
    }

    async fn stop(&self) -> PipelineResult<()> {
        let mut started = self.started.write().await;
        *started = false;
        Ok(())
    }

    async fn publish(&self, event: PipelineEvent) -> PipelineResult<()> {
        self.sender.send(event).map_err(|e| PipelineError::TransportError {
            details: format!("事件发布失败: {}", e),
        })?;
        Ok(())
    }
}
