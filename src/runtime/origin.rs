use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use crate::error::Result;

use super::context::{InvocationData, Origin, Stack, TrackContext};

/// 把服务商的原始触发数据整理为 [`InvocationData`]
#[async_trait]
pub trait OriginProcessor: Send + Sync {
    async fn process(&self, origin: Origin) -> Result<InvocationData>;
}

/// 没有服务商时的默认实现：用当前毫秒时间戳作为 trackId
#[derive(Clone, Debug, Default)]
pub struct DefaultOriginProcessor;

#[async_trait]
impl OriginProcessor for DefaultOriginProcessor {
    async fn process(&self, origin: Origin) -> Result<InvocationData> {
        warn!("processOrigin: no provider found");

        let now = Utc::now().timestamp_millis();
        Ok(InvocationData {
            event: origin.event.clone().into(),
            context: TrackContext {
                track_id: now.to_string(),
                history: Vec::new(),
                current: Stack {
                    type_name: origin.type_name.clone(),
                    id: now.to_string(),
                    time: now,
                },
            },
            type_name: origin.type_name.clone(),
            origin,
        })
    }
}
