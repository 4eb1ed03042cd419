pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info_span, Instrument};

use crate::config::TriggerConfig;
use crate::error::{FlowError, Result};
use crate::flow::Flow;
use crate::runtime::{InvocationData, Origin, StepIndex};
use crate::step::StepValue;

pub use http::{HttpResponse, HttpSettings, HttpTrigger, ParamPosition, ParamRule};

pub const INVOKE_TRIGGER: &str = "invoke";

/// 触发器处理器：`(flow, trigger, data) -> result`
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    async fn handle(
        &self,
        flow: &Flow,
        trigger: &TriggerConfig,
        data: InvocationData,
    ) -> Result<StepValue>;
}

/// 触发类型：内置 invoke（带步骤位置）或具名触发器
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerKind {
    Invoke(StepIndex),
    Named(String),
}

impl TriggerKind {
    pub fn type_name(&self) -> &str {
        match self {
            TriggerKind::Invoke(_) => INVOKE_TRIGGER,
            TriggerKind::Named(name) => name,
        }
    }
}

impl Default for TriggerKind {
    fn default() -> Self {
        TriggerKind::Invoke(StepIndex::All)
    }
}

impl From<&str> for TriggerKind {
    fn from(name: &str) -> Self {
        if name == INVOKE_TRIGGER {
            TriggerKind::Invoke(StepIndex::All)
        } else {
            TriggerKind::Named(name.to_string())
        }
    }
}

impl From<String> for TriggerKind {
    fn from(name: String) -> Self {
        TriggerKind::from(name.as_str())
    }
}

impl From<Option<&str>> for TriggerKind {
    fn from(name: Option<&str>) -> Self {
        name.map(TriggerKind::from).unwrap_or_default()
    }
}

impl From<i64> for TriggerKind {
    fn from(index: i64) -> Self {
        TriggerKind::Invoke(StepIndex::from(index))
    }
}

impl From<usize> for TriggerKind {
    fn from(index: usize) -> Self {
        TriggerKind::Invoke(StepIndex::At(index))
    }
}

impl From<StepIndex> for TriggerKind {
    fn from(index: StepIndex) -> Self {
        TriggerKind::Invoke(index)
    }
}

/// `create_trigger` 返回的可复用入口
#[derive(Clone)]
pub struct TriggerEntry {
    flow: Arc<Flow>,
    kind: TriggerKind,
}

impl TriggerEntry {
    pub(crate) fn new(flow: Arc<Flow>, kind: TriggerKind) -> Self {
        Self { flow, kind }
    }

    pub async fn call(&self, event: Value, context: Value) -> Result<StepValue> {
        let origin = Origin::new(self.kind.type_name(), event, context);
        debug!(kind = ?self.kind, origin = ?origin, "trigger called");

        let mounted = self.flow.mount().await?;
        let processed = self.flow.process_origin(origin).await?;
        debug!(processed = ?processed, "origin processed");

        let span = info_span!("flow", track_id = %processed.context.track_id);
        async move {
            match &self.kind {
                TriggerKind::Invoke(index) => self.flow.run(*index, processed).await,
                TriggerKind::Named(name) => {
                    let handler = mounted
                        .trigger(name)
                        .ok_or_else(|| FlowError::NotFound(format!("Trigger#{name} not found")))?;
                    let trigger = self
                        .flow
                        .config()
                        .triggers
                        .get(name)
                        .ok_or_else(|| FlowError::NotFound(format!("Trigger#{name} not found")))?;
                    handler.handle(&self.flow, trigger, processed).await
                }
            }
        }
        .instrument(span)
        .await
    }
}
