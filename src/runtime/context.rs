use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::{FlowLogger, Helpers, LOGGER_HELPER};
use crate::step::StepValue;

/// 调用栈中的一帧
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: String,
    pub time: i64,
}

/// 每次外部触发时盖上的追踪信息，在该次调用的所有步骤中保持不变
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackContext {
    pub track_id: String,
    #[serde(default)]
    pub history: Vec<Stack>,
    pub current: Stack,
}

/// 触发时的原始数据
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub event: Value,
    pub context: Value,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Origin {
    pub fn new(type_name: impl Into<String>, event: Value, context: Value) -> Self {
        Self {
            event,
            context,
            type_name: type_name.into(),
        }
    }
}

/// 单次调用的数据，`event` 在步骤之间依次传递
#[derive(Clone, Debug, Default, Serialize)]
pub struct InvocationData {
    pub event: StepValue,
    pub context: TrackContext,
    pub origin: Origin,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl InvocationData {
    pub fn new(event: impl Into<StepValue>) -> Self {
        Self {
            event: event.into(),
            ..Self::default()
        }
    }
}

/// 传给步骤处理器的上下文
#[derive(Clone)]
pub struct StepContext {
    index: usize,
    flow_name: Option<Arc<str>>,
    helpers: Arc<Helpers>,
    context: TrackContext,
    origin: Origin,
}

impl StepContext {
    pub fn new(
        index: usize,
        flow_name: Option<Arc<str>>,
        helpers: Arc<Helpers>,
        data: &InvocationData,
    ) -> Self {
        Self {
            index,
            flow_name,
            helpers,
            context: data.context.clone(),
            origin: data.origin.clone(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn flow_name(&self) -> Option<&str> {
        self.flow_name.as_deref()
    }

    pub fn helpers(&self) -> &Helpers {
        &self.helpers
    }

    pub fn helper<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.helpers.get::<T>(name)
    }

    pub fn logger(&self) -> Option<Arc<FlowLogger>> {
        self.helper::<FlowLogger>(LOGGER_HELPER)
    }

    pub fn context(&self) -> &TrackContext {
        &self.context
    }

    pub fn track_id(&self) -> &str {
        &self.context.track_id
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}
