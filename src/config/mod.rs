pub mod env;
pub mod loader;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FlowError;
use crate::resource::ResourceHandler;
use crate::trigger::TriggerHandler;

pub use env::EnvConfig;
pub use loader::{load_flow_from_path, load_flow_from_str, load_flow_from_value, FlowDocument};

/// 执行模式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowMode {
    #[default]
    Sync,
    Async,
}

impl FromStr for FlowMode {
    type Err = FlowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(FlowMode::Sync),
            "async" => Ok(FlowMode::Async),
            other => Err(FlowError::Configuration(format!("Unknown mode: {other}"))),
        }
    }
}

impl fmt::Display for FlowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowMode::Sync => f.write_str("sync"),
            FlowMode::Async => f.write_str("async"),
        }
    }
}

/// 处理器槽位：未设置、按名称引用、类型错误或已绑定
pub enum HandlerSlot<H: ?Sized> {
    Unset,
    Named(String),
    Invalid(Value),
    Bound(Arc<H>),
}

impl<H: ?Sized> Default for HandlerSlot<H> {
    fn default() -> Self {
        HandlerSlot::Unset
    }
}

impl<H: ?Sized> Clone for HandlerSlot<H> {
    fn clone(&self) -> Self {
        match self {
            HandlerSlot::Unset => HandlerSlot::Unset,
            HandlerSlot::Named(name) => HandlerSlot::Named(name.clone()),
            HandlerSlot::Invalid(value) => HandlerSlot::Invalid(value.clone()),
            HandlerSlot::Bound(handler) => HandlerSlot::Bound(Arc::clone(handler)),
        }
    }
}

impl<H: ?Sized> fmt::Debug for HandlerSlot<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerSlot::Unset => f.write_str("Unset"),
            HandlerSlot::Named(name) => f.debug_tuple("Named").field(name).finish(),
            HandlerSlot::Invalid(value) => f.debug_tuple("Invalid").field(value).finish(),
            HandlerSlot::Bound(_) => f.write_str("Bound(..)"),
        }
    }
}

impl<H: ?Sized> From<Value> for HandlerSlot<H> {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => HandlerSlot::Unset,
            Value::String(name) => HandlerSlot::Named(name),
            other => HandlerSlot::Invalid(other),
        }
    }
}

/// 云资源配置
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(from = "RawResource")]
pub struct ResourceConfig {
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub config: Value,
    pub provider: Option<Value>,
    pub handler: HandlerSlot<dyn ResourceHandler>,
}

#[derive(Deserialize)]
struct RawResource {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    type_name: Option<String>,
    #[serde(default)]
    config: Value,
    #[serde(default)]
    provider: Option<Value>,
    #[serde(default)]
    handler: Value,
}

impl From<RawResource> for ResourceConfig {
    fn from(raw: RawResource) -> Self {
        Self {
            name: raw.name,
            type_name: raw.type_name,
            config: raw.config,
            provider: raw.provider,
            handler: raw.handler.into(),
        }
    }
}

impl ResourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn ResourceHandler>) -> Self {
        self.handler = HandlerSlot::Bound(handler);
        self
    }
}

/// 触发器配置
///
/// `settings` 保存声明时的原始值（`true` 或对象），由具体触发器解释。
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "Value")]
pub struct TriggerConfig {
    pub type_name: Option<String>,
    pub trigger_type: Option<String>,
    pub resource: Option<Value>,
    pub settings: Value,
    pub handler: HandlerSlot<dyn TriggerHandler>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            type_name: None,
            trigger_type: None,
            resource: None,
            settings: Value::Bool(true),
            handler: HandlerSlot::Unset,
        }
    }
}

impl From<Value> for TriggerConfig {
    fn from(value: Value) -> Self {
        let Value::Object(object) = &value else {
            return Self {
                settings: value,
                ..Self::default()
            };
        };

        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            type_name: text("type"),
            trigger_type: text("triggerType"),
            resource: object.get("resource").cloned(),
            handler: object.get("handler").cloned().unwrap_or_default().into(),
            settings: value,
        }
    }
}

impl TriggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn TriggerHandler>) -> Self {
        self.handler = HandlerSlot::Bound(handler);
        self
    }

    /// 声明的类型：`triggerType` 优先，其次 `type`
    pub fn declared_type(&self) -> Option<&str> {
        self.trigger_type.as_deref().or(self.type_name.as_deref())
    }
}

/// 流程配置
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub mode: FlowMode,
    pub name: Option<String>,
    pub resource: Option<ResourceConfig>,
    pub resources: IndexMap<String, ResourceConfig>,
    pub triggers: IndexMap<String, TriggerConfig>,
}

impl FlowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: FlowMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_resource(mut self, resource: ResourceConfig) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn with_named_resource(
        mut self,
        name: impl Into<String>,
        resource: ResourceConfig,
    ) -> Self {
        self.resources.insert(name.into(), resource);
        self
    }

    pub fn with_trigger(mut self, name: impl Into<String>, trigger: TriggerConfig) -> Self {
        self.triggers.insert(name.into(), trigger);
        self
    }

    /// 应用环境变量覆盖
    pub fn apply_env(mut self, env: &EnvConfig) -> Self {
        if let Some(mode) = env.mode {
            self.mode = mode;
        }
        self
    }
}
