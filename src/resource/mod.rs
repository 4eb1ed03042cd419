use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{FlowMode, ResourceConfig};
use crate::error::Result;
use crate::flow::FlowHooks;
use crate::runtime::{OriginProcessor, RemoteInvoker, StepInvoker};

pub type Helper = Arc<dyn Any + Send + Sync>;

/// 日志 helper 的保留名
pub const LOGGER_HELPER: &str = "logger";

/// 资源处理器，在挂载时调用一次
///
/// 主资源的返回值会被忽略；具名资源的返回值以资源名存入 helpers。
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn mount(&self, resource: &ResourceConfig, scope: &mut MountScope<'_>)
        -> Result<Option<Helper>>;
}

struct FnResource<F>(F);

#[async_trait]
impl<F> ResourceHandler for FnResource<F>
where
    F: Fn(&ResourceConfig, &mut MountScope<'_>) -> Result<Option<Helper>> + Send + Sync + 'static,
{
    async fn mount(
        &self,
        resource: &ResourceConfig,
        scope: &mut MountScope<'_>,
    ) -> Result<Option<Helper>> {
        (self.0)(resource, scope)
    }
}

/// 以同步闭包定义资源处理器
pub fn resource_fn<F>(f: F) -> Arc<dyn ResourceHandler>
where
    F: Fn(&ResourceConfig, &mut MountScope<'_>) -> Result<Option<Helper>> + Send + Sync + 'static,
{
    Arc::new(FnResource(f))
}

/// 挂载期间暴露给资源处理器的流程视图
pub struct MountScope<'a> {
    flow_name: Option<&'a str>,
    mode: FlowMode,
    hooks: &'a mut FlowHooks,
}

impl<'a> MountScope<'a> {
    pub(crate) fn new(
        flow_name: Option<&'a str>,
        mode: FlowMode,
        hooks: &'a mut FlowHooks,
    ) -> Self {
        Self {
            flow_name,
            mode,
            hooks,
        }
    }

    pub fn flow_name(&self) -> Option<&str> {
        self.flow_name
    }

    pub fn mode(&self) -> FlowMode {
        self.mode
    }

    /// 替换默认的步骤执行器
    pub fn set_invoker(&mut self, invoker: Arc<dyn StepInvoker>) {
        self.hooks.invoker = Some(invoker);
    }

    pub fn set_remote_invoker(&mut self, remote: Arc<dyn RemoteInvoker>) {
        self.hooks.remote = Some(remote);
    }

    pub fn set_origin_processor(&mut self, origin: Arc<dyn OriginProcessor>) {
        self.hooks.origin = Some(origin);
    }
}

/// 挂载后注入到每个步骤的只读 helpers
#[derive(Clone, Default)]
pub struct Helpers {
    entries: HashMap<String, Helper>,
}

impl Helpers {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, helper: Helper) {
        self.entries.insert(name.into(), helper);
    }

    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        let helper = self.entries.get(name)?;
        Arc::clone(helper).downcast::<T>().ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 流程自带的 logger helper
#[derive(Clone, Debug, Default)]
pub struct FlowLogger {
    flow: String,
}

impl FlowLogger {
    pub fn new(flow: Option<&str>) -> Self {
        Self {
            flow: flow.unwrap_or("faasflow").to_string(),
        }
    }

    pub fn label(&self) -> &str {
        &self.flow
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(flow = %self.flow, "{message}");
    }

    pub fn info(&self, message: &str) {
        tracing::info!(flow = %self.flow, "{message}");
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(flow = %self.flow, "{message}");
    }

    pub fn error(&self, message: &str) {
        tracing::error!(flow = %self.flow, "{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_downcast_by_type() {
        let mut helpers = Helpers::new();
        helpers.insert("count", Arc::new(3u32));

        assert_eq!(helpers.get::<u32>("count").as_deref(), Some(&3));
        assert!(helpers.get::<String>("count").is_none());
        assert!(helpers.get::<u32>("missing").is_none());
    }

    #[test]
    fn logger_defaults_label() {
        assert_eq!(FlowLogger::new(None).label(), "faasflow");
        assert_eq!(FlowLogger::new(Some("orders")).label(), "orders");
    }
}
