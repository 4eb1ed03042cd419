use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::resource::ResourceHandler;
use crate::trigger::{HttpTrigger, TriggerHandler};

/// 按类型名查找触发器和资源处理器
///
/// 挂载时会先查找带命名空间的名称（`trigger-<type>` / `provider-<type>`），再查找原始名称。
pub trait PluginResolver: Send + Sync {
    fn resolve_trigger(&self, name: &str) -> Option<Arc<dyn TriggerHandler>>;
    fn resolve_resource(&self, name: &str) -> Option<Arc<dyn ResourceHandler>>;
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Trigger,
    Provider,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct PluginName {
    pub kind: PluginKind,
    pub name: String,
}

/// 内存插件注册表
#[derive(Default)]
pub struct PluginRegistry {
    triggers: RwLock<HashMap<String, Arc<dyn TriggerHandler>>>,
    resources: RwLock<HashMap<String, Arc<dyn ResourceHandler>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预先注册了 `trigger-http`
    pub fn builtin() -> Self {
        let registry = Self::new();
        registry.register_trigger("trigger-http", Arc::new(HttpTrigger));
        registry
    }

    pub fn register_trigger(&self, name: impl Into<String>, handler: Arc<dyn TriggerHandler>) {
        let name = name.into();
        tracing::debug!(plugin = %name, "trigger plugin registered");
        self.triggers.write().insert(name, handler);
    }

    pub fn register_resource(&self, name: impl Into<String>, handler: Arc<dyn ResourceHandler>) {
        let name = name.into();
        tracing::debug!(plugin = %name, "provider plugin registered");
        self.resources.write().insert(name, handler);
    }

    pub fn names(&self) -> Vec<PluginName> {
        let mut names: Vec<PluginName> = self
            .triggers
            .read()
            .keys()
            .map(|name| PluginName {
                kind: PluginKind::Trigger,
                name: name.clone(),
            })
            .collect();
        names.extend(self.resources.read().keys().map(|name| PluginName {
            kind: PluginKind::Provider,
            name: name.clone(),
        }));
        names.sort();
        names
    }
}

impl PluginResolver for PluginRegistry {
    fn resolve_trigger(&self, name: &str) -> Option<Arc<dyn TriggerHandler>> {
        self.triggers.read().get(name).map(Arc::clone)
    }

    fn resolve_resource(&self, name: &str) -> Option<Arc<dyn ResourceHandler>> {
        self.resources.read().get(name).map(Arc::clone)
    }
}

static DEFAULT_REGISTRY: Lazy<Arc<PluginRegistry>> =
    Lazy::new(|| Arc::new(PluginRegistry::builtin()));

/// 未指定解析器时 Flow 使用的全局注册表
pub fn default_registry() -> Arc<PluginRegistry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

pub fn register_trigger(name: impl Into<String>, handler: Arc<dyn TriggerHandler>) {
    DEFAULT_REGISTRY.register_trigger(name, handler);
}

pub fn register_resource(name: impl Into<String>, handler: Arc<dyn ResourceHandler>) {
    DEFAULT_REGISTRY.register_resource(name, handler);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_resolves_http() {
        let registry = PluginRegistry::builtin();
        assert!(registry.resolve_trigger("trigger-http").is_some());
        assert!(registry.resolve_trigger("http").is_none());
        assert!(registry.resolve_resource("provider-http").is_none());
    }

    #[test]
    fn names_are_sorted_by_kind() {
        let registry = PluginRegistry::builtin();
        registry.register_trigger("trigger-cron", Arc::new(HttpTrigger));
        let names: Vec<_> = registry.names().into_iter().map(|entry| entry.name).collect();
        assert_eq!(names, vec!["trigger-cron", "trigger-http"]);
    }
}
