use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{FlowConfig, HandlerSlot, ResourceConfig, TriggerConfig};
use crate::error::{FlowError, Result};
use crate::plugin::PluginResolver;
use crate::resource::{FlowLogger, Helpers, MountScope, ResourceHandler, LOGGER_HELPER};
use crate::runtime::{OriginProcessor, RemoteInvoker, StepInvoker};
use crate::trigger::TriggerHandler;

use super::Flow;

const TRIGGER_NAMESPACE: &str = "trigger";
const PROVIDER_NAMESPACE: &str = "provider";

/// 主资源在挂载时可以安装的钩子
#[derive(Clone, Default)]
pub struct FlowHooks {
    pub invoker: Option<Arc<dyn StepInvoker>>,
    pub remote: Option<Arc<dyn RemoteInvoker>>,
    pub origin: Option<Arc<dyn OriginProcessor>>,
}

/// 挂载完成后的流程状态
pub struct Mounted {
    triggers: HashMap<String, Arc<dyn TriggerHandler>>,
    helpers: Arc<Helpers>,
    hooks: FlowHooks,
}

impl Mounted {
    pub fn trigger(&self, name: &str) -> Option<Arc<dyn TriggerHandler>> {
        self.triggers.get(name).map(Arc::clone)
    }

    pub fn helpers(&self) -> &Arc<Helpers> {
        &self.helpers
    }

    pub fn hooks(&self) -> &FlowHooks {
        &self.hooks
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountPhase {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// 一次性挂载：成功后常驻，失败后记录错误且不再重试
#[derive(Default)]
pub(crate) struct MountGuard {
    ready: OnceCell<Arc<Mounted>>,
    failed: OnceCell<Arc<FlowError>>,
    gate: Mutex<()>,
}

impl MountGuard {
    pub(crate) fn get(&self) -> Option<&Arc<Mounted>> {
        self.ready.get()
    }

    pub(crate) fn phase(&self) -> MountPhase {
        if self.ready.get().is_some() {
            MountPhase::Ready
        } else if self.failed.get().is_some() {
            MountPhase::Failed
        } else if self.gate.try_lock().is_err() {
            MountPhase::Initializing
        } else {
            MountPhase::Uninitialized
        }
    }

    pub(crate) async fn get_or_mount(&self, flow: &Flow) -> Result<Arc<Mounted>> {
        if let Some(mounted) = self.ready.get() {
            return Ok(Arc::clone(mounted));
        }

        let _gate = self.gate.lock().await;
        if let Some(mounted) = self.ready.get() {
            return Ok(Arc::clone(mounted));
        }
        if let Some(error) = self.failed.get() {
            return Err(FlowError::Mount(Arc::clone(error)));
        }

        match mount(flow).await {
            Ok(mounted) => {
                let mounted = Arc::new(mounted);
                let _ = self.ready.set(Arc::clone(&mounted));
                Ok(mounted)
            }
            Err(error) => {
                let error = Arc::new(error);
                let _ = self.failed.set(Arc::clone(&error));
                Err(FlowError::Mount(error))
            }
        }
    }
}

async fn mount(flow: &Flow) -> Result<Mounted> {
    debug!(flow = ?flow.name(), "mount begin");

    let config = flow.config();
    let resolver = flow.resolver().as_ref();
    let mut hooks = FlowHooks::default();

    if let Some(resource) = &config.resource {
        let handler = resolve_primary(resource, resolver)?;
        let mut scope = MountScope::new(flow.name(), flow.mode(), &mut hooks);
        handler.mount(resource, &mut scope).await?;
        debug!("resource#function mounted");
    }

    let triggers = resolve_triggers(config, resolver)?;

    let mut resources = Vec::with_capacity(config.resources.len());
    for (key, resource) in &config.resources {
        resources.push((key, resource, resolve_resource(key, resource, resolver)?));
        debug!(resource = %key, "resource mounted");
    }

    let mut helpers = Helpers::new();
    helpers.insert(LOGGER_HELPER, Arc::new(FlowLogger::new(flow.name())));
    for (key, resource, handler) in resources {
        let mut scope = MountScope::new(flow.name(), flow.mode(), &mut hooks);
        if let Some(helper) = handler.mount(resource, &mut scope).await? {
            helpers.insert(key.clone(), helper);
        }
        debug!(helper = %key, "helper mounted");
    }

    debug!(flow = ?flow.name(), "mount done");
    Ok(Mounted {
        triggers,
        helpers: Arc::new(helpers),
        hooks,
    })
}

fn resolve_triggers(
    config: &FlowConfig,
    resolver: &dyn PluginResolver,
) -> Result<HashMap<String, Arc<dyn TriggerHandler>>> {
    let mut triggers = HashMap::with_capacity(config.triggers.len());
    for (key, trigger) in &config.triggers {
        triggers.insert(key.clone(), resolve_trigger(key, trigger, resolver)?);
        debug!(trigger = %key, "trigger mounted");
    }
    Ok(triggers)
}

enum Resolution<H: ?Sized> {
    Found(Arc<H>),
    Missing(String),
    Invalid,
}

fn resolve_slot<H: ?Sized>(
    slot: &HandlerSlot<H>,
    type_path: Option<&str>,
    namespace: &str,
    lookup: impl Fn(&str) -> Option<Arc<H>>,
) -> Option<Resolution<H>> {
    let name = match slot {
        HandlerSlot::Bound(handler) => return Some(Resolution::Found(Arc::clone(handler))),
        HandlerSlot::Invalid(_) => return Some(Resolution::Invalid),
        HandlerSlot::Named(name) => name.as_str(),
        HandlerSlot::Unset => type_path?,
    };

    let found = lookup(&format!("{namespace}-{name}")).or_else(|| lookup(name));
    Some(match found {
        Some(handler) => Resolution::Found(handler),
        None => Resolution::Missing(name.to_string()),
    })
}

fn described(key: &str, declared: Option<&str>) -> String {
    match declared {
        Some(declared) => format!("{key}<{declared}>"),
        None => key.to_string(),
    }
}

fn resolve_primary(
    resource: &ResourceConfig,
    resolver: &dyn PluginResolver,
) -> Result<Arc<dyn ResourceHandler>> {
    let declared = resource.type_name.as_deref();
    let resolution = resolve_slot(&resource.handler, declared, PROVIDER_NAMESPACE, |name| {
        resolver.resolve_resource(name)
    });

    match resolution {
        None => Err(FlowError::Resource("Unknown resource type".to_string())),
        Some(Resolution::Found(handler)) => Ok(handler),
        Some(Resolution::Missing(type_path)) => {
            Err(FlowError::Resource(format!("Unknown resource: {type_path}")))
        }
        Some(Resolution::Invalid) => Err(FlowError::Resource(format!(
            "Resource#{} is not a function",
            described("function", declared)
        ))),
    }
}

fn resolve_trigger(
    key: &str,
    trigger: &TriggerConfig,
    resolver: &dyn PluginResolver,
) -> Result<Arc<dyn TriggerHandler>> {
    let declared = trigger.declared_type();
    let type_path = declared.unwrap_or(key);
    let resolution = resolve_slot(&trigger.handler, Some(type_path), TRIGGER_NAMESPACE, |name| {
        resolver.resolve_trigger(name)
    });

    match resolution {
        Some(Resolution::Found(handler)) => Ok(handler),
        Some(Resolution::Missing(type_path)) => Err(FlowError::Trigger(format!(
            "Unknown trigger: {key} {type_path}"
        ))),
        Some(Resolution::Invalid) | None => Err(FlowError::Trigger(format!(
            "Trigger#{} is not a function",
            described(key, declared)
        ))),
    }
}

fn resolve_resource(
    key: &str,
    resource: &ResourceConfig,
    resolver: &dyn PluginResolver,
) -> Result<Arc<dyn ResourceHandler>> {
    let declared = resource.type_name.as_deref();
    let type_path = declared.unwrap_or(key);
    let resolution = resolve_slot(&resource.handler, Some(type_path), PROVIDER_NAMESPACE, |name| {
        resolver.resolve_resource(name)
    });

    match resolution {
        Some(Resolution::Found(handler)) => Ok(handler),
        Some(Resolution::Missing(type_path)) => Err(FlowError::Resource(format!(
            "Unknown resource: {key} {type_path}"
        ))),
        Some(Resolution::Invalid) | None => Err(FlowError::Resource(format!(
            "Resource#{} is not a function",
            described(key, declared)
        ))),
    }
}
