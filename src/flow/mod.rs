pub mod builder;
pub mod mount;

use std::sync::Arc;

use crate::config::{FlowConfig, FlowMode};
use crate::error::Result;
use crate::plugin::PluginResolver;
use crate::resource::Helpers;
use crate::runtime::{
    invoke_async, invoke_sync, DefaultOriginProcessor, InvocationData, LocalInvoker, Origin,
    OriginProcessor, RemoteInvoker, StepIndex, StepInvoker, UnboundRemoteInvoker,
};
use crate::step::{Step, StepDefinition, StepValue};
use crate::trigger::{TriggerEntry, TriggerKind};

pub use builder::FlowBuilder;
pub use mount::{FlowHooks, MountPhase, Mounted};

use mount::MountGuard;

/// 流程：有序步骤 + 触发器 + 资源
///
/// 步骤在构造后不可变；挂载在第一次触发时惰性执行且只执行一次。
pub struct Flow {
    name: Option<Arc<str>>,
    mode: FlowMode,
    steps: Vec<Step>,
    config: FlowConfig,
    resolver: Arc<dyn PluginResolver>,
    mount: MountGuard,
}

impl Flow {
    pub fn new(config: FlowConfig, steps: Vec<StepDefinition>) -> Result<Self> {
        FlowBuilder::new(config).steps(steps).build()
    }

    pub fn builder(config: FlowConfig) -> FlowBuilder {
        FlowBuilder::new(config)
    }

    pub(crate) fn from_parts(
        config: FlowConfig,
        steps: Vec<Step>,
        resolver: Arc<dyn PluginResolver>,
    ) -> Self {
        Self {
            name: config.name.as_deref().map(Arc::from),
            mode: config.mode,
            steps,
            config,
            resolver,
            mount: MountGuard::default(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn shared_name(&self) -> Option<Arc<str>> {
        self.name.clone()
    }

    pub fn mode(&self) -> FlowMode {
        self.mode
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<dyn PluginResolver> {
        &self.resolver
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.get().is_some()
    }

    pub fn mount_phase(&self) -> MountPhase {
        self.mount.phase()
    }

    /// 挂载；重复调用直接返回第一次的结果
    pub async fn mount(&self) -> Result<Arc<Mounted>> {
        self.mount.get_or_mount(self).await
    }

    /// 挂载后的 helpers，未挂载时为空
    pub fn helpers(&self) -> Arc<Helpers> {
        self.mount
            .get()
            .map(|mounted| Arc::clone(mounted.helpers()))
            .unwrap_or_default()
    }

    fn hooks(&self) -> Option<&FlowHooks> {
        self.mount.get().map(|mounted| mounted.hooks())
    }

    fn invoker(&self) -> Arc<dyn StepInvoker> {
        self.hooks()
            .and_then(|hooks| hooks.invoker.clone())
            .unwrap_or_else(|| Arc::new(LocalInvoker))
    }

    /// 立即执行指定位置的步骤
    pub async fn invoke(&self, index: usize, data: &InvocationData) -> Result<StepValue> {
        self.invoker().invoke(self, index, data).await
    }

    /// 依次执行全部步骤，返回每个位置的结果
    pub async fn invoke_each(&self, mut data: InvocationData) -> Result<Vec<StepValue>> {
        let mut results = Vec::with_capacity(self.steps.len());
        for index in 0..self.steps.len() {
            data.event = self.invoke(index, &data).await?;
            results.push(data.event.clone());
        }
        Ok(results)
    }

    /// 异步远程执行步骤
    pub async fn remote_invoke(&self, index: usize, data: &InvocationData) -> Result<()> {
        let remote: Arc<dyn RemoteInvoker> = self
            .hooks()
            .and_then(|hooks| hooks.remote.clone())
            .unwrap_or_else(|| Arc::new(UnboundRemoteInvoker));
        remote.remote_invoke(self, index, data).await
    }

    /// 处理服务商原始数据
    pub async fn process_origin(&self, origin: Origin) -> Result<InvocationData> {
        let processor: Arc<dyn OriginProcessor> = self
            .hooks()
            .and_then(|hooks| hooks.origin.clone())
            .unwrap_or_else(|| Arc::new(DefaultOriginProcessor));
        processor.process(origin).await
    }

    /// 按执行模式运行内置的 invoke 策略
    pub async fn run(&self, index: StepIndex, data: InvocationData) -> Result<StepValue> {
        match self.mode {
            FlowMode::Sync => invoke_sync(self, index, data).await,
            FlowMode::Async => invoke_async(self, index, data).await,
        }
    }

    /// 创建触发函数
    pub fn create_trigger(self: &Arc<Self>, kind: impl Into<TriggerKind>) -> TriggerEntry {
        TriggerEntry::new(Arc::clone(self), kind.into())
    }
}
