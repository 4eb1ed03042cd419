use std::sync::Arc;

use tracing::debug;

use crate::config::FlowConfig;
use crate::error::Result;
use crate::plugin::{default_registry, PluginResolver};
use crate::step::{normalize_steps, StepDefinition};

use super::Flow;

/// Flow 构建器
pub struct FlowBuilder {
    config: FlowConfig,
    steps: Vec<StepDefinition>,
    resolver: Option<Arc<dyn PluginResolver>>,
}

impl FlowBuilder {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            config,
            steps: Vec::new(),
            resolver: None,
        }
    }

    pub fn step(mut self, step: impl Into<StepDefinition>) -> Self {
        self.steps.push(step.into());
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = StepDefinition>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// 使用指定的插件解析器，默认使用全局注册表
    pub fn resolver(mut self, resolver: Arc<dyn PluginResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> Result<Flow> {
        let steps = normalize_steps(self.steps)?;
        let resolver = self
            .resolver
            .unwrap_or_else(|| default_registry() as Arc<dyn PluginResolver>);

        debug!(
            flow = ?self.config.name,
            mode = %self.config.mode,
            steps = steps.len(),
            "flow created"
        );
        Ok(Flow::from_parts(self.config, steps, resolver))
    }
}
