use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::flow::{Flow, FlowBuilder};
use crate::step::StepCatalog;

use super::{EnvConfig, FlowConfig};

/// 流程文档：流程配置加上按名称引用的步骤列表
///
/// ```json
/// {
///   "name": "orders",
///   "mode": "sync",
///   "triggers": { "http": { "method": "POST" } },
///   "steps": ["params", { "handler": "passthrough" }]
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FlowDocument {
    #[serde(flatten)]
    pub config: FlowConfig,
    #[serde(default)]
    pub steps: Vec<Value>,
}

impl FlowDocument {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// 按目录解析步骤并应用当前进程的环境变量覆盖
    pub fn into_builder(self, catalog: &StepCatalog) -> FlowBuilder {
        self.into_builder_with_env(catalog, &EnvConfig::from_env())
    }

    pub fn into_builder_with_env(self, catalog: &StepCatalog, env: &EnvConfig) -> FlowBuilder {
        let steps = self.steps.iter().map(|entry| catalog.resolve(entry));
        FlowBuilder::new(self.config.apply_env(env)).steps(steps)
    }

    pub fn into_flow(self, catalog: &StepCatalog) -> Result<Flow> {
        self.into_builder(catalog).build()
    }
}

pub fn load_flow_from_str(content: &str, catalog: &StepCatalog) -> Result<Flow> {
    FlowDocument::parse(content)?.into_flow(catalog)
}

pub fn load_flow_from_value(value: Value, catalog: &StepCatalog) -> Result<Flow> {
    FlowDocument::from_value(value)?.into_flow(catalog)
}

pub fn load_flow_from_path(path: impl AsRef<Path>, catalog: &StepCatalog) -> Result<Flow> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "loading flow document");
    let content = fs::read_to_string(path)?;
    load_flow_from_str(&content, catalog)
}
