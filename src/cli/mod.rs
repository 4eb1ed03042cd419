use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{load_flow_from_path, FlowMode};
use crate::error::Result;
use crate::flow::Flow;
use crate::plugin::{default_registry, PluginName};
use crate::step::StepCatalog;
use crate::trigger::TriggerKind;

/// `check` 命令的输出
#[derive(Clone, Debug, Serialize)]
pub struct FlowSummary {
    pub name: Option<String>,
    pub mode: FlowMode,
    pub steps: usize,
    pub triggers: Vec<String>,
    pub helpers: Vec<String>,
}

/// 用内置步骤目录加载流程文档
pub fn load_flow_file(path: &Path) -> Result<Arc<Flow>> {
    let flow = load_flow_from_path(path, &StepCatalog::builtin())?;
    Ok(Arc::new(flow))
}

/// 挂载流程并汇总
pub async fn check_flow(flow: &Flow) -> Result<FlowSummary> {
    let mounted = flow.mount().await?;
    let mut helpers: Vec<_> = mounted.helpers().names().map(str::to_string).collect();
    helpers.sort();

    Ok(FlowSummary {
        name: flow.name().map(str::to_string),
        mode: flow.mode(),
        steps: flow.step_count(),
        triggers: flow.config().triggers.keys().cloned().collect(),
        helpers,
    })
}

pub fn plugin_names() -> Vec<PluginName> {
    default_registry().names()
}

/// 命令行中的触发类型：数字表示步骤位置，其余为触发器名
pub fn parse_trigger_kind(raw: Option<&str>) -> TriggerKind {
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(TriggerKind::from)
            .unwrap_or_else(|_| TriggerKind::from(raw.trim())),
        None => TriggerKind::default(),
    }
}
