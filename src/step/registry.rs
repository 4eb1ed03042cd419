use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::{FlowError, Result};

use super::{sync_step, Step, StepFn, StepHandler};

/// 调用方提供的步骤定义，在构造时一次性解析
#[derive(Clone)]
pub enum StepDefinition {
    Callable(StepFn),
    Record(Arc<dyn StepHandler>),
    /// 空位（例如文档中的 `null`）
    Empty,
    /// 形状不对的声明，保存其描述
    Unsupported(String),
}

impl StepDefinition {
    pub fn record(handler: impl StepHandler + 'static) -> Self {
        StepDefinition::Record(Arc::new(handler))
    }
}

impl From<Arc<dyn StepHandler>> for StepDefinition {
    fn from(handler: Arc<dyn StepHandler>) -> Self {
        StepDefinition::Record(handler)
    }
}

impl<T: Into<StepDefinition>> From<Option<T>> for StepDefinition {
    fn from(definition: Option<T>) -> Self {
        definition.map(Into::into).unwrap_or(StepDefinition::Empty)
    }
}

/// 校验并规范化步骤列表
pub fn normalize_steps(definitions: Vec<StepDefinition>) -> Result<Vec<Step>> {
    if definitions.is_empty() {
        return Err(FlowError::Configuration("Step required".to_string()));
    }

    definitions
        .into_iter()
        .enumerate()
        .map(|(index, definition)| match definition {
            StepDefinition::Callable(callable) => Ok(Step::from_callable(callable)),
            StepDefinition::Record(handler) => Ok(Step::from_record(handler)),
            StepDefinition::Empty => Err(FlowError::Configuration(format!("Unknown step#{index}"))),
            StepDefinition::Unsupported(kind) => {
                tracing::debug!(step = index, %kind, "unsupported step declaration");
                Err(FlowError::Configuration(format!(
                    "Unknown step#{index}'s type"
                )))
            }
        })
        .collect()
}

/// 按名称登记的步骤，供流程文档引用
#[derive(Clone, Default)]
pub struct StepCatalog {
    steps: HashMap<String, StepDefinition>,
}

impl StepCatalog {
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
        }
    }

    /// 内置步骤：`passthrough` 原样返回输入，`params` 返回 `event.param`
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(
            "passthrough",
            sync_step(|event, _ctx| event.into_result()),
        );
        catalog.register(
            "params",
            sync_step(|event, _ctx| {
                let event = event.into_result()?;
                Ok(event.get("param").cloned().unwrap_or_else(|| json!({})))
            }),
        );
        catalog
    }

    pub fn register(&mut self, name: impl Into<String>, definition: StepDefinition) {
        self.steps.insert(name.into(), definition);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// 把文档中的一个步骤条目解析为定义：字符串或 `{"handler": "<name>"}`
    pub fn resolve(&self, entry: &Value) -> StepDefinition {
        match entry {
            Value::Null => StepDefinition::Empty,
            Value::String(name) => self.lookup(name),
            Value::Object(object) => match object.get("handler") {
                Some(Value::String(name)) => self.lookup(name),
                Some(other) => StepDefinition::Unsupported(format!("handler {other}")),
                None => StepDefinition::Unsupported("object without handler".to_string()),
            },
            other => StepDefinition::Unsupported(other.to_string()),
        }
    }

    fn lookup(&self, name: &str) -> StepDefinition {
        self.steps.get(name).cloned().unwrap_or_else(|| {
            tracing::warn!(step = %name, "step not registered in catalog");
            StepDefinition::Empty
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definitions(entries: Value) -> Vec<StepDefinition> {
        let catalog = StepCatalog::builtin();
        entries
            .as_array()
            .map(|items| items.iter().map(|item| catalog.resolve(item)).collect())
            .unwrap_or_default()
    }

    fn error_message(result: Result<Vec<Step>>) -> String {
        match result {
            Ok(_) => String::new(),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn empty_list_requires_a_step() {
        assert_eq!(error_message(normalize_steps(Vec::new())), "Step required");
    }

    #[test]
    fn null_entry_is_unknown() {
        let result = normalize_steps(definitions(json!(["passthrough", null])));
        assert_eq!(error_message(result), "Unknown step#1");
    }

    #[test]
    fn object_without_handler_has_unknown_type() {
        let result = normalize_steps(definitions(json!([{}])));
        assert_eq!(error_message(result), "Unknown step#0's type");
    }

    #[test]
    fn named_entries_resolve_against_catalog() {
        let steps = normalize_steps(definitions(json!(["passthrough", {"handler": "params"}])));
        assert_eq!(steps.map(|steps| steps.len()).unwrap_or_default(), 2);
    }

    #[test]
    fn option_none_becomes_empty_slot() {
        let definition = StepDefinition::from(None::<StepDefinition>);
        assert!(matches!(definition, StepDefinition::Empty));
    }
}
