use serde::ser::{Serialize, Serializer};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::error::FlowError;

pub type StepResult = std::result::Result<Value, StepFailure>;

/// 步骤抛出的错误，作为该步骤的结果继续向下游传递
#[derive(Clone, Debug, PartialEq, Error, serde::Serialize, Deserialize)]
#[error("{message}")]
pub struct StepFailure {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl StepFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    /// `{"error":{"message": ...}}` 形式
    pub fn to_json(&self) -> Value {
        json!({ "error": { "message": self.message } })
    }
}

impl From<anyhow::Error> for StepFailure {
    fn from(error: anyhow::Error) -> Self {
        StepFailure::new(error.to_string())
    }
}

impl From<serde_json::Error> for StepFailure {
    fn from(error: serde_json::Error) -> Self {
        StepFailure::new(error.to_string())
    }
}

impl From<FlowError> for StepFailure {
    fn from(error: FlowError) -> Self {
        StepFailure::new(error.to_string())
    }
}

impl From<&str> for StepFailure {
    fn from(message: &str) -> Self {
        StepFailure::new(message)
    }
}

impl From<String> for StepFailure {
    fn from(message: String) -> Self {
        StepFailure::new(message)
    }
}

/// 在步骤之间流动的值：正常数据或被捕获的失败
#[derive(Clone, Debug, PartialEq)]
pub enum StepValue {
    Data(Value),
    Failure(StepFailure),
}

impl StepValue {
    pub fn data(&self) -> Option<&Value> {
        match self {
            StepValue::Data(value) => Some(value),
            StepValue::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&StepFailure> {
        match self {
            StepValue::Failure(failure) => Some(failure),
            StepValue::Data(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StepValue::Failure(_))
    }

    /// `Data(null)`，即没有可报告的结果
    pub fn is_empty(&self) -> bool {
        matches!(self, StepValue::Data(Value::Null))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data().and_then(|value| value.get(key))
    }

    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.data().and_then(|value| value.pointer(pointer))
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.data().and_then(Value::as_i64)
    }

    pub fn into_result(self) -> StepResult {
        match self {
            StepValue::Data(value) => Ok(value),
            StepValue::Failure(failure) => Err(failure),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            StepValue::Data(value) => value.clone(),
            StepValue::Failure(failure) => failure.to_json(),
        }
    }
}

impl Default for StepValue {
    fn default() -> Self {
        StepValue::Data(Value::Null)
    }
}

impl From<Value> for StepValue {
    fn from(value: Value) -> Self {
        StepValue::Data(value)
    }
}

impl From<StepFailure> for StepValue {
    fn from(failure: StepFailure) -> Self {
        StepValue::Failure(failure)
    }
}

impl From<StepResult> for StepValue {
    fn from(result: StepResult) -> Self {
        match result {
            Ok(value) => StepValue::Data(value),
            Err(failure) => StepValue::Failure(failure),
        }
    }
}

impl Serialize for StepValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StepValue::Data(value) => value.serialize(serializer),
            StepValue::Failure(failure) => failure.to_json().serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_serializes_as_error_envelope() {
        let value = StepValue::from(StepFailure::new("boom"));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"error":{"message":"boom"}}"#
        );
    }

    #[test]
    fn result_conversion_keeps_the_failure() {
        let value = StepValue::from(Err::<Value, _>(StepFailure::from("step")));
        assert_eq!(value.failure().map(|f| f.message.as_str()), Some("step"));
        assert!(value.data().is_none());
    }
}
