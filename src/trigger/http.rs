use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::{FlowMode, TriggerConfig};
use crate::error::{FlowError, Result};
use crate::flow::Flow;
use crate::runtime::{InvocationData, StepIndex};
use crate::step::{StepFailure, StepValue};

use super::TriggerHandler;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// 参数来源位置
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamPosition {
    Header,
    Query,
    #[default]
    Body,
}

impl ParamPosition {
    fn key(self) -> &'static str {
        match self {
            ParamPosition::Header => "header",
            ParamPosition::Query => "query",
            ParamPosition::Body => "body",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParamRule {
    #[serde(default)]
    pub position: ParamPosition,
    #[serde(default)]
    pub required: bool,
}

/// HTTP 触发器的校验配置，参数按声明顺序校验
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub param: IndexMap<String, ParamRule>,
}

impl HttpSettings {
    /// 只有对象形式的触发器配置才参与校验，`true` 等标记返回 `None`
    pub fn from_trigger(trigger: &TriggerConfig) -> Result<Option<Self>> {
        if !trigger.settings.is_object() {
            return Ok(None);
        }
        serde_json::from_value(trigger.settings.clone())
            .map(Some)
            .map_err(|err| FlowError::Configuration(format!("Invalid http trigger: {err}")))
    }
}

#[derive(Debug, Default)]
struct HttpRequest {
    http_method: Option<String>,
    headers: Map<String, Value>,
    query_string: Option<Value>,
    body: Value,
}

impl HttpRequest {
    /// 逐个字段读取，形状不对的字段单独取默认值
    fn from_event(event: &StepValue) -> Self {
        let Some(Value::Object(event)) = event.data() else {
            return Self::default();
        };

        let http_method = match event.get("httpMethod") {
            Some(Value::String(method)) => Some(method.clone()),
            Some(Value::Null) | None => None,
            Some(other) => {
                debug!(method = %other, "ignoring non-string httpMethod");
                None
            }
        };
        let headers = match event.get("headers") {
            Some(Value::Object(headers)) => headers.clone(),
            _ => Map::new(),
        };
        let query_string = event
            .get("queryString")
            .filter(|query| !query.is_null())
            .cloned();

        Self {
            http_method,
            headers,
            query_string,
            body: event.get("body").cloned().unwrap_or_default(),
        }
    }

    fn is_json(&self) -> bool {
        header(&self.headers, CONTENT_TYPE)
            .and_then(Value::as_str)
            .map(|value| value.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false)
    }

    /// 解析为步骤输入 `{body, header, method, query, param}`
    fn into_input(self) -> std::result::Result<Map<String, Value>, StepFailure> {
        let is_json = self.is_json();
        let body = match self.body {
            Value::String(raw) if is_json => serde_json::from_str(&raw)
                .map_err(|err| StepFailure::new(format!("Invalid JSON body: {err}")))?,
            other => other,
        };

        let mut input = Map::new();
        input.insert("body".into(), body);
        input.insert("header".into(), Value::Object(self.headers));
        input.insert(
            "method".into(),
            self.http_method.map(Value::String).unwrap_or(Value::Null),
        );
        input.insert(
            "query".into(),
            self.query_string.unwrap_or_else(|| json!({})),
        );
        input.insert("param".into(), json!({}));
        Ok(input)
    }
}

fn header<'a>(headers: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    headers.get(name).or_else(|| {
        headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

fn validate(
    settings: &HttpSettings,
    input: &mut Map<String, Value>,
) -> std::result::Result<(), StepFailure> {
    if let Some(expected) = &settings.method {
        let actual = input.get("method").and_then(Value::as_str).unwrap_or_default();
        if !expected.eq_ignore_ascii_case(actual) {
            return Err(StepFailure::new("Wrong method"));
        }
    }

    let mut params = Map::new();
    for (name, rule) in &settings.param {
        let source = input.get(rule.position.key());
        let value = match (rule.position, source) {
            (ParamPosition::Header, Some(Value::Object(headers))) => header(headers, name),
            (_, Some(source)) => source.get(name.as_str()),
            (_, None) => None,
        }
        .filter(|value| !value.is_null());

        match value {
            Some(value) => {
                params.insert(name.clone(), value.clone());
            }
            None if rule.required => return Err(StepFailure::new(format!("{name} required"))),
            None => {}
        }
    }

    input.insert("param".into(), Value::Object(params));
    Ok(())
}

/// HTTP 响应信封
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl HttpResponse {
    fn new(status_code: u16, body: Option<Value>) -> Result<Self> {
        let mut headers = Map::new();
        headers.insert(CONTENT_TYPE.into(), Value::String(JSON_CONTENT_TYPE.into()));
        Ok(Self {
            status_code,
            headers,
            body: body.map(|body| stringify(&body)).transpose()?,
        })
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn json_body(&self) -> Result<Value> {
        match &self.body {
            Some(body) => Ok(serde_json::from_str(body)?),
            None => Ok(Value::Null),
        }
    }
}

fn stringify(value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}

/// 把步骤结果序列化为 HTTP 响应
pub fn into_response(result: &StepValue) -> Result<Value> {
    let response = match result {
        StepValue::Failure(failure) => HttpResponse::new(500, Some(failure.to_json()))?,
        empty if empty.is_empty() => HttpResponse::new(201, None)?,
        StepValue::Data(Value::Object(object)) if object.contains_key("statusCode") => {
            return passthrough(object.clone());
        }
        StepValue::Data(data) => HttpResponse::new(200, Some(json!({ "data": data })))?,
    };
    Ok(serde_json::to_value(response)?)
}

/// 步骤自己给出了 statusCode：原样返回，只补上 Content-Type 并序列化 body
fn passthrough(mut response: Map<String, Value>) -> Result<Value> {
    let mut headers = match response.remove("headers") {
        Some(Value::Object(headers)) => headers,
        _ => Map::new(),
    };
    headers.retain(|key, _| !key.eq_ignore_ascii_case(CONTENT_TYPE));
    headers.insert(CONTENT_TYPE.into(), Value::String(JSON_CONTENT_TYPE.into()));
    response.insert("headers".into(), Value::Object(headers));

    if let Some(body) = response.get_mut("body") {
        if !body.is_string() {
            *body = Value::String(stringify(body)?);
        }
    }
    Ok(Value::Object(response))
}

/// 内置的 HTTP 触发器
#[derive(Clone, Debug, Default)]
pub struct HttpTrigger;

#[async_trait]
impl TriggerHandler for HttpTrigger {
    async fn handle(
        &self,
        flow: &Flow,
        trigger: &TriggerConfig,
        mut data: InvocationData,
    ) -> Result<StepValue> {
        let settings = HttpSettings::from_trigger(trigger)?;
        let request = HttpRequest::from_event(&data.event);
        debug!(request = ?request, "http trigger begin");

        let checked = request.into_input().and_then(|mut input| {
            if let Some(settings) = &settings {
                validate(settings, &mut input)?;
            }
            Ok(input)
        });

        let result = match checked {
            Err(failure) => StepValue::Failure(failure),
            Ok(input) => {
                data.event = StepValue::Data(Value::Object(input));
                let result = flow.run(StepIndex::All, data).await?;
                match (flow.mode(), result) {
                    (FlowMode::Async, StepValue::Data(_)) => StepValue::Data(Value::Null),
                    (_, result) => result,
                }
            }
        };

        let response = into_response(&result)?;
        debug!(response = %response, "http trigger end");
        Ok(StepValue::Data(response))
    }
}
