use async_trait::async_trait;
use faasflow::{
    Flow, FlowConfig, FlowError, InvocationData, StepContext, StepDefinition, StepFailure,
    StepHandler, StepResult, StepValue, step_fn, sync_step,
};
use serde_json::json;

struct DoubleStep;

#[async_trait]
impl StepHandler for DoubleStep {
    async fn handle(&self, event: StepValue, _ctx: StepContext) -> StepResult {
        Ok(json!(event.as_i64().unwrap_or_default() * 2))
    }
}

fn construction_error(steps: Vec<StepDefinition>) -> String {
    match Flow::new(FlowConfig::new(), steps) {
        Ok(_) => String::new(),
        Err(err) => err.to_string(),
    }
}

#[test]
fn flow_requires_a_step() {
    assert_eq!(construction_error(Vec::new()), "Step required");
}

#[test]
fn empty_slot_is_unknown_step() {
    assert_eq!(
        construction_error(vec![StepDefinition::Empty]),
        "Unknown step#0"
    );
    assert_eq!(
        construction_error(vec![
            sync_step(|event, _| event.into_result()),
            None::<StepDefinition>.into(),
        ]),
        "Unknown step#1"
    );
}

#[test]
fn unsupported_declaration_has_unknown_type() {
    let err = Flow::new(
        FlowConfig::new(),
        vec![StepDefinition::Unsupported("object without handler".into())],
    )
    .err();
    assert!(matches!(err, Some(FlowError::Configuration(_))));
    assert_eq!(
        err.map(|err| err.to_string()).unwrap_or_default(),
        "Unknown step#0's type"
    );
}

#[tokio::test]
async fn record_step_is_accepted() -> faasflow::Result<()> {
    let flow = Flow::new(FlowConfig::new(), vec![StepDefinition::record(DoubleStep)])?;
    let result = flow.invoke(0, &InvocationData::new(json!(21))).await?;
    assert_eq!(result, StepValue::Data(json!(42)));
    Ok(())
}

#[tokio::test]
async fn thrown_error_becomes_the_result() -> faasflow::Result<()> {
    let flow = Flow::new(
        FlowConfig::new(),
        vec![step_fn(|_event, _ctx| async {
            Err::<serde_json::Value, _>(StepFailure::new("step"))
        })],
    )?;

    let result = flow.invoke(0, &InvocationData::default()).await?;
    assert_eq!(result.failure().map(|f| f.message.as_str()), Some("step"));
    Ok(())
}

#[tokio::test]
async fn downstream_step_receives_upstream_failure() -> faasflow::Result<()> {
    let flow = Flow::new(
        FlowConfig::new(),
        vec![
            sync_step(|_, _| Err(StepFailure::new("upstream"))),
            sync_step(|event, _| match event {
                StepValue::Failure(failure) => Ok(json!({ "recovered": failure.message })),
                StepValue::Data(_) => Ok(json!("unexpected")),
            }),
        ],
    )?;

    let results = flow.invoke_each(InvocationData::default()).await?;
    assert!(results[0].is_failure());
    assert_eq!(results[1], StepValue::Data(json!({ "recovered": "upstream" })));
    Ok(())
}
