use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use faasflow::{
    resource_fn, sync_step, Flow, FlowConfig, FlowError, FlowLogger, Helper, InvocationData,
    MountPhase, Origin, OriginProcessor, PluginRegistry, ResourceConfig, Stack, StepDefinition,
    StepInvoker, StepValue, TrackContext, TriggerConfig, TriggerHandler, LOGGER_HELPER,
};
use serde_json::{json, Value};

fn noop() -> StepDefinition {
    sync_step(|_, _| Ok(json!(true)))
}

fn counting_resource(counter: Arc<AtomicUsize>) -> ResourceConfig {
    ResourceConfig::new().with_handler(resource_fn(move |_resource, _scope| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }))
}

fn isolated(config: FlowConfig, steps: Vec<StepDefinition>) -> Arc<Flow> {
    let flow = Flow::builder(config)
        .steps(steps)
        .resolver(Arc::new(PluginRegistry::builtin()))
        .build()
        .expect("valid flow");
    Arc::new(flow)
}

async fn mount_error(config: FlowConfig) -> String {
    let flow = isolated(config, vec![noop()]);
    match flow.create_trigger(None::<&str>).call(json!({}), json!({})).await {
        Ok(_) => String::new(),
        Err(err) => err.to_string(),
    }
}

struct CustomTrigger;

#[async_trait]
impl TriggerHandler for CustomTrigger {
    async fn handle(
        &self,
        flow: &Flow,
        trigger: &TriggerConfig,
        data: InvocationData,
    ) -> faasflow::Result<StepValue> {
        let ran = flow.run(faasflow::StepIndex::All, data).await?;
        Ok(StepValue::Data(json!({
            "custom": true,
            "settings": trigger.settings,
            "ran": ran.to_json(),
        })))
    }
}

struct ConstantInvoker;

#[async_trait]
impl StepInvoker for ConstantInvoker {
    async fn invoke(
        &self,
        _flow: &Flow,
        _index: usize,
        _data: &InvocationData,
    ) -> faasflow::Result<StepValue> {
        Ok(StepValue::Data(json!("1")))
    }
}

struct FixedTrack;

#[async_trait]
impl OriginProcessor for FixedTrack {
    async fn process(&self, origin: Origin) -> faasflow::Result<InvocationData> {
        let context = TrackContext {
            track_id: "fixed-track".into(),
            history: Vec::new(),
            current: Stack {
                type_name: origin.type_name.clone(),
                id: "fixed-track".into(),
                time: 0,
            },
        };
        Ok(InvocationData {
            event: origin.event.clone().into(),
            context,
            type_name: origin.type_name.clone(),
            origin,
        })
    }
}

fn record_track() -> StepDefinition {
    sync_step(|event, ctx| {
        let mut tracks = event.data().and_then(Value::as_array).cloned().unwrap_or_default();
        tracks.push(json!([ctx.track_id(), ctx.context().current.type_name]));
        Ok(Value::Array(tracks))
    })
}

#[tokio::test]
async fn mounted_flag_flips_once() -> faasflow::Result<()> {
    let counter = Arc::new(AtomicUsize::new(0));
    let flow = isolated(
        FlowConfig::new().with_resource(counting_resource(Arc::clone(&counter))),
        vec![noop()],
    );
    let trigger = flow.create_trigger(None::<&str>);

    assert!(!flow.is_mounted());
    assert_eq!(flow.mount_phase(), MountPhase::Uninitialized);

    for _ in 0..3 {
        trigger.call(json!({}), json!({})).await?;
        assert!(flow.is_mounted());
    }
    assert_eq!(flow.mount_phase(), MountPhase::Ready);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_calls_mount_once() -> faasflow::Result<()> {
    let counter = Arc::new(AtomicUsize::new(0));
    let flow = isolated(
        FlowConfig::new().with_resource(counting_resource(Arc::clone(&counter))),
        vec![noop()],
    );

    let calls = (0..8).map(|_| {
        let trigger = flow.create_trigger(None::<&str>);
        tokio::spawn(async move { trigger.call(json!({}), json!({})).await })
    });
    for joined in futures::future::join_all(calls).await {
        let result = joined.map_err(|err| FlowError::Other(err.into()))??;
        assert_eq!(result, StepValue::Data(json!(true)));
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn primary_resource_errors() {
    assert_eq!(
        mount_error(FlowConfig::new().with_resource(ResourceConfig::new())).await,
        "Unknown resource type"
    );
    assert_eq!(
        mount_error(
            FlowConfig::new().with_resource(ResourceConfig::new().with_type("unknow"))
        )
        .await,
        "Unknown resource: unknow"
    );

    let invalid: ResourceConfig =
        serde_json::from_value(json!({ "handler": 1 })).expect("resource");
    assert_eq!(
        mount_error(FlowConfig::new().with_resource(invalid)).await,
        "Resource#function is not a function"
    );
}

#[tokio::test]
async fn trigger_errors() {
    assert_eq!(
        mount_error(FlowConfig::new().with_trigger("unknow", TriggerConfig::from(json!({})))).await,
        "Unknown trigger: unknow unknow"
    );
    assert_eq!(
        mount_error(
            FlowConfig::new().with_trigger("unknow", TriggerConfig::from(json!({ "handler": 1 })))
        )
        .await,
        "Trigger#unknow is not a function"
    );
    assert_eq!(
        mount_error(
            FlowConfig::new().with_trigger(
                "hook",
                TriggerConfig::from(json!({ "type": "webhook", "handler": 1 }))
            )
        )
        .await,
        "Trigger#hook<webhook> is not a function"
    );
}

#[tokio::test]
async fn named_resource_errors() {
    assert_eq!(
        mount_error(FlowConfig::new().with_named_resource("unknow", ResourceConfig::new())).await,
        "Unknown resource: unknow unknow"
    );
    let invalid: ResourceConfig =
        serde_json::from_value(json!({ "handler": 1 })).expect("resource");
    assert_eq!(
        mount_error(FlowConfig::new().with_named_resource("unknow", invalid)).await,
        "Resource#unknow is not a function"
    );
}

#[tokio::test]
async fn every_trigger_is_validated_before_resources_run() {
    let counter = Arc::new(AtomicUsize::new(0));
    let config = FlowConfig::new()
        .with_trigger("http", TriggerConfig::new())
        .with_trigger("missing", TriggerConfig::from(json!({})))
        .with_named_resource("cache", counting_resource(Arc::clone(&counter)));

    let err = mount_error(config).await;
    assert_eq!(err, "Unknown trigger: missing missing");
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_mount_is_not_retried() {
    let counter = Arc::new(AtomicUsize::new(0));
    let flow = isolated(
        FlowConfig::new()
            .with_resource(counting_resource(Arc::clone(&counter)))
            .with_trigger("unknow", TriggerConfig::from(json!({}))),
        vec![noop()],
    );
    let trigger = flow.create_trigger(None::<&str>);

    for _ in 0..2 {
        let err = trigger.call(json!({}), json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown trigger: unknow unknow");
        assert!(matches!(err.root(), FlowError::Trigger(_)));
    }
    assert!(!flow.is_mounted());
    assert_eq!(flow.mount_phase(), MountPhase::Failed);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn provider_can_replace_invoke() -> faasflow::Result<()> {
    let provider = resource_fn(|_resource, scope| {
        scope.set_invoker(Arc::new(ConstantInvoker));
        Ok(None)
    });
    let flow = isolated(
        FlowConfig::new().with_resource(ResourceConfig::new().with_handler(provider)),
        vec![noop()],
    );

    let result = flow.create_trigger(None::<&str>).call(json!({}), json!({})).await?;
    assert_eq!(result, StepValue::Data(json!("1")));
    Ok(())
}

#[tokio::test]
async fn provider_resolves_through_registry() -> faasflow::Result<()> {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(PluginRegistry::builtin());
    let seen = Arc::clone(&counter);
    registry.register_resource(
        "provider-local",
        resource_fn(move |resource, _scope| {
            assert_eq!(resource.type_name.as_deref(), Some("local"));
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }),
    );

    let config = FlowConfig::new().with_resource(ResourceConfig::new().with_type("local"));
    let flow = Flow::builder(config)
        .step(noop())
        .resolver(registry)
        .build()?;
    flow.mount().await?;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn provider_can_replace_origin_processing() -> faasflow::Result<()> {
    let provider = resource_fn(|_resource, scope| {
        scope.set_origin_processor(Arc::new(FixedTrack));
        Ok(None)
    });
    let flow = isolated(
        FlowConfig::new().with_resource(ResourceConfig::new().with_handler(provider)),
        vec![record_track(), record_track()],
    );

    let result = flow.create_trigger(None::<&str>).call(json!([]), json!({})).await?;
    assert_eq!(
        result,
        StepValue::Data(json!([["fixed-track", "invoke"], ["fixed-track", "invoke"]]))
    );
    Ok(())
}

#[tokio::test]
async fn helpers_are_visible_to_steps() -> faasflow::Result<()> {
    let config = FlowConfig::new().with_name("helpers").with_named_resource(
        "custom",
        ResourceConfig::new().with_handler(resource_fn(|resource, _scope| {
            let greeting = resource.config["greeting"].as_str().unwrap_or("hi").to_string();
            Ok(Some(Arc::new(greeting) as Helper))
        }))
        .with_config(json!({ "greeting": "hello" })),
    );
    let flow = isolated(
        config,
        vec![sync_step(|event, ctx| {
            let greeting = ctx.helper::<String>("custom").ok_or("custom helper missing")?;
            let logger = ctx.logger().ok_or("logger helper missing")?;
            logger.debug("greeting");
            let key = event.get("key").and_then(Value::as_str).unwrap_or("");
            Ok(json!(format!("{greeting} {key}")))
        })],
    );

    let result = flow.create_trigger(None::<&str>).call(json!({ "key": "key" }), json!({})).await?;
    assert_eq!(result, StepValue::Data(json!("hello key")));

    let helpers = flow.helpers();
    assert!(helpers.contains("custom"));
    let label = helpers
        .get::<FlowLogger>(LOGGER_HELPER)
        .map(|logger| logger.label().to_string());
    assert_eq!(label, Some("helpers".into()));
    Ok(())
}

#[tokio::test]
async fn custom_trigger_receives_processed_data() -> faasflow::Result<()> {
    let config = FlowConfig::new().with_trigger(
        "custom",
        TriggerConfig::new()
            .with_settings(json!({ "resource": {} }))
            .with_handler(Arc::new(CustomTrigger)),
    );
    let flow = isolated(config, vec![sync_step(|event, _| event.into_result())]);

    let result = flow.create_trigger("custom").call(json!(0), json!({})).await?;
    assert_eq!(
        result,
        StepValue::Data(json!({ "custom": true, "settings": { "resource": {} }, "ran": 0 }))
    );
    Ok(())
}

#[tokio::test]
async fn undeclared_trigger_is_not_found() {
    let flow = isolated(FlowConfig::new(), vec![noop()]);
    let err = flow.create_trigger("nope").call(json!({}), json!({})).await.unwrap_err();
    assert!(matches!(err, FlowError::NotFound(_)));
    assert_eq!(err.to_string(), "Trigger#nope not found");
}
