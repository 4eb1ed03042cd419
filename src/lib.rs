pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod plugin;
pub mod resource;
pub mod runtime;
pub mod step;
pub mod trigger;
pub mod utils;

pub use config::{
    load_flow_from_path, load_flow_from_str, load_flow_from_value, EnvConfig, FlowConfig,
    FlowDocument, FlowMode, HandlerSlot, ResourceConfig, TriggerConfig,
};
pub use error::{FlowError, Result};
pub use flow::{Flow, FlowBuilder, FlowHooks, MountPhase, Mounted};
pub use plugin::{
    default_registry, register_resource, register_trigger, PluginKind, PluginName,
    PluginRegistry, PluginResolver,
};
pub use resource::{
    resource_fn, FlowLogger, Helper, Helpers, MountScope, ResourceHandler, LOGGER_HELPER,
};
pub use runtime::{
    invoke_async, invoke_sync, DefaultOriginProcessor, InvocationData, LocalInvoker, Origin,
    OriginProcessor, RemoteInvoker, Stack, StepContext, StepIndex, StepInvoker, TrackContext,
    UnboundRemoteInvoker,
};
pub use step::{
    normalize_steps, step_fn, sync_step, Step, StepCatalog, StepDefinition, StepFailure,
    StepHandler, StepResult, StepValue,
};
pub use trigger::{
    HttpResponse, HttpSettings, HttpTrigger, ParamPosition, ParamRule, TriggerEntry,
    TriggerHandler, TriggerKind,
};
pub use utils::logging;
