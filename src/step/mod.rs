pub mod registry;
pub mod value;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};

use crate::runtime::StepContext;

pub use registry::{normalize_steps, StepCatalog, StepDefinition};
pub use value::{StepFailure, StepResult, StepValue};

/// 步骤处理器
///
/// 返回 `Err` 等同于步骤抛出错误：调用方会把它作为该步骤的结果，而不是向上传播。
#[async_trait]
pub trait StepHandler: Send + Sync {
    async fn handle(&self, event: StepValue, ctx: StepContext) -> StepResult;
}

pub type StepFn =
    Arc<dyn Fn(StepValue, StepContext) -> BoxFuture<'static, StepResult> + Send + Sync>;

struct FnStep(StepFn);

#[async_trait]
impl StepHandler for FnStep {
    async fn handle(&self, event: StepValue, ctx: StepContext) -> StepResult {
        (self.0)(event, ctx).await
    }
}

/// 规范化后的步骤，只以位置作为标识
#[derive(Clone)]
pub struct Step {
    handler: Arc<dyn StepHandler>,
}

impl Step {
    pub(crate) fn from_callable(callable: StepFn) -> Self {
        Self {
            handler: Arc::new(FnStep(callable)),
        }
    }

    pub(crate) fn from_record(handler: Arc<dyn StepHandler>) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &Arc<dyn StepHandler> {
        &self.handler
    }
}

/// 以异步闭包定义步骤
pub fn step_fn<F, Fut>(f: F) -> StepDefinition
where
    F: Fn(StepValue, StepContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StepResult> + Send + 'static,
{
    StepDefinition::Callable(Arc::new(move |event: StepValue, ctx: StepContext| {
        f(event, ctx).boxed()
    }))
}

/// 以同步闭包定义步骤
pub fn sync_step<F>(f: F) -> StepDefinition
where
    F: Fn(StepValue, &StepContext) -> StepResult + Send + Sync + 'static,
{
    StepDefinition::Callable(Arc::new(move |event: StepValue, ctx: StepContext| {
        future::ready(f(event, &ctx)).boxed()
    }))
}
