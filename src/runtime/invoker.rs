use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::{FlowError, Result};
use crate::flow::Flow;
use crate::step::StepValue;

use super::context::{InvocationData, StepContext};

/// 按位置执行单个步骤
#[async_trait]
pub trait StepInvoker: Send + Sync {
    async fn invoke(&self, flow: &Flow, index: usize, data: &InvocationData) -> Result<StepValue>;
}

/// 默认的本地执行器
///
/// 步骤返回的错误会被记录并作为结果返回，不会向上抛出；
/// 只有位置不存在时才返回 [`FlowError::NotFound`]。
#[derive(Clone, Debug, Default)]
pub struct LocalInvoker;

#[async_trait]
impl StepInvoker for LocalInvoker {
    async fn invoke(&self, flow: &Flow, index: usize, data: &InvocationData) -> Result<StepValue> {
        debug!(step = index, "invoke step");

        let step = flow
            .step(index)
            .ok_or_else(|| FlowError::NotFound(format!("Step#{index} not found")))?;

        let ctx = StepContext::new(index, flow.shared_name(), flow.helpers(), data);
        match step.handler().handle(data.event.clone(), ctx).await {
            Ok(value) => Ok(StepValue::Data(value)),
            Err(failure) => {
                error!(step = index, error = %failure, "step failed");
                Ok(StepValue::Failure(failure))
            }
        }
    }
}
