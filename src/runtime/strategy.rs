use tracing::debug;

use crate::error::Result;
use crate::flow::Flow;
use crate::step::StepValue;

use super::context::InvocationData;

/// 步骤位置；`All` 对应 -1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepIndex {
    All,
    At(usize),
}

impl From<i64> for StepIndex {
    fn from(index: i64) -> Self {
        usize::try_from(index)
            .map(StepIndex::At)
            .unwrap_or(StepIndex::All)
    }
}

impl From<usize> for StepIndex {
    fn from(index: usize) -> Self {
        StepIndex::At(index)
    }
}

/// 同步执行：`All` 时依次执行全部步骤，每一步的结果作为下一步的输入
pub async fn invoke_sync(
    flow: &Flow,
    index: StepIndex,
    mut data: InvocationData,
) -> Result<StepValue> {
    debug!(?index, "sync invoke begin");

    match index {
        StepIndex::All => {
            for position in 0..flow.step_count() {
                data.event = flow.invoke(position, &data).await?;
            }
        }
        StepIndex::At(position) => {
            data.event = flow.invoke(position, &data).await?;
        }
    }

    debug!(event = ?data.event, "sync invoke end");
    Ok(data.event)
}

/// 异步执行：只执行一个步骤，其余步骤交给 remote invoke
pub async fn invoke_async(
    flow: &Flow,
    index: StepIndex,
    mut data: InvocationData,
) -> Result<StepValue> {
    let position = match index {
        StepIndex::All => 0,
        StepIndex::At(position) => position,
    };
    debug!(step = position, "async invoke begin");

    data.event = flow.invoke(position, &data).await?;

    // 最后一步也会投递，位置等于步骤数时由接收方视为流程结束
    if flow.step_count() > position {
        flow.remote_invoke(position + 1, &data).await?;
    }

    debug!(event = ?data.event, "async invoke end");
    Ok(data.event)
}
