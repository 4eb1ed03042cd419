use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::Result;
use crate::flow::Flow;

use super::context::InvocationData;

/// 异步模式下把后续步骤交给远端执行
///
/// 投递语义（至少一次、恰好一次、重试）由具体实现决定。
#[async_trait]
pub trait RemoteInvoker: Send + Sync {
    async fn remote_invoke(&self, flow: &Flow, index: usize, data: &InvocationData) -> Result<()>;
}

/// 未安装服务商时使用，只记录日志
#[derive(Clone, Debug, Default)]
pub struct UnboundRemoteInvoker;

#[async_trait]
impl RemoteInvoker for UnboundRemoteInvoker {
    async fn remote_invoke(&self, flow: &Flow, index: usize, _data: &InvocationData) -> Result<()> {
        debug!(flow = ?flow.name(), step = index, "remoteInvoke");
        error!(flow = ?flow.name(), step = index, "remoteInvoke: no provider found");
        Ok(())
    }
}
