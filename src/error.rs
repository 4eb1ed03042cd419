use std::sync::Arc;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlowError>;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Resource(String),
    #[error("{0}")]
    Trigger(String),
    #[error("{0}")]
    NotFound(String),
    /// 挂载失败后记录下来的错误，之后的调用原样返回
    #[error(transparent)]
    Mount(Arc<FlowError>),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlowError {
    /// 去掉 `Mount` 包装后的原始错误
    pub fn root(&self) -> &FlowError {
        match self {
            FlowError::Mount(inner) => inner.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(error: serde_json::Error) -> Self {
        FlowError::Serialization(error.to_string())
    }
}
