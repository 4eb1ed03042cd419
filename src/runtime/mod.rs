pub mod context;
pub mod invoker;
pub mod origin;
pub mod remote;
pub mod strategy;

pub use context::{InvocationData, Origin, Stack, StepContext, TrackContext};
pub use invoker::{LocalInvoker, StepInvoker};
pub use origin::{DefaultOriginProcessor, OriginProcessor};
pub use remote::{RemoteInvoker, UnboundRemoteInvoker};
pub use strategy::{invoke_async, invoke_sync, StepIndex};
